//! skillet - a package manager for AI agent skills.
//!
//! # Usage
//!
//! ```bash
//! skillet add owner/repo              # Install skills from a GitHub repo
//! skillet add owner/repo@main/skills  # Narrow to a ref and subpath
//! skillet add ./local-skills --all    # Install everything in a local dir
//! skillet add <source> --list         # Show what a source offers
//! skillet list                        # Show installed skills
//! skillet remove <name>               # Uninstall a skill
//! skillet check                       # Detect upstream updates
//! skillet update                      # Apply upstream updates
//! ```

mod commands;
mod discovery;
mod error;
mod github;
mod install;
mod lockfile;
mod manifest;
mod providers;
mod source;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Package manager for AI agent skills
///
/// Installs skills from repositories, direct URLs, well-known discovery
/// endpoints, and local directories into a flat skills folder.
#[derive(Parser)]
#[command(name = "skillet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install skills from a source
    Add {
        /// Source: local path, owner/repo shorthand, repository URL,
        /// skill document URL, or well-known discovery URL
        source: String,

        /// Target directory for installed skills
        #[arg(short, long, default_value = commands::DEFAULT_TARGET_DIR)]
        dir: PathBuf,

        /// Install only the named skill (repeatable; '*' selects all)
        #[arg(short, long = "skill")]
        skills: Vec<String>,

        /// List the skills a source offers without installing
        #[arg(long)]
        list: bool,

        /// Install every discovered skill without prompting
        #[arg(short = 'y', long)]
        all: bool,

        /// Search the source tree at arbitrary depth
        #[arg(long)]
        full_depth: bool,
    },

    /// List installed skills
    List {
        /// Directory holding installed skills
        #[arg(short, long, default_value = commands::DEFAULT_TARGET_DIR)]
        dir: PathBuf,
    },

    /// Remove installed skills
    Remove {
        /// Skill names to remove
        #[arg(required = true)]
        names: Vec<String>,

        /// Directory holding installed skills
        #[arg(short, long, default_value = commands::DEFAULT_TARGET_DIR)]
        dir: PathBuf,
    },

    /// Check installed skills for upstream updates
    Check,

    /// Reinstall skills that have upstream updates
    Update {
        /// Restrict to these skill names (default: everything updatable)
        names: Vec<String>,

        /// Directory holding installed skills
        #[arg(short, long, default_value = commands::DEFAULT_TARGET_DIR)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            source,
            dir,
            skills,
            list,
            all,
            full_depth,
        } => commands::add::run(
            &source,
            &commands::add::AddOptions {
                target_dir: dir,
                skills,
                list_only: list,
                all,
                full_depth,
            },
        ),
        Commands::List { dir } => commands::list::run(&dir),
        Commands::Remove { names, dir } => commands::remove::run(&names, &dir),
        Commands::Check => commands::update::check(),
        Commands::Update { names, dir } => commands::update::update(&names, &dir),
    }
}
