//! `skillet list` - show skills installed in the target directory.
//!
//! Installed skills are re-derived by re-parsing each subdirectory's
//! manifest; the lock store is deliberately not consulted (the directory and
//! the lock file are independent sources of truth).

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::manifest;

#[derive(Tabled)]
struct InstalledRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "PATH")]
    path: String,
}

pub fn run(target_dir: &Path) -> Result<()> {
    if !target_dir.is_dir() {
        println!("{}", "No skills installed.".yellow());
        return Ok(());
    }

    let mut rows = Vec::new();
    for entry in fs::read_dir(target_dir)
        .with_context(|| format!("failed to read {}", target_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(parsed) = manifest::parse_manifest_dir(&path) {
            rows.push(InstalledRow {
                name: parsed.frontmatter.name,
                description: truncate(&parsed.frontmatter.description, 60),
                path: path.display().to_string(),
            });
        }
    }

    if rows.is_empty() {
        println!("{}", "No skills installed.".yellow());
        println!();
        println!("Install one with:");
        println!("  {}", "skillet add owner/repo".cyan());
        return Ok(());
    }

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    let mut table = Table::new(&rows);
    table.with(Style::blank());
    println!("{table}");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
