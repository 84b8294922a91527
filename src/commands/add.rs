//! `skillet add` - resolve a source, discover skills, install a selection.
//!
//! Pipeline: parse source → materialize (clone / local dir / provider fetch /
//! well-known fetch) → discover → select → install each → record lock entry
//! per success → report. Installs run strictly sequentially; one skill's
//! failure never aborts the rest, and a lock write failure never undoes a
//! completed copy.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::discovery::{self, DiscoverOptions, Skill};
use crate::error::SkillError;
use crate::github;
use crate::install;
use crate::lockfile::{LockEntry, LockStore};
use crate::manifest::MANIFEST_FILE;
use crate::providers::{self, RemoteSkill, WellKnownSkill};
use crate::source::{self, SourceDescriptor, SourceKind};

pub struct AddOptions {
    pub target_dir: PathBuf,
    /// Explicit skill selection (`--skill`, repeatable; `*` selects all).
    pub skills: Vec<String>,
    /// Print discovered skills without installing.
    pub list_only: bool,
    /// Accept every discovered skill.
    pub all: bool,
    /// Search the source tree at arbitrary depth.
    pub full_depth: bool,
}

/// One installable skill, however it was obtained.
enum Candidate {
    Dir { skill: Skill, origin: DirOrigin },
    Remote(RemoteSkill),
    WellKnown(WellKnownSkill),
}

/// Provenance shared by every directory skill of one materialized source.
#[derive(Clone)]
struct DirOrigin {
    source: String,
    source_type: &'static str,
    source_url: String,
    /// Root the skill paths are relative to (clone dir or local dir).
    root: PathBuf,
    /// Clone directory for fingerprinting; `None` for plain local sources.
    clone_dir: Option<PathBuf>,
}

impl Candidate {
    fn name(&self) -> &str {
        match self {
            Candidate::Dir { skill, .. } => &skill.name,
            Candidate::Remote(r) => &r.name,
            Candidate::WellKnown(w) => &w.name,
        }
    }

    fn description(&self) -> &str {
        match self {
            Candidate::Dir { skill, .. } => &skill.description,
            Candidate::Remote(r) => &r.description,
            Candidate::WellKnown(w) => &w.description,
        }
    }

    fn install_name(&self) -> String {
        match self {
            Candidate::Dir { skill, .. } => install::sanitize_name(&skill.name),
            Candidate::Remote(r) => install::sanitize_name(&r.install_name),
            Candidate::WellKnown(w) => install::sanitize_name(&w.install_name),
        }
    }
}

pub fn run(raw_source: &str, opts: &AddOptions) -> Result<()> {
    let desc = source::parse_source(raw_source)?;

    let mut filters: Vec<String> = opts.skills.clone();
    if let Some(filter) = &desc.skill_filter {
        filters.push(filter.clone());
    }

    // Internal skills surface only when a name was explicitly requested.
    let include_internal = filters.iter().any(|f| f != "*");
    let discover_opts = DiscoverOptions {
        include_internal,
        full_depth: opts.full_depth,
    };

    // Clone scratch space must outlive discovery and fingerprinting; the
    // TempDir cleans up on every exit path.
    let mut clone_guard: Option<tempfile::TempDir> = None;
    let candidates = materialize(&desc, &discover_opts, &mut clone_guard)?;

    if candidates.is_empty() {
        bail!(SkillError::DiscoveryEmpty(raw_source.to_string()));
    }

    if opts.list_only {
        println!("{}", format!("Skills at {raw_source}").bold());
        for c in &candidates {
            println!("  {} {}", c.name().cyan(), c.description().dimmed());
        }
        return Ok(());
    }

    let selected = select(&candidates, &filters, opts.all)?;

    let mut lock = LockStore::load(&super::lock_path());
    let mut installed: Vec<String> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();

    for candidate in selected {
        let dir_name = candidate.install_name();
        match install_one(candidate, &dir_name, &opts.target_dir, &mut lock) {
            Ok(()) => {
                println!(
                    "{} Installed {} -> {}",
                    "✓".green().bold(),
                    candidate.name().cyan(),
                    opts.target_dir.join(&dir_name).display()
                );
                installed.push(dir_name);
            }
            Err(e) => {
                println!("{} {}: {}", "✗".red().bold(), candidate.name(), e);
                failed.push((candidate.name().to_string(), e.to_string()));
            }
        }
    }

    println!();
    if failed.is_empty() {
        println!("{} {} skill(s) installed", "✓".green().bold(), installed.len());
    } else {
        println!(
            "{} installed, {} failed",
            installed.len().to_string().green(),
            failed.len().to_string().red()
        );
        for (name, err) in &failed {
            println!("  {} {}: {}", "✗".red(), name, err);
        }
    }

    if installed.is_empty() {
        bail!("no skills were installed");
    }
    Ok(())
}

/// Turn a parsed source into candidates, fetching whatever it points at.
fn materialize(
    desc: &SourceDescriptor,
    discover_opts: &DiscoverOptions,
    clone_guard: &mut Option<tempfile::TempDir>,
) -> Result<Vec<Candidate>> {
    match desc.kind {
        SourceKind::Local => {
            let root = desc
                .local_path
                .clone()
                .context("local source without a path")?;
            if !root.exists() {
                bail!("source path not found: {}", root.display());
            }
            let origin = DirOrigin {
                source: root.display().to_string(),
                source_type: SourceKind::Local.as_str(),
                source_url: String::new(),
                root: root.clone(),
                clone_dir: None,
            };
            let skills = discovery::discover(&root, desc.subpath.as_deref(), discover_opts)?;
            Ok(wrap_dir_skills(skills, origin))
        }
        SourceKind::GitHub | SourceKind::GitLab | SourceKind::GenericGit => {
            let tmp = tempfile::tempdir().context("failed to create clone directory")?;
            clone_repo(&desc.url, desc.git_ref.as_deref(), tmp.path())?;
            let origin = DirOrigin {
                source: desc.identifier(),
                source_type: desc.kind.as_str(),
                source_url: desc.url.clone(),
                root: tmp.path().to_path_buf(),
                clone_dir: Some(tmp.path().to_path_buf()),
            };
            let skills = discovery::discover(tmp.path(), desc.subpath.as_deref(), discover_opts)?;
            *clone_guard = Some(tmp);
            Ok(wrap_dir_skills(skills, origin))
        }
        SourceKind::DirectUrl => {
            let fetched = match providers::find_provider(&desc.url) {
                Some(provider) => provider.fetch_skill(&desc.url)?,
                None => providers::fetch_direct(&desc.url)?,
            };
            match fetched {
                Some(skill) => Ok(vec![Candidate::Remote(skill)]),
                None => bail!(SkillError::Fetch {
                    url: desc.url.clone(),
                    reason: "document is not a valid skill manifest".to_string(),
                }),
            }
        }
        SourceKind::WellKnown => {
            let skills = providers::fetch_well_known(&desc.url)?;
            Ok(skills.into_iter().map(Candidate::WellKnown).collect())
        }
    }
}

fn wrap_dir_skills(skills: Vec<Skill>, origin: DirOrigin) -> Vec<Candidate> {
    skills
        .into_iter()
        .map(|skill| Candidate::Dir {
            skill,
            origin: origin.clone(),
        })
        .collect()
}

/// Selection precedence: `*` wildcard, explicit name filters, single skill
/// auto-select, accept-all. Anything else is fatal — this CLI never prompts.
fn select<'a>(
    candidates: &'a [Candidate],
    filters: &[String],
    all: bool,
) -> Result<Vec<&'a Candidate>> {
    if filters.iter().any(|f| f == "*") {
        return Ok(candidates.iter().collect());
    }

    if !filters.is_empty() {
        let matched: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| {
                filters
                    .iter()
                    .any(|f| f == c.name() || *f == c.install_name())
            })
            .collect();
        if matched.is_empty() {
            bail!(
                "no skills match {:?}. Available: {}",
                filters,
                available_names(candidates)
            );
        }
        return Ok(matched);
    }

    if candidates.len() == 1 || all {
        return Ok(candidates.iter().collect());
    }

    bail!(
        "{} skills found; pass --skill <name> (repeatable, '*' for all) or --all. Available: {}",
        candidates.len(),
        available_names(candidates)
    );
}

fn available_names(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(Candidate::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Install one candidate and record its lock entry. The lock write is
/// best-effort: a failure is logged, never escalated.
fn install_one(
    candidate: &Candidate,
    dir_name: &str,
    target_dir: &Path,
    lock: &mut LockStore,
) -> Result<(), SkillError> {
    fs::create_dir_all(target_dir).map_err(|e| SkillError::Install {
        name: dir_name.to_string(),
        reason: e.to_string(),
    })?;
    let target = install::safe_join(target_dir, dir_name)?;

    if target.exists() {
        println!(
            "  {} overwrites existing skill at {}",
            "⚠".yellow(),
            target.display()
        );
    }

    let entry = match candidate {
        Candidate::Dir { skill, origin } => {
            install::install_dir(&skill.path, &target)?;
            let rel_dir = skill
                .path
                .strip_prefix(&origin.root)
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .replace('\\', "/");
            let hash = origin
                .clone_dir
                .as_deref()
                .map(|dir| github::local_folder_hash(dir, &rel_dir))
                .unwrap_or_default();
            let skill_path = if rel_dir.is_empty() {
                MANIFEST_FILE.to_string()
            } else {
                format!("{rel_dir}/{MANIFEST_FILE}")
            };
            lock_entry(
                &origin.source,
                origin.source_type,
                &origin.source_url,
                Some(skill_path),
                hash,
            )
        }
        Candidate::Remote(remote) => {
            install::install_manifest(&remote.content, &target)?;
            lock_entry(
                &remote.source_identifier,
                &remote.provider_id,
                &remote.source_url,
                None,
                String::new(),
            )
        }
        Candidate::WellKnown(wk) => {
            install::install_files(wk.files.iter(), &target)?;
            lock_entry(&wk.source_url, "well-known", &wk.source_url, None, String::new())
        }
    };

    lock.add(dir_name, entry);
    if let Err(e) = lock.save() {
        eprintln!("{} {}", "⚠".yellow(), SkillError::LockWrite(e.to_string()));
    }
    Ok(())
}

fn lock_entry(
    source: &str,
    source_type: &str,
    source_url: &str,
    skill_path: Option<String>,
    skill_folder_hash: String,
) -> LockEntry {
    let now = chrono::Utc::now().to_rfc3339();
    LockEntry {
        source: source.to_string(),
        source_type: source_type.to_string(),
        source_url: source_url.to_string(),
        skill_path,
        skill_folder_hash,
        installed_at: now.clone(),
        updated_at: now,
    }
}

/// Shallow clone into `dir`, honoring an optional ref.
fn clone_repo(url: &str, git_ref: Option<&str>, dir: &Path) -> Result<()> {
    println!("{} Cloning {}...", "→".blue().bold(), url.cyan());

    let mut cmd = Command::new("git");
    cmd.args(["clone", "--depth", "1"]);
    if let Some(git_ref) = git_ref {
        cmd.args(["--branch", git_ref]);
    }
    cmd.arg(url)
        .arg(dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    let status = cmd.status().context("failed to run git")?;
    if !status.success() {
        bail!(SkillError::Fetch {
            url: url.to_string(),
            reason: "git clone failed".to_string(),
        });
    }
    Ok(())
}
