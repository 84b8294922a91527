//! `skillet check` and `skillet update` - upstream update detection.
//!
//! Checks compare the stored folder fingerprint of each lock entry against a
//! freshly fetched one; no file contents are downloaded. Only GitHub-backed
//! entries with a recorded fingerprint and skill path are checkable — every
//! other entry is reported as skipped, never as up to date.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use super::add::{self, AddOptions};
use crate::github;
use crate::lockfile::{LockEntry, LockStore};
use crate::manifest::MANIFEST_FILE;

#[derive(Debug, PartialEq, Eq)]
enum CheckOutcome {
    UpToDate,
    UpdateAvailable,
    /// Fingerprint could not be fetched or the entry is not checkable.
    Skipped,
}

/// `skillet check`: report per-skill update status.
pub fn check() -> Result<()> {
    let lock = LockStore::load(&super::lock_path());
    if lock.is_empty() {
        println!("{}", "No skills tracked in the lock file.".yellow());
        return Ok(());
    }

    let token = github::auth_token();
    let mut updates = 0usize;

    println!("{}", "Checking for updates...".bold());
    for (source, names) in lock.all_by_source() {
        // One tree listing per repository covers all of its skills.
        let tree = fetch_tree_if_checkable(&lock, &source, &names, token.as_deref());
        for name in &names {
            let entry = lock.get(name).expect("grouped names exist in the store");
            match outcome(entry, tree.as_ref()) {
                CheckOutcome::UpToDate => {
                    println!("  {} {} up to date", "✓".green(), name.cyan());
                }
                CheckOutcome::UpdateAvailable => {
                    println!("  {} {} update available", "↑".blue().bold(), name.cyan());
                    updates += 1;
                }
                CheckOutcome::Skipped => {
                    println!("  {} {} skipped (cannot check)", "-".dimmed(), name.dimmed());
                }
            }
        }
    }

    println!();
    if updates == 0 {
        println!("{} All checkable skills are up to date", "✓".green().bold());
    } else {
        println!(
            "{} update(s) available. Apply with {}",
            updates.to_string().blue().bold(),
            "skillet update".cyan()
        );
    }
    Ok(())
}

/// `skillet update`: reinstall every skill with an available update
/// (optionally restricted to `names`). Each reinstall is isolated; one
/// failure does not block the rest.
pub fn update(names: &[String], target_dir: &Path) -> Result<()> {
    let lock = LockStore::load(&super::lock_path());
    if lock.is_empty() {
        println!("{}", "No skills tracked in the lock file.".yellow());
        return Ok(());
    }

    let token = github::auth_token();
    let mut updated: Vec<String> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();
    let mut found_any = false;

    for (source, group) in lock.all_by_source() {
        let group: Vec<String> = group
            .into_iter()
            .filter(|n| names.is_empty() || names.contains(n))
            .collect();
        if group.is_empty() {
            continue;
        }
        let tree = fetch_tree_if_checkable(&lock, &source, &group, token.as_deref());

        for name in group {
            let entry = lock.get(&name).expect("grouped names exist in the store");
            if outcome(entry, tree.as_ref()) != CheckOutcome::UpdateAvailable {
                continue;
            }
            found_any = true;

            // Reinstall from a source string rebuilt out of the stored
            // provenance; the add flow refreshes the lock entry.
            let reinstall_source = match skill_dir(entry) {
                Some(dir) if !dir.is_empty() => format!("{}/{}", entry.source, dir),
                _ => entry.source.clone(),
            };
            // The installed name doubles as the selection filter: it keeps
            // sibling skills untouched and keeps internal skills reachable
            // on reinstall (explicit name filters include them).
            let opts = reinstall_options(&name, target_dir);
            match add::run(&reinstall_source, &opts) {
                Ok(()) => updated.push(name),
                Err(e) => failed.push((name, e.to_string())),
            }
        }
    }

    println!();
    if !found_any {
        println!("{}", "Nothing to update.".yellow());
        return Ok(());
    }
    println!(
        "{} updated, {} failed",
        updated.len().to_string().green(),
        failed.len().to_string().red()
    );
    for (name, err) in &failed {
        println!("  {} {}: {}", "✗".red(), name, err);
    }
    if updated.is_empty() {
        bail!("no skills were updated");
    }
    Ok(())
}

fn reinstall_options(name: &str, target_dir: &Path) -> AddOptions {
    AddOptions {
        target_dir: target_dir.to_path_buf(),
        skills: vec![name.to_string()],
        list_only: false,
        all: false,
        full_depth: false,
    }
}

/// Fetch the repository tree when at least one entry in the group is
/// checkable. Fetch failures degrade to "cannot check" for the whole group.
fn fetch_tree_if_checkable(
    lock: &LockStore,
    source: &str,
    names: &[String],
    token: Option<&str>,
) -> Option<github::RepoTree> {
    let any_checkable = names
        .iter()
        .filter_map(|n| lock.get(n))
        .any(is_checkable);
    if !any_checkable {
        return None;
    }
    match github::fetch_repo_tree(source, token) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("  {} {}", "⚠".yellow(), e);
            None
        }
    }
}

fn is_checkable(entry: &LockEntry) -> bool {
    entry.source_type == "github"
        && !entry.skill_folder_hash.is_empty()
        && entry.skill_path.is_some()
}

/// Directory of the skill within its source, derived from the stored
/// manifest path (`skills/foo/SKILL.md` -> `skills/foo`; a repo-root
/// manifest yields the empty string).
fn skill_dir(entry: &LockEntry) -> Option<String> {
    let skill_path = entry.skill_path.as_deref()?;
    Some(
        skill_path
            .strip_suffix(MANIFEST_FILE)
            .unwrap_or(skill_path)
            .trim_end_matches('/')
            .to_string(),
    )
}

fn outcome(entry: &LockEntry, tree: Option<&github::RepoTree>) -> CheckOutcome {
    if !is_checkable(entry) {
        return CheckOutcome::Skipped;
    }
    let Some(tree) = tree else {
        return CheckOutcome::Skipped;
    };
    let Some(dir) = skill_dir(entry) else {
        return CheckOutcome::Skipped;
    };
    match tree.folder_hash(&dir) {
        None => CheckOutcome::Skipped,
        Some(hash) if hash == entry.skill_folder_hash => CheckOutcome::UpToDate,
        Some(_) => CheckOutcome::UpdateAvailable,
    }
}
