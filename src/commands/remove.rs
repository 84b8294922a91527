//! `skillet remove` - delete installed skills and their lock entries.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::install;
use crate::lockfile::LockStore;

pub fn run(names: &[String], target_dir: &Path) -> Result<()> {
    let mut lock = LockStore::load(&super::lock_path());
    let mut removed = 0usize;

    for name in names {
        let dir_name = install::sanitize_name(name);
        let target = install::safe_join(target_dir, &dir_name)?;

        let had_dir = target.is_dir();
        if had_dir {
            fs::remove_dir_all(&target)
                .with_context(|| format!("failed to remove {}", target.display()))?;
        }
        let had_lock = lock.remove(&dir_name);

        if had_dir || had_lock {
            println!("{} Removed {}", "✓".green().bold(), dir_name.cyan());
            removed += 1;
        }
    }

    if removed > 0 {
        if let Err(e) = lock.save() {
            eprintln!("{} could not update lock file: {}", "⚠".yellow(), e);
        }
    } else {
        // Not an error: removing nothing is a successful no-op.
        println!("{}", "No matching skills.".yellow());
    }

    Ok(())
}
