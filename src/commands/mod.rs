//! CLI command implementations.

pub mod add;
pub mod list;
pub mod remove;
pub mod update;

use std::path::PathBuf;

/// Default install directory, relative to the working directory.
pub const DEFAULT_TARGET_DIR: &str = "./skills";

/// Per-user state directory. `SKILLET_HOME` overrides the default so tests
/// and scripts can isolate their state.
pub fn state_dir() -> PathBuf {
    if let Ok(home) = std::env::var("SKILLET_HOME") {
        if !home.trim().is_empty() {
            return PathBuf::from(shellexpand::tilde(&home).as_ref());
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".skillet")
}

/// Path of the lock file inside the state directory.
pub fn lock_path() -> PathBuf {
    state_dir().join(crate::lockfile::LOCK_FILE)
}
