//! Error taxonomy for skill operations.
//!
//! Fatal variants (`Parse`, `DiscoveryEmpty`, `PathSafety`) abort the whole
//! command; `Fetch` and `Install` are isolated per skill when they occur
//! mid-batch; `LockWrite` is logged and swallowed so a lock problem never
//! undoes a completed file copy.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("unrecognized source '{0}'. Expected a local path, owner/repo, or a repository/skill URL")]
    Parse(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no skills found at {0}")]
    DiscoveryEmpty(String),

    #[error("refusing to write outside {base}: {path}")]
    PathSafety { base: PathBuf, path: PathBuf },

    #[error("install failed for '{name}': {reason}")]
    Install { name: String, reason: String },

    #[error("could not write lock file: {0}")]
    LockWrite(String),

    // Field deliberately not named `source`: thiserror reserves that name
    // for an error cause.
    #[error("update check failed for {repo}: {reason}")]
    UpdateCheck { repo: String, reason: String },
}
