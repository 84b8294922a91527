//! Installed-skill lock store.
//!
//! A JSON document keyed by installed skill name, recording where each
//! skill came from and a content fingerprint for update checks:
//!
//! ```text
//! {
//!   "version": 3,
//!   "skills": {
//!     "commit-helper": {
//!       "source": "acme/skills",
//!       "sourceType": "github",
//!       "sourceUrl": "https://github.com/acme/skills.git",
//!       "skillPath": "skills/commit-helper/SKILL.md",
//!       "skillFolderHash": "3fa1...",
//!       "installedAt": "2026-08-01T10:00:00+00:00",
//!       "updatedAt": "2026-08-01T10:00:00+00:00"
//!     }
//!   }
//! }
//! ```
//!
//! Schema versions below [`LOCK_VERSION`] are discarded wholesale: older
//! layouts predate the fingerprint field, and re-installing is cheaper than
//! migrating. The file is rewritten in full on every mutation; concurrent
//! invocations are last-writer-wins by design.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCK_VERSION: u32 = 3;
pub const LOCK_FILE: &str = "skills-lock.json";

/// Provenance record for one installed skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    /// Normalized identifier, e.g. `owner/repo` or `huggingface:owner/repo`.
    pub source: String,
    /// `github` | `gitlab` | `generic-git` | `local` | `well-known` | provider id.
    pub source_type: String,
    /// Original fetch URL.
    pub source_url: String,
    /// Manifest path within the source, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_path: Option<String>,
    /// Opaque upstream fingerprint; empty when unknowable.
    #[serde(default)]
    pub skill_folder_hash: String,
    pub installed_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockDocument {
    version: u32,
    #[serde(default)]
    skills: BTreeMap<String, LockEntry>,
}

/// File-backed store, read once on construction and rewritten wholesale by
/// [`LockStore::save`]. Constructed with an explicit path so tests can
/// inject an isolated location.
#[derive(Debug)]
pub struct LockStore {
    path: PathBuf,
    skills: BTreeMap<String, LockEntry>,
}

impl LockStore {
    /// Load the store at `path`. A missing file, unparseable document, or a
    /// version tag below [`LOCK_VERSION`] all yield an empty store.
    pub fn load(path: &Path) -> Self {
        let skills = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<LockDocument>(&content).ok())
            .filter(|doc| doc.version >= LOCK_VERSION)
            .map(|doc| doc.skills)
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            skills,
        }
    }

    /// Upsert an entry. The original `installedAt` survives re-installs of
    /// the same name; `updatedAt` is always refreshed to `entry.updated_at`.
    pub fn add(&mut self, name: &str, mut entry: LockEntry) {
        if let Some(existing) = self.skills.get(name) {
            entry.installed_at = existing.installed_at.clone();
        }
        self.skills.insert(name.to_string(), entry);
    }

    /// Delete an entry, reporting whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.skills.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.skills.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Group entry names by normalized source so update checks run once per
    /// repository rather than once per skill.
    pub fn all_by_source(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, entry) in &self.skills {
            grouped.entry(entry.source.clone()).or_default().push(name.clone());
        }
        grouped
    }

    /// Rewrite the whole document.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let doc = LockDocument {
            version: LOCK_VERSION,
            skills: self.skills.clone(),
        };
        let content = serde_json::to_string_pretty(&doc)?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
