//! Upstream fingerprints for update detection.
//!
//! A skill's fingerprint is the git tree object id of its folder: it changes
//! whenever any file under the folder is added, removed, or modified, and it
//! can be read from a recursive tree listing without fetching file bodies.
//! Remote lookups hit the GitHub trees API; install-time fingerprints come
//! from `git rev-parse` against the fresh clone, which yields the same id.

use serde::Deserialize;
use std::path::Path;
use std::process::Command;

use crate::error::SkillError;

/// Candidate default branches, tried in order. Repositories using another
/// default branch always report "could not check".
const BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

#[derive(Debug, Deserialize)]
struct TreeListing {
    sha: String,
    #[serde(default)]
    tree: Vec<TreeNode>,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    path: String,
    #[serde(rename = "type")]
    node_type: String,
    sha: String,
}

/// A fetched recursive tree listing for one repository, reused across every
/// lock entry of that repository.
#[derive(Debug)]
pub struct RepoTree(TreeListing);

impl RepoTree {
    /// The hash of the directory node at `subpath_dir`, or the root tree
    /// hash when the subpath is empty. `None` when the subpath is absent
    /// from the listing or names a file — "could not check", never
    /// "deleted upstream".
    pub fn folder_hash(&self, subpath_dir: &str) -> Option<String> {
        if subpath_dir.is_empty() {
            return Some(self.0.sha.clone());
        }
        self.0
            .tree
            .iter()
            .find(|node| node.node_type == "tree" && node.path == subpath_dir)
            .map(|node| node.sha.clone())
    }
}

#[cfg(test)]
impl RepoTree {
    /// Build a listing directly for unit tests in other modules.
    pub fn for_tests(root_sha: &str, nodes: Vec<(String, String, String)>) -> Self {
        RepoTree(TreeListing {
            sha: root_sha.to_string(),
            tree: nodes
                .into_iter()
                .map(|(path, node_type, sha)| TreeNode { path, node_type, sha })
                .collect(),
        })
    }
}

/// Fetch the recursive tree listing of `owner/repo`, trying each candidate
/// default branch. `Ok(None)` when no branch yields a listing.
pub fn fetch_repo_tree(
    owner_repo: &str,
    token: Option<&str>,
) -> Result<Option<RepoTree>, SkillError> {
    let client = reqwest::blocking::Client::new();

    for branch in BRANCH_CANDIDATES {
        let url = format!(
            "https://api.github.com/repos/{owner_repo}/git/trees/{branch}?recursive=1"
        );
        let mut request = client
            .get(&url)
            .header("User-Agent", concat!("skillet/", env!("CARGO_PKG_VERSION")))
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().map_err(|e| SkillError::UpdateCheck {
            repo: owner_repo.to_string(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            // Missing branch: try the next candidate.
            continue;
        }
        let listing: TreeListing = response.json().map_err(|e| SkillError::UpdateCheck {
            repo: owner_repo.to_string(),
            reason: format!("invalid tree listing: {e}"),
        })?;
        return Ok(Some(RepoTree(listing)));
    }

    Ok(None)
}

/// Bearer token for the trees API: `GITHUB_TOKEN`, else the `gh` credential
/// helper, else unauthenticated.
pub fn auth_token() -> Option<String> {
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.trim().is_empty() {
            return Some(token.trim().to_string());
        }
    }
    Command::new("gh")
        .args(["auth", "token"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Install-time fingerprint from a local clone: the tree object id of
/// `subpath_dir` at HEAD (the root tree when empty). Empty string when the
/// clone has no usable history.
pub fn local_folder_hash(clone_dir: &Path, subpath_dir: &str) -> String {
    let spec = if subpath_dir.is_empty() {
        "HEAD^{tree}".to_string()
    } else {
        format!("HEAD:{subpath_dir}")
    };
    Command::new("git")
        .args(["rev-parse", &spec])
        .current_dir(clone_dir)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}
