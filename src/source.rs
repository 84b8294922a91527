//! Source string parsing.
//!
//! Turns the raw argument of `skillet add` into a typed [`SourceDescriptor`]
//! without touching the network. Recognized shapes:
//!
//! ```text
//! ./my-skills                 local directory
//! ~/skills/commit-helper      local directory
//! owner/repo                  GitHub shorthand
//! owner/repo@v2/skills@name   shorthand with ref, subpath and skill filter
//! gitlab:owner/repo           GitLab shorthand
//! https://github.com/o/r/tree/main/skills
//! git@gitlab.com:o/r.git
//! https://hf.co/o/r           host provider (resolved at fetch time)
//! https://ex.com/.well-known/skills.json
//! ssh://host/repo.git         generic git remote
//! ```

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::SkillError;
use crate::providers;

/// Suffix paths recognized as a well-known skill discovery index.
pub const WELL_KNOWN_SUFFIXES: [&str; 2] = ["/.well-known/skills.json", "/.well-known/skills"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Local,
    GitHub,
    GitLab,
    GenericGit,
    DirectUrl,
    WellKnown,
}

impl SourceKind {
    /// Identifier persisted in lock entries as `sourceType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::GitHub => "github",
            SourceKind::GitLab => "gitlab",
            SourceKind::GenericGit => "generic-git",
            SourceKind::DirectUrl => "direct-url",
            SourceKind::WellKnown => "well-known",
        }
    }
}

/// Parsed form of a user-supplied source string. Constructed once per
/// invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    /// Absolute fetch location. Empty for local sources.
    pub url: String,
    /// Filesystem path, present only for local sources.
    pub local_path: Option<PathBuf>,
    /// Branch, tag or commit to check out.
    pub git_ref: Option<String>,
    /// Path within the source restricting discovery.
    pub subpath: Option<String>,
    /// Single skill name extracted from an `@name` suffix.
    pub skill_filter: Option<String>,
}

impl SourceDescriptor {
    fn repo(kind: SourceKind, url: String) -> Self {
        Self {
            kind,
            url,
            local_path: None,
            git_ref: None,
            subpath: None,
            skill_filter: None,
        }
    }

    /// Normalized identifier recorded as `source` in lock entries:
    /// `owner/repo` for the known hosts, the URL or path otherwise.
    pub fn identifier(&self) -> String {
        match self.kind {
            SourceKind::Local => self
                .local_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            SourceKind::GitHub | SourceKind::GitLab => owner_repo_from_clone_url(&self.url)
                .unwrap_or_else(|| self.url.clone()),
            _ => self.url.clone(),
        }
    }
}

/// Classify and decompose a raw source string. Never guesses: a string that
/// matches none of the documented shapes is a [`SkillError::Parse`].
pub fn parse_source(raw: &str) -> Result<SourceDescriptor, SkillError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SkillError::Parse(raw.to_string()));
    }

    // Local paths win first: absolute, explicitly relative, tilde, or any
    // string that already names something on disk.
    let expanded = shellexpand::tilde(raw);
    let looks_local = raw.starts_with('/')
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with('~');
    if looks_local || Path::new(expanded.as_ref()).exists() {
        return Ok(SourceDescriptor {
            kind: SourceKind::Local,
            url: String::new(),
            local_path: Some(PathBuf::from(expanded.as_ref())),
            git_ref: None,
            subpath: None,
            skill_filter: None,
        });
    }

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return parse_http_url(raw);
    }

    if let Some(rest) = raw.strip_prefix("git@") {
        return parse_scp_url(raw, rest);
    }

    if raw.starts_with("ssh://") || raw.starts_with("git://") || raw.ends_with(".git") {
        return Ok(SourceDescriptor::repo(SourceKind::GenericGit, raw.to_string()));
    }

    parse_shorthand(raw)
}

/// `https://...` URLs: well-known index, repository URL (optionally with a
/// `/tree/<ref>/<subpath>` segment), provider-recognized document, or a bare
/// markdown document (legacy direct fetch).
fn parse_http_url(raw: &str) -> Result<SourceDescriptor, SkillError> {
    let trimmed = raw.trim_end_matches('/');

    if WELL_KNOWN_SUFFIXES.iter().any(|s| trimmed.ends_with(s)) {
        return Ok(SourceDescriptor::repo(SourceKind::WellKnown, raw.to_string()));
    }

    // Single-file views on the git hosts belong to the raw-document
    // providers, not the repository path below.
    let is_blob = trimmed.contains("/blob/") || trimmed.contains("/-/blob/");
    if !is_blob {
        for (host, kind) in [("github.com", SourceKind::GitHub), ("gitlab.com", SourceKind::GitLab)] {
            if let Some(desc) = parse_host_repo_url(trimmed, host, kind)? {
                return Ok(desc);
            }
        }
    }

    if providers::registry().iter().any(|p| p.matches(raw)) {
        return Ok(SourceDescriptor::repo(SourceKind::DirectUrl, raw.to_string()));
    }

    if trimmed.ends_with(".md") {
        return Ok(SourceDescriptor::repo(SourceKind::DirectUrl, raw.to_string()));
    }

    if trimmed.ends_with(".git") {
        return Ok(SourceDescriptor::repo(SourceKind::GenericGit, raw.to_string()));
    }

    Err(SkillError::Parse(raw.to_string()))
}

/// Repository URLs on a known host: `https://<host>/owner/repo[.git]` with an
/// optional `/tree/<ref>[/<subpath>]` (GitLab also uses `/-/tree/`).
fn parse_host_repo_url(
    url: &str,
    host: &str,
    kind: SourceKind,
) -> Result<Option<SourceDescriptor>, SkillError> {
    let marker = format!("{host}/");
    let Some(pos) = url.find(&marker) else {
        return Ok(None);
    };
    let rest = &url[pos + marker.len()..];

    let mut parts = rest.splitn(3, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default().trim_end_matches(".git");
    let tail = parts.next().unwrap_or_default();

    if owner.is_empty() || repo.is_empty() {
        return Err(SkillError::Parse(url.to_string()));
    }

    let mut desc = SourceDescriptor::repo(kind, clone_url(host, owner, repo));

    let tail = tail.strip_prefix("-/").unwrap_or(tail);
    if let Some(tree) = tail.strip_prefix("tree/") {
        let mut tree_parts = tree.splitn(2, '/');
        let git_ref = tree_parts.next().unwrap_or_default();
        if git_ref.is_empty() {
            return Err(SkillError::Parse(url.to_string()));
        }
        desc.git_ref = Some(git_ref.to_string());
        if let Some(sub) = tree_parts.next() {
            let (sub, filter) = split_skill_suffix(sub);
            if !sub.is_empty() {
                desc.subpath = Some(sub.to_string());
            }
            desc.skill_filter = filter;
        }
    } else if !tail.is_empty() {
        // Anything else under the repo path (releases, issues, ...) is not
        // an installable source.
        return Err(SkillError::Parse(url.to_string()));
    }

    Ok(Some(desc))
}

/// `git@host:owner/repo.git` remotes.
fn parse_scp_url(raw: &str, rest: &str) -> Result<SourceDescriptor, SkillError> {
    let (host, path) = rest
        .split_once(':')
        .ok_or_else(|| SkillError::Parse(raw.to_string()))?;
    let path = path.trim_end_matches(".git");
    let (owner, repo) = path
        .split_once('/')
        .ok_or_else(|| SkillError::Parse(raw.to_string()))?;
    if owner.is_empty() || repo.is_empty() {
        return Err(SkillError::Parse(raw.to_string()));
    }

    let kind = match host {
        "github.com" => SourceKind::GitHub,
        "gitlab.com" => SourceKind::GitLab,
        _ => return Ok(SourceDescriptor::repo(SourceKind::GenericGit, raw.to_string())),
    };
    Ok(SourceDescriptor::repo(kind, clone_url(host, owner, repo)))
}

/// `owner/repo[@ref][/subpath...][@skillName]` shorthand, with an optional
/// `gitlab:` prefix selecting the GitLab host.
fn parse_shorthand(raw: &str) -> Result<SourceDescriptor, SkillError> {
    let (host, kind, body) = match raw.strip_prefix("gitlab:") {
        Some(rest) => ("gitlab.com", SourceKind::GitLab, rest),
        None => ("github.com", SourceKind::GitHub, raw),
    };

    let segment = segment_re();

    let mut segments = body.split('/');
    let owner = segments.next().unwrap_or_default();
    let repo_seg = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();

    if owner.is_empty() || repo_seg.is_empty() || !segment.is_match(owner) {
        return Err(SkillError::Parse(raw.to_string()));
    }

    // The repo segment may carry `@ref`, and — when there is no subpath —
    // also a trailing `@skillName` (`owner/repo@ref@name`).
    let mut repo_parts = repo_seg.split('@');
    let repo = repo_parts.next().unwrap_or_default();
    let git_ref = repo_parts.next().map(str::to_string);
    let mut skill_filter = repo_parts.next().map(str::to_string);
    if repo_parts.next().is_some() || repo.is_empty() || !segment.is_match(repo) {
        return Err(SkillError::Parse(raw.to_string()));
    }
    if skill_filter.is_some() && !rest.is_empty() {
        return Err(SkillError::Parse(raw.to_string()));
    }

    let mut subpath = None;
    if !rest.is_empty() {
        let joined = rest.join("/");
        let (sub, filter) = split_skill_suffix(&joined);
        if filter.is_some() {
            skill_filter = filter;
        }
        if !sub.is_empty() {
            subpath = Some(sub.to_string());
        }
    }

    if git_ref.as_deref() == Some("") || skill_filter.as_deref() == Some("") {
        return Err(SkillError::Parse(raw.to_string()));
    }

    Ok(SourceDescriptor {
        kind,
        url: clone_url(host, owner, repo),
        local_path: None,
        git_ref,
        subpath,
        skill_filter,
    })
}

/// Valid owner/repo path segment, compiled once.
fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap())
}

/// Strip a trailing `@skillName` from the final segment of a subpath.
fn split_skill_suffix(subpath: &str) -> (&str, Option<String>) {
    match subpath.rsplit_once('@') {
        // `@` inside a non-final segment is part of the path, not a filter.
        Some((head, name)) if !name.is_empty() && !name.contains('/') => {
            (head, Some(name.to_string()))
        }
        _ => (subpath, None),
    }
}

fn clone_url(host: &str, owner: &str, repo: &str) -> String {
    format!("https://{host}/{owner}/{repo}.git")
}

/// Recover `owner/repo` from a clone URL produced by [`clone_url`].
pub fn owner_repo_from_clone_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("https://gitlab.com/"))?;
    let rest = rest.trim_end_matches(".git");
    let (owner, repo) = rest.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some(format!("{owner}/{repo}"))
}
