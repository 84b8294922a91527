//! Host providers for skills fetched directly over HTTP.
//!
//! A provider recognizes URLs belonging to one hosting convention and knows
//! how to turn them into a raw manifest document. Providers are tried in
//! registration order; the first match wins. URLs no provider claims fall
//! back to a plain document fetch (the legacy path).
//!
//! The well-known endpoint is structurally different: one index document
//! declares several skills, each potentially spanning multiple files.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::SkillError;
use crate::manifest;

/// A skill fetched as a single manifest document from a non-git host.
#[derive(Debug, Clone)]
pub struct RemoteSkill {
    pub name: String,
    pub description: String,
    /// Raw manifest text, written verbatim as the installed SKILL.md.
    pub content: String,
    /// Directory name used under the target; may differ from `name`.
    pub install_name: String,
    pub source_url: String,
    pub provider_id: String,
    /// Human-facing origin label, e.g. `huggingface:owner/repo`.
    pub source_identifier: String,
}

/// A skill declared by a well-known discovery index.
#[derive(Debug, Clone)]
pub struct WellKnownSkill {
    pub name: String,
    pub description: String,
    pub install_name: String,
    pub source_url: String,
    /// Relative file path -> file content, every file of the skill.
    pub files: HashMap<String, String>,
}

pub trait HostProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Whether this provider recognizes the URL. Pure string check, no I/O.
    fn matches(&self, url: &str) -> bool;

    /// Rewrite a page URL into the raw manifest document URL.
    fn to_raw_url(&self, url: &str) -> String;

    /// Origin label recorded in lock entries and reports.
    fn source_identifier(&self, url: &str) -> String;

    /// Directory name to install under.
    fn install_name(&self, url: &str, skill_name: &str) -> String {
        let _ = url;
        skill_name.to_string()
    }

    /// Fetch and parse the skill. `Ok(None)` means the document was
    /// reachable but is not a valid manifest — distinct from a transport
    /// failure, which is an error.
    fn fetch_skill(&self, url: &str) -> Result<Option<RemoteSkill>, SkillError> {
        let raw_url = self.to_raw_url(url);
        let content = fetch_document(&raw_url)?;
        let Some(parsed) = manifest::parse_manifest_str(&content) else {
            return Ok(None);
        };
        Ok(Some(RemoteSkill {
            install_name: self.install_name(url, &parsed.frontmatter.name),
            name: parsed.frontmatter.name,
            description: parsed.frontmatter.description,
            content,
            source_url: raw_url,
            provider_id: self.id().to_string(),
            source_identifier: self.source_identifier(url),
        }))
    }
}

/// Ordered provider registry; first match wins.
pub fn registry() -> &'static [Box<dyn HostProvider>] {
    static REGISTRY: OnceLock<Vec<Box<dyn HostProvider>>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| vec![Box::new(HuggingFace), Box::new(GitHubRaw)])
        .as_slice()
}

/// Provider claiming `url`, if any.
pub fn find_provider(url: &str) -> Option<&'static dyn HostProvider> {
    registry().iter().find(|p| p.matches(url)).map(|p| p.as_ref())
}

/// Legacy path: fetch a URL no provider claims as a plain manifest document.
pub fn fetch_direct(url: &str) -> Result<Option<RemoteSkill>, SkillError> {
    let content = fetch_document(url)?;
    let Some(parsed) = manifest::parse_manifest_str(&content) else {
        return Ok(None);
    };
    Ok(Some(RemoteSkill {
        install_name: parsed.frontmatter.name.clone(),
        name: parsed.frontmatter.name,
        description: parsed.frontmatter.description,
        content,
        source_url: url.to_string(),
        provider_id: "direct".to_string(),
        source_identifier: url.to_string(),
    }))
}

// ============================================================================
// Hugging Face
// ============================================================================

/// Model-hub convention: a repository page or blob URL on huggingface.co.
struct HuggingFace;

impl HuggingFace {
    /// `owner/repo` portion of a huggingface URL, skipping the optional
    /// `datasets/` or `spaces/` section.
    fn repo_id(url: &str) -> Option<String> {
        let rest = url
            .strip_prefix("https://huggingface.co/")
            .or_else(|| url.strip_prefix("https://hf.co/"))?;
        let rest = rest
            .strip_prefix("datasets/")
            .or_else(|| rest.strip_prefix("spaces/"))
            .unwrap_or(rest);
        let mut parts = rest.split('/');
        let owner = parts.next()?;
        let repo = parts.next()?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(format!("{owner}/{repo}"))
    }
}

impl HostProvider for HuggingFace {
    fn id(&self) -> &'static str {
        "huggingface"
    }

    fn matches(&self, url: &str) -> bool {
        Self::repo_id(url).is_some()
    }

    fn to_raw_url(&self, url: &str) -> String {
        if let Some(pos) = url.find("/blob/") {
            let (head, tail) = url.split_at(pos);
            return format!("{head}/raw/{}", &tail["/blob/".len()..]);
        }
        if url.contains("/raw/") {
            return url.trim_end_matches('/').to_string();
        }
        format!("{}/raw/main/SKILL.md", url.trim_end_matches('/'))
    }

    fn source_identifier(&self, url: &str) -> String {
        match Self::repo_id(url) {
            Some(id) => format!("huggingface:{id}"),
            None => url.to_string(),
        }
    }

    fn install_name(&self, url: &str, skill_name: &str) -> String {
        // Derived from the site identifier so two hub repos shipping a
        // skill with the same manifest name do not collide.
        Self::repo_id(url)
            .map(|id| id.replace('/', "-"))
            .unwrap_or_else(|| skill_name.to_string())
    }
}

// ============================================================================
// GitHub single-file views
// ============================================================================

/// Blob and raw single-file URLs on GitHub. Repository URLs never reach
/// this provider; the source parser routes those to a clone.
struct GitHubRaw;

impl HostProvider for GitHubRaw {
    fn id(&self) -> &'static str {
        "github-raw"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with("https://raw.githubusercontent.com/")
            || (url.starts_with("https://github.com/") && url.contains("/blob/"))
    }

    fn to_raw_url(&self, url: &str) -> String {
        if let Some(rest) = url.strip_prefix("https://github.com/") {
            if let Some(pos) = rest.find("/blob/") {
                let repo = &rest[..pos];
                let path = &rest[pos + "/blob/".len()..];
                return format!("https://raw.githubusercontent.com/{repo}/{path}");
            }
        }
        url.to_string()
    }

    fn source_identifier(&self, url: &str) -> String {
        let rest = url
            .strip_prefix("https://raw.githubusercontent.com/")
            .or_else(|| url.strip_prefix("https://github.com/"));
        match rest {
            Some(rest) => {
                let mut parts = rest.split('/');
                match (parts.next(), parts.next()) {
                    (Some(o), Some(r)) if !o.is_empty() && !r.is_empty() => format!("{o}/{r}"),
                    _ => url.to_string(),
                }
            }
            None => url.to_string(),
        }
    }

    fn install_name(&self, url: &str, skill_name: &str) -> String {
        // `.../skills/foo/SKILL.md` installs as `foo`.
        let raw = self.to_raw_url(url);
        let mut segments: Vec<&str> = raw.trim_end_matches('/').split('/').collect();
        if segments.last() == Some(&manifest::MANIFEST_FILE) {
            segments.pop();
            if let Some(dir) = segments.last() {
                // A repo-root manifest leaves the branch as the parent
                // segment; fall through to the manifest name there.
                if !dir.is_empty() && !dir.contains('.') && *dir != "main" && *dir != "master" {
                    return (*dir).to_string();
                }
            }
        }
        skill_name.to_string()
    }
}

// ============================================================================
// Well-known discovery endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
struct WellKnownIndex {
    #[serde(default)]
    skills: Vec<WellKnownEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WellKnownEntry {
    name: String,
    description: String,
    #[serde(default)]
    install_name: Option<String>,
    #[serde(default)]
    files: Vec<String>,
}

/// Fetch the full skill set declared at a well-known index document. Each
/// listed file is fetched relative to the index URL; entries that list no
/// files, lack a manifest, or fail to fetch are skipped with a warning —
/// one bad entry never sinks the rest of the index.
pub fn fetch_well_known(url: &str) -> Result<Vec<WellKnownSkill>, SkillError> {
    let body = fetch_document(url)?;
    assemble_well_known(url, &body, fetch_document)
}

fn assemble_well_known(
    url: &str,
    body: &str,
    fetch: impl Fn(&str) -> Result<String, SkillError>,
) -> Result<Vec<WellKnownSkill>, SkillError> {
    let index: WellKnownIndex = serde_json::from_str(body).map_err(|e| SkillError::Fetch {
        url: url.to_string(),
        reason: format!("invalid skills index: {e}"),
    })?;

    let base = url.rsplit_once('/').map(|(head, _)| head).unwrap_or(url);

    let mut skills = Vec::new();
    'entries: for entry in index.skills {
        if entry.files.is_empty() || !entry.files.iter().any(|f| f == manifest::MANIFEST_FILE) {
            eprintln!(
                "warning: skipping '{}': index entry lists no {}",
                entry.name,
                manifest::MANIFEST_FILE
            );
            continue;
        }
        if entry.name.trim().is_empty() || entry.description.trim().is_empty() {
            eprintln!("warning: skipping index entry without name/description");
            continue;
        }

        let mut files = HashMap::new();
        for file in &entry.files {
            let file_url = if file.starts_with("http://") || file.starts_with("https://") {
                file.clone()
            } else {
                format!("{base}/{file}")
            };
            match fetch(&file_url) {
                Ok(content) => {
                    files.insert(file.clone(), content);
                }
                Err(e) => {
                    eprintln!("warning: skipping '{}': {e}", entry.name);
                    continue 'entries;
                }
            }
        }

        skills.push(WellKnownSkill {
            install_name: entry.install_name.unwrap_or_else(|| entry.name.clone()),
            name: entry.name,
            description: entry.description,
            source_url: url.to_string(),
            files,
        });
    }
    Ok(skills)
}

/// GET a document, mapping transport and non-success statuses to
/// [`SkillError::Fetch`].
fn fetch_document(url: &str) -> Result<String, SkillError> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .header("User-Agent", concat!("skillet/", env!("CARGO_PKG_VERSION")))
        .send()
        .map_err(|e| SkillError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(SkillError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    response.text().map_err(|e| SkillError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
