//! SKILL.md manifest parsing.
//!
//! A skill manifest is a markdown file that starts with a `---` delimited
//! YAML frontmatter block carrying at least `name` and `description`,
//! followed by free-form instruction text. An optional `metadata` block may
//! flag a skill as `internal: true`, which hides it from default discovery.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// File name of a skill manifest inside its directory.
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Parsed frontmatter of a SKILL.md file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_yaml::Value>>,
}

/// A parsed manifest: frontmatter plus the raw body text.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Manifest {
    /// Whether the frontmatter flags this skill as internal.
    ///
    /// Only a literal boolean `true` counts; `internal: false` or a missing
    /// key means the skill is public.
    pub fn is_internal(&self) -> bool {
        self.frontmatter
            .metadata
            .as_ref()
            .and_then(|m| m.get("internal"))
            .and_then(serde_yaml::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Parse manifest text. Returns `None` when the document has no frontmatter
/// block or the block lacks a non-empty `name` or `description` — callers in
/// discovery treat that as "not a skill", not as an error.
pub fn parse_manifest_str(text: &str) -> Option<Manifest> {
    let mut lines = text.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }

    let mut raw = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }
        raw.push_str(line);
        raw.push('\n');
    }
    if !closed {
        return None;
    }

    let frontmatter: Frontmatter = serde_yaml::from_str(&raw).ok()?;
    if frontmatter.name.trim().is_empty() || frontmatter.description.trim().is_empty() {
        return None;
    }

    let body = lines.collect::<Vec<_>>().join("\n");
    Some(Manifest { frontmatter, body })
}

/// Read and parse `<dir>/SKILL.md`. `None` when the file is missing,
/// unreadable, or not a valid manifest.
pub fn parse_manifest_dir(dir: &Path) -> Option<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let text = fs::read_to_string(path).ok()?;
    parse_manifest_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_description_and_body() {
        let m = parse_manifest_str(
            "---\nname: commit-helper\ndescription: Writes commit messages\n---\nUse short subjects.",
        )
        .unwrap();
        assert_eq!(m.frontmatter.name, "commit-helper");
        assert_eq!(m.frontmatter.description, "Writes commit messages");
        assert_eq!(m.body, "Use short subjects.");
        assert!(!m.is_internal());
    }

    #[test]
    fn missing_name_or_description_is_not_a_manifest() {
        assert!(parse_manifest_str("---\ndescription: only desc\n---\nbody").is_none());
        assert!(parse_manifest_str("---\nname: only-name\n---\nbody").is_none());
        assert!(parse_manifest_str("---\nname: x\ndescription: \"\"\n---\n").is_none());
    }

    #[test]
    fn missing_or_unclosed_frontmatter_is_rejected() {
        assert!(parse_manifest_str("# just markdown").is_none());
        assert!(parse_manifest_str("---\nname: x\ndescription: y\nno closing fence").is_none());
        assert!(parse_manifest_str("").is_none());
    }

    #[test]
    fn internal_flag_requires_literal_true() {
        let internal = parse_manifest_str(
            "---\nname: a\ndescription: b\nmetadata:\n  internal: true\n---\n",
        )
        .unwrap();
        assert!(internal.is_internal());

        let public = parse_manifest_str(
            "---\nname: a\ndescription: b\nmetadata:\n  internal: false\n---\n",
        )
        .unwrap();
        assert!(!public.is_internal());

        let stringy = parse_manifest_str(
            "---\nname: a\ndescription: b\nmetadata:\n  internal: \"true\"\n---\n",
        )
        .unwrap();
        assert!(!stringy.is_internal());
    }
}
