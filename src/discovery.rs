//! Skill discovery in a directory tree.
//!
//! A directory is a skill root when it directly contains a parseable
//! `SKILL.md`. Default depth policy: a skill root at the search root wins
//! and stops the search; otherwise one level of subdirectories is scanned.
//! `full_depth` collects every manifest-bearing directory anywhere under the
//! root instead. A `marketplace.json` bundle manifest at a scanned location
//! expands its declared plugins into individual skills.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest;

/// A discovered, locally-available skill.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Absolute directory containing the manifest and supporting files.
    pub path: PathBuf,
    pub internal: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverOptions {
    /// Include skills whose metadata marks them `internal: true`.
    pub include_internal: bool,
    /// Search arbitrarily deep instead of stopping at a root manifest or
    /// one level of subdirectories.
    pub full_depth: bool,
}

/// Bundle manifest declaring multiple sub-skills (`marketplace.json`).
#[derive(Debug, Deserialize)]
struct BundleManifest {
    #[serde(default)]
    plugins: Vec<BundleEntry>,
}

#[derive(Debug, Deserialize)]
struct BundleEntry {
    name: String,
    /// Directory of the plugin, relative to the bundle manifest.
    source: String,
    #[serde(default)]
    description: Option<String>,
}

const BUNDLE_FILE: &str = "marketplace.json";

/// Discover skills under `root`, optionally narrowed to `root/subpath`.
/// Returns an empty vec (not an error) when nothing matches; order follows
/// filesystem traversal and is not guaranteed stable across platforms.
pub fn discover(root: &Path, subpath: Option<&str>, opts: &DiscoverOptions) -> Result<Vec<Skill>> {
    let root = match subpath {
        Some(sub) => root.join(sub),
        None => root.to_path_buf(),
    };
    if !root.is_dir() {
        bail!("source directory not found: {}", root.display());
    }

    let mut skills = Vec::new();

    if opts.full_depth {
        walk(&root, opts, &mut skills)?;
    } else if let Some(skill) = skill_at(&root, opts) {
        // Root-level manifest short-circuits the search.
        return Ok(vec![skill]);
    } else {
        collect_at(&root, opts, &mut skills)?;
        for entry in fs::read_dir(&root)
            .with_context(|| format!("failed to read {}", root.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                if let Some(skill) = skill_at(&path, opts) {
                    skills.push(skill);
                } else {
                    collect_at(&path, opts, &mut skills)?;
                }
            }
        }
    }

    // A bundle entry and the directory scan can both surface the same
    // directory; keep the first sighting.
    let mut seen = std::collections::HashSet::new();
    skills.retain(|s| seen.insert(s.path.clone()));
    Ok(skills)
}

/// Recursive traversal for `full_depth`: every manifest-bearing directory is
/// collected, including the root, and bundles are expanded wherever found.
fn walk(dir: &Path, opts: &DiscoverOptions, out: &mut Vec<Skill>) -> Result<()> {
    if let Some(skill) = skill_at(dir, opts) {
        out.push(skill);
    }
    collect_at(dir, opts, out)?;

    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, opts, out)?;
        }
    }
    Ok(())
}

/// The skill rooted at `dir`, if its manifest parses and passes the
/// internal filter. A manifest missing name or description is silently
/// excluded.
fn skill_at(dir: &Path, opts: &DiscoverOptions) -> Option<Skill> {
    let parsed = manifest::parse_manifest_dir(dir)?;
    let internal = parsed.is_internal();
    if internal && !opts.include_internal {
        return None;
    }
    Some(Skill {
        name: parsed.frontmatter.name,
        description: parsed.frontmatter.description,
        path: dir.to_path_buf(),
        internal,
    })
}

/// Expand a bundle manifest at `dir`, if present.
fn collect_at(dir: &Path, opts: &DiscoverOptions, out: &mut Vec<Skill>) -> Result<()> {
    let bundle_path = dir.join(BUNDLE_FILE);
    if !bundle_path.is_file() {
        return Ok(());
    }
    let content = fs::read_to_string(&bundle_path)
        .with_context(|| format!("failed to read {}", bundle_path.display()))?;
    let bundle: BundleManifest = match serde_json::from_str(&content) {
        Ok(b) => b,
        // A malformed bundle file is ignored the same way a malformed
        // SKILL.md is.
        Err(_) => return Ok(()),
    };

    for entry in bundle.plugins {
        let plugin_dir = dir.join(&entry.source);
        if !plugin_dir.is_dir() {
            continue;
        }
        // The plugin's own manifest wins; declared fields are the fallback.
        if let Some(skill) = skill_at(&plugin_dir, opts) {
            out.push(skill);
            continue;
        }
        let description = entry.description.unwrap_or_default();
        if entry.name.trim().is_empty() || description.trim().is_empty() {
            continue;
        }
        out.push(Skill {
            name: entry.name,
            description,
            path: plugin_dir,
            internal: false,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn write_skill(dir: &Path, name: &str, extra: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: A {name} skill\n{extra}---\nBody.\n"),
        )
        .unwrap();
    }

    fn names(skills: &[Skill]) -> BTreeSet<String> {
        skills.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn root_manifest_stops_default_search() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "root-skill", "");
        write_skill(&tmp.path().join("nested/a"), "nested-a", "");
        write_skill(&tmp.path().join("nested/b"), "nested-b", "");

        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert_eq!(names(&found), BTreeSet::from(["root-skill".to_string()]));

        let deep = DiscoverOptions { full_depth: true, ..Default::default() };
        let found = discover(tmp.path(), None, &deep).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn default_depth_scans_one_level() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(&tmp.path().join("one"), "one", "");
        write_skill(&tmp.path().join("two"), "two", "");
        write_skill(&tmp.path().join("deep/three"), "three", "");

        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert_eq!(names(&found), BTreeSet::from(["one".to_string(), "two".to_string()]));

        let deep = DiscoverOptions { full_depth: true, ..Default::default() };
        let found = discover(tmp.path(), None, &deep).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn invalid_manifest_is_excluded_until_fixed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), "---\nname: broken\n---\nno description").unwrap();

        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert!(found.is_empty());

        write_skill(&dir, "fixed", "");
        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert_eq!(names(&found), BTreeSet::from(["fixed".to_string()]));
    }

    #[test]
    fn internal_skills_are_hidden_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(&tmp.path().join("pub"), "pub-skill", "");
        write_skill(&tmp.path().join("int"), "int-skill", "metadata:\n  internal: true\n");
        write_skill(&tmp.path().join("neg"), "neg-skill", "metadata:\n  internal: false\n");

        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert_eq!(
            names(&found),
            BTreeSet::from(["pub-skill".to_string(), "neg-skill".to_string()])
        );

        let all = DiscoverOptions { include_internal: true, ..Default::default() };
        let found = discover(tmp.path(), None, &all).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().any(|s| s.name == "int-skill" && s.internal));
    }

    #[test]
    fn subpath_narrows_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(&tmp.path().join("skills/web"), "web", "");
        write_skill(&tmp.path().join("other/misc"), "misc", "");

        let found = discover(tmp.path(), Some("skills"), &DiscoverOptions::default()).unwrap();
        assert_eq!(names(&found), BTreeSet::from(["web".to_string()]));

        assert!(discover(tmp.path(), Some("missing"), &DiscoverOptions::default()).is_err());
    }

    #[test]
    fn bundle_manifest_expands_plugins() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("plugins/alpha")).unwrap();
        write_skill(&tmp.path().join("plugins/beta"), "beta-real", "");
        fs::write(
            tmp.path().join("marketplace.json"),
            r#"{"plugins":[
                {"name":"alpha","source":"plugins/alpha","description":"Declared alpha"},
                {"name":"beta","source":"plugins/beta","description":"Declared beta"},
                {"name":"gone","source":"plugins/missing","description":"No dir"},
                {"name":"bare","source":"plugins/alpha"}
            ]}"#,
        )
        .unwrap();

        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        // alpha comes from the declaration, beta from its own manifest;
        // the missing directory and the description-less entry are skipped.
        assert_eq!(
            names(&found),
            BTreeSet::from(["alpha".to_string(), "beta-real".to_string()])
        );
    }

    #[test]
    fn bundle_entry_and_scan_surface_one_skill_not_two() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(&tmp.path().join("alpha"), "alpha", "");
        fs::write(
            tmp.path().join("marketplace.json"),
            r#"{"plugins":[{"name":"alpha","source":"alpha","description":"Declared alpha"}]}"#,
        )
        .unwrap();

        // The bundle declaration and the one-level scan both reach `alpha`;
        // it must be discovered exactly once.
        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "alpha");

        let deep = DiscoverOptions { full_depth: true, ..Default::default() };
        let found = discover(tmp.path(), None, &deep).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn empty_tree_yields_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("nothing/here")).unwrap();
        let found = discover(tmp.path(), None, &DiscoverOptions::default()).unwrap();
        assert!(found.is_empty());
    }
}
