//! Installing skills into the target directory.
//!
//! Installation is always a destructive replace of the target subdirectory:
//! no diff, no merge, prior contents removed first. Every computed write
//! path is checked against its base directory; a path that would escape is
//! a fatal error, never silently corrected.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::SkillError;
use crate::manifest::MANIFEST_FILE;

/// Longest install directory name; sanitized names are truncated here.
const MAX_NAME_LEN: usize = 64;
/// Fallback when sanitization consumes the whole name.
const FALLBACK_NAME: &str = "skill";

/// Sanitize a skill name into a directory name: lowercase, disallowed
/// characters collapsed to `-`, separators trimmed from the ends, bounded
/// length. Allowed characters are `a-z`, `0-9`, `.`, `_`, `-`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out.truncate(MAX_NAME_LEN);
    let out = out.trim_matches(|c| c == '-' || c == '.' || c == '_').to_string();
    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// Join `name` under `base` and verify the result stays inside `base`.
pub fn safe_join(base: &Path, name: &str) -> Result<PathBuf, SkillError> {
    let candidate = base.join(name);
    let mut depth: i32 = 0;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(SkillError::PathSafety {
                        base: base.to_path_buf(),
                        path: candidate,
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SkillError::PathSafety {
                    base: base.to_path_buf(),
                    path: candidate,
                });
            }
        }
    }
    if depth == 0 {
        return Err(SkillError::PathSafety {
            base: base.to_path_buf(),
            path: candidate,
        });
    }
    Ok(candidate)
}

/// Replace `target` with a copy of the skill directory at `source`.
pub fn install_dir(source: &Path, target: &Path) -> Result<(), SkillError> {
    replace_dir(target)?;
    copy_tree(source, target).map_err(|e| SkillError::Install {
        name: target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        reason: e.to_string(),
    })
}

/// Replace `target` with a single-manifest skill.
pub fn install_manifest(content: &str, target: &Path) -> Result<(), SkillError> {
    replace_dir(target)?;
    fs::write(target.join(MANIFEST_FILE), content).map_err(|e| install_err(target, e))
}

/// Replace `target` with a set of relative-path files. Each path is safety
/// checked against the skill directory itself.
pub fn install_files<'a>(
    files: impl Iterator<Item = (&'a String, &'a String)>,
    target: &Path,
) -> Result<(), SkillError> {
    replace_dir(target)?;
    for (rel, content) in files {
        let dest = safe_join(target, rel)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| install_err(target, e))?;
        }
        fs::write(&dest, content).map_err(|e| install_err(target, e))?;
    }
    Ok(())
}

fn install_err(target: &Path, e: std::io::Error) -> SkillError {
    SkillError::Install {
        name: target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        reason: e.to_string(),
    }
}

/// Remove any prior contents of `target` and recreate it empty.
fn replace_dir(target: &Path) -> Result<(), SkillError> {
    if target.exists() {
        fs::remove_dir_all(target).map_err(|e| install_err(target, e))?;
    }
    fs::create_dir_all(target).map_err(|e| install_err(target, e))
}

/// Recursive copy, skipping `.git`.
fn copy_tree(source: &Path, target: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let src = entry.path();
        let dst = target.join(&name);
        if src.is_dir() {
            fs::create_dir_all(&dst)?;
            copy_tree(&src, &dst)?;
        } else {
            fs::copy(&src, &dst)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_to_allowed_alphabet() {
        assert_eq!(sanitize_name("My Cool Skill!"), "my-cool-skill");
        assert_eq!(sanitize_name("  spaces  "), "spaces");
        assert_eq!(sanitize_name("web_crawler.v2"), "web_crawler.v2");
        assert_eq!(sanitize_name("Ünïcode Ñame"), "n-code-ame");
        assert_eq!(sanitize_name("---"), "skill");
        assert_eq!(sanitize_name(""), "skill");

        let long = "x".repeat(200);
        assert_eq!(sanitize_name(&long).len(), MAX_NAME_LEN);

        for c in sanitize_name("Weird/|\\Name?!").chars() {
            assert!(
                c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_' || c == '-',
                "bad char {c}"
            );
        }
    }

    #[test]
    fn safe_join_rejects_escapes() {
        let base = Path::new("/target");
        assert!(safe_join(base, "ok-name").is_ok());
        assert!(safe_join(base, "nested/file.md").is_ok());
        assert!(safe_join(base, "../outside").is_err());
        assert!(safe_join(base, "a/../../outside").is_err());
        assert!(safe_join(base, "/absolute").is_err());
        assert!(safe_join(base, "").is_err());
        // `a/../b` never leaves the base.
        assert!(safe_join(base, "a/../b").is_ok());
    }

    #[test]
    fn reinstall_fully_replaces_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let src_v1 = tmp.path().join("v1");
        fs::create_dir_all(src_v1.join("ref")).unwrap();
        fs::write(src_v1.join("SKILL.md"), "one").unwrap();
        fs::write(src_v1.join("ref/extra.md"), "extra").unwrap();

        let src_v2 = tmp.path().join("v2");
        fs::create_dir_all(&src_v2).unwrap();
        fs::write(src_v2.join("SKILL.md"), "two").unwrap();

        let target = tmp.path().join("installed/skill");
        install_dir(&src_v1, &target).unwrap();
        assert!(target.join("ref/extra.md").exists());

        install_dir(&src_v2, &target).unwrap();
        assert_eq!(fs::read_to_string(target.join("SKILL.md")).unwrap(), "two");
        assert!(!target.join("ref/extra.md").exists());
    }

    #[test]
    fn file_map_install_writes_nested_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let files = std::collections::HashMap::from([
            ("SKILL.md".to_string(), "manifest".to_string()),
            ("references/notes.md".to_string(), "notes".to_string()),
        ]);
        let target = tmp.path().join("skill");
        install_files(files.iter(), &target).unwrap();
        assert_eq!(fs::read_to_string(target.join("SKILL.md")).unwrap(), "manifest");
        assert_eq!(
            fs::read_to_string(target.join("references/notes.md")).unwrap(),
            "notes"
        );

        let evil = std::collections::HashMap::from([
            ("../escape.md".to_string(), "nope".to_string()),
        ]);
        assert!(install_files(evil.iter(), &target).is_err());
    }
}
