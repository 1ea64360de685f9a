//! Template merge engine
//!
//! Computes the final content of a project file from its current on-disk
//! version (if any) and a template or patch, then writes it back. Every
//! operation is idempotent: rerunning it against its own output reports
//! [`FileAction::Unchanged`] and does not touch the file.
//!
//! - [`Engine::apply_line_set`] - ordered line union (`.gitignore` and friends)
//! - [`Engine::apply_structured_merge`] / [`Engine::apply_script_entry`] -
//!   deep merge into JSON/YAML documents
//! - [`Engine::copy_template`] - placeholder substitution plus a merge policy
//! - [`Engine::ensure_directories`] - `mkdir -p` for a set of paths
//!
//! All target paths are relative to the project root given to [`Engine::new`].

pub mod dirs;
pub mod lines;
pub mod structured;
pub mod template;

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

pub use dirs::{DirAction, DirChange};
pub use structured::DocumentFormat;
pub use template::{render, Substitutions};

/// What to do when the target file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Replace the file completely
    #[default]
    Overwrite,
    /// Leave an existing file untouched
    #[serde(alias = "skip")]
    SkipIfExists,
    /// Combine with the existing content without dropping anything
    Merge,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Policy::Overwrite => "overwrite",
            Policy::SkipIfExists => "skip-if-exists",
            Policy::Merge => "merge",
        };
        write!(f, "{}", s)
    }
}

/// How a target file is combined with new content under [`Policy::Merge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    LineSet,
    Structured(DocumentFormat),
}

impl FileKind {
    /// Classify a path by its file name
    pub fn of(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".json") {
            FileKind::Structured(DocumentFormat::Json)
        } else if name.ends_with(".yaml") || name.ends_with(".yml") {
            FileKind::Structured(DocumentFormat::Yaml)
        } else if name.ends_with("ignore") {
            FileKind::LineSet
        } else {
            FileKind::PlainText
        }
    }
}

/// Result of one file operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

impl FileAction {
    /// True when the operation wrote to disk
    pub fn wrote(&self) -> bool {
        matches!(self, FileAction::Created | FileAction::Updated)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileAction::Created => "created",
            FileAction::Updated => "updated",
            FileAction::Unchanged => "unchanged",
            FileAction::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// A file touched (or deliberately not touched) by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the project root
    pub path: PathBuf,
    pub action: FileAction,
}

/// Merge engine bound to one project directory
#[derive(Debug, Clone)]
pub struct Engine {
    root: PathBuf,
}

impl Engine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative target path onto the project root
    pub fn resolve(&self, relative: &Path) -> EngineResult<PathBuf> {
        let mut has_normal = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_normal = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(EngineError::InvalidPath {
                        path: relative.to_path_buf(),
                    })
                }
            }
        }
        if !has_normal {
            return Err(EngineError::InvalidPath {
                path: relative.to_path_buf(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Read a file if it exists
    fn read_existing(full: &Path) -> EngineResult<Option<Vec<u8>>> {
        match fs::read(full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::io(full, e)),
        }
    }

    fn exists(full: &Path) -> bool {
        full.symlink_metadata().is_ok()
    }

    /// Write `contents` unless they already match `existing`
    fn commit(
        relative: &Path,
        full: &Path,
        existing: Option<&[u8]>,
        contents: &[u8],
    ) -> EngineResult<FileChange> {
        let action = match existing {
            Some(current) if current == contents => FileAction::Unchanged,
            Some(_) => FileAction::Updated,
            None => FileAction::Created,
        };

        if action.wrote() {
            write_atomic(full, contents)?;
        }

        Ok(FileChange {
            path: relative.to_path_buf(),
            action,
        })
    }

    fn skipped(relative: &Path) -> FileChange {
        FileChange {
            path: relative.to_path_buf(),
            action: FileAction::Skipped,
        }
    }
}

/// Replace `path` with `contents` via a sibling temporary file and rename.
/// A symlinked target is written through, so the link itself survives.
fn write_atomic(path: &Path, contents: &[u8]) -> EngineResult<()> {
    let resolved = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).map_err(|e| EngineError::io(path, e))?
        }
        _ => path.to_path_buf(),
    };
    let path = resolved.as_path();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| EngineError::io(parent, e))?;
    if let Err(e) = tmp.write_all(contents).and_then(|_| tmp.flush()) {
        return Err(EngineError::io(path, e));
    }

    // Keep the mode of the file being replaced (e.g. an executable script)
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .map_err(|e| EngineError::io(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| EngineError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_kind_by_name() {
        assert_eq!(
            FileKind::of(Path::new("package.json")),
            FileKind::Structured(DocumentFormat::Json)
        );
        assert_eq!(
            FileKind::of(Path::new("config/app.yml")),
            FileKind::Structured(DocumentFormat::Yaml)
        );
        assert_eq!(FileKind::of(Path::new(".gitignore")), FileKind::LineSet);
        assert_eq!(FileKind::of(Path::new(".prettierignore")), FileKind::LineSet);
        assert_eq!(FileKind::of(Path::new("src/main.tsx")), FileKind::PlainText);
        assert_eq!(FileKind::of(Path::new("build.ts")), FileKind::PlainText);
    }

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let engine = Engine::new("/project");
        assert!(engine.resolve(Path::new("src/index.ts")).is_ok());
        assert!(engine.resolve(Path::new("./src")).is_ok());
        assert!(matches!(
            engine.resolve(Path::new("../outside")),
            Err(EngineError::InvalidPath { .. })
        ));
        assert!(matches!(
            engine.resolve(Path::new("/etc/passwd")),
            Err(EngineError::InvalidPath { .. })
        ));
        assert!(matches!(
            engine.resolve(Path::new("")),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_policy_parses_kebab_case() {
        let p: Policy = serde_yaml::from_str("skip-if-exists").unwrap();
        assert_eq!(p, Policy::SkipIfExists);
        let p: Policy = serde_yaml::from_str("skip").unwrap();
        assert_eq!(p, Policy::SkipIfExists);
        let p: Policy = serde_yaml::from_str("merge").unwrap();
        assert_eq!(p, Policy::Merge);
    }

    #[test]
    fn test_commit_reports_unchanged_without_writing() {
        let dir = TempDir::new().unwrap();
        let full = dir.path().join("a.txt");
        fs::write(&full, "same").unwrap();

        let change =
            Engine::commit(Path::new("a.txt"), &full, Some(b"same"), b"same").unwrap();
        assert_eq!(change.action, FileAction::Unchanged);

        let change =
            Engine::commit(Path::new("a.txt"), &full, Some(b"same"), b"different").unwrap();
        assert_eq!(change.action, FileAction::Updated);
        assert_eq!(fs::read_to_string(&full).unwrap(), "different");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let full = dir.path().join("run.sh");
        fs::write(&full, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&full, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&full, b"#!/bin/sh\necho hi\n").unwrap();

        let mode = fs::metadata(&full).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink() {
        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("shared.gitignore");
        fs::write(&shared, "node_modules\n").unwrap();
        std::os::unix::fs::symlink(&shared, dir.path().join(".gitignore")).unwrap();

        let engine = Engine::new(dir.path());
        engine.apply_line_set(".gitignore", &["dist"], Policy::Merge).unwrap();

        let link = dir.path().join(".gitignore");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&shared).unwrap(), "node_modules\ndist\n");
    }
}
