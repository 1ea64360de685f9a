//! Directory creation

use super::Engine;
use crate::error::{EngineError, EngineResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirAction {
    Created,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChange {
    pub path: PathBuf,
    pub action: DirAction,
}

impl Engine {
    /// Create each directory and any missing ancestors (`mkdir -p`).
    ///
    /// Directories that already exist are reported as [`DirAction::Existing`].
    /// A regular file in the way is an error.
    pub fn ensure_directories<I, P>(&self, paths: I) -> EngineResult<Vec<DirChange>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut changes = Vec::new();

        for path in paths {
            let relative = path.as_ref();
            let full = self.resolve(relative)?;

            let action = if full.is_dir() {
                DirAction::Existing
            } else {
                fs::create_dir_all(&full).map_err(|e| EngineError::io(&full, e))?;
                DirAction::Created
            };

            changes.push(DirChange {
                path: relative.to_path_buf(),
                action,
            });
        }

        Ok(changes)
    }
}
