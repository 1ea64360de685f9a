//! Line-set files (`.gitignore`, `.npmignore`, ...)

use super::{Engine, FileChange, Policy};
use crate::error::{EngineError, EngineResult};
use std::collections::HashSet;
use std::io;
use std::path::Path;

impl Engine {
    /// Add lines to a file, keeping every line already present.
    ///
    /// Existing order is preserved and new lines are appended in the order
    /// given. Matching is exact; `"dist"` and `"dist/"` are different lines.
    /// An entry containing `\n` counts as one line per segment.
    pub fn apply_line_set<S: AsRef<str>>(
        &self,
        path: impl AsRef<Path>,
        lines_to_add: &[S],
        policy: Policy,
    ) -> EngineResult<FileChange> {
        let relative = path.as_ref();
        let full = self.resolve(relative)?;
        let existing = Self::read_existing(&full)?;

        let additions: Vec<&str> = lines_to_add
            .iter()
            .flat_map(|s| {
                let s = s.as_ref();
                s.strip_suffix('\n').unwrap_or(s).split('\n')
            })
            .collect();
        let contents = match (&existing, policy) {
            (Some(_), Policy::SkipIfExists) => return Ok(Self::skipped(relative)),
            (Some(bytes), Policy::Merge) => {
                let text = decode(&full, bytes)?;
                union_text(Some(text), &additions)
            }
            _ => union_text(None, &additions),
        };

        Self::commit(relative, &full, existing.as_deref(), contents.as_bytes())
    }
}

pub(crate) fn decode<'a>(path: &Path, bytes: &'a [u8]) -> EngineResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        EngineError::io(path, io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

/// Split file text into lines; a trailing newline does not start a new line
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').collect()
}

/// Order-preserving union of `existing` and `additions`.
///
/// Duplicates already in `existing` survive; duplicates within `additions`
/// collapse to the first occurrence.
pub fn union_lines<'a>(existing: &[&'a str], additions: &[&'a str]) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = existing.iter().copied().collect();
    let mut result = existing.to_vec();
    for &line in additions {
        if seen.insert(line) {
            result.push(line);
        }
    }
    result
}

pub(crate) fn union_text(existing: Option<&str>, additions: &[&str]) -> String {
    let current = existing.map(split_lines).unwrap_or_default();
    join_lines(&union_lines(&current, additions))
}

fn join_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
