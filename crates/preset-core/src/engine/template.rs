//! Template rendering and copying

use super::lines::{decode, split_lines, union_text};
use super::structured::merge_document_text;
use super::{Engine, FileChange, FileKind, Policy};
use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Placeholder name -> replacement value
pub type Substitutions = HashMap<String, String>;

/// Placeholder names look like identifiers: `project_name`, `pkg.name`,
/// `build-dir`. Anything else between braces (e.g. a JSX style object
/// `{{ color: 'red' }}`) is ordinary text.
fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Replace every `{{name}}` in `text` with its substitution.
///
/// Whitespace inside the braces is ignored. Replacement values are inserted
/// as-is and never scanned for placeholders themselves. `template` is only
/// used to name the source in errors.
pub fn render(template: &Path, text: &str, substitutions: &Substitutions) -> EngineResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };

        let name = after[..end].trim();
        if !is_placeholder_name(name) {
            out.push_str(&rest[..start + 2]);
            rest = after;
            continue;
        }

        let value = substitutions
            .get(name)
            .ok_or_else(|| EngineError::MissingSubstitution {
                name: name.to_string(),
                template: template.to_path_buf(),
            })?;

        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

impl Engine {
    /// Render the template at `src` and realise it at `dest`.
    ///
    /// `src` is used exactly as given; callers resolve it against their own
    /// template root. Under [`Policy::Merge`] the destination kind decides:
    /// structured documents are deep-merged, line sets are unioned and plain
    /// text is left alone when it already exists.
    pub fn copy_template(
        &self,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        policy: Policy,
        substitutions: &Substitutions,
    ) -> EngineResult<FileChange> {
        let src = src.as_ref();
        let relative = dest.as_ref();
        let full = self.resolve(relative)?;

        if policy == Policy::SkipIfExists && Self::exists(&full) {
            return Ok(Self::skipped(relative));
        }

        let raw = fs::read(src).map_err(|e| EngineError::io(src, e))?;
        // Non UTF-8 templates (images, fonts) are copied byte for byte
        let rendered = match String::from_utf8(raw) {
            Ok(text) => render(src, &text, substitutions)?.into_bytes(),
            Err(e) => e.into_bytes(),
        };

        let existing = Self::read_existing(&full)?;
        let contents = match (existing.as_deref(), policy, FileKind::of(relative)) {
            (Some(_), Policy::Merge, FileKind::PlainText) => return Ok(Self::skipped(relative)),
            (Some(current), Policy::Merge, FileKind::LineSet) => {
                let current = decode(&full, current)?;
                let incoming = decode(src, &rendered)?;
                union_text(Some(current), &split_lines(incoming)).into_bytes()
            }
            (Some(current), Policy::Merge, FileKind::Structured(_)) => {
                let incoming = decode(src, &rendered)?;
                merge_document_text(&full, current, src, incoming)?.into_bytes()
            }
            _ => rendered,
        };

        Self::commit(relative, &full, existing.as_deref(), &contents)
    }
}
