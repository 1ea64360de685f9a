//! Structured documents (`package.json`, YAML configs)
//!
//! Merge rule, applied key by key in patch order:
//! - key missing from the document: inserted at the end
//! - both sides are mappings: merge recursively
//! - anything else: the patch value replaces the existing one in place
//!
//! Sequences are replaced, never concatenated. A merge that changes nothing
//! leaves the file's text exactly as it was.

use super::lines::decode;
use super::{Engine, FileChange, FileKind, Policy};
use crate::error::{EngineError, EngineResult};
use crate::patch::{Patch, PatchValue};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

pub type Document = Map<String, Value>;

const BOM: char = '\u{feff}';

/// Encoding of a structured document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format implied by the file name, JSON unless it is a YAML file
    pub fn for_path(path: &Path) -> Self {
        match FileKind::of(path) {
            FileKind::Structured(format) => format,
            _ => DocumentFormat::Json,
        }
    }

    /// Parse `text` into a top-level mapping. Blank input is an empty document.
    pub fn parse(&self, path: &Path, text: &str) -> EngineResult<Document> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        if text.trim().is_empty() {
            return Ok(Document::new());
        }

        let value: Value = match self {
            DocumentFormat::Json => {
                serde_json::from_str(text).map_err(|e| EngineError::invalid_document(path, e))?
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| EngineError::invalid_document(path, e))?
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Document::new()),
            _ => Err(EngineError::invalid_document(
                path,
                "top-level value is not a mapping",
            )),
        }
    }

    pub fn encode(&self, path: &Path, doc: &Document, indent: &Indent) -> EngineResult<String> {
        match self {
            DocumentFormat::Json => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.0.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                doc.serialize(&mut ser)
                    .map_err(|e| EngineError::invalid_document(path, e))?;
                buf.push(b'\n');
                String::from_utf8(buf).map_err(|e| EngineError::invalid_document(path, e))
            }
            DocumentFormat::Yaml => {
                let mapping = doc
                    .iter()
                    .map(|(k, v)| (serde_yaml::Value::String(k.clone()), to_yaml(v)))
                    .collect::<serde_yaml::Mapping>();
                serde_yaml::to_string(&mapping).map_err(|e| EngineError::invalid_document(path, e))
            }
        }
    }

    /// Text for `doc` replacing `current`, the target's existing text.
    ///
    /// `current` comes back untouched when the merge changed nothing. A YAML
    /// target carrying comments or anchors is refused, since re-encoding it
    /// would drop them.
    fn reencode(
        &self,
        path: &Path,
        current: &str,
        before: &Document,
        after: &Document,
    ) -> EngineResult<String> {
        if before == after {
            return Ok(current.to_string());
        }
        if *self == DocumentFormat::Yaml && has_yaml_trivia(current) {
            return Err(EngineError::invalid_document(
                path,
                "comments or anchors would be lost by rewriting; merge this file by hand",
            ));
        }

        let encoded = self.encode(path, after, &Indent::detect(current))?;
        if current.starts_with(BOM) {
            Ok(format!("{}{}", BOM, encoded))
        } else {
            Ok(encoded)
        }
    }
}

/// serde_json numbers keep their source text, which serde_yaml cannot
/// serialize directly
fn to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                serde_yaml::Value::Number(f.into())
            } else {
                serde_yaml::Value::String(n.to_string())
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => serde_yaml::Value::Sequence(items.iter().map(to_yaml).collect()),
        Value::Object(map) => serde_yaml::Value::Mapping(
            map.iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), to_yaml(v)))
                .collect(),
        ),
    }
}

/// Whether YAML text has comments, anchors or aliases
fn has_yaml_trivia(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        let item = trimmed.strip_prefix("- ").unwrap_or(trimmed);
        trimmed.starts_with('#')
            || line.contains(" #")
            || line.contains("\t#")
            || item.starts_with('&')
            || item.starts_with('*')
            || item.starts_with("<<:")
            || line.contains(": &")
            || line.contains(": *")
    })
}

/// Indentation unit of a JSON document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indent(String);

impl Default for Indent {
    fn default() -> Self {
        Indent("  ".to_string())
    }
}

impl Indent {
    /// Indentation of the first indented line, or two spaces
    pub fn detect(text: &str) -> Self {
        for line in text.lines() {
            let trimmed = line.trim_start_matches([' ', '\t']);
            if trimmed.is_empty() || trimmed.len() == line.len() {
                continue;
            }
            let lead = &line[..line.len() - trimmed.len()];
            if lead.starts_with('\t') {
                return Indent("\t".to_string());
            }
            return Indent(" ".repeat(lead.len()));
        }
        Indent::default()
    }
}

/// Apply `patch` to `doc` in place
pub fn merge_patch(doc: &mut Document, patch: &Patch) {
    for (key, value) in patch.iter() {
        match (doc.get_mut(key), value) {
            (Some(Value::Object(existing)), PatchValue::Mapping(nested)) => {
                merge_patch(existing, nested)
            }
            _ => {
                doc.insert(key.to_string(), value.to_value());
            }
        }
    }
}

fn decode_document<'a>(path: &Path, bytes: &'a [u8]) -> EngineResult<&'a str> {
    decode(path, bytes).map_err(|_| EngineError::invalid_document(path, "not valid UTF-8"))
}

impl Engine {
    /// Deep-merge `patch` into a structured document.
    ///
    /// Keys are applied in patch order, so one call with several keys is
    /// the same as several single-key calls.
    pub fn apply_structured_merge(
        &self,
        path: impl AsRef<Path>,
        patch: &Patch,
        policy: Policy,
    ) -> EngineResult<FileChange> {
        let relative = path.as_ref();
        let full = self.resolve(relative)?;
        let existing = Self::read_existing(&full)?;
        let format = DocumentFormat::for_path(relative);

        let contents = match (&existing, policy) {
            (Some(_), Policy::SkipIfExists) => return Ok(Self::skipped(relative)),
            (Some(bytes), Policy::Merge) => {
                let text = decode_document(&full, bytes)?;
                let before = format.parse(&full, text)?;
                let mut doc = before.clone();
                merge_patch(&mut doc, patch);
                format.reencode(&full, text, &before, &doc)?
            }
            (Some(bytes), Policy::Overwrite) => {
                let indent = std::str::from_utf8(bytes)
                    .map(Indent::detect)
                    .unwrap_or_default();
                let mut doc = Document::new();
                merge_patch(&mut doc, patch);
                format.encode(&full, &doc, &indent)?
            }
            (None, _) => {
                let mut doc = Document::new();
                merge_patch(&mut doc, patch);
                format.encode(&full, &doc, &Indent::default())?
            }
        };

        Self::commit(relative, &full, existing.as_deref(), contents.as_bytes())
    }

    /// Set `scripts.<script_name>` in a manifest. The last value set wins.
    pub fn apply_script_entry(
        &self,
        path: impl AsRef<Path>,
        script_name: &str,
        command: &str,
    ) -> EngineResult<FileChange> {
        let patch = Patch::new().with("scripts", Patch::new().with(script_name, command));
        self.apply_structured_merge(path, &patch, Policy::Merge)
    }
}

/// Merge a rendered template document into the existing text of a target
pub(crate) fn merge_document_text(
    target: &Path,
    existing: &[u8],
    template: &Path,
    rendered: &str,
) -> EngineResult<String> {
    let format = DocumentFormat::for_path(target);
    let text = decode_document(target, existing)?;
    let before = format.parse(target, text)?;
    let incoming = format.parse(template, rendered)?;
    let mut doc = before.clone();
    merge_patch(&mut doc, &Patch::from(incoming));
    format.reencode(target, text, &before, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FileAction;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn read_json(dir: &TempDir, name: &str) -> Value {
        serde_json::from_str(&fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
    }

    fn keys(doc: &Value) -> Vec<&str> {
        doc.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_merge_inserts_missing_keys_at_end() {
        let mut doc: Document = serde_json::from_value(json!({"name": "demo", "version": "1.0.0"})).unwrap();
        merge_patch(&mut doc, &Patch::new().with("type", "module"));

        let value = Value::Object(doc);
        assert_eq!(keys(&value), vec!["name", "version", "type"]);
        assert_eq!(value["type"], "module");
    }

    #[test]
    fn test_merge_recurses_into_mappings() {
        let mut doc: Document = serde_json::from_value(json!({
            "scripts": {"start": "node index.js", "test": "jest"}
        }))
        .unwrap();
        merge_patch(
            &mut doc,
            &Patch::new().with("scripts", Patch::new().with("test", "vitest").with("dev", "vite")),
        );

        assert_eq!(
            Value::Object(doc),
            json!({"scripts": {"start": "node index.js", "test": "vitest", "dev": "vite"}})
        );
    }

    #[test]
    fn test_merge_replaces_scalars_and_sequences_in_place() {
        let mut doc: Document = serde_json::from_value(json!({
            "type": "commonjs",
            "files": ["lib"],
            "exports": "./index.js",
            "private": false
        }))
        .unwrap();
        merge_patch(
            &mut doc,
            &Patch::new()
                .with("type", "module")
                .with("files", vec!["dist"])
                .with("exports", Patch::new().with("import", "./dist/index.js")),
        );

        let value = Value::Object(doc);
        assert_eq!(keys(&value), vec!["type", "files", "exports", "private"]);
        assert_eq!(value["files"], json!(["dist"]));
        assert_eq!(value["exports"], json!({"import": "./dist/index.js"}));
    }

    #[test]
    fn test_disjoint_patches_compose() {
        let p1 = Patch::new().with("type", "module");
        let p2 = Patch::new().with("private", true);

        let mut sequential = Document::new();
        merge_patch(&mut sequential, &p1);
        merge_patch(&mut sequential, &p2);

        let mut combined = Document::new();
        merge_patch(&mut combined, &p1.clone().with("private", true));

        assert_eq!(sequential, combined);
    }

    #[test]
    fn test_overlapping_patches_later_wins() {
        let mut doc = Document::new();
        merge_patch(&mut doc, &Patch::new().with("types", "./index.d.ts"));
        merge_patch(&mut doc, &Patch::new().with("types", "./dist/index.d.ts"));
        assert_eq!(doc["types"], "./dist/index.d.ts");
    }

    #[test]
    fn test_indent_detection() {
        assert_eq!(Indent::detect("{\n    \"a\": 1\n}\n"), Indent("    ".to_string()));
        assert_eq!(Indent::detect("{\n\t\"a\": 1\n}\n"), Indent("\t".to_string()));
        assert_eq!(Indent::detect("{}"), Indent::default());
    }

    #[test]
    fn test_apply_creates_manifest() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(dir.path());

        let change = engine
            .apply_structured_merge("package.json", &Patch::new().with("type", "module"), Policy::Merge)
            .unwrap();
        assert_eq!(change.action, FileAction::Created);
        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            "{\n  \"type\": \"module\"\n}\n"
        );
    }

    #[test]
    fn test_apply_keeps_user_keys_order_and_indent() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\n    \"name\": \"demo\",\n    \"dependencies\": {\n        \"react\": \"^18.0.0\"\n    }\n}\n",
        )
        .unwrap();
        let engine = Engine::new(dir.path());

        engine
            .apply_structured_merge("package.json", &Patch::new().with("private", true), Policy::Merge)
            .unwrap();

        let text = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(text.contains("\n    \"name\": \"demo\""));
        let value = read_json(&dir, "package.json");
        assert_eq!(keys(&value), vec!["name", "dependencies", "private"]);
        assert_eq!(value["dependencies"]["react"], "^18.0.0");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(dir.path());
        let patch = Patch::new()
            .with("type", "module")
            .with("scripts", Patch::new().with("build", "tsc && vite build"));

        engine.apply_structured_merge("package.json", &patch, Policy::Merge).unwrap();
        let change = engine.apply_structured_merge("package.json", &patch, Policy::Merge).unwrap();
        assert_eq!(change.action, FileAction::Unchanged);
    }

    #[test]
    fn test_script_entry_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(dir.path());

        engine.apply_script_entry("package.json", "build", "tsc").unwrap();
        engine.apply_script_entry("package.json", "watch", "tsc -w").unwrap();
        engine.apply_script_entry("package.json", "build", "webpack").unwrap();

        let value = read_json(&dir, "package.json");
        assert_eq!(value["scripts"]["build"], "webpack");
        assert_eq!(value["scripts"]["watch"], "tsc -w");
        assert_eq!(keys(&value["scripts"]), vec!["build", "watch"]);
    }

    #[test]
    fn test_invalid_existing_document() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        let engine = Engine::new(dir.path());

        let err = engine
            .apply_script_entry("package.json", "test", "jest")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStructuredDocument { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_non_mapping_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "[1, 2]").unwrap();
        let engine = Engine::new(dir.path());

        let err = engine
            .apply_structured_merge("package.json", &Patch::new().with("a", 1i64), Policy::Merge)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStructuredDocument { .. }));
    }

    #[test]
    fn test_skip_and_overwrite_policies() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{\"name\": \"demo\"}").unwrap();
        let engine = Engine::new(dir.path());
        let patch = Patch::new().with("private", true);

        let change = engine
            .apply_structured_merge("package.json", &patch, Policy::SkipIfExists)
            .unwrap();
        assert_eq!(change.action, FileAction::Skipped);
        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            "{\"name\": \"demo\"}"
        );

        engine
            .apply_structured_merge("package.json", &patch, Policy::Overwrite)
            .unwrap();
        assert_eq!(read_json(&dir, "package.json"), json!({"private": true}));
    }

    #[test]
    fn test_yaml_documents_merge() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "name: demo\nbuild:\n  target: es2020\n").unwrap();
        let engine = Engine::new(dir.path());

        engine
            .apply_structured_merge(
                "config.yaml",
                &Patch::new().with("build", Patch::new().with("minify", true)),
                Policy::Merge,
            )
            .unwrap();

        let value: Value =
            serde_yaml::from_str(&fs::read_to_string(dir.path().join("config.yaml")).unwrap())
                .unwrap();
        assert_eq!(value, json!({"name": "demo", "build": {"target": "es2020", "minify": true}}));
    }

    #[test]
    fn test_merge_document_text_names_template_on_error() {
        let err = merge_document_text(
            Path::new("tsconfig.json"),
            b"{}",
            Path::new("assets/tsconfig.json"),
            "not json",
        )
        .unwrap_err();
        assert_eq!(err.path(), Path::new("assets/tsconfig.json"));
    }

    #[test]
    fn test_merge_keeps_number_text() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"big\": 12345678901234567890123,\n  \"exp\": 1e3,\n  \"ratio\": 0.10\n}\n",
        )
        .unwrap();
        let engine = Engine::new(dir.path());

        engine
            .apply_structured_merge("package.json", &Patch::new().with("type", "module"), Policy::Merge)
            .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            "{\n  \"big\": 12345678901234567890123,\n  \"exp\": 1e3,\n  \"ratio\": 0.10,\n  \"type\": \"module\"\n}\n"
        );
    }

    #[test]
    fn test_noop_merge_leaves_text_alone() {
        let dir = TempDir::new().unwrap();
        let original = "{\"name\":\"demo\",\"type\":\"module\"}";
        fs::write(dir.path().join("package.json"), original).unwrap();
        let engine = Engine::new(dir.path());

        let change = engine
            .apply_structured_merge("package.json", &Patch::new().with("type", "module"), Policy::Merge)
            .unwrap();
        assert_eq!(change.action, FileAction::Unchanged);
        assert_eq!(fs::read_to_string(dir.path().join("package.json")).unwrap(), original);
    }

    #[test]
    fn test_yaml_with_comments_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let original = "# keep me\nname: demo\n";
        fs::write(dir.path().join("config.yaml"), original).unwrap();
        let engine = Engine::new(dir.path());

        let err = engine
            .apply_structured_merge("config.yaml", &Patch::new().with("x", true), Policy::Merge)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStructuredDocument { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("config.yaml")).unwrap(), original);

        // nothing to add, so nothing to lose
        let change = engine
            .apply_structured_merge("config.yaml", &Patch::new().with("name", "demo"), Policy::Merge)
            .unwrap();
        assert_eq!(change.action, FileAction::Unchanged);
    }

    #[test]
    fn test_yaml_trivia_detection() {
        assert!(has_yaml_trivia("a: 1 # note\n"));
        assert!(has_yaml_trivia("base: &base\n  x: 1\nother:\n  <<: *base\n"));
        assert!(has_yaml_trivia("items:\n  - *ref\n"));
        assert!(!has_yaml_trivia("name: demo\nurl: http://x/#frag\n"));
    }

    #[test]
    fn test_yaml_numbers_encode_as_numbers() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "port: 8080\nratio: 0.5\n").unwrap();
        let engine = Engine::new(dir.path());

        engine
            .apply_structured_merge("config.yml", &Patch::new().with("workers", 4i64), Policy::Merge)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            "port: 8080\nratio: 0.5\nworkers: 4\n"
        );
    }

    #[test]
    fn test_manifest_with_bom() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "\u{feff}{\n  \"name\": \"demo\"\n}\n").unwrap();
        let engine = Engine::new(dir.path());

        engine.apply_script_entry("package.json", "test", "jest").unwrap();

        let text = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(text.starts_with('\u{feff}'));
        let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}')).unwrap();
        assert_eq!(value["name"], "demo");
        assert_eq!(value["scripts"]["test"], "jest");
    }
}
