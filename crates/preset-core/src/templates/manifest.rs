//! Preset manifest types and parsing

use crate::engine::Policy;
use crate::patch::Patch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path};

/// File name of a preset manifest
pub const MANIFEST_FILE: &str = "preset.yaml";

/// Directory (next to the manifest) holding the preset's template files
pub const ASSETS_DIR: &str = "assets";

/// Project manifest mutated by presets unless they say otherwise
pub const DEFAULT_PACKAGE_MANIFEST: &str = "package.json";

fn default_package_manifest() -> String {
    DEFAULT_PACKAGE_MANIFEST.to_string()
}

fn default_line_policy() -> Policy {
    Policy::Merge
}

/// A group of asset files copied with the same policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyStep {
    /// Paths relative to the assets directory; also the destination paths
    pub files: Vec<String>,

    /// Behaviour when the destination exists (defaults to overwrite)
    #[serde(default)]
    pub policy: Policy,

    /// Extra placeholder values for this step only
    #[serde(default)]
    pub substitutions: HashMap<String, String>,
}

/// One `scripts` entry in the package manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub name: String,
    pub command: String,
}

/// Changes to the project's package manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestChanges {
    #[serde(default = "default_package_manifest")]
    pub path: String,

    /// Deep-merged into the manifest before scripts are set
    #[serde(default)]
    pub merge: Patch,

    /// Applied in order; a repeated name keeps the last command
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
}

/// A placeholder value asked for before the preset runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Prompt shown to the user
    pub message: String,

    /// Used when the user accepts the prompt as is, or with `--yes`
    #[serde(default)]
    pub default: String,
}

/// Lines to add to a line-set file such as `.gitignore`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSetStep {
    pub path: String,
    pub lines: Vec<String>,
    #[serde(default = "default_line_policy")]
    pub policy: Policy,
}

/// Per-preset manifest (`<preset>/preset.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetManifest {
    /// Display name of the preset
    pub name: String,

    /// One-line description shown in listings
    pub description: String,

    /// Semver version for CLI compatibility checking
    pub version: String,

    /// Abort unless the package manifest already exists
    #[serde(default)]
    pub requires_manifest: bool,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub dev_dependencies: Vec<String>,

    #[serde(default)]
    pub directories: Vec<String>,

    #[serde(default)]
    pub copy: Vec<CopyStep>,

    /// Default placeholder values shared by every copy step
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Values to prompt for; their defaults apply when nobody is asked
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub manifest: Option<ManifestChanges>,

    #[serde(default)]
    pub lines: Vec<LineSetStep>,
}

impl PresetManifest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: PresetManifest = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Path of the package manifest this preset touches
    pub fn package_manifest(&self) -> &str {
        self.manifest
            .as_ref()
            .map(|m| m.path.as_str())
            .unwrap_or(DEFAULT_PACKAGE_MANIFEST)
    }

    /// Number of asset files across all copy steps
    pub fn file_count(&self) -> usize {
        self.copy.iter().map(|step| step.files.len()).sum()
    }

    /// Reject asset paths that would read outside the preset directory
    pub fn validate(&self) -> Result<()> {
        for file in self.copy.iter().flat_map(|step| step.files.iter()) {
            if !is_contained(file) {
                anyhow::bail!(
                    "Preset '{}' lists file '{}' outside its assets directory",
                    self.name,
                    file
                );
            }
        }
        Ok(())
    }
}

fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VITE_LIB: &str = r##"
name: vite-lib
description: vite for library build
version: 0.1.0
requires_manifest: true
dev_dependencies: [typescript, vite, vitest]
directories: [src]
copy:
  - files: [.gitignore, tsconfig.json, vite.config.ts, src/index.ts]
    policy: skip-if-exists
manifest:
  merge:
    type: module
    private: true
    exports:
      import: ./dist/index.js
      require: ./dist/index.cjs
  scripts:
    - name: dev
      command: vite build --watch
    - name: build
      command: tsc && vite build
lines:
  - path: .gitignore
    lines: ["# Logs", logs, "*.log", "", node_modules]
"##;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = PresetManifest::from_yaml(VITE_LIB).unwrap();

        assert_eq!(manifest.name, "vite-lib");
        assert!(manifest.requires_manifest);
        assert!(manifest.dependencies.is_empty());
        assert_eq!(manifest.dev_dependencies.len(), 3);
        assert_eq!(manifest.copy[0].policy, Policy::SkipIfExists);
        assert_eq!(manifest.file_count(), 4);
        assert_eq!(manifest.package_manifest(), "package.json");

        let changes = manifest.manifest.as_ref().unwrap();
        let keys: Vec<&str> = changes.merge.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["type", "private", "exports"]);
        assert_eq!(changes.scripts[1].command, "tsc && vite build");

        assert_eq!(manifest.lines[0].policy, Policy::Merge);
        assert_eq!(manifest.lines[0].lines[3], "");
    }

    #[test]
    fn test_parse_parameters() {
        let manifest = PresetManifest::from_yaml(
            r#"
name: esbuild-web-ext
description: webextension project, using esbuild
version: 0.1.0
parameters:
  - name: name
    message: extension name
    default: extension
  - name: homepage_url
    message: homepage url
"#,
        )
        .unwrap();

        assert_eq!(manifest.parameters.len(), 2);
        assert_eq!(manifest.parameters[0].message, "extension name");
        assert_eq!(manifest.parameters[0].default, "extension");
        assert_eq!(manifest.parameters[1].default, "");
    }

    #[test]
    fn test_copy_policy_defaults_to_overwrite() {
        let manifest = PresetManifest::from_yaml(
            "name: jest\ndescription: jest config\nversion: 0.1.0\ncopy:\n  - files: [jest.config.js]\n",
        )
        .unwrap();
        assert_eq!(manifest.copy[0].policy, Policy::Overwrite);
        assert!(manifest.manifest.is_none());
    }

    #[test]
    fn test_rejects_escaping_asset_paths() {
        let result = PresetManifest::from_yaml(
            "name: bad\ndescription: bad\nversion: 0.1.0\ncopy:\n  - files: [../../secret]\n",
        );
        assert!(result.is_err());

        let result = PresetManifest::from_yaml(
            "name: bad\ndescription: bad\nversion: 0.1.0\ncopy:\n  - files: [/etc/passwd]\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let result = PresetManifest::from_yaml(
            "name: x\ndescription: x\nversion: 0.1.0\ncopy:\n  - files: [a]\n    policy: sometimes\n",
        );
        assert!(result.is_err());
    }
}
