//! Preset discovery under a local template root
//!
//! A template root is a directory tree in which every directory holding a
//! `preset.yaml` is a preset. The preset id is its path relative to the
//! root, e.g. `esbuild/react/client`. Presets may nest; the `assets/`
//! directories are never searched.

use super::manifest::{PresetManifest, ASSETS_DIR, MANIFEST_FILE};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A loaded preset
#[derive(Debug, Clone)]
pub struct Preset {
    /// Path relative to the template root, `/`-separated
    pub id: String,
    /// Directory containing `preset.yaml`
    pub dir: PathBuf,
    pub manifest: PresetManifest,
}

impl Preset {
    /// Load the preset in `dir`, naming it relative to `root`
    pub fn load(root: &Path, dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest = PresetManifest::from_yaml(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        Ok(Self {
            id: preset_id(root, dir),
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.dir.join(ASSETS_DIR)
    }

    /// Source path of an asset listed in a copy step
    pub fn asset_path(&self, file: &str) -> PathBuf {
        self.assets_dir().join(file)
    }
}

fn preset_id(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// All presets found under one template root, sorted by id
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    root: PathBuf,
    presets: Vec<Preset>,
}

impl PresetCatalog {
    /// Walk `root` and load every preset manifest
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("Template directory not found: {}", root.display());
        }

        let mut presets = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !(e.file_type().is_dir() && (name == ASSETS_DIR || name == "node_modules"))
            });

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to walk template directory {}", root.display()))?;
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                if let Some(dir) = entry.path().parent() {
                    presets.push(Preset::load(&root, dir)?);
                }
            }
        }

        presets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { root, presets })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Find a preset by id, falling back to its display name
    pub fn get(&self, id_or_name: &str) -> Result<&Preset> {
        let wanted = id_or_name.trim_matches('/');
        self.presets
            .iter()
            .find(|p| p.id == wanted)
            .or_else(|| self.presets.iter().find(|p| p.manifest.name == wanted))
            .ok_or_else(|| {
                let available: Vec<&str> = self.presets.iter().map(|p| p.id.as_str()).collect();
                anyhow::anyhow!(
                    "Preset '{}' not found. Available presets: {}",
                    id_or_name,
                    available.join(", ")
                )
            })
    }
}
