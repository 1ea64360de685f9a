//! Preset discovery, parsing, and listing
//!
//! This module provides:
//! - Preset manifest types (`preset.yaml`)
//! - Discovery of presets under a local template root
//! - Template root resolution (flag, environment, embedded archive)
//! - Version compatibility checking

pub mod bundle;
pub mod catalog;
pub mod manifest;
pub mod version;

use crate::product::ProductConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use bundle::{build_archive, unpack_archive};
pub use catalog::{Preset, PresetCatalog};
pub use manifest::{
    CopyStep, LineSetStep, ManifestChanges, Parameter, PresetManifest, ScriptEntry,
};
pub use version::check_compatibility;

/// Where presets are read from
///
/// A bundled root owns the scratch directory its archive was unpacked into;
/// keep it alive for as long as presets from it are applied.
#[derive(Debug)]
pub enum TemplateRoot {
    Dir(PathBuf),
    Bundled(TempDir),
}

impl TemplateRoot {
    pub fn path(&self) -> &Path {
        match self {
            TemplateRoot::Dir(path) => path,
            TemplateRoot::Bundled(dir) => dir.path(),
        }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, TemplateRoot::Bundled(_))
    }
}

impl fmt::Display for TemplateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRoot::Dir(path) => write!(f, "{}", path.display()),
            TemplateRoot::Bundled(_) => write!(f, "bundled presets"),
        }
    }
}

/// Pick the template root: explicit flag, then the product's environment
/// variable, then the preset archive embedded in the binary.
pub fn resolve_template_root<C: ProductConfig>(
    config: &C,
    flag: Option<&Path>,
) -> Result<TemplateRoot> {
    if let Some(path) = flag {
        return Ok(TemplateRoot::Dir(path.to_path_buf()));
    }
    if let Some(dir) = std::env::var_os(config.template_dir_env()).filter(|d| !d.is_empty()) {
        return Ok(TemplateRoot::Dir(PathBuf::from(dir)));
    }

    let scratch = tempfile::Builder::new()
        .prefix(&format!("{}-presets-", config.name()))
        .tempdir()
        .context("Failed to create a directory for bundled presets")?;
    unpack_archive(config.bundled_presets(), scratch.path())?;
    Ok(TemplateRoot::Bundled(scratch))
}

/// Print every preset in the catalog
pub fn print_catalog<C: ProductConfig>(
    config: &C,
    root: &TemplateRoot,
    catalog: &PresetCatalog,
) -> Result<()> {
    println!(
        "{}",
        format!("{} presets in {}", config.display_name(), root)
            .cyan()
            .bold()
    );
    println!();

    if catalog.is_empty() {
        eprintln!("{} No presets found", "Warning:".yellow());
        return Ok(());
    }

    let width = catalog
        .presets()
        .iter()
        .map(|p| p.id.len())
        .max()
        .unwrap_or(0);

    for preset in catalog.presets() {
        println!(
            "  {} {:width$}  {} {}",
            "->".blue(),
            preset.id,
            preset.manifest.description,
            format!("({} files)", preset.manifest.file_count()).dimmed(),
            width = width
        );
    }

    println!();
    println!(
        "{} {} preset(s)",
        "Found".green().bold(),
        catalog.presets().len()
    );

    Ok(())
}
