//! Zip `presets/` into OUT_DIR so the binary carries its own presets

use anyhow::{Context, Result};
use std::path::PathBuf;

fn main() -> Result<()> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let presets = manifest_dir.join("presets");
    println!("cargo:rerun-if-changed={}", presets.display());

    let archive = preset_core::templates::build_archive(&presets)?;

    let out = PathBuf::from(std::env::var("OUT_DIR")?).join("presets.zip");
    std::fs::write(&out, archive).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(())
}
