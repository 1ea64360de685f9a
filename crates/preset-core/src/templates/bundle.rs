//! Preset archives compiled into a binary
//!
//! A product zips its preset directory at build time and embeds the bytes.
//! At runtime the archive is unpacked into a scratch directory so presets
//! load the same way as a local template root.

use anyhow::{Context, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Zip every file under `root`, named by its `/`-separated relative path
pub fn build_archive(root: &Path) -> Result<Vec<u8>> {
    if !root.is_dir() {
        anyhow::bail!("Preset directory not found: {}", root.display());
    }

    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root)?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let content = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            zip.start_file(&name, options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
    }

    Ok(zip_buffer)
}

/// Extract an archive made by [`build_archive`] into `dest`.
/// Returns the number of files written.
pub fn unpack_archive(zip_bytes: &[u8], dest: &Path) -> Result<usize> {
    let mut archive =
        ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read preset archive")?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let Some(relative) = file.enclosed_name() else {
            anyhow::bail!("Preset archive entry escapes its root: {}", file.name());
        };
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target, contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }

    Ok(written)
}
