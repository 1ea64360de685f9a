//! Product configuration trait for CLI binaries
//!
//! A binary implements this trait to brand the preset runner and to tell it
//! where its presets live. Nothing in the library looks templates up from
//! the working directory or the build machine; the root comes from an
//! explicit flag, the product's env var, or the archive the binary embeds.

use crate::runtime::PackageManager;
use crate::templates::Preset;
use std::path::Path;

/// Configuration trait for CLI products built on the preset runner
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Environment variable that overrides the template root
    fn template_dir_env(&self) -> &'static str;

    /// Zip archive of the presets compiled into the binary, used when
    /// neither a flag nor the env var names a template root
    fn bundled_presets(&self) -> &'static [u8];

    /// URL for product documentation
    fn docs_url(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// Generate the "next steps" instructions after a preset is applied
    fn next_steps(&self, dir: &Path, preset: &Preset, package_manager: PackageManager)
        -> Vec<String>;
}
