//! Preset CLI - Apply project presets to a directory

use anyhow::Result;
use clap::{Parser, Subcommand};
use preset_core::templates::{self, PresetCatalog};
use preset_core::tui::{self, ApplyArgs};
use preset_core::{PackageManager, Preset, ProductConfig};
use std::path::{Path, PathBuf};

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Presets zipped by build.rs from this crate's `presets/` directory
static BUNDLED_PRESETS: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/presets.zip"));

/// Preset product configuration
#[derive(Clone)]
pub struct PresetConfig;

impl ProductConfig for PresetConfig {
    fn name(&self) -> &'static str {
        "preset"
    }

    fn display_name(&self) -> &'static str {
        "Preset"
    }

    fn template_dir_env(&self) -> &'static str {
        "PRESET_TEMPLATE_DIR"
    }

    fn bundled_presets(&self) -> &'static [u8] {
        BUNDLED_PRESETS
    }

    fn docs_url(&self) -> &'static str {
        "https://docs.npmjs.com/cli/commands/npm-run-script"
    }

    fn cli_description(&self) -> &'static str {
        "CLI for applying project presets (esbuild, vite, webpack, jest) to a directory"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install preset-cli --force"
    }

    fn next_steps(&self, dir: &Path, preset: &Preset, package_manager: PackageManager) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        // Step 1: cd to directory if not current
        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        // Step 2: Run the scripts the preset added
        if let Some(changes) = &preset.manifest.manifest {
            for script in &changes.scripts {
                steps.push(format!("{} run {}", package_manager.binary(), script.name));
            }
        }

        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "preset")]
#[command(about = "CLI for applying project presets (esbuild, vite, webpack, jest) to a directory")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a preset to a project directory
    Apply(CliApplyArgs),
    /// List the presets available in the template root
    List(ListArgs),
}

#[derive(Parser, Debug)]
pub struct CliApplyArgs {
    /// Preset id (e.g. esbuild/react/client) or name
    pub preset: String,

    /// Project directory to apply the preset to
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Directory containing presets (overrides PRESET_TEMPLATE_DIR)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Placeholder value, may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub set: Vec<(String, String)>,

    /// Package manager to install with (npm, yarn, pnpm, bun)
    #[arg(long = "package-manager")]
    pub package_manager: Option<PackageManager>,

    /// Do not install dependencies
    #[arg(long = "skip-install")]
    pub skip_install: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliApplyArgs> for ApplyArgs {
    fn from(args: CliApplyArgs) -> Self {
        ApplyArgs {
            template_dir: args.template_dir,
            preset: Some(args.preset),
            directory: args.directory,
            variables: args.set.into_iter().collect(),
            package_manager: args.package_manager,
            skip_install: args.skip_install,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory containing presets (overrides PRESET_TEMPLATE_DIR)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid KEY=VALUE: no `=` or empty key in `{}`", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_terminal_guards();

    let args = Args::parse();
    let config = PresetConfig;

    match args.command {
        Some(Command::Apply(apply_args)) => {
            let result = preset_core::run(&config, apply_args.into(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            tui::restore_cursor();

            result
        }
        Some(Command::List(list_args)) => {
            let root = templates::resolve_template_root(&config, list_args.template_dir.as_deref())?;
            let catalog = PresetCatalog::discover(root.path())?;
            templates::print_catalog(&config, &root, &catalog)
        }
        None => {
            // No subcommand provided, pick a preset interactively
            let result = preset_core::run(&config, ApplyArgs::default(), CLI_VERSION).await;

            tui::restore_cursor();

            result
        }
    }
}
