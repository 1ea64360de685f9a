//! Charm-style CLI prompts using cliclack

use crate::engine::{Engine, FileAction, Substitutions};
use crate::generator::{self, RunOptions, RunReport};
use crate::product::ProductConfig;
use crate::runtime::{Installer, PackageManager};
use crate::templates::{self, version, Preset, PresetCatalog, TemplateRoot};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// CLI arguments for the apply command
#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    /// Template root to load presets from instead of the default
    pub template_dir: Option<PathBuf>,

    /// Preset id or name to apply
    pub preset: Option<String>,

    /// Project directory to apply the preset to
    pub directory: Option<PathBuf>,

    /// Placeholder values that override the preset's own
    pub variables: Substitutions,

    /// Package manager to use instead of detecting one
    pub package_manager: Option<PackageManager>,

    /// Do not install dependencies
    pub skip_install: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// What to do about dependency installation
enum InstallDecision {
    Install(PackageManager),
    Skip,
    Abort,
}

/// Run the CLI with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: ApplyArgs, cli_version: &str) -> Result<()> {
    cliclack::intro(config.display_name())?;

    // Step 1: Load presets
    let root = templates::resolve_template_root(config, args.template_dir.as_deref())?;
    let catalog = load_catalog(&root)?;

    // Step 2: Select preset
    let preset = select_preset(&catalog, args.preset.as_deref())?;

    if let Some(warning) = version::check_compatibility(
        cli_version,
        &preset.manifest.name,
        &preset.manifest.version,
        config.upgrade_command(),
    ) {
        cliclack::log::warning(format!(
            "Version warning: {}",
            warning.lines().next().unwrap_or(&warning)
        ))?;
    }

    // Step 3: Select directory and fill in the preset's parameters
    let project_dir = select_directory(&args)?;
    let variables = ask_parameters(preset, &args)?;

    // Step 4: Preconditions and dependency plan
    let engine = Engine::new(&project_dir);
    generator::check_preconditions(preset, &engine)?;

    let decision = if args.skip_install {
        cliclack::log::info("Skipping dependency installation")?;
        InstallDecision::Skip
    } else {
        handle_install_check(preset, &engine, &args)?
    };

    let (skip_install, package_manager) = match decision {
        InstallDecision::Install(pm) => (false, pm),
        InstallDecision::Skip => (true, PackageManager::detect(&project_dir)),
        InstallDecision::Abort => {
            cliclack::outro_cancel("Setup cancelled.")?;
            return Ok(());
        }
    };

    // Step 5: Confirm
    if !args.yes {
        let confirm: bool = cliclack::confirm(format!(
            "Apply '{}' to {}?",
            preset.id,
            project_dir.display()
        ))
        .initial_value(true)
        .interact()?;

        if !confirm {
            anyhow::bail!("Setup cancelled.");
        }
    }

    // Step 6: Apply
    let options = RunOptions {
        skip_install,
        package_manager: Some(package_manager),
        variables,
    };
    let report = apply(preset, &project_dir, &options).await?;

    // Step 7: Show changes and next steps
    print_changes(&report)?;
    print_next_steps(config, &project_dir, preset, package_manager)?;

    Ok(())
}

fn load_catalog(root: &TemplateRoot) -> Result<PresetCatalog> {
    let spinner = cliclack::spinner();
    spinner.start("Loading presets...");

    match PresetCatalog::discover(root.path()) {
        Ok(catalog) if catalog.is_empty() => {
            spinner.stop("No presets found");
            anyhow::bail!("No presets found in {}", root);
        }
        Ok(catalog) => {
            spinner.stop(format!(
                "Loaded {} presets from {}",
                catalog.presets().len(),
                root
            ));
            Ok(catalog)
        }
        Err(e) => {
            spinner.stop("Failed to load presets");
            Err(e)
        }
    }
}

fn select_preset<'a>(catalog: &'a PresetCatalog, specified: Option<&str>) -> Result<&'a Preset> {
    // If a preset was specified on the command line, use it directly
    if let Some(name) = specified {
        let preset = catalog.get(name)?;
        cliclack::log::info(format!(
            "Preset: {} - {}",
            preset.id, preset.manifest.description
        ))?;
        return Ok(preset);
    }

    let presets = catalog.presets();
    if let [only] = presets {
        cliclack::log::info(format!(
            "Using preset: {} - {}",
            only.id, only.manifest.description
        ))?;
        return Ok(only);
    }

    // Build select prompt - use indices to avoid borrow issues
    let mut select = cliclack::select("Select a preset");
    for (idx, preset) in presets.iter().enumerate() {
        select = select.item(idx, &preset.id, &preset.manifest.description);
    }

    let selected_idx: usize = select.interact()?;
    presets
        .get(selected_idx)
        .ok_or_else(|| anyhow::anyhow!("Invalid preset selection"))
}

fn select_directory(args: &ApplyArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Use --directory flag if provided
    let path = if let Some(dir) = &args.directory {
        let p = if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        };
        cliclack::log::info(format!("Using directory: {}", p.display()))?;
        p
    } else if args.yes {
        current_dir
    } else {
        let input: String = cliclack::input("Project directory")
            .placeholder(".")
            .default_input(".")
            .interact()?;

        if input.is_empty() || input == "." {
            current_dir
        } else {
            let p = PathBuf::from(&input);
            if p.is_absolute() {
                p
            } else {
                current_dir.join(p)
            }
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    if path.exists() && !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    Ok(path)
}

/// Ask for each parameter not given with `--set`. With `--yes` nothing is
/// asked and the defaults from `preset.yaml` apply.
fn ask_parameters(preset: &Preset, args: &ApplyArgs) -> Result<Substitutions> {
    let mut variables = args.variables.clone();
    let pending = generator::unanswered_parameters(preset, &args.variables);

    if args.yes {
        for param in pending {
            cliclack::log::remark(format!("{}: {}", param.message, param.default))?;
        }
        return Ok(variables);
    }

    for param in pending {
        let mut prompt = cliclack::input(&param.message);
        prompt = if param.default.is_empty() {
            prompt.required(false)
        } else {
            prompt.placeholder(&param.default).default_input(&param.default)
        };
        let value: String = prompt.interact()?;
        variables.insert(param.name.clone(), value);
    }

    Ok(variables)
}

fn handle_install_check(preset: &Preset, engine: &Engine, args: &ApplyArgs) -> Result<InstallDecision> {
    let plan = generator::plan_install(preset, engine)?;
    let manager = args
        .package_manager
        .unwrap_or_else(|| PackageManager::detect(engine.root()));

    if plan.is_empty() {
        cliclack::log::info("All dependencies already declared")?;
        return Ok(InstallDecision::Install(manager));
    }

    let installer = Installer::new(manager);
    let info = manager.check();
    if info.available {
        cliclack::log::success(format!(
            "{} installed ({})",
            info.name,
            info.version.as_deref().unwrap_or("unknown")
        ))?;
        let count = plan.dependencies.len() + plan.dev_dependencies.len();
        cliclack::log::info(format!("{} package(s) will be installed with {}", count, manager))?;
        return Ok(InstallDecision::Install(manager));
    }

    cliclack::log::warning(format!("{} is not installed", manager))?;

    // In non-interactive mode, just skip
    if args.yes {
        cliclack::log::info("Continuing without installing dependencies (--yes mode)")?;
        return Ok(InstallDecision::Skip);
    }

    let action: &str = cliclack::select("What would you like to do?")
        .item("skip", "Apply files only, install dependencies later", "")
        .item(
            "docs",
            format!("Open {} installation docs ({})", manager, manager.docs_url()),
            "",
        )
        .item("cancel", "Cancel", "")
        .interact()?;

    match action {
        "skip" => {
            cliclack::log::info("Dependencies will not be installed")?;
            if !plan.dependencies.is_empty() {
                cliclack::log::remark(format!(
                    "Later: {}",
                    installer.command_line(&plan.dependencies, false)
                ))?;
            }
            if !plan.dev_dependencies.is_empty() {
                cliclack::log::remark(format!(
                    "Later: {}",
                    installer.command_line(&plan.dev_dependencies, true)
                ))?;
            }
            Ok(InstallDecision::Skip)
        }
        "docs" => {
            installer.open_docs()?;
            Ok(InstallDecision::Abort)
        }
        _ => Ok(InstallDecision::Abort),
    }
}

async fn apply(preset: &Preset, project_dir: &Path, options: &RunOptions) -> Result<RunReport> {
    // Installer output streams to the terminal, so only spin when it won't run
    let spinner = options.skip_install.then(|| {
        let spinner = cliclack::spinner();
        spinner.start("Applying preset...");
        spinner
    });

    match generator::run_preset(preset, project_dir, options).await {
        Ok(report) => {
            let message = format!(
                "Applied {}: {} file(s) written in {}",
                preset.id,
                report.written(),
                project_dir.display()
            );
            match spinner {
                Some(spinner) => spinner.stop(message),
                None => cliclack::log::success(message)?,
            }
            Ok(report)
        }
        Err(e) => {
            if let Some(spinner) = spinner {
                spinner.stop("Failed to apply preset");
            }
            Err(e)
        }
    }
}

fn print_changes(report: &RunReport) -> Result<()> {
    let mut lines: Vec<String> = report
        .files
        .iter()
        .filter(|c| c.action != FileAction::Unchanged)
        .map(|c| format!("{:<9} {}", c.action.to_string(), c.path.display()))
        .collect();

    let unchanged = report.files.len() - lines.len();
    if unchanged > 0 {
        lines.push(format!("{} file(s) already up to date", unchanged));
    }

    cliclack::note("Changes", lines.join("\n"))?;
    Ok(())
}

fn print_next_steps<C: ProductConfig>(
    config: &C,
    project_dir: &Path,
    preset: &Preset,
    package_manager: PackageManager,
) -> Result<()> {
    let steps = config.next_steps(project_dir, preset, package_manager);

    if !steps.is_empty() {
        println!();
        println!("  Next steps");
        println!();

        for (i, step) in steps.iter().enumerate() {
            println!("  {}.  {}", i + 1, step);
        }
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}
