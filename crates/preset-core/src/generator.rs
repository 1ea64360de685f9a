//! Preset runner
//!
//! Applies one preset to a project directory in a fixed order:
//!
//! 1. precondition checks
//! 2. dependency installation (delegated to the package manager)
//! 3. directories
//! 4. template copies
//! 5. package manifest merge, then script entries
//! 6. line-set additions
//!
//! Every step reads the files it touches fresh from disk, so later steps see
//! the effects of earlier ones. Nothing is rolled back on failure.

use crate::engine::{
    DirChange, DocumentFormat, Engine, FileChange, Policy, Substitutions,
};
use crate::runtime::{missing_dependencies, Installer, PackageManager};
use crate::templates::{CopyStep, Parameter, Preset};
use anyhow::{Context, Result};
use std::path::Path;

/// Built-in placeholder holding the project directory's name
pub const PROJECT_NAME_VAR: &str = "project_name";

/// Options for one preset run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Do not call the package manager at all
    pub skip_install: bool,

    /// Package manager to use instead of detecting one from lockfiles
    pub package_manager: Option<PackageManager>,

    /// Placeholder values given by the user; these win over preset values
    pub variables: Substitutions,
}

/// Everything a run did, in order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub directories: Vec<DirChange>,
    pub files: Vec<FileChange>,
    /// Runtime dependencies requested from the package manager
    pub installed: Vec<String>,
    /// Development dependencies requested from the package manager
    pub installed_dev: Vec<String>,
}

impl RunReport {
    /// Number of files created or updated
    pub fn written(&self) -> usize {
        self.files.iter().filter(|c| c.action.wrote()).count()
    }
}

/// Dependencies a preset still needs, split into (runtime, dev)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}

/// Fail early when the preset cannot be applied to `engine`'s project
pub fn check_preconditions(preset: &Preset, engine: &Engine) -> Result<()> {
    if preset.manifest.requires_manifest {
        let manifest = preset.manifest.package_manifest();
        let path = engine.resolve(Path::new(manifest))?;
        if !path.is_file() {
            anyhow::bail!(
                "{} does not exist in {}. Preset '{}' must be applied to an existing package.",
                manifest,
                engine.root().display(),
                preset.id
            );
        }
    }
    Ok(())
}

/// Work out which of the preset's dependencies are not declared yet
pub fn plan_install(preset: &Preset, engine: &Engine) -> Result<InstallPlan> {
    let manifest = preset.manifest.package_manifest();
    let path = engine.resolve(Path::new(manifest))?;

    let document = if path.is_file() {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Some(DocumentFormat::for_path(&path).parse(&path, &text)?)
    } else {
        None
    };

    Ok(InstallPlan {
        dependencies: missing_dependencies(document.as_ref(), &preset.manifest.dependencies),
        dev_dependencies: missing_dependencies(
            document.as_ref(),
            &preset.manifest.dev_dependencies,
        ),
    })
}

/// Substitutions for one copy step
pub fn substitutions_for(
    preset: &Preset,
    step: &CopyStep,
    project_dir: &Path,
    overrides: &Substitutions,
) -> Substitutions {
    let project_name = project_dir
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(project_dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    let mut subs = Substitutions::new();
    subs.insert(PROJECT_NAME_VAR.to_string(), project_name);
    subs.extend(preset.manifest.variables.clone());
    for param in &preset.manifest.parameters {
        subs.insert(param.name.clone(), param.default.clone());
    }
    subs.extend(step.substitutions.clone());
    subs.extend(overrides.clone());
    subs
}

/// Parameters that still need a value after the caller's own answers
pub fn unanswered_parameters<'a>(preset: &'a Preset, answers: &Substitutions) -> Vec<&'a Parameter> {
    preset
        .manifest
        .parameters
        .iter()
        .filter(|param| !answers.contains_key(&param.name))
        .collect()
}

/// Apply every file-level step of a preset (everything but installation)
pub fn apply_preset(preset: &Preset, engine: &Engine, variables: &Substitutions) -> Result<RunReport> {
    let manifest = &preset.manifest;
    let mut report = RunReport {
        directories: engine.ensure_directories(&manifest.directories)?,
        ..RunReport::default()
    };

    for step in &manifest.copy {
        let subs = substitutions_for(preset, step, engine.root(), variables);
        for file in &step.files {
            let change = engine.copy_template(preset.asset_path(file), file, step.policy, &subs)?;
            report.files.push(change);
        }
    }

    if let Some(changes) = &manifest.manifest {
        if !changes.merge.is_empty() {
            report.files.push(engine.apply_structured_merge(
                &changes.path,
                &changes.merge,
                Policy::Merge,
            )?);
        }
        for script in &changes.scripts {
            report
                .files
                .push(engine.apply_script_entry(&changes.path, &script.name, &script.command)?);
        }
    }

    for step in &manifest.lines {
        report
            .files
            .push(engine.apply_line_set(&step.path, &step.lines, step.policy)?);
    }

    Ok(report)
}

/// Run a preset against `project_dir`, installing dependencies first
pub async fn run_preset(
    preset: &Preset,
    project_dir: &Path,
    options: &RunOptions,
) -> Result<RunReport> {
    let engine = Engine::new(project_dir);
    check_preconditions(preset, &engine)?;

    std::fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;

    let mut installed = InstallPlan::default();
    if !options.skip_install {
        let plan = plan_install(preset, &engine)?;
        if !plan.is_empty() {
            let manager = options
                .package_manager
                .unwrap_or_else(|| PackageManager::detect(project_dir));
            let installer = Installer::new(manager);
            installer
                .install(project_dir, &plan.dependencies, false)
                .await?;
            installer
                .install(project_dir, &plan.dev_dependencies, true)
                .await?;
        }
        installed = plan;
    }

    let mut report = apply_preset(preset, &engine, &options.variables)
        .with_context(|| format!("Failed to apply preset '{}'", preset.id))?;
    report.installed = installed.dependencies;
    report.installed_dev = installed.dev_dependencies;
    Ok(report)
}
