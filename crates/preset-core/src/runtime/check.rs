//! Package manager detection for Node.js projects

use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

/// Supported JavaScript package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

/// Lockfiles in order of precedence
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Yarn,
        PackageManager::Pnpm,
        PackageManager::Bun,
    ];

    /// Executable name
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    pub fn docs_url(&self) -> &'static str {
        match self {
            PackageManager::Npm => "https://docs.npmjs.com/downloading-and-installing-node-js-and-npm",
            PackageManager::Yarn => "https://yarnpkg.com/getting-started/install",
            PackageManager::Pnpm => "https://pnpm.io/installation",
            PackageManager::Bun => "https://bun.sh/docs/installation",
        }
    }

    /// Pick the package manager a project already uses, npm if unknown
    pub fn detect(project_dir: &Path) -> Self {
        LOCKFILES
            .iter()
            .find(|(file, _)| project_dir.join(file).is_file())
            .map(|(_, pm)| *pm)
            .unwrap_or(PackageManager::Npm)
    }

    /// Arguments (after the binary) that add `packages` to the project
    pub fn install_args(&self, packages: &[String], dev: bool) -> Vec<String> {
        let mut args: Vec<String> = match (self, dev) {
            (PackageManager::Npm, false) => vec!["install".into(), "--save".into()],
            (PackageManager::Npm, true) => vec!["install".into(), "--save-dev".into()],
            (PackageManager::Yarn | PackageManager::Pnpm, false) => vec!["add".into()],
            (PackageManager::Yarn | PackageManager::Pnpm, true) => vec!["add".into(), "-D".into()],
            (PackageManager::Bun, false) => vec!["add".into()],
            (PackageManager::Bun, true) => vec!["add".into(), "-d".into()],
        };
        args.extend(packages.iter().cloned());
        args
    }

    /// Check whether the package manager is on PATH
    pub fn check(&self) -> RuntimeInfo {
        let output = Command::new(self.binary()).arg("--version").output();

        match output {
            Ok(out) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
                RuntimeInfo {
                    name: self.binary(),
                    version: Some(version),
                    available: true,
                }
            }
            _ => RuntimeInfo {
                name: self.binary(),
                version: None,
                available: false,
            },
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            "bun" => Ok(PackageManager::Bun),
            other => Err(format!(
                "unknown package manager '{}' (expected npm, yarn, pnpm or bun)",
                other
            )),
        }
    }
}

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

/// Package name of an install spec: `jszip@3.9.1` -> `jszip`,
/// `@types/node@20` -> `@types/node`
pub fn package_name(spec: &str) -> &str {
    let search_from = usize::from(spec.starts_with('@'));
    match spec[search_from..].find('@') {
        Some(idx) => &spec[..search_from + idx],
        None => spec,
    }
}

/// Packages from `specs` not yet declared in the manifest's
/// `dependencies` or `devDependencies`
pub fn missing_dependencies(manifest: Option<&Map<String, Value>>, specs: &[String]) -> Vec<String> {
    let declared = |name: &str| {
        manifest.is_some_and(|m| {
            ["dependencies", "devDependencies"].iter().any(|section| {
                m.get(*section)
                    .and_then(Value::as_object)
                    .is_some_and(|deps| deps.contains_key(name))
            })
        })
    };

    let mut missing: Vec<String> = Vec::new();
    for spec in specs {
        let name = package_name(spec);
        if !declared(name) && !missing.iter().any(|m| package_name(m) == name) {
            missing.push(spec.clone());
        }
    }
    missing
}
