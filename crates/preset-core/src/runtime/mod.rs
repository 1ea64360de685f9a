//! Package manager detection and dependency installation
//!
//! This module provides:
//! - Package manager detection (npm, yarn, pnpm, bun) from lockfiles
//! - Dependency installation by running the package manager

pub mod check;
pub mod installer;

pub use check::{missing_dependencies, package_name, PackageManager, RuntimeInfo};
pub use installer::Installer;
