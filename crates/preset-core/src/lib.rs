//! Preset Core - Shared library for project preset CLIs
//!
//! This library applies declarative project presets (esbuild, vite, webpack,
//! jest setups and the like) to a directory without clobbering user edits.
//! Running the same preset twice leaves the project as it was after the
//! first run.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Merge Engine** - Idempotent file operations: line-set union,
//!   structured-document deep merge, template copy with placeholders,
//!   directory creation (`engine`, `patch`)
//! - **Layer 2: Presets** - `preset.yaml` manifests, discovery under a
//!   template root, and the runner that composes engine operations
//!   (`templates`, `generator`, `runtime`)
//! - **Layer 3: CLI/TUI Interface** - `ProductConfig` and optional
//!   cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use preset_core::{Engine, Patch, Policy};
//!
//! let engine = Engine::new("my-app");
//! engine.ensure_directories(["src", "dist"])?;
//! engine.apply_structured_merge("package.json", &Patch::new().with("type", "module"), Policy::Merge)?;
//! engine.apply_script_entry("package.json", "build", "node ./build.js")?;
//! engine.apply_line_set(".gitignore", &["node_modules", "dist"], Policy::Merge)?;
//! ```

pub mod engine;
pub mod error;
pub mod generator;
pub mod patch;
pub mod product;
pub mod runtime;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use engine::{DirAction, DirChange, Engine, FileAction, FileChange, FileKind, Policy, Substitutions};
pub use error::{EngineError, EngineResult};
pub use generator::{apply_preset, run_preset, RunOptions, RunReport};
pub use patch::{Patch, PatchValue, Scalar};
pub use product::ProductConfig;
pub use runtime::PackageManager;
pub use templates::{Preset, PresetCatalog, PresetManifest};

#[cfg(feature = "tui")]
pub use tui::{run, ApplyArgs};
