// kws - kws-build-core
// Module: Crate Root
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! kws Build Core - build-time front end of the workspace sizing engine
//!
//! Reads `kernel.toml`, runs [`kws_foundation::elaborate`] on it and turns
//! the result into the artifacts the rest of the build consumes:
//!
//! - **Generated module**: constants, object tables and the startup
//!   configuration, written as Rust source for `include!`
//! - **Diagnostics**: LSP-compatible, positioned on the offending key
//! - **Budget report**: workspace breakdown, human readable or JSON
//!
//! A consumer crate needs a two-line build script:
//!
//! ```no_run
//! fn main() {
//!     if let Err(error) = kws_build_core::run_build_script() {
//!         eprintln!("{error}");
//!         std::process::exit(1);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
// Lints configured in Cargo.toml

use std::{
    env,
    path::{Path, PathBuf},
};

use kws_foundation::WorkspacePlan;
use tracing::{info, info_span, warn};

pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod report;

pub use config::{ByteSize, ConfigSource, KernelFile, load_configuration};
pub use diagnostics::{Diagnostic, DiagnosticCollection, Severity, SourceMap};
pub use error::{BuildError, BuildResult};
pub use report::BudgetReport;

/// Build core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file of a build script
pub const CONFIG_ENV: &str = "KWS_CONFIG";

/// Environment variable overriding the target of a build script
pub const TARGET_ENV: &str = "KWS_TARGET";

/// File name of the generated module in `OUT_DIR`
pub const GENERATED_FILE: &str = "confdefs.rs";

/// Elaborate a configuration source
pub fn elaborate_source(source: &ConfigSource, target: Option<&str>) -> BuildResult<WorkspacePlan> {
    let _span = info_span!("elaborate_file", path = %source.path.display()).entered();
    let config = source.configuration(target)?;
    let plan = kws_foundation::elaborate(&config)?;
    info!(
        target = %plan.target.name,
        workspace_size = plan.workspace_size(),
        tables = plan.tables.len(),
        "configuration elaborated"
    );
    Ok(plan)
}

/// Read and elaborate a configuration file
pub fn elaborate_file(path: &Path, target: Option<&str>) -> BuildResult<WorkspacePlan> {
    elaborate_source(&ConfigSource::read(path)?, target)
}

/// Elaborate `config_path` and write the generated module to `out_file`
pub fn generate(config_path: &Path, target: Option<&str>, out_file: &Path) -> BuildResult<WorkspacePlan> {
    let source = ConfigSource::read(config_path)?;
    let plan = elaborate_source(&source, target)?;
    emit::write(&plan, &source.label(), out_file)?;
    Ok(plan)
}

/// Build script entry point
///
/// Reads `kernel.toml` (or `$KWS_CONFIG`) relative to the package root,
/// writes `$OUT_DIR/confdefs.rs` and reports plan notes as cargo warnings.
/// Rejections are also printed as warnings, one per diagnostic, before the
/// error is returned.
pub fn run_build_script() -> BuildResult<PathBuf> {
    let manifest_dir = required_env("CARGO_MANIFEST_DIR")?;
    let out_dir = required_env("OUT_DIR")?;
    let config_path = env::var_os(CONFIG_ENV)
        .map_or_else(|| config::default_config_path(&manifest_dir), |path| manifest_dir.join(path));
    let target = env::var(TARGET_ENV).ok();

    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-env-changed={CONFIG_ENV}");
    println!("cargo:rerun-if-env-changed={TARGET_ENV}");

    let out_file = out_dir.join(GENERATED_FILE);
    let source = ConfigSource::read(&config_path)?;
    let label = source.label();
    let map = SourceMap::new(&label, &source.text);

    let plan = match elaborate_source(&source, target.as_deref()) {
        Ok(plan) => plan,
        Err(error) => {
            for diagnostic in map.build_error(&error) {
                println!("cargo:warning={diagnostic}");
            }
            return Err(error);
        },
    };
    for note in &plan.notes {
        let diagnostic = map.plan_note(note);
        warn!(%diagnostic, "plan note");
        println!("cargo:warning={diagnostic}");
    }

    emit::write(&plan, &label, &out_file)?;
    Ok(out_file)
}

fn required_env(name: &'static str) -> BuildResult<PathBuf> {
    env::var_os(name).map(PathBuf::from).ok_or(BuildError::MissingEnv(name))
}
