// kws - cargo-kws
// Module: Commands
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Subcommand implementations
//!
//! Each `execute` returns `Ok(false)` when the configuration was rejected;
//! `Err` is reserved for failures of the tool itself.

pub mod check;
pub mod emit;
pub mod size;
pub mod tables;
pub mod targets;

use std::time::Instant;

use kws_build_core::{
    ConfigSource, Diagnostic, DiagnosticCollection, SourceMap, diagnostics, elaborate_source,
};
use kws_foundation::WorkspacePlan;
use tracing::debug;

use crate::GlobalArgs;

/// Outcome of loading and elaborating the configuration
#[derive(Debug)]
pub struct Elaborated {
    /// Plan, absent when the configuration was rejected
    pub plan:        Option<WorkspacePlan>,
    /// Errors of a rejection, or the notes of a plan
    pub diagnostics: Vec<Diagnostic>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl Elaborated {
    /// Diagnostics as a finalized collection
    pub fn collection(&self, command: &str) -> DiagnosticCollection {
        diagnostics::collect(command, self.diagnostics.clone(), self.duration_ms)
    }
}

/// Load and elaborate the configuration named by the global arguments
pub fn elaborate(args: &GlobalArgs) -> Elaborated {
    let start = Instant::now();
    let label = args.config.to_string_lossy().into_owned();
    debug!(config = %label, target = ?args.target, "loading configuration");

    let (plan, diagnostics) = match ConfigSource::read(&args.config) {
        Err(error) => (None, SourceMap::without_text(&label).build_error(&error)),
        Ok(source) => {
            let map = SourceMap::new(&label, &source.text);
            match elaborate_source(&source, args.target.as_deref()) {
                Ok(plan) => {
                    let notes = plan.notes.iter().map(|note| map.plan_note(note)).collect();
                    (Some(plan), notes)
                },
                Err(error) => (None, map.build_error(&error)),
            }
        },
    };

    Elaborated {
        plan,
        diagnostics,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}


#[cfg(test)]
mod tests {
    use super::{test_support::*, *};

    #[test]
    fn test_missing_file_becomes_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let elaborated = elaborate(&args(&dir.path().join("absent.toml"), None));

        assert!(elaborated.plan.is_none());
        assert_eq!(elaborated.diagnostics.len(), 1);
        assert_eq!(elaborated.diagnostics[0].code.as_deref(), Some("KWS6000"));
    }

    #[test]
    fn test_notes_accompany_a_plan() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "[maximum]\ntasks = 2\nposix_keys = 1\n");
        let elaborated = elaborate(&args(&config, Some("arm")));

        assert!(elaborated.plan.is_some());
        assert!(!elaborated.collection("check").has_errors());
        assert!(elaborated.diagnostics.iter().any(|d| d.message.contains("defaulted to 2")));
    }
}
