// kws - cargo-kws
// Module: Output
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Human and JSON output

use anyhow::{Context, Result};
use colored::Colorize;
use kws_build_core::{Diagnostic, DiagnosticCollection, Severity};
use serde::Serialize;

/// Output format for diagnostics and results
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable with colors
    Human,
    /// JSON for tooling
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// One diagnostic as a colored line
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    };
    let code = diagnostic.code.as_deref().map(|code| format!("[{code}]")).unwrap_or_default();
    let mut line = format!(
        "{severity}{code}: {}\n  {} {}:{}:{}",
        diagnostic.message,
        "-->".blue(),
        diagnostic.file,
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1
    );
    for related in &diagnostic.related_info {
        line.push_str(&format!(
            "\n  {} {}:{}: {}",
            "note:".dimmed(),
            related.file,
            related.range.start.line + 1,
            related.message
        ));
    }
    line
}

/// Print a diagnostic collection in the chosen format
pub fn print_collection(collection: &DiagnosticCollection, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(collection),
        OutputFormat::Human => {
            for diagnostic in &collection.diagnostics {
                eprintln!("{}", format_diagnostic(diagnostic));
            }
            let summary = &collection.summary;
            if summary.has_errors() {
                eprintln!(
                    "{} {} error(s), {} warning(s)",
                    "rejected:".red().bold(),
                    summary.errors,
                    summary.warnings
                );
            }
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use kws_build_core::diagnostics::{Range, RelatedInfo};

    use super::*;

    #[test]
    fn test_format_diagnostic() {
        colored::control::set_override(false);
        let diagnostic = Diagnostic::new(
            "kernel.toml".into(),
            Range::single_line(4, 0, 25),
            Severity::Error,
            "fewer POSIX key/value pairs (2) than POSIX keys (4)".into(),
        )
        .with_code(1001)
        .with_related_info(RelatedInfo {
            file:    "kernel.toml".into(),
            range:   Range::single_line(3, 0, 14),
            message: "4 keys requested here".into(),
        });

        let text = format_diagnostic(&diagnostic);
        assert!(text.starts_with("error[KWS1001]: fewer POSIX"));
        assert!(text.contains("--> kernel.toml:5:1"));
        assert!(text.contains("note: kernel.toml:4: 4 keys requested here"));
    }
}
