// kws - kws-build-core
// Module: Diagnostics
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! LSP-compatible diagnostics for configuration files
//!
//! Engine diagnostics carry no source positions. This module locates the
//! configuration key each one is about in the `kernel.toml` text, so editors
//! and CI annotations can point at the offending line.

use std::fmt;

use kws_error::DiagnosticCode;
use kws_foundation::{ConfigDiagnostic, ObjectClass, PlanNote};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Source tag of every diagnostic produced here
pub const SOURCE: &str = "kws";

/// LSP-compatible diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Elaboration cannot succeed
    Error,
    /// Elaboration changed a requested value
    Warning,
    /// Informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Position within a file (0-indexed, LSP format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line:      u32,
    /// Character offset (0-indexed)
    pub character: u32,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Position of a byte offset in `text`
    #[must_use]
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let before = &text[..offset.min(text.len())];
        let line = before.matches('\n').count();
        let character = before.rsplit('\n').next().map_or(0, |tail| tail.chars().count());
        Self::new(line as u32, character as u32)
    }
}

/// Range within a file (LSP format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end:   Position,
}

impl Range {
    /// Create a new range
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range for a single line
    #[must_use]
    pub fn single_line(line: u32, start_char: u32, end_char: u32) -> Self {
        Self::new(Position::new(line, start_char), Position::new(line, end_char))
    }

    /// Range of a byte span in `text`
    #[must_use]
    pub fn from_span(text: &str, span: std::ops::Range<usize>) -> Self {
        Self::new(Position::from_offset(text, span.start), Position::from_offset(text, span.end))
    }

    /// Start of the file
    #[must_use]
    pub fn file_start() -> Self {
        Self::single_line(0, 0, 0)
    }
}

/// Related diagnostic information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInfo {
    /// File path
    pub file:    String,
    /// Range within the file
    pub range:   Range,
    /// Related message
    pub message: String,
}

/// Individual diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File path
    pub file:         String,
    /// Range within the file
    pub range:        Range,
    /// Severity level
    pub severity:     Severity,
    /// `KWS####` code, absent for notes
    pub code:         Option<String>,
    /// Human-readable message
    pub message:      String,
    /// Source tool
    pub source:       String,
    /// Keys that contributed to the diagnostic
    pub related_info: Vec<RelatedInfo>,
}

impl Diagnostic {
    /// Create a new diagnostic
    #[must_use]
    pub fn new(file: String, range: Range, severity: Severity, message: String) -> Self {
        Self {
            file,
            range,
            severity,
            code: None,
            message,
            source: SOURCE.to_string(),
            related_info: Vec::new(),
        }
    }

    /// Set the numeric code
    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(DiagnosticCode(code).to_string());
        self
    }

    /// Add related information
    #[must_use]
    pub fn with_related_info(mut self, related: RelatedInfo) -> Self {
        self.related_info.push(related);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file,
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.severity
        )?;
        if let Some(code) = &self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Summary statistics for a diagnostic collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    /// Total number of diagnostics
    pub total:       usize,
    /// Number of errors
    pub errors:      usize,
    /// Number of warnings
    pub warnings:    usize,
    /// Number of info messages
    pub infos:       usize,
    /// Duration of the operation in milliseconds
    pub duration_ms: u64,
}

impl DiagnosticSummary {
    /// Create summary from diagnostics
    #[must_use]
    pub fn from_diagnostics(diagnostics: &[Diagnostic], duration_ms: u64) -> Self {
        let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
        Self {
            total: diagnostics.len(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            duration_ms,
        }
    }

    /// Check if there are any errors
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Collection of diagnostics with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticCollection {
    /// Version of the diagnostic format
    pub version:     String,
    /// Timestamp when diagnostics were generated
    pub timestamp:   String,
    /// Command that generated these diagnostics
    pub command:     String,
    /// Individual diagnostics
    pub diagnostics: Vec<Diagnostic>,
    /// Summary statistics
    pub summary:     DiagnosticSummary,
}

impl DiagnosticCollection {
    /// Create an empty collection
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            version:     "1.0".to_string(),
            timestamp:   chrono::Utc::now().to_rfc3339(),
            command:     command.into(),
            diagnostics: Vec::new(),
            summary:     DiagnosticSummary::default(),
        }
    }

    /// Add a diagnostic
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add multiple diagnostics
    pub fn add_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Finalize the collection with timing information
    #[must_use]
    pub fn finalize(mut self, duration_ms: u64) -> Self {
        self.summary = DiagnosticSummary::from_diagnostics(&self.diagnostics, duration_ms);
        self
    }

    /// Check if the collection has any errors
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Locates configuration keys in the text of one `kernel.toml`
#[derive(Debug, Clone, Copy)]
pub struct SourceMap<'a> {
    file: &'a str,
    text: &'a str,
}

impl<'a> SourceMap<'a> {
    /// Map over `text`, reported as `file`
    #[must_use]
    pub fn new(file: &'a str, text: &'a str) -> Self {
        Self { file, text }
    }

    /// Map of a file on disk; positions fall back to the file start
    #[must_use]
    pub fn without_text(file: &'a str) -> Self {
        Self { file, text: "" }
    }

    /// Range of the first line assigning `key`
    #[must_use]
    pub fn key(&self, key: &str) -> Range {
        self.find_line(|line| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .unwrap_or_else(Range::file_start)
    }

    /// Range of the `nth` occurrence of a table header such as `[[message_queue]]`
    #[must_use]
    pub fn header(&self, header: &str, nth: usize) -> Range {
        self.text
            .lines()
            .enumerate()
            .filter(|(_, line)| line.trim() == header)
            .nth(nth)
            .map_or_else(Range::file_start, |(index, line)| line_range(index, line))
    }

    fn find_line(&self, matches: impl Fn(&str) -> bool) -> Option<Range> {
        self.text
            .lines()
            .enumerate()
            .find(|(_, line)| matches(line.trim_start()))
            .map(|(index, line)| line_range(index, line))
    }

    fn related(&self, key: &str, message: impl Into<String>) -> RelatedInfo {
        RelatedInfo { file: self.file.to_string(), range: self.key(key), message: message.into() }
    }

    fn diagnostic(&self, range: Range, severity: Severity, message: String) -> Diagnostic {
        Diagnostic::new(self.file.to_string(), range, severity, message)
    }

    /// Error diagnostic for an engine diagnostic
    #[must_use]
    pub fn config_diagnostic(&self, diagnostic: &ConfigDiagnostic) -> Diagnostic {
        let message = diagnostic.to_string();
        let error = |range| self.diagnostic(range, Severity::Error, message.clone()).with_code(diagnostic.code());

        match diagnostic {
            ConfigDiagnostic::CapabilityDisabled { class, capability, .. } => error(self.key(class.name()))
                .with_related_info(self.related(capability.name(), "capability is disabled here")),
            ConfigDiagnostic::KeyValuePairsBelowKeys { keys, .. } => {
                error(self.key(ObjectClass::PosixKeyValuePairs.name()))
                    .with_related_info(self.related(ObjectClass::PosixKeys.name(), format!("{keys} keys requested here")))
            },
            ConfigDiagnostic::WorkspaceOverrideWithExtraStacks { .. } => error(self.key("workspace_size"))
                .with_related_info(self.related("extra_task_stacks", "extra stacks requested here")),
            ConfigDiagnostic::StackAllocatorIncomplete { .. } => error(self.header("[stack.allocator]", 0)),
            ConfigDiagnostic::WorkspaceUnderflow { .. } => error(self.key("overhead_kib")),
            ConfigDiagnostic::EmptyMessageQueueDeclaration { index } => {
                error(self.header("[[message_queue]]", *index))
            },
            ConfigDiagnostic::SizeOverflow { .. } | ConfigDiagnostic::InvalidTargetProfile { .. } => {
                error(self.key("target"))
            },
        }
    }

    /// Warning or info diagnostic for a plan note
    #[must_use]
    pub fn plan_note(&self, note: &PlanNote) -> Diagnostic {
        match note {
            PlanNote::StackFloorRaised { class, requested, floor } => {
                let key = if *class == ObjectClass::PosixThreads {
                    "minimum_posix_thread_stack_size"
                } else {
                    "minimum_task_stack_size"
                };
                self.diagnostic(
                    self.key(key),
                    Severity::Warning,
                    format!("{key} raised from {requested} to the target minimum {floor}"),
                )
            },
            PlanNote::KeyValuePairsDefaulted { pairs } => self.diagnostic(
                self.key(ObjectClass::PosixKeys.name()),
                Severity::Info,
                format!("posix_key_value_pairs not set, defaulted to {pairs}"),
            ),
            PlanNote::WorkspaceOverridden { size, computed } => self.diagnostic(
                self.key("workspace_size"),
                Severity::Info,
                format!("explicit workspace size {size} replaces the computed {computed}"),
            ),
        }
    }

    /// Error diagnostic for a build error
    ///
    /// Rejections expand to one diagnostic per engine diagnostic.
    #[must_use]
    pub fn build_error(&self, error: &BuildError) -> Vec<Diagnostic> {
        match error {
            BuildError::Rejected(diagnostics) => {
                diagnostics.iter().map(|diagnostic| self.config_diagnostic(diagnostic)).collect()
            },
            BuildError::Toml { source, .. } => {
                let range = source
                    .span()
                    .map_or_else(Range::file_start, |span| Range::from_span(self.text, span));
                let message = source.message().to_string();
                vec![self.diagnostic(range, Severity::Error, message).with_code(error.code())]
            },
            BuildError::UnknownObjectClass(name) => {
                vec![self.diagnostic(self.key(name), Severity::Error, error.to_string()).with_code(error.code())]
            },
            BuildError::UnknownTarget(_) => {
                vec![self.diagnostic(self.key("target"), Severity::Error, error.to_string()).with_code(error.code())]
            },
            _ => vec![self.diagnostic(Range::file_start(), Severity::Error, error.to_string()).with_code(error.code())],
        }
    }
}

fn line_range(index: usize, line: &str) -> Range {
    let indent = line.len() - line.trim_start().len();
    Range::single_line(index as u32, indent as u32, line.trim_end().chars().count() as u32)
}

/// Collection for one finished command
#[must_use]
pub fn collect(command: &str, diagnostics: Vec<Diagnostic>, duration_ms: u64) -> DiagnosticCollection {
    let mut collection = DiagnosticCollection::new(command);
    collection.add_diagnostics(diagnostics);
    collection.finalize(duration_ms)
}
