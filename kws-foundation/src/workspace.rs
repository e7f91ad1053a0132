// kws - kws-foundation
// Module: Workspace Aggregator
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Single workspace size from all budget terms
//!
//! The aggregator never clamps. A negative overhead margin may reduce the
//! size, but a total below zero is a diagnostic, not a zero.

use crate::validation::ConfigDiagnostic;

/// Budget terms summed into the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorkspaceTerms {
    /// Sum of all class budgets
    pub class_bytes:      usize,
    /// Message buffer budget
    pub message_buffers:  usize,
    /// Stack budget charged to the workspace
    pub stack:            usize,
    /// Signed margin in KiB
    pub overhead_kib:     i64,
    /// Final split reserve of the arena allocator
    pub handler_overhead: usize,
}

/// Aggregated workspace size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorkspaceBudget {
    /// Terms that were summed, reported even when overridden
    pub terms:      WorkspaceTerms,
    /// Workspace size in bytes
    pub size:       usize,
    /// Size is the application's explicit override
    pub overridden: bool,
}

impl WorkspaceTerms {
    /// Exact signed sum of all terms
    #[must_use]
    pub fn sum(&self) -> i128 {
        // i128 holds five usize-sized terms without overflow
        self.class_bytes as i128
            + self.message_buffers as i128
            + self.stack as i128
            + i128::from(self.overhead_kib) * 1024
            + self.handler_overhead as i128
    }
}

/// Sum the terms, or trust an explicit override verbatim
pub fn aggregate(
    terms: WorkspaceTerms,
    explicit_size: Option<usize>,
) -> Result<WorkspaceBudget, ConfigDiagnostic> {
    if let Some(size) = explicit_size {
        return Ok(WorkspaceBudget { terms, size, overridden: true });
    }
    let computed = terms.sum();
    if computed < 0 {
        return Err(ConfigDiagnostic::WorkspaceUnderflow { computed });
    }
    let size = usize::try_from(computed).map_err(|_| ConfigDiagnostic::SizeOverflow { term: "workspace" })?;
    Ok(WorkspaceBudget { terms, size, overridden: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_all_terms() {
        let terms = WorkspaceTerms {
            class_bytes:      288,
            message_buffers:  192,
            stack:            1016,
            overhead_kib:     2,
            handler_overhead: 16,
        };
        let budget = aggregate(terms, None).unwrap();
        assert_eq!(budget.size, 288 + 192 + 1016 + 2048 + 16);
        assert!(!budget.overridden);
    }

    #[test]
    fn test_negative_margin() {
        let terms = WorkspaceTerms { class_bytes: 4096, overhead_kib: -2, ..WorkspaceTerms::default() };
        assert_eq!(aggregate(terms, None).unwrap().size, 2048);

        let terms = WorkspaceTerms { class_bytes: 1000, overhead_kib: -1, ..WorkspaceTerms::default() };
        assert_eq!(
            aggregate(terms, None),
            Err(ConfigDiagnostic::WorkspaceUnderflow { computed: -24 })
        );
    }

    #[test]
    fn test_override_is_verbatim() {
        let terms = WorkspaceTerms { class_bytes: 1 << 20, ..WorkspaceTerms::default() };
        let budget = aggregate(terms, Some(65536)).unwrap();
        assert_eq!(budget.size, 65536);
        assert!(budget.overridden);
    }

    #[test]
    fn test_overflow_is_reported() {
        let terms = WorkspaceTerms { class_bytes: usize::MAX, stack: usize::MAX, ..WorkspaceTerms::default() };
        assert_eq!(
            aggregate(terms, None),
            Err(ConfigDiagnostic::SizeOverflow { term: "workspace" })
        );
    }
}
