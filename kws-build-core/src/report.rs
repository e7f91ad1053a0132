// kws - kws-build-core
// Module: Budget Report
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Workspace breakdown for humans and machines

use std::fmt::Write as _;

use colored::Colorize;
use kws_foundation::{TableKind, WorkspacePlan};
use serde::Serialize;

/// One class line of the breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLine {
    pub class:         &'static str,
    pub requested:     u32,
    pub effective:     usize,
    pub instance_size: usize,
    pub bytes:         usize,
}

/// One emitted table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLine {
    pub class:        &'static str,
    pub symbol:       String,
    pub capacity:     u32,
    pub element_size: usize,
    pub kind:         &'static str,
}

/// Workspace breakdown of one plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub target:             String,
    pub classes:            Vec<ClassLine>,
    pub class_bytes:        usize,
    pub message_buffers:    usize,
    pub stack:              usize,
    pub stack_in_workspace: bool,
    pub overhead_kib:       i64,
    pub handler_overhead:   usize,
    pub workspace_size:     usize,
    pub overridden:         bool,
    pub stack_space_size:   usize,
    pub tables:             Vec<TableLine>,
}

impl From<&WorkspacePlan> for BudgetReport {
    fn from(plan: &WorkspacePlan) -> Self {
        let terms = &plan.workspace.terms;
        Self {
            target:             plan.target.name.clone(),
            classes:            plan
                .classes
                .iter()
                .map(|budget| ClassLine {
                    class:         budget.class.name(),
                    requested:     budget.requested,
                    effective:     budget.effective,
                    instance_size: budget.instance_size,
                    bytes:         budget.bytes,
                })
                .collect(),
            class_bytes:        terms.class_bytes,
            message_buffers:    terms.message_buffers,
            stack:              terms.stack,
            stack_in_workspace: plan.stack.charged_to_workspace,
            overhead_kib:       terms.overhead_kib,
            handler_overhead:   terms.handler_overhead,
            workspace_size:     plan.workspace_size(),
            overridden:         plan.workspace.overridden,
            stack_space_size:   plan.stack_space_size(),
            tables:             plan
                .tables
                .iter()
                .map(|table| TableLine {
                    class:        table.class.name(),
                    symbol:       table.storage_symbol(),
                    capacity:     table.capacity,
                    element_size: table.element_size,
                    kind:         match table.kind {
                        TableKind::Information => "information",
                        TableKind::FlatArray => "flat_array",
                    },
                })
                .collect(),
        }
    }
}

impl BudgetReport {
    /// Breakdown for `cargo kws size`
    #[must_use]
    pub fn format_size(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", "Workspace budget for".bold(), self.target.cyan());
        let _ = writeln!(out, "  {:<28} {:>8} {:>8} {:>10} {:>12}", "class", "max", "n_eff", "instance", "bytes");
        for line in &self.classes {
            let _ = writeln!(
                out,
                "  {:<28} {:>8} {:>8} {:>10} {:>12}",
                line.class, line.requested, line.effective, line.instance_size, line.bytes
            );
        }
        let row = |out: &mut String, label: &str, value: String| {
            let _ = writeln!(out, "  {label:<58} {value:>12}");
        };
        row(&mut out, "objects", self.class_bytes.to_string());
        row(&mut out, "message buffers", self.message_buffers.to_string());
        let stack_label = if self.stack_in_workspace { "stacks" } else { "stacks (outside workspace)" };
        row(&mut out, stack_label, self.stack.to_string());
        row(&mut out, "overhead margin", format!("{} KiB", self.overhead_kib));
        row(&mut out, "handler overhead", self.handler_overhead.to_string());

        let total = if self.overridden {
            format!("{} (explicit)", self.workspace_size).yellow()
        } else {
            self.workspace_size.to_string().green()
        };
        let _ = writeln!(out, "  {:<58} {:>12}", "workspace".bold(), total.bold());
        let _ = writeln!(out, "  {:<58} {:>12}", "stack space", self.stack_space_size);
        out
    }

    /// Table listing for `cargo kws tables`
    #[must_use]
    pub fn format_tables(&self) -> String {
        if self.tables.is_empty() {
            return format!("{}\n", "no object tables (every maximum is zero)".dimmed());
        }
        let mut out = String::new();
        let _ = writeln!(out, "  {:<28} {:<32} {:>8} {:>8} {}", "class", "symbol", "capacity", "element", "kind");
        for line in &self.tables {
            let _ = writeln!(
                out,
                "  {:<28} {:<32} {:>8} {:>8} {}",
                line.class,
                line.symbol.cyan(),
                line.capacity,
                line.element_size,
                line.kind
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use kws_foundation::{Configuration, MemoryConfig, ObjectClass, TargetProfile, elaborate};

    use super::*;

    #[test]
    fn test_report_follows_the_plan() {
        let config = Configuration::new(TargetProfile::preset("aarch64").unwrap())
            .with_maximum(ObjectClass::Tasks, 2)
            .with_maximum(ObjectClass::Semaphores, 4)
            .with_memory(MemoryConfig { overhead_kib: 1, ..MemoryConfig::default() });
        let plan = elaborate(&config).unwrap();
        let report = BudgetReport::from(&plan);

        assert_eq!(report.workspace_size, plan.workspace_size());
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.tables[1].symbol, "SEMAPHORE_TABLE");
        assert_eq!(report.tables[1].kind, "information");
        assert_eq!(
            report.class_bytes + report.message_buffers + report.stack + 1024 + report.handler_overhead,
            report.workspace_size
        );

        colored::control::set_override(false);
        let size = report.format_size();
        assert!(size.contains("semaphores"));
        assert!(size.contains(&report.workspace_size.to_string()));
        assert!(report.format_tables().contains("TASK_TABLE"));
    }

    #[test]
    fn test_report_serializes() {
        let plan = elaborate(&Configuration::new(TargetProfile::preset("arm").unwrap())).unwrap();
        let json = serde_json::to_value(BudgetReport::from(&plan)).unwrap();
        assert_eq!(json["target"], "arm");
        assert_eq!(json["tables"].as_array().unwrap().len(), 0);
    }
}
