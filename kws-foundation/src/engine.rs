// kws - kws-foundation
// Module: Elaboration Engine
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Single-pass elaboration of a configuration into a workspace plan
//!
//! The pass runs normalization, validation, the size models, the stack
//! calculator, aggregation and table emission in that order. It either
//! returns a complete [`WorkspacePlan`] or every diagnostic it found; a plan
//! is never produced from a configuration that failed a rule.

use alloc::{vec, vec::Vec};

use kws_error::Error;

use crate::{
    config::{Configuration, StackAllocatorConfig},
    geometry::HeapGeometry,
    limits::ResourceLimits,
    normalize::normalize,
    object_class::ObjectClass,
    platform::TargetProfile,
    size_model::{ClassBudget, MessageBufferBudget, ReservationRule, SizeModel, message_buffer_budget},
    stack::{StackBudget, StackCalculator, StackExtras, StackRequirement, StackSource},
    startup::{SysinitItem, SysinitOrder, SysinitStage},
    table::{TableDescriptor, plan_tables},
    validation::{ConfigDiagnostic, Diagnostics, validate},
    workspace::{WorkspaceBudget, WorkspaceTerms, aggregate},
};
#[cfg(feature = "tracing")]
use crate::trace::{ElaborationTrace, debug, info, warn};

/// Non-fatal observation made during elaboration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum PlanNote {
    /// A requested minimum stack was raised to the target floor
    StackFloorRaised {
        /// Thread class
        class:     ObjectClass,
        /// Requested minimum
        requested: usize,
        /// Target floor
        floor:     usize,
    },
    /// Key/value pairs were derived from keys and threads
    KeyValuePairsDefaulted {
        /// Derived maximum
        pairs: u32,
    },
    /// An explicit workspace size replaced the computed one
    WorkspaceOverridden {
        /// Explicit size
        size:     usize,
        /// Size the aggregator would have computed
        computed: i128,
    },
}

/// Memory initialization and layout flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemoryFlags {
    /// Workspace and program heap share one area
    pub unified_work_areas: bool,
    /// Zero the workspace before use
    pub zero_before_use:    bool,
    /// Dirty memory at startup
    pub dirty_memory:       bool,
}

/// Result of one elaboration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorkspacePlan {
    /// Target the plan was computed for
    pub target:                          TargetProfile,
    /// Arena geometry of the target
    pub geometry:                        HeapGeometry,
    /// Normalized maximums
    pub limits:                          ResourceLimits,
    /// Budget of every class with a nonzero maximum
    pub classes:                         Vec<ClassBudget>,
    /// Message buffer budget
    pub message_buffers:                 MessageBufferBudget,
    /// Stack budget
    pub stack:                           StackBudget,
    /// Workspace size and its terms
    pub workspace:                       WorkspaceBudget,
    /// Effective minimum task stack
    pub minimum_task_stack_size:         usize,
    /// Effective minimum POSIX thread stack
    pub minimum_posix_thread_stack_size: usize,
    /// Emitted tables
    pub tables:                          Vec<TableDescriptor>,
    /// Memory flags
    pub flags:                           MemoryFlags,
    /// Memory initialization items
    pub sysinit:                         Vec<SysinitItem>,
    /// Custom stack allocator hooks
    pub stack_allocator:                 Option<StackAllocatorConfig>,
    /// Non-fatal observations
    pub notes:                           Vec<PlanNote>,
}

impl WorkspacePlan {
    /// Workspace size in bytes
    #[must_use]
    pub const fn workspace_size(&self) -> usize {
        self.workspace.size
    }

    /// Stack space in bytes
    #[must_use]
    pub const fn stack_space_size(&self) -> usize {
        self.stack.total
    }

    /// Emitted table of a class
    #[must_use]
    pub fn table(&self, class: ObjectClass) -> Option<&TableDescriptor> {
        self.tables.iter().find(|table| table.class == class)
    }

    /// Budget of a class, `None` when its maximum is zero
    #[must_use]
    pub fn class_budget(&self, class: ObjectClass) -> Option<&ClassBudget> {
        self.classes.iter().find(|budget| budget.class == class)
    }
}

fn overflowed(term: &'static str) -> Diagnostics {
    ConfigDiagnostic::SizeOverflow { term }.into()
}

fn overflow(term: &'static str) -> impl Fn(Error) -> Diagnostics {
    move |_| overflowed(term)
}

struct StackMinimums {
    task:         usize,
    posix_thread: usize,
}

fn stack_minimums(config: &Configuration, notes: &mut Vec<PlanNote>) -> Result<StackMinimums, Diagnostics> {
    let floor = config.target.minimum_stack_size;
    let mut floored = |class: ObjectClass, requested: usize| {
        if requested < floor {
            notes.push(PlanNote::StackFloorRaised { class, requested, floor });
            floor
        } else {
            requested
        }
    };

    let task = floored(ObjectClass::Tasks, config.stack.minimum_task_stack_size.unwrap_or(floor));
    let posix_thread = match config.stack.minimum_posix_thread_stack_size {
        Some(requested) => requested,
        None => task.checked_mul(2).ok_or_else(|| overflowed("posix thread stack"))?,
    };
    let posix_thread = floored(ObjectClass::PosixThreads, posix_thread);
    Ok(StackMinimums { task, posix_thread })
}

fn stack_extras(
    config: &Configuration,
    calculator: &StackCalculator,
    requirements: &[StackRequirement],
) -> Result<StackExtras, Diagnostics> {
    let init_extra = |class: ObjectClass, init_size: Option<usize>| -> Result<usize, Diagnostics> {
        match (init_size, requirements.iter().find(|requirement| requirement.class == class)) {
            (Some(init_size), Some(requirement)) => calculator
                .initialization_extra(requirement, init_size)
                .map_err(overflow("init stacks")),
            _ => Ok(0),
        }
    };
    let initialization = init_extra(ObjectClass::Tasks, config.stack.init_task_stack_size)?
        .checked_add(init_extra(ObjectClass::PosixThreads, config.stack.posix_init_thread_stack_size)?)
        .ok_or_else(|| overflowed("init stacks"))?;

    let buffering = match config.block_buffering {
        Some(buffering) => usize::try_from(buffering.workers)
            .ok()
            .and_then(|workers| workers.checked_mul(buffering.worker_stack_size))
            .and_then(|workers| workers.checked_add(buffering.swapout_stack_size))
            .ok_or_else(|| overflowed("block buffering stacks"))?,
        None => 0,
    };

    Ok(StackExtras { initialization, buffering, application: config.stack.extra_task_stacks })
}

/// Elaborate a configuration into a workspace plan
///
/// # Errors
///
/// Every diagnostic raised by the normalizer and the validation rules, or the
/// first arithmetic diagnostic of the size computation.
pub fn elaborate(config: &Configuration) -> Result<WorkspacePlan, Diagnostics> {
    #[cfg(feature = "tracing")]
    let _span = ElaborationTrace::elaborating(&config.target.name, config.limits.len()).entered();

    let geometry = HeapGeometry::for_profile(&config.target)
        .map_err(|error| Diagnostics::from(ConfigDiagnostic::InvalidTargetProfile { reason: error.message }))?;

    let normalized = {
        #[cfg(feature = "tracing")]
        let _span = ElaborationTrace::validating().entered();

        let normalized = normalize(&config.limits, &config.capabilities);
        let mut diagnostics = normalized.diagnostics.clone();
        diagnostics.extend(validate(config, &normalized.limits));
        if !diagnostics.is_empty() {
            #[cfg(feature = "tracing")]
            warn!(count = diagnostics.len(), "configuration rejected");
            return Err(diagnostics);
        }
        normalized
    };
    let limits = normalized.limits;
    let mut notes = Vec::new();
    if let Some(pairs) = normalized.defaulted_key_value_pairs {
        notes.push(PlanNote::KeyValuePairsDefaulted { pairs });
    }

    let reservation = ReservationRule { secondary_node: config.capabilities.multiprocessing };
    let classes = {
        #[cfg(feature = "tracing")]
        let _span = ElaborationTrace::sizing(limits.used().count()).entered();

        let model = SizeModel::new(geometry, &config.target, &config.layouts, reservation);
        limits
            .used()
            .map(|limit| model.budget(limit.class, limit.maximum))
            .collect::<kws_error::Result<Vec<_>>>()
            .map_err(overflow("class budget"))?
    };
    let class_bytes = classes
        .iter()
        .try_fold(0usize, |sum, budget| sum.checked_add(budget.bytes))
        .ok_or_else(|| overflowed("class budgets"))?;

    let message_buffers = message_buffer_budget(
        &geometry,
        &config.target,
        &config.message_queues,
        config.memory.message_buffer_memory,
    )
    .map_err(overflow("message buffers"))?;

    let overridden = config.memory.workspace_size.is_some();
    let minimums = stack_minimums(config, &mut notes)?;
    let fp_context_size = if config.stack.floating_point { config.target.fp_context_size } else { 0 };
    let requirements = if overridden {
        Vec::new()
    } else {
        vec![
            StackRequirement {
                class: ObjectClass::Tasks,
                count: limits.get(ObjectClass::Tasks),
                stack_size: minimums.task,
                fp_context_size,
            },
            StackRequirement {
                class: ObjectClass::PosixThreads,
                count: limits.get(ObjectClass::PosixThreads),
                stack_size: minimums.posix_thread,
                fp_context_size,
            },
        ]
    };
    let source = match &config.stack.allocator {
        Some(allocator) => StackSource::Custom {
            avoids_workspace: allocator.avoids_workspace,
            granule:          allocator.estimate_granule.filter(|&granule| granule > 0),
        },
        None => StackSource::Workspace,
    };
    let stack = {
        #[cfg(feature = "tracing")]
        let _span = ElaborationTrace::stacks(source.charges_workspace()).entered();

        let calculator = StackCalculator::new(geometry, reservation, source);
        let extras = stack_extras(config, &calculator, &requirements)?;
        calculator.budget(&requirements, extras).map_err(overflow("stack budget"))?
    };

    let terms = WorkspaceTerms {
        class_bytes,
        message_buffers: message_buffers.total,
        stack: if stack.charged_to_workspace { stack.total } else { 0 },
        overhead_kib: config.memory.overhead_kib,
        handler_overhead: geometry.handler_overhead,
    };
    let workspace = aggregate(terms, config.memory.workspace_size).map_err(Diagnostics::from)?;
    if workspace.overridden {
        notes.push(PlanNote::WorkspaceOverridden { size: workspace.size, computed: terms.sum() });
    }

    let tables = plan_tables(&limits, &config.layouts, &config.target).map_err(overflow("tables"))?;

    let flags = MemoryFlags {
        unified_work_areas: config.memory.unified_work_areas,
        zero_before_use:    config.memory.zero_workspace_automatically,
        dirty_memory:       config.memory.dirty_memory,
    };
    let mut sysinit = Vec::new();
    if flags.dirty_memory {
        sysinit.push(SysinitItem::new(SysinitStage::DirtyMemory, SysinitOrder::Middle));
    }
    if flags.zero_before_use {
        sysinit.push(SysinitItem::new(SysinitStage::ZeroWorkspace, SysinitOrder::Middle));
    }

    #[cfg(feature = "tracing")]
    {
        debug!(class_bytes, stack = stack.total, tables = tables.len(), "budget terms");
        info!(workspace = workspace.size, overridden = workspace.overridden, "workspace sized");
    }

    Ok(WorkspacePlan {
        target: config.target.clone(),
        geometry,
        limits,
        classes,
        message_buffers,
        stack,
        workspace,
        minimum_task_stack_size: minimums.task,
        minimum_posix_thread_stack_size: minimums.posix_thread,
        tables,
        flags,
        sysinit,
        stack_allocator: config.stack.allocator.clone(),
        notes,
    })
}

/// Normalized limits of a configuration, without sizing it
///
/// # Errors
///
/// Capability and validation diagnostics.
pub fn check(config: &Configuration) -> Result<ResourceLimits, Diagnostics> {
    let normalized = normalize(&config.limits, &config.capabilities);
    let mut diagnostics = normalized.diagnostics;
    if let Err(error) = config.target.validate() {
        diagnostics.push(ConfigDiagnostic::InvalidTargetProfile { reason: error.message });
    }
    diagnostics.extend(validate(config, &normalized.limits));
    if diagnostics.is_empty() { Ok(normalized.limits) } else { Err(diagnostics) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockBuffering, StackConfig};

    fn arm() -> Configuration {
        Configuration::new(TargetProfile::preset("arm").unwrap())
    }

    #[test]
    fn test_empty_configuration_is_handler_overhead() {
        let plan = elaborate(&arm()).unwrap();
        assert_eq!(plan.workspace_size(), plan.geometry.handler_overhead);
        assert!(plan.tables.is_empty());
        assert_eq!(plan.stack_space_size(), 0);
        assert!(plan.sysinit.is_empty());
    }

    #[test]
    fn test_stack_floor_raises_minimum() {
        let config = arm().with_stack(StackConfig {
            minimum_task_stack_size: Some(1024),
            ..StackConfig::default()
        });
        let plan = elaborate(&config).unwrap();
        assert_eq!(plan.minimum_task_stack_size, 4096);
        assert_eq!(plan.minimum_posix_thread_stack_size, 8192);
        assert!(plan.notes.contains(&PlanNote::StackFloorRaised {
            class:     ObjectClass::Tasks,
            requested: 1024,
            floor:     4096,
        }));
    }

    #[test]
    fn test_init_task_extra() {
        let config = arm().with_maximum(ObjectClass::Tasks, 1).with_stack(StackConfig {
            init_task_stack_size: Some(6144),
            floating_point: false,
            ..StackConfig::default()
        });
        let plan = elaborate(&config).unwrap();
        assert_eq!(plan.stack.extras.initialization, 2048);
        // align(4096 + 8, 16) = 4112 for the task, plus the extra and 8 handler overhead
        assert_eq!(plan.stack_space_size(), 4112 + 2048 + 8);
    }

    #[test]
    fn test_init_task_extra_keeps_workspace_monotone() {
        let config = |minimum: usize| {
            arm().with_maximum(ObjectClass::Tasks, 1).with_stack(StackConfig {
                minimum_task_stack_size: Some(minimum),
                init_task_stack_size: Some(10000),
                ..StackConfig::default()
            })
        };
        let smaller = elaborate(&config(4100)).unwrap();
        let larger = elaborate(&config(4112)).unwrap();
        // 4100 and 4112 share one aligned per-thread size, so nothing moves
        assert_eq!(larger.stack.threads[0].per_thread, smaller.stack.threads[0].per_thread);
        assert_eq!(larger.workspace_size(), smaller.workspace_size());
    }

    #[test]
    fn test_init_stacks_need_a_thread_class() {
        let config = arm().with_stack(StackConfig {
            init_task_stack_size: Some(10000),
            posix_init_thread_stack_size: Some(20000),
            ..StackConfig::default()
        });
        let plan = elaborate(&config).unwrap();
        assert_eq!(plan.stack.extras.initialization, 0);
        assert_eq!(plan.workspace_size(), plan.geometry.handler_overhead);
    }

    #[test]
    fn test_block_buffering_survives_override() {
        let mut config = arm().with_maximum(ObjectClass::Tasks, 4).with_block_buffering(BlockBuffering {
            swapout_stack_size: 2048,
            workers:            2,
            worker_stack_size:  1024,
        });
        config.memory.workspace_size = Some(32768);
        let plan = elaborate(&config).unwrap();
        assert_eq!(plan.workspace_size(), 32768);
        assert!(plan.stack.threads.is_empty());
        assert_eq!(plan.stack.extras.buffering, 4096);
    }

    #[test]
    fn test_sysinit_items() {
        let mut config = arm();
        config.memory.dirty_memory = true;
        config.memory.zero_workspace_automatically = true;
        let plan = elaborate(&config).unwrap();
        assert_eq!(plan.sysinit, [
            SysinitItem::new(SysinitStage::DirtyMemory, SysinitOrder::Middle),
            SysinitItem::new(SysinitStage::ZeroWorkspace, SysinitOrder::Middle),
        ]);
    }

    #[test]
    fn test_check_collects_without_sizing() {
        let config = arm().with_maximum(ObjectClass::PosixTimers, 2);
        let diagnostics = check(&config).unwrap_err();
        assert!(diagnostics.contains("capability_disabled"));
    }
}
