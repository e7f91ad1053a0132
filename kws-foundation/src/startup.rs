// kws - kws-foundation
// Module: Startup Handoff
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Immutable configuration handed to the kernel startup code
//!
//! The generated module defines exactly one [`StartupConfiguration`] value.
//! The object allocator and the memory initialization code read it by
//! reference; nothing in it changes after the image is built.

use crate::{object_class::ObjectClass, stack::StackAllocatorHooks, table::TableDescriptor};

/// Startup stage a system initialization item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SysinitStage {
    /// Fill free memory with a pattern to expose uninitialized reads
    DirtyMemory,
    /// Zero the workspace before the first carve-out
    ZeroWorkspace,
}

/// Position of an item within its stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SysinitOrder {
    /// Runs before all other items of the stage
    First,
    /// Runs between the first and last items
    Middle,
    /// Runs after all other items of the stage
    Last,
}

/// One system initialization item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SysinitItem {
    /// Stage
    pub stage: SysinitStage,
    /// Order within the stage
    pub order: SysinitOrder,
}

impl SysinitItem {
    /// Create an item
    #[must_use]
    pub const fn new(stage: SysinitStage, order: SysinitOrder) -> Self {
        Self { stage, order }
    }
}

/// Everything the startup collaborator needs from the elaboration
#[derive(Debug, Clone, Copy)]
pub struct StartupConfiguration {
    /// Workspace size in bytes
    pub workspace_size:          usize,
    /// Stack space in bytes
    pub stack_space_size:        usize,
    /// Effective minimum task stack
    pub minimum_task_stack_size: usize,
    /// Workspace and program heap share one area
    pub workspace_is_unified:    bool,
    /// Zero the workspace before use
    pub zero_before_use:         bool,
    /// Custom stack allocator, if configured
    pub stack_allocator:         Option<StackAllocatorHooks>,
    /// Every emitted table
    pub tables:                  &'static [TableDescriptor],
    /// Memory initialization items
    pub sysinit:                 &'static [SysinitItem],
}

impl StartupConfiguration {
    /// Table of a class, `None` when its maximum is zero
    #[must_use]
    pub const fn table(&self, class: ObjectClass) -> Option<&'static TableDescriptor> {
        let tables = self.tables;
        let mut i = 0;
        while i < tables.len() {
            if tables[i].class as usize == class as usize {
                return Some(&tables[i]);
            }
            i += 1;
        }
        None
    }

    /// Configured maximum of a class
    #[must_use]
    pub const fn maximum(&self, class: ObjectClass) -> u32 {
        match self.table(class) {
            Some(table) => table.capacity,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLES: [TableDescriptor; 2] = [
        TableDescriptor::new(ObjectClass::Semaphores, 4, 56),
        TableDescriptor::new(ObjectClass::PosixKeyValuePairs, 8, 28),
    ];

    static CONFIGURATION: StartupConfiguration = StartupConfiguration {
        workspace_size:          4096,
        stack_space_size:        0,
        minimum_task_stack_size: 4096,
        workspace_is_unified:    false,
        zero_before_use:         false,
        stack_allocator:         None,
        tables:                  &TABLES,
        sysinit:                 &[SysinitItem::new(SysinitStage::ZeroWorkspace, SysinitOrder::Middle)],
    };

    #[test]
    fn test_table_lookup() {
        assert_eq!(CONFIGURATION.maximum(ObjectClass::Semaphores), 4);
        assert_eq!(CONFIGURATION.maximum(ObjectClass::Timers), 0);
        assert!(CONFIGURATION.table(ObjectClass::Timers).is_none());
        assert_eq!(CONFIGURATION.sysinit.len(), 1);
    }
}
