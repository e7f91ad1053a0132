// kws - kws-foundation
// Module: Configuration Record
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Typed kernel configuration
//!
//! Every option is a named field with an explicit default. Options that are
//! either "given or not" are `Option`s; nothing is inferred from absence
//! except the documented defaults.

use alloc::{string::String, vec::Vec};

use crate::{
    layout::{ClassLayout, ClassLayouts},
    limits::ResourceLimit,
    object_class::ObjectClass,
    platform::TargetProfile,
    size_model::MessageQueueDemand,
};

/// Optional kernel capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Capabilities {
    /// Full POSIX API (timers, queued signals)
    pub posix_api:       bool,
    /// Multiprocessing support; enables the reservation slot
    pub multiprocessing: bool,
}

/// Custom stack allocator, given as symbol paths
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackAllocatorConfig {
    /// Initialization hook
    pub initialize:       Option<String>,
    /// Allocation hook
    pub allocate:         Option<String>,
    /// Deallocation hook
    pub free:             Option<String>,
    /// Stacks never come from the workspace
    pub avoids_workspace: bool,
    /// Allocation granule the estimate rounds to
    pub estimate_granule: Option<usize>,
}

/// Stack options
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackConfig {
    /// Minimum task stack; defaults to the target minimum
    pub minimum_task_stack_size:         Option<usize>,
    /// Minimum POSIX thread stack; defaults to twice the task minimum
    pub minimum_posix_thread_stack_size: Option<usize>,
    /// Stack of the initialization task
    pub init_task_stack_size:            Option<usize>,
    /// Stack of the POSIX initialization thread
    pub posix_init_thread_stack_size:    Option<usize>,
    /// Extra task stack margin in bytes
    pub extra_task_stacks:               usize,
    /// Charge a floating-point context to every thread
    pub floating_point:                  bool,
    /// Custom stack allocator
    pub allocator:                       Option<StackAllocatorConfig>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            minimum_task_stack_size:         None,
            minimum_posix_thread_stack_size: None,
            init_task_stack_size:            None,
            posix_init_thread_stack_size:    None,
            extra_task_stacks:               0,
            floating_point:                  true,
            allocator:                       None,
        }
    }
}

/// Block buffering subsystem with dedicated swap-out threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockBuffering {
    /// Swap-out task stack
    pub swapout_stack_size: usize,
    /// Number of swap-out workers
    pub workers:            u32,
    /// Stack of each worker
    pub worker_stack_size:  usize,
}

/// Workspace options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryConfig {
    /// Literal bytes added for message buffers
    pub message_buffer_memory:        usize,
    /// Signed fudge factor in KiB
    pub overhead_kib:                 i64,
    /// Explicit workspace size, bypasses aggregation
    pub workspace_size:               Option<usize>,
    /// Workspace and C program heap share one area
    pub unified_work_areas:           bool,
    /// Zero the workspace before first use
    pub zero_workspace_automatically: bool,
    /// Fill memory with a pattern at startup
    pub dirty_memory:                 bool,
}

/// Complete kernel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Target platform constants
    pub target:          TargetProfile,
    /// Optional capabilities
    pub capabilities:    Capabilities,
    /// Sparse requested maximums; later entries win
    pub limits:          Vec<ResourceLimit>,
    /// Layout overrides
    pub layouts:         ClassLayouts,
    /// Stack options
    pub stack:           StackConfig,
    /// Block buffering subsystem, if present
    pub block_buffering: Option<BlockBuffering>,
    /// Declared message queues
    pub message_queues:  Vec<MessageQueueDemand>,
    /// Workspace options
    pub memory:          MemoryConfig,
}

impl Configuration {
    /// Configuration with every option at its default
    #[must_use]
    pub fn new(target: TargetProfile) -> Self {
        Self {
            target,
            capabilities: Capabilities::default(),
            limits: Vec::new(),
            layouts: ClassLayouts::default(),
            stack: StackConfig::default(),
            block_buffering: None,
            message_queues: Vec::new(),
            memory: MemoryConfig::default(),
        }
    }

    /// Request a maximum for a class
    #[must_use]
    pub fn with_maximum(mut self, class: ObjectClass, maximum: u32) -> Self {
        self.limits.push(ResourceLimit::new(class, maximum));
        self
    }

    /// Set the capabilities
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the layout of a class
    #[must_use]
    pub fn with_layout(mut self, class: ObjectClass, layout: ClassLayout) -> Self {
        self.layouts.set(class, layout);
        self
    }

    /// Replace the stack options
    #[must_use]
    pub fn with_stack(mut self, stack: StackConfig) -> Self {
        self.stack = stack;
        self
    }

    /// Add a message queue declaration
    #[must_use]
    pub fn with_message_queue(mut self, messages: u32, payload_size: usize) -> Self {
        self.message_queues.push(MessageQueueDemand { messages, payload_size });
        self
    }

    /// Replace the workspace options
    #[must_use]
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Enable the block buffering subsystem
    #[must_use]
    pub fn with_block_buffering(mut self, block_buffering: BlockBuffering) -> Self {
        self.block_buffering = Some(block_buffering);
        self
    }

    /// Last requested maximum of a class, if any
    #[must_use]
    pub fn requested(&self, class: ObjectClass) -> Option<u32> {
        self.limits
            .iter()
            .rev()
            .find(|limit| limit.class == class)
            .map(|limit| limit.maximum)
    }
}
