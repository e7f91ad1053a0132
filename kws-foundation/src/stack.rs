// kws - kws-foundation
// Module: Stack Budget Calculator
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Worst-case stack memory of all thread classes
//!
//! The calculator sums one aligned stack per thread, the ancillary extras
//! (initialization threads, block buffering workers, application slush) and
//! one handler overhead term. With a custom stack allocator the per-thread
//! estimate follows the allocator's granule instead of the arena geometry.
//!
//! This module also defines the run-time side of the custom allocator: the
//! [`StackAllocator`] trait and the [`StackAllocatorHooks`] function triple
//! that the generated configuration hands to the startup code.

use alloc::vec::Vec;

use kws_error::{Error, Result};

use crate::{
    geometry::{HeapGeometry, align_up},
    object_class::ObjectClass,
    size_model::ReservationRule,
};

/// Stack demand of one thread class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StackRequirement {
    /// Thread class
    pub class:           ObjectClass,
    /// Normalized maximum of the class
    pub count:           u32,
    /// Stack bytes per thread
    pub stack_size:      usize,
    /// Floating-point context bytes per thread
    pub fp_context_size: usize,
}

/// Stack bytes that do not belong to a thread class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StackExtras {
    /// Init task and init thread stacks above their class minimum
    pub initialization: usize,
    /// Block buffering swap-out task and workers
    pub buffering:      usize,
    /// Application supplied extra task stack margin
    pub application:    usize,
}

impl StackExtras {
    fn total(&self) -> Result<usize> {
        self.initialization
            .checked_add(self.buffering)
            .and_then(|sum| sum.checked_add(self.application))
            .ok_or(Error::size_overflow("Stack extras overflowed"))
    }
}

/// Where thread stacks come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StackSource {
    /// Carved from the workspace by the arena allocator
    #[default]
    Workspace,
    /// Application supplied allocator
    Custom {
        /// The allocator never touches the workspace
        avoids_workspace: bool,
        /// Allocation granule used for the estimate
        granule:          Option<usize>,
    },
}

impl StackSource {
    /// Stack budget counts towards the workspace size
    #[must_use]
    pub const fn charges_workspace(&self) -> bool {
        match self {
            Self::Workspace => true,
            Self::Custom { avoids_workspace, .. } => !*avoids_workspace,
        }
    }
}

/// Stack budget of one thread class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThreadStackBudget {
    /// Thread class
    pub class:      ObjectClass,
    /// Thread count after the reservation rule
    pub effective:  usize,
    /// Bytes per thread, overhead included
    pub per_thread: usize,
    /// Bytes for the whole class
    pub bytes:      usize,
}

/// Aggregated stack budget
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StackBudget {
    /// Per thread class budgets
    pub threads:              Vec<ThreadStackBudget>,
    /// Extras outside the thread classes
    pub extras:               StackExtras,
    /// Final split reserve, zero when nothing else is charged
    pub handler_overhead:     usize,
    /// Total stack space
    pub total:                usize,
    /// Total is part of the workspace
    pub charged_to_workspace: bool,
}

/// Stack budget calculator for one target
#[derive(Debug, Clone, Copy)]
pub struct StackCalculator {
    geometry:    HeapGeometry,
    reservation: ReservationRule,
    source:      StackSource,
}

impl StackCalculator {
    /// Create a calculator
    #[must_use]
    pub const fn new(geometry: HeapGeometry, reservation: ReservationRule, source: StackSource) -> Self {
        Self { geometry, reservation, source }
    }

    /// Bytes one thread stack of the requirement consumes
    pub fn per_thread(&self, requirement: &StackRequirement) -> Result<usize> {
        let raw = requirement
            .stack_size
            .checked_add(requirement.fp_context_size)
            .ok_or(Error::SIZE_OVERFLOW)?;
        match self.source {
            StackSource::Workspace => self.geometry.from_workspace(raw),
            StackSource::Custom { granule: Some(granule), .. } => align_up(raw, granule),
            StackSource::Custom { granule: None, .. } => Ok(raw),
        }
    }

    /// Stack budget of one thread class
    pub fn thread_budget(&self, requirement: &StackRequirement) -> Result<ThreadStackBudget> {
        let effective = self.reservation.effective(requirement.class, requirement.count)?;
        let per_thread = if effective == 0 { 0 } else { self.per_thread(requirement)? };
        let bytes = effective
            .checked_mul(per_thread)
            .ok_or(Error::size_overflow("Thread stack budget overflowed"))?;
        Ok(ThreadStackBudget { class: requirement.class, effective, per_thread, bytes })
    }

    /// Bytes an initialization thread of `init_size` adds on top of one
    /// class minimum stack
    ///
    /// Both stacks are measured per thread, so the extra shrinks by exactly
    /// what the class minimum grows. A class without threads has no
    /// initialization thread and charges nothing.
    pub fn initialization_extra(&self, requirement: &StackRequirement, init_size: usize) -> Result<usize> {
        let effective = self.reservation.effective(requirement.class, requirement.count)?;
        if effective == 0 || init_size <= requirement.stack_size {
            return Ok(0);
        }
        let init = self.per_thread(&StackRequirement { stack_size: init_size, ..*requirement })?;
        Ok(init.saturating_sub(self.per_thread(requirement)?))
    }

    /// Aggregate stack budget of all thread classes and extras
    pub fn budget(&self, requirements: &[StackRequirement], extras: StackExtras) -> Result<StackBudget> {
        let threads = requirements
            .iter()
            .map(|requirement| self.thread_budget(requirement))
            .collect::<Result<Vec<_>>>()?;
        let raw = threads
            .iter()
            .try_fold(extras.total()?, |sum, budget| sum.checked_add(budget.bytes))
            .ok_or(Error::size_overflow("Stack budget overflowed"))?;
        let handler_overhead = if raw == 0 { 0 } else { self.geometry.handler_overhead };
        let total = raw.checked_add(handler_overhead).ok_or(Error::SIZE_OVERFLOW)?;
        Ok(StackBudget {
            threads,
            extras,
            handler_overhead,
            total,
            charged_to_workspace: self.source.charges_workspace(),
        })
    }
}

/// Memory area handed out by a stack allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackArea {
    /// Lowest address of the area
    pub base: usize,
    /// Size in bytes
    pub size: usize,
}

/// Application supplied thread stack allocator
pub trait StackAllocator {
    /// Prepare the allocator with the computed stack space size
    fn initialize(&self, stack_space_size: usize);

    /// Allocate a stack of at least `size` bytes
    fn allocate(&self, size: usize) -> Option<StackArea>;

    /// Return a stack obtained from [`StackAllocator::allocate`]
    fn free(&self, area: StackArea);
}

/// Custom stack allocator as a matched function triple
#[derive(Debug, Clone, Copy)]
pub struct StackAllocatorHooks {
    /// Called once before the first thread is created
    pub initialize: fn(usize),
    /// Allocate one stack
    pub allocate:   fn(usize) -> Option<StackArea>,
    /// Release one stack
    pub free:       fn(StackArea),
}

impl StackAllocator for StackAllocatorHooks {
    fn initialize(&self, stack_space_size: usize) {
        (self.initialize)(stack_space_size);
    }

    fn allocate(&self, size: usize) -> Option<StackArea> {
        (self.allocate)(size)
    }

    fn free(&self, area: StackArea) {
        (self.free)(area);
    }
}
