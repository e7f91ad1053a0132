// kws - kws-foundation
// Module: Per-Object Size Model
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Workspace bytes required by each object class and by message buffers

use alloc::vec::Vec;

use kws_error::{Error, Result};

use crate::{
    geometry::{HeapGeometry, align_up, zero_or_one},
    layout::ClassLayouts,
    object_class::{ArenaModel, ObjectClass},
    platform::TargetProfile,
};

/// Extra bookkeeping slot for classes shared across nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReservationRule {
    /// Multiprocessing support is built in
    pub secondary_node: bool,
}

impl ReservationRule {
    /// `n + 1` for `n > 0` with multiprocessing, `n` otherwise
    pub fn apply(&self, n: u32) -> Result<usize> {
        let n = usize::try_from(n).map_err(|_| Error::SIZE_OVERFLOW)?;
        if self.secondary_node {
            n.checked_add(zero_or_one(n)).ok_or(Error::size_overflow("Reserved slot overflowed"))
        } else {
            Ok(n)
        }
    }

    /// Effective instance count of a class
    pub fn effective(&self, class: ObjectClass, n: u32) -> Result<usize> {
        if class.reserves_slot() {
            self.apply(n)
        } else {
            usize::try_from(n).map_err(|_| Error::SIZE_OVERFLOW)
        }
    }
}

/// Workspace bytes charged for one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassBudget {
    /// Object class
    pub class:         ObjectClass,
    /// Normalized maximum
    pub requested:     u32,
    /// Maximum after the reservation rule
    pub effective:     usize,
    /// Bytes per instance before block overhead
    pub instance_size: usize,
    /// Total bytes charged to the workspace
    pub bytes:         usize,
}

/// Size model of all classes for one target
#[derive(Debug, Clone, Copy)]
pub struct SizeModel<'a> {
    geometry:    HeapGeometry,
    profile:     &'a TargetProfile,
    layouts:     &'a ClassLayouts,
    reservation: ReservationRule,
}

impl<'a> SizeModel<'a> {
    /// Create a size model
    #[must_use]
    pub const fn new(
        geometry: HeapGeometry,
        profile: &'a TargetProfile,
        layouts: &'a ClassLayouts,
        reservation: ReservationRule,
    ) -> Self {
        Self { geometry, profile, layouts, reservation }
    }

    /// Bytes `n` instances of `class` take from the workspace
    ///
    /// `bytes(class, 0)` is always zero and the result never decreases as `n`
    /// grows.
    pub fn bytes(&self, class: ObjectClass, n: u32) -> Result<usize> {
        Ok(self.budget(class, n)?.bytes)
    }

    /// Full budget record of a class
    pub fn budget(&self, class: ObjectClass, n: u32) -> Result<ClassBudget> {
        let instance_size = self.layouts.resolve(class, self.profile)?.instance_size;
        let effective = self.reservation.effective(class, n)?;
        let bytes = match class.arena_model() {
            ArenaModel::PerInstance => {
                let block = self.geometry.from_workspace(instance_size)?;
                effective
                    .checked_mul(block)
                    .ok_or(Error::size_overflow("Class budget overflowed"))?
            },
            ArenaModel::Pooled => {
                let pool = effective
                    .checked_mul(instance_size)
                    .ok_or(Error::size_overflow("Pool size overflowed"))?;
                self.geometry.from_workspace(pool)?
            },
        };
        Ok(ClassBudget { class, requested: n, effective, instance_size, bytes })
    }
}

/// Buffer demand of one message queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageQueueDemand {
    /// Maximum pending messages
    pub messages:     u32,
    /// Maximum payload per message
    pub payload_size: usize,
}

/// Message buffer memory of all declared queues
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageBufferBudget {
    /// Bytes per declared queue, in declaration order
    pub per_queue: Vec<usize>,
    /// Literal `message_buffer_memory` option
    pub literal:   usize,
    /// Sum of both
    pub total:     usize,
}

/// Workspace bytes of the message buffers of one queue
pub fn message_buffers_for_queue(
    geometry: &HeapGeometry,
    profile: &TargetProfile,
    demand: MessageQueueDemand,
) -> Result<usize> {
    let per_message = demand
        .payload_size
        .checked_add(profile.message_buffer_control_size)
        .ok_or(Error::SIZE_OVERFLOW)?;
    let per_message = align_up(per_message, geometry.pointer_width)?;
    let all = usize::try_from(demand.messages)?
        .checked_mul(per_message)
        .ok_or(Error::size_overflow("Message buffer overflowed"))?;
    geometry.from_workspace(all)
}

/// Message buffer budget of every declared queue plus the literal option
pub fn message_buffer_budget(
    geometry: &HeapGeometry,
    profile: &TargetProfile,
    demands: &[MessageQueueDemand],
    literal: usize,
) -> Result<MessageBufferBudget> {
    let per_queue = demands
        .iter()
        .map(|&demand| message_buffers_for_queue(geometry, profile, demand))
        .collect::<Result<Vec<_>>>()?;
    let total = per_queue
        .iter()
        .try_fold(literal, |sum, &bytes| sum.checked_add(bytes))
        .ok_or(Error::size_overflow("Message buffer budget overflowed"))?;
    Ok(MessageBufferBudget { per_queue, literal, total })
}
