// kws - kws-foundation
// Module: Object Table Emitter
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Fixed-capacity object tables
//!
//! Emission is a function from the normalized limits to a list of table
//! descriptors: a class with maximum zero has no entry, every other class has
//! exactly one entry whose capacity is exactly its maximum. The generated
//! code backs every descriptor with an [`ObjectStorage`] (or a flat array for
//! the special classes) whose length is that capacity.

use alloc::{format, string::String, vec::Vec};
use core::sync::atomic::AtomicU8;

use kws_error::{Error, Result};

use crate::{
    layout::ClassLayouts,
    limits::ResourceLimits,
    object_class::{ObjectClass, TableKind},
    platform::TargetProfile,
};

/// Statically allocated table of one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableDescriptor {
    /// Object class
    pub class:        ObjectClass,
    /// Number of slots, equal to the class maximum
    pub capacity:     u32,
    /// Bytes per slot
    pub element_size: usize,
    /// Storage shape
    pub kind:         TableKind,
}

impl TableDescriptor {
    /// Create a descriptor
    #[must_use]
    pub const fn new(class: ObjectClass, capacity: u32, element_size: usize) -> Self {
        Self { class, capacity, element_size, kind: class.table_kind() }
    }

    /// Bytes of backing storage, `None` if that exceeds the address space
    #[must_use]
    pub const fn storage_size(&self) -> Option<usize> {
        (self.capacity as usize).checked_mul(self.element_size)
    }

    /// Name of the generated storage item
    #[must_use]
    pub fn storage_symbol(&self) -> String {
        match self.kind {
            TableKind::Information => format!("{}_TABLE", self.class.symbol_stem()),
            TableKind::FlatArray => format!("{}_POOL", self.class.symbol_stem()),
        }
    }

    /// Name of the generated maximum constant
    #[must_use]
    pub fn maximum_symbol(&self) -> String {
        format!("{}_MAXIMUM", self.class.symbol_stem())
    }
}

/// One descriptor per class with a nonzero maximum, in class order
pub fn plan_tables(
    limits: &ResourceLimits,
    layouts: &ClassLayouts,
    profile: &TargetProfile,
) -> Result<Vec<TableDescriptor>> {
    limits
        .used()
        .map(|limit| {
            let layout = layouts.resolve(limit.class, profile)?;
            let descriptor = TableDescriptor::new(limit.class, limit.maximum, layout.element_size);
            descriptor
                .storage_size()
                .ok_or(Error::size_overflow("Table storage overflowed"))?;
            Ok(descriptor)
        })
        .collect()
}

#[allow(clippy::declare_interior_mutable_const)]
const FREE_BYTE: AtomicU8 = AtomicU8::new(0);

/// Backing storage of an information table
///
/// `N` slots of `SIZE` bytes each. The storage only guarantees that the slots
/// exist; claiming and releasing them is up to the object allocator, which
/// gets shared access through atomics.
#[derive(Debug)]
pub struct ObjectStorage<const SIZE: usize, const N: usize> {
    descriptor: TableDescriptor,
    slots:      [[AtomicU8; SIZE]; N],
}

impl<const SIZE: usize, const N: usize> ObjectStorage<SIZE, N> {
    #[allow(clippy::declare_interior_mutable_const)]
    const FREE_SLOT: [AtomicU8; SIZE] = [FREE_BYTE; SIZE];

    /// Zero-initialized storage for `class`
    ///
    /// # Panics
    ///
    /// At compile time when `N` does not fit the descriptor's capacity.
    #[must_use]
    pub const fn new(class: ObjectClass) -> Self {
        assert!(N <= u32::MAX as usize);
        Self {
            descriptor: TableDescriptor::new(class, N as u32, SIZE),
            slots:      [Self::FREE_SLOT; N],
        }
    }

    /// Descriptor of this table
    #[must_use]
    pub const fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// Number of slots
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes per slot
    #[must_use]
    pub const fn element_size(&self) -> usize {
        SIZE
    }

    /// Slot by index
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&[AtomicU8; SIZE]> {
        self.slots.get(index)
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::Ordering;

    use super::*;
    use crate::layout::ClassLayout;

    #[test]
    fn test_zero_maximum_emits_nothing() {
        let profile = TargetProfile::preset("arm").unwrap();
        let tables = plan_tables(&ResourceLimits::zero(), &ClassLayouts::default(), &profile).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_capacity_is_exact() {
        let profile = TargetProfile::preset("arm").unwrap();
        let limits = ResourceLimits::zero()
            .with(ObjectClass::Semaphores, 7)
            .with(ObjectClass::PosixQueuedSignals, 3);
        let tables = plan_tables(&limits, &ClassLayouts::default(), &profile).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0], TableDescriptor::new(ObjectClass::Semaphores, 7, 56));
        assert_eq!(tables[1].kind, TableKind::FlatArray);
        assert_eq!(tables[1].capacity, 3);
        assert_eq!(tables[1].storage_symbol(), "POSIX_QUEUED_SIGNAL_POOL");
        assert_eq!(tables[0].maximum_symbol(), "SEMAPHORE_MAXIMUM");
    }

    #[test]
    fn test_storage_size_is_checked() {
        let descriptor = TableDescriptor::new(ObjectClass::Semaphores, u32::MAX, usize::MAX / 2);
        assert_eq!(descriptor.storage_size(), None);

        let profile = TargetProfile::preset("arm").unwrap();
        let mut layouts = ClassLayouts::default();
        layouts.set(ObjectClass::Semaphores, ClassLayout {
            control_size: Some(usize::MAX / 2),
            ..ClassLayout::default()
        });
        let limits = ResourceLimits::zero().with(ObjectClass::Semaphores, 4);
        let error = plan_tables(&limits, &layouts, &profile).unwrap_err();
        assert_eq!(error.code, kws_error::codes::SIZE_OVERFLOW);
    }

    static TIMERS: ObjectStorage<64, 3> = ObjectStorage::new(ObjectClass::Timers);

    #[test]
    fn test_static_storage() {
        assert_eq!(TIMERS.capacity(), 3);
        assert_eq!(TIMERS.descriptor().storage_size(), Some(192));
        assert!(TIMERS.slot(3).is_none());

        let slot = TIMERS.slot(2).unwrap();
        slot[0].store(1, Ordering::Relaxed);
        assert_eq!(slot[0].load(Ordering::Relaxed), 1);
    }
}
