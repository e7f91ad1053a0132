// kws - kws-foundation
// Module: Class Layouts
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Per-class layout of workspace instances and table elements
//!
//! By default only the named classes and the queued signal pool take
//! workspace memory; control blocks live in the emitted tables. An override
//! can model control blocks that are carved from the workspace instead.

use kws_error::{Error, Result};

use crate::{object_class::ObjectClass, platform::TargetProfile};

/// Layout override of one class; `None` keeps the target default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassLayout {
    /// Bytes each instance takes from the workspace, name buffer excluded
    pub arena_size:   Option<usize>,
    /// Element size of the emitted table
    pub control_size: Option<usize>,
    /// Instances duplicate a name of `path_max + 1` bytes
    pub named:        Option<bool>,
}

/// Layout of a class after applying the target defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedLayout {
    /// Bytes per instance charged through the size model
    pub instance_size: usize,
    /// Bytes per table element
    pub element_size:  usize,
}

/// Layout overrides for every class
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassLayouts {
    overrides: [ClassLayout; ObjectClass::COUNT],
}

impl ClassLayouts {
    /// Replace the override of one class
    pub fn set(&mut self, class: ObjectClass, layout: ClassLayout) {
        self.overrides[class.index()] = layout;
    }

    /// Override of one class
    #[must_use]
    pub fn get(&self, class: ObjectClass) -> ClassLayout {
        self.overrides[class.index()]
    }

    /// Apply target defaults to a class layout
    pub fn resolve(&self, class: ObjectClass, profile: &TargetProfile) -> Result<ResolvedLayout> {
        let layout = self.get(class);
        let arena_size = layout.arena_size.unwrap_or(match class {
            ObjectClass::PosixQueuedSignals => profile.siginfo_node_size,
            _ => 0,
        });
        let name_size = if layout.named.unwrap_or(class.is_named()) {
            profile.path_max.checked_add(1).ok_or(Error::SIZE_OVERFLOW)?
        } else {
            0
        };
        Ok(ResolvedLayout {
            instance_size: arena_size.checked_add(name_size).ok_or(Error::SIZE_OVERFLOW)?,
            element_size:  layout.control_size.unwrap_or(profile.control_size(class)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm() -> TargetProfile {
        TargetProfile::preset("arm").unwrap()
    }

    #[test]
    fn test_defaults() {
        let layouts = ClassLayouts::default();
        let semaphores = layouts.resolve(ObjectClass::Semaphores, &arm()).unwrap();
        assert_eq!(semaphores.instance_size, 0);
        assert_eq!(semaphores.element_size, 56);

        let named = layouts.resolve(ObjectClass::PosixSemaphores, &arm()).unwrap();
        assert_eq!(named.instance_size, 256);

        let signals = layouts.resolve(ObjectClass::PosixQueuedSignals, &arm()).unwrap();
        assert_eq!(signals.instance_size, 20);
        assert_eq!(signals.element_size, 20);
    }

    #[test]
    fn test_override_adds_name_buffer() {
        let mut layouts = ClassLayouts::default();
        layouts.set(
            ObjectClass::Semaphores,
            ClassLayout { arena_size: Some(64), control_size: Some(80), named: Some(true) },
        );
        let resolved = layouts.resolve(ObjectClass::Semaphores, &arm()).unwrap();
        assert_eq!(resolved.instance_size, 64 + 256);
        assert_eq!(resolved.element_size, 80);
    }
}
