// kws - kws-foundation
// Module: Resource Limits
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Requested and normalized per-class maximums

use crate::object_class::ObjectClass;

/// One requested maximum, as it appears in a sparse configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimit {
    /// Object class
    pub class:   ObjectClass,
    /// Maximum number of simultaneously existing instances
    pub maximum: u32,
}

impl ResourceLimit {
    /// Create a limit
    #[must_use]
    pub const fn new(class: ObjectClass, maximum: u32) -> Self {
        Self { class, maximum }
    }
}

/// Dense set of maximums covering every class
///
/// Produced once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResourceLimits {
    maxima: [u32; ObjectClass::COUNT],
}

impl ResourceLimits {
    /// All classes unused
    #[must_use]
    pub const fn zero() -> Self {
        Self { maxima: [0; ObjectClass::COUNT] }
    }

    /// Copy with one maximum replaced
    #[must_use]
    pub const fn with(mut self, class: ObjectClass, maximum: u32) -> Self {
        self.maxima[class.index()] = maximum;
        self
    }

    /// Normalized maximum of a class
    #[must_use]
    pub const fn get(&self, class: ObjectClass) -> u32 {
        self.maxima[class.index()]
    }

    /// Class has a nonzero maximum
    #[must_use]
    pub const fn is_used(&self, class: ObjectClass) -> bool {
        self.get(class) > 0
    }

    /// Every class with its maximum, in class order
    pub fn iter(&self) -> impl Iterator<Item = ResourceLimit> + '_ {
        ObjectClass::ALL
            .iter()
            .map(|&class| ResourceLimit::new(class, self.get(class)))
    }

    /// Classes with a nonzero maximum
    pub fn used(&self) -> impl Iterator<Item = ResourceLimit> + '_ {
        self.iter().filter(|limit| limit.maximum > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limits_use_nothing() {
        let limits = ResourceLimits::zero();
        assert_eq!(limits.iter().count(), ObjectClass::COUNT);
        assert_eq!(limits.used().count(), 0);
    }

    #[test]
    fn test_with_sets_single_class() {
        let limits = ResourceLimits::zero().with(ObjectClass::Barriers, 2);
        assert_eq!(limits.get(ObjectClass::Barriers), 2);
        assert!(!limits.is_used(ObjectClass::Tasks));
        assert_eq!(
            limits.used().collect::<alloc::vec::Vec<_>>(),
            [ResourceLimit::new(ObjectClass::Barriers, 2)]
        );
    }
}
