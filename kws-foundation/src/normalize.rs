// kws - kws-foundation
// Module: Parameter Normalizer
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Sparse requested maximums to a dense, defaulted limit set

use crate::{
    config::Capabilities,
    limits::{ResourceLimit, ResourceLimits},
    object_class::{Capability, ObjectClass},
    validation::{ConfigDiagnostic, Diagnostics},
};

/// Output of the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Dense limits
    pub limits:                    ResourceLimits,
    /// Key/value pair maximum that was derived rather than requested
    pub defaulted_key_value_pairs: Option<u32>,
    /// Capability prerequisite failures
    pub diagnostics:               Diagnostics,
}

const fn capability_enabled(capabilities: &Capabilities, capability: Capability) -> bool {
    match capability {
        Capability::PosixApi => capabilities.posix_api,
    }
}

/// Default every unset class and check capability prerequisites
///
/// Absent classes default to zero except the key/value pairs, which default
/// to one pair per key and thread: `posix_keys * (posix_threads + tasks)`.
#[must_use]
pub fn normalize(requested: &[ResourceLimit], capabilities: &Capabilities) -> Normalized {
    let mut limits = ResourceLimits::zero();
    let mut given = [false; ObjectClass::COUNT];
    for limit in requested {
        limits = limits.with(limit.class, limit.maximum);
        given[limit.class.index()] = true;
    }

    let mut diagnostics = Diagnostics::new();
    let mut defaulted_key_value_pairs = None;
    if !given[ObjectClass::PosixKeyValuePairs.index()] {
        let threads = u64::from(limits.get(ObjectClass::PosixThreads)) + u64::from(limits.get(ObjectClass::Tasks));
        let pairs = u64::from(limits.get(ObjectClass::PosixKeys)) * threads;
        match u32::try_from(pairs) {
            Ok(pairs) => {
                limits = limits.with(ObjectClass::PosixKeyValuePairs, pairs);
                if pairs > 0 {
                    defaulted_key_value_pairs = Some(pairs);
                }
            },
            Err(_) => diagnostics.push(ConfigDiagnostic::SizeOverflow { term: "posix_key_value_pairs" }),
        }
    }

    for limit in limits.used() {
        if let Some(capability) = limit.class.required_capability() {
            if !capability_enabled(capabilities, capability) {
                diagnostics.push(ConfigDiagnostic::CapabilityDisabled {
                    class: limit.class,
                    capability,
                    requested: limit.maximum,
                });
            }
        }
    }

    Normalized { limits, defaulted_key_value_pairs, diagnostics }
}
