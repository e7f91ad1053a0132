// kws - kws-foundation
// Module: Target Profiles
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Platform constants read by the size models
//!
//! A [`TargetProfile`] bundles everything that differs between targets: word
//! size, the arena allocator's block geometry, context sizes and the sizes of
//! the few records that are not plain control blocks.

use alloc::string::String;

use kws_error::{Error, Result};

use crate::object_class::ObjectClass;

/// Names of the built-in profile presets
pub const PRESET_NAMES: [&str; 5] = ["arm", "aarch64", "riscv64", "sparc", "x86_64"];

/// Platform constants of one build target
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetProfile {
    /// Preset name, or a user label for custom profiles
    pub name:                        String,
    /// Width of a pointer in bytes
    pub pointer_width:               usize,
    /// Alignment guaranteed by the arena allocator
    pub heap_alignment:              usize,
    /// Size of the allocator's block record
    pub heap_block_size:             usize,
    /// Bookkeeping bytes in front of every allocated block
    pub block_header_size:           usize,
    /// Floating-point context saved per thread
    pub fp_context_size:             usize,
    /// Smallest stack the port accepts
    pub minimum_stack_size:          usize,
    /// Longest object name, without terminator
    pub path_max:                    usize,
    /// Per-message control record of message buffers
    pub message_buffer_control_size: usize,
    /// Queued signal node
    pub siginfo_node_size:           usize,
    /// Key/value pair record
    pub key_value_pair_size:         usize,
}

impl TargetProfile {
    /// Look up a built-in preset by name
    pub fn preset(name: &str) -> Result<Self> {
        let profile = match name {
            "arm" => Self::ilp32(name, 8, 264, 4096),
            "sparc" => Self::ilp32(name, 8, 136, 4096),
            "aarch64" => Self::lp64(name, 528, 8192),
            "riscv64" => Self::lp64(name, 264, 4096),
            "x86_64" => Self::lp64(name, 512, 32768),
            _ => return Err(Error::UNKNOWN_TARGET_PROFILE),
        };
        Ok(profile)
    }

    fn ilp32(name: &str, alignment: usize, fp_context_size: usize, minimum_stack_size: usize) -> Self {
        Self {
            name: String::from(name),
            pointer_width: 4,
            heap_alignment: alignment,
            heap_block_size: 16,
            block_header_size: 8,
            fp_context_size,
            minimum_stack_size,
            path_max: 255,
            message_buffer_control_size: 16,
            siginfo_node_size: 20,
            key_value_pair_size: 28,
        }
    }

    fn lp64(name: &str, fp_context_size: usize, minimum_stack_size: usize) -> Self {
        Self {
            name: String::from(name),
            pointer_width: 8,
            heap_alignment: 16,
            heap_block_size: 32,
            block_header_size: 16,
            fp_context_size,
            minimum_stack_size,
            path_max: 255,
            message_buffer_control_size: 24,
            siginfo_node_size: 40,
            key_value_pair_size: 56,
        }
    }

    /// Check that the constants describe a usable allocator
    pub fn validate(&self) -> Result<()> {
        if !self.pointer_width.is_power_of_two() {
            return Err(Error::platform_error("Pointer width must be a power of two"));
        }
        if !self.heap_alignment.is_power_of_two() {
            return Err(Error::platform_error("Heap alignment must be a power of two"));
        }
        if self.heap_block_size == 0 || self.block_header_size == 0 {
            return Err(Error::platform_error("Heap block sizes must be nonzero"));
        }
        if self.block_header_size > self.heap_block_size {
            return Err(Error::platform_error(
                "Block header cannot be larger than the heap block",
            ));
        }
        if self.path_max == 0 {
            return Err(Error::platform_error("Maximum path length must be nonzero"));
        }
        Ok(())
    }

    /// Default control block or record size of a class on this target
    #[must_use]
    pub const fn control_size(&self, class: ObjectClass) -> usize {
        match class {
            ObjectClass::PosixKeyValuePairs => self.key_value_pair_size,
            ObjectClass::PosixQueuedSignals => self.siginfo_node_size,
            _ => class.control_words() * self.pointer_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_validates() {
        for name in PRESET_NAMES {
            let profile = TargetProfile::preset(name).unwrap();
            assert_eq!(profile.name, name);
            assert!(profile.validate().is_ok(), "{name}");
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            TargetProfile::preset("m68k"),
            Err(Error::UNKNOWN_TARGET_PROFILE)
        );
    }

    #[test]
    fn test_rejects_bad_alignment() {
        let mut profile = TargetProfile::preset("arm").unwrap();
        profile.heap_alignment = 12;
        assert!(profile.validate().unwrap_err().is_platform_error());
        profile.heap_alignment = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_control_size_scales_with_pointer_width() {
        let arm = TargetProfile::preset("arm").unwrap();
        let aarch64 = TargetProfile::preset("aarch64").unwrap();
        assert_eq!(arm.control_size(ObjectClass::Semaphores), 56);
        assert_eq!(aarch64.control_size(ObjectClass::Semaphores), 112);
        assert_eq!(aarch64.control_size(ObjectClass::PosixQueuedSignals), 40);
    }
}
