// kws - kws-foundation
// Module: Alignment and Overhead Engine
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Alignment and block overhead shared by every size model
//!
//! Every carve-out from the workspace goes through [`HeapGeometry::from_workspace`]
//! so that it is placeable as an independent allocator block with no fragment
//! left below the allocator's minimum block size.

use kws_error::{Error, Result};

use crate::platform::TargetProfile;

/// One for nonzero values, zero otherwise
#[inline]
#[must_use]
pub const fn zero_or_one(value: usize) -> usize {
    if value == 0 { 0 } else { 1 }
}

/// Round `value` up to the next multiple of `alignment`
///
/// Computes `(v + a - 1) - (v + a - 1) % a`, so any nonzero alignment is
/// accepted, not only powers of two.
///
/// # Errors
///
/// [`Error::INVALID_ALIGNMENT`] for a zero alignment, a sizing error if the
/// rounded value does not fit in `usize`.
#[inline]
pub const fn align_up(value: usize, alignment: usize) -> Result<usize> {
    if alignment == 0 {
        return Err(Error::INVALID_ALIGNMENT);
    }
    match value.checked_add(alignment - 1) {
        Some(bumped) => Ok(bumped - bumped % alignment),
        None => Err(Error::size_overflow("Alignment overflowed")),
    }
}

/// Block geometry of the arena allocator for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeapGeometry {
    /// Alignment of every block
    pub alignment:         usize,
    /// Bookkeeping bytes charged to each block
    pub block_header_size: usize,
    /// Smallest block the allocator can split off
    pub min_block_size:    usize,
    /// Reserve guaranteeing the final block split
    pub handler_overhead:  usize,
    /// Pointer width, used to align message payloads
    pub pointer_width:     usize,
}

impl HeapGeometry {
    /// Derive the geometry from a validated profile
    pub fn for_profile(profile: &TargetProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            alignment:         profile.heap_alignment,
            block_header_size: profile.block_header_size,
            min_block_size:    align_up(profile.heap_block_size, profile.heap_alignment)?,
            handler_overhead:  align_up(profile.block_header_size, profile.heap_alignment)?,
            pointer_width:     profile.pointer_width,
        })
    }

    /// Bytes one allocation of `size` consumes in the workspace
    ///
    /// Zero for a zero-sized request, so unused terms never round up to a
    /// minimum block.
    pub fn from_workspace(&self, size: usize) -> Result<usize> {
        if zero_or_one(size) == 0 {
            return Ok(0);
        }
        let with_header = size
            .checked_add(self.block_header_size)
            .ok_or(Error::SIZE_OVERFLOW)?;
        align_up(with_header, self.min_block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up_basics() {
        assert_eq!(align_up(0, 8), Ok(0));
        assert_eq!(align_up(1, 8), Ok(8));
        assert_eq!(align_up(8, 8), Ok(8));
        assert_eq!(align_up(80, 32), Ok(96));
        assert_eq!(align_up(10, 12), Ok(12));
    }

    #[test]
    fn test_align_up_rejects_zero_and_overflow() {
        assert_eq!(align_up(5, 0), Err(Error::INVALID_ALIGNMENT));
        assert!(align_up(usize::MAX, 16).unwrap_err().is_sizing_error());
    }

    #[test]
    fn test_geometry_for_lp64_preset() {
        let geometry = HeapGeometry::for_profile(&TargetProfile::preset("aarch64").unwrap()).unwrap();
        assert_eq!(geometry.min_block_size, 32);
        assert_eq!(geometry.handler_overhead, 16);
        assert_eq!(geometry.from_workspace(0), Ok(0));
        assert_eq!(geometry.from_workspace(64), Ok(96));
        assert_eq!(geometry.from_workspace(1), Ok(32));
    }
}
