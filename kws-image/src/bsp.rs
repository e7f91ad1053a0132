// kws - kws-image
// Module: Board Support
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Stack allocator hooks of the sample board
//!
//! Stacks are carved from a dedicated region at [`STACK_REGION_BASE`] by a
//! bump pointer. Only the most recent allocation can be returned.

use core::sync::atomic::{AtomicUsize, Ordering};

use kws_foundation::StackArea;

/// First address of the stack region
pub const STACK_REGION_BASE: usize = 0x4000_0000;

/// Stack alignment of the board ABI
pub const STACK_ALIGNMENT: usize = 16;

static NEXT: AtomicUsize = AtomicUsize::new(STACK_REGION_BASE);
static END: AtomicUsize = AtomicUsize::new(STACK_REGION_BASE);

/// Reset the region to `stack_space_size` bytes
pub fn stack_initialize(stack_space_size: usize) {
    NEXT.store(STACK_REGION_BASE, Ordering::Release);
    END.store(STACK_REGION_BASE.saturating_add(stack_space_size), Ordering::Release);
}

/// Allocate `size` bytes, rounded up to the stack alignment
pub fn stack_allocate(size: usize) -> Option<StackArea> {
    let size = size.checked_add(STACK_ALIGNMENT - 1)? & !(STACK_ALIGNMENT - 1);
    let end = END.load(Ordering::Acquire);
    NEXT.fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
        next.checked_add(size).filter(|&top| top <= end)
    })
    .ok()
    .map(|base| StackArea { base, size })
}

/// Return the most recent allocation; anything else is leaked
pub fn stack_free(area: StackArea) {
    let _ = NEXT.compare_exchange(
        area.base + area.size,
        area.base,
        Ordering::AcqRel,
        Ordering::Acquire,
    );
}

/// Bytes still available
#[must_use]
pub fn stack_available() -> usize {
    END.load(Ordering::Acquire).saturating_sub(NEXT.load(Ordering::Acquire))
}
