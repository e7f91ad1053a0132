// kws - kws-image
// Module: Crate Root
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Sample kernel image
//!
//! Everything sized by the configuration lives in [`confdefs`], which the
//! build script generates from `kernel.toml`. The board support code in
//! [`bsp`] provides the stack allocator hooks the configuration names.

#![no_std]
#![forbid(unsafe_code)]

pub mod bsp;

/// Constants, object tables and the startup configuration generated from
/// `kernel.toml`
#[allow(clippy::unreadable_literal, missing_docs)]
pub mod confdefs {
    include!(concat!(env!("OUT_DIR"), "/confdefs.rs"));
}

use kws_foundation::{ObjectClass, StackAllocator, StackArea, StartupConfiguration};

/// Configuration handed to the kernel at startup
#[must_use]
pub fn startup_configuration() -> &'static StartupConfiguration {
    &confdefs::CONFIGURATION
}

/// Maximum number of instances of `class` in this image
#[must_use]
pub fn maximum(class: ObjectClass) -> u32 {
    startup_configuration().maximum(class)
}

/// Prepare the stack allocator and allocate the stack of the first task
///
/// Returns `None` when the image has no custom allocator or the stack space
/// cannot hold a minimum task stack.
#[must_use]
pub fn boot_stacks() -> Option<StackArea> {
    let config = startup_configuration();
    let allocator = config.stack_allocator?;
    allocator.initialize(config.stack_space_size);
    allocator.allocate(config.minimum_task_stack_size)
}
