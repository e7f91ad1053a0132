// kws - kws-foundation
// Module: Crate Root
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Static workspace sizing and object table engine.
//!
//! Given the maximum number of instances of every kernel object class, this
//! crate computes the exact size of the kernel workspace (the single arena
//! all variable-sized kernel metadata is carved from) and the capacity of a
//! fixed-size table for every class the application uses.
//!
//! The engine runs during the build. Elaboration is a pure function from a
//! [`Configuration`] to a [`WorkspacePlan`] or a list of [`Diagnostics`]; the
//! run-time side is limited to the types the generated code is made of
//! ([`ObjectStorage`], [`TableDescriptor`], [`StartupConfiguration`] and the
//! stack allocator hooks).
//!
//! # Feature Flags
//!
//! - `std`: Standard library support for the error types
//! - `tracing`: Structured spans and events for every elaboration step
//! - `serde`: `Serialize` for plans and diagnostics
//!
//! # Example
//!
//! ```
//! use kws_foundation::{Configuration, ObjectClass, TargetProfile, elaborate};
//!
//! let config = Configuration::new(TargetProfile::preset("aarch64").unwrap())
//!     .with_maximum(ObjectClass::Tasks, 4)
//!     .with_maximum(ObjectClass::Semaphores, 8);
//! let plan = elaborate(&config).unwrap();
//!
//! assert_eq!(plan.table(ObjectClass::Semaphores).unwrap().capacity, 8);
//! assert!(plan.table(ObjectClass::Timers).is_none());
//! assert!(plan.workspace_size() > plan.stack_space_size());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod engine;
pub mod geometry;
pub mod layout;
pub mod limits;
pub mod normalize;
pub mod object_class;
pub mod platform;
pub mod size_model;
pub mod stack;
pub mod startup;
pub mod table;
#[cfg(feature = "tracing")]
pub mod trace;
pub mod validation;
pub mod workspace;

pub use config::{
    BlockBuffering, Capabilities, Configuration, MemoryConfig, StackAllocatorConfig, StackConfig,
};
pub use engine::{MemoryFlags, PlanNote, WorkspacePlan, check, elaborate};
pub use geometry::{HeapGeometry, align_up, zero_or_one};
pub use kws_error::{Error, ErrorCategory, Result};
pub use layout::{ClassLayout, ClassLayouts, ResolvedLayout};
pub use limits::{ResourceLimit, ResourceLimits};
pub use object_class::{ArenaModel, Capability, ObjectApi, ObjectClass, TableKind};
pub use platform::{PRESET_NAMES, TargetProfile};
pub use size_model::{ClassBudget, MessageBufferBudget, MessageQueueDemand, ReservationRule, SizeModel};
pub use stack::{
    StackAllocator, StackAllocatorHooks, StackArea, StackBudget, StackCalculator, StackExtras,
    StackRequirement, StackSource,
};
pub use startup::{StartupConfiguration, SysinitItem, SysinitOrder, SysinitStage};
pub use table::{ObjectStorage, TableDescriptor};
pub use validation::{ConfigDiagnostic, Diagnostics, StackHook};
pub use workspace::{WorkspaceBudget, WorkspaceTerms};
