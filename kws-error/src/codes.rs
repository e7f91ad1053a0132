// kws - kws-error
// Module: Error Codes
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for kws
//!
//! Every build-time diagnostic the engine can raise has its own code so that
//! tooling can tell rule failures apart without parsing messages.

// Validation rule codes (1000-1999)
/// Generic validation failure
pub const VALIDATION_ERROR: u16 = 1000;
/// Paired key/value maximum is smaller than the key maximum
pub const KEY_VALUE_PAIRS_BELOW_KEYS: u16 = 1001;
/// Explicit workspace size given together with an extra task stack margin
pub const WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS: u16 = 1002;
/// Only part of the custom stack allocator hook triple was supplied
pub const STACK_ALLOCATOR_INCOMPLETE: u16 = 1003;
/// Negative overhead margin drives the workspace size below zero
pub const WORKSPACE_UNDERFLOW: u16 = 1004;
/// Message queue declaration without messages or payload
pub const EMPTY_MESSAGE_QUEUE_DECLARATION: u16 = 1005;

// Capability codes (2000-2999)
/// Object class requested while its owning capability is disabled
pub const CAPABILITY_DISABLED: u16 = 2000;

// Sizing codes (3000-3999)
/// Arithmetic overflow while computing a budget term
pub const SIZE_OVERFLOW: u16 = 3000;
/// Alignment of zero was passed to the alignment engine
pub const INVALID_ALIGNMENT: u16 = 3001;

// Platform codes (4000-4999)
/// Target profile constants are inconsistent
pub const INVALID_TARGET_PROFILE: u16 = 4000;
/// Target profile name does not match any preset
pub const UNKNOWN_TARGET_PROFILE: u16 = 4001;

// Configuration parse codes (5000-5999)
/// Generic configuration parse failure
pub const PARSE_ERROR: u16 = 5000;
/// Option names an object class that does not exist
pub const UNKNOWN_OBJECT_CLASS: u16 = 5001;
/// Byte size string could not be parsed
pub const INVALID_BYTE_SIZE: u16 = 5002;

// I/O codes (6000-6999)
/// Reading or writing a configuration artifact failed
pub const IO_ERROR: u16 = 6000;

// Emission codes (7000-7999)
/// Generated artifact could not be rendered
pub const EMISSION_ERROR: u16 = 7000;
/// Hook symbol is not a valid Rust path
pub const INVALID_SYMBOL_PATH: u16 = 7001;
