// kws - kws-error
// Module: Error Handling
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! kws error handling library
//!
//! Errors raised while elaborating a kernel configuration. The engine runs at
//! build time only, so every error here is fatal to the build: there is no
//! recovery path and none is intended.
//!
//! # Error Categories
//!
//! ## Validation (1000-1999)
//! - Pairing invariants between related maximums
//! - Workspace override conflicts
//! - Incomplete stack allocator hooks
//!
//! ## Capability (2000-2999)
//! - Object classes requested while their capability is compiled out
//!
//! ## Sizing (3000-3999)
//! - Arithmetic overflow in size models
//!
//! ## Platform (4000-4999)
//! - Inconsistent or unknown target profiles
//!
//! ## Parse, I/O and Emission (5000-7999)
//! - Configuration file and generated artifact handling
//!
//! # Usage
//!
//! ```
//! use kws_error::{codes, Error, ErrorCategory};
//!
//! let error = Error::new(
//!     ErrorCategory::Validation,
//!     codes::KEY_VALUE_PAIRS_BELOW_KEYS,
//!     "Fewer POSIX key/value pairs than POSIX keys",
//! );
//! assert!(error.is_validation_error());
//! assert_eq!(error, Error::KEY_VALUE_PAIRS_BELOW_KEYS);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

/// Error codes for kws
pub mod codes;
/// Error and error handling types
pub mod errors;

pub use errors::{DiagnosticCode, Error, ErrorCategory, ErrorSource};

/// A specialized `Result` type for kws operations.
pub type Result<T> = core::result::Result<T, Error>;
