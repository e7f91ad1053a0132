// kws - kws-error
// Module: Error Types
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

/// Unified error type for the sizing engine
///
/// Errors are plain `Copy` values: a category, a numeric code and a static
/// message. Anything that needs to carry configuration values (limits,
/// byte counts, class names) is expressed as a diagnostic in the engine and
/// converted to an [`Error`] when it crosses a crate boundary.
use core::fmt;

use crate::codes;

/// `Error` categories for kws operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Cross-parameter validation rules
    Validation = 1,
    /// Capability prerequisites of object classes
    Capability = 2,
    /// Size model and aggregation arithmetic
    Sizing     = 3,
    /// Target profile constants
    Platform   = 4,
    /// Configuration file parsing
    Parse      = 5,
    /// I/O errors
    Io         = 6,
    /// Artifact emission
    Emission   = 7,
}

impl ErrorCategory {
    /// Lowest code that belongs to this category
    #[must_use]
    pub const fn code_base(self) -> u16 {
        match self {
            Self::Validation => 1000,
            Self::Capability => 2000,
            Self::Sizing => 3000,
            Self::Platform => 4000,
            Self::Parse => 5000,
            Self::Io => 6000,
            Self::Emission => 7000,
        }
    }
}

/// Base trait for all error types
pub trait ErrorSource: fmt::Debug + Send + Sync {
    /// Get the error code
    fn code(&self) -> u16;

    /// Get the error message
    fn message(&self) -> &'static str;

    /// Get the error category
    fn category(&self) -> ErrorCategory;
}

/// kws `Error` type
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  &'static str,
}

impl Error {
    /// Capability prerequisite not met
    pub const CAPABILITY_DISABLED: Self = Self::new(
        ErrorCategory::Capability,
        codes::CAPABILITY_DISABLED,
        "Object class requires a capability that is disabled",
    );
    /// Empty message queue declaration
    pub const EMPTY_MESSAGE_QUEUE_DECLARATION: Self = Self::new(
        ErrorCategory::Validation,
        codes::EMPTY_MESSAGE_QUEUE_DECLARATION,
        "Message queue declaration needs at least one message of nonzero size",
    );
    /// Invalid alignment
    pub const INVALID_ALIGNMENT: Self = Self::new(
        ErrorCategory::Sizing,
        codes::INVALID_ALIGNMENT,
        "Alignment must be greater than zero",
    );
    /// Invalid target profile
    pub const INVALID_TARGET_PROFILE: Self = Self::new(
        ErrorCategory::Platform,
        codes::INVALID_TARGET_PROFILE,
        "Target profile constants are inconsistent",
    );
    /// Key/value pairs below key maximum
    pub const KEY_VALUE_PAIRS_BELOW_KEYS: Self = Self::new(
        ErrorCategory::Validation,
        codes::KEY_VALUE_PAIRS_BELOW_KEYS,
        "Fewer POSIX key/value pairs than POSIX keys",
    );
    /// Arithmetic overflow
    pub const SIZE_OVERFLOW: Self = Self::new(
        ErrorCategory::Sizing,
        codes::SIZE_OVERFLOW,
        "Size computation overflowed",
    );
    /// Incomplete stack allocator hooks
    pub const STACK_ALLOCATOR_INCOMPLETE: Self = Self::new(
        ErrorCategory::Validation,
        codes::STACK_ALLOCATOR_INCOMPLETE,
        "Stack allocator hooks must be supplied as a complete triple",
    );
    /// Unknown object class
    pub const UNKNOWN_OBJECT_CLASS: Self = Self::new(
        ErrorCategory::Parse,
        codes::UNKNOWN_OBJECT_CLASS,
        "Unknown object class",
    );
    /// Unknown target profile
    pub const UNKNOWN_TARGET_PROFILE: Self = Self::new(
        ErrorCategory::Platform,
        codes::UNKNOWN_TARGET_PROFILE,
        "Unknown target profile",
    );
    /// Workspace override conflicts with extra stacks
    pub const WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS: Self = Self::new(
        ErrorCategory::Validation,
        codes::WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS,
        "Explicit workspace size defined with a request for extra task stacks",
    );
    /// Workspace underflow
    pub const WORKSPACE_UNDERFLOW: Self = Self::new(
        ErrorCategory::Validation,
        codes::WORKSPACE_UNDERFLOW,
        "Overhead margin drives the workspace size below zero",
    );

    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    // Factory methods

    /// Create a validation error
    #[must_use]
    pub const fn validation_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::VALIDATION_ERROR, message)
    }

    /// Create a sizing overflow error
    #[must_use]
    pub const fn size_overflow(message: &'static str) -> Self {
        Self::new(ErrorCategory::Sizing, codes::SIZE_OVERFLOW, message)
    }

    /// Create a platform error
    #[must_use]
    pub const fn platform_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Platform, codes::INVALID_TARGET_PROFILE, message)
    }

    /// Create a parse error
    #[must_use]
    pub const fn parse_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Parse, codes::PARSE_ERROR, message)
    }

    /// Create an I/O error
    #[must_use]
    pub const fn io_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Io, codes::IO_ERROR, message)
    }

    /// Create an emission error
    #[must_use]
    pub const fn emission_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Emission, codes::EMISSION_ERROR, message)
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Check if this is a capability error
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        self.category == ErrorCategory::Capability
    }

    /// Check if this is a sizing error
    #[must_use]
    pub fn is_sizing_error(&self) -> bool {
        self.category == ErrorCategory::Sizing
    }

    /// Check if this is a platform error
    #[must_use]
    pub fn is_platform_error(&self) -> bool {
        self.category == ErrorCategory::Platform
    }

    /// Check that the code lies in the range reserved for the category
    #[must_use]
    pub const fn validate_integrity(&self) -> bool {
        let base = self.category.code_base();
        self.code >= base && self.code < base + 1000 && !self.message.is_empty()
    }

    /// Diagnostic code string, e.g. `KWS1001`
    #[must_use]
    pub const fn diagnostic_code(&self) -> DiagnosticCode {
        DiagnosticCode(self.code)
    }
}

/// Printable form of an error code (`KWS` followed by four digits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(pub u16);

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KWS{:04}", self.0)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][{}] {}",
            self.category,
            self.diagnostic_code(),
            self.message
        )
    }
}

impl ErrorSource for Error {
    fn code(&self) -> u16 {
        self.code
    }

    fn message(&self) -> &'static str {
        self.message
    }

    fn category(&self) -> ErrorCategory {
        self.category
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(_: core::num::TryFromIntError) -> Self {
        Self::size_overflow("Integer conversion overflowed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code() {
        let error = Error::KEY_VALUE_PAIRS_BELOW_KEYS;
        let mut buffer = [0u8; 128];
        let mut cursor = Cursor::new(&mut buffer);
        fmt::write(&mut cursor, format_args!("{error}")).unwrap();
        assert!(cursor.as_str().starts_with("[Validation][KWS1001]"));
    }

    #[test]
    fn test_constants_are_in_range() {
        for error in [
            Error::CAPABILITY_DISABLED,
            Error::EMPTY_MESSAGE_QUEUE_DECLARATION,
            Error::INVALID_ALIGNMENT,
            Error::INVALID_TARGET_PROFILE,
            Error::KEY_VALUE_PAIRS_BELOW_KEYS,
            Error::SIZE_OVERFLOW,
            Error::STACK_ALLOCATOR_INCOMPLETE,
            Error::UNKNOWN_OBJECT_CLASS,
            Error::UNKNOWN_TARGET_PROFILE,
            Error::WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS,
            Error::WORKSPACE_UNDERFLOW,
        ] {
            assert!(error.validate_integrity(), "{:?} out of range", error);
        }
    }

    struct Cursor<'a> {
        buffer: &'a mut [u8],
        len:    usize,
    }

    impl<'a> Cursor<'a> {
        fn new(buffer: &'a mut [u8]) -> Self {
            Self { buffer, len: 0 }
        }

        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.buffer[..self.len]).unwrap()
        }
    }

    impl fmt::Write for Cursor<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let end = self.len + s.len();
            if end > self.buffer.len() {
                return Err(fmt::Error);
            }
            self.buffer[self.len..end].copy_from_slice(s.as_bytes());
            self.len = end;
            Ok(())
        }
    }
}
