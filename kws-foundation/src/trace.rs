//! Tracing support for the sizing engine
//!
//! Wraps the `tracing` crate with spans for each elaboration step. Available
//! in `no_std` builds as well; nothing is recorded until a subscriber is
//! installed by the host tool.

#![cfg(feature = "tracing")]

pub use tracing::{Level, Span, debug, debug_span, info, info_span, trace, trace_span, warn};

/// Spans of one elaboration
#[derive(Debug, Clone)]
pub struct ElaborationTrace;

impl ElaborationTrace {
    /// Span around a whole elaboration
    #[inline]
    pub fn elaborating(target: &str, requested: usize) -> Span {
        info_span!("elaborate", target = %target, requested = requested)
    }

    /// Span around normalization and validation
    #[inline]
    pub fn validating() -> Span {
        debug_span!("validate")
    }

    /// Span around the size models
    #[inline]
    pub fn sizing(class_count: usize) -> Span {
        debug_span!("size", classes = class_count)
    }

    /// Span around the stack calculator
    #[inline]
    pub fn stacks(charged: bool) -> Span {
        debug_span!("stacks", charged_to_workspace = charged)
    }
}
