// kws - kws-foundation
// Module: Validation Layer
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Build-time diagnostics and cross-parameter validation rules
//!
//! Rules run after normalization and before any size is trusted. Every
//! failure is its own [`ConfigDiagnostic`] variant with its own error code;
//! all rules run so that one build reports every problem at once.

use alloc::vec::Vec;
use core::fmt;

use kws_error::{Error, ErrorCategory, codes};

use crate::{
    config::Configuration,
    limits::ResourceLimits,
    object_class::{Capability, ObjectClass},
};

/// One hook of the custom stack allocator triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StackHook {
    /// Initialization hook
    Initialize,
    /// Allocation hook
    Allocate,
    /// Deallocation hook
    Free,
}

impl StackHook {
    /// Configuration option name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Allocate => "allocate",
            Self::Free => "free",
        }
    }
}

/// Named build-time diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ConfigDiagnostic {
    /// Nonzero maximum for a class whose capability is disabled
    CapabilityDisabled {
        /// Offending class
        class:      ObjectClass,
        /// Missing capability
        capability: Capability,
        /// Requested maximum
        requested:  u32,
    },
    /// Fewer key/value pairs than keys
    KeyValuePairsBelowKeys {
        /// Key maximum
        keys:  u32,
        /// Key/value pair maximum
        pairs: u32,
    },
    /// Explicit workspace size together with extra task stacks
    WorkspaceOverrideWithExtraStacks {
        /// Explicit workspace size
        workspace_size:    usize,
        /// Extra task stack margin
        extra_task_stacks: usize,
    },
    /// Custom stack allocator with only part of the hook triple
    StackAllocatorIncomplete {
        /// Hooks that were not supplied
        missing: Vec<StackHook>,
    },
    /// Negative overhead margin drives the workspace below zero
    WorkspaceUnderflow {
        /// Signed sum of all terms
        computed: i128,
    },
    /// Message queue declaration with no messages or no payload
    EmptyMessageQueueDeclaration {
        /// Position in the declaration list
        index: usize,
    },
    /// Arithmetic overflow in one budget term
    SizeOverflow {
        /// Term being computed
        term: &'static str,
    },
    /// Target profile rejected
    InvalidTargetProfile {
        /// Reason reported by the profile check
        reason: &'static str,
    },
}

impl ConfigDiagnostic {
    /// Error value with the diagnostic's distinct code
    #[must_use]
    pub fn error(&self) -> Error {
        match self {
            Self::CapabilityDisabled { .. } => Error::CAPABILITY_DISABLED,
            Self::KeyValuePairsBelowKeys { .. } => Error::KEY_VALUE_PAIRS_BELOW_KEYS,
            Self::WorkspaceOverrideWithExtraStacks { .. } => Error::WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS,
            Self::StackAllocatorIncomplete { .. } => Error::STACK_ALLOCATOR_INCOMPLETE,
            Self::WorkspaceUnderflow { .. } => Error::WORKSPACE_UNDERFLOW,
            Self::EmptyMessageQueueDeclaration { .. } => Error::EMPTY_MESSAGE_QUEUE_DECLARATION,
            Self::SizeOverflow { term } => Error::size_overflow(*term),
            Self::InvalidTargetProfile { reason } => {
                Error::new(ErrorCategory::Platform, codes::INVALID_TARGET_PROFILE, *reason)
            },
        }
    }

    /// Numeric code
    #[must_use]
    pub fn code(&self) -> u16 {
        self.error().code
    }

    /// Stable snake_case name of the diagnostic
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CapabilityDisabled { .. } => "capability_disabled",
            Self::KeyValuePairsBelowKeys { .. } => "key_value_pairs_below_keys",
            Self::WorkspaceOverrideWithExtraStacks { .. } => "workspace_override_with_extra_stacks",
            Self::StackAllocatorIncomplete { .. } => "stack_allocator_incomplete",
            Self::WorkspaceUnderflow { .. } => "workspace_underflow",
            Self::EmptyMessageQueueDeclaration { .. } => "empty_message_queue_declaration",
            Self::SizeOverflow { .. } => "size_overflow",
            Self::InvalidTargetProfile { .. } => "invalid_target_profile",
        }
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityDisabled { class, capability, requested } => write!(
                f,
                "maximum {class} = {requested} requires the {capability} capability"
            ),
            Self::KeyValuePairsBelowKeys { keys, pairs } => write!(
                f,
                "fewer POSIX key/value pairs ({pairs}) than POSIX keys ({keys})"
            ),
            Self::WorkspaceOverrideWithExtraStacks { workspace_size, extra_task_stacks } => write!(
                f,
                "explicit workspace size {workspace_size} given together with {extra_task_stacks} bytes of extra task stacks"
            ),
            Self::StackAllocatorIncomplete { missing } => {
                f.write_str("custom stack allocator is missing")?;
                for (i, hook) in missing.iter().enumerate() {
                    let separator = if i == 0 { " " } else { ", " };
                    write!(f, "{separator}{}", hook.name())?;
                }
                Ok(())
            },
            Self::WorkspaceUnderflow { computed } => {
                write!(f, "overhead margin drives the workspace size to {computed} bytes")
            },
            Self::EmptyMessageQueueDeclaration { index } => write!(
                f,
                "message queue declaration {index} needs at least one message of nonzero size"
            ),
            Self::SizeOverflow { term } => write!(f, "{term}: size computation overflowed"),
            Self::InvalidTargetProfile { reason } => write!(f, "invalid target profile: {reason}"),
        }
    }
}

/// Ordered list of diagnostics of one elaboration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Diagnostics {
    items: Vec<ConfigDiagnostic>,
}

impl Diagnostics {
    /// Empty list
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: ConfigDiagnostic) {
        self.items.push(diagnostic);
    }

    /// Append every diagnostic of another list
    pub fn extend(&mut self, other: impl IntoIterator<Item = ConfigDiagnostic>) {
        self.items.extend(other);
    }

    /// No diagnostic was raised
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of diagnostics
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate in the order the diagnostics were raised
    pub fn iter(&self) -> core::slice::Iter<'_, ConfigDiagnostic> {
        self.items.iter()
    }

    /// A diagnostic with the given name was raised
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|diagnostic| diagnostic.name() == name)
    }

    /// Error of the first diagnostic
    #[must_use]
    pub fn first_error(&self) -> Option<Error> {
        self.items.first().map(ConfigDiagnostic::error)
    }
}

impl From<ConfigDiagnostic> for Diagnostics {
    fn from(diagnostic: ConfigDiagnostic) -> Self {
        Self { items: alloc::vec![diagnostic] }
    }
}

impl IntoIterator for Diagnostics {
    type IntoIter = alloc::vec::IntoIter<ConfigDiagnostic>;
    type Item = ConfigDiagnostic;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type IntoIter = core::slice::Iter<'a, ConfigDiagnostic>;
    type Item = &'a ConfigDiagnostic;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{}: {diagnostic}", diagnostic.error().diagnostic_code())?;
        }
        Ok(())
    }
}

/// Named predicate over the normalized configuration
#[derive(Debug, Clone, Copy)]
pub struct ValidationRule {
    /// Name of the diagnostic the rule raises
    pub name:  &'static str,
    /// Check that records any violation
    pub check: fn(&Configuration, &ResourceLimits, &mut Diagnostics),
}

/// Every cross-parameter rule, in evaluation order
pub const RULES: &[ValidationRule] = &[
    ValidationRule { name: "key_value_pairs_below_keys", check: check_key_value_pairs },
    ValidationRule { name: "workspace_override_with_extra_stacks", check: check_workspace_override },
    ValidationRule { name: "stack_allocator_incomplete", check: check_stack_allocator },
    ValidationRule { name: "empty_message_queue_declaration", check: check_message_queues },
];

/// Run every rule and collect all violations
#[must_use]
pub fn validate(config: &Configuration, limits: &ResourceLimits) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for rule in RULES {
        (rule.check)(config, limits, &mut diagnostics);
    }
    diagnostics
}

fn check_key_value_pairs(_: &Configuration, limits: &ResourceLimits, diagnostics: &mut Diagnostics) {
    let keys = limits.get(ObjectClass::PosixKeys);
    let pairs = limits.get(ObjectClass::PosixKeyValuePairs);
    if keys > 0 && pairs > 0 && pairs < keys {
        diagnostics.push(ConfigDiagnostic::KeyValuePairsBelowKeys { keys, pairs });
    }
}

fn check_workspace_override(config: &Configuration, _: &ResourceLimits, diagnostics: &mut Diagnostics) {
    if let Some(workspace_size) = config.memory.workspace_size {
        if config.stack.extra_task_stacks != 0 {
            diagnostics.push(ConfigDiagnostic::WorkspaceOverrideWithExtraStacks {
                workspace_size,
                extra_task_stacks: config.stack.extra_task_stacks,
            });
        }
    }
}

fn check_stack_allocator(config: &Configuration, _: &ResourceLimits, diagnostics: &mut Diagnostics) {
    let Some(allocator) = &config.stack.allocator else {
        return;
    };
    let supplied = [
        (StackHook::Initialize, allocator.initialize.is_some()),
        (StackHook::Allocate, allocator.allocate.is_some()),
        (StackHook::Free, allocator.free.is_some()),
    ];
    let missing: Vec<_> = supplied
        .iter()
        .filter(|(_, present)| !present)
        .map(|(hook, _)| *hook)
        .collect();
    if !missing.is_empty() {
        diagnostics.push(ConfigDiagnostic::StackAllocatorIncomplete { missing });
    }
}

fn check_message_queues(config: &Configuration, _: &ResourceLimits, diagnostics: &mut Diagnostics) {
    for (index, demand) in config.message_queues.iter().enumerate() {
        if demand.messages == 0 || demand.payload_size == 0 {
            diagnostics.push(ConfigDiagnostic::EmptyMessageQueueDeclaration { index });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::StackAllocatorConfig, platform::TargetProfile};

    fn config() -> Configuration {
        Configuration::new(TargetProfile::preset("arm").unwrap())
    }

    #[test]
    fn test_key_value_pairing() {
        let limits = ResourceLimits::zero()
            .with(ObjectClass::PosixKeys, 4)
            .with(ObjectClass::PosixKeyValuePairs, 2);
        let diagnostics = validate(&config(), &limits);
        assert_eq!(
            diagnostics.iter().next(),
            Some(&ConfigDiagnostic::KeyValuePairsBelowKeys { keys: 4, pairs: 2 })
        );

        let limits = limits.with(ObjectClass::PosixKeyValuePairs, 8);
        assert!(validate(&config(), &limits).is_empty());
    }

    #[test]
    fn test_partial_allocator_lists_missing_hooks() {
        let mut config = config();
        config.stack.allocator = Some(StackAllocatorConfig {
            allocate: Some("bsp::allocate".into()),
            ..StackAllocatorConfig::default()
        });
        let diagnostics = validate(&config, &ResourceLimits::zero());
        assert_eq!(
            diagnostics.iter().next(),
            Some(&ConfigDiagnostic::StackAllocatorIncomplete {
                missing: alloc::vec![StackHook::Initialize, StackHook::Free],
            })
        );
    }

    #[test]
    fn test_every_rule_runs() {
        let mut config = config().with_message_queue(0, 16);
        config.memory.workspace_size = Some(65536);
        config.stack.extra_task_stacks = 1024;
        let diagnostics = validate(&config, &ResourceLimits::zero());
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.contains("workspace_override_with_extra_stacks"));
        assert!(diagnostics.contains("empty_message_queue_declaration"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            ConfigDiagnostic::CapabilityDisabled {
                class:      ObjectClass::PosixTimers,
                capability: Capability::PosixApi,
                requested:  1,
            },
            ConfigDiagnostic::KeyValuePairsBelowKeys { keys: 2, pairs: 1 },
            ConfigDiagnostic::WorkspaceOverrideWithExtraStacks { workspace_size: 1, extra_task_stacks: 1 },
            ConfigDiagnostic::StackAllocatorIncomplete { missing: Vec::new() },
            ConfigDiagnostic::WorkspaceUnderflow { computed: -1 },
            ConfigDiagnostic::EmptyMessageQueueDeclaration { index: 0 },
            ConfigDiagnostic::SizeOverflow { term: "workspace" },
            ConfigDiagnostic::InvalidTargetProfile { reason: "x" },
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code(), "{} and {}", a.name(), b.name());
            }
        }
    }
}
