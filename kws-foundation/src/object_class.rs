// kws - kws-foundation
// Module: Object Classes
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Kernel object classes and their static properties
//!
//! Every class has a fixed set of properties that the size models, the
//! normalizer and the table emitter read: which API family it belongs to,
//! which capability gates it, whether instances duplicate a caller supplied
//! name, how its storage is charged to the workspace and how its table is
//! emitted.

use core::{fmt, str::FromStr};

use kws_error::Error;

/// API family an object class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObjectApi {
    /// Classic real-time executive API
    Classic,
    /// POSIX API
    Posix,
}

/// Optional kernel capability an object class may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Capability {
    /// Full POSIX API (signals, timers)
    PosixApi,
}

impl Capability {
    /// Configuration option name of the capability
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PosixApi => "posix_api",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How instances of a class are charged to the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArenaModel {
    /// One allocator block per instance
    PerInstance,
    /// One allocator block holding all instances
    Pooled,
}

/// Shape of the statically allocated storage for a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TableKind {
    /// Object information table of control blocks
    Information,
    /// Flat array paired with a scalar maximum
    FlatArray,
}

/// Kernel object class with a configurable maximum instance count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObjectClass {
    /// Classic tasks
    Tasks,
    /// Classic timers
    Timers,
    /// Classic semaphores
    Semaphores,
    /// Classic message queues
    MessageQueues,
    /// Classic fixed-size partitions
    Partitions,
    /// Classic variable-size regions
    Regions,
    /// Classic dual-ported memory areas
    Ports,
    /// Classic rate monotonic periods
    Periods,
    /// Classic barriers
    Barriers,
    /// POSIX threads
    PosixThreads,
    /// POSIX thread-specific data keys
    PosixKeys,
    /// POSIX key/value pairs
    PosixKeyValuePairs,
    /// Named POSIX message queues
    PosixMessageQueues,
    /// Named POSIX semaphores
    PosixSemaphores,
    /// POSIX shared memory objects
    PosixShms,
    /// POSIX timers
    PosixTimers,
    /// POSIX queued signals
    PosixQueuedSignals,
}

impl ObjectClass {
    /// Number of object classes
    pub const COUNT: usize = 17;

    /// Every object class in declaration order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Tasks,
        Self::Timers,
        Self::Semaphores,
        Self::MessageQueues,
        Self::Partitions,
        Self::Regions,
        Self::Ports,
        Self::Periods,
        Self::Barriers,
        Self::PosixThreads,
        Self::PosixKeys,
        Self::PosixKeyValuePairs,
        Self::PosixMessageQueues,
        Self::PosixSemaphores,
        Self::PosixShms,
        Self::PosixTimers,
        Self::PosixQueuedSignals,
    ];

    /// Dense index of the class, stable across builds
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Configuration option name (`maximum.<name>`)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Timers => "timers",
            Self::Semaphores => "semaphores",
            Self::MessageQueues => "message_queues",
            Self::Partitions => "partitions",
            Self::Regions => "regions",
            Self::Ports => "ports",
            Self::Periods => "periods",
            Self::Barriers => "barriers",
            Self::PosixThreads => "posix_threads",
            Self::PosixKeys => "posix_keys",
            Self::PosixKeyValuePairs => "posix_key_value_pairs",
            Self::PosixMessageQueues => "posix_message_queues",
            Self::PosixSemaphores => "posix_semaphores",
            Self::PosixShms => "posix_shms",
            Self::PosixTimers => "posix_timers",
            Self::PosixQueuedSignals => "posix_queued_signals",
        }
    }

    /// Upper-case stem used for generated symbols
    #[must_use]
    pub const fn symbol_stem(self) -> &'static str {
        match self {
            Self::Tasks => "TASK",
            Self::Timers => "TIMER",
            Self::Semaphores => "SEMAPHORE",
            Self::MessageQueues => "MESSAGE_QUEUE",
            Self::Partitions => "PARTITION",
            Self::Regions => "REGION",
            Self::Ports => "PORT",
            Self::Periods => "PERIOD",
            Self::Barriers => "BARRIER",
            Self::PosixThreads => "POSIX_THREAD",
            Self::PosixKeys => "POSIX_KEY",
            Self::PosixKeyValuePairs => "POSIX_KEY_VALUE_PAIR",
            Self::PosixMessageQueues => "POSIX_MESSAGE_QUEUE",
            Self::PosixSemaphores => "POSIX_SEMAPHORE",
            Self::PosixShms => "POSIX_SHM",
            Self::PosixTimers => "POSIX_TIMER",
            Self::PosixQueuedSignals => "POSIX_QUEUED_SIGNAL",
        }
    }

    /// API family
    #[must_use]
    pub const fn api(self) -> ObjectApi {
        match self {
            Self::Tasks
            | Self::Timers
            | Self::Semaphores
            | Self::MessageQueues
            | Self::Partitions
            | Self::Regions
            | Self::Ports
            | Self::Periods
            | Self::Barriers => ObjectApi::Classic,
            _ => ObjectApi::Posix,
        }
    }

    /// Capability that must be enabled for a nonzero maximum
    #[must_use]
    pub const fn required_capability(self) -> Option<Capability> {
        match self {
            Self::PosixTimers | Self::PosixQueuedSignals => Some(Capability::PosixApi),
            _ => None,
        }
    }

    /// Instances duplicate a caller supplied name into the workspace
    #[must_use]
    pub const fn is_named(self) -> bool {
        matches!(self, Self::PosixMessageQueues | Self::PosixSemaphores | Self::PosixShms)
    }

    /// Class owns a thread stack per instance
    #[must_use]
    pub const fn is_thread_class(self) -> bool {
        matches!(self, Self::Tasks | Self::PosixThreads)
    }

    /// Class is subject to the multiprocessing reservation slot
    #[must_use]
    pub const fn reserves_slot(self) -> bool {
        self.is_named() || self.is_thread_class()
    }

    /// How instances are charged to the workspace
    #[must_use]
    pub const fn arena_model(self) -> ArenaModel {
        match self {
            Self::PosixQueuedSignals => ArenaModel::Pooled,
            _ => ArenaModel::PerInstance,
        }
    }

    /// Storage shape of the emitted table
    #[must_use]
    pub const fn table_kind(self) -> TableKind {
        match self {
            Self::PosixKeyValuePairs | Self::PosixQueuedSignals => TableKind::FlatArray,
            _ => TableKind::Information,
        }
    }

    /// Control block size in machine words
    ///
    /// Flat-array classes return zero here; their element size comes from
    /// the target profile.
    #[must_use]
    pub const fn control_words(self) -> usize {
        match self {
            Self::Tasks | Self::PosixThreads => 120,
            Self::Timers => 16,
            Self::Semaphores => 14,
            Self::MessageQueues => 20,
            Self::Partitions => 14,
            Self::Regions => 28,
            Self::Ports => 8,
            Self::Periods => 40,
            Self::Barriers => 10,
            Self::PosixKeys => 8,
            Self::PosixMessageQueues | Self::PosixTimers => 24,
            Self::PosixSemaphores => 12,
            Self::PosixShms => 16,
            Self::PosixKeyValuePairs | Self::PosixQueuedSignals => 0,
        }
    }

    /// Look a class up by its option name
    pub fn from_name(name: &str) -> kws_error::Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.name() == name)
            .ok_or(Error::UNKNOWN_OBJECT_CLASS)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim())
    }
}

// `ALL` is ordered by discriminant
const _: () = {
    let mut i = 0;
    while i < ObjectClass::COUNT {
        assert!(ObjectClass::ALL[i].index() == i);
        i += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for class in ObjectClass::ALL {
            assert_eq!(class.name().parse::<ObjectClass>(), Ok(class));
        }
        assert_eq!("mutexes".parse::<ObjectClass>(), Err(Error::UNKNOWN_OBJECT_CLASS));
    }

    #[test]
    fn test_special_classes() {
        assert_eq!(ObjectClass::PosixQueuedSignals.arena_model(), ArenaModel::Pooled);
        assert_eq!(ObjectClass::PosixKeyValuePairs.table_kind(), TableKind::FlatArray);
        assert_eq!(ObjectClass::Semaphores.table_kind(), TableKind::Information);
        assert!(ObjectClass::PosixShms.is_named());
        assert!(!ObjectClass::Semaphores.is_named());
    }

    #[test]
    fn test_capability_gates() {
        assert_eq!(
            ObjectClass::PosixTimers.required_capability(),
            Some(Capability::PosixApi)
        );
        assert_eq!(ObjectClass::PosixThreads.required_capability(), None);
    }
}
