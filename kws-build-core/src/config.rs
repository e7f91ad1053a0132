// kws - kws-build-core
// Module: Configuration File
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! `kernel.toml` schema
//!
//! The file is a thin, user-facing rendition of
//! [`kws_foundation::Configuration`]. Sizes may be given as integers or as
//! strings with a binary unit suffix (`"8 KiB"`, `"1M"`). Class names are the
//! snake_case names of [`ObjectClass`].
//!
//! ```toml
//! target = "aarch64"
//!
//! [capabilities]
//! posix_api = true
//!
//! [maximum]
//! tasks = 8
//! semaphores = 16
//!
//! [layout.semaphores]
//! arena_size = 64
//!
//! [[message_queue]]
//! messages = 8
//! payload_size = "64"
//! ```

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use kws_foundation::{
    BlockBuffering, Capabilities, ClassLayout, Configuration, MemoryConfig, ObjectClass,
    StackAllocatorConfig, StackConfig, TargetProfile,
};
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "kernel.toml";

/// Default target when the file names none
pub const DEFAULT_TARGET: &str = "aarch64";

/// Byte count written as an integer or a string with a unit suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "ByteSizeRepr", into = "u64")]
pub struct ByteSize(pub usize);

#[derive(Deserialize)]
#[serde(untagged)]
enum ByteSizeRepr {
    Bytes(u64),
    Text(String),
}

impl TryFrom<ByteSizeRepr> for ByteSize {
    type Error = BuildError;

    fn try_from(repr: ByteSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            ByteSizeRepr::Bytes(bytes) => usize::try_from(bytes)
                .map(Self)
                .map_err(|_| BuildError::InvalidByteSize(bytes.to_string())),
            ByteSizeRepr::Text(text) => text.parse(),
        }
    }
}

impl From<ByteSize> for u64 {
    fn from(size: ByteSize) -> Self {
        size.0 as u64
    }
}

impl FromStr for ByteSize {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BuildError::InvalidByteSize(s.to_string());
        let trimmed = s.trim();
        let split = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(invalid());
        }

        let multiplier: usize = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => 1 << 10,
            "M" | "MB" | "MIB" => 1 << 20,
            "G" | "GB" | "GIB" => 1 << 30,
            _ => return Err(invalid()),
        };
        let value: usize = digits.parse().map_err(|_| invalid())?;
        value.checked_mul(multiplier).map(Self).ok_or_else(invalid)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field-wise replacements for the chosen target preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetOverrides {
    pub pointer_width:               Option<usize>,
    pub heap_alignment:              Option<usize>,
    pub heap_block_size:             Option<ByteSize>,
    pub block_header_size:           Option<ByteSize>,
    pub fp_context_size:             Option<ByteSize>,
    pub minimum_stack_size:          Option<ByteSize>,
    pub path_max:                    Option<usize>,
    pub message_buffer_control_size: Option<ByteSize>,
    pub siginfo_node_size:           Option<ByteSize>,
    pub key_value_pair_size:         Option<ByteSize>,
}

impl TargetOverrides {
    fn apply(&self, profile: &mut TargetProfile) {
        let sized = |value: Option<ByteSize>| value.map(|size| size.0);
        if let Some(value) = self.pointer_width {
            profile.pointer_width = value;
        }
        if let Some(value) = self.heap_alignment {
            profile.heap_alignment = value;
        }
        if let Some(value) = sized(self.heap_block_size) {
            profile.heap_block_size = value;
        }
        if let Some(value) = sized(self.block_header_size) {
            profile.block_header_size = value;
        }
        if let Some(value) = sized(self.fp_context_size) {
            profile.fp_context_size = value;
        }
        if let Some(value) = sized(self.minimum_stack_size) {
            profile.minimum_stack_size = value;
        }
        if let Some(value) = self.path_max {
            profile.path_max = value;
        }
        if let Some(value) = sized(self.message_buffer_control_size) {
            profile.message_buffer_control_size = value;
        }
        if let Some(value) = sized(self.siginfo_node_size) {
            profile.siginfo_node_size = value;
        }
        if let Some(value) = sized(self.key_value_pair_size) {
            profile.key_value_pair_size = value;
        }
    }
}

/// `[layout.<class>]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutFile {
    pub arena_size:   Option<ByteSize>,
    pub control_size: Option<ByteSize>,
    pub named:        Option<bool>,
}

impl From<LayoutFile> for ClassLayout {
    fn from(file: LayoutFile) -> Self {
        Self {
            arena_size:   file.arena_size.map(|size| size.0),
            control_size: file.control_size.map(|size| size.0),
            named:        file.named,
        }
    }
}

/// `[stack.allocator]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorFile {
    pub initialize:       Option<String>,
    pub allocate:         Option<String>,
    pub free:             Option<String>,
    pub avoids_workspace: bool,
    pub estimate_granule: Option<ByteSize>,
}

/// `[stack]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackFile {
    pub minimum_task_stack_size:         Option<ByteSize>,
    pub minimum_posix_thread_stack_size: Option<ByteSize>,
    pub init_task_stack_size:            Option<ByteSize>,
    pub posix_init_thread_stack_size:    Option<ByteSize>,
    pub extra_task_stacks:               ByteSize,
    pub floating_point:                  bool,
    pub allocator:                       Option<AllocatorFile>,
}

impl Default for StackFile {
    fn default() -> Self {
        Self {
            minimum_task_stack_size:         None,
            minimum_posix_thread_stack_size: None,
            init_task_stack_size:            None,
            posix_init_thread_stack_size:    None,
            extra_task_stacks:               ByteSize(0),
            floating_point:                  true,
            allocator:                       None,
        }
    }
}

impl From<StackFile> for StackConfig {
    fn from(file: StackFile) -> Self {
        let sized = |value: Option<ByteSize>| value.map(|size| size.0);
        Self {
            minimum_task_stack_size:         sized(file.minimum_task_stack_size),
            minimum_posix_thread_stack_size: sized(file.minimum_posix_thread_stack_size),
            init_task_stack_size:            sized(file.init_task_stack_size),
            posix_init_thread_stack_size:    sized(file.posix_init_thread_stack_size),
            extra_task_stacks:               file.extra_task_stacks.0,
            floating_point:                  file.floating_point,
            allocator:                       file.allocator.map(|allocator| StackAllocatorConfig {
                initialize:       allocator.initialize,
                allocate:         allocator.allocate,
                free:             allocator.free,
                avoids_workspace: allocator.avoids_workspace,
                estimate_granule: sized(allocator.estimate_granule),
            }),
        }
    }
}

/// `[block_buffering]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockBufferingFile {
    pub swapout_stack_size: ByteSize,
    pub workers:            u32,
    pub worker_stack_size:  ByteSize,
}

/// `[[message_queue]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageQueueFile {
    pub messages:     u32,
    pub payload_size: ByteSize,
}

/// `[memory]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryFile {
    pub message_buffer_memory:        ByteSize,
    pub overhead_kib:                 i64,
    pub workspace_size:               Option<ByteSize>,
    pub unified_work_areas:           bool,
    pub zero_workspace_automatically: bool,
    pub dirty_memory:                 bool,
}

impl From<MemoryFile> for MemoryConfig {
    fn from(file: MemoryFile) -> Self {
        Self {
            message_buffer_memory:        file.message_buffer_memory.0,
            overhead_kib:                 file.overhead_kib,
            workspace_size:               file.workspace_size.map(|size| size.0),
            unified_work_areas:           file.unified_work_areas,
            zero_workspace_automatically: file.zero_workspace_automatically,
            dirty_memory:                 file.dirty_memory,
        }
    }
}

/// Parsed `kernel.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelFile {
    pub target:           Option<String>,
    pub target_overrides: TargetOverrides,
    pub capabilities:     Capabilities,
    pub maximum:          BTreeMap<String, u32>,
    pub layout:           BTreeMap<String, LayoutFile>,
    pub stack:            StackFile,
    pub block_buffering:  Option<BlockBufferingFile>,
    pub message_queue:    Vec<MessageQueueFile>,
    pub memory:           MemoryFile,
}

impl KernelFile {
    /// Parse TOML text; `path` only labels errors
    pub fn parse(text: &str, path: &Path) -> BuildResult<Self> {
        toml::from_str(text).map_err(|source| BuildError::Toml {
            path:   path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Read and parse a file
    pub fn load(path: &Path) -> BuildResult<Self> {
        ConfigSource::read(path)?.parse()
    }

    /// Effective target name, `target` argument first
    #[must_use]
    pub fn target_name<'a>(&'a self, target: Option<&'a str>) -> &'a str {
        target.or(self.target.as_deref()).unwrap_or(DEFAULT_TARGET)
    }

    /// Resolve names and build the engine configuration
    pub fn into_configuration(self, target: Option<&str>) -> BuildResult<Configuration> {
        let name = self.target_name(target).to_string();
        let mut profile =
            TargetProfile::preset(&name).map_err(|_| BuildError::UnknownTarget(name.clone()))?;
        self.target_overrides.apply(&mut profile);

        let mut config = Configuration::new(profile)
            .with_capabilities(self.capabilities)
            .with_stack(self.stack.into())
            .with_memory(self.memory.into());

        for (name, maximum) in &self.maximum {
            config = config.with_maximum(class_named(name)?, *maximum);
        }
        for (name, layout) in self.layout {
            config = config.with_layout(class_named(&name)?, layout.into());
        }
        for queue in &self.message_queue {
            config = config.with_message_queue(queue.messages, queue.payload_size.0);
        }
        if let Some(buffering) = self.block_buffering {
            config = config.with_block_buffering(BlockBuffering {
                swapout_stack_size: buffering.swapout_stack_size.0,
                workers:            buffering.workers,
                worker_stack_size:  buffering.worker_stack_size.0,
            });
        }
        Ok(config)
    }
}

fn class_named(name: &str) -> BuildResult<ObjectClass> {
    ObjectClass::from_name(name).map_err(|_| BuildError::UnknownObjectClass(name.to_string()))
}

/// A configuration file together with its text
///
/// Keeps the text around so diagnostics can be mapped back to lines.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path as given
    pub path: PathBuf,
    /// File contents
    pub text: String,
}

impl ConfigSource {
    /// Read `path`
    pub fn read(path: &Path) -> BuildResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            action: "failed to read",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { path: path.to_path_buf(), text })
    }

    /// Label used in diagnostics
    #[must_use]
    pub fn label(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Parse the text
    pub fn parse(&self) -> BuildResult<KernelFile> {
        KernelFile::parse(&self.text, &self.path)
    }

    /// Parse and build the engine configuration
    pub fn configuration(&self, target: Option<&str>) -> BuildResult<Configuration> {
        self.parse()?.into_configuration(target)
    }
}

/// Load `path` and build the engine configuration
pub fn load_configuration(path: &Path, target: Option<&str>) -> BuildResult<Configuration> {
    KernelFile::load(path)?.into_configuration(target)
}

/// `kernel.toml` next to `dir`
#[must_use]
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size_units() {
        assert_eq!("4096".parse::<ByteSize>().unwrap(), ByteSize(4096));
        assert_eq!("8 KiB".parse::<ByteSize>().unwrap(), ByteSize(8192));
        assert_eq!("2M".parse::<ByteSize>().unwrap(), ByteSize(2 << 20));
        assert_eq!("1kb".parse::<ByteSize>().unwrap(), ByteSize(1024));
        assert!("KiB".parse::<ByteSize>().is_err());
        assert!("12 bananas".parse::<ByteSize>().is_err());
        assert!("-4".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            target = "arm"

            [target_overrides]
            minimum_stack_size = "8 KiB"

            [capabilities]
            posix_api = true
            multiprocessing = true

            [maximum]
            tasks = 4
            posix_timers = 2

            [layout.tasks]
            arena_size = "1 KiB"

            [stack]
            extra_task_stacks = 4096
            floating_point = false

            [stack.allocator]
            initialize = "bsp::stack_init"
            allocate = "bsp::stack_allocate"
            free = "bsp::stack_free"
            avoids_workspace = true

            [block_buffering]
            swapout_stack_size = "4 KiB"
            workers = 2
            worker_stack_size = "4 KiB"

            [[message_queue]]
            messages = 8
            payload_size = 64

            [memory]
            overhead_kib = 2
            zero_workspace_automatically = true
        "#;
        let config = KernelFile::parse(text, Path::new("kernel.toml"))
            .unwrap()
            .into_configuration(None)
            .unwrap();

        assert_eq!(config.target.name, "arm");
        assert_eq!(config.target.minimum_stack_size, 8192);
        assert!(config.capabilities.multiprocessing);
        assert_eq!(config.requested(ObjectClass::Tasks), Some(4));
        assert_eq!(config.requested(ObjectClass::PosixTimers), Some(2));
        assert_eq!(config.layouts.get(ObjectClass::Tasks).arena_size, Some(1024));
        assert_eq!(config.stack.extra_task_stacks, 4096);
        assert!(!config.stack.floating_point);
        assert!(config.stack.allocator.as_ref().unwrap().avoids_workspace);
        assert_eq!(config.block_buffering.unwrap().workers, 2);
        assert_eq!(config.message_queues.len(), 1);
        assert!(config.memory.zero_workspace_automatically);
    }

    #[test]
    fn test_target_argument_wins() {
        let file = KernelFile::parse("target = \"arm\"", Path::new("k.toml")).unwrap();
        let config = file.into_configuration(Some("x86_64")).unwrap();
        assert_eq!(config.target.name, "x86_64");
    }

    #[test]
    fn test_unknown_names() {
        let file = KernelFile::parse("[maximum]\nwidgets = 3", Path::new("k.toml")).unwrap();
        assert!(matches!(
            file.into_configuration(None),
            Err(BuildError::UnknownObjectClass(name)) if name == "widgets"
        ));

        let file = KernelFile::parse("target = \"m68k\"", Path::new("k.toml")).unwrap();
        assert!(matches!(file.into_configuration(None), Err(BuildError::UnknownTarget(_))));
    }

    #[test]
    fn test_unknown_keys_are_parse_errors() {
        let error = KernelFile::parse("[memory]\nworkspace = 1", Path::new("k.toml")).unwrap_err();
        assert!(matches!(error, BuildError::Toml { .. }));
    }
}
