// kws - kws-build-core
// Module: Rust Emission
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Renders a [`WorkspacePlan`] as a Rust module
//!
//! The output is meant to be pulled into a crate with `include!` from a build
//! script, so it contains items only: no inner attributes, no inner doc
//! comments. Every path into `kws_foundation` is absolute.

use std::{fs, path::Path};

use kws_foundation::{
    ObjectClass, StackAllocatorConfig, SysinitOrder, SysinitStage, TableDescriptor, TableKind,
    WorkspacePlan,
};
use tracing::{debug, info};

use crate::error::{BuildError, BuildResult};

const FOUNDATION: &str = "::kws_foundation";

/// Emitted module as a string
pub fn render(plan: &WorkspacePlan, origin: &str) -> BuildResult<String> {
    let mut out = Vec::new();
    out.push(format!(
        "// @generated by kws-build-core from {origin} (target `{}`). Do not edit.",
        plan.target.name
    ));
    out.push(String::new());

    out.push(format!("pub const TARGET: &str = {:?};", plan.target.name));
    constant(&mut out, "WORKSPACE_SIZE", "usize", plan.workspace_size());
    constant(&mut out, "STACK_SPACE_SIZE", "usize", plan.stack_space_size());
    constant(&mut out, "MINIMUM_TASK_STACK_SIZE", "usize", plan.minimum_task_stack_size);
    constant(&mut out, "MINIMUM_POSIX_THREAD_STACK_SIZE", "usize", plan.minimum_posix_thread_stack_size);
    constant(&mut out, "WORKSPACE_IS_UNIFIED", "bool", plan.flags.unified_work_areas);
    constant(&mut out, "ZERO_BEFORE_USE", "bool", plan.flags.zero_before_use);
    out.push(String::new());

    for table in &plan.tables {
        storage(&mut out, table);
    }

    out.push(format!(
        "pub static TABLES: [{FOUNDATION}::TableDescriptor; {}] = [",
        plan.tables.len()
    ));
    for table in &plan.tables {
        out.push(format!(
            "    {FOUNDATION}::TableDescriptor::new({}, {}, {}),",
            class_path(table.class),
            table.capacity,
            table.element_size
        ));
    }
    out.push("];".to_string());
    out.push(String::new());

    out.push(format!("pub static SYSINIT: [{FOUNDATION}::SysinitItem; {}] = [", plan.sysinit.len()));
    for item in &plan.sysinit {
        out.push(format!(
            "    {FOUNDATION}::SysinitItem::new({FOUNDATION}::SysinitStage::{}, {FOUNDATION}::SysinitOrder::{}),",
            stage_name(item.stage),
            order_name(item.order)
        ));
    }
    out.push("];".to_string());
    out.push(String::new());

    out.push(format!(
        "pub const STACK_ALLOCATOR: ::core::option::Option<{FOUNDATION}::StackAllocatorHooks> = {};",
        stack_allocator(plan.stack_allocator.as_ref())?
    ));
    out.push(String::new());

    out.push(format!("pub static CONFIGURATION: {FOUNDATION}::StartupConfiguration = {FOUNDATION}::StartupConfiguration {{"));
    out.push("    workspace_size:          WORKSPACE_SIZE,".to_string());
    out.push("    stack_space_size:        STACK_SPACE_SIZE,".to_string());
    out.push("    minimum_task_stack_size: MINIMUM_TASK_STACK_SIZE,".to_string());
    out.push("    workspace_is_unified:    WORKSPACE_IS_UNIFIED,".to_string());
    out.push("    zero_before_use:         ZERO_BEFORE_USE,".to_string());
    out.push("    stack_allocator:         STACK_ALLOCATOR,".to_string());
    out.push("    tables:                  &TABLES,".to_string());
    out.push("    sysinit:                 &SYSINIT,".to_string());
    out.push("};".to_string());

    let mut source = out.join("\n");
    source.push('\n');
    debug!(tables = plan.tables.len(), bytes = source.len(), "rendered workspace module");
    Ok(source)
}

/// Render and write the module to `path`
pub fn write(plan: &WorkspacePlan, origin: &str, path: &Path) -> BuildResult<()> {
    let source = render(plan, origin)?;
    if fs::read_to_string(path).is_ok_and(|existing| existing == source) {
        debug!(path = %path.display(), "generated module unchanged");
        return Ok(());
    }
    fs::write(path, source).map_err(|source| BuildError::Io {
        action: "failed to write",
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), workspace_size = plan.workspace_size(), "wrote workspace module");
    Ok(())
}

fn constant(out: &mut Vec<String>, name: &str, ty: &str, value: impl std::fmt::Display) {
    out.push(format!("pub const {name}: {ty} = {value};"));
}

fn storage(out: &mut Vec<String>, table: &TableDescriptor) {
    constant(out, &table.maximum_symbol(), "u32", table.capacity);
    match table.kind {
        TableKind::Information => out.push(format!(
            "pub static {}: {FOUNDATION}::ObjectStorage<{}, {}> = {FOUNDATION}::ObjectStorage::new({});",
            table.storage_symbol(),
            table.element_size,
            table.capacity,
            class_path(table.class)
        )),
        TableKind::FlatArray => out.push(format!(
            "pub static {}: [[::core::sync::atomic::AtomicU8; {}]; {}] = [const {{ [const {{ ::core::sync::atomic::AtomicU8::new(0) }}; {}] }}; {}];",
            table.storage_symbol(),
            table.element_size,
            table.capacity,
            table.element_size,
            table.capacity
        )),
    }
    out.push(String::new());
}

fn class_path(class: ObjectClass) -> String {
    format!("{FOUNDATION}::ObjectClass::{class:?}")
}

fn stage_name(stage: SysinitStage) -> &'static str {
    match stage {
        SysinitStage::DirtyMemory => "DirtyMemory",
        SysinitStage::ZeroWorkspace => "ZeroWorkspace",
    }
}

fn order_name(order: SysinitOrder) -> &'static str {
    match order {
        SysinitOrder::First => "First",
        SysinitOrder::Middle => "Middle",
        SysinitOrder::Last => "Last",
    }
}

fn stack_allocator(allocator: Option<&StackAllocatorConfig>) -> BuildResult<String> {
    let Some(allocator) = allocator else {
        return Ok("::core::option::Option::None".to_string());
    };
    // Validation guarantees the triple is complete.
    let hook = |path: Option<&String>| -> BuildResult<String> {
        let path = path.map(String::as_str).unwrap_or_default();
        if is_symbol_path(path) {
            Ok(path.to_string())
        } else {
            Err(BuildError::InvalidSymbol(path.to_string()))
        }
    };
    Ok(format!(
        "::core::option::Option::Some({FOUNDATION}::StackAllocatorHooks {{ initialize: {}, allocate: {}, free: {} }})",
        hook(allocator.initialize.as_ref())?,
        hook(allocator.allocate.as_ref())?,
        hook(allocator.free.as_ref())?,
    ))
}

/// `true` for a plain Rust path such as `crate::bsp::stack_allocate`
#[must_use]
pub fn is_symbol_path(path: &str) -> bool {
    let path = path.strip_prefix("::").unwrap_or(path);
    !path.is_empty()
        && path.split("::").all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
                && segment != "_"
        })
}

#[cfg(test)]
mod tests {
    use kws_foundation::{
        Capabilities, Configuration, MemoryConfig, StackConfig, TargetProfile, elaborate,
    };

    use super::*;

    fn plan(config: &Configuration) -> WorkspacePlan {
        elaborate(config).unwrap()
    }

    #[test]
    fn test_symbol_paths() {
        assert!(is_symbol_path("crate::bsp::stack_init"));
        assert!(is_symbol_path("::bsp::_alloc2"));
        assert!(is_symbol_path("free_stack"));
        assert!(!is_symbol_path(""));
        assert!(!is_symbol_path("bsp::"));
        assert!(!is_symbol_path("bsp::2fast"));
        assert!(!is_symbol_path("bsp::stack init"));
        assert!(!is_symbol_path("bsp::alloc(); evil()"));
    }

    #[test]
    fn test_unused_classes_emit_nothing() {
        let config = Configuration::new(TargetProfile::preset("arm").unwrap())
            .with_maximum(ObjectClass::Semaphores, 3);
        let source = render(&plan(&config), "kernel.toml").unwrap();

        assert!(source.contains("pub const SEMAPHORE_MAXIMUM: u32 = 3;"));
        assert!(source.contains("pub static SEMAPHORE_TABLE: ::kws_foundation::ObjectStorage<"));
        assert!(!source.contains("TASK_TABLE"));
        assert!(source.contains("pub static TABLES: [::kws_foundation::TableDescriptor; 1]"));
        assert!(source.contains("::core::option::Option::None"));
    }

    #[test]
    fn test_flat_arrays_and_sysinit() {
        let config = Configuration::new(TargetProfile::preset("aarch64").unwrap())
            .with_capabilities(Capabilities { posix_api: true, multiprocessing: false })
            .with_maximum(ObjectClass::PosixQueuedSignals, 9)
            .with_memory(MemoryConfig {
                zero_workspace_automatically: true,
                dirty_memory: true,
                ..MemoryConfig::default()
            });
        let plan = plan(&config);
        let source = render(&plan, "kernel.toml").unwrap();

        assert!(source.contains("pub const POSIX_QUEUED_SIGNAL_MAXIMUM: u32 = 9;"));
        assert!(source.contains(&format!(
            "pub static POSIX_QUEUED_SIGNAL_POOL: [[::core::sync::atomic::AtomicU8; {}]; 9]",
            plan.target.siginfo_node_size
        )));
        assert!(source.contains("pub const ZERO_BEFORE_USE: bool = true;"));
        assert!(source.contains("SysinitStage::DirtyMemory, ::kws_foundation::SysinitOrder::Middle"));
        assert!(source.contains("SysinitStage::ZeroWorkspace, ::kws_foundation::SysinitOrder::Middle"));
    }

    #[test]
    fn test_stack_allocator_hooks() {
        let allocator = |free: &str| StackConfig {
            allocator: Some(StackAllocatorConfig {
                initialize: Some("crate::bsp::stack_init".into()),
                allocate: Some("crate::bsp::stack_allocate".into()),
                free: Some(free.into()),
                ..StackAllocatorConfig::default()
            }),
            ..StackConfig::default()
        };
        let base = Configuration::new(TargetProfile::preset("arm").unwrap());

        let source = render(&plan(&base.clone().with_stack(allocator("crate::bsp::stack_free"))), "k").unwrap();
        assert!(source.contains("free: crate::bsp::stack_free"));

        let error = render(&plan(&base.with_stack(allocator("drop(all)"))), "k").unwrap_err();
        assert!(matches!(error, BuildError::InvalidSymbol(path) if path == "drop(all)"));
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confdefs.rs");
        let plan = plan(&Configuration::new(TargetProfile::preset("x86_64").unwrap()));

        write(&plan, "kernel.toml", &path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        write(&plan, "kernel.toml", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
        assert!(first.contains("pub static CONFIGURATION: ::kws_foundation::StartupConfiguration"));
    }
}
