//! File-based tests for configuration loading and module generation.

use std::fs;

use kws_build_core::{BuildError, ConfigSource, SourceMap, elaborate_file, generate};
use kws_foundation::ObjectClass;

const KERNEL_TOML: &str = r#"
target = "aarch64"

[target_overrides]
heap_alignment = 16
heap_block_size = 32
block_header_size = 16

[maximum]
semaphores = 3
posix_keys = 2

[layout.semaphores]
arena_size = 64
"#;

fn write_config(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("kernel.toml");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_generate_writes_the_module() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, KERNEL_TOML);
    let out = dir.path().join("confdefs.rs");

    let plan = generate(&config, None, &out).unwrap();
    let source = fs::read_to_string(&out).unwrap();

    assert_eq!(plan.class_budget(ObjectClass::Semaphores).unwrap().bytes, 288);
    assert!(source.contains(&format!("pub const WORKSPACE_SIZE: usize = {};", plan.workspace_size())));
    assert!(source.contains("pub const SEMAPHORE_MAXIMUM: u32 = 3;"));
    assert!(source.contains("pub const POSIX_KEY_MAXIMUM: u32 = 2;"));
    // Keys without threads default the pairs to zero
    assert!(!source.contains("POSIX_KEY_VALUE_PAIR_POOL"));
}

#[test]
fn test_target_override_changes_the_plan() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[maximum]\ntasks = 1\n");

    let arm = elaborate_file(&config, Some("arm")).unwrap();
    let x86 = elaborate_file(&config, Some("x86_64")).unwrap();
    assert_eq!(arm.target.name, "arm");
    assert!(x86.minimum_task_stack_size > arm.minimum_task_stack_size);
}

#[test]
fn test_rejection_lists_every_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let text = "[maximum]\nposix_keys = 4\nposix_key_value_pairs = 2\nposix_timers = 1\n";
    let config = write_config(&dir, text);

    let error = elaborate_file(&config, None).unwrap_err();
    let BuildError::Rejected(diagnostics) = &error else {
        panic!("expected a rejection, got {error}");
    };
    assert_eq!(diagnostics.len(), 2);

    let source = ConfigSource::read(&config).unwrap();
    let label = source.label();
    let mapped = SourceMap::new(&label, &source.text).build_error(&error);
    let lines: Vec<u32> = mapped.iter().map(|d| d.range.start.line).collect();
    assert!(lines.contains(&2));
    assert!(lines.contains(&3));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = elaborate_file(&dir.path().join("absent.toml"), None).unwrap_err();
    assert!(matches!(error, BuildError::Io { .. }));
    assert_eq!(error.code(), kws_error::codes::IO_ERROR);
}
