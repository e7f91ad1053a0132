// kws - cargo-kws
// Module: Targets Command
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use colored::Colorize;
use kws_foundation::{PRESET_NAMES, TargetProfile};

use crate::{
    GlobalArgs,
    output::{OutputFormat, print_json},
};

/// Every preset, in listing order
pub fn presets() -> Result<Vec<TargetProfile>> {
    PRESET_NAMES
        .iter()
        .map(|name| {
            TargetProfile::preset(name)
                .map_err(|error| anyhow::anyhow!("{error}"))
                .with_context(|| format!("preset `{name}`"))
        })
        .collect()
}

/// `cargo kws targets`
pub fn execute(args: &GlobalArgs) -> Result<bool> {
    let presets = presets()?;
    match args.output {
        OutputFormat::Json => print_json(&presets)?,
        OutputFormat::Human => {
            println!(
                "  {:<10} {:>7} {:>9} {:>7} {:>8} {:>10}",
                "target", "pointer", "alignment", "block", "fp ctx", "min stack"
            );
            for profile in &presets {
                println!(
                    "  {:<10} {:>7} {:>9} {:>7} {:>8} {:>10}",
                    profile.name.cyan(),
                    profile.pointer_width,
                    profile.heap_alignment,
                    profile.heap_block_size,
                    profile.fp_context_size,
                    profile.minimum_stack_size
                );
            }
        },
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_loads() {
        let presets = presets().unwrap();
        assert_eq!(presets.len(), PRESET_NAMES.len());
        assert!(presets.iter().all(|profile| profile.validate().is_ok()));
    }
}
