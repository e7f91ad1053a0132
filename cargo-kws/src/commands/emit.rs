// kws - cargo-kws
// Module: Emit Command
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use kws_build_core::emit;
use serde::Serialize;

use crate::{
    GlobalArgs,
    output::{OutputFormat, print_collection, print_json},
};

#[derive(Serialize)]
struct Emitted<'a> {
    path:           &'a Path,
    workspace_size: usize,
    tables:         usize,
}

/// `cargo kws emit --out FILE`
pub fn execute(args: &GlobalArgs, out: &Path) -> Result<bool> {
    let elaborated = super::elaborate(args);
    let Some(plan) = &elaborated.plan else {
        print_collection(&elaborated.collection("emit"), args.output)?;
        return Ok(false);
    };

    emit::write(plan, &args.config.to_string_lossy(), out)
        .with_context(|| format!("failed to emit {}", out.display()))?;

    match args.output {
        OutputFormat::Json => print_json(&Emitted {
            path:           out,
            workspace_size: plan.workspace_size(),
            tables:         plan.tables.len(),
        })?,
        OutputFormat::Human => println!(
            "{} {} ({} bytes of workspace, {} table(s))",
            "wrote".green().bold(),
            out.display(),
            plan.workspace_size(),
            plan.tables.len()
        ),
    }
    Ok(true)
}
