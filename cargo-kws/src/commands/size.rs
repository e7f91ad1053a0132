// kws - cargo-kws
// Module: Size Command
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use anyhow::Result;
use kws_build_core::BudgetReport;

use crate::{
    GlobalArgs,
    output::{OutputFormat, print_collection, print_json},
};

/// `cargo kws size`
pub fn execute(args: &GlobalArgs) -> Result<bool> {
    let elaborated = super::elaborate(args);
    let Some(plan) = &elaborated.plan else {
        print_collection(&elaborated.collection("size"), args.output)?;
        return Ok(false);
    };

    let report = BudgetReport::from(plan);
    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Human => {
            print_collection(&elaborated.collection("size"), args.output)?;
            print!("{}", report.format_size());
        },
    }
    Ok(true)
}
