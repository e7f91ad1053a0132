// kws - cargo-kws
// Module: Check Command
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use anyhow::Result;
use colored::Colorize;

use crate::{
    GlobalArgs,
    output::{OutputFormat, print_collection},
};

/// `cargo kws check`
pub fn execute(args: &GlobalArgs) -> Result<bool> {
    let elaborated = super::elaborate(args);
    let collection = elaborated.collection("check");
    print_collection(&collection, args.output)?;

    if let (Some(plan), OutputFormat::Human) = (&elaborated.plan, args.output) {
        println!(
            "{} {} for `{}`: workspace {} bytes, {} table(s)",
            "ok:".green().bold(),
            args.config.display(),
            plan.target.name,
            plan.workspace_size(),
            plan.tables.len()
        );
    }
    Ok(!collection.has_errors())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[test]
    fn test_check_fails_on_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "[maximum]\nposix_keys = 4\nposix_key_value_pairs = 2\n");
        assert!(!execute(&args(&config, None)).unwrap());

        let config = write_config(&dir, "[maximum]\nposix_keys = 4\nposix_key_value_pairs = 8\n");
        assert!(execute(&args(&config, None)).unwrap());
    }
}
