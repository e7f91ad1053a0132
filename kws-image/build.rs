// kws - kws-image
// Module: Build Script
//
// Copyright (c) 2024 The kws Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Generates `$OUT_DIR/confdefs.rs` from `kernel.toml`

use std::process;

fn main() {
    if let Err(error) = kws_build_core::run_build_script() {
        eprintln!("error[KWS{:04}]: {error}", error.code());
        process::exit(1);
    }
}
