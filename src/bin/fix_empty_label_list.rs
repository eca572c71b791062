// Copyright (C) Brian G. Milnes 2025

//! Drop explicit empty label lists from Misk metric calls
//!
//! `metrics.counter("name", "help", vec![])` becomes `metrics.counter("name", "help")`.

use anyhow::Result;
use clap::Parser;
use chainfix::recipes::recipes;
use chainfix::{run_fix, FixArgs};

fn main() -> Result<()> {
    let args = FixArgs::parse();
    run_fix("fix-empty-label-list", &args, &recipes::no_explicit_empty_label_list()?)
}
