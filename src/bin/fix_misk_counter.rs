// Copyright (C) Brian G. Milnes 2025

//! Convert label-free Misk counters to Micrometer counters

use anyhow::Result;
use clap::Parser;
use chainfix::recipes::recipes;
use chainfix::{run_fix, FixArgs};

fn main() -> Result<()> {
    let args = FixArgs::parse();
    run_fix("fix-misk-counter", &args, &recipes::misk_counter_to_micrometer()?)
}
