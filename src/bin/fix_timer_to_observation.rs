// Copyright (C) Brian G. Milnes 2025

//! Migrate Micrometer Timer builder chains to Observation calls
//!
//! `Timer::builder(name).tag(k, v).register(registry).record(f)` becomes
//! `Observation::create_not_started(name, registry).low_cardinality_key_value(k, v).observe(f)`
//! and `MeterRegistry` becomes `ObservationRegistry` throughout the file.

use anyhow::Result;
use clap::Parser;
use chainfix::recipes::recipes;
use chainfix::{run_fix, CardinalityPolicy, FixArgs};

#[derive(Parser)]
#[command(name = "chainfix-fix-timer-to-observation")]
#[command(about = "Migrate Timer builder chains to Observation", long_about = None)]
struct Args {
    #[command(flatten)]
    fix: FixArgs,

    /// Emit tags as high cardinality key values
    #[arg(long)]
    high_cardinality: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let policy = if args.high_cardinality { CardinalityPolicy::High } else { CardinalityPolicy::Low };
    let migration = recipes::timer_to_observation_with(policy)?;
    run_fix("fix-timer-to-observation", &args.fix, &migration)
}
