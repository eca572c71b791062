// Copyright (C) Brian G. Milnes 2025

//! Report Dropwizard counters and gauges
//!
//! Logs every `MetricRegistry::counter(..)` and `MetricRegistry::gauge(..)`
//! call with its line and a `Counter` or `Gauge` label. Files are never written.

use anyhow::Result;
use clap::Parser;
use chainfix::recipes::recipes;
use chainfix::{run_fix, FixArgs};

fn main() -> Result<()> {
    let args = FixArgs::parse();
    run_fix("find-dropwizard-metrics", &args, &recipes::find_dropwizard_metrics()?)
}
