// Copyright (C) Brian G. Milnes 2025

//! End-to-end tests for the Misk metric recipes

use anyhow::Result;
use chainfix::recipes::recipes::{all, by_name, misk_counter_to_micrometer, no_explicit_empty_label_list};
use chainfix::{migrate, NoMatch, SiteOutcome};

mod common;
use common::{parse, run, symbols};

#[test]
fn test_bundled_recipes_by_name() -> Result<()> {
    let names: Vec<String> = all()?.into_iter().map(|m| m.name).collect();
    assert_eq!(
        names,
        vec![
            "timer-to-observation",
            "no-explicit-empty-label-list",
            "misk-counter-to-micrometer",
            "find-dropwizard-metrics",
        ]
    );
    assert!(by_name("misk-counter-to-micrometer")?.is_some());
    assert!(by_name("no-such-recipe")?.is_none());
    Ok(())
}

#[test]
fn test_empty_label_lists_dropped() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

struct Service {
    metrics: Metrics,
}

impl Service {
    fn setup(&self) {
        self.metrics.counter("requests_total", "Total requests", vec![]);
        self.metrics.gauge("in_flight", "Requests in flight", Vec::new());
        self.metrics.peak_gauge("queue_depth", "Queue depth", vec!["queue"]);
    }
}
"#;
    let expected = r#"use misk::metrics::v2::Metrics;

struct Service {
    metrics: Metrics,
}

impl Service {
    fn setup(&self) {
        self.metrics.counter("requests_total", "Total requests");
        self.metrics.gauge("in_flight", "Requests in flight");
        self.metrics.peak_gauge("queue_depth", "Queue depth", vec!["queue"]);
    }
}
"#;
    let migration = no_explicit_empty_label_list()?;
    let result = migrate(&parse(source), &migration, &symbols())?;
    assert_eq!(result.rewritten_count(), 2);
    assert!(matches!(
        &result.sites[2].outcome,
        SiteOutcome::Unchanged(NoMatch::GuardRejected(name)) if name == "peak_gauge"
    ));
    assert_eq!(result.finish()?.text(), expected);
    Ok(())
}

#[test]
fn test_empty_label_list_gate() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

fn setup(metrics: &Metrics) {
    metrics.counter("c", "help");
}
"#;
    assert_eq!(run(&no_explicit_empty_label_list()?, source)?, source);
    Ok(())
}

#[test]
fn test_counter_becomes_micrometer_counter() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

fn setup(metrics: &Metrics) {
    let jobs = metrics.counter("jobs_total", "Jobs run");
}
"#;
    let expected = r#"use micrometer::core::instrument::Counter;
use misk::metrics::v2::Metrics;

fn setup(metrics: &Metrics) {
    let jobs = Counter::builder("jobs_total")
        .description("Jobs run")
        .register(micrometer::core::instrument::Metrics::global_registry());
}
"#;
    assert_eq!(run(&misk_counter_to_micrometer()?, source)?, expected);
    Ok(())
}

#[test]
fn test_orphaned_misk_import_is_removed() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

fn setup(metrics: &misk::metrics::v2::Metrics) {
    let jobs = metrics.counter("jobs_total", "Jobs run", vec![]);
}
"#;
    let expected = r#"use micrometer::core::instrument::Counter;

fn setup(metrics: &misk::metrics::v2::Metrics) {
    let jobs = Counter::builder("jobs_total")
        .description("Jobs run")
        .register(micrometer::core::instrument::Metrics::global_registry());
}
"#;
    assert_eq!(run(&misk_counter_to_micrometer()?, source)?, expected);
    Ok(())
}

#[test]
fn test_labelled_counter_is_left_alone() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

fn setup(metrics: &Metrics) {
    let jobs = metrics.counter("jobs_total", "Jobs run", vec!["queue"]);
    let depth = metrics.gauge("depth", "Depth");
}
"#;
    let result = migrate(&parse(source), &misk_counter_to_micrometer()?, &symbols())?;
    assert!(!result.is_changed());
    assert_eq!(result.sites.len(), 1);
    assert_eq!(result.finish()?.text(), source);
    Ok(())
}

#[test]
fn test_units_without_misk_are_untouched() -> Result<()> {
    let source = "fn main() {}\n";
    assert_eq!(run(&misk_counter_to_micrometer()?, source)?, source);
    assert_eq!(run(&no_explicit_empty_label_list()?, source)?, source);
    Ok(())
}
