// Copyright (C) Brian G. Milnes 2025

//! Tests for the find-only Dropwizard metrics recipe

use std::fs;
use std::process::Command;
use anyhow::Result;
use chainfix::recipes::recipes::find_dropwizard_metrics;
use chainfix::{migrate, DiagnosticKind, SiteOutcome};
use serial_test::serial;
use tempfile::TempDir;

mod common;
use common::{number_before, parse, symbols};

const DROPWIZARD_SOURCE: &str = r#"use codahale::metrics::MetricRegistry;

struct Test;

impl Test {
    fn instrument(&self, registry: &MetricRegistry) {
        registry.counter("my.counter");
        registry.gauge("my.gauge");
        registry.meter("my.meter");
    }
}
"#;

#[test]
fn test_counters_and_gauges_are_reported_not_rewritten() -> Result<()> {
    let unit = parse(DROPWIZARD_SOURCE);
    let result = migrate(&unit, &find_dropwizard_metrics()?, &symbols())?;

    let labels: Vec<(usize, String)> = result
        .sites
        .iter()
        .filter_map(|site| match &site.outcome {
            SiteOutcome::Found(label) => Some((site.line, label.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec![(7, "Counter".to_string()), (8, "Gauge".to_string())]);
    assert_eq!(result.found_count(), 2);
    assert!(!result.is_changed());

    let found: Vec<&str> = result
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::SiteFound)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(found, vec![r#"Counter: registry.counter("my.counter")"#, r#"Gauge: registry.gauge("my.gauge")"#]);

    assert_eq!(result.finish()?.text(), DROPWIZARD_SOURCE);
    Ok(())
}

#[test]
fn test_supplier_gauge_is_reported() -> Result<()> {
    let source = r#"use codahale::metrics::MetricRegistry;

fn f(registry: &MetricRegistry) {
    registry.gauge("queue.size", || queue_size());
}
"#;
    let result = migrate(&parse(source), &find_dropwizard_metrics()?, &symbols())?;
    assert_eq!(result.found_count(), 1);
    Ok(())
}

#[test]
fn test_other_registries_are_ignored() -> Result<()> {
    let source = r#"use misk::metrics::v2::Metrics;

fn f(metrics: &Metrics) {
    metrics.counter("c", "help");
}
"#;
    let result = migrate(&parse(source), &find_dropwizard_metrics()?, &symbols())?;
    assert!(result.sites.is_empty());
    assert!(result.diagnostics.is_empty());
    Ok(())
}

#[test]
#[serial]
fn test_find_binary_reports_and_leaves_files_alone() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("metrics.rs");
    fs::write(&path, DROPWIZARD_SOURCE)?;

    let output = Command::new(env!("CARGO_BIN_EXE_chainfix-find-dropwizard-metrics"))
        .current_dir(dir.path())
        .arg("metrics.rs")
        .output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{stdout}");
    assert!(stdout.contains("SiteFound: Counter: registry.counter(\"my.counter\")"), "stdout:\n{stdout}");
    assert!(stdout.contains("SiteFound: Gauge: registry.gauge(\"my.gauge\")"), "stdout:\n{stdout}");

    let summary = stdout.lines().find(|l| l.starts_with("Summary:")).unwrap_or_default();
    assert_eq!(number_before(summary, "sites found"), Some(2));
    assert_eq!(number_before(summary, "files changed"), Some(0));
    assert_eq!(fs::read_to_string(&path)?, DROPWIZARD_SOURCE);
    Ok(())
}
