// Copyright (C) Brian G. Milnes 2025

//! Tests for import bookkeeping

use anyhow::Result;
use chainfix::imports::imports::{
    add_import, collect_imports, maybe_add_import, maybe_remove_import, referenced_names, remove_import,
};
use chainfix::{ImportDelta, ImportDirective};

mod common;
use common::parse;

#[test]
fn test_collect_imports_flattens_groups_and_aliases() {
    let unit = parse("use a::{b::{C, D as E}, F};\nuse g::H;\nuse i::*;\n");
    let imports = collect_imports(unit.syntax());
    assert_eq!(imports.get("C").map(String::as_str), Some("a::b::C"));
    assert_eq!(imports.get("E").map(String::as_str), Some("a::b::D"));
    assert_eq!(imports.get("F").map(String::as_str), Some("a::F"));
    assert_eq!(imports.get("H").map(String::as_str), Some("g::H"));
    assert_eq!(imports.len(), 4);
}

#[test]
fn test_referenced_names_skip_uses_and_qualified_segments() {
    let unit = parse("use a::Metrics;\n\nfn f() {\n    micrometer::Metrics::global_registry();\n    Timer::builder();\n}\n");
    let names = referenced_names(unit.syntax());
    assert!(names.contains("micrometer"));
    assert!(names.contains("Timer"));
    assert!(!names.contains("Metrics"));
    assert!(!names.contains("builder"));
}

#[test]
fn test_remove_from_group() -> Result<()> {
    let unit = parse("use a::{B, C, D};\n");
    assert_eq!(remove_import(&unit, "a::C")?.text(), "use a::{B, D};\n");
    assert_eq!(remove_import(&unit, "a::D")?.text(), "use a::{B, C};\n");
    Ok(())
}

#[test]
fn test_remove_from_pair_collapses_group() -> Result<()> {
    let unit = parse("use a::{B, C};\n");
    assert_eq!(remove_import(&unit, "a::B")?.text(), "use a::C;\n");
    Ok(())
}

#[test]
fn test_remove_nested_leaf() -> Result<()> {
    let unit = parse("use a::{b::{C}, D};\n");
    assert_eq!(remove_import(&unit, "a::b::C")?.text(), "use a::D;\n");
    Ok(())
}

#[test]
fn test_remove_whole_line() -> Result<()> {
    let unit = parse("use a::B;\nuse a::C;\n\nfn f() {}\n");
    assert_eq!(remove_import(&unit, "a::B")?.text(), "use a::C;\n\nfn f() {}\n");
    Ok(())
}

#[test]
fn test_add_keeps_name_order() -> Result<()> {
    let unit = parse("use a::B;\nuse c::D;\n\nfn f() {}\n");
    assert_eq!(add_import(&unit, "b::X")?.text(), "use a::B;\nuse b::X;\nuse c::D;\n\nfn f() {}\n");
    assert_eq!(add_import(&unit, "z::Y")?.text(), "use a::B;\nuse c::D;\nuse z::Y;\n\nfn f() {}\n");
    Ok(())
}

#[test]
fn test_add_joins_imports_of_the_same_crate() -> Result<()> {
    let unit = parse("use std::time::Instant;\nuse micrometer::observation::ObservationRegistry;\n\nfn f() {}\n");
    assert_eq!(
        add_import(&unit, "micrometer::observation::Observation")?.text(),
        "use std::time::Instant;\nuse micrometer::observation::Observation;\nuse micrometer::observation::ObservationRegistry;\n\nfn f() {}\n"
    );
    assert_eq!(
        add_import(&unit, "micrometer::observation::Span")?.text(),
        "use std::time::Instant;\nuse micrometer::observation::ObservationRegistry;\nuse micrometer::observation::Span;\n\nfn f() {}\n"
    );
    assert_eq!(
        add_import(&unit, "anyhow::Result")?.text(),
        "use anyhow::Result;\nuse std::time::Instant;\nuse micrometer::observation::ObservationRegistry;\n\nfn f() {}\n"
    );
    Ok(())
}

#[test]
fn test_add_to_file_without_imports() -> Result<()> {
    let unit = parse("fn f() {}\n");
    assert_eq!(add_import(&unit, "x::Y")?.text(), "use x::Y;\n\nfn f() {}\n");
    Ok(())
}

#[test]
fn test_maybe_add_requires_reference() -> Result<()> {
    let unit = parse("fn f() {\n    Observation::create_not_started();\n}\n");
    let added = maybe_add_import(&unit, "micrometer::observation::Observation")?;
    assert!(added.text().starts_with("use micrometer::observation::Observation;\n"));

    let unused = maybe_add_import(&unit, "micrometer::common::KeyValues")?;
    assert_eq!(unused.text(), unit.text());

    let twice = maybe_add_import(&added, "micrometer::observation::Observation")?;
    assert_eq!(twice.text(), added.text());
    Ok(())
}

#[test]
fn test_maybe_remove_keeps_referenced_import() -> Result<()> {
    let used = parse("use a::Timer;\n\nfn f(t: Timer) {}\n");
    assert_eq!(maybe_remove_import(&used, "a::Timer")?.text(), used.text());

    let orphaned = parse("use a::Timer;\n\nfn f() {}\n");
    assert_eq!(maybe_remove_import(&orphaned, "a::Timer")?.text(), "\nfn f() {}\n");
    Ok(())
}

#[test]
fn test_delta_orders_removals_before_additions() -> Result<()> {
    let mut delta = ImportDelta::new();
    delta.add_import("micrometer::observation::Observation");
    delta.remove_import("micrometer::core::instrument::Timer");
    let mut other = ImportDelta::new();
    other.add_import("micrometer::observation::Observation");
    delta.merge(other);

    assert_eq!(
        delta.directives(),
        vec![
            ImportDirective::Remove("micrometer::core::instrument::Timer".to_string()),
            ImportDirective::Add("micrometer::observation::Observation".to_string()),
        ]
    );

    let unit = parse("use micrometer::core::instrument::Timer;\n\nfn f() {\n    Observation::create_not_started();\n}\n");
    assert_eq!(
        delta.apply(&unit)?.text(),
        "use micrometer::observation::Observation;\n\nfn f() {\n    Observation::create_not_started();\n}\n"
    );
    assert!(ImportDelta::new().is_empty());
    Ok(())
}
