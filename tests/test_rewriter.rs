// Copyright (C) Brian G. Milnes 2025

//! Tests for template compilation and splicing

use anyhow::{bail, Result};
use chainfix::recipes::recipes::timer_to_observation;
use chainfix::rewriter::rewriter::substitute_placeholders;
use chainfix::{ChainWalker, RewriteError, Rewriter, SiteStrategy, SourceUnit, Template, TemplateAssembler};

mod common;
use common::{attributed, call, expr, symbols};

const SCENARIO: &str = r#"use micrometer::core::instrument::MeterRegistry;
use micrometer::core::instrument::Timer;

fn handle(registry: &MeterRegistry) {
    Timer::builder("my.timer").register(registry).record(|| work());
}
"#;

/// Walk and assemble the template for the first `record` call in `source`
fn timer_template(source: &str) -> Result<(SourceUnit, ra_ap_syntax::SyntaxNode, Template)> {
    let SiteStrategy::Chain { chain, assembler } = timer_to_observation()?.strategy else {
        bail!("timer migration walks chains");
    };
    let (unit, attribution) = attributed(source);
    let terminal = call(&unit, &attribution, "record");
    let plan = ChainWalker::new(&chain, &attribution).walk(&terminal)?;
    let template = TemplateAssembler::new(&assembler).assemble(&plan);
    Ok((unit, terminal.node().clone(), template))
}

#[test]
fn test_substitute_placeholders() {
    let (text, types) = substitute_placeholders("f(#{any(String)}, #{any()}).g(#{any( Iterable )})");
    assert_eq!(text, "f(__chainfix_p0, __chainfix_p1).g(__chainfix_p2)");
    assert_eq!(types, vec![Some("String".to_string()), None, Some("Iterable".to_string())]);
}

#[test]
fn test_apply_builds_indented_replacement() -> Result<()> {
    let (unit, target, template) = timer_template(SCENARIO)?;
    let replacement = Rewriter::new(&symbols()).apply(&unit, &target, &template)?;

    assert_eq!(
        replacement.text,
        "Observation::create_not_started(\"my.timer\", registry)\n        .observe(|| work())"
    );
    assert_eq!(replacement.target, target.text_range());
    assert!(replacement.imports.add.contains("micrometer::observation::Observation"));
    assert!(!replacement.imports.add.contains("micrometer::common::KeyValues"));
    assert!(replacement.imports.remove.contains("micrometer::core::instrument::Timer"));
    Ok(())
}

#[test]
fn test_splice_replaces_only_the_target() -> Result<()> {
    let (unit, target, template) = timer_template(SCENARIO)?;
    let replacement = Rewriter::new(&symbols()).apply(&unit, &target, &template)?;
    let spliced = Rewriter::splice(&unit, &replacement)?;

    let expected = r#"use micrometer::core::instrument::MeterRegistry;
use micrometer::core::instrument::Timer;

fn handle(registry: &MeterRegistry) {
    Observation::create_not_started("my.timer", registry)
        .observe(|| work());
}
"#;
    assert_eq!(spliced.text(), expected);
    Ok(())
}

#[test]
fn test_comments_around_arguments_survive() -> Result<()> {
    let source = r#"use micrometer::core::instrument::MeterRegistry;
use micrometer::core::instrument::Timer;

fn handle(registry: &MeterRegistry) {
    Timer::builder(/* name */ "my.timer").tag("k", /* v */ "value").register(registry).record(|| work() /* done */);
}
"#;
    let (unit, target, template) = timer_template(source)?;
    let replacement = Rewriter::new(&symbols()).apply(&unit, &target, &template)?;

    assert_eq!(
        replacement.text,
        "Observation::create_not_started(/* name */ \"my.timer\", registry)\n        \
         .low_cardinality_key_value(\"k\", /* v */ \"value\")\n        \
         .observe(|| work() /* done */)"
    );
    Ok(())
}

#[test]
fn test_placeholder_count_mismatch() -> Result<()> {
    let (unit, target, mut template) = timer_template(SCENARIO)?;
    template.params.pop();

    let error = Rewriter::new(&symbols()).apply(&unit, &target, &template).unwrap_err();
    assert!(matches!(error, RewriteError::ParameterCount { placeholders: 3, params: 2 }));
    Ok(())
}

#[test]
fn test_unresolvable_template_does_not_compile() -> Result<()> {
    let (unit, target, mut template) = timer_template(SCENARIO)?;
    template.skeleton = "Unknown::create(#{any(String)}, #{any()})\n.observe(#{any()})".to_string();

    let error = Rewriter::new(&symbols()).apply(&unit, &target, &template).unwrap_err();
    assert!(matches!(error, RewriteError::TemplateCompile(_)));
    Ok(())
}

#[test]
fn test_syntax_error_in_template() -> Result<()> {
    let (unit, target, mut template) = timer_template(SCENARIO)?;
    template.skeleton = "Observation::create_not_started(#{any(String)}, #{any()}\n.observe(#{any()})".to_string();

    let error = Rewriter::new(&symbols()).apply(&unit, &target, &template).unwrap_err();
    assert!(matches!(error, RewriteError::TemplateCompile(_)));
    Ok(())
}

#[test]
fn test_template_without_receiver_chain() -> Result<()> {
    let (unit, target, _) = timer_template(SCENARIO)?;
    let template = Template {
        skeleton: "#{any()}".to_string(),
        params: vec![expr("|| other()")],
        imports: Vec::new(),
        remove_imports: Vec::new(),
    };

    let replacement = Rewriter::new(&symbols()).apply(&unit, &target, &template)?;
    assert_eq!(replacement.text, "|| other()");
    assert!(replacement.imports.is_empty());
    Ok(())
}
