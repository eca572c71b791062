// Copyright (C) Brian G. Milnes 2025

//! Tests for template assembly and single-call templates

use anyhow::{bail, Result};
use chainfix::recipes::recipes::{misk_counter_to_micrometer, no_explicit_empty_label_list, timer_to_observation_with};
use chainfix::template::template::is_empty_list;
use chainfix::{
    ArgGuard, AssemblerConfig, CallTemplate, CardinalityPolicy, ChainConfig, ChainWalker, FragmentSet, LinkShape,
    NoMatch, SiteStrategy, Template,
};
use ra_ap_syntax::AstNode;

mod common;
use common::{attributed, call, expr};

fn chain_parts(policy: CardinalityPolicy) -> Result<(ChainConfig, AssemblerConfig)> {
    match timer_to_observation_with(policy)?.strategy {
        SiteStrategy::Chain { chain, assembler } => Ok((chain, assembler)),
        SiteStrategy::Call(_) | SiteStrategy::Find(_) => bail!("timer migration walks chains"),
    }
}

fn call_template(strategy: SiteStrategy) -> Result<CallTemplate> {
    match strategy {
        SiteStrategy::Call(template) => Ok(template),
        SiteStrategy::Chain { .. } | SiteStrategy::Find(_) => bail!("expected a single-call template"),
    }
}

fn param_texts(template: &Template) -> Vec<String> {
    template.params.iter().map(|p| p.syntax().text().to_string()).collect()
}

fn assemble(policy: CardinalityPolicy, body: &str) -> Result<Template> {
    let (chain, assembler) = chain_parts(policy)?;
    let source = format!(
        "use micrometer::core::instrument::{{MeterRegistry, Timer}};\n\nfn f(registry: &MeterRegistry) {{\n    {body}\n}}\n"
    );
    let (unit, attribution) = attributed(&source);
    let terminal = call(&unit, &attribution, "record");
    let plan = ChainWalker::new(&chain, &attribution).walk(&terminal)?;
    Ok(chainfix::TemplateAssembler::new(&assembler).assemble(&plan))
}

#[test]
fn test_fragments_per_shape() {
    let low = FragmentSet::default();
    assert_eq!(low.fragment(LinkShape::BuilderRoot, 1), None);
    assert_eq!(
        low.fragment(LinkShape::PairTag, 2).as_deref(),
        Some("\n.low_cardinality_key_value(#{any(String)}, #{any(String)})")
    );
    assert_eq!(
        low.fragment(LinkShape::VarargsTags, 4).as_deref(),
        Some("\n.low_cardinality_key_values(KeyValues::of(#{any(String)}, #{any(String)}, #{any(String)}, #{any(String)}))")
    );
    assert_eq!(
        low.fragment(LinkShape::IterableTags, 1).as_deref(),
        Some("\n.low_cardinality_key_values(KeyValues::of(#{any(Iterable)}, Tag::get_key, Tag::get_value))")
    );

    let high = FragmentSet::new(CardinalityPolicy::High);
    assert!(high.fragment(LinkShape::PairTag, 2).is_some_and(|f| f.starts_with("\n.high_cardinality_key_value(")));
}

#[test]
fn test_assemble_plain_chain() -> Result<()> {
    let template = assemble(CardinalityPolicy::Low, r#"Timer::builder("my.timer").register(registry).record(|| work());"#)?;
    assert_eq!(
        template.skeleton,
        "Observation::create_not_started(#{any(String)}, #{any()})\n.observe(#{any()})"
    );
    assert_eq!(param_texts(&template), vec!["\"my.timer\"", "registry", "|| work()"]);
    assert_eq!(template.remove_imports, vec!["micrometer::core::instrument::Timer".to_string()]);
    Ok(())
}

#[test]
fn test_assemble_keeps_source_order_of_tags() -> Result<()> {
    let template = assemble(
        CardinalityPolicy::Low,
        r#"Timer::builder("t").tag("a", "1").tags("b", "2").tag("d", "4").register(registry).record(|| work());"#,
    )?;
    assert_eq!(
        template.skeleton,
        "Observation::create_not_started(#{any(String)}, #{any()})\
         \n.low_cardinality_key_value(#{any(String)}, #{any(String)})\
         \n.low_cardinality_key_values(KeyValues::of(#{any(String)}, #{any(String)}))\
         \n.low_cardinality_key_value(#{any(String)}, #{any(String)})\
         \n.observe(#{any()})"
    );
    assert_eq!(
        param_texts(&template),
        vec!["\"t\"", "registry", "\"a\"", "\"1\"", "\"b\"", "\"2\"", "\"d\"", "\"4\"", "|| work()"]
    );
    Ok(())
}

#[test]
fn test_assemble_high_cardinality() -> Result<()> {
    let template = assemble(CardinalityPolicy::High, r#"Timer::builder("t").tag("k", "v").register(registry).record(|| work());"#)?;
    assert!(template.skeleton.contains("\n.high_cardinality_key_value("));
    assert!(!template.skeleton.contains("low_cardinality"));
    Ok(())
}

#[test]
fn test_empty_list_forms() {
    assert!(is_empty_list(&expr("vec![]")));
    assert!(is_empty_list(&expr("vec!()")));
    assert!(is_empty_list(&expr("[]")));
    assert!(is_empty_list(&expr("Vec::new()")));
    assert!(is_empty_list(&expr("std::vec::Vec::new()")));

    assert!(!is_empty_list(&expr("vec![\"a\"]")));
    assert!(!is_empty_list(&expr("labels")));
    assert!(!is_empty_list(&expr("Vec::with_capacity(0)")));
}

#[test]
fn test_arg_guards() {
    let two = vec![expr("\"n\""), expr("\"h\"")];
    let empty = vec![expr("\"n\""), expr("\"h\""), expr("vec![]")];
    let labelled = vec![expr("\"n\""), expr("\"h\""), expr("vec![\"a\"]")];

    assert!(ArgGuard::Any.accepts(&labelled));
    assert!(ArgGuard::EmptyList(2).accepts(&empty));
    assert!(!ArgGuard::EmptyList(2).accepts(&two));
    assert!(!ArgGuard::EmptyList(2).accepts(&labelled));
    assert!(ArgGuard::AbsentOrEmptyList(2).accepts(&two));
    assert!(ArgGuard::AbsentOrEmptyList(2).accepts(&empty));
    assert!(!ArgGuard::AbsentOrEmptyList(2).accepts(&labelled));
}

const MISK: &str = r#"use misk::metrics::v2::Metrics;

fn f(metrics: &Metrics) {
    metrics.counter("a", "help a", vec![]);
    metrics.counter("b", "help b", vec!["label"]);
}
"#;

#[test]
fn test_call_template_instantiates_name_and_params() -> Result<()> {
    let template = call_template(no_explicit_empty_label_list()?.strategy)?;
    let (unit, attribution) = attributed(MISK);
    let counters = common::calls(&unit, &attribution, "counter");
    assert!(counters.iter().all(|c| template.matches(c)));

    let instance = template.instantiate(&counters[0])?;
    assert_eq!(instance.skeleton, "#{any(misk::metrics::v2::Metrics)}.counter(#{any(String)}, #{any(String)})");
    assert_eq!(param_texts(&instance), vec!["metrics", "\"a\"", "\"help a\""]);

    let rejected = template.instantiate(&counters[1]).unwrap_err();
    assert_eq!(rejected, NoMatch::GuardRejected("counter".to_string()));
    Ok(())
}

#[test]
fn test_counter_template_carries_imports() -> Result<()> {
    let template = call_template(misk_counter_to_micrometer()?.strategy)?;
    let (unit, attribution) = attributed(MISK);
    let counter = call(&unit, &attribution, "counter");

    let instance = template.instantiate(&counter)?;
    assert!(instance.skeleton.starts_with("Counter::builder(#{any(String)})"));
    assert_eq!(instance.imports, vec!["micrometer::core::instrument::Counter".to_string()]);
    assert_eq!(instance.remove_imports, vec!["misk::metrics::v2::Metrics".to_string()]);
    Ok(())
}
