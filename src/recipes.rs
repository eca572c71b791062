// Copyright (C) Brian G. Milnes 2025

//! Bundled migrations
//!
//! - `timer_to_observation`: Micrometer `Timer` builder chains to `Observation`
//! - `no_explicit_empty_label_list`: drop `vec![]` label lists from Misk metric calls
//! - `misk_counter_to_micrometer`: label-free Misk counters to Micrometer counters
//! - `find_dropwizard_metrics`: report Dropwizard counters and gauges, no rewrite

pub mod recipes {
    use crate::chain::chain::{ChainConfig, LinkShape, ShapeRule, TerminalRule};
    use crate::engine::engine::{FindRule, Migration, SiteStrategy};
    use crate::matcher::matcher::{PatternError, SignaturePattern};
    use crate::precondition::precondition::Precondition;
    use crate::template::template::{
        ArgGuard, AssemblerConfig, CallTemplate, CardinalityPolicy, FragmentSet, TemplateParam,
    };
    use crate::type_rewriter::type_rewriter::TypeRename;

    pub const TIMER: &str = "micrometer::core::instrument::Timer";
    pub const TIMER_BUILDER: &str = "micrometer::core::instrument::TimerBuilder";
    pub const TIME_UNIT: &str = "micrometer::core::instrument::TimeUnit";
    pub const METER_REGISTRY: &str = "micrometer::core::instrument::MeterRegistry";
    pub const TAG: &str = "micrometer::core::instrument::Tag";
    pub const COUNTER: &str = "micrometer::core::instrument::Counter";
    pub const OBSERVATION: &str = "micrometer::observation::Observation";
    pub const OBSERVATION_REGISTRY: &str = "micrometer::observation::ObservationRegistry";
    pub const KEY_VALUES: &str = "micrometer::common::KeyValues";
    pub const MISK_METRICS: &str = "misk::metrics::v2::Metrics";
    pub const DROPWIZARD_REGISTRY: &str = "codahale::metrics::MetricRegistry";

    /// Every bundled migration, by name
    pub fn all() -> Result<Vec<Migration>, PatternError> {
        Ok(vec![
            timer_to_observation()?,
            no_explicit_empty_label_list()?,
            misk_counter_to_micrometer()?,
            find_dropwizard_metrics()?,
        ])
    }

    pub fn by_name(name: &str) -> Result<Option<Migration>, PatternError> {
        Ok(all()?.into_iter().find(|m| m.name == name))
    }

    fn pattern(text: String) -> Result<SignaturePattern, PatternError> {
        text.parse()
    }

    pub fn timer_to_observation() -> Result<Migration, PatternError> {
        timer_to_observation_with(CardinalityPolicy::Low)
    }

    /// `Timer::builder(name)[.tag/.tags ...].register(registry).record(f)` to
    /// `Observation::create_not_started(name, registry)[.key values ...].observe(f)`
    pub fn timer_to_observation_with(policy: CardinalityPolicy) -> Result<Migration, PatternError> {
        let precondition = Precondition::and([
            Precondition::or([
                Precondition::uses(pattern(format!("{TIMER} record*(..)"))?),
                Precondition::uses(pattern(format!("{TIMER} wrap(..)"))?),
            ]),
            Precondition::not(Precondition::uses(pattern(format!("{TIMER} record(std::time::Duration)"))?)),
            Precondition::not(Precondition::uses(pattern(format!("{TIMER} record(i64, {TIME_UNIT})"))?)),
        ]);

        let chain = ChainConfig {
            terminals: vec![
                TerminalRule { pattern: pattern(format!("{TIMER} record*(..)"))?, mapped_name: "observe".to_string() },
                TerminalRule { pattern: pattern(format!("{TIMER} wrap(..)"))?, mapped_name: "wrap".to_string() },
            ],
            binder: pattern(format!("{TIMER_BUILDER} register(..)"))?,
            rules: vec![
                ShapeRule { shape: LinkShape::BuilderRoot, pattern: pattern(format!("{TIMER} builder(String)"))? },
                ShapeRule { shape: LinkShape::PairTag, pattern: pattern(format!("{TIMER_BUILDER} tag(String, String)"))? },
                ShapeRule { shape: LinkShape::IterableTags, pattern: pattern(format!("{TIMER_BUILDER} tags(Iterable)"))? },
                ShapeRule { shape: LinkShape::VarargsTags, pattern: pattern(format!("{TIMER_BUILDER} tags(String...)"))? },
            ],
            fragments: FragmentSet::new(policy),
        };

        let assembler = AssemblerConfig {
            head: "Observation::create_not_started(#{any(String)}, #{any()})".to_string(),
            imports: vec![OBSERVATION.to_string(), KEY_VALUES.to_string(), TAG.to_string()],
            remove_imports: vec![TIMER.to_string()],
        };

        Ok(Migration {
            name: "timer-to-observation".to_string(),
            description: "Convert Micrometer Timer builder chains to Observation calls".to_string(),
            precondition,
            type_renames: vec![TypeRename::new(METER_REGISTRY, OBSERVATION_REGISTRY)],
            strategy: SiteStrategy::Chain { chain, assembler },
        })
    }

    fn misk_metric_patterns(args: &str) -> Result<Vec<SignaturePattern>, PatternError> {
        ["counter", "gauge", "peak_gauge"]
            .iter()
            .map(|name| pattern(format!("{MISK_METRICS} {name}({args})")))
            .collect()
    }

    /// `metrics.counter(name, help, vec![])` to `metrics.counter(name, help)`,
    /// likewise for `gauge` and `peak_gauge`
    pub fn no_explicit_empty_label_list() -> Result<Migration, PatternError> {
        let patterns = misk_metric_patterns("String, String, Iterable")?;
        let precondition = Precondition::or(patterns.iter().cloned().map(Precondition::uses));

        Ok(Migration {
            name: "no-explicit-empty-label-list".to_string(),
            description: "Drop explicit empty label lists from Misk metric factory calls".to_string(),
            precondition,
            type_renames: Vec::new(),
            strategy: SiteStrategy::Call(CallTemplate {
                patterns,
                guard: ArgGuard::EmptyList(2),
                skeleton: format!("#{{any({MISK_METRICS})}}.{{name}}(#{{any(String)}}, #{{any(String)}})"),
                params: vec![TemplateParam::Receiver, TemplateParam::Arg(0), TemplateParam::Arg(1)],
                imports: Vec::new(),
                remove_imports: Vec::new(),
            }),
        })
    }

    /// `metrics.counter(name, help)` to a Micrometer counter registered globally
    pub fn misk_counter_to_micrometer() -> Result<Migration, PatternError> {
        Ok(Migration {
            name: "misk-counter-to-micrometer".to_string(),
            description: "Convert label-free Misk counters to Micrometer counters".to_string(),
            precondition: Precondition::uses_type(MISK_METRICS),
            type_renames: Vec::new(),
            strategy: SiteStrategy::Call(CallTemplate {
                patterns: vec![pattern(format!("{MISK_METRICS} counter(..)"))?],
                guard: ArgGuard::AbsentOrEmptyList(2),
                skeleton: "Counter::builder(#{any(String)})\n.description(#{any(String)})\n.register(micrometer::core::instrument::Metrics::global_registry())".to_string(),
                params: vec![TemplateParam::Arg(0), TemplateParam::Arg(1)],
                imports: vec![COUNTER.to_string()],
                remove_imports: vec![MISK_METRICS.to_string()],
            }),
        })
    }

    /// Dropwizard `registry.counter(..)` and `registry.gauge(..)` calls,
    /// reported as `Counter` and `Gauge`
    pub fn find_dropwizard_metrics() -> Result<Migration, PatternError> {
        let rules = vec![
            FindRule { pattern: pattern(format!("{DROPWIZARD_REGISTRY} counter(..)"))?, label: "Counter".to_string() },
            FindRule { pattern: pattern(format!("{DROPWIZARD_REGISTRY} gauge(..)"))?, label: "Gauge".to_string() },
        ];
        let precondition = Precondition::or(rules.iter().map(|r| Precondition::uses(r.pattern.clone())));

        Ok(Migration {
            name: "find-dropwizard-metrics".to_string(),
            description: "Find Dropwizard metrics that could move to a newer instrumentation library".to_string(),
            precondition,
            type_renames: Vec::new(),
            strategy: SiteStrategy::Find(rules),
        })
    }
}
