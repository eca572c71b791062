// Copyright (C) Brian G. Milnes 2025

//! Fluent chain walking
//!
//! Starting from a terminal call (`timer.record(..)`), the walker checks that
//! its receiver is the call that binds the builder to a registry, then steps
//! up the receiver chain one call at a time. Each call is classified against
//! a closed, ordered set of shapes. The builder root ends the walk; anything
//! unrecognized aborts it.
//!
//! ```text
//! Timer::builder("t").tag("k", "v").register(registry).record(task)
//! ^ BuilderRoot       ^ PairTag     ^ binder           ^ terminal
//! ```

pub mod chain {
    use ra_ap_syntax::{ast, TextRange};
    use serde::{Deserialize, Serialize};
    use crate::attribution::attribution::Attribution;
    use crate::invocation::invocation::Invocation;
    use crate::matcher::matcher::SignaturePattern;
    use crate::template::template::FragmentSet;

    /// Upper bound on the number of calls examined above the binder
    pub const MAX_CHAIN_DEPTH: usize = 64;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum LinkShape {
        /// Names the built entity; its single argument is the name
        BuilderRoot,
        /// One key and one value
        PairTag,
        /// One iterable of key/value pairs
        IterableTags,
        /// Alternating keys and values
        VarargsTags,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ShapeRule {
        pub shape: LinkShape,
        pub pattern: SignaturePattern,
    }

    /// A terminal call and the name it takes on the target API
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TerminalRule {
        pub pattern: SignaturePattern,
        pub mapped_name: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChainConfig {
        pub terminals: Vec<TerminalRule>,
        /// Call binding the builder to its registry, e.g. `register(registry)`
        pub binder: SignaturePattern,
        /// Tried in order; the first match classifies a call
        pub rules: Vec<ShapeRule>,
        pub fragments: FragmentSet,
    }

    impl ChainConfig {
        pub fn terminal_rule(&self, invocation: &Invocation) -> Option<&TerminalRule> {
            self.terminals.iter().find(|t| t.pattern.matches(invocation))
        }

        pub fn is_terminal(&self, invocation: &Invocation) -> bool {
            self.terminal_rule(invocation).is_some()
        }

        pub fn classify(&self, invocation: &Invocation) -> Option<LinkShape> {
            self.rules
                .iter()
                .find(|rule| rule.pattern.matches(invocation))
                .map(|rule| rule.shape)
        }
    }

    #[derive(Debug, Clone)]
    pub struct ChainLink {
        pub shape: LinkShape,
        /// Template text this call contributes; empty for the builder root
        pub fragment: String,
        pub call: String,
        /// Arguments in call order
        pub args: Vec<ast::Expr>,
        pub range: TextRange,
    }

    /// Result of a successful walk, discarded after the site is rewritten
    #[derive(Debug, Clone)]
    pub struct RewritePlan {
        pub terminal: Invocation,
        pub terminal_name: String,
        pub name: ast::Expr,
        pub registry: ast::Expr,
        /// Walk order: nearest the terminal first, builder root last
        pub links: Vec<ChainLink>,
    }

    impl RewritePlan {
        /// Tag links in the order they were written in the source
        pub fn tag_links_in_source_order(&self) -> impl Iterator<Item = &ChainLink> {
            self.links.iter().rev().filter(|l| l.shape != LinkShape::BuilderRoot)
        }

        pub fn builder_root(&self) -> Option<&ChainLink> {
            self.links.iter().find(|l| l.shape == LinkShape::BuilderRoot)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum NoMatch {
        #[error("`{0}` is not a terminal call")]
        NotTerminal(String),

        #[error("receiver of `{0}` is not a registry binding call")]
        NotBound(String),

        #[error("`{call}` is not a known chain call")]
        Classification { call: String },

        #[error("chain does not have exactly one builder root")]
        MissingOrDuplicateBuilderRoot,

        #[error("chain is deeper than {0} calls")]
        ChainTooDeep(usize),

        #[error("inside a call site already rewritten in this run")]
        Nested,

        #[error("arguments of `{0}` do not fit the rewrite")]
        GuardRejected(String),
    }

    pub struct ChainWalker<'a> {
        config: &'a ChainConfig,
        attribution: &'a Attribution,
    }

    impl<'a> ChainWalker<'a> {
        pub fn new(config: &'a ChainConfig, attribution: &'a Attribution) -> Self {
            ChainWalker { config, attribution }
        }

        pub fn walk(&self, terminal: &Invocation) -> Result<RewritePlan, NoMatch> {
            let rule = self
                .config
                .terminal_rule(terminal)
                .ok_or_else(|| NoMatch::NotTerminal(terminal.name().to_string()))?;

            let binder = terminal
                .receiver()
                .and_then(|r| Invocation::from_expr(r, self.attribution))
                .filter(|b| b.args().len() == 1 && self.config.binder.matches(b))
                .ok_or_else(|| NoMatch::NotBound(terminal.name().to_string()))?;
            let registry = binder.args()[0].clone();

            let mut links: Vec<ChainLink> = Vec::new();
            let mut name: Option<ast::Expr> = None;
            let mut current = binder.receiver().cloned();

            for _ in 0..MAX_CHAIN_DEPTH {
                let Some(call) = current.as_ref().and_then(|e| Invocation::from_expr(e, self.attribution)) else {
                    return Err(NoMatch::MissingOrDuplicateBuilderRoot);
                };
                let shape = self.config.classify(&call).ok_or_else(|| NoMatch::Classification {
                    call: call.name().to_string(),
                })?;
                let fragment = self
                    .config
                    .fragments
                    .fragment(shape, call.args().len())
                    .unwrap_or_default();
                links.push(ChainLink {
                    shape,
                    fragment,
                    call: call.name().to_string(),
                    args: call.args().to_vec(),
                    range: call.range(),
                });

                if shape == LinkShape::BuilderRoot {
                    name = call.args().first().cloned();
                    break;
                }
                current = call.receiver().cloned();
            }

            let roots = links.iter().filter(|l| l.shape == LinkShape::BuilderRoot).count();
            if roots == 0 && links.len() == MAX_CHAIN_DEPTH {
                return Err(NoMatch::ChainTooDeep(MAX_CHAIN_DEPTH));
            }
            let name = match (roots, name) {
                (1, Some(name)) => name,
                _ => return Err(NoMatch::MissingOrDuplicateBuilderRoot),
            };

            Ok(RewritePlan {
                terminal: terminal.clone(),
                terminal_name: rule.mapped_name.clone(),
                name,
                registry,
                links,
            })
        }
    }
}
