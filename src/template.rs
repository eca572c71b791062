// Copyright (C) Brian G. Milnes 2025

//! Replacement templates
//!
//! A `Template` is target-API source text with `#{any(Type)}` placeholders
//! plus the argument expressions that fill them, in placeholder order.
//! `#{any()}` is a placeholder of unknown type. Two builders produce them:
//! `TemplateAssembler` from a walked chain, and `CallTemplate` from a single
//! matched call.

pub mod template {
    use ra_ap_syntax::ast::{self, AstNode, HasArgList};
    use serde::{Deserialize, Serialize};
    use crate::ast_utils::ast_utils::{compact_text, path_segments};
    use crate::chain::chain::{LinkShape, NoMatch, RewritePlan};
    use crate::invocation::invocation::Invocation;
    use crate::matcher::matcher::SignaturePattern;

    /// Whether tags become low or high cardinality key values
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum CardinalityPolicy {
        #[default]
        Low,
        High,
    }

    impl CardinalityPolicy {
        fn prefix(self) -> &'static str {
            match self {
                CardinalityPolicy::Low => "low",
                CardinalityPolicy::High => "high",
            }
        }
    }

    /// Fragment text for each link shape
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FragmentSet {
        pub policy: CardinalityPolicy,
    }

    impl FragmentSet {
        pub fn new(policy: CardinalityPolicy) -> Self {
            FragmentSet { policy }
        }

        /// Fragment for a link contributing `arg_count` arguments
        ///
        /// The builder root has none: it becomes the template head.
        pub fn fragment(&self, shape: LinkShape, arg_count: usize) -> Option<String> {
            let p = self.policy.prefix();
            match shape {
                LinkShape::BuilderRoot => None,
                LinkShape::PairTag => Some(format!(
                    "\n.{p}_cardinality_key_value(#{{any(String)}}, #{{any(String)}})"
                )),
                LinkShape::IterableTags => Some(format!(
                    "\n.{p}_cardinality_key_values(KeyValues::of(#{{any(Iterable)}}, Tag::get_key, Tag::get_value))"
                )),
                LinkShape::VarargsTags => {
                    let placeholders = vec!["#{any(String)}"; arg_count].join(", ");
                    Some(format!("\n.{p}_cardinality_key_values(KeyValues::of({placeholders}))"))
                }
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Template {
        pub skeleton: String,
        pub params: Vec<ast::Expr>,
        /// Imports the skeleton may refer to by simple name
        pub imports: Vec<String>,
        /// Imports the rewrite may orphan
        pub remove_imports: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AssemblerConfig {
        /// Head text taking the name and registry placeholders
        pub head: String,
        pub imports: Vec<String>,
        pub remove_imports: Vec<String>,
    }

    pub struct TemplateAssembler<'a> {
        config: &'a AssemblerConfig,
    }

    impl<'a> TemplateAssembler<'a> {
        pub fn new(config: &'a AssemblerConfig) -> Self {
            TemplateAssembler { config }
        }

        /// Head, then tag fragments in source order, then the renamed terminal
        pub fn assemble(&self, plan: &RewritePlan) -> Template {
            let mut skeleton = self.config.head.clone();
            let mut params = vec![plan.name.clone(), plan.registry.clone()];

            for link in plan.tag_links_in_source_order() {
                skeleton.push_str(&link.fragment);
                params.extend(link.args.iter().cloned());
            }

            let terminal_args = plan.terminal.args();
            let placeholders = vec!["#{any()}"; terminal_args.len()].join(", ");
            skeleton.push_str(&format!("\n.{}({placeholders})", plan.terminal_name));
            params.extend(terminal_args.iter().cloned());

            Template {
                skeleton,
                params,
                imports: self.config.imports.clone(),
                remove_imports: self.config.remove_imports.clone(),
            }
        }
    }

    /// Source of one template parameter in a single-call rewrite
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TemplateParam {
        Receiver,
        Arg(usize),
    }

    /// Argument check a call must pass before it is rewritten
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ArgGuard {
        Any,
        /// The argument at this index is an explicit empty list
        EmptyList(usize),
        /// The call stops before this index, or the argument there is an explicit empty list
        AbsentOrEmptyList(usize),
    }

    impl ArgGuard {
        pub fn accepts(&self, args: &[ast::Expr]) -> bool {
            match *self {
                ArgGuard::Any => true,
                ArgGuard::EmptyList(index) => args.len() == index + 1 && is_empty_list(&args[index]),
                ArgGuard::AbsentOrEmptyList(index) => {
                    args.len() == index || (args.len() == index + 1 && is_empty_list(&args[index]))
                }
            }
        }
    }

    /// `vec![]`, `Vec::new()` or `[]`
    pub fn is_empty_list(expr: &ast::Expr) -> bool {
        match expr {
            ast::Expr::ArrayExpr(array) => array.exprs().next().is_none(),
            ast::Expr::MacroExpr(mac) => {
                let Some(call) = mac.macro_call() else { return false };
                let is_vec = call.path().is_some_and(|p| path_segments(&p).last().is_some_and(|s| s == "vec"));
                let empty = call
                    .token_tree()
                    .is_some_and(|tt| matches!(compact_text(tt.syntax()).as_str(), "[]" | "()" | "{}"));
                is_vec && empty
            }
            ast::Expr::CallExpr(call) => {
                let Some(ast::Expr::PathExpr(callee)) = call.expr() else { return false };
                let no_args = call.arg_list().is_some_and(|l| l.args().next().is_none());
                let segments = callee.path().map(|p| path_segments(&p)).unwrap_or_default();
                no_args && segments.ends_with(&["Vec".to_string(), "new".to_string()])
            }
            _ => false,
        }
    }

    /// Rewrite of a single call into a fixed skeleton
    ///
    /// `{name}` in the skeleton stands for the matched call's name.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CallTemplate {
        pub patterns: Vec<SignaturePattern>,
        pub guard: ArgGuard,
        pub skeleton: String,
        pub params: Vec<TemplateParam>,
        pub imports: Vec<String>,
        pub remove_imports: Vec<String>,
    }

    impl CallTemplate {
        pub fn matches(&self, invocation: &Invocation) -> bool {
            self.patterns.iter().any(|p| p.matches(invocation))
        }

        pub fn instantiate(&self, invocation: &Invocation) -> Result<Template, NoMatch> {
            let rejected = || NoMatch::GuardRejected(invocation.name().to_string());
            if !self.guard.accepts(invocation.args()) {
                return Err(rejected());
            }
            let params = self
                .params
                .iter()
                .map(|param| match param {
                    TemplateParam::Receiver => invocation.receiver().cloned(),
                    TemplateParam::Arg(index) => invocation.args().get(*index).cloned(),
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(rejected)?;

            Ok(Template {
                skeleton: self.skeleton.replace("{name}", invocation.name()),
                params,
                imports: self.imports.clone(),
                remove_imports: self.remove_imports.clone(),
            })
        }
    }
}
