// Copyright (C) Brian G. Milnes 2025

//! Migration engine
//!
//! Runs one `Migration` over one unit in a fixed order:
//!
//! 1. evaluate the precondition; a unit that fails it is returned as is,
//! 2. rename types,
//! 3. re-attribute against the renamed types,
//! 4. collect candidate sites and map terminal names,
//! 5. build a template for each site and compile it,
//! 6. splice every compiled replacement, last site first.
//!
//! Import changes are returned as an `ImportDelta` and applied once, by
//! `MigrationResult::finish`. A unit in which no site was rewritten comes
//! back exactly as it went in. A `Find` strategy stops after step 4 and
//! reports its sites without rewriting them.

pub mod engine {
    use std::cmp::Reverse;
    use ra_ap_syntax::TextRange;
    use serde::{Deserialize, Serialize};
    use crate::ast_utils::ast_utils::compact_text;
    use crate::attribution::attribution::{attribute, Attribution};
    use crate::chain::chain::{ChainConfig, ChainWalker, NoMatch};
    use crate::diagnostics::diagnostics::{Diagnostic, DiagnosticKind};
    use crate::imports::imports::ImportDelta;
    use crate::invocation::invocation::{invocations, Invocation};
    use crate::matcher::matcher::SignaturePattern;
    use crate::precondition::precondition::Precondition;
    use crate::rewriter::rewriter::{Replacement, RewriteError, Rewriter};
    use crate::symbols::symbols::SymbolTable;
    use crate::template::template::{AssemblerConfig, CallTemplate, Template, TemplateAssembler};
    use crate::type_rewriter::type_rewriter::{rename_types, TypeRename};
    use crate::unit::unit::{SourceUnit, UnitError};

    /// How candidate sites are found and turned into templates
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum SiteStrategy {
        /// Terminal calls of a fluent builder chain
        Chain { chain: ChainConfig, assembler: AssemblerConfig },
        /// Single calls rewritten into a fixed skeleton
        Call(CallTemplate),
        /// Calls reported under a label and left as written
        Find(Vec<FindRule>),
    }

    /// Calls matching `pattern` are reported as `label`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FindRule {
        pub pattern: SignaturePattern,
        pub label: String,
    }

    impl SiteStrategy {
        fn is_site(&self, invocation: &Invocation) -> bool {
            match self {
                SiteStrategy::Chain { chain, .. } => chain.is_terminal(invocation),
                SiteStrategy::Call(template) => template.matches(invocation),
                SiteStrategy::Find(rules) => rules.iter().any(|r| r.pattern.matches(invocation)),
            }
        }

        /// The template for a site, or the outcome when there is none
        fn template_for(&self, invocation: &Invocation, attribution: &Attribution) -> Result<Template, SiteOutcome> {
            match self {
                SiteStrategy::Chain { chain, assembler } => {
                    let plan = ChainWalker::new(chain, attribution)
                        .walk(invocation)
                        .map_err(SiteOutcome::Unchanged)?;
                    Ok(TemplateAssembler::new(assembler).assemble(&plan))
                }
                SiteStrategy::Call(template) => template.instantiate(invocation).map_err(SiteOutcome::Unchanged),
                SiteStrategy::Find(rules) => {
                    let label = rules
                        .iter()
                        .find(|r| r.pattern.matches(invocation))
                        .map(|r| r.label.clone())
                        .unwrap_or_default();
                    Err(SiteOutcome::Found(label))
                }
            }
        }
    }

    /// An immutable migration recipe
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Migration {
        pub name: String,
        pub description: String,
        pub precondition: Precondition,
        pub type_renames: Vec<TypeRename>,
        pub strategy: SiteStrategy,
    }

    #[derive(Debug)]
    pub enum SiteOutcome {
        Rewritten,
        /// Reported by a `Find` strategy under its label
        Found(String),
        Unchanged(NoMatch),
        Error(RewriteError),
    }

    impl SiteOutcome {
        pub fn is_rewritten(&self) -> bool {
            matches!(self, SiteOutcome::Rewritten)
        }

        pub fn is_found(&self) -> bool {
            matches!(self, SiteOutcome::Found(_))
        }
    }

    #[derive(Debug)]
    pub struct SiteReport {
        pub line: usize,
        /// Call text with whitespace removed
        pub call: String,
        pub outcome: SiteOutcome,
    }

    #[derive(Debug)]
    pub struct MigrationResult {
        /// The rewritten unit, before `imports` is applied
        pub unit: SourceUnit,
        pub imports: ImportDelta,
        pub sites: Vec<SiteReport>,
        pub diagnostics: Vec<Diagnostic>,
    }

    impl MigrationResult {
        fn untouched(unit: &SourceUnit, sites: Vec<SiteReport>) -> Self {
            let diagnostics = site_diagnostics(&sites);
            MigrationResult { unit: unit.clone(), imports: ImportDelta::new(), sites, diagnostics }
        }

        pub fn rewritten_count(&self) -> usize {
            self.sites.iter().filter(|s| s.outcome.is_rewritten()).count()
        }

        pub fn found_count(&self) -> usize {
            self.sites.iter().filter(|s| s.outcome.is_found()).count()
        }

        pub fn is_changed(&self) -> bool {
            self.rewritten_count() > 0
        }

        /// Apply the import delta and return the final unit
        pub fn finish(self) -> Result<SourceUnit, UnitError> {
            self.imports.apply(&self.unit)
        }
    }

    /// Run `migration` over `unit`
    pub fn migrate(unit: &SourceUnit, migration: &Migration, symbols: &SymbolTable) -> Result<MigrationResult, UnitError> {
        let renamed_symbols = symbols.renamed(&migration.type_renames);
        // Partly migrated units already use the new types
        let gate_symbols = symbols.clone().merge(renamed_symbols.clone());
        if !migration.precondition.evaluate(unit, &attribute(unit, &gate_symbols)) {
            return Ok(MigrationResult::untouched(unit, Vec::new()));
        }

        let renamed = rename_types(unit, &migration.type_renames)?;
        let attribution = attribute(&renamed, &renamed_symbols);

        let mut sites: Vec<Invocation> = invocations(renamed.syntax(), &attribution)
            .into_iter()
            .filter(|inv| migration.strategy.is_site(inv))
            .collect();
        sites.sort_by_key(|inv| (inv.range().start(), Reverse(inv.range().end())));

        let rewriter = Rewriter::new(&renamed_symbols);
        let mut reports = Vec::with_capacity(sites.len());
        let mut replacements: Vec<(usize, Replacement)> = Vec::new();
        let mut claimed: Vec<TextRange> = Vec::new();

        for site in &sites {
            let outcome = if claimed.iter().any(|r| r.contains_range(site.range())) {
                SiteOutcome::Unchanged(NoMatch::Nested)
            } else {
                match migration.strategy.template_for(site, &attribution) {
                    Err(outcome) => outcome,
                    Ok(template) => match rewriter.apply(&renamed, site.node(), &template) {
                        Err(error) => SiteOutcome::Error(error),
                        Ok(replacement) => {
                            claimed.push(site.range());
                            replacements.push((reports.len(), replacement));
                            SiteOutcome::Rewritten
                        }
                    },
                }
            };
            reports.push(SiteReport {
                line: renamed.line_of(site.range().start()),
                call: compact_text(site.node()),
                outcome,
            });
        }

        if replacements.is_empty() {
            return Ok(MigrationResult::untouched(unit, reports));
        }

        replacements.sort_by_key(|(_, r)| Reverse(r.target.start()));
        let mut current = renamed.clone();
        let mut imports = ImportDelta::new();
        for (index, replacement) in replacements {
            match Rewriter::splice(&current, &replacement) {
                Ok(next) => {
                    current = next;
                    imports.merge(replacement.imports);
                }
                Err(error) => reports[index].outcome = SiteOutcome::Error(error),
            }
        }

        if !reports.iter().any(|r| r.outcome.is_rewritten()) {
            return Ok(MigrationResult::untouched(unit, reports));
        }
        let diagnostics = site_diagnostics(&reports);
        Ok(MigrationResult { unit: current, imports, sites: reports, diagnostics })
    }

    fn site_diagnostics(sites: &[SiteReport]) -> Vec<Diagnostic> {
        sites
            .iter()
            .filter_map(|site| match &site.outcome {
                SiteOutcome::Rewritten => None,
                SiteOutcome::Found(label) => Some(Diagnostic::info(
                    DiagnosticKind::SiteFound,
                    site.line,
                    format!("{label}: {}", site.call),
                )),
                SiteOutcome::Unchanged(reason) => Some(Diagnostic::info(
                    DiagnosticKind::SiteUnchanged,
                    site.line,
                    format!("{}: {reason}", site.call),
                )),
                SiteOutcome::Error(error @ RewriteError::TemplateCompile(_)) => Some(Diagnostic::warning(
                    DiagnosticKind::TemplateCompileFailure,
                    site.line,
                    format!("{}: {error}", site.call),
                )),
                SiteOutcome::Error(error) => Some(Diagnostic::warning(
                    DiagnosticKind::RewriteFailure,
                    site.line,
                    format!("{}: {error}", site.call),
                )),
            })
            .collect()
    }
}
