// Copyright (C) Brian G. Milnes 2025

//! Chainfix - AST-based migration of fluent instrumentation call chains
//!
//! Rewrites calls on a legacy fluent API into the equivalent calls on a
//! newer one, driven by declarative signature patterns and replacement
//! templates over the `ra_ap_syntax` tree. The bundled recipes migrate
//! Micrometer `Timer` builder chains to `Observation` and clean up Misk
//! metric calls.

pub mod ast_utils;
pub mod symbols;
pub mod unit;
pub mod imports;
pub mod attribution;
pub mod invocation;
pub mod matcher;
pub mod precondition;
pub mod chain;
pub mod template;
pub mod rewriter;
pub mod type_rewriter;
pub mod diagnostics;
pub mod engine;
pub mod recipes;
pub mod logging;
pub mod tool_runner;
pub mod driver;

// Re-export commonly used items
pub use attribution::attribution::{attribute, attribute_expr, Attribution};
pub use chain::chain::{ChainConfig, ChainLink, ChainWalker, LinkShape, NoMatch, RewritePlan, ShapeRule, TerminalRule, MAX_CHAIN_DEPTH};
pub use diagnostics::diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use driver::driver::{find_rust_files, fix_file, fix_files, fix_source, run_fix, FileReport, FixArgs};
pub use engine::engine::{migrate, FindRule, Migration, MigrationResult, SiteOutcome, SiteReport, SiteStrategy};
pub use imports::imports::{ImportDelta, ImportDirective};
pub use invocation::invocation::{invocations, Invocation};
pub use matcher::matcher::{ArityPattern, NamePattern, PatternError, SignaturePattern};
pub use precondition::precondition::Precondition;
pub use rewriter::rewriter::{Replacement, RewriteError, Rewriter};
pub use symbols::symbols::{MethodSymbol, ResolvedMethod, SymbolTable, TypeSymbol};
pub use template::template::{ArgGuard, AssemblerConfig, CallTemplate, CardinalityPolicy, FragmentSet, Template, TemplateAssembler, TemplateParam};
pub use type_rewriter::type_rewriter::{rename_types, TypeRename};
pub use unit::unit::{SourceUnit, TextEdit, UnitError};
