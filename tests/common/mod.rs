// Copyright (C) Brian G. Milnes 2025

//! Common test utilities for integration tests

#![allow(dead_code)]

use anyhow::{Context, Result};
use ra_ap_syntax::ast::{self, AstNode};
use chainfix::{attribute, invocations, migrate, Attribution, Invocation, Migration, SourceUnit, SymbolTable};

/// The built-in Micrometer/Misk table
pub fn symbols() -> SymbolTable {
    SymbolTable::micrometer().expect("built-in symbol table parses")
}

pub fn parse(text: &str) -> SourceUnit {
    SourceUnit::parse(text).expect("test source parses")
}

/// Parse and attribute against the built-in table
pub fn attributed(text: &str) -> (SourceUnit, Attribution) {
    let unit = parse(text);
    let attribution = attribute(&unit, &symbols());
    (unit, attribution)
}

/// Every call named `name`, in source order
pub fn calls(unit: &SourceUnit, attribution: &Attribution, name: &str) -> Vec<Invocation> {
    invocations(unit.syntax(), attribution)
        .into_iter()
        .filter(|inv| inv.name() == name)
        .collect()
}

/// First call named `name`
pub fn call(unit: &SourceUnit, attribution: &Attribution, name: &str) -> Invocation {
    calls(unit, attribution, name)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no call named {name}"))
}

/// The initializer of `let x = <text>;` as a detached expression
pub fn expr(text: &str) -> ast::Expr {
    let unit = parse(&format!("fn f() {{ let x = {text}; }}"));
    unit.syntax()
        .descendants()
        .find_map(ast::LetStmt::cast)
        .and_then(|l| l.initializer())
        .expect("let initializer")
}

/// Run a migration and apply its imports
pub fn run(migration: &Migration, text: &str) -> Result<String> {
    let unit = SourceUnit::parse(text)?;
    let result = migrate(&unit, migration, &symbols())?;
    Ok(result.finish()?.text())
}

/// Parse a number with possible commas (e.g., "1,234" -> 1234)
pub fn parse_number(s: &str) -> Result<usize> {
    let cleaned = s.replace(',', "");
    cleaned.parse::<usize>()
        .context(format!("Failed to parse number: {s}"))
}

/// The number written just before `keyword` in a summary line
pub fn number_before(text: &str, keyword: &str) -> Option<usize> {
    text.find(keyword)
        .and_then(|idx| text[..idx].split_whitespace().last())
        .and_then(|num| parse_number(num).ok())
}
