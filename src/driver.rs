// Copyright (C) Brian G. Milnes 2025

//! File driver for the fix binaries
//!
//! Finds `.rs` files, runs one migration over each in parallel and reports
//! per-file results. Files are independent, so each one is parsed, migrated
//! and written inside its own rayon task.

pub mod driver {
    use std::fs;
    use std::path::{Path, PathBuf};
    use anyhow::{Context, Result};
    use clap::Parser;
    use rayon::prelude::*;
    use walkdir::WalkDir;
    use crate::diagnostics::diagnostics::{Diagnostic, DiagnosticKind, Severity};
    use crate::engine::engine::{migrate, Migration, SiteReport};
    use crate::logging::logging::ToolLogger;
    use crate::symbols::symbols::SymbolTable;
    use crate::tool_runner::tool_runner::{run_tool, ToolConfig};
    use crate::unit::unit::SourceUnit;

    #[derive(Parser, Debug, Clone, Default)]
    pub struct FixArgs {
        /// Files to migrate
        pub files: Vec<PathBuf>,

        /// Directories searched recursively for .rs files
        #[arg(short, long)]
        pub dir: Vec<PathBuf>,

        /// Report what would change without writing files
        #[arg(short = 'n', long)]
        pub dry_run: bool,

        /// Symbol table JSON merged over the built-in one
        #[arg(short, long)]
        pub symbols: Option<PathBuf>,

        /// Write a run log under logs/
        #[arg(short, long)]
        pub log: bool,
    }

    impl FixArgs {
        /// Named files plus every `.rs` file under the named directories;
        /// the current directory when neither is given
        pub fn targets(&self) -> Vec<PathBuf> {
            let mut targets = self.files.clone();
            let dirs = if self.files.is_empty() && self.dir.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                self.dir.clone()
            };
            for dir in &dirs {
                targets.extend(find_rust_files(dir));
            }
            targets
        }

        pub fn symbol_table(&self) -> Result<SymbolTable> {
            let builtin = SymbolTable::micrometer()?;
            match &self.symbols {
                Some(path) => Ok(builtin.merge(SymbolTable::load(path)?)),
                None => Ok(builtin),
            }
        }
    }

    /// `.rs` files under `dir`, sorted, skipping `target` and hidden directories
    pub fn find_rust_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                e.depth() == 0 || !(name == "target" || name.starts_with('.'))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "rs"))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    #[derive(Debug)]
    pub struct FileReport {
        pub path: PathBuf,
        pub changed: bool,
        pub sites: Vec<SiteReport>,
        pub diagnostics: Vec<Diagnostic>,
        pub error: Option<String>,
    }

    impl FileReport {
        pub fn rewritten(&self) -> usize {
            self.sites.iter().filter(|s| s.outcome.is_rewritten()).count()
        }

        pub fn found(&self) -> usize {
            self.sites.iter().filter(|s| s.outcome.is_found()).count()
        }

        fn failed(path: &Path, error: anyhow::Error) -> Self {
            FileReport {
                path: path.to_path_buf(),
                changed: false,
                sites: Vec::new(),
                diagnostics: Vec::new(),
                error: Some(format!("{error:#}")),
            }
        }
    }

    /// Migrate source text; `None` when nothing changed
    pub fn fix_source(
        path: &Path,
        text: &str,
        migration: &Migration,
        symbols: &SymbolTable,
    ) -> Result<(Option<String>, Vec<SiteReport>, Vec<Diagnostic>)> {
        let unit = SourceUnit::parse_path(path, text)?;
        let mut result = migrate(&unit, migration, symbols)?;
        let changed = result.is_changed();
        let sites = std::mem::take(&mut result.sites);
        let diagnostics = std::mem::take(&mut result.diagnostics);
        if !changed {
            return Ok((None, sites, diagnostics));
        }
        let fixed = result.finish()?.text();
        let fixed = (fixed != text).then_some(fixed);
        Ok((fixed, sites, diagnostics))
    }

    pub fn fix_file(path: &Path, migration: &Migration, symbols: &SymbolTable, dry_run: bool) -> Result<FileReport> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (fixed, sites, diagnostics) = fix_source(path, &text, migration, symbols)
            .with_context(|| format!("Failed to migrate {}", path.display()))?;

        if let Some(fixed) = &fixed {
            if !dry_run {
                fs::write(path, fixed).with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Ok(FileReport {
            path: path.to_path_buf(),
            changed: fixed.is_some(),
            sites,
            diagnostics,
            error: None,
        })
    }

    /// Migrate files in parallel; reports come back in input order
    pub fn fix_files(paths: &[PathBuf], migration: &Migration, symbols: &SymbolTable, dry_run: bool) -> Vec<FileReport> {
        paths
            .par_iter()
            .map(|path| fix_file(path, migration, symbols, dry_run).unwrap_or_else(|e| FileReport::failed(path, e)))
            .collect()
    }

    fn log_report(logger: &mut ToolLogger, report: &FileReport, dry_run: bool) {
        let path = report.path.display();
        if let Some(error) = &report.error {
            logger.log(&format!("{path}: error: {error}"));
            return;
        }
        if report.changed {
            let verb = if dry_run { "would rewrite" } else { "rewrote" };
            logger.log(&format!("{path}: {verb} {} site(s)", report.rewritten()));
        }
        for diagnostic in &report.diagnostics {
            let line = format!("{path}:{diagnostic}");
            if diagnostic.severity >= Severity::Warning || diagnostic.kind == DiagnosticKind::SiteFound {
                logger.log(&line);
            } else {
                logger.log_silent(&line);
            }
        }
    }

    /// Entry point shared by the fix binaries
    pub fn run_fix(tool_name: &str, args: &FixArgs, migration: &Migration) -> Result<()> {
        let base_dir = std::env::current_dir()?;
        let config = ToolConfig::new(tool_name, base_dir).with_logging(args.log);

        run_tool(config, |logger| {
            let symbols = args.symbol_table()?;
            let files = args.targets();
            logger.log(&format!("Migration: {} ({})", migration.name, migration.description));
            if args.dry_run {
                logger.log("Dry run: no files will be written");
            }

            let reports = fix_files(&files, migration, &symbols, args.dry_run);
            for report in &reports {
                log_report(logger, report, args.dry_run);
            }

            let changed = reports.iter().filter(|r| r.changed).count();
            let sites: usize = reports.iter().map(FileReport::rewritten).sum();
            let warnings = reports
                .iter()
                .flat_map(|r| &r.diagnostics)
                .filter(|d| d.severity >= Severity::Warning)
                .count();
            let errors = reports.iter().filter(|r| r.error.is_some()).count();
            let found: usize = reports.iter().map(FileReport::found).sum();
            Ok(format!(
                "Summary: {} files checked, {changed} files changed, {sites} sites rewritten, {found} sites found, {warnings} warnings, {errors} errors",
                reports.len()
            ))
        })
    }
}
