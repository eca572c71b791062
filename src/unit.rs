// Copyright (C) Brian G. Milnes 2025

//! Source units
//!
//! A `SourceUnit` is one parsed Rust file. Units are values: every pass
//! takes a unit by reference and returns a new one, either by splicing
//! green nodes or by applying text edits and reparsing.

pub mod unit {
    use std::fmt;
    use std::path::{Path, PathBuf};
    use ra_ap_syntax::{ast::{self, AstNode}, Edition, GreenNode, SourceFile, SyntaxKind, SyntaxNode, TextRange, TextSize};
    use crate::ast_utils::ast_utils::{find_node, line_indent, line_number};

    #[derive(Debug, thiserror::Error)]
    pub enum UnitError {
        #[error("parse errors in {path}: {errors}")]
        Parse { path: String, errors: String },

        #[error("rewritten tree for {0} is not a source file")]
        NotASourceFile(String),

        #[error("overlapping edits in {0}")]
        OverlappingEdits(String),
    }

    /// Replace the text in `range` with `replacement`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TextEdit {
        pub range: TextRange,
        pub replacement: String,
    }

    impl TextEdit {
        pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
            TextEdit { range, replacement: replacement.into() }
        }

        pub fn delete(range: TextRange) -> Self {
            TextEdit { range, replacement: String::new() }
        }

        pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
            TextEdit { range: TextRange::empty(offset), replacement: text.into() }
        }
    }

    #[derive(Debug, Clone)]
    pub struct SourceUnit {
        path: Option<PathBuf>,
        file: SourceFile,
    }

    impl SourceUnit {
        /// Parse a unit, rejecting source with syntax errors
        pub fn parse(text: &str) -> Result<Self, UnitError> {
            Self::parse_with_path(None, text)
        }

        pub fn parse_path(path: &Path, text: &str) -> Result<Self, UnitError> {
            Self::parse_with_path(Some(path.to_path_buf()), text)
        }

        fn parse_with_path(path: Option<PathBuf>, text: &str) -> Result<Self, UnitError> {
            let parsed = SourceFile::parse(text, Edition::Edition2021);
            if !parsed.errors().is_empty() {
                return Err(UnitError::Parse {
                    path: display_path(path.as_deref()),
                    errors: format!("{:?}", parsed.errors()),
                });
            }
            Ok(SourceUnit { path, file: parsed.tree() })
        }

        /// New unit with the same path over a rewritten root
        pub fn with_root(&self, green: GreenNode) -> Result<Self, UnitError> {
            let file = ast::SourceFile::cast(SyntaxNode::new_root(green))
                .ok_or_else(|| UnitError::NotASourceFile(self.display_path()))?;
            Ok(SourceUnit { path: self.path.clone(), file })
        }

        /// New unit with the same path, reparsed from `text`
        pub fn with_text(&self, text: &str) -> Result<Self, UnitError> {
            Self::parse_with_path(self.path.clone(), text)
        }

        /// Apply non-overlapping text edits and reparse
        pub fn apply_edits(&self, mut edits: Vec<TextEdit>) -> Result<Self, UnitError> {
            if edits.is_empty() {
                return Ok(self.clone());
            }
            edits.sort_by_key(|e| (e.range.start(), e.range.end()));
            for pair in edits.windows(2) {
                if pair[0].range.end() > pair[1].range.start() {
                    return Err(UnitError::OverlappingEdits(self.display_path()));
                }
            }

            let mut text = self.text();
            for edit in edits.iter().rev() {
                let start: usize = edit.range.start().into();
                let end: usize = edit.range.end().into();
                text.replace_range(start..end, &edit.replacement);
            }
            self.with_text(&text)
        }

        pub fn file(&self) -> &SourceFile {
            &self.file
        }

        pub fn syntax(&self) -> &SyntaxNode {
            self.file.syntax()
        }

        pub fn text(&self) -> String {
            self.file.syntax().text().to_string()
        }

        pub fn path(&self) -> Option<&Path> {
            self.path.as_deref()
        }

        pub fn display_path(&self) -> String {
            display_path(self.path.as_deref())
        }

        pub fn line_of(&self, offset: TextSize) -> usize {
            line_number(&self.text(), offset)
        }

        pub fn indent_at(&self, offset: TextSize) -> String {
            line_indent(&self.text(), offset)
        }

        pub fn find_node(&self, range: TextRange, kind: SyntaxKind) -> Option<SyntaxNode> {
            find_node(self.syntax(), range, kind)
        }
    }

    impl PartialEq for SourceUnit {
        fn eq(&self, other: &Self) -> bool {
            self.text() == other.text()
        }
    }

    impl fmt::Display for SourceUnit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.file.syntax())
        }
    }

    fn display_path(path: Option<&Path>) -> String {
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}
