// Copyright (C) Brian G. Milnes 2025

//! Import bookkeeping
//!
//! Rewrites do not touch `use` items while they run. Each one reports an
//! `ImportDelta` (imports it may need, imports it may have orphaned) and the
//! caller applies the merged delta once per unit. Additions only happen for
//! names the unit actually references; removals only for names it no
//! longer references.

pub mod imports {
    use std::collections::{BTreeMap, BTreeSet};
    use ra_ap_syntax::{ast::{self, AstNode, HasName}, NodeOrToken, SyntaxKind, SyntaxNode, TextRange, TextSize};
    use serde::Serialize;
    use crate::ast_utils::ast_utils::{compact_text, is_inside_node_kind, path_segments, simple_name};
    use crate::unit::unit::{SourceUnit, TextEdit, UnitError};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub enum ImportDirective {
        Add(String),
        Remove(String),
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct ImportDelta {
        pub add: BTreeSet<String>,
        pub remove: BTreeSet<String>,
    }

    impl ImportDelta {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_import(&mut self, fqn: impl Into<String>) {
            self.add.insert(fqn.into());
        }

        pub fn remove_import(&mut self, fqn: impl Into<String>) {
            self.remove.insert(fqn.into());
        }

        pub fn merge(&mut self, other: ImportDelta) {
            self.add.extend(other.add);
            self.remove.extend(other.remove);
        }

        pub fn is_empty(&self) -> bool {
            self.add.is_empty() && self.remove.is_empty()
        }

        /// Removals first, then additions, each in name order
        pub fn directives(&self) -> Vec<ImportDirective> {
            self.remove
                .iter()
                .cloned()
                .map(ImportDirective::Remove)
                .chain(self.add.iter().cloned().map(ImportDirective::Add))
                .collect()
        }

        /// Apply the delta to a unit
        pub fn apply(&self, unit: &SourceUnit) -> Result<SourceUnit, UnitError> {
            let mut current = unit.clone();
            for directive in self.directives() {
                current = match directive {
                    ImportDirective::Remove(fqn) => maybe_remove_import(&current, &fqn)?,
                    ImportDirective::Add(fqn) => maybe_add_import(&current, &fqn)?,
                };
            }
            Ok(current)
        }
    }

    /// One leaf of a `use` tree: `use a::{b::C as D}` has the leaf `a::b::C` bound to `D`
    #[derive(Debug, Clone)]
    pub struct ImportLeaf {
        pub tree: ast::UseTree,
        pub fqn: String,
        pub binding: String,
    }

    pub fn import_leaves(root: &SyntaxNode) -> Vec<ImportLeaf> {
        let mut leaves = Vec::new();
        for use_item in root.descendants().filter_map(ast::Use::cast) {
            if let Some(tree) = use_item.use_tree() {
                collect_leaves(&tree, &[], &mut leaves);
            }
        }
        leaves
    }

    fn collect_leaves(tree: &ast::UseTree, prefix: &[String], out: &mut Vec<ImportLeaf>) {
        let mut segments = prefix.to_vec();
        if let Some(path) = tree.path() {
            segments.extend(path_segments(&path));
        }
        if let Some(list) = tree.use_tree_list() {
            for child in list.use_trees() {
                collect_leaves(&child, &segments, out);
            }
            return;
        }
        if tree.star_token().is_some() {
            return;
        }
        if segments.last().is_some_and(|s| s == "self") {
            segments.pop();
        }
        let Some(last) = segments.last().cloned() else { return };
        let binding = tree
            .rename()
            .and_then(|r| r.name())
            .map(|n| n.syntax().text().to_string())
            .unwrap_or(last);
        out.push(ImportLeaf {
            tree: tree.clone(),
            fqn: segments.join("::"),
            binding,
        });
    }

    /// Binding name to fully qualified path for every import in the unit
    pub fn collect_imports(root: &SyntaxNode) -> BTreeMap<String, String> {
        import_leaves(root)
            .into_iter()
            .map(|leaf| (leaf.binding, leaf.fqn))
            .collect()
    }

    pub fn is_imported(root: &SyntaxNode, fqn: &str) -> bool {
        import_leaves(root).iter().any(|leaf| leaf.fqn == fqn)
    }

    /// Names referenced anywhere outside `use` items
    ///
    /// Later segments of a qualified path (`Metrics` in `a::b::Metrics`) do
    /// not name an import and are skipped.
    pub fn referenced_names(root: &SyntaxNode) -> BTreeSet<String> {
        root.descendants()
            .filter(|n| n.kind() == SyntaxKind::NAME_REF)
            .filter(|n| !is_inside_node_kind(n, SyntaxKind::USE))
            .filter(|n| !is_qualified_segment(n))
            .map(|n| n.text().to_string())
            .collect()
    }

    fn is_qualified_segment(name_ref: &SyntaxNode) -> bool {
        name_ref
            .parent()
            .filter(|p| p.kind() == SyntaxKind::PATH_SEGMENT)
            .and_then(|segment| segment.parent())
            .and_then(ast::Path::cast)
            .is_some_and(|path| path.qualifier().is_some())
    }

    /// Remove the import of `fqn` unless its name is still referenced
    pub fn maybe_remove_import(unit: &SourceUnit, fqn: &str) -> Result<SourceUnit, UnitError> {
        let root = unit.syntax();
        let still_used = import_leaves(root)
            .iter()
            .filter(|leaf| leaf.fqn == fqn)
            .any(|leaf| referenced_names(root).contains(&leaf.binding));
        if still_used {
            return Ok(unit.clone());
        }
        remove_import(unit, fqn)
    }

    /// Add an import of `fqn` if the unit references its name and does not import it yet
    pub fn maybe_add_import(unit: &SourceUnit, fqn: &str) -> Result<SourceUnit, UnitError> {
        let root = unit.syntax();
        if is_imported(root, fqn) || !referenced_names(root).contains(simple_name(fqn)) {
            return Ok(unit.clone());
        }
        add_import(unit, fqn)
    }

    /// Remove every import of `fqn`
    pub fn remove_import(unit: &SourceUnit, fqn: &str) -> Result<SourceUnit, UnitError> {
        let text = unit.text();
        let mut edits: Vec<TextEdit> = Vec::new();
        for leaf in import_leaves(unit.syntax()).iter().filter(|leaf| leaf.fqn == fqn) {
            let edit = removal_edit(&text, &leaf.tree);
            if !edits.iter().any(|e| e.range.intersect(edit.range).is_some()) {
                edits.push(edit);
            }
        }
        unit.apply_edits(edits)
    }

    fn removal_edit(text: &str, tree: &ast::UseTree) -> TextEdit {
        let parent = tree.syntax().parent();
        match parent.as_ref().and_then(|p| ast::UseTreeList::cast(p.clone())) {
            None => {
                let item = parent.unwrap_or_else(|| tree.syntax().clone());
                TextEdit::delete(whole_line_range(text, item.text_range()))
            }
            Some(list) => {
                let siblings: Vec<ast::UseTree> = list.use_trees().collect();
                let owner = list.syntax().parent().and_then(ast::UseTree::cast);
                match (siblings.len(), owner) {
                    (1, Some(owner)) => removal_edit(text, &owner),
                    (2, _) => {
                        let remaining = siblings
                            .iter()
                            .find(|s| s.syntax() != tree.syntax())
                            .map(|s| s.syntax().text().to_string())
                            .unwrap_or_default();
                        TextEdit::new(list.syntax().text_range(), remaining)
                    }
                    _ => TextEdit::delete(list_entry_range(tree.syntax())),
                }
            }
        }
    }

    /// Range of a list entry together with one separating comma
    fn list_entry_range(node: &SyntaxNode) -> TextRange {
        let range = node.text_range();
        let mut end = range.end();
        let mut found_comma = false;
        for element in node.siblings_with_tokens(ra_ap_syntax::Direction::Next).skip(1) {
            match element {
                NodeOrToken::Token(t) if t.kind() == SyntaxKind::COMMA && !found_comma => {
                    found_comma = true;
                    end = t.text_range().end();
                }
                NodeOrToken::Token(t) if t.kind() == SyntaxKind::WHITESPACE && found_comma => {
                    end = t.text_range().end();
                }
                _ => break,
            }
        }
        if found_comma {
            return TextRange::new(range.start(), end);
        }

        let mut start = range.start();
        for element in node.siblings_with_tokens(ra_ap_syntax::Direction::Prev).skip(1) {
            match element {
                NodeOrToken::Token(t) if t.kind() == SyntaxKind::WHITESPACE => start = t.text_range().start(),
                NodeOrToken::Token(t) if t.kind() == SyntaxKind::COMMA => {
                    start = t.text_range().start();
                    break;
                }
                _ => break,
            }
        }
        TextRange::new(start, range.end())
    }

    /// Widen an item range to its whole line when nothing else shares the line
    fn whole_line_range(text: &str, range: TextRange) -> TextRange {
        let start: usize = range.start().into();
        let end: usize = range.end().into();
        let line_start = text[..start].rfind('\n').map(|p| p + 1).unwrap_or(0);
        if !text[line_start..start].trim().is_empty() {
            return range;
        }
        let line_end = match text[end..].find('\n') {
            Some(p) if text[end..end + p].trim().is_empty() => end + p + 1,
            _ => return range,
        };
        TextRange::new(offset(line_start), offset(line_end))
    }

    fn offset(value: usize) -> TextSize {
        TextSize::from(value as u32)
    }

    /// Insert `use fqn;` among the top-level imports
    ///
    /// The new line joins the imports of the same crate, in name order among
    /// them; without any it goes in name order among all imports.
    pub fn add_import(unit: &SourceUnit, fqn: &str) -> Result<SourceUnit, UnitError> {
        let root = unit.syntax();
        let line = format!("use {fqn};");
        let all_uses: Vec<ast::Use> = root.children().filter_map(ast::Use::cast).collect();

        let key = |u: &ast::Use| u.use_tree().map(|t| compact_text(t.syntax())).unwrap_or_default();
        let crate_of = |path: &str| path.split("::").next().unwrap_or_default().to_string();
        let same_crate: Vec<ast::Use> = all_uses
            .iter()
            .filter(|u| crate_of(&key(u)) == crate_of(fqn))
            .cloned()
            .collect();
        let uses = if same_crate.is_empty() { all_uses } else { same_crate };

        let edit = if let Some(next) = uses.iter().find(|u| key(u).as_str() > fqn) {
            TextEdit::insert(next.syntax().text_range().start(), format!("{line}\n"))
        } else if let Some(last) = uses.last() {
            TextEdit::insert(last.syntax().text_range().end(), format!("\n{line}"))
        } else if let Some(first) = root.children().find(|n| n.kind() != SyntaxKind::ATTR) {
            let start = first.text_range().start();
            let leading = TextRange::new(root.text_range().start(), start);
            // Blank lines left behind by removed imports are absorbed
            if unit.text()[..usize::from(start)].trim().is_empty() {
                TextEdit::new(leading, format!("{line}\n\n"))
            } else {
                TextEdit::insert(start, format!("{line}\n\n"))
            }
        } else {
            TextEdit::insert(root.text_range().end(), format!("{line}\n"))
        };
        unit.apply_edits(vec![edit])
    }
}
