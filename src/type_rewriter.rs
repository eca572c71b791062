// Copyright (C) Brian G. Milnes 2025

//! Structural type renames
//!
//! Renames every reference to one type into another: parameter, field and
//! `let` types, expression paths, and the `use` items that bring the type
//! into scope. A path is renamed when it resolves to the old type, either
//! through an import or by being written fully qualified.

pub mod type_rewriter {
    use std::collections::{BTreeMap, BTreeSet};
    use ra_ap_syntax::{ast::{self, AstNode}, SyntaxKind, TextRange};
    use serde::{Deserialize, Serialize};
    use crate::ast_utils::ast_utils::{is_inside_node_kind, path_prefix, path_segments, simple_name};
    use crate::imports::imports::{add_import, import_leaves, is_imported, remove_import};
    use crate::unit::unit::{SourceUnit, TextEdit, UnitError};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TypeRename {
        pub from: String,
        pub to: String,
    }

    impl TypeRename {
        pub fn new(from: &str, to: &str) -> Self {
            TypeRename { from: from.to_string(), to: to.to_string() }
        }
    }

    /// Apply each rename in turn
    pub fn rename_types(unit: &SourceUnit, renames: &[TypeRename]) -> Result<SourceUnit, UnitError> {
        let mut current = unit.clone();
        for rename in renames {
            current = rename_type(&current, rename)?;
        }
        Ok(current)
    }

    pub fn rename_type(unit: &SourceUnit, rename: &TypeRename) -> Result<SourceUnit, UnitError> {
        let root = unit.syntax();
        let leaves = import_leaves(root);
        let imports: BTreeMap<String, String> = leaves.iter().map(|l| (l.binding.clone(), l.fqn.clone())).collect();
        let new_binding = simple_name(&rename.to).to_string();
        let already_imported = is_imported(root, &rename.to);

        let mut edits = Vec::new();
        let mut regroup: BTreeSet<String> = BTreeSet::new();
        // Bindings whose references switch to the new simple name
        let mut renamed_bindings: BTreeSet<String> = BTreeSet::new();

        for leaf in leaves.iter().filter(|l| l.fqn == rename.from) {
            let aliased = leaf.tree.rename().is_some();
            if !aliased {
                renamed_bindings.insert(leaf.binding.clone());
            }
            let top_level = leaf.tree.syntax().parent().is_some_and(|p| p.kind() == SyntaxKind::USE);
            match leaf.tree.path() {
                Some(path) if top_level && !already_imported => {
                    edits.push(TextEdit::new(path.syntax().text_range(), rename.to.clone()));
                }
                _ => {
                    let added = match leaf.tree.rename() {
                        Some(alias) => format!("{} {}", rename.to, alias.syntax().text()),
                        None => rename.to.clone(),
                    };
                    regroup.insert(added);
                }
            }
        }

        for path in root.descendants().filter_map(ast::Path::cast) {
            if !is_outermost(&path) || is_inside_node_kind(path.syntax(), SyntaxKind::USE) {
                continue;
            }
            let segments = path_segments(&path);
            let Some(len) = (1..=segments.len()).find(|&k| resolve(&imports, &segments[..k]) == rename.from) else {
                continue;
            };
            let Some(target) = path_prefix(&path, len) else { continue };
            let range = path_name_range(&target);

            if len == 1 && imports.contains_key(&segments[0]) {
                if renamed_bindings.contains(&segments[0]) {
                    edits.push(TextEdit::new(range, new_binding.clone()));
                }
            } else {
                edits.push(TextEdit::new(range, rename.to.clone()));
            }
        }

        let mut renamed = unit.apply_edits(edits)?;
        if !regroup.is_empty() {
            renamed = remove_import(&renamed, &rename.from)?;
            for added in regroup {
                if !is_imported(renamed.syntax(), &rename.to) || added != rename.to {
                    renamed = add_import(&renamed, &added)?;
                }
            }
        }
        Ok(renamed)
    }

    fn is_outermost(path: &ast::Path) -> bool {
        !matches!(path.syntax().parent().map(|p| p.kind()), Some(SyntaxKind::PATH))
    }

    fn resolve(imports: &BTreeMap<String, String>, segments: &[String]) -> String {
        let Some((first, rest)) = segments.split_first() else { return String::new() };
        let head = imports.get(first).cloned().unwrap_or_else(|| first.clone());
        std::iter::once(head).chain(rest.iter().cloned()).collect::<Vec<_>>().join("::")
    }

    /// Range of a path up to the end of its last name, leaving generic arguments alone
    fn path_name_range(path: &ast::Path) -> TextRange {
        let end = path
            .segment()
            .and_then(|s| s.name_ref())
            .map(|n| n.syntax().text_range().end())
            .unwrap_or_else(|| path.syntax().text_range().end());
        TextRange::new(path.syntax().text_range().start(), end)
    }
}
