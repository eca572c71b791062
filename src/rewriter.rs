// Copyright (C) Brian G. Milnes 2025

//! Template compilation and splicing
//!
//! The rewriter turns a `Template` into a green subtree:
//!
//! 1. each placeholder becomes a unique identifier,
//! 2. continuation lines are indented to the call's line plus four spaces,
//! 3. the text is parsed as an expression and every call in it is
//!    attributed against the symbol table,
//! 4. each identifier is replaced by the green node of its parameter,
//!    together with the comments written around that argument.
//!
//! Parameters are moved as nodes, never re-printed, so literals and
//! comments come through byte for byte.

pub mod rewriter {
    use std::collections::BTreeMap;
    use std::sync::LazyLock;
    use ra_ap_syntax::{ast::{self, AstNode}, Edition, GreenNode, NodeOrToken, SourceFile, SyntaxKind, SyntaxNode, TextRange};
    use regex::Regex;
    use crate::ast_utils::ast_utils::{attached_trivia, compact_text, simple_name};
    use crate::attribution::attribution::attribute_expr;
    use crate::imports::imports::{referenced_names, ImportDelta};
    use crate::symbols::symbols::SymbolTable;
    use crate::template::template::Template;
    use crate::unit::unit::{SourceUnit, UnitError};

    pub const PLACEHOLDER_PREFIX: &str = "__chainfix_p";

    #[derive(Debug, thiserror::Error)]
    pub enum RewriteError {
        #[error("template does not compile: {0}")]
        TemplateCompile(String),

        #[error("template has {placeholders} placeholders but {params} parameters")]
        ParameterCount { placeholders: usize, params: usize },

        #[error("no {kind:?} node at {range:?}")]
        TargetNotFound { kind: SyntaxKind, range: TextRange },

        #[error(transparent)]
        Unit(#[from] UnitError),
    }

    /// Compiled replacement for one call site
    #[derive(Debug, Clone)]
    pub struct Replacement {
        pub target: TextRange,
        pub kind: SyntaxKind,
        pub green: GreenNode,
        pub text: String,
        pub imports: ImportDelta,
    }

    static PLACEHOLDER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"#\{any\(([^)]*)\)\}").expect("placeholder regex"));

    /// Replace placeholders with identifiers, returning the declared type of each
    pub fn substitute_placeholders(skeleton: &str) -> (String, Vec<Option<String>>) {
        let mut types = Vec::new();
        let text = PLACEHOLDER
            .replace_all(skeleton, |caps: &regex::Captures| {
                let ty = caps[1].trim();
                types.push((!ty.is_empty()).then(|| ty.to_string()));
                format!("{PLACEHOLDER_PREFIX}{}", types.len() - 1)
            })
            .into_owned();
        (text, types)
    }

    pub struct Rewriter<'a> {
        symbols: &'a SymbolTable,
    }

    impl<'a> Rewriter<'a> {
        pub fn new(symbols: &'a SymbolTable) -> Self {
            Rewriter { symbols }
        }

        /// Compile `template` as a replacement for `target` in `unit`
        pub fn apply(&self, unit: &SourceUnit, target: &SyntaxNode, template: &Template) -> Result<Replacement, RewriteError> {
            let (text, types) = substitute_placeholders(&template.skeleton);
            if types.len() != template.params.len() {
                return Err(RewriteError::ParameterCount {
                    placeholders: types.len(),
                    params: template.params.len(),
                });
            }

            let indent = unit.indent_at(target.text_range().start());
            let text = text.replace('\n', &format!("\n{indent}    "));
            let compiled = self.compile(&text, template, &types)?;

            let mut imports = ImportDelta::new();
            let names = referenced_names(compiled.syntax());
            for fqn in &template.imports {
                if names.contains(simple_name(fqn)) {
                    imports.add_import(fqn.clone());
                }
            }
            for fqn in &template.remove_imports {
                imports.remove_import(fqn.clone());
            }

            let mut root = compiled.syntax().clone();
            for (index, param) in template.params.iter().enumerate() {
                root = splice_param(&root, &format!("{PLACEHOLDER_PREFIX}{index}"), param)?;
            }

            Ok(Replacement {
                target: target.text_range(),
                kind: target.kind(),
                green: root.green().into_owned(),
                text: root.to_string(),
                imports,
            })
        }

        /// Parse and attribute the skeleton, detached from any unit
        fn compile(&self, text: &str, template: &Template, types: &[Option<String>]) -> Result<ast::Expr, RewriteError> {
            let wrapped = format!("fn __chainfix_template() {{\n    {text}\n}}\n");
            let parsed = SourceFile::parse(&wrapped, Edition::Edition2021);
            if !parsed.errors().is_empty() {
                return Err(RewriteError::TemplateCompile(format!("{:?}", parsed.errors())));
            }
            let expr = parsed
                .tree()
                .syntax()
                .descendants()
                .find_map(ast::Fn::cast)
                .and_then(|f| f.body())
                .and_then(|b| b.stmt_list())
                .and_then(|s| s.tail_expr())
                .ok_or_else(|| RewriteError::TemplateCompile("skeleton is not an expression".to_string()))?;
            let expr = ast::Expr::cast(SyntaxNode::new_root(expr.syntax().green().into_owned()))
                .ok_or_else(|| RewriteError::TemplateCompile("skeleton is not an expression".to_string()))?;

            let imports: BTreeMap<String, String> = template
                .imports
                .iter()
                .map(|fqn| (simple_name(fqn).to_string(), fqn.clone()))
                .collect();
            let bindings: Vec<(String, Option<String>)> = types
                .iter()
                .enumerate()
                .map(|(i, ty)| (format!("{PLACEHOLDER_PREFIX}{i}"), ty.clone()))
                .collect();
            let attribution = attribute_expr(&expr, self.symbols, imports, &bindings);

            let unresolved = expr
                .syntax()
                .descendants()
                .filter(|n| matches!(n.kind(), SyntaxKind::METHOD_CALL_EXPR | SyntaxKind::CALL_EXPR))
                .find(|n| attribution.method(n).is_none());
            if let Some(call) = unresolved {
                return Err(RewriteError::TemplateCompile(format!("cannot resolve `{}`", compact_text(&call))));
            }
            Ok(expr)
        }

        /// Replace the target node in `unit` with the compiled replacement
        pub fn splice(unit: &SourceUnit, replacement: &Replacement) -> Result<SourceUnit, RewriteError> {
            let target = unit
                .find_node(replacement.target, replacement.kind)
                .ok_or(RewriteError::TargetNotFound { kind: replacement.kind, range: replacement.target })?;
            let root = target.replace_with(replacement.green.clone());
            Ok(unit.with_root(root)?)
        }
    }

    /// Put `param` and its attached comments where the identifier `placeholder` stands
    fn splice_param(root: &SyntaxNode, placeholder: &str, param: &ast::Expr) -> Result<SyntaxNode, RewriteError> {
        let slot = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::PATH_EXPR && n.text() == placeholder)
            .ok_or_else(|| RewriteError::TemplateCompile(format!("placeholder {placeholder} vanished")))?;
        let param_green = param.syntax().green().into_owned();

        let Some(parent) = slot.parent() else {
            return Ok(SyntaxNode::new_root(param_green));
        };
        let (leading, trailing) = attached_trivia(param.syntax());
        let mut children = Vec::with_capacity(leading.len() + trailing.len() + 1);
        children.extend(leading.iter().map(|t| NodeOrToken::Token(t.green().to_owned())));
        children.push(NodeOrToken::Node(param_green));
        children.extend(trailing.iter().map(|t| NodeOrToken::Token(t.green().to_owned())));

        let index = slot.index();
        let new_parent = parent.green().splice_children(index..index + 1, children);
        Ok(SyntaxNode::new_root(parent.replace_with(new_parent)))
    }
}
