// Copyright (C) Brian G. Milnes 2025

//! Call nodes
//!
//! An `Invocation` is a view over one call in the tree. Two forms count as
//! calls: method calls (`registry.timer(..)`) and path calls
//! (`Timer::builder(..)`). Path calls have no receiver.

pub mod invocation {
    use ra_ap_syntax::{ast::{self, AstNode, HasArgList}, SyntaxKind, SyntaxNode, TextRange};
    use crate::ast_utils::ast_utils::path_segments;
    use crate::attribution::attribution::Attribution;
    use crate::symbols::symbols::ResolvedMethod;

    #[derive(Debug, Clone)]
    pub struct Invocation {
        node: SyntaxNode,
        receiver: Option<ast::Expr>,
        name: String,
        args: Vec<ast::Expr>,
        method: Option<ResolvedMethod>,
        candidates: Vec<ResolvedMethod>,
    }

    impl Invocation {
        pub fn from_node(node: &SyntaxNode, attribution: &Attribution) -> Option<Self> {
            let method = attribution.method(node).cloned();
            let candidates = attribution.candidates(node).to_vec();
            if let Some(call) = ast::MethodCallExpr::cast(node.clone()) {
                return Some(Invocation {
                    node: node.clone(),
                    receiver: call.receiver(),
                    name: call.name_ref()?.syntax().text().to_string(),
                    args: call.arg_list().map(|l| l.args().collect()).unwrap_or_default(),
                    method,
                    candidates,
                });
            }
            let call = ast::CallExpr::cast(node.clone())?;
            let ast::Expr::PathExpr(callee) = call.expr()? else { return None };
            let name = path_segments(&callee.path()?).pop()?;
            Some(Invocation {
                node: node.clone(),
                receiver: None,
                name,
                args: call.arg_list().map(|l| l.args().collect()).unwrap_or_default(),
                method,
                candidates,
            })
        }

        pub fn from_expr(expr: &ast::Expr, attribution: &Attribution) -> Option<Self> {
            Self::from_node(expr.syntax(), attribution)
        }

        pub fn node(&self) -> &SyntaxNode {
            &self.node
        }

        pub fn range(&self) -> TextRange {
            self.node.text_range()
        }

        pub fn receiver(&self) -> Option<&ast::Expr> {
            self.receiver.as_ref()
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn args(&self) -> &[ast::Expr] {
            &self.args
        }

        /// Resolved symbol, `None` when attribution could not settle the call
        pub fn method(&self) -> Option<&ResolvedMethod> {
            self.method.as_ref()
        }

        /// Overloads that tied for an unresolved call
        pub fn candidates(&self) -> &[ResolvedMethod] {
            &self.candidates
        }
    }

    /// Every call in `root`, in source order
    pub fn invocations(root: &SyntaxNode, attribution: &Attribution) -> Vec<Invocation> {
        root.descendants()
            .filter(|n| matches!(n.kind(), SyntaxKind::METHOD_CALL_EXPR | SyntaxKind::CALL_EXPR))
            .filter_map(|n| Invocation::from_node(&n, attribution))
            .collect()
    }
}
