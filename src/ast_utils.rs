// Copyright (C) Brian G. Milnes 2025

//! AST helpers shared by the migration passes
//!
//! Small queries over the `ra_ap_syntax` tree: path segments, node lookup
//! by range, line and indentation of an offset, and the comments attached
//! to an argument expression.

pub mod ast_utils {
    use ra_ap_syntax::{ast::{self, AstNode}, Direction, NodeOrToken, SyntaxKind, SyntaxNode, SyntaxToken, TextRange, TextSize};

    /// Segment names of a path, outermost qualifier first
    ///
    /// Generic arguments are dropped: `Vec<Tag>` yields `["Vec"]`.
    pub fn path_segments(path: &ast::Path) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if let Some(name) = p.segment().and_then(|s| s.name_ref()) {
                segments.push(name.syntax().text().to_string());
            }
            current = p.qualifier();
        }
        segments.reverse();
        segments
    }

    /// The qualifier sub-path of `path` that has exactly `len` segments
    pub fn path_prefix(path: &ast::Path, len: usize) -> Option<ast::Path> {
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if path_segments(&p).len() == len {
                return Some(p);
            }
            current = p.qualifier();
        }
        None
    }

    /// Source text with all whitespace removed
    pub fn compact_text(node: &SyntaxNode) -> String {
        node.text().to_string().chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn simple_name(fqn: &str) -> &str {
        fqn.rsplit("::").next().unwrap_or(fqn)
    }

    /// Check if a node is inside another node of a specific kind
    pub fn is_inside_node_kind(node: &SyntaxNode, kind: SyntaxKind) -> bool {
        node.ancestors().skip(1).any(|a| a.kind() == kind)
    }

    /// Find the node of `kind` covering exactly `range`
    pub fn find_node(root: &SyntaxNode, range: TextRange, kind: SyntaxKind) -> Option<SyntaxNode> {
        root.descendants().find(|n| n.kind() == kind && n.text_range() == range)
    }

    /// Line number (1-indexed) of a byte offset
    pub fn line_number(text: &str, offset: TextSize) -> usize {
        let offset: usize = offset.into();
        text[..offset.min(text.len())].matches('\n').count() + 1
    }

    /// Leading whitespace of the line containing `offset`
    pub fn line_indent(text: &str, offset: TextSize) -> String {
        let offset: usize = offset.into();
        let offset = offset.min(text.len());
        let line_start = text[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0);
        text[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    fn is_trivia(kind: SyntaxKind) -> bool {
        matches!(kind, SyntaxKind::WHITESPACE | SyntaxKind::COMMENT)
    }

    fn trivia_run(node: &SyntaxNode, direction: Direction) -> Vec<SyntaxToken> {
        node.siblings_with_tokens(direction)
            .skip(1)
            .map_while(|element| match element {
                NodeOrToken::Token(token) if is_trivia(token.kind()) => Some(token),
                _ => None,
            })
            .collect()
    }

    /// Comments written around an expression inside its argument list
    ///
    /// Returns `(leading, trailing)` in source order. Each run starts or
    /// ends at a comment; whitespace that only separates the expression
    /// from its comma is not part of it. A trailing line comment keeps the
    /// newline that terminates it.
    pub fn attached_trivia(node: &SyntaxNode) -> (Vec<SyntaxToken>, Vec<SyntaxToken>) {
        let mut leading = trivia_run(node, Direction::Prev);
        leading.reverse();
        let first_comment = leading.iter().position(|t| t.kind() == SyntaxKind::COMMENT);
        let leading = match first_comment {
            Some(index) => leading.split_off(index),
            None => Vec::new(),
        };

        let mut trailing = trivia_run(node, Direction::Next);
        let last_comment = trailing.iter().rposition(|t| t.kind() == SyntaxKind::COMMENT);
        match last_comment {
            Some(index) => {
                let keep_newline = trailing[index].text().starts_with("//")
                    && trailing.get(index + 1).is_some_and(|t| t.text().contains('\n'));
                trailing.truncate(if keep_newline { index + 2 } else { index + 1 });
            }
            None => trailing.clear(),
        }

        (leading, trailing)
    }
}
