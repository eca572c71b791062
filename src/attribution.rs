// Copyright (C) Brian G. Milnes 2025

//! Type attribution
//!
//! Resolves every call in a unit to a `ResolvedMethod` from the configured
//! symbol table. This is deliberately shallow: names are resolved through
//! `use` items, variables through the declared types of fields, parameters
//! and `let` bindings (or the type of their initializer), and overloads by
//! arity and argument types. Anything it cannot settle stays unresolved,
//! and unresolved calls never match a signature pattern.

pub mod attribution {
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
    use ra_ap_syntax::{ast::{self, AstNode, HasArgList, HasGenericArgs, HasName, HasTypeBounds}, SyntaxKind, SyntaxNode, TextRange};
    use crate::ast_utils::ast_utils::{is_inside_node_kind, path_segments};
    use crate::imports::imports::collect_imports;
    use crate::symbols::symbols::{ResolvedMethod, SymbolTable, ANY_TYPE};
    use crate::unit::unit::SourceUnit;

    /// Type given to closures, `impl Fn*`, `dyn Fn*`, `Fn*`-bounded generics,
    /// fn items and method references
    pub const FN_TYPE: &str = "fn";

    /// Owning pointers looked through when typing `Box<dyn Fn()>`
    const FN_WRAPPERS: [&str; 3] = ["Box", "Rc", "Arc"];

    /// Resolved calls of one tree, keyed by the call node's range
    #[derive(Debug, Clone, Default)]
    pub struct Attribution {
        calls: HashMap<TextRange, ResolvedMethod>,
        ambiguous: HashMap<TextRange, Vec<ResolvedMethod>>,
        imports: BTreeMap<String, String>,
        declared_types: BTreeSet<String>,
    }

    impl Attribution {
        pub fn method(&self, node: &SyntaxNode) -> Option<&ResolvedMethod> {
            if !matches!(node.kind(), SyntaxKind::METHOD_CALL_EXPR | SyntaxKind::CALL_EXPR) {
                return None;
            }
            self.calls.get(&node.text_range())
        }

        /// Equally good overloads of a call left unresolved by a tie
        pub fn candidates(&self, node: &SyntaxNode) -> &[ResolvedMethod] {
            if !matches!(node.kind(), SyntaxKind::METHOD_CALL_EXPR | SyntaxKind::CALL_EXPR) {
                return &[];
            }
            self.ambiguous.get(&node.text_range()).map(Vec::as_slice).unwrap_or_default()
        }

        pub fn resolved_count(&self) -> usize {
            self.calls.len()
        }

        /// Binding name to fully qualified path
        pub fn imports(&self) -> &BTreeMap<String, String> {
            &self.imports
        }

        /// Types written on fields, parameters and `let` bindings
        pub fn declared_types(&self) -> &BTreeSet<String> {
            &self.declared_types
        }

        /// Whether the unit mentions `fqn` through an import, a declaration or a resolved call
        pub fn uses_type(&self, fqn: &str) -> bool {
            self.imports.values().any(|i| i == fqn)
                || self.declared_types.contains(fqn)
                || self.calls.values().any(|m| {
                    m.declaring_type == fqn || m.returns == fqn || m.params.iter().any(|p| p == fqn)
                })
        }
    }

    /// Attribute every call in a unit
    pub fn attribute(unit: &SourceUnit, symbols: &SymbolTable) -> Attribution {
        let root = unit.syntax();
        let imports = collect_imports(root);
        let mut attributor = Attributor::new(symbols, imports);
        attributor.declare_callables(root);
        attributor.declare_scope(root);
        attributor.attribute_calls(root)
    }

    /// Attribute a detached expression with explicitly typed free variables
    ///
    /// `bindings` maps a variable name to its type; `None` means the type is
    /// unknown and fits any parameter.
    pub fn attribute_expr(
        expr: &ast::Expr,
        symbols: &SymbolTable,
        imports: BTreeMap<String, String>,
        bindings: &[(String, Option<String>)],
    ) -> Attribution {
        let mut attributor = Attributor::new(symbols, imports);
        for (name, ty) in bindings {
            let ty = ty.as_deref().map(|t| attributor.resolve_type_name(t));
            attributor.locals.insert(name.clone(), Binding::Declared(ty));
        }
        attributor.attribute_calls(expr.syntax())
    }

    /// Canonical name of a primitive type, if `name` is one
    pub fn canonical_primitive(name: &str) -> Option<&'static str> {
        match name {
            "str" | "String" => Some("String"),
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => {
                Some("i64")
            }
            "f32" | "f64" => Some("f64"),
            "bool" => Some("bool"),
            _ => None,
        }
    }

    #[derive(Debug, Clone)]
    enum Binding {
        Declared(Option<String>),
        Inferred(ast::Expr),
    }

    struct Attributor<'a> {
        symbols: &'a SymbolTable,
        imports: BTreeMap<String, String>,
        fields: HashMap<String, String>,
        locals: HashMap<String, Binding>,
        calls: HashMap<TextRange, Option<ResolvedMethod>>,
        ambiguous: HashMap<TextRange, Vec<ResolvedMethod>>,
        in_progress: HashSet<TextRange>,
        declared_types: BTreeSet<String>,
        /// Generic parameters bounded by `Fn`, `FnMut` or `FnOnce`
        fn_generics: HashSet<String>,
        /// Free `fn` items
        fn_items: HashSet<String>,
    }

    impl<'a> Attributor<'a> {
        fn new(symbols: &'a SymbolTable, imports: BTreeMap<String, String>) -> Self {
            Attributor {
                symbols,
                imports,
                fields: HashMap::new(),
                locals: HashMap::new(),
                calls: HashMap::new(),
                ambiguous: HashMap::new(),
                in_progress: HashSet::new(),
                declared_types: BTreeSet::new(),
                fn_generics: HashSet::new(),
                fn_items: HashSet::new(),
            }
        }

        /// Record the names that denote callables before any binding is typed
        fn declare_callables(&mut self, root: &SyntaxNode) {
            for node in root.descendants() {
                if let Some(param) = ast::TypeParam::cast(node.clone()) {
                    if let Some(name) = param.name() {
                        if param.type_bound_list().is_some_and(|b| has_fn_bound(&b)) {
                            self.fn_generics.insert(name.syntax().text().to_string());
                        }
                    }
                } else if let Some(pred) = ast::WherePred::cast(node.clone()) {
                    let bounded = pred.type_bound_list().is_some_and(|b| has_fn_bound(&b));
                    if let (true, Some(ast::Type::PathType(ty))) = (bounded, pred.ty()) {
                        if let Some(path) = ty.path() {
                            if let [single] = path_segments(&path).as_slice() {
                                self.fn_generics.insert(single.clone());
                            }
                        }
                    }
                } else if let Some(item) = ast::Fn::cast(node.clone()) {
                    let in_impl = is_inside_node_kind(&node, SyntaxKind::IMPL) || is_inside_node_kind(&node, SyntaxKind::TRAIT);
                    if let (false, Some(name)) = (in_impl, item.name()) {
                        self.fn_items.insert(name.syntax().text().to_string());
                    }
                }
            }
        }

        fn declare_scope(&mut self, root: &SyntaxNode) {
            for node in root.descendants() {
                if let Some(field) = ast::RecordField::cast(node.clone()) {
                    if let (Some(name), Some(ty)) = (field.name(), field.ty()) {
                        let ty = self.type_of_type(&ty);
                        self.declared_types.insert(ty.clone());
                        self.fields.insert(name.syntax().text().to_string(), ty);
                    }
                } else if let Some(param) = ast::Param::cast(node.clone()) {
                    if let (Some(name), Some(ty)) = (ident_name(param.pat()), param.ty()) {
                        let ty = self.type_of_type(&ty);
                        self.declared_types.insert(ty.clone());
                        self.locals.insert(name, Binding::Declared(Some(ty)));
                    }
                } else if let Some(stmt) = ast::LetStmt::cast(node.clone()) {
                    let Some(name) = ident_name(stmt.pat()) else { continue };
                    if let Some(ty) = stmt.ty() {
                        let ty = self.type_of_type(&ty);
                        self.declared_types.insert(ty.clone());
                        self.locals.insert(name, Binding::Declared(Some(ty)));
                    } else if let Some(init) = stmt.initializer() {
                        self.locals.insert(name, Binding::Inferred(init));
                    }
                }
            }
        }

        fn attribute_calls(mut self, root: &SyntaxNode) -> Attribution {
            for node in root.descendants() {
                if matches!(node.kind(), SyntaxKind::METHOD_CALL_EXPR | SyntaxKind::CALL_EXPR) {
                    self.resolve(&node);
                }
            }
            let calls = self
                .calls
                .into_iter()
                .filter_map(|(range, method)| method.map(|m| (range, m)))
                .collect();
            Attribution { calls, ambiguous: self.ambiguous, imports: self.imports, declared_types: self.declared_types }
        }

        fn resolve(&mut self, node: &SyntaxNode) -> Option<ResolvedMethod> {
            let range = node.text_range();
            if let Some(done) = self.calls.get(&range) {
                return done.clone();
            }
            if !self.in_progress.insert(range) {
                return None;
            }
            let mut candidates = if let Some(call) = ast::MethodCallExpr::cast(node.clone()) {
                self.method_call_candidates(&call)
            } else if let Some(call) = ast::CallExpr::cast(node.clone()) {
                self.path_call_candidates(&call)
            } else {
                Vec::new()
            };
            let resolved = match candidates.len() {
                1 => candidates.pop(),
                0 => None,
                _ => {
                    self.ambiguous.insert(range, candidates);
                    None
                }
            };
            self.in_progress.remove(&range);
            self.calls.insert(range, resolved.clone());
            resolved
        }

        fn method_call_candidates(&mut self, call: &ast::MethodCallExpr) -> Vec<ResolvedMethod> {
            let Some(owner) = call.receiver().and_then(|r| self.type_of(&r)) else { return Vec::new() };
            let Some(name) = call.name_ref().map(|n| n.syntax().text().to_string()) else { return Vec::new() };
            let arg_types = self.arg_types(call.arg_list());
            self.symbols.candidates(&owner, &name, false, &arg_types)
        }

        fn path_call_candidates(&mut self, call: &ast::CallExpr) -> Vec<ResolvedMethod> {
            let Some(ast::Expr::PathExpr(callee)) = call.expr() else { return Vec::new() };
            let segments = callee.path().map(|p| path_segments(&p)).unwrap_or_default();
            let Some((name, qualifier)) = segments.split_last() else { return Vec::new() };
            if qualifier.is_empty() {
                return Vec::new();
            }
            let owner = self.resolve_type_segments(qualifier);
            let arg_types = self.arg_types(call.arg_list());
            self.symbols.candidates(&owner, name, true, &arg_types)
        }

        fn arg_types(&mut self, args: Option<ast::ArgList>) -> Vec<Option<String>> {
            args.map(|list| list.args().map(|arg| self.type_of(&arg)).collect())
                .unwrap_or_default()
        }

        /// Type of an expression, `None` when unknown
        fn type_of(&mut self, expr: &ast::Expr) -> Option<String> {
            let ty = match expr {
                ast::Expr::Literal(lit) => literal_type(lit),
                ast::Expr::ClosureExpr(_) => Some(FN_TYPE.to_string()),
                ast::Expr::ParenExpr(inner) => self.type_of(&inner.expr()?),
                ast::Expr::RefExpr(inner) => self.type_of(&inner.expr()?),
                ast::Expr::FieldExpr(field) => {
                    let name = field.name_ref()?.syntax().text().to_string();
                    self.fields.get(&name).cloned()
                }
                ast::Expr::PathExpr(path) => self.type_of_path(&path.path()?),
                ast::Expr::MethodCallExpr(_) | ast::Expr::CallExpr(_) => {
                    self.resolve(expr.syntax()).map(|m| m.returns)
                }
                ast::Expr::ArrayExpr(_) => Some("Vec".to_string()),
                ast::Expr::MacroExpr(mac) => {
                    let path = mac.macro_call()?.path()?;
                    (path_segments(&path).last()? == "vec").then(|| "Vec".to_string())
                }
                _ => None,
            };
            ty.filter(|t| t != ANY_TYPE)
        }

        fn type_of_path(&mut self, path: &ast::Path) -> Option<String> {
            let segments = path_segments(path);
            match segments.as_slice() {
                [] => None,
                [single] => match self.locals.get(single).cloned() {
                    Some(Binding::Declared(ty)) => ty,
                    Some(Binding::Inferred(init)) => {
                        self.locals.insert(single.clone(), Binding::Declared(None));
                        let ty = self.type_of(&init);
                        self.locals.insert(single.clone(), Binding::Declared(ty.clone()));
                        ty
                    }
                    None if self.fn_items.contains(single) => Some(FN_TYPE.to_string()),
                    None => None,
                },
                [qualifier @ .., last] => {
                    let owner = self.resolve_type_segments(qualifier);
                    if self.symbols.has_method(&owner, last) {
                        Some(FN_TYPE.to_string())
                    } else {
                        Some(owner)
                    }
                }
            }
        }

        fn type_of_type(&self, ty: &ast::Type) -> String {
            match ty {
                ast::Type::RefType(inner) => inner
                    .ty()
                    .map(|t| self.type_of_type(&t))
                    .unwrap_or_else(|| ty.syntax().text().to_string()),
                ast::Type::PathType(path_type) => match path_type.path() {
                    Some(path) => self.type_of_path_type(&path),
                    None => ty.syntax().text().to_string(),
                },
                ast::Type::FnPtrType(_) => FN_TYPE.to_string(),
                ast::Type::ImplTraitType(_) | ast::Type::DynTraitType(_) => {
                    let text = ty.syntax().text().to_string();
                    if text.contains("Fn") {
                        FN_TYPE.to_string()
                    } else {
                        text
                    }
                }
                _ => ty.syntax().text().to_string(),
            }
        }

        fn type_of_path_type(&self, path: &ast::Path) -> String {
            let segments = path_segments(path);
            if let [single] = segments.as_slice() {
                if self.fn_generics.contains(single) {
                    return FN_TYPE.to_string();
                }
            }
            let wraps_fn = segments.last().is_some_and(|last| FN_WRAPPERS.contains(&last.as_str()))
                && first_type_arg(path).is_some_and(|inner| self.type_of_type(&inner) == FN_TYPE);
            if wraps_fn {
                return FN_TYPE.to_string();
            }
            self.resolve_type_segments(&segments)
        }

        /// Resolve a written type name (`Timer`, `instrument::Timer`, `&str`) to its canonical form
        fn resolve_type_name(&self, name: &str) -> String {
            let name = name.trim().trim_start_matches('&').trim();
            let segments: Vec<String> = name.split("::").map(|s| s.trim().to_string()).collect();
            self.resolve_type_segments(&segments)
        }

        fn resolve_type_segments(&self, segments: &[String]) -> String {
            let Some((first, rest)) = segments.split_first() else { return String::new() };
            if rest.is_empty() {
                if let Some(primitive) = canonical_primitive(first) {
                    return primitive.to_string();
                }
            }
            let head = self.imports.get(first).cloned().unwrap_or_else(|| first.clone());
            std::iter::once(head)
                .chain(rest.iter().cloned())
                .collect::<Vec<_>>()
                .join("::")
        }
    }

    fn ident_name(pat: Option<ast::Pat>) -> Option<String> {
        match pat? {
            ast::Pat::IdentPat(ident) => Some(ident.name()?.syntax().text().to_string()),
            _ => None,
        }
    }

    fn first_type_arg(path: &ast::Path) -> Option<ast::Type> {
        path.segment()?
            .generic_arg_list()?
            .generic_args()
            .find_map(|arg| match arg {
                ast::GenericArg::TypeArg(type_arg) => type_arg.ty(),
                _ => None,
            })
    }

    /// `Fn(..)`, `FnMut(..)` or `FnOnce(..)` among the bounds
    fn has_fn_bound(bounds: &ast::TypeBoundList) -> bool {
        bounds.bounds().any(|bound| match bound.ty() {
            Some(ast::Type::PathType(ty)) => ty
                .path()
                .and_then(|p| path_segments(&p).pop())
                .is_some_and(|name| matches!(name.as_str(), "Fn" | "FnMut" | "FnOnce")),
            _ => false,
        })
    }

    fn literal_type(lit: &ast::Literal) -> Option<String> {
        let token = lit.syntax().first_token()?;
        let ty = match token.kind() {
            SyntaxKind::STRING => "String",
            SyntaxKind::INT_NUMBER => "i64",
            SyntaxKind::FLOAT_NUMBER => "f64",
            SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => "bool",
            _ => return None,
        };
        Some(ty.to_string())
    }
}
