// Copyright (C) Brian G. Milnes 2025

//! Symbol tables for type attribution
//!
//! A symbol table is the configured set of types a migration can see: each
//! type's supertypes and its method overloads. Tables are plain data loaded
//! from JSON, so a migration can be pointed at a different API surface
//! without recompiling.

pub mod symbols {
    use std::collections::{BTreeMap, BTreeSet, VecDeque};
    use std::path::Path;
    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};
    use crate::type_rewriter::type_rewriter::TypeRename;

    const BUILTIN_MICROMETER: &str = include_str!("../data/micrometer_symbols.json");

    /// Parameter type that accepts any argument
    pub const ANY_TYPE: &str = "any";

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SymbolTable {
        #[serde(default)]
        pub types: BTreeMap<String, TypeSymbol>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TypeSymbol {
        #[serde(default)]
        pub supertypes: Vec<String>,
        #[serde(default)]
        pub methods: Vec<MethodSymbol>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MethodSymbol {
        pub name: String,
        #[serde(default)]
        pub params: Vec<String>,
        /// The last parameter repeats
        #[serde(default)]
        pub variadic: bool,
        #[serde(default = "unit_type")]
        pub returns: String,
        #[serde(default, rename = "static")]
        pub is_static: bool,
    }

    fn unit_type() -> String {
        "()".to_string()
    }

    /// A method symbol as seen from one call site
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct ResolvedMethod {
        pub declaring_type: String,
        /// Transitive supertypes of `declaring_type`, nearest first
        pub declaring_supertypes: Vec<String>,
        pub name: String,
        pub params: Vec<String>,
        pub variadic: bool,
        pub returns: String,
    }

    impl ResolvedMethod {
        /// Declared parameter type for the argument at `index`
        pub fn param_for(&self, index: usize) -> Option<&str> {
            if self.variadic && index + 1 >= self.params.len() {
                return self.params.last().map(String::as_str);
            }
            self.params.get(index).map(String::as_str)
        }

        pub fn accepts_arity(&self, count: usize) -> bool {
            if self.variadic {
                count + 1 >= self.params.len()
            } else {
                count == self.params.len()
            }
        }
    }

    impl SymbolTable {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn from_json(json: &str) -> Result<Self> {
            serde_json::from_str(json).context("Invalid symbol table JSON")
        }

        pub fn load(path: &Path) -> Result<Self> {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read symbol table: {}", path.display()))?;
            Self::from_json(&json)
                .with_context(|| format!("Failed to load symbol table: {}", path.display()))
        }

        /// Built-in table covering the Micrometer, Misk and std types the
        /// bundled recipes refer to
        pub fn micrometer() -> Result<Self> {
            Self::from_json(BUILTIN_MICROMETER)
        }

        /// Add a type, replacing any previous definition
        pub fn with_type(mut self, fqn: &str, symbol: TypeSymbol) -> Self {
            self.types.insert(fqn.to_string(), symbol);
            self
        }

        /// Union of two tables
        ///
        /// Overloads of `other` whose name, parameters and staticness match an
        /// overload already in `self` are dropped; `self` wins.
        pub fn merge(mut self, other: SymbolTable) -> Self {
            for (fqn, symbol) in other.types {
                let entry = self.types.entry(fqn).or_default();
                for sup in symbol.supertypes {
                    if !entry.supertypes.contains(&sup) {
                        entry.supertypes.push(sup);
                    }
                }
                for method in symbol.methods {
                    let duplicate = entry.methods.iter().any(|m| {
                        m.name == method.name
                            && m.params == method.params
                            && m.variadic == method.variadic
                            && m.is_static == method.is_static
                    });
                    if !duplicate {
                        entry.methods.push(method);
                    }
                }
            }
            self
        }

        pub fn contains(&self, fqn: &str) -> bool {
            self.types.contains_key(fqn)
        }

        pub fn get(&self, fqn: &str) -> Option<&TypeSymbol> {
            self.types.get(fqn)
        }

        /// Transitive supertypes, nearest first, without duplicates
        pub fn supertypes(&self, fqn: &str) -> Vec<String> {
            let mut seen = BTreeSet::new();
            let mut result = Vec::new();
            let mut queue: VecDeque<String> = self
                .get(fqn)
                .map(|t| t.supertypes.iter().cloned().collect())
                .unwrap_or_default();

            while let Some(next) = queue.pop_front() {
                if next == fqn || !seen.insert(next.clone()) {
                    continue;
                }
                if let Some(symbol) = self.get(&next) {
                    queue.extend(symbol.supertypes.iter().cloned());
                }
                result.push(next);
            }
            result
        }

        pub fn is_assignable(&self, from: &str, to: &str) -> bool {
            to == ANY_TYPE || from == to || self.supertypes(from).iter().any(|s| s == to)
        }

        pub fn has_method(&self, fqn: &str, name: &str) -> bool {
            std::iter::once(fqn.to_string())
                .chain(self.supertypes(fqn))
                .filter_map(|t| self.get(&t))
                .any(|t| t.methods.iter().any(|m| m.name == name))
        }

        /// Every overload named `name` visible on `fqn`, own methods before inherited ones
        pub fn lookup(&self, fqn: &str, name: &str, want_static: bool) -> Vec<ResolvedMethod> {
            let mut found = Vec::new();
            for owner in std::iter::once(fqn.to_string()).chain(self.supertypes(fqn)) {
                let Some(symbol) = self.get(&owner) else { continue };
                let owner_supertypes = self.supertypes(&owner);
                for method in symbol.methods.iter().filter(|m| m.name == name && m.is_static == want_static) {
                    found.push(ResolvedMethod {
                        declaring_type: owner.clone(),
                        declaring_supertypes: owner_supertypes.clone(),
                        name: method.name.clone(),
                        params: method.params.clone(),
                        variadic: method.variadic,
                        returns: method.returns.clone(),
                    });
                }
            }
            found
        }

        /// Pick the overload of `owner::name` that fits the argument types
        ///
        /// `None` in `arg_types` is an argument whose type is unknown; it fits
        /// any parameter but scores lower than an exact match. Ties between
        /// equally good overloads leave the call unresolved.
        pub fn resolve_call(
            &self,
            owner: &str,
            name: &str,
            is_static: bool,
            arg_types: &[Option<String>],
        ) -> Option<ResolvedMethod> {
            let mut best = self.candidates(owner, name, is_static, arg_types);
            if best.len() == 1 {
                best.pop()
            } else {
                None
            }
        }

        /// Every overload sharing the best fit for the argument types
        ///
        /// One entry is a resolved call, several are a tie, none is no fit.
        pub fn candidates(
            &self,
            owner: &str,
            name: &str,
            is_static: bool,
            arg_types: &[Option<String>],
        ) -> Vec<ResolvedMethod> {
            let mut best_score = 0;
            let mut best: Vec<ResolvedMethod> = Vec::new();

            for candidate in self.lookup(owner, name, is_static) {
                let Some(score) = self.fit(&candidate, arg_types) else { continue };
                if best.is_empty() || score > best_score {
                    best_score = score;
                    best = vec![candidate];
                } else if score == best_score {
                    best.push(candidate);
                }
            }
            best
        }

        fn fit(&self, method: &ResolvedMethod, arg_types: &[Option<String>]) -> Option<usize> {
            if !method.accepts_arity(arg_types.len()) {
                return None;
            }
            let mut score = 0;
            for (index, arg) in arg_types.iter().enumerate() {
                let param = method.param_for(index)?;
                match arg {
                    None => {}
                    Some(ty) if ty == param => score += 2,
                    Some(ty) if self.is_assignable(ty, param) => score += 1,
                    Some(_) => return None,
                }
            }
            Some(score)
        }

        /// View of this table with every type reference renamed
        ///
        /// Type entries keep their own names; only the types mentioned in
        /// signatures and supertype lists change.
        pub fn renamed(&self, renames: &[TypeRename]) -> SymbolTable {
            let rename = |ty: &String| -> String {
                renames
                    .iter()
                    .find(|r| &r.from == ty)
                    .map(|r| r.to.clone())
                    .unwrap_or_else(|| ty.clone())
            };

            let types = self
                .types
                .iter()
                .map(|(fqn, symbol)| {
                    let symbol = TypeSymbol {
                        supertypes: symbol.supertypes.iter().map(rename).collect(),
                        methods: symbol
                            .methods
                            .iter()
                            .map(|m| MethodSymbol {
                                params: m.params.iter().map(rename).collect(),
                                returns: rename(&m.returns),
                                ..m.clone()
                            })
                            .collect(),
                    };
                    (fqn.clone(), symbol)
                })
                .collect();

            SymbolTable { types }
        }
    }
}
