// Copyright (C) Brian G. Milnes 2025

//! Signature matching
//!
//! A `SignaturePattern` is written the way it reads in a recipe:
//!
//! ```text
//! micrometer::core::instrument::Timer record*(..)
//! micrometer::core::instrument::TimerBuilder tag(String, String)
//! micrometer::core::instrument::TimerBuilder tags(String...)
//! micrometer::core::instrument::Meter+ record(..)
//! ```
//!
//! A trailing `*` on the name matches every name with that prefix. `..`
//! accepts any parameter list, `T...` a variadic tail of `T`. A `+` after
//! the owner also accepts methods declared on subtypes of the owner.

pub mod matcher {
    use std::fmt;
    use std::str::FromStr;
    use serde::{Deserialize, Serialize};
    use crate::invocation::invocation::Invocation;
    use crate::symbols::symbols::ResolvedMethod;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum PatternError {
        #[error("signature pattern `{0}` has no method name")]
        MissingName(String),

        #[error("signature pattern `{0}` has no parameter list")]
        MissingParameters(String),

        #[error("signature pattern `{0}` may only end its name with `*`")]
        MisplacedWildcard(String),

        #[error("signature pattern `{0}` has a variadic parameter before the last position")]
        MisplacedVarargs(String),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NamePattern {
        Exact(String),
        Prefix(String),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ArityPattern {
        Any,
        Exact(Vec<String>),
        Varargs { leading: Vec<String>, element: String },
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(try_from = "String", into = "String")]
    pub struct SignaturePattern {
        pub owner: String,
        pub match_subtypes: bool,
        pub name: NamePattern,
        pub arity: ArityPattern,
    }

    impl SignaturePattern {
        /// True when the invocation's resolved symbol fits the pattern
        ///
        /// An unresolved invocation never matches.
        pub fn matches(&self, invocation: &Invocation) -> bool {
            invocation.method().is_some_and(|m| self.matches_method(m))
        }

        /// True when the invocation fits the pattern or, for a call left
        /// unresolved by an overload tie, when any tied overload does
        pub fn may_match(&self, invocation: &Invocation) -> bool {
            self.matches(invocation) || invocation.candidates().iter().any(|m| self.matches_method(m))
        }

        pub fn matches_method(&self, method: &ResolvedMethod) -> bool {
            self.matches_owner(method) && self.matches_name(&method.name) && self.matches_arity(method)
        }

        fn matches_owner(&self, method: &ResolvedMethod) -> bool {
            method.declaring_type == self.owner
                || (self.match_subtypes && method.declaring_supertypes.iter().any(|s| *s == self.owner))
        }

        fn matches_name(&self, name: &str) -> bool {
            match &self.name {
                NamePattern::Exact(exact) => name == exact,
                NamePattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
            }
        }

        fn matches_arity(&self, method: &ResolvedMethod) -> bool {
            match &self.arity {
                ArityPattern::Any => true,
                ArityPattern::Exact(params) => !method.variadic && method.params == *params,
                ArityPattern::Varargs { leading, element } => {
                    method.variadic
                        && method.params.len() == leading.len() + 1
                        && method.params[..leading.len()] == leading[..]
                        && method.params.last() == Some(element)
                }
            }
        }
    }

    impl FromStr for SignaturePattern {
        type Err = PatternError;

        fn from_str(text: &str) -> Result<Self, Self::Err> {
            let text = text.trim();
            let (owner, rest) = text
                .split_once(char::is_whitespace)
                .ok_or_else(|| PatternError::MissingName(text.to_string()))?;
            let rest = rest.trim();

            let open = rest
                .find('(')
                .ok_or_else(|| PatternError::MissingParameters(text.to_string()))?;
            if !rest.ends_with(')') {
                return Err(PatternError::MissingParameters(text.to_string()));
            }
            let raw_name = rest[..open].trim();
            let raw_params = rest[open + 1..rest.len() - 1].trim();

            if raw_name.is_empty() {
                return Err(PatternError::MissingName(text.to_string()));
            }
            let name = match raw_name.find('*') {
                None => NamePattern::Exact(raw_name.to_string()),
                Some(pos) if pos == raw_name.len() - 1 => NamePattern::Prefix(raw_name[..pos].to_string()),
                Some(_) => return Err(PatternError::MisplacedWildcard(text.to_string())),
            };

            let arity = if raw_params == ".." {
                ArityPattern::Any
            } else if raw_params.is_empty() {
                ArityPattern::Exact(Vec::new())
            } else {
                let mut params: Vec<String> = raw_params.split(',').map(|p| p.trim().to_string()).collect();
                let variadic_at = params.iter().position(|p| p.ends_with("..."));
                match variadic_at {
                    None => ArityPattern::Exact(params),
                    Some(pos) if pos == params.len() - 1 => {
                        let last = params.pop().unwrap_or_default();
                        ArityPattern::Varargs {
                            leading: params,
                            element: last.trim_end_matches("...").trim().to_string(),
                        }
                    }
                    Some(_) => return Err(PatternError::MisplacedVarargs(text.to_string())),
                }
            };

            let (owner, match_subtypes) = match owner.strip_suffix('+') {
                Some(owner) => (owner.to_string(), true),
                None => (owner.to_string(), false),
            };

            Ok(SignaturePattern { owner, match_subtypes, name, arity })
        }
    }

    impl TryFrom<String> for SignaturePattern {
        type Error = PatternError;

        fn try_from(value: String) -> Result<Self, Self::Error> {
            value.parse()
        }
    }

    impl From<SignaturePattern> for String {
        fn from(pattern: SignaturePattern) -> Self {
            pattern.to_string()
        }
    }

    impl fmt::Display for SignaturePattern {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}{} ", self.owner, if self.match_subtypes { "+" } else { "" })?;
            match &self.name {
                NamePattern::Exact(name) => write!(f, "{name}(")?,
                NamePattern::Prefix(prefix) => write!(f, "{prefix}*(")?,
            }
            match &self.arity {
                ArityPattern::Any => write!(f, "..")?,
                ArityPattern::Exact(params) => write!(f, "{}", params.join(", "))?,
                ArityPattern::Varargs { leading, element } => {
                    for param in leading {
                        write!(f, "{param}, ")?;
                    }
                    write!(f, "{element}...")?;
                }
            }
            write!(f, ")")
        }
    }
}
