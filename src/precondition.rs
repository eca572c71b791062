// Copyright (C) Brian G. Milnes 2025

//! Preconditions
//!
//! A precondition is a boolean tree over what a whole unit uses. It gates a
//! migration before any rewriting is attempted: a unit that fails it is
//! returned untouched.

pub mod precondition {
    use serde::{Deserialize, Serialize};
    use crate::attribution::attribution::Attribution;
    use crate::invocation::invocation::invocations;
    use crate::matcher::matcher::SignaturePattern;
    use crate::unit::unit::SourceUnit;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Precondition {
        Always,
        /// Some call in the unit matches the pattern
        ///
        /// A call whose overload is ambiguous counts as using every tied
        /// overload, so `Not(Uses(..))` excludes it.
        Uses(SignaturePattern),
        /// The unit refers to the type by import or through a resolved call
        UsesType(String),
        And(Vec<Precondition>),
        Or(Vec<Precondition>),
        Not(Box<Precondition>),
    }

    impl Precondition {
        pub fn uses(pattern: SignaturePattern) -> Self {
            Precondition::Uses(pattern)
        }

        pub fn uses_type(fqn: &str) -> Self {
            Precondition::UsesType(fqn.to_string())
        }

        pub fn and(terms: impl IntoIterator<Item = Precondition>) -> Self {
            Precondition::And(terms.into_iter().collect())
        }

        pub fn or(terms: impl IntoIterator<Item = Precondition>) -> Self {
            Precondition::Or(terms.into_iter().collect())
        }

        #[allow(clippy::should_implement_trait)]
        pub fn not(term: Precondition) -> Self {
            Precondition::Not(Box::new(term))
        }

        /// Evaluate against a unit and its attribution, short-circuiting
        pub fn evaluate(&self, unit: &SourceUnit, attribution: &Attribution) -> bool {
            match self {
                Precondition::Always => true,
                Precondition::Uses(pattern) => invocations(unit.syntax(), attribution)
                    .iter()
                    .any(|inv| pattern.may_match(inv)),
                Precondition::UsesType(fqn) => attribution.uses_type(fqn),
                Precondition::And(terms) => terms.iter().all(|t| t.evaluate(unit, attribution)),
                Precondition::Or(terms) => terms.iter().any(|t| t.evaluate(unit, attribution)),
                Precondition::Not(term) => !term.evaluate(unit, attribution),
            }
        }
    }

    /// Free-function form of [`Precondition::evaluate`]
    pub fn evaluate(unit: &SourceUnit, attribution: &Attribution, predicate: &Precondition) -> bool {
        predicate.evaluate(unit, attribution)
    }
}
