//! Terms, the slots of an atom.
//!
//! A term is either a constant value, a named variable, a wildcard that
//! matches anything without binding, or (in rule heads only) an aggregate
//! over body variables.

use crate::aggregate::AggregateSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_facts::Value;

/// One slot of an atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A ground value; matches only an equal fact field.
    Constant(Value),

    /// A named variable, bound on first match and checked thereafter.
    Variable(String),

    /// Matches any fact field without binding anything. The name is kept
    /// for display only; two wildcards never constrain each other.
    Wildcard(String),

    /// An aggregate over body variables. Valid only in rule heads.
    Aggregate(AggregateSpec),
}

impl Term {
    /// A constant term from anything convertible into a [`Value`].
    pub fn val(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// A symbol constant term.
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Constant(Value::symbol(name))
    }

    /// A variable term.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// An anonymous wildcard term.
    pub fn wildcard() -> Self {
        Self::Wildcard("_".to_string())
    }

    /// A named wildcard term, for readability in wide atoms.
    pub fn wildcard_named(name: impl Into<String>) -> Self {
        Self::Wildcard(name.into())
    }

    /// An aggregate term.
    pub fn aggregate(spec: AggregateSpec) -> Self {
        Self::Aggregate(spec)
    }

    /// Whether this term carries no variables at all.
    pub fn is_ground(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// The variable name, if this is a [`Term::Variable`].
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// The aggregate spec, if this is a [`Term::Aggregate`].
    pub fn as_aggregate(&self) -> Option<&AggregateSpec> {
        match self {
            Self::Aggregate(spec) => Some(spec),
            _ => None,
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{}", value),
            Self::Variable(name) => write!(f, "{}", name),
            Self::Wildcard(name) if name == "_" => write!(f, "_"),
            Self::Wildcard(name) => write!(f, "_{}", name),
            Self::Aggregate(spec) => write!(f, "{}", spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Term::sym("pen").to_string(), "#pen");
        assert_eq!(Term::var("x").to_string(), "x");
        assert_eq!(Term::wildcard().to_string(), "_");
        assert_eq!(Term::wildcard_named("rest").to_string(), "_rest");
        assert_eq!(
            Term::aggregate(AggregateSpec::sum("x")).to_string(),
            "sum(x)"
        );
    }

    #[test]
    fn test_groundness() {
        assert!(Term::val(1).is_ground());
        assert!(!Term::var("x").is_ground());
        assert!(!Term::wildcard().is_ground());
    }
}
