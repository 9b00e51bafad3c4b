//! Error types for the Strata inference engine.

use thiserror::Error;

/// A specialized `Result` type for inference operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building a rule set or running
/// inference. All of them are fatal to the current call; nothing is retried
/// and no partial result is published.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The rule set recurses through negation and has no valid evaluation
    /// order. Detected at rule-set construction; inference refuses to run.
    #[error("rule set is not stratifiable: recursion through negation involving relation '{relation}'")]
    Unstratifiable { relation: String },

    /// A relation was used with a layout incompatible with its schema.
    #[error(transparent)]
    Shape(#[from] strata_facts::Error),

    /// An atom required a field-access mode the matched relation's facts do
    /// not support. This is a usage error, not an ordinary non-match.
    #[error("atom over relation '{relation}' requires {required} field access, but its facts only support {actual} access")]
    AccessMismatch {
        relation: String,
        required: &'static str,
        actual: &'static str,
    },

    /// A head variable does not appear in any positive body atom.
    #[error("rule '{rule}': head variable '{variable}' is not bound by any positive body atom")]
    UnboundHeadVariable { rule: String, variable: String },

    /// A constraint references a variable no positive body atom binds.
    #[error("rule '{rule}': constraint variable '{variable}' is not bound by any positive body atom")]
    UnboundConstraintVariable { rule: String, variable: String },

    /// A negated atom uses a variable no positive body atom binds.
    #[error("rule '{rule}': negated atom variable '{variable}' is not bound by any positive body atom")]
    UnboundNegationVariable { rule: String, variable: String },

    /// A built-in predicate's collection argument is not bound by an
    /// earlier positive body atom.
    #[error("rule '{rule}': built-in collection argument '{variable}' must be bound by an earlier body atom")]
    UnboundCollection { rule: String, variable: String },

    /// A built-in virtual predicate was used with the wrong arity or layout.
    #[error("built-in predicate '{relation}' expects {expected} ordered arguments, found {found}")]
    MalformedBuiltin {
        relation: String,
        expected: usize,
        found: usize,
    },

    /// A built-in virtual predicate appeared where stored facts are
    /// expected (a rule head or a negated atom).
    #[error("rule '{rule}': built-in predicate '{relation}' cannot be derived or negated")]
    ReservedRelation { rule: String, relation: String },

    /// An aggregate term appeared outside a rule head.
    #[error("rule '{rule}': aggregate terms are only allowed in the rule head")]
    MisplacedAggregate { rule: String },

    /// A rule head carries more than one aggregate term.
    #[error("rule '{rule}': at most one aggregate term is allowed per head")]
    MultipleAggregates { rule: String },

    /// An aggregate specifier is structurally wrong for its function.
    #[error("rule '{rule}': malformed aggregate: {detail}")]
    MalformedAggregate { rule: String, detail: String },

    /// A constraint term is neither a constant nor a variable.
    #[error("rule '{rule}': constraint '{constraint}' must compare against a constant or a bound variable")]
    MalformedConstraint { rule: String, constraint: String },

    /// An axiom contains a non-constant term.
    #[error("axiom '{atom}' must be ground (constants only)")]
    NonGroundAxiom { atom: String },

    /// The optional iteration safety valve fired. This is an external
    /// latency bound, not part of the core contract.
    #[error("inference exceeded the configured pass limit of {passes}")]
    MaxPassesExceeded { passes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Unstratifiable {
            relation: "Q".to_string(),
        };
        assert!(err.to_string().contains("not stratifiable"));
        assert!(err.to_string().contains("'Q'"));
    }

    #[test]
    fn test_unbound_variable_display() {
        let err = Error::UnboundHeadVariable {
            rule: "Ancestor(x, y)".to_string(),
            variable: "y".to_string(),
        };
        assert!(err.to_string().contains("Ancestor(x, y)"));
        assert!(err.to_string().contains("'y'"));
    }
}
