//! Error types for the fact model and store.

use crate::Shape;
use thiserror::Error;

/// A specialized `Result` type for fact and schema operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while validating facts against a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A relation was used with a layout or arity incompatible with the
    /// shape established by its first use. The schema is left unchanged
    /// when this is raised.
    #[error("shape mismatch for relation '{relation}': expected {expected}, found {found}")]
    ShapeMismatch {
        relation: String,
        expected: Shape,
        found: Shape,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ShapeMismatch {
            relation: "Parent".to_string(),
            expected: Shape::List { arity: 2 },
            found: Shape::Map,
        };
        let msg = err.to_string();
        assert!(msg.contains("Parent"));
        assert!(msg.contains("list/2"));
        assert!(msg.contains("map"));
    }
}
