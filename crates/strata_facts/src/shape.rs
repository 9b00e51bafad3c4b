//! Shapes and the schema that enforces them.
//!
//! A `Shape` is the structural contract for one relation: every fact, axiom
//! and rule head for that relation must use one consistent layout for the
//! lifetime of a rule set. The first use of a relation establishes its shape;
//! later uses are checked against it and incompatible ones are rejected
//! without touching the schema.

use crate::{Error, Fact, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The structural contract for one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Ordered anonymous fields with a fixed arity.
    List { arity: usize },

    /// Named fields; no field order and no fixed field set.
    Map,

    /// Ordered fields with a fixed list of names; both access modes work.
    Pair { fields: Vec<String> },
}

impl Shape {
    /// Whether facts of this shape can be read positionally.
    pub fn ordered_capable(&self) -> bool {
        !matches!(self, Self::Map)
    }

    /// Whether facts of this shape can be read by field name.
    pub fn named_capable(&self) -> bool {
        !matches!(self, Self::List { .. })
    }

    /// The fixed field count, where the shape has one.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::List { arity } => Some(*arity),
            Self::Pair { fields } => Some(fields.len()),
            Self::Map => None,
        }
    }

    /// Whether a fact or head atom of shape `candidate` conforms to an
    /// established shape of `self`.
    ///
    /// Compatibility is capability-based: an ordered layout is accepted by
    /// any ordered-capable shape of the same arity, a named layout by any
    /// named-capable shape. Two `Pair` shapes must agree on field names.
    pub fn accepts(&self, candidate: &Shape) -> bool {
        match (self, candidate) {
            (Self::List { arity }, other) => {
                other.ordered_capable() && other.arity() == Some(*arity)
            }
            (Self::Map, other) => other.named_capable() && other.arity().is_none(),
            (Self::Pair { fields }, Self::Pair { fields: other }) => fields == other,
            (Self::Pair { fields }, Self::List { arity }) => fields.len() == *arity,
            (Self::Pair { .. }, Self::Map) => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List { arity } => write!(f, "list/{}", arity),
            Self::Map => write!(f, "map"),
            Self::Pair { fields } => write!(f, "pair({})", fields.join(", ")),
        }
    }
}

/// The mapping from relation name to established [`Shape`].
///
/// The schema grows monotonically: a relation's shape is inferred from its
/// first use and never changes afterwards. Incompatible later uses fail with
/// [`Error::ShapeMismatch`] and leave the schema untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    shapes: IndexMap<String, Shape>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the established shape for a relation, if any.
    pub fn get(&self, relation: &str) -> Option<&Shape> {
        self.shapes.get(relation)
    }

    /// Number of relations with an established shape.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no relation has been established yet.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates `(relation, shape)` pairs in establishment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.shapes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Records or verifies a shape for a relation.
    ///
    /// If the relation is unknown the shape is established; otherwise the
    /// candidate must be compatible with the established shape.
    pub fn check_shape(&mut self, relation: &str, shape: Shape) -> Result<()> {
        match self.shapes.get(relation) {
            None => {
                log::debug!("schema: relation '{}' established as {}", relation, shape);
                self.shapes.insert(relation.to_string(), shape);
                Ok(())
            }
            Some(established) if established.accepts(&shape) => Ok(()),
            Some(established) => Err(Error::ShapeMismatch {
                relation: relation.to_string(),
                expected: established.clone(),
                found: shape,
            }),
        }
    }

    /// Records or verifies the shape a fact uses.
    pub fn check_fact(&mut self, fact: &Fact) -> Result<()> {
        self.check_shape(fact.relation(), fact.shape())
    }

    /// Records or verifies an ordered use (e.g. an ordered atom) of a
    /// relation. An unknown relation is established as `List { arity }`.
    pub fn check_ordered_use(&mut self, relation: &str, arity: usize) -> Result<()> {
        self.check_shape(relation, Shape::List { arity })
    }

    /// Rewrites a fact into its relation's canonical layout.
    ///
    /// A `List` fact admitted into a `Pair` relation gains the declared
    /// field names, so it stays reachable by named access and deduplicates
    /// against pair facts with the same values. Everything else is returned
    /// unchanged.
    pub fn normalize(&self, fact: Fact) -> Fact {
        match (self.get(fact.relation()), fact) {
            (Some(Shape::Pair { fields }), Fact::List { relation, values })
                if fields.len() == values.len() =>
            {
                Fact::pair(relation, fields.iter().cloned().zip(values))
            }
            (_, fact) => fact,
        }
    }

    /// Records or verifies a named use (e.g. a named atom) of a relation.
    ///
    /// An unknown relation is established as `Map`. A `Pair` relation
    /// accepts the use when every named field exists in the pair's field
    /// list.
    pub fn check_named_use(&mut self, relation: &str, names: &[String]) -> Result<()> {
        match self.shapes.get(relation) {
            None => {
                log::debug!("schema: relation '{}' established as map", relation);
                self.shapes.insert(relation.to_string(), Shape::Map);
                Ok(())
            }
            Some(Shape::Map) => Ok(()),
            Some(Shape::Pair { fields }) if names.iter().all(|n| fields.contains(n)) => Ok(()),
            Some(established) => Err(Error::ShapeMismatch {
                relation: relation.to_string(),
                expected: established.clone(),
                found: Shape::Pair {
                    fields: names.to_vec(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_first_use_establishes_shape() {
        let mut schema = Schema::new();
        let fact = Fact::list("Parent", [Value::symbol("a"), Value::symbol("b")]);

        assert!(schema.check_fact(&fact).is_ok());
        assert_eq!(schema.get("Parent"), Some(&Shape::List { arity: 2 }));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut schema = Schema::new();
        schema
            .check_fact(&Fact::list("Parent", [Value::symbol("a"), Value::symbol("b")]))
            .unwrap();

        let bad = Fact::list("Parent", [Value::symbol("a")]);
        let err = schema.check_fact(&bad).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        // Rejection leaves the schema unchanged.
        assert_eq!(schema.get("Parent"), Some(&Shape::List { arity: 2 }));
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut schema = Schema::new();
        schema
            .check_fact(&Fact::list("Thing", [Value::symbol("pen")]))
            .unwrap();

        let named = Fact::map("Thing", [("id", Value::symbol("pen"))]);
        assert!(schema.check_fact(&named).is_err());
    }

    #[test]
    fn test_pair_shape_supports_both_uses() {
        let mut schema = Schema::new();
        schema
            .check_fact(&Fact::pair(
                "Thing",
                [("id", Value::symbol("pen")), ("size", Value::integer(1))],
            ))
            .unwrap();

        // Ordered use with the right arity is fine.
        assert!(schema.check_ordered_use("Thing", 2).is_ok());
        // Named use of declared fields is fine.
        assert!(schema
            .check_named_use("Thing", &["size".to_string()])
            .is_ok());
        // Named use of an undeclared field is not.
        assert!(schema
            .check_named_use("Thing", &["weight".to_string()])
            .is_err());
    }

    #[test]
    fn test_normalize_attaches_pair_field_names() {
        let mut schema = Schema::new();
        schema
            .check_shape(
                "Thing",
                Shape::Pair {
                    fields: vec!["id".to_string(), "size".to_string()],
                },
            )
            .unwrap();

        let list = Fact::list("Thing", [Value::symbol("pen"), Value::integer(1)]);
        schema.check_fact(&list).unwrap();

        let canonical = schema.normalize(list);
        assert!(canonical.supports_named());
        assert_eq!(canonical.field("id"), Some(&Value::symbol("pen")));
        assert_eq!(
            canonical,
            Fact::pair(
                "Thing",
                [("id", Value::symbol("pen")), ("size", Value::integer(1))],
            )
        );

        // Facts of other relations pass through untouched.
        let other = Fact::list("Other", [Value::integer(2)]);
        assert_eq!(schema.normalize(other.clone()), other);
    }

    #[test]
    fn test_ordered_use_establishes_list_shape() {
        let mut schema = Schema::new();
        schema.check_ordered_use("Ancestor", 2).unwrap();
        assert_eq!(schema.get("Ancestor"), Some(&Shape::List { arity: 2 }));
        assert!(schema.check_ordered_use("Ancestor", 3).is_err());
    }

    #[test]
    fn test_named_use_establishes_map_shape() {
        let mut schema = Schema::new();
        schema
            .check_named_use("Person", &["name".to_string()])
            .unwrap();
        assert_eq!(schema.get("Person"), Some(&Shape::Map));
        // Maps have no fixed field set; new names are fine.
        assert!(schema
            .check_named_use("Person", &["age".to_string()])
            .is_ok());
    }
}
