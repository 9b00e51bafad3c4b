//! Ground facts in their three concrete layouts.
//!
//! A fact is an immutable tuple belonging to one relation. `List` facts have
//! ordered anonymous fields, `Map` facts have named fields, and `Pair` facts
//! carry ordered fields with names attached, supporting both access modes.
//! Equality and hashing are by relation plus field values.

use crate::{Shape, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A ground tuple stored in a [`FactSet`](crate::FactSet).
///
/// # Examples
///
/// ```
/// use strata_facts::{Fact, Value};
///
/// let parent = Fact::list("Parent", [Value::symbol("walker"), Value::symbol("bert")]);
/// assert_eq!(parent.get(0), Some(&Value::symbol("walker")));
/// assert!(parent.supports_ordered());
/// assert!(!parent.supports_named());
///
/// let person = Fact::map("Person", [("name", Value::string("Bert"))]);
/// assert_eq!(person.field("name"), Some(&Value::string("Bert")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fact {
    /// Ordered anonymous fields.
    List { relation: String, values: Vec<Value> },

    /// Named fields, insertion-ordered.
    Map {
        relation: String,
        fields: IndexMap<String, Value>,
    },

    /// Ordered fields with names attached; supports both access modes.
    Pair {
        relation: String,
        names: Vec<String>,
        values: Vec<Value>,
    },
}

impl Fact {
    /// Creates an ordered-field fact.
    pub fn list(relation: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::List {
            relation: relation.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Creates a named-field fact.
    pub fn map(
        relation: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, Value)>,
    ) -> Self {
        Self::Map {
            relation: relation.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Creates a fact with ordered, named fields.
    pub fn pair(
        relation: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, Value)>,
    ) -> Self {
        let (names, values) = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .unzip();
        Self::Pair {
            relation: relation.into(),
            names,
            values,
        }
    }

    /// The relation this fact belongs to.
    pub fn relation(&self) -> &str {
        match self {
            Self::List { relation, .. }
            | Self::Map { relation, .. }
            | Self::Pair { relation, .. } => relation,
        }
    }

    /// Number of fields.
    pub fn arity(&self) -> usize {
        match self {
            Self::List { values, .. } | Self::Pair { values, .. } => values.len(),
            Self::Map { fields, .. } => fields.len(),
        }
    }

    /// Positional field access. `None` when out of range or when the layout
    /// has no field order (`Map`).
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Self::List { values, .. } | Self::Pair { values, .. } => values.get(index),
            Self::Map { .. } => None,
        }
    }

    /// Named field access. `None` when the field does not exist or the
    /// layout has no field names (`List`).
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::List { .. } => None,
            Self::Map { fields, .. } => fields.get(name),
            Self::Pair { names, values, .. } => {
                let idx = names.iter().position(|n| n == name)?;
                values.get(idx)
            }
        }
    }

    /// Whether positional access is defined for this layout.
    pub fn supports_ordered(&self) -> bool {
        !matches!(self, Self::Map { .. })
    }

    /// Whether named access is defined for this layout.
    pub fn supports_named(&self) -> bool {
        !matches!(self, Self::List { .. })
    }

    /// Iterates field values in layout order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        match self {
            Self::List { values, .. } | Self::Pair { values, .. } => {
                Box::new(values.iter()) as Box<dyn Iterator<Item = &Value>>
            }
            Self::Map { fields, .. } => Box::new(fields.values()),
        }
    }

    /// The shape this fact establishes when it is the first use of its
    /// relation.
    pub fn shape(&self) -> Shape {
        match self {
            Self::List { values, .. } => Shape::List {
                arity: values.len(),
            },
            Self::Map { .. } => Shape::Map,
            Self::Pair { names, .. } => Shape::Pair {
                fields: names.clone(),
            },
        }
    }
}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation().hash(state);
        match self {
            Self::List { values, .. } | Self::Pair { values, .. } => {
                for value in values {
                    value.hash(state);
                }
            }
            // IndexMap equality ignores insertion order, so hash the fields
            // in sorted name order to keep eq/hash consistent.
            Self::Map { fields, .. } => {
                let mut names: Vec<&String> = fields.keys().collect();
                names.sort();
                for name in names {
                    name.hash(state);
                    fields[name.as_str()].hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List { relation, values } => {
                write!(f, "{}(", relation)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Self::Map { relation, fields } => {
                write!(f, "{}{{", relation)?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Pair {
                relation,
                names,
                values,
            } => {
                write!(f, "{}(", relation)?;
                for (i, (n, v)) in names.iter().zip(values).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", n, v)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_fact_access() {
        let fact = Fact::list("Parent", [Value::symbol("a"), Value::symbol("b")]);

        assert_eq!(fact.relation(), "Parent");
        assert_eq!(fact.arity(), 2);
        assert_eq!(fact.get(1), Some(&Value::symbol("b")));
        assert_eq!(fact.get(2), None);
        assert_eq!(fact.field("x"), None);
        assert!(fact.supports_ordered());
        assert!(!fact.supports_named());
    }

    #[test]
    fn test_map_fact_access() {
        let fact = Fact::map("Person", [("name", Value::string("Bert")), ("age", 7.into())]);

        assert_eq!(fact.field("name"), Some(&Value::string("Bert")));
        assert_eq!(fact.field("missing"), None);
        assert_eq!(fact.get(0), None);
        assert!(!fact.supports_ordered());
        assert!(fact.supports_named());
    }

    #[test]
    fn test_pair_fact_supports_both_modes() {
        let fact = Fact::pair("Thing", [("id", Value::symbol("pen")), ("size", 1.into())]);

        assert_eq!(fact.get(0), Some(&Value::symbol("pen")));
        assert_eq!(fact.field("size"), Some(&Value::integer(1)));
        assert!(fact.supports_ordered());
        assert!(fact.supports_named());
    }

    #[test]
    fn test_equality_by_relation_and_values() {
        let a = Fact::list("R", [Value::integer(1)]);
        let b = Fact::list("R", [Value::integer(1)]);
        let c = Fact::list("S", [Value::integer(1)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_map_fact_hash_order_independent() {
        use std::collections::hash_map::DefaultHasher;

        let a = Fact::map("P", [("x", Value::integer(1)), ("y", Value::integer(2))]);
        let b = Fact::map("P", [("y", Value::integer(2)), ("x", Value::integer(1))]);
        assert_eq!(a, b);

        let hash = |fact: &Fact| {
            let mut h = DefaultHasher::new();
            fact.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_display() {
        let fact = Fact::list("Parent", [Value::symbol("a"), Value::symbol("b")]);
        assert_eq!(fact.to_string(), "Parent(#a, #b)");

        let fact = Fact::map("Person", [("name", Value::string("Bert"))]);
        assert_eq!(fact.to_string(), "Person{name: \"Bert\"}");
    }
}
