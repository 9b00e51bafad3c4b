//! Atoms, the relation references that make up rule heads and bodies.
//!
//! An atom names a relation and supplies one term per field, either
//! positionally (`Ordered`) or by field name (`Named`). Body atoms are
//! matched against stored facts to extend a binding set; the head atom is
//! instantiated from a complete binding set to materialize a new fact.

use crate::aggregate::AggregateSpec;
use crate::error::{Error, Result};
use crate::rule::Bindings;
use crate::term::Term;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_facts::{Fact, Schema, Shape, Value};

/// A reference to a relation with one term per field.
///
/// # Examples
///
/// ```
/// use strata_logic::{Atom, Term};
///
/// // Ancestor(x, y)
/// let atom = Atom::ordered("Ancestor", [Term::var("x"), Term::var("y")]);
/// assert_eq!(atom.relation(), "Ancestor");
/// assert_eq!(atom.arity(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Atom {
    /// Positional field access.
    Ordered { relation: String, terms: Vec<Term> },

    /// Field access by name.
    Named {
        relation: String,
        fields: IndexMap<String, Term>,
    },
}

impl Atom {
    /// Creates an ordered atom.
    pub fn ordered(relation: impl Into<String>, terms: impl IntoIterator<Item = Term>) -> Self {
        Self::Ordered {
            relation: relation.into(),
            terms: terms.into_iter().collect(),
        }
    }

    /// Creates a named atom.
    pub fn named(
        relation: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, Term)>,
    ) -> Self {
        Self::Named {
            relation: relation.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Shorthand for a ground ordered atom, as used for axioms.
    pub fn ground(
        relation: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::ordered(relation, values.into_iter().map(|v| Term::Constant(v.into())))
    }

    /// The relation this atom refers to.
    pub fn relation(&self) -> &str {
        match self {
            Self::Ordered { relation, .. } | Self::Named { relation, .. } => relation,
        }
    }

    /// Number of terms.
    pub fn arity(&self) -> usize {
        match self {
            Self::Ordered { terms, .. } => terms.len(),
            Self::Named { fields, .. } => fields.len(),
        }
    }

    /// Iterates this atom's terms, in field order.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        match self {
            Self::Ordered { terms, .. } => {
                Box::new(terms.iter()) as Box<dyn Iterator<Item = &Term>>
            }
            Self::Named { fields, .. } => Box::new(fields.values()),
        }
    }

    /// The field names of a named atom, in atom order.
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Self::Ordered { .. } => Vec::new(),
            Self::Named { fields, .. } => fields.keys().cloned().collect(),
        }
    }

    /// The names of all variables this atom mentions, in term order.
    /// Wildcards and aggregate variables are not included.
    pub fn variables(&self) -> Vec<&str> {
        self.terms().filter_map(Term::as_variable).collect()
    }

    /// The first aggregate term, if any.
    pub fn aggregate(&self) -> Option<&AggregateSpec> {
        self.terms().find_map(Term::as_aggregate)
    }

    /// How many aggregate terms this atom carries.
    pub fn aggregate_count(&self) -> usize {
        self.terms().filter(|t| t.as_aggregate().is_some()).count()
    }

    /// Whether any term is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.terms().any(|t| matches!(t, Term::Wildcard(_)))
    }

    /// Whether every term is a constant.
    pub fn is_ground(&self) -> bool {
        self.terms().all(Term::is_ground)
    }

    /// Attempts to match this atom against a fact, extending `bindings`.
    ///
    /// Returns `Ok(false)` on an ordinary non-match (different relation,
    /// conflicting binding, missing named field). Returns an error when the
    /// atom's access mode is undefined for the fact's layout, which is a
    /// usage error rather than a non-match.
    ///
    /// On `Ok(false)` the bindings may have been partially extended; callers
    /// match against a scratch clone and discard it on failure.
    pub fn matches(&self, fact: &Fact, bindings: &mut Bindings, interop: bool) -> Result<bool> {
        if self.relation() != fact.relation() {
            return Ok(false);
        }
        match self {
            Self::Ordered { relation, terms } => {
                if !fact.supports_ordered() {
                    return Err(Error::AccessMismatch {
                        relation: relation.clone(),
                        required: "ordered",
                        actual: "named",
                    });
                }
                if terms.len() != fact.arity() {
                    return Err(Error::Shape(strata_facts::Error::ShapeMismatch {
                        relation: relation.clone(),
                        expected: fact.shape(),
                        found: Shape::List { arity: terms.len() },
                    }));
                }
                for (i, term) in terms.iter().enumerate() {
                    // Arity was checked above, so the field exists.
                    let value = match fact.get(i) {
                        Some(v) => v,
                        None => return Ok(false),
                    };
                    if !term_matches(term, value, bindings, interop) {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Named { relation, fields } => {
                if !fact.supports_named() {
                    return Err(Error::AccessMismatch {
                        relation: relation.clone(),
                        required: "named",
                        actual: "ordered",
                    });
                }
                for (name, term) in fields {
                    let value = match fact.field(name) {
                        Some(v) => v,
                        // A missing field is an ordinary non-match for Map
                        // facts, whose field sets are open.
                        None => return Ok(false),
                    };
                    if !term_matches(term, value, bindings, interop) {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Materializes a fact from this atom under a complete binding set.
    ///
    /// The relation's established shape decides the fact layout; an unknown
    /// relation falls back to the atom's natural layout. `agg` supplies the
    /// value for an aggregate term, when the head has one.
    pub fn instantiate(
        &self,
        bindings: &Bindings,
        agg: Option<&Value>,
        schema: &Schema,
    ) -> Result<Fact> {
        match self {
            Self::Ordered { relation, terms } => {
                let values: Vec<Value> = terms
                    .iter()
                    .map(|t| self.resolve(t, bindings, agg))
                    .collect::<Result<_>>()?;
                match schema.get(relation) {
                    Some(Shape::Pair { fields }) if fields.len() == values.len() => Ok(Fact::pair(
                        relation.clone(),
                        fields.iter().cloned().zip(values),
                    )),
                    Some(shape) if !shape.accepts(&Shape::List { arity: values.len() }) => {
                        Err(Error::Shape(strata_facts::Error::ShapeMismatch {
                            relation: relation.clone(),
                            expected: shape.clone(),
                            found: Shape::List { arity: values.len() },
                        }))
                    }
                    _ => Ok(Fact::list(relation.clone(), values)),
                }
            }
            Self::Named { relation, fields } => {
                match schema.get(relation) {
                    // A named head over a pair relation must supply every
                    // declared field; values are laid out in schema order.
                    Some(Shape::Pair {
                        fields: declared,
                    }) => {
                        let mut out = Vec::with_capacity(declared.len());
                        for name in declared {
                            let term = fields.get(name).ok_or_else(|| {
                                Error::Shape(strata_facts::Error::ShapeMismatch {
                                    relation: relation.clone(),
                                    expected: Shape::Pair {
                                        fields: declared.clone(),
                                    },
                                    found: Shape::Pair {
                                        fields: self.field_names(),
                                    },
                                })
                            })?;
                            out.push((name.clone(), self.resolve(term, bindings, agg)?));
                        }
                        Ok(Fact::pair(relation.clone(), out))
                    }
                    Some(Shape::List { arity }) => {
                        Err(Error::Shape(strata_facts::Error::ShapeMismatch {
                            relation: relation.clone(),
                            expected: Shape::List { arity: *arity },
                            found: Shape::Pair {
                                fields: self.field_names(),
                            },
                        }))
                    }
                    Some(Shape::Map) | None => {
                        let out: Vec<(String, Value)> = fields
                            .iter()
                            .map(|(name, term)| {
                                Ok((name.clone(), self.resolve(term, bindings, agg)?))
                            })
                            .collect::<Result<_>>()?;
                        Ok(Fact::map(relation.clone(), out))
                    }
                }
            }
        }
    }

    /// Resolves one head term to a ground value.
    fn resolve(&self, term: &Term, bindings: &Bindings, agg: Option<&Value>) -> Result<Value> {
        match term {
            Term::Constant(value) => Ok(value.clone()),
            Term::Variable(name) => {
                bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnboundHeadVariable {
                        rule: self.to_string(),
                        variable: name.clone(),
                    })
            }
            Term::Wildcard(name) => Err(Error::UnboundHeadVariable {
                rule: self.to_string(),
                variable: name.clone(),
            }),
            Term::Aggregate(spec) => {
                agg.cloned().ok_or_else(|| Error::MalformedAggregate {
                    rule: self.to_string(),
                    detail: format!("no value computed for {}", spec),
                })
            }
        }
    }
}

/// Matches a single term against a fact field, extending the bindings on a
/// first encounter of a variable.
fn term_matches(term: &Term, value: &Value, bindings: &mut Bindings, interop: bool) -> bool {
    match term {
        Term::Constant(expected) => expected.matches(value, interop),
        Term::Variable(name) => match bindings.get(name) {
            Some(bound) => bound.matches(value, interop),
            None => {
                bindings.bind(name.clone(), value.clone());
                true
            }
        },
        Term::Wildcard(_) => true,
        // Aggregates never appear in body atoms; validation rejects them.
        Term::Aggregate(_) => false,
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered { relation, terms } => {
                write!(f, "{}(", relation)?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", term)?;
                }
                write!(f, ")")
            }
            Self::Named { relation, fields } => {
                write!(f, "{}{{", relation)?;
                for (i, (name, term)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, term)?;
                }
                write!(f, "}}")
            }
        }
    }
}
