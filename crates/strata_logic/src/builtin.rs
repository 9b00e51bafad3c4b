//! Built-in virtual predicates over collection values.
//!
//! These relations are never stored. When a body atom references one, the
//! engine expands the bound collection argument into transient facts on the
//! fly and matches the atom against those. The collection argument must be
//! ground by the time the atom is reached, which rule validation enforces by
//! requiring it to be a constant or a variable bound by an earlier body atom.

use crate::atom::Atom;
use crate::error::{Error, Result};
use crate::rule::Bindings;
use crate::term::Term;
use strata_facts::{Fact, Value};

/// `member(item, collection)`: item is an element of a list, or a key of a map.
pub const MEMBER: &str = "member";

/// `indexed_member(index, item, list)`: item at zero-based index of a list.
pub const INDEXED_MEMBER: &str = "indexed_member";

/// `keyed_member(key, value, map)`: entry of a map.
pub const KEYED_MEMBER: &str = "keyed_member";

/// Whether a relation name is reserved for a built-in predicate.
pub fn is_builtin(relation: &str) -> bool {
    matches!(relation, MEMBER | INDEXED_MEMBER | KEYED_MEMBER)
}

/// The required arity of a built-in predicate.
pub fn arity(relation: &str) -> Option<usize> {
    match relation {
        MEMBER => Some(2),
        INDEXED_MEMBER | KEYED_MEMBER => Some(3),
        _ => None,
    }
}

/// The position of the collection argument.
pub fn collection_position(relation: &str) -> Option<usize> {
    match relation {
        MEMBER => Some(1),
        INDEXED_MEMBER | KEYED_MEMBER => Some(2),
        _ => None,
    }
}

/// Expands a built-in atom into the transient facts it can match, given the
/// bindings accumulated so far.
///
/// A bound collection argument of the wrong type (a list where a map is
/// required, or a scalar anywhere) expands to no facts at all; that is a
/// non-match, not an error.
pub fn expand(atom: &Atom, bindings: &Bindings) -> Result<Vec<Fact>> {
    let relation = atom.relation();
    let (position, terms) = match (collection_position(relation), atom) {
        (Some(position), Atom::Ordered { terms, .. }) => (position, terms),
        _ => {
            return Err(Error::MalformedBuiltin {
                relation: relation.to_string(),
                expected: arity(relation).unwrap_or(0),
                found: atom.arity(),
            })
        }
    };
    let collection = match terms.get(position) {
        Some(Term::Constant(value)) => value.clone(),
        Some(Term::Variable(name)) => match bindings.get(name) {
            Some(value) => value.clone(),
            None => {
                return Err(Error::UnboundCollection {
                    rule: atom.to_string(),
                    variable: name.clone(),
                })
            }
        },
        _ => {
            return Err(Error::UnboundCollection {
                rule: atom.to_string(),
                variable: "_".to_string(),
            })
        }
    };

    let facts = match (relation, &collection) {
        (MEMBER, Value::List(items)) => items
            .iter()
            .map(|item| Fact::list(MEMBER, [item.clone(), collection.clone()]))
            .collect(),
        (MEMBER, Value::Map(entries)) => entries
            .keys()
            .map(|key| Fact::list(MEMBER, [key.clone(), collection.clone()]))
            .collect(),
        (INDEXED_MEMBER, Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Fact::list(
                    INDEXED_MEMBER,
                    [Value::integer(i as i64), item.clone(), collection.clone()],
                )
            })
            .collect(),
        (KEYED_MEMBER, Value::Map(entries)) => entries
            .iter()
            .map(|(key, value)| {
                Fact::list(
                    KEYED_MEMBER,
                    [key.clone(), value.clone(), collection.clone()],
                )
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_over_list() {
        let list = Value::list([Value::integer(1), Value::integer(2)]);
        let atom = Atom::ordered(MEMBER, [Term::var("x"), Term::val(list.clone())]);
        let facts = expand(&atom, &Bindings::new()).unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].get(0), Some(&Value::integer(1)));
        assert_eq!(facts[1].get(0), Some(&Value::integer(2)));
    }

    #[test]
    fn test_member_over_map_yields_keys() {
        let map = Value::map([(Value::symbol("a"), Value::integer(1))]);
        let atom = Atom::ordered(MEMBER, [Term::var("k"), Term::val(map)]);
        let facts = expand(&atom, &Bindings::new()).unwrap();

        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].get(0), Some(&Value::symbol("a")));
    }

    #[test]
    fn test_indexed_member_counts_from_zero() {
        let list = Value::list([Value::symbol("a"), Value::symbol("b")]);
        let atom = Atom::ordered(
            INDEXED_MEMBER,
            [Term::var("i"), Term::var("x"), Term::val(list)],
        );
        let facts = expand(&atom, &Bindings::new()).unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].get(0), Some(&Value::integer(1)));
        assert_eq!(facts[1].get(1), Some(&Value::symbol("b")));
    }

    #[test]
    fn test_keyed_member_over_map() {
        let map = Value::map([(Value::symbol("a"), Value::integer(1))]);
        let atom = Atom::ordered(
            KEYED_MEMBER,
            [Term::var("k"), Term::var("v"), Term::val(map)],
        );
        let facts = expand(&atom, &Bindings::new()).unwrap();

        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].get(1), Some(&Value::integer(1)));
    }

    #[test]
    fn test_wrong_collection_type_matches_nothing() {
        // indexed_member requires a list; a map yields zero facts.
        let map = Value::map([(Value::symbol("a"), Value::integer(1))]);
        let atom = Atom::ordered(
            INDEXED_MEMBER,
            [Term::var("i"), Term::var("x"), Term::val(map)],
        );
        assert!(expand(&atom, &Bindings::new()).unwrap().is_empty());

        // A scalar is never a collection.
        let atom = Atom::ordered(MEMBER, [Term::var("x"), Term::val(Value::integer(5))]);
        assert!(expand(&atom, &Bindings::new()).unwrap().is_empty());
    }

    #[test]
    fn test_bound_variable_collection() {
        let mut bindings = Bindings::new();
        bindings.bind(
            "c".to_string(),
            Value::list([Value::integer(7)]),
        );
        let atom = Atom::ordered(MEMBER, [Term::var("x"), Term::var("c")]);
        let facts = expand(&atom, &bindings).unwrap();
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_unbound_collection_is_an_error() {
        let atom = Atom::ordered(MEMBER, [Term::var("x"), Term::var("c")]);
        let err = expand(&atom, &Bindings::new()).unwrap_err();
        assert!(matches!(err, Error::UnboundCollection { .. }));
    }
}
