//! The fact store.
//!
//! `FactSet` is the engine's working memory and its output: a deduplicated,
//! insertion-ordered set of facts with a secondary index by relation name.
//! Single-fact operations keep the index current incrementally; bulk
//! operations rebuild it in one pass over the surviving facts.

use crate::Fact;
use indexmap::IndexSet;
use std::collections::HashMap;

/// A deduplicated, relation-indexed collection of facts.
///
/// Iteration order is insertion order, which keeps inference runs
/// deterministic.
///
/// # Examples
///
/// ```
/// use strata_facts::{Fact, FactSet, Value};
///
/// let mut facts = FactSet::new();
/// let fact = Fact::list("Parent", [Value::symbol("a"), Value::symbol("b")]);
///
/// assert!(facts.add(fact.clone()));
/// assert!(!facts.add(fact)); // duplicates are ignored
/// assert_eq!(facts.relation("Parent").len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    facts: IndexSet<Fact>,
    by_relation: HashMap<String, Vec<Fact>>,
}

impl FactSet {
    /// Creates an empty fact set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fact, deduplicating by value equality.
    ///
    /// Returns `true` if the fact was newly added.
    pub fn add(&mut self, fact: Fact) -> bool {
        if self.facts.contains(&fact) {
            return false;
        }
        self.by_relation
            .entry(fact.relation().to_string())
            .or_default()
            .push(fact.clone());
        self.facts.insert(fact);
        true
    }

    /// Adds every fact from an iterator, then rebuilds the relation index.
    ///
    /// Returns the number of facts that were newly added.
    pub fn add_all(&mut self, facts: impl IntoIterator<Item = Fact>) -> usize {
        let before = self.facts.len();
        for fact in facts {
            self.facts.insert(fact);
        }
        self.reindex();
        self.facts.len() - before
    }

    /// Removes a single fact. Returns `true` if it was present.
    pub fn remove(&mut self, fact: &Fact) -> bool {
        if !self.facts.shift_remove(fact) {
            return false;
        }
        if let Some(bucket) = self.by_relation.get_mut(fact.relation()) {
            bucket.retain(|f| f != fact);
            if bucket.is_empty() {
                self.by_relation.remove(fact.relation());
            }
        }
        true
    }

    /// Removes every listed fact, then rebuilds the relation index.
    ///
    /// Returns the number of facts actually removed.
    pub fn remove_all<'a>(&mut self, facts: impl IntoIterator<Item = &'a Fact>) -> usize {
        let before = self.facts.len();
        for fact in facts {
            self.facts.shift_remove(fact);
        }
        self.reindex();
        before - self.facts.len()
    }

    /// Removes all facts of one relation. Returns how many were dropped.
    pub fn drop_relation(&mut self, relation: &str) -> usize {
        let dropped = match self.by_relation.remove(relation) {
            Some(bucket) => bucket,
            None => return 0,
        };
        for fact in &dropped {
            self.facts.shift_remove(fact);
        }
        dropped.len()
    }

    /// Moves every fact of `from` under the relation name `to`, replacing
    /// any facts previously stored under `to`.
    ///
    /// Returns the number of facts now stored under `to`.
    pub fn rename_relation(&mut self, from: &str, to: &str) -> usize {
        if from == to {
            return self.relation(from).len();
        }
        self.drop_relation(to);
        let moved = match self.by_relation.remove(from) {
            Some(bucket) => bucket,
            None => return 0,
        };
        for fact in &moved {
            self.facts.shift_remove(fact);
        }
        let count = moved.len();
        for fact in moved {
            self.facts.insert(with_relation(fact, to));
        }
        self.reindex();
        count
    }

    /// A read-only view of all facts of one relation, in insertion order.
    pub fn relation(&self, name: &str) -> &[Fact] {
        self.by_relation
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates all relation names currently present.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.by_relation.keys().map(String::as_str)
    }

    /// Iterates all facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Whether the exact fact is present.
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    /// Total number of facts.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the store holds no facts.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Rebuilds the relation index from the fact set.
    fn reindex(&mut self) {
        self.by_relation.clear();
        for fact in &self.facts {
            self.by_relation
                .entry(fact.relation().to_string())
                .or_default()
                .push(fact.clone());
        }
    }
}

impl Extend<Fact> for FactSet {
    fn extend<T: IntoIterator<Item = Fact>>(&mut self, iter: T) {
        self.add_all(iter);
    }
}

impl FromIterator<Fact> for FactSet {
    fn from_iter<T: IntoIterator<Item = Fact>>(iter: T) -> Self {
        let mut set = Self::new();
        set.add_all(iter);
        set
    }
}

impl PartialEq for FactSet {
    /// Order-independent set equality.
    fn eq(&self, other: &Self) -> bool {
        self.facts.len() == other.facts.len()
            && self.facts.iter().all(|f| other.facts.contains(f))
    }
}

impl Eq for FactSet {}

/// Rebuilds a fact under a different relation name.
fn with_relation(fact: Fact, relation: &str) -> Fact {
    match fact {
        Fact::List { values, .. } => Fact::List {
            relation: relation.to_string(),
            values,
        },
        Fact::Map { fields, .. } => Fact::Map {
            relation: relation.to_string(),
            fields,
        },
        Fact::Pair { names, values, .. } => Fact::Pair {
            relation: relation.to_string(),
            names,
            values,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn parent(a: &str, b: &str) -> Fact {
        Fact::list("Parent", [Value::symbol(a), Value::symbol(b)])
    }

    #[test]
    fn test_add_deduplicates() {
        let mut facts = FactSet::new();
        assert!(facts.add(parent("a", "b")));
        assert!(!facts.add(parent("a", "b")));
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_relation_view() {
        let mut facts = FactSet::new();
        facts.add(parent("a", "b"));
        facts.add(parent("b", "c"));
        facts.add(Fact::list("Thing", [Value::symbol("pen")]));

        assert_eq!(facts.relation("Parent").len(), 2);
        assert_eq!(facts.relation("Thing").len(), 1);
        assert!(facts.relation("Missing").is_empty());
    }

    #[test]
    fn test_remove() {
        let mut facts = FactSet::new();
        facts.add(parent("a", "b"));

        assert!(facts.remove(&parent("a", "b")));
        assert!(!facts.remove(&parent("a", "b")));
        assert!(facts.is_empty());
        assert!(facts.relation("Parent").is_empty());
    }

    #[test]
    fn test_bulk_ops_reindex() {
        let mut facts = FactSet::new();
        let added = facts.add_all([parent("a", "b"), parent("b", "c"), parent("a", "b")]);
        assert_eq!(added, 2);
        assert_eq!(facts.relation("Parent").len(), 2);

        let removed = facts.remove_all([&parent("a", "b")]);
        assert_eq!(removed, 1);
        assert_eq!(facts.relation("Parent").len(), 1);
    }

    #[test]
    fn test_drop_relation() {
        let mut facts = FactSet::new();
        facts.add(parent("a", "b"));
        facts.add(Fact::list("Thing", [Value::symbol("pen")]));

        assert_eq!(facts.drop_relation("Parent"), 1);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.drop_relation("Parent"), 0);
    }

    #[test]
    fn test_rename_relation_replaces_target() {
        let mut facts = FactSet::new();
        facts.add(parent("a", "b"));
        facts.add(Fact::list("Old", [Value::integer(1)]));
        facts.add(Fact::list("Old", [Value::integer(2)]));

        let moved = facts.rename_relation("Old", "Parent");
        assert_eq!(moved, 2);
        // The old Parent fact is gone, replaced by the renamed facts.
        assert_eq!(facts.relation("Parent").len(), 2);
        assert!(facts.relation("Old").is_empty());
        assert!(facts.contains(&Fact::list("Parent", [Value::integer(1)])));
    }

    #[test]
    fn test_set_equality_is_order_independent() {
        let a: FactSet = [parent("a", "b"), parent("b", "c")].into_iter().collect();
        let b: FactSet = [parent("b", "c"), parent("a", "b")].into_iter().collect();
        assert_eq!(a, b);
    }
}
