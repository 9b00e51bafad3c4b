//! Stratification of the rule dependency graph.
//!
//! Head relations form the nodes of a signed dependency graph: an edge from
//! a head to a body relation is positive for a plain atom and negative for a
//! negated one, with negative dominating when both occur. Stratum numbers
//! are raised until every positive edge is non-descending and every negative
//! edge strictly descends into an earlier stratum. A stratum number that
//! exceeds the node count proves a negation cycle, so no valid ordering
//! exists.

use crate::rule::Rule;
use std::collections::HashMap;

/// The signed dependency graph over a rule set's head relations.
///
/// Only relations that appear as some rule's head are nodes; body-only
/// relations are base data and never constrain evaluation order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    relations: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Vec<i8>,
}

impl DependencyGraph {
    /// Builds the graph from a set of rules.
    pub fn from_rules(rules: &[Rule]) -> Self {
        let mut relations: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for rule in rules {
            let head = rule.head_atom().relation();
            if !index.contains_key(head) {
                index.insert(head.to_string(), relations.len());
                relations.push(head.to_string());
            }
        }

        let n = relations.len();
        let mut matrix = vec![0i8; n * n];
        for rule in rules {
            let from = index[rule.head_atom().relation()];
            for atom in rule.body() {
                if let Some(&to) = index.get(atom.relation()) {
                    // Positive never overwrites an established negative edge.
                    if matrix[from * n + to] == 0 {
                        matrix[from * n + to] = 1;
                    }
                }
            }
            for atom in rule.negated() {
                if let Some(&to) = index.get(atom.relation()) {
                    matrix[from * n + to] = -1;
                }
            }
        }

        Self {
            relations,
            index,
            matrix,
        }
    }

    /// The head relations, in first-seen order.
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    /// The signed dependency from one head relation to another: `1` for a
    /// positive reference, `-1` for a negated one, `0` for none.
    pub fn dependency(&self, head: &str, body: &str) -> i8 {
        match (self.index.get(head), self.index.get(body)) {
            (Some(&from), Some(&to)) => self.matrix[from * self.relations.len() + to],
            _ => 0,
        }
    }

    /// Computes the stratification, as buckets of relation names from the
    /// lowest stratum upwards.
    ///
    /// Fails with a relation involved in recursion through negation when no
    /// valid stratification exists.
    pub fn stratify(&self) -> Result<Vec<Vec<String>>, String> {
        let n = self.relations.len();
        let mut stratum = vec![0usize; n];

        // Raise strata until the constraints settle. Each raise is forced,
        // so exceeding n proves a cycle with a negative edge.
        let mut changed = true;
        while changed {
            changed = false;
            for from in 0..n {
                for to in 0..n {
                    let required = match self.matrix[from * n + to] {
                        1 => stratum[to],
                        -1 => stratum[to] + 1,
                        _ => continue,
                    };
                    if stratum[from] < required {
                        if required > n {
                            return Err(self.relations[from].clone());
                        }
                        stratum[from] = required;
                        changed = true;
                    }
                }
            }
        }

        let top = stratum.iter().copied().max().unwrap_or(0);
        let mut buckets: Vec<Vec<String>> = Vec::new();
        for level in 0..=top {
            let bucket: Vec<String> = self
                .relations
                .iter()
                .zip(&stratum)
                .filter(|(_, s)| **s == level)
                .map(|(relation, _)| relation.clone())
                .collect();
            if !bucket.is_empty() {
                buckets.push(bucket);
            }
        }
        Ok(buckets)
    }
}

/// Stratifies a rule set's head relations, lowest stratum first.
pub fn stratify(rules: &[Rule]) -> Result<Vec<Vec<String>>, String> {
    DependencyGraph::from_rules(rules).stratify()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::term::Term;

    fn atom(relation: &str) -> Atom {
        Atom::ordered(relation, [Term::var("x")])
    }

    #[test]
    fn test_positive_recursion_is_one_stratum() {
        // Path :- Edge.  Path :- Edge, Path.
        let rules = [
            Rule::head(atom("Path")).when(atom("Edge")).build(),
            Rule::head(atom("Path"))
                .when(atom("Edge"))
                .when(atom("Path"))
                .build(),
        ];
        let strata = stratify(&rules).unwrap();
        assert_eq!(strata, vec![vec!["Path".to_string()]]);
    }

    #[test]
    fn test_negation_forces_a_higher_stratum() {
        // Reach :- Edge, Reach.  Blocked :- Node, not Reach.
        let rules = [
            Rule::head(atom("Reach")).when(atom("Edge")).build(),
            Rule::head(atom("Blocked"))
                .when(atom("Node"))
                .when_not(atom("Reach"))
                .build(),
        ];
        let strata = stratify(&rules).unwrap();
        assert_eq!(
            strata,
            vec![vec!["Reach".to_string()], vec!["Blocked".to_string()]]
        );
    }

    #[test]
    fn test_negative_edge_dominates_positive() {
        // B references A both plainly and negated; the negative edge wins.
        let rules = [
            Rule::head(atom("A")).when(atom("Base")).build(),
            Rule::head(atom("B"))
                .when(atom("A"))
                .when_not(atom("A"))
                .build(),
        ];
        let graph = DependencyGraph::from_rules(&rules);
        assert_eq!(graph.dependency("B", "A"), -1);
        assert_eq!(graph.stratify().unwrap().len(), 2);
    }

    #[test]
    fn test_negation_cycle_is_unstratifiable() {
        let rules = [
            Rule::head(atom("P"))
                .when(atom("Thing"))
                .when_not(atom("Q"))
                .build(),
            Rule::head(atom("Q"))
                .when(atom("Thing"))
                .when_not(atom("P"))
                .build(),
        ];
        assert!(stratify(&rules).is_err());
    }

    #[test]
    fn test_body_only_relations_are_not_nodes() {
        let rules = [Rule::head(atom("Out")).when(atom("In")).build()];
        let graph = DependencyGraph::from_rules(&rules);
        assert_eq!(graph.relations(), &["Out".to_string()]);
        assert_eq!(graph.dependency("Out", "In"), 0);
    }

    #[test]
    fn test_empty_rule_set() {
        assert!(stratify(&[]).unwrap().is_empty());
    }
}
