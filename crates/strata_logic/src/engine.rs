//! The stratified fixpoint inference engine.
//!
//! Evaluation runs stratum by stratum, lowest first. Within a stratum,
//! every rule is matched against the full fact store and its new head facts
//! are added, pass after pass, until one whole pass derives nothing new.
//! Negation is checked against the live store; stratification guarantees
//! that a negated relation is already complete when the check runs, so this
//! is equivalent to checking a frozen snapshot of the lower strata.

use crate::builtin;
use crate::error::{Error, Result};
use crate::rule::{Bindings, Rule, RuleSet};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use strata_facts::{Fact, FactSet, Schema, Value};

/// Runs stratified inference over a [`RuleSet`].
///
/// # Examples
///
/// ```
/// use strata_logic::{Atom, Engine, Rule, RuleSet, Term};
/// use strata_facts::Value;
///
/// let rules = RuleSet::builder()
///     .axiom(Atom::ground("Parent", [Value::symbol("a"), Value::symbol("b")]))
///     .rule(
///         Rule::head(Atom::ordered("Ancestor", [Term::var("x"), Term::var("y")]))
///             .when(Atom::ordered("Parent", [Term::var("x"), Term::var("y")]))
///             .build(),
///     )
///     .build()
///     .unwrap();
///
/// let result = Engine::new(rules).infer().unwrap();
/// assert_eq!(result.relation("Ancestor").len(), 1);
/// ```
pub struct Engine {
    rule_set: RuleSet,
    interop: bool,
    max_passes: Option<usize>,
    trace: Option<Box<dyn Write>>,
}

impl Engine {
    /// Creates an engine over a validated rule set.
    pub fn new(rule_set: RuleSet) -> Self {
        Self {
            rule_set,
            interop: false,
            max_passes: None,
            trace: None,
        }
    }

    /// The rule set this engine evaluates.
    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Enables or disables symbol/string interop equality for matching and
    /// constraints. Off by default.
    pub fn set_interop(&mut self, interop: bool) {
        self.interop = interop;
    }

    /// Caps the number of passes per stratum. Termination is guaranteed
    /// without it; the cap is a latency bound for callers that want one.
    pub fn set_max_passes(&mut self, max_passes: Option<usize>) {
        self.max_passes = max_passes;
    }

    /// Installs a sink that receives one line per rule attempt and one per
    /// newly derived fact, each tagged with its stratum and pass number.
    /// Tracing never affects evaluation order or the result.
    pub fn set_trace(&mut self, sink: impl Write + 'static) {
        self.trace = Some(Box::new(sink));
    }

    /// Removes the trace sink.
    pub fn clear_trace(&mut self) {
        self.trace = None;
    }

    /// Runs inference from the axioms alone.
    pub fn infer(&mut self) -> Result<Inference> {
        self.run(FactSet::new())
    }

    /// Runs inference with extra ground facts joined to the axioms. The
    /// seed facts must conform to the rule set's schema; they may also
    /// establish relations the rule set never mentions.
    pub fn infer_seeded(&mut self, seed: FactSet) -> Result<Inference> {
        self.run(seed)
    }

    fn run(&mut self, seed: FactSet) -> Result<Inference> {
        let strata: Vec<Vec<String>> = match self.rule_set.strata() {
            Some(strata) => strata.to_vec(),
            None => {
                let relation = self
                    .rule_set
                    .unstratifiable_relation()
                    .unwrap_or_default()
                    .to_string();
                return Err(Error::Unstratifiable { relation });
            }
        };

        let mut schema = self.rule_set.schema().clone();
        let mut known = FactSet::new();
        for fact in seed.iter() {
            schema.check_fact(fact)?;
            // Seed facts are stored in their relation's canonical layout,
            // so a list-layout fact in a pair relation stays reachable by
            // named access.
            known.add(schema.normalize(fact.clone()));
        }
        let mut inferred = FactSet::new();

        for axiom in self.rule_set.axioms() {
            let fact = axiom.instantiate(&Bindings::new(), None, &schema)?;
            if known.add(fact.clone()) {
                inferred.add(fact);
            }
        }

        let mut total_passes = 0usize;
        for (level, bucket) in strata.iter().enumerate() {
            let rules: Vec<&Rule> = self
                .rule_set
                .rules()
                .iter()
                .filter(|rule| {
                    bucket
                        .iter()
                        .any(|relation| relation == rule.head_atom().relation())
                })
                .collect();
            if rules.is_empty() {
                continue;
            }
            log::debug!(
                "stratum {}: {} rule(s) over {:?}",
                level,
                rules.len(),
                bucket
            );

            let mut pass = 0usize;
            loop {
                pass += 1;
                total_passes += 1;
                if let Some(cap) = self.max_passes {
                    if pass > cap {
                        return Err(Error::MaxPassesExceeded { passes: cap });
                    }
                }

                let mut derived_any = false;
                for rule in &rules {
                    if let Some(sink) = self.trace.as_mut() {
                        let _ = writeln!(sink, "stratum {} pass {}: trying {}", level, pass, rule);
                    }
                    let matches = satisfy(rule, &known, self.interop)?;
                    let facts = materialize(rule, &matches, &schema)?;
                    for fact in facts {
                        schema.check_fact(&fact)?;
                        if known.add(fact.clone()) {
                            derived_any = true;
                            log::trace!("derived {}", fact);
                            if let Some(sink) = self.trace.as_mut() {
                                let _ = writeln!(
                                    sink,
                                    "stratum {} pass {}: {} => {}",
                                    level, pass, rule, fact
                                );
                            }
                            inferred.add(fact);
                        }
                    }
                }
                if !derived_any {
                    break;
                }
            }
        }

        log::debug!(
            "inference complete: {} fact(s), {} inferred, {} pass(es)",
            known.len(),
            inferred.len(),
            total_passes
        );
        Ok(Inference {
            facts: known,
            inferred,
            schema,
            passes: total_passes,
        })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rule_set.len())
            .field("interop", &self.interop)
            .field("max_passes", &self.max_passes)
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

/// The outcome of one inference run.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    facts: FactSet,
    inferred: FactSet,
    schema: Schema,
    passes: usize,
}

impl Inference {
    /// Every fact that holds: seed facts, axioms, and derivations.
    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    /// The facts this run contributed, i.e. everything not already present
    /// in the seed.
    pub fn inferred(&self) -> &FactSet {
        &self.inferred
    }

    /// The schema after the run, including shapes the seed established.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All facts of one relation, in derivation order.
    pub fn relation(&self, name: &str) -> &[Fact] {
        self.facts.relation(name)
    }

    /// Total fixpoint passes across all strata.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Consumes the result, keeping the full fact set.
    pub fn into_facts(self) -> FactSet {
        self.facts
    }
}

/// Finds every binding set under which the rule fires against the store.
fn satisfy(rule: &Rule, known: &FactSet, interop: bool) -> Result<Vec<Bindings>> {
    let mut matches = Vec::new();
    join(rule, 0, Bindings::new(), known, interop, &mut matches)?;
    Ok(matches)
}

/// Left-to-right backtracking join over the positive body atoms. Once the
/// body is satisfied, constraints and negation decide whether the binding
/// set counts as a match.
fn join(
    rule: &Rule,
    index: usize,
    bindings: Bindings,
    known: &FactSet,
    interop: bool,
    out: &mut Vec<Bindings>,
) -> Result<()> {
    if index == rule.body().len() {
        if !rule
            .constraints()
            .iter()
            .all(|c| c.satisfied(&bindings, interop))
        {
            return Ok(());
        }
        if negation_blocks(rule, &bindings, known, interop)? {
            return Ok(());
        }
        out.push(bindings);
        return Ok(());
    }

    let atom = &rule.body()[index];
    if builtin::is_builtin(atom.relation()) {
        for fact in builtin::expand(atom, &bindings)? {
            let mut next = bindings.clone();
            if atom.matches(&fact, &mut next, interop)? {
                join(rule, index + 1, next, known, interop, out)?;
            }
        }
    } else {
        for fact in known.relation(atom.relation()) {
            let mut next = bindings.clone();
            if atom.matches(fact, &mut next, interop)? {
                join(rule, index + 1, next, known, interop, out)?;
            }
        }
    }
    Ok(())
}

/// Whether any stored fact matches a negated atom under the bindings.
fn negation_blocks(
    rule: &Rule,
    bindings: &Bindings,
    known: &FactSet,
    interop: bool,
) -> Result<bool> {
    for atom in rule.negated() {
        for fact in known.relation(atom.relation()) {
            let mut scratch = bindings.clone();
            if atom.matches(fact, &mut scratch, interop)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Turns a rule's matches into head facts, applying aggregation when the
/// head carries an aggregate term.
///
/// Matches are grouped by their binding set minus the aggregated variables;
/// each group folds into one fact. A group the aggregate function declines
/// (min or max over no numeric values) produces nothing.
fn materialize(rule: &Rule, matches: &[Bindings], schema: &Schema) -> Result<Vec<Fact>> {
    let head = rule.head_atom();
    let spec = match head.aggregate() {
        Some(spec) => spec,
        None => {
            return matches
                .iter()
                .map(|bindings| head.instantiate(bindings, None, schema))
                .collect();
        }
    };

    let mut groups: IndexMap<BTreeMap<String, Value>, Vec<Vec<Value>>> = IndexMap::new();
    for bindings in matches {
        let mut row = Vec::with_capacity(spec.vars.len());
        for var in &spec.vars {
            let value = bindings
                .get(var)
                .cloned()
                .ok_or_else(|| Error::UnboundHeadVariable {
                    rule: head.to_string(),
                    variable: var.clone(),
                })?;
            row.push(value);
        }
        let mut key: BTreeMap<String, Value> = bindings
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        for var in &spec.vars {
            key.remove(var);
        }
        groups.entry(key).or_default().push(row);
    }

    let mut facts = Vec::new();
    for (key, rows) in groups {
        let value = match spec.apply(&rows) {
            Some(value) => value,
            None => continue,
        };
        let mut bindings = Bindings::new();
        for (name, bound) in key {
            bindings.bind(name, bound);
        }
        facts.push(head.instantiate(&bindings, Some(&value), schema)?);
    }
    Ok(facts)
}
