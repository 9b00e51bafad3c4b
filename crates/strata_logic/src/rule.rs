//! Rules, constraints, and the validated rule set.
//!
//! A rule derives facts for its head relation from a conjunction of positive
//! body atoms, optionally filtered by negated atoms and comparison
//! constraints. Rules are assembled with a fluent builder and validated when
//! the enclosing [`RuleSet`] is built: every variable consumed by the head, a
//! negated atom, or a constraint must be bound by a positive body atom.

use crate::atom::Atom;
use crate::builtin;
use crate::error::{Error, Result};
use crate::strata;
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use strata_facts::{Schema, Shape, Value};

/// A set of variable-to-value bindings accumulated while matching a rule
/// body against the fact store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable to a value, replacing any previous binding.
    pub fn bind(&mut self, variable: String, value: Value) {
        self.values.insert(variable, value);
    }

    /// Returns the value bound to a variable, if any.
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.values.get(variable)
    }

    /// Whether the variable is bound.
    pub fn is_bound(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    /// Iterates all bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The comparison operators a constraint can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Whether an ordering between two comparable values satisfies this
    /// operator.
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// A comparison between a bound variable and a constant or another bound
/// variable.
///
/// Comparisons are defined within the numeric class (integers and floats,
/// widened as needed) and within the textual class (symbols and strings, by
/// canonical name). Any comparison across classes, or involving a boolean
/// or a collection, is simply unsatisfied; it never raises an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    variable: String,
    op: CompareOp,
    term: Term,
}

impl Constraint {
    pub fn new(variable: impl Into<String>, op: CompareOp, term: impl Into<Term>) -> Self {
        Self {
            variable: variable.into(),
            op,
            term: term.into(),
        }
    }

    /// The left-hand variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The right-hand term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Evaluates the constraint under a binding set.
    pub fn satisfied(&self, bindings: &Bindings, interop: bool) -> bool {
        let lhs = match bindings.get(&self.variable) {
            Some(value) => value,
            None => return false,
        };
        let rhs = match &self.term {
            Term::Constant(value) => value,
            Term::Variable(name) => match bindings.get(name) {
                Some(value) => value,
                None => return false,
            },
            _ => return false,
        };
        if lhs.is_number() && rhs.is_number() {
            match lhs.numeric_cmp(rhs) {
                Some(ordering) => self.op.holds(ordering),
                None => false,
            }
        } else if lhs.is_text() && rhs.is_text() {
            match self.op {
                // Equality respects the symbol/string interop setting.
                CompareOp::Eq => lhs.matches(rhs, interop),
                CompareOp::Ne => !lhs.matches(rhs, interop),
                op => match lhs.text_cmp(rhs) {
                    Some(ordering) => op.holds(ordering),
                    None => false,
                },
            }
        } else {
            false
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.op, self.term)
    }
}

/// A single inference rule.
///
/// # Examples
///
/// ```
/// use strata_logic::{Atom, Rule, Term};
///
/// // Ancestor(x, y) :- Parent(x, z), Ancestor(z, y).
/// let rule = Rule::head(Atom::ordered("Ancestor", [Term::var("x"), Term::var("y")]))
///     .when(Atom::ordered("Parent", [Term::var("x"), Term::var("z")]))
///     .when(Atom::ordered("Ancestor", [Term::var("z"), Term::var("y")]))
///     .build();
/// assert_eq!(rule.head_atom().relation(), "Ancestor");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    head: Atom,
    body: Vec<Atom>,
    negated: Vec<Atom>,
    constraints: Vec<Constraint>,
}

impl Rule {
    /// Starts building a rule with the given head atom.
    pub fn head(atom: Atom) -> RuleBuilder {
        RuleBuilder {
            head: atom,
            body: Vec::new(),
            negated: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// The head atom.
    pub fn head_atom(&self) -> &Atom {
        &self.head
    }

    /// The positive body atoms, in evaluation order.
    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    /// The negated atoms.
    pub fn negated(&self) -> &[Atom] {
        &self.negated
    }

    /// The comparison constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Checks the rule's internal safety conditions.
    ///
    /// Every head, negation, and constraint variable must be bound by a
    /// positive body atom; at most one aggregate may appear, and only in the
    /// head; built-in predicates may only appear as positive body atoms with
    /// the right arity and a collection argument that is ground by the time
    /// it is reached.
    pub fn validate(&self) -> Result<()> {
        let name = self.head.to_string();

        if builtin::is_builtin(self.head.relation()) {
            return Err(Error::ReservedRelation {
                rule: name,
                relation: self.head.relation().to_string(),
            });
        }
        for atom in &self.negated {
            if builtin::is_builtin(atom.relation()) {
                return Err(Error::ReservedRelation {
                    rule: name,
                    relation: atom.relation().to_string(),
                });
            }
        }

        if self.head.aggregate_count() > 1 {
            return Err(Error::MultipleAggregates { rule: name });
        }
        if let Some(spec) = self.head.aggregate() {
            let expected = spec.func.variable_count();
            if spec.vars.len() != expected {
                return Err(Error::MalformedAggregate {
                    rule: name,
                    detail: format!(
                        "{} takes {} variable(s), found {}",
                        spec.func,
                        expected,
                        spec.vars.len()
                    ),
                });
            }
        }
        for atom in self.body.iter().chain(&self.negated) {
            if atom.aggregate().is_some() {
                return Err(Error::MisplacedAggregate { rule: name });
            }
        }

        for term in self.head.terms() {
            if let Term::Wildcard(wildcard) = term {
                return Err(Error::UnboundHeadVariable {
                    rule: name,
                    variable: wildcard.clone(),
                });
            }
        }

        // Walk the body in evaluation order, tracking which variables are
        // bound so built-in collection arguments can be checked.
        let mut bound: HashSet<&str> = HashSet::new();
        for atom in &self.body {
            if builtin::is_builtin(atom.relation()) {
                self.validate_builtin(atom, &bound, &name)?;
            }
            for variable in atom.variables() {
                bound.insert(variable);
            }
        }

        for variable in self.head.variables() {
            if !bound.contains(variable) {
                return Err(Error::UnboundHeadVariable {
                    rule: name,
                    variable: variable.to_string(),
                });
            }
        }
        if let Some(spec) = self.head.aggregate() {
            for variable in &spec.vars {
                if !bound.contains(variable.as_str()) {
                    return Err(Error::UnboundHeadVariable {
                        rule: name,
                        variable: variable.clone(),
                    });
                }
            }
        }
        for atom in &self.negated {
            for variable in atom.variables() {
                if !bound.contains(variable) {
                    return Err(Error::UnboundNegationVariable {
                        rule: name,
                        variable: variable.to_string(),
                    });
                }
            }
        }
        for constraint in &self.constraints {
            if !bound.contains(constraint.variable()) {
                return Err(Error::UnboundConstraintVariable {
                    rule: name,
                    variable: constraint.variable().to_string(),
                });
            }
            match constraint.term() {
                Term::Constant(_) => {}
                Term::Variable(variable) => {
                    if !bound.contains(variable.as_str()) {
                        return Err(Error::UnboundConstraintVariable {
                            rule: name,
                            variable: variable.clone(),
                        });
                    }
                }
                _ => {
                    return Err(Error::MalformedConstraint {
                        rule: name,
                        constraint: constraint.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    fn validate_builtin(&self, atom: &Atom, bound: &HashSet<&str>, rule: &str) -> Result<()> {
        let relation = atom.relation();
        let expected = builtin::arity(relation).unwrap_or(0);
        let ordered = matches!(atom, Atom::Ordered { .. });
        if !ordered || atom.arity() != expected {
            return Err(Error::MalformedBuiltin {
                relation: relation.to_string(),
                expected,
                found: atom.arity(),
            });
        }
        let position = builtin::collection_position(relation).unwrap_or(0);
        let collection = atom
            .terms()
            .nth(position)
            .ok_or_else(|| Error::MalformedBuiltin {
                relation: relation.to_string(),
                expected,
                found: atom.arity(),
            })?;
        match collection {
            Term::Constant(_) => Ok(()),
            Term::Variable(variable) if bound.contains(variable.as_str()) => Ok(()),
            Term::Variable(variable) => Err(Error::UnboundCollection {
                rule: rule.to_string(),
                variable: variable.clone(),
            }),
            Term::Wildcard(wildcard) => Err(Error::UnboundCollection {
                rule: rule.to_string(),
                variable: wildcard.clone(),
            }),
            Term::Aggregate(_) => Err(Error::MisplacedAggregate {
                rule: rule.to_string(),
            }),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- ", self.head)?;
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if first {
                first = false;
                Ok(())
            } else {
                write!(f, ", ")
            }
        };
        for atom in &self.body {
            sep(f)?;
            write!(f, "{}", atom)?;
        }
        for atom in &self.negated {
            sep(f)?;
            write!(f, "not {}", atom)?;
        }
        for constraint in &self.constraints {
            sep(f)?;
            write!(f, "{}", constraint)?;
        }
        write!(f, ".")
    }
}

/// Fluent builder for a [`Rule`], started with [`Rule::head`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    head: Atom,
    body: Vec<Atom>,
    negated: Vec<Atom>,
    constraints: Vec<Constraint>,
}

impl RuleBuilder {
    /// Adds a positive body atom.
    pub fn when(mut self, atom: Atom) -> Self {
        self.body.push(atom);
        self
    }

    /// Adds a negated atom: the rule only fires when no stored fact matches
    /// it under the current bindings.
    pub fn when_not(mut self, atom: Atom) -> Self {
        self.negated.push(atom);
        self
    }

    /// Adds a comparison constraint.
    pub fn filter(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Shorthand for `filter(Constraint::new(..))`.
    pub fn check(self, variable: impl Into<String>, op: CompareOp, term: impl Into<Term>) -> Self {
        self.filter(Constraint::new(variable, op, term))
    }

    /// Finishes the rule. Safety conditions are checked when the rule set
    /// is built.
    pub fn build(self) -> Rule {
        Rule {
            head: self.head,
            body: self.body,
            negated: self.negated,
            constraints: self.constraints,
        }
    }
}

/// A validated, stratified collection of axioms and rules sharing one
/// schema.
///
/// Construction performs all static checking: schema conformance of every
/// axiom and every atom, per-rule safety validation, and stratification of
/// the rule dependency graph. An unstratifiable rule set still builds, so
/// callers can inspect it, but [`RuleSet::is_stratified`] reports `false`
/// and inference refuses to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    schema: Schema,
    axioms: Vec<Atom>,
    rules: Vec<Rule>,
    strata: Option<Vec<Vec<String>>>,
    unstratifiable: Option<String>,
}

impl RuleSet {
    /// Starts building a rule set.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// The schema established from declared shapes, axioms, and rules.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The ground axiom atoms.
    pub fn axioms(&self) -> &[Atom] {
        &self.axioms
    }

    /// The rules, in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether a valid stratification exists.
    pub fn is_stratified(&self) -> bool {
        self.strata.is_some()
    }

    /// The strata as buckets of head relation names, lowest first. `None`
    /// when the rule set is unstratifiable.
    pub fn strata(&self) -> Option<&[Vec<String>]> {
        self.strata.as_deref()
    }

    /// A relation involved in recursion through negation, when
    /// stratification failed.
    pub fn unstratifiable_relation(&self) -> Option<&str> {
        self.unstratifiable.as_deref()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for a [`RuleSet`].
#[derive(Debug, Clone, Default)]
pub struct RuleSetBuilder {
    shapes: Vec<(String, Shape)>,
    axioms: Vec<Atom>,
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    /// Declares a relation's shape up front, instead of letting the first
    /// use establish it. This is how `Pair` relations are introduced.
    pub fn shape(mut self, relation: impl Into<String>, shape: Shape) -> Self {
        self.shapes.push((relation.into(), shape));
        self
    }

    /// Adds a ground axiom.
    pub fn axiom(mut self, atom: Atom) -> Self {
        self.axioms.push(atom);
        self
    }

    /// Adds a rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validates everything and produces the rule set.
    pub fn build(self) -> Result<RuleSet> {
        let mut schema = Schema::new();
        for (relation, shape) in &self.shapes {
            schema.check_shape(relation, shape.clone())?;
        }

        for axiom in &self.axioms {
            if builtin::is_builtin(axiom.relation()) {
                return Err(Error::ReservedRelation {
                    rule: axiom.to_string(),
                    relation: axiom.relation().to_string(),
                });
            }
            if !axiom.is_ground() {
                return Err(Error::NonGroundAxiom {
                    atom: axiom.to_string(),
                });
            }
            register_use(&mut schema, axiom)?;
        }

        for rule in &self.rules {
            rule.validate()?;
            register_head(&mut schema, rule.head_atom())?;
            for atom in rule.body().iter().chain(rule.negated()) {
                if builtin::is_builtin(atom.relation()) {
                    continue;
                }
                register_use(&mut schema, atom)?;
            }
        }

        let (strata, unstratifiable) = match strata::stratify(&self.rules) {
            Ok(strata) => {
                log::debug!("rule set stratified into {} strata", strata.len());
                (Some(strata), None)
            }
            Err(relation) => {
                log::warn!(
                    "rule set is not stratifiable: negation cycle through '{}'",
                    relation
                );
                (None, Some(relation))
            }
        };
        if let Some(strata) = &strata {
            warn_on_recursive_aggregates(&self.rules, strata);
        }

        Ok(RuleSet {
            schema,
            axioms: self.axioms,
            rules: self.rules,
            strata,
            unstratifiable,
        })
    }
}

/// An aggregate head reading a relation in its own stratum folds its own
/// earlier output into every later pass, so the stratum's fixpoint can
/// grow without bound. The rule set still builds; callers evaluating one
/// need [`Engine::set_max_passes`](crate::Engine::set_max_passes).
fn warn_on_recursive_aggregates(rules: &[Rule], strata: &[Vec<String>]) {
    for rule in rules {
        if rule.head_atom().aggregate().is_none() {
            continue;
        }
        let head = rule.head_atom().relation();
        let level = match strata
            .iter()
            .position(|bucket| bucket.iter().any(|r| r == head))
        {
            Some(level) => level,
            None => continue,
        };
        let recursive = rule
            .body()
            .iter()
            .any(|atom| strata[level].iter().any(|r| r == atom.relation()));
        if recursive {
            log::warn!(
                "rule '{}' aggregates over its own stratum and may not reach a fixpoint without a pass cap",
                rule.head_atom()
            );
        }
    }
}

/// Records or verifies an atom's use of its relation in the schema.
fn register_use(schema: &mut Schema, atom: &Atom) -> Result<()> {
    match atom {
        Atom::Ordered { relation, terms } => schema.check_ordered_use(relation, terms.len())?,
        Atom::Named { relation, .. } => schema.check_named_use(relation, &atom.field_names())?,
    }
    Ok(())
}

/// Like [`register_use`], but a named head over a pair relation must supply
/// every declared field, since the head materializes complete facts.
fn register_head(schema: &mut Schema, atom: &Atom) -> Result<()> {
    register_use(schema, atom)?;
    if let Atom::Named { relation, fields } = atom {
        if let Some(Shape::Pair { fields: declared }) = schema.get(relation) {
            if !declared.iter().all(|name| fields.contains_key(name)) {
                return Err(Error::Shape(strata_facts::Error::ShapeMismatch {
                    relation: relation.clone(),
                    expected: Shape::Pair {
                        fields: declared.clone(),
                    },
                    found: Shape::Pair {
                        fields: atom.field_names(),
                    },
                }));
            }
        }
    }
    Ok(())
}
