//! Strata Logic - a stratified rule engine with negation and aggregation.
//!
//! This crate evaluates Datalog-style rule sets over the ground facts
//! defined in `strata_facts`. Rule sets are validated and stratified at
//! construction; inference then runs each stratum to a fixpoint, from the
//! lowest up, so negation-as-failure and aggregation always read completed
//! lower strata.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    strata_logic                     │
//! ├─────────────────────────────────────────────────────┤
//! │  Term / Atom    patterns over relations             │
//! │  Rule           head :- body, not ..., constraints  │
//! │  RuleSet        validation + schema + strata        │
//! │  DependencyGraph  signed edges, stratum numbers     │
//! │  builtin        member / indexed_member / keyed_…   │
//! │  AggregateSpec  sum min max list set map            │
//! │  Engine         per-stratum fixpoint evaluation     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!              strata_facts (values, facts,
//!               shapes, schema, fact store)
//! ```
//!
//! # Example
//!
//! ```
//! use strata_logic::{Atom, Engine, Rule, RuleSet, Term};
//! use strata_facts::Value;
//!
//! // Ancestor is the transitive closure of Parent.
//! let rules = RuleSet::builder()
//!     .axiom(Atom::ground("Parent", [Value::symbol("walker"), Value::symbol("bert")]))
//!     .axiom(Atom::ground("Parent", [Value::symbol("bert"), Value::symbol("hazel")]))
//!     .rule(
//!         Rule::head(Atom::ordered("Ancestor", [Term::var("x"), Term::var("y")]))
//!             .when(Atom::ordered("Parent", [Term::var("x"), Term::var("y")]))
//!             .build(),
//!     )
//!     .rule(
//!         Rule::head(Atom::ordered("Ancestor", [Term::var("x"), Term::var("y")]))
//!             .when(Atom::ordered("Parent", [Term::var("x"), Term::var("z")]))
//!             .when(Atom::ordered("Ancestor", [Term::var("z"), Term::var("y")]))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let result = Engine::new(rules).infer().unwrap();
//! assert_eq!(result.relation("Ancestor").len(), 3);
//! ```

pub mod aggregate;
pub mod atom;
pub mod builtin;
pub mod engine;
pub mod error;
pub mod rule;
pub mod strata;
pub mod term;

// Re-exports
pub use aggregate::{AggregateFn, AggregateSpec, DUPLICATE_KEY};
pub use atom::Atom;
pub use engine::{Engine, Inference};
pub use error::{Error, Result};
pub use rule::{Bindings, CompareOp, Constraint, Rule, RuleBuilder, RuleSet, RuleSetBuilder};
pub use strata::DependencyGraph;
pub use term::Term;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
