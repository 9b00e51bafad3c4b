//! Strata Facts - ground data model for the Strata rule engine.
//!
//! This crate defines the value and fact types the engine infers over, the
//! shape/schema layer that keeps every relation on one consistent layout,
//! and the relation-indexed fact store used as working memory and result.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 strata_facts                   │
//! ├────────────────────────────────────────────────┤
//! │  Value      scalars and collections            │
//! │  Fact       List / Map / Pair layouts          │
//! │  Shape      per-relation structural contract   │
//! │  Schema     first-use inference + validation   │
//! │  FactSet    dedup store + relation index       │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use strata_facts::{Fact, FactSet, Schema, Value};
//!
//! let mut schema = Schema::new();
//! let mut facts = FactSet::new();
//!
//! let fact = Fact::list("Parent", [Value::symbol("walker"), Value::symbol("bert")]);
//! schema.check_fact(&fact).unwrap();
//! facts.add(fact);
//!
//! assert_eq!(facts.relation("Parent").len(), 1);
//! ```

pub mod error;
pub mod fact;
pub mod shape;
pub mod store;
pub mod value;

// Re-exports
pub use error::{Error, Result};
pub use fact::Fact;
pub use shape::{Schema, Shape};
pub use store::FactSet;
pub use value::Value;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
