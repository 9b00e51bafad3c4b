//! Aggregate functions over grouped rule matches.
//!
//! An aggregate term in a rule head folds the body's matches into a single
//! value per group. The group key is the match's binding set with the
//! aggregated variable(s) removed, so every remaining variable acts as a
//! group-by column.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_facts::Value;

/// Canonical name of the sentinel written when a `map` aggregate sees the
/// same key with two different values.
pub const DUPLICATE_KEY: &str = "duplicate-key";

/// The sentinel value a `map` aggregate stores for conflicting keys.
pub fn duplicate_key() -> Value {
    Value::symbol(DUPLICATE_KEY)
}

/// The aggregate functions a rule head may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFn {
    /// Numeric sum; an empty group yields integer zero.
    Sum,
    /// Numeric minimum; a group with no numeric values yields nothing.
    Min,
    /// Numeric maximum; a group with no numeric values yields nothing.
    Max,
    /// All values in encounter order, duplicates kept.
    List,
    /// Distinct values in first-encounter order.
    Set,
    /// Key/value pairs folded into a map value.
    Map,
}

impl AggregateFn {
    /// How many variables the aggregate folds over.
    pub fn variable_count(&self) -> usize {
        match self {
            Self::Map => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
        };
        write!(f, "{}", name)
    }
}

/// An aggregate function applied to one or two body variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub func: AggregateFn,
    pub vars: Vec<String>,
}

impl AggregateSpec {
    pub fn new(func: AggregateFn, vars: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            func,
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sum(var: impl Into<String>) -> Self {
        Self::new(AggregateFn::Sum, [var])
    }

    pub fn min(var: impl Into<String>) -> Self {
        Self::new(AggregateFn::Min, [var])
    }

    pub fn max(var: impl Into<String>) -> Self {
        Self::new(AggregateFn::Max, [var])
    }

    pub fn list(var: impl Into<String>) -> Self {
        Self::new(AggregateFn::List, [var])
    }

    pub fn set(var: impl Into<String>) -> Self {
        Self::new(AggregateFn::Set, [var])
    }

    pub fn map(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(AggregateFn::Map, [key.into(), value.into()])
    }

    /// Folds one group's rows into the aggregate value.
    ///
    /// Each row holds the aggregated variables' values for one match, in
    /// `vars` order. Returns `None` when the function produces no fact for
    /// this group (`min`/`max` over a group with no numeric values).
    pub fn apply(&self, rows: &[Vec<Value>]) -> Option<Value> {
        match self.func {
            AggregateFn::Sum => Some(sum(rows.iter().map(|r| &r[0]))),
            AggregateFn::Min => best(rows.iter().map(|r| &r[0]), std::cmp::Ordering::Less),
            AggregateFn::Max => best(rows.iter().map(|r| &r[0]), std::cmp::Ordering::Greater),
            AggregateFn::List => Some(Value::List(rows.iter().map(|r| r[0].clone()).collect())),
            AggregateFn::Set => {
                let distinct: IndexSet<Value> = rows.iter().map(|r| r[0].clone()).collect();
                Some(Value::List(distinct.into_iter().collect()))
            }
            AggregateFn::Map => {
                let mut out: IndexMap<Value, Value> = IndexMap::new();
                for row in rows {
                    let (key, value) = (row[0].clone(), row[1].clone());
                    match out.get(&key) {
                        None => {
                            out.insert(key, value);
                        }
                        Some(existing) if *existing == value => {}
                        Some(_) => {
                            out.insert(key, duplicate_key());
                        }
                    }
                }
                Some(Value::Map(out))
            }
        }
    }
}

impl fmt::Display for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.func, self.vars.join(", "))
    }
}

/// Sums the numeric values, skipping non-numbers. Stays integer unless a
/// float appears; an empty or all-skipped input sums to integer zero.
fn sum<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut saw_float = false;
    for value in values {
        match value {
            Value::Integer(i) => {
                int_total += i;
                float_total += *i as f64;
            }
            Value::Float(x) => {
                saw_float = true;
                float_total += x;
            }
            _ => {}
        }
    }
    if saw_float {
        Value::Float(float_total)
    } else {
        Value::Integer(int_total)
    }
}

/// Picks the numeric value winning every comparison in `direction`,
/// preserving its original integer/float variant. `None` when no value in
/// the group is numeric.
fn best<'a>(values: impl Iterator<Item = &'a Value>, direction: std::cmp::Ordering) -> Option<Value> {
    let mut winner: Option<&Value> = None;
    for value in values {
        if !value.is_number() {
            continue;
        }
        winner = match winner {
            None => Some(value),
            Some(current) => match value.numeric_cmp(current) {
                Some(ord) if ord == direction => Some(value),
                _ => Some(current),
            },
        };
    }
    winner.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[Value]) -> Vec<Vec<Value>> {
        values.iter().map(|v| vec![v.clone()]).collect()
    }

    #[test]
    fn test_sum_stays_integer() {
        let spec = AggregateSpec::sum("x");
        let result = spec.apply(&rows(&[Value::integer(1), Value::integer(2)]));
        assert_eq!(result, Some(Value::integer(3)));
    }

    #[test]
    fn test_sum_widens_on_float() {
        let spec = AggregateSpec::sum("x");
        let result = spec.apply(&rows(&[Value::integer(1), Value::float(0.5)]));
        assert_eq!(result, Some(Value::float(1.5)));
    }

    #[test]
    fn test_sum_skips_non_numeric_and_defaults_to_zero() {
        let spec = AggregateSpec::sum("x");
        let result = spec.apply(&rows(&[Value::symbol("pen")]));
        assert_eq!(result, Some(Value::integer(0)));
        assert_eq!(spec.apply(&[]), Some(Value::integer(0)));
    }

    #[test]
    fn test_min_max_keep_variant() {
        let values = [Value::integer(3), Value::float(1.5), Value::integer(7)];
        assert_eq!(
            AggregateSpec::min("x").apply(&rows(&values)),
            Some(Value::float(1.5))
        );
        assert_eq!(
            AggregateSpec::max("x").apply(&rows(&values)),
            Some(Value::integer(7))
        );
    }

    #[test]
    fn test_min_over_non_numeric_group_yields_nothing() {
        let spec = AggregateSpec::min("x");
        assert_eq!(spec.apply(&rows(&[Value::symbol("pen")])), None);
    }

    #[test]
    fn test_list_keeps_duplicates_set_drops_them() {
        let values = [Value::integer(1), Value::integer(2), Value::integer(1)];
        assert_eq!(
            AggregateSpec::list("x").apply(&rows(&values)),
            Some(Value::list([
                Value::integer(1),
                Value::integer(2),
                Value::integer(1)
            ]))
        );
        assert_eq!(
            AggregateSpec::set("x").apply(&rows(&values)),
            Some(Value::list([Value::integer(1), Value::integer(2)]))
        );
    }

    #[test]
    fn test_map_flags_conflicting_keys() {
        let spec = AggregateSpec::map("k", "v");
        let rows = vec![
            vec![Value::symbol("a"), Value::integer(1)],
            vec![Value::symbol("b"), Value::integer(2)],
            vec![Value::symbol("a"), Value::integer(3)],
        ];
        let result = spec.apply(&rows).unwrap();
        let map = result.as_map().unwrap();
        assert_eq!(map.get(&Value::symbol("a")), Some(&duplicate_key()));
        assert_eq!(map.get(&Value::symbol("b")), Some(&Value::integer(2)));
    }

    #[test]
    fn test_map_tolerates_repeated_identical_pairs() {
        let spec = AggregateSpec::map("k", "v");
        let rows = vec![
            vec![Value::symbol("a"), Value::integer(1)],
            vec![Value::symbol("a"), Value::integer(1)],
        ];
        let result = spec.apply(&rows).unwrap();
        let map = result.as_map().unwrap();
        assert_eq!(map.get(&Value::symbol("a")), Some(&Value::integer(1)));
    }
}
