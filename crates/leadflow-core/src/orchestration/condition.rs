//! Structured condition evaluation for CONDITIONAL steps.
//!
//! Each clause resolves its `field` by dotted-path lookup in the run
//! context and applies a typed operator. Clauses combine left to right:
//! AND by default, OR when the clause says so, short-circuiting on the
//! first OR-true or the first AND-false. Missing data never raises -- a
//! clause over an absent field is simply false.

use regex::Regex;
use serde_json::Value;

use leadflow_types::orchestration::{Condition, ConditionLogic, ConditionOperator};

use super::context::RunContext;

/// Evaluate a clause list against the context. Empty lists are vacuously
/// true.
pub fn evaluate_conditions(conditions: &[Condition], ctx: &RunContext) -> bool {
    let mut saw_and_clause = false;
    for condition in conditions {
        let met = evaluate_condition(condition, ctx);
        match condition.logic {
            Some(ConditionLogic::Or) => {
                if met {
                    return true;
                }
            }
            _ => {
                if !met {
                    return false;
                }
                saw_and_clause = true;
            }
        }
    }
    // Every AND clause held and no OR clause fired. A list of only OR
    // clauses that all missed is false.
    conditions.is_empty() || saw_and_clause
}

/// Evaluate a single clause.
pub fn evaluate_condition(condition: &Condition, ctx: &RunContext) -> bool {
    let Some(actual) = ctx.get_path(&condition.field) else {
        return false;
    };
    apply_operator(condition.operator, actual, &condition.value)
}

fn apply_operator(operator: ConditionOperator, actual: &Value, expected: &Value) -> bool {
    match operator {
        ConditionOperator::Eq => values_equal(actual, expected),
        ConditionOperator::Ne => !values_equal(actual, expected),
        ConditionOperator::Gt => compare_ordering(actual, expected, |o| o.is_gt()),
        ConditionOperator::Gte => compare_ordering(actual, expected, |o| o.is_ge()),
        ConditionOperator::Lt => compare_ordering(actual, expected, |o| o.is_lt()),
        ConditionOperator::Lte => compare_ordering(actual, expected, |o| o.is_le()),
        ConditionOperator::In => match expected {
            Value::Array(haystack) => haystack.iter().any(|item| values_equal(actual, item)),
            _ => false,
        },
        ConditionOperator::NotIn => match expected {
            Value::Array(haystack) => !haystack.iter().any(|item| values_equal(actual, item)),
            _ => false,
        },
        ConditionOperator::Contains => contains(actual, expected),
        ConditionOperator::NotContains => match actual {
            Value::String(_) | Value::Array(_) => !contains(actual, expected),
            _ => false,
        },
        ConditionOperator::Regex => match (actual.as_str(), expected.as_str()) {
            (Some(subject), Some(pattern)) => Regex::new(pattern)
                .map(|re| re.is_match(subject))
                .unwrap_or(false),
            _ => false,
        },
    }
}

/// Equality with numeric widening, so `50` and `50.0` compare equal.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare_ordering(
    actual: &Value,
    expected: &Value,
    check: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    let ordering = match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    ordering.map(&check).unwrap_or(false)
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(subject) => expected
            .as_str()
            .map(|needle| subject.contains(needle))
            .unwrap_or(false),
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}
