//! `Condition`: grouped boolean logic over form data
//!
//! Params hold an ordered list of condition groups. Conditions inside a
//! group are folded with the group's `joinInside` logic, and group results
//! are folded left to right with each group's `joinWithPrev` logic.
//!
//! Folding is three-valued: a condition with no field or no operator yields
//! no value and is left out. A fold over nothing yields no value, which the
//! calculable reports as `null`.
//!
//! ```text
//! a       logic  result
//! none    any    b
//! false   and    false        (b not evaluated)
//! true    or     true         (b not evaluated)
//! true    nor    false        (b not evaluated)
//! a       any    a when b is none, else a <logic> b
//! ```

use form_core::schema::SchemaBuilder;
use form_core::{CalculableClass, CalculateContext, FormData, MutationError, MutationTree, Payload, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Logic joining a running result with the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
    Nor,
}

/// Comparison of one field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "is-empty")]
    IsEmpty,
}

/// `[fieldId, operator, compareValue]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition(pub Option<String>, pub Option<Operator>, pub Value);

impl Default for Condition {
    fn default() -> Self {
        Condition(None, Some(Operator::Eq), Value::Null)
    }
}

impl Condition {
    pub fn new(field_id: impl Into<String>, operator: Operator, value: Value) -> Self {
        Condition(Some(field_id.into()), Some(operator), value)
    }

    /// Result against `data`; `None` when the field or operator is unset
    pub fn evaluate(&self, data: &FormData) -> Option<bool> {
        let Condition(field, operator, expected) = self;
        let field = field.as_deref().filter(|f| !f.is_empty())?;
        let actual = data.get(field).unwrap_or(&Value::Null);

        Some(match (*operator)? {
            Operator::Eq => loose_eq(actual, expected),
            Operator::NotEq => !loose_eq(actual, expected),
            Operator::IsEmpty => is_empty(actual),
        })
    }
}

/// One group of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub join_with_prev: Logic,
    pub join_inside: Logic,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Default for ConditionGroup {
    fn default() -> Self {
        Self {
            join_with_prev: Logic::And,
            join_inside: Logic::Or,
            conditions: vec![Condition::default()],
        }
    }
}

impl ConditionGroup {
    /// Fold of the group's conditions with `join_inside`
    pub fn evaluate(&self, data: &FormData) -> Option<bool> {
        self.conditions
            .iter()
            .fold(None, |acc, cond| join_condition(acc, self.join_inside, || cond.evaluate(data)))
    }
}

/// Params of the `Condition` calculable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionParams {
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    /// Keys this calculable does not interpret, kept as stored
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ConditionParams {
    /// Fold of the group results with each group's `join_with_prev`
    pub fn evaluate(&self, data: &FormData) -> Option<bool> {
        self.condition_groups
            .iter()
            .fold(None, |acc, group| join_condition(acc, group.join_with_prev, || group.evaluate(data)))
    }

    fn group_mut(&mut self, index: usize) -> std::result::Result<&mut ConditionGroup, MutationError> {
        self.condition_groups
            .get_mut(index)
            .ok_or(MutationError::IndexOutOfRange {
                what: "condition group",
                index,
            })
    }

    fn condition_mut(&mut self, group: usize, index: usize) -> std::result::Result<&mut Condition, MutationError> {
        self.group_mut(group)?
            .conditions
            .get_mut(index)
            .ok_or(MutationError::IndexOutOfRange { what: "condition", index })
    }
}

/// Combine the running value `a` with a lazily computed `b`
pub fn join_condition(a: Option<bool>, logic: Logic, compute_b: impl FnOnce() -> Option<bool>) -> Option<bool> {
    let Some(a) = a else {
        return compute_b();
    };

    match (logic, a) {
        (Logic::And, false) => Some(false),
        (Logic::Or, true) => Some(true),
        (Logic::Nor, true) => Some(false),
        _ => Some(match compute_b() {
            None => a,
            Some(b) => match logic {
                Logic::And => a && b,
                Logic::Or => a || b,
                Logic::Nor => !(a || b),
            },
        }),
    }
}

/// Numeric view used when a number meets a string or a boolean
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality across scalar kinds: `"18"` equals `18`, `true` equals `1`
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(_) | Value::Bool(_), Value::Number(_) | Value::String(_) | Value::Bool(_))
        | (Value::String(_), Value::Number(_) | Value::Bool(_)) => {
            matches!((as_number(a), as_number(b)), (Some(x), Some(y)) if x == y)
        }
        _ => a == b,
    }
}

/// Null, missing, blank string or empty list; `0` and `false` are values
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn calculate(ctx: &CalculateContext<'_>) -> Value {
    match serde_json::from_value::<ConditionParams>(ctx.params.clone()) {
        Ok(params) => params.evaluate(ctx.data).map_or(Value::Null, Value::Bool),
        Err(e) => {
            tracing::warn!(error = %e, "condition params are malformed");
            Value::Null
        }
    }
}

fn mutations() -> MutationTree {
    type P = ConditionParams;

    MutationTree::new()
        .typed_mutation::<P, _>("addConditionGroup", |p, args| {
            let group: Option<ConditionGroup> = args.arg(0)?;
            p.condition_groups.push(group.unwrap_or_default());
            Ok(())
        })
        .typed_mutation::<P, _>("addCondition", |p, args| {
            p.group_mut(args.arg(0)?)?.conditions.push(Condition::default());
            Ok(())
        })
        .typed_mutation::<P, _>("removeCondition", |p, args: &Payload| {
            let group: usize = args.arg(0)?;
            let index: usize = args.arg(1)?;
            let conditions = &mut p.group_mut(group)?.conditions;
            if index >= conditions.len() {
                return Err(MutationError::IndexOutOfRange { what: "condition", index });
            }
            conditions.remove(index);
            if conditions.is_empty() {
                p.condition_groups.remove(group);
            }
            Ok(())
        })
        .typed_mutation::<P, _>("setCompareValue", |p, args| {
            p.condition_mut(args.arg(0)?, args.arg(1)?)?.2 = args.arg(2)?;
            Ok(())
        })
        .typed_mutation::<P, _>("setCompareField", |p, args| {
            p.condition_mut(args.arg(0)?, args.arg(1)?)?.0 = args.arg(2)?;
            Ok(())
        })
        .typed_mutation::<P, _>("setOutsideLogic", |p, args| {
            p.group_mut(args.arg(0)?)?.join_with_prev = args.arg(1)?;
            Ok(())
        })
        .typed_mutation::<P, _>("setInsideLogic", |p, args| {
            p.group_mut(args.arg(0)?)?.join_inside = args.arg(1)?;
            Ok(())
        })
        .typed_mutation::<P, _>("setOperator", |p, args| {
            let operator: Operator = args.arg(2)?;
            let condition = p.condition_mut(args.arg(0)?, args.arg(1)?)?;
            condition.1 = Some(operator);
            if operator == Operator::IsEmpty {
                condition.2 = Value::Null;
            }
            Ok(())
        })
}

/// `Condition` class; programmatic schemas start with no groups
pub fn condition_class(programmatic: bool) -> CalculableClass {
    let initial = if programmatic {
        ConditionParams::default()
    } else {
        ConditionParams {
            condition_groups: vec![ConditionGroup::default()],
            ..ConditionParams::default()
        }
    };
    let initial = serde_json::to_value(initial).unwrap_or_else(|_| json!({"conditionGroups": []}));
    CalculableClass::new("boolean", initial, calculate).mutations(mutations())
}

pub fn calculable_condition(builder: &mut SchemaBuilder) -> Result<()> {
    let class = condition_class(builder.is_programmatic());
    builder.calculable("Condition", class)?;
    Ok(())
}
