//! `Summation`: total of every numeric input of visible fields

use form_core::schema::SchemaBuilder;
use form_core::{CalculableClass, CalculateContext, Result};
use serde_json::{json, Value};

/// Numeric reading of an input value
///
/// Blank strings and null count as zero; lists, objects and non-numeric
/// strings have no numeric reading.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn calculate(ctx: &CalculateContext<'_>) -> Value {
    let total: f64 = ctx
        .data
        .iter()
        .filter(|(id, _)| !ctx.descriptor.field(id).is_some_and(|f| f.hidden))
        .filter_map(|(_, value)| numeric(value))
        .sum();
    json!(total)
}

pub fn summation_class() -> CalculableClass {
    CalculableClass::new("number", json!({}), calculate)
}

pub fn calculable_summation(builder: &mut SchemaBuilder) -> Result<()> {
    builder.calculable("Summation", summation_class())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::{FieldEntry, FormData, FormDescriptor};
    use std::sync::Arc;

    #[test]
    fn test_sums_visible_numeric_values() {
        let mut descriptor = FormDescriptor::new("1");
        let fields = Arc::make_mut(&mut descriptor.fields);
        fields.insert("a".into(), FieldEntry::new("X", Arc::new(json!({}))));
        let mut hidden = FieldEntry::new("X", Arc::new(json!({})));
        hidden.hidden = true;
        fields.insert("h".into(), hidden);

        let data: FormData = [
            ("a", json!(2)),
            ("h", json!(100)),
            ("s", json!(" 3.5 ")),
            ("t", json!("abc")),
            ("l", json!([1, 2])),
            ("n", Value::Null),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let params = json!({});
        let total = calculate(&CalculateContext {
            data: &data,
            descriptor: &descriptor,
            params: &params,
        });
        assert_eq!(total.as_f64(), Some(5.5));
    }
}
