//! The stock schema
//!
//! Field classes: `Display`, `Markdown`, `Std.TextInput`, `Std.ScoreField`,
//! `Std.Checkbox`. Calculables: `Condition`, `Summation`.

use crate::calculables::{calculable_condition, calculable_summation};
use crate::fields::{display_field, markdown_field, std_checkbox_field, std_score_field, std_text_input_field};
use form_core::schema::SchemaBuilder;
use form_core::{FormSchema, Result};

/// Version stamped into descriptors of the stock schema
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0.0";

/// Registration of every stock class, in registration order
pub fn register_defaults(builder: &mut SchemaBuilder) -> Result<()> {
    let registers: [fn(&mut SchemaBuilder) -> Result<()>; 7] = [
        display_field,
        markdown_field,
        std_text_input_field,
        std_score_field,
        std_checkbox_field,
        calculable_condition,
        calculable_summation,
    ];
    builder.apply_all(registers)?;
    Ok(())
}

/// Schema with the stock field classes and calculables
pub fn default_schema() -> Result<FormSchema> {
    FormSchema::new(DEFAULT_SCHEMA_VERSION, register_defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes() {
        let schema = default_schema().unwrap();
        assert_eq!(
            schema.field_class_list(),
            vec!["Display", "Markdown", "Std.TextInput", "Std.ScoreField", "Std.Checkbox"]
        );
        assert_eq!(
            schema.registry().calculable_class_list(),
            vec!["Condition", "Summation"]
        );
        assert_eq!(schema.version(), DEFAULT_SCHEMA_VERSION);
    }
}
