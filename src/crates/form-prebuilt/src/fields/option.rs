//! `Questionnaire.Option`: single answer picked from a choice list

use super::choices::generic_choice_mutations;
use super::questionnaire::questionnaire_field;
use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, Result};
use serde_json::json;

pub fn option_props() -> FieldClass {
    FieldClass::new(json!({"choices": []}), json!("")).mutations(generic_choice_mutations())
}

pub fn option_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.apply(questionnaire_field("Option", option_props()))?;
    Ok(())
}
