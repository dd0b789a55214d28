//! `Std.Checkbox`: multiple selection over a choice list

use super::choices::generic_choice_mutations;
use super::std_field::std_field;
use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, Result};
use serde_json::json;

pub fn checkbox_props() -> FieldClass {
    FieldClass::new(json!({"choices": [], "maxOthers": 0}), json!([])).mutations(generic_choice_mutations())
}

pub fn std_checkbox_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.apply(std_field("Checkbox", checkbox_props()))?;
    Ok(())
}
