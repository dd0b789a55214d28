//! `Display`: static title and text

use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, FieldMeta, MutationTree, Result};
use serde_json::{json, Value};

/// Title (or text) rendered as a string; numbers are formatted
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn display_class() -> FieldClass {
    FieldClass::new(json!({"title": "", "text": ""}), Value::Null)
        .mutations(
            MutationTree::new()
                .mutation("setTitle", |p, args| {
                    p["title"] = args.arg(0)?;
                    Ok(())
                })
                .mutation("setText", |p, args| {
                    p["text"] = args.arg(0)?;
                    Ok(())
                }),
        )
        .meta(FieldMeta::new().with_label(|p| text_of(&p["title"])))
        .overridable("title", ["string", "number"], "Title")
        .overridable("text", ["string", "number"], "Text")
}

pub fn display_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.append("Display", display_class())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_formats_numbers() {
        let class = display_class();
        assert_eq!(class.field_meta().label(&json!({"title": 42})).as_deref(), Some("42"));
        assert_eq!(class.field_meta().label(&json!({"title": "Hi"})).as_deref(), Some("Hi"));
        assert_eq!(class.overridable_params()["text"].accepts.to_string(), "string, number");
    }
}
