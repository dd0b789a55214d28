//! `Markdown`: a block of markdown text

use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, MutationTree, Result};
use serde_json::{json, Value};

pub fn markdown_class() -> FieldClass {
    FieldClass::new(json!({"markdown": ""}), Value::Null).mutations(MutationTree::new().mutation(
        "setMarkdown",
        |p, args| {
            p["markdown"] = args.arg(0)?;
            Ok(())
        },
    ))
}

pub fn markdown_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.append("Markdown", markdown_class())?;
    Ok(())
}
