//! `Questionnaire.*` wrapper
//!
//! Puts an inner response definition under `responseProps` and adds a
//! question text and a `required` flag.

use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, FieldMeta, MutationTree, Result};
use serde_json::json;

/// Build the wrapped class registered as `Questionnaire.<kind>`
///
/// The label is the inner label of `responseProps` when the inner class has
/// one, the question text otherwise.
pub fn wrap_questionnaire(inner: &FieldClass) -> FieldClass {
    let mutations = MutationTree::new()
        .mutation("setQuestion", |p, args| {
            p["question"] = args.arg(0)?;
            Ok(())
        })
        .mutation("setRequired", |p, args| {
            p["required"] = args.arg(0)?;
            Ok(())
        })
        .with("responseProps", inner.mutation_tree().clone());

    let initial_params = json!({
        "question": "",
        "required": false,
        "responseProps": inner.initial_params(),
    });

    let inner_meta = inner.field_meta().clone();
    let meta = if inner_meta.has_label() {
        FieldMeta::new().with_label(move |p| inner_meta.label(&p["responseProps"]).unwrap_or_default())
    } else {
        FieldMeta::new().with_label(|p| p["question"].as_str().unwrap_or_default().to_string())
    };

    let mut class = FieldClass::new(initial_params, inner.initial_value().clone())
        .mutations(mutations)
        .meta(meta);
    for (path, param) in inner.overridable_params() {
        class = class.overridable(format!("responseProps.{path}"), param.accepts.clone(), param.label.clone());
    }
    class.overridable("required", "boolean", "Required")
}

/// Registration function for `Questionnaire.<kind>` wrapping `inner`
pub fn questionnaire_field(kind: &str, inner: FieldClass) -> impl FnOnce(&mut SchemaBuilder) -> Result<()> {
    let name = format!("Questionnaire.{kind}");
    let class = wrap_questionnaire(&inner);
    move |builder| {
        builder.append(&name, class)?;
        Ok(())
    }
}
