//! `Std.*` wrapper
//!
//! Wraps an inner field definition with the standard presentation params
//! (label, description, tooltips, layout) and a `required` flag. The inner
//! params, mutations and overridable paths move under `fieldProps`.

use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, FieldMeta, MutationTree, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default message; `{name}` is replaced by the field label
pub const DEFAULT_REQUIRED_MESSAGE: &str = "\"{name}\" is a required field";

/// Label placement of a standard field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdFieldLayout {
    #[default]
    Horizontal,
    Vertical,
}

/// Empty strings, empty arrays and null count as missing input
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn validate_required(params: &Value, value: &Value) -> Option<String> {
    if !params["required"].as_bool().unwrap_or(false) || !is_missing(value) {
        return None;
    }
    let label = params["label"].as_str().unwrap_or_default();
    let message = params["requiredErrorMessage"]
        .as_str()
        .unwrap_or(DEFAULT_REQUIRED_MESSAGE);
    Some(message.replace("{name}", label))
}

/// Build the wrapped class registered as `Std.<kind>`
pub fn wrap_std(inner: &FieldClass) -> FieldClass {
    let mutations = MutationTree::new()
        .mutation("setLabel", |p, args| {
            p["label"] = args.arg(0)?;
            Ok(())
        })
        .mutation("setDescription", |p, args| {
            p["description"] = args.arg(0)?;
            Ok(())
        })
        .mutation("setTooltips", |p, args| {
            p["tooltips"] = args.arg(0)?;
            Ok(())
        })
        .mutation("setLayout", |p, args| {
            let layout: StdFieldLayout = args.arg(0)?;
            p["layout"] = json!(layout);
            Ok(())
        })
        .mutation("setRequired", |p, args| {
            p["required"] = args.arg(0)?;
            Ok(())
        })
        .mutation("setRequiredErrorMessage", |p, args| {
            p["requiredErrorMessage"] = args.arg(0)?;
            Ok(())
        })
        .with("fieldProps", inner.mutation_tree().clone());

    let initial_params = json!({
        "fieldProps": inner.initial_params(),
        "required": false,
        "label": "",
        "description": "",
        "tooltips": "",
        "layout": StdFieldLayout::default(),
        "requiredErrorMessage": DEFAULT_REQUIRED_MESSAGE,
    });

    let mut class = FieldClass::new(initial_params, inner.initial_value().clone())
        .mutations(mutations)
        .meta(
            FieldMeta::new()
                .with_label(|p| p["label"].as_str().unwrap_or_default().to_string())
                .with_validate(validate_required),
        );
    for (path, param) in inner.overridable_params() {
        class = class.overridable(format!("fieldProps.{path}"), param.accepts.clone(), param.label.clone());
    }
    if let Some(renderer) = inner.render_callback() {
        class = class.renderer(renderer.clone());
    }
    class.overridable("required", "boolean", "Required")
}

/// Registration function for `Std.<kind>` wrapping `inner`
pub fn std_field(kind: &str, inner: FieldClass) -> impl FnOnce(&mut SchemaBuilder) -> Result<()> {
    let name = format!("Std.{kind}");
    let class = wrap_std(&inner);
    move |builder| {
        builder.append(&name, class)?;
        Ok(())
    }
}
