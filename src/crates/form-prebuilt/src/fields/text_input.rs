//! `Std.TextInput`: free text with an optional keyboard hint

use super::std_field::std_field;
use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, MutationTree, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Virtual keyboard requested on touch devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardType {
    Default,
    NumberPad,
    DecimalPad,
    Numeric,
    EmailAddress,
    PhonePad,
    Url,
    AsciiCapable,
    NumbersAndPunctuation,
    NamePhonePad,
    Twitter,
    WebSearch,
    VisiblePassword,
}

/// Inner text input definition, before the `Std` wrapper
pub fn text_input_props() -> FieldClass {
    FieldClass::new(json!({"placeholder": "", "keyboardType": null}), json!("")).mutations(
        MutationTree::new()
            .mutation("setPlaceholder", |p, args| {
                p["placeholder"] = args.arg(0)?;
                Ok(())
            })
            .mutation("setKeyboardType", |p, args| {
                let keyboard: Option<KeyboardType> = args.arg(0)?;
                p["keyboardType"] = keyboard.map_or(Value::Null, |k| json!(k));
                Ok(())
            }),
    )
}

pub fn std_text_input_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.apply(std_field("TextInput", text_input_props()))?;
    Ok(())
}
