//! `Std.ScoreField`: a scale of labelled choices

use super::std_field::{std_field, StdFieldLayout};
use form_core::schema::SchemaBuilder;
use form_core::{FieldClass, MutationError, MutationTree, Payload, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One point of the scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChoice {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_label: Option<String>,
}

impl Default for ScoreChoice {
    fn default() -> Self {
        Self {
            value: Value::String(String::new()),
            label: Some(String::new()),
            additional_label: Some(String::new()),
        }
    }
}

/// Partial update of a [`ScoreChoice`]; absent or null entries are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChoicePatch {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub additional_label: Option<String>,
}

/// Inner params of the score field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreParams {
    #[serde(default)]
    pub choice_layout: StdFieldLayout,
    #[serde(default)]
    pub choices: Vec<ScoreChoice>,
    #[serde(default)]
    pub show_other: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            choice_layout: StdFieldLayout::Horizontal,
            choices: Vec::new(),
            show_other: false,
            placeholder: None,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn set_choice(p: &mut ScoreParams, args: &Payload) -> std::result::Result<(), MutationError> {
    let index: usize = args.arg(0)?;
    let patch: ScoreChoicePatch = args.arg(1)?;
    let choice = p
        .choices
        .get_mut(index)
        .ok_or(MutationError::IndexOutOfRange { what: "choice", index })?;

    if let Some(value) = patch.value {
        choice.value = value;
    }
    if let Some(label) = patch.label {
        choice.label = Some(label);
    }
    if let Some(additional_label) = patch.additional_label {
        choice.additional_label = Some(additional_label);
    }
    Ok(())
}

/// Inner score definition, before the `Std` wrapper
pub fn score_props() -> FieldClass {
    let initial = serde_json::to_value(ScoreParams::default()).unwrap_or_else(|_| json!({}));
    FieldClass::new(initial, json!("")).mutations(
        MutationTree::new()
            .typed_mutation::<ScoreParams, _>("setChoiceLayout", |p, args| {
                p.choice_layout = args.arg(0)?;
                Ok(())
            })
            .typed_mutation::<ScoreParams, _>("addChoice", |p, args| {
                let choice: Option<ScoreChoice> = args.arg(0)?;
                p.choices.push(choice.unwrap_or_default());
                Ok(())
            })
            .typed_mutation::<ScoreParams, _>("removeChoice", |p, args| {
                let index: usize = args.arg(0)?;
                if index >= p.choices.len() {
                    return Err(MutationError::IndexOutOfRange { what: "choice", index });
                }
                p.choices.remove(index);
                Ok(())
            })
            .typed_mutation::<ScoreParams, _>("setChoice", set_choice)
            .typed_mutation::<ScoreParams, _>("clearEmpty", |p, _| {
                p.choices.retain(|c| !is_blank(&c.value));
                Ok(())
            }),
    )
}

pub fn std_score_field(builder: &mut SchemaBuilder) -> Result<()> {
    builder.apply(std_field("ScoreField", score_props()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::{synthesize, Namespace};
    use std::sync::Arc;

    #[test]
    fn test_score_choices() {
        let class = score_props();
        let (reducer, creators) = synthesize(
            Namespace::Field,
            "Score",
            class.initial_params().clone(),
            class.mutation_tree(),
        )
        .unwrap();
        let call = |params: &form_core::Params, name: &str, args: Vec<Value>| {
            reducer.reduce(Some(params), creators.get(name).unwrap().action_type(), &Payload::new(args))
        };

        let p = reducer.init();
        assert_eq!(p["choiceLayout"], "horizontal");
        assert_eq!(p["placeholder"], Value::Null);

        let p = call(&p, "addChoice", vec![json!({"value": 18, "label": "18"})]);
        let p = call(&p, "addChoice", vec![]);
        assert_eq!(p["choices"][1], json!({"value": "", "label": "", "additionalLabel": ""}));

        let p = call(&p, "setChoice", vec![json!(0), json!({"additionalLabel": "adult", "label": null})]);
        assert_eq!(p["choices"][0], json!({"value": 18, "label": "18", "additionalLabel": "adult"}));

        let p = call(&p, "clearEmpty", vec![]);
        assert_eq!(p["choices"].as_array().map(Vec::len), Some(1));

        let same = call(&p, "setChoice", vec![json!(4), json!({"value": 1})]);
        assert!(Arc::ptr_eq(&p, &same));

        let p = call(&p, "setChoiceLayout", vec![json!("vertical")]);
        assert_eq!(p["choiceLayout"], "vertical");
    }
}
