//! Generic choice list mutations shared by choice-based field classes
//!
//! The mutations operate on any params object with a `choices` array; other
//! keys of the object are carried through untouched.

use form_core::layout::{insert_array_position, ArrayPosition};
use form_core::{MutationError, MutationTree, Payload};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One selectable choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericChoice {
    /// Stored value, a string or a number
    pub value: Value,
    /// Display label when it differs from the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Image URIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Keys the choice mutations do not interpret
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl GenericChoice {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            label: None,
            images: None,
            rest: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Params view used by the choice mutations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceParams {
    #[serde(default)]
    pub choices: Vec<GenericChoice>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ChoiceParams {
    fn choice_mut(&mut self, index: usize) -> Result<&mut GenericChoice, MutationError> {
        self.choices
            .get_mut(index)
            .ok_or(MutationError::IndexOutOfRange { what: "choice", index })
    }

    /// First `Option N` value not yet taken, starting at `len + 1`
    fn next_option_value(&self) -> String {
        let mut n = self.choices.len() + 1;
        loop {
            let candidate = format!("Option {n}");
            if !self.choices.iter().any(|c| c.value.as_str() == Some(candidate.as_str())) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn add_choice(p: &mut ChoiceParams, args: &Payload) -> Result<(), MutationError> {
    let choice: GenericChoice = args.arg(0)?;
    let position: Option<ArrayPosition> = args.arg(1)?;

    if p.choices.iter().any(|c| c.value == choice.value) {
        warn!(value = %choice.value, "choice values must be distinct; choice not added");
        return Ok(());
    }
    p.choices = insert_array_position(&p.choices, position.unwrap_or_default(), choice);
    Ok(())
}

fn remove_choice(p: &mut ChoiceParams, args: &Payload) -> Result<(), MutationError> {
    let index: usize = args.arg(0)?;
    if index >= p.choices.len() {
        return Err(MutationError::IndexOutOfRange { what: "choice", index });
    }
    p.choices.remove(index);
    Ok(())
}

fn set_choice(p: &mut ChoiceParams, args: &Payload) -> Result<(), MutationError> {
    let choice: GenericChoice = args.arg(0)?;
    let index: usize = args.arg(1)?;
    *p.choice_mut(index)? = choice;
    Ok(())
}

fn add_image(p: &mut ChoiceParams, args: &Payload) -> Result<(), MutationError> {
    let index: Option<usize> = args.arg(0)?;
    let uri: String = args.arg(1)?;

    match index {
        None => {
            let value = p.next_option_value();
            p.choices.push(GenericChoice {
                images: Some(vec![uri]),
                ..GenericChoice::new(value)
            });
        }
        Some(index) => {
            p.choice_mut(index)?.images.get_or_insert_with(Vec::new).push(uri);
        }
    }
    Ok(())
}

fn remove_image(p: &mut ChoiceParams, args: &Payload) -> Result<(), MutationError> {
    let choice_index: usize = args.arg(0)?;
    let image_index: usize = args.arg(1)?;

    let choice = p.choice_mut(choice_index)?;
    match choice.images.as_mut() {
        Some(images) if image_index < images.len() => {
            images.remove(image_index);
            Ok(())
        }
        _ => Err(MutationError::IndexOutOfRange {
            what: "image",
            index: image_index,
        }),
    }
}

/// `addChoice(choice, position?)`, `removeChoice(index)`,
/// `setChoice(choice, index)`, `addImage(choiceIndex?, uri)` and
/// `removeImage(choiceIndex, imageIndex)`
pub fn generic_choice_mutations() -> MutationTree {
    MutationTree::new()
        .typed_mutation::<ChoiceParams, _>("addChoice", add_choice)
        .typed_mutation::<ChoiceParams, _>("removeChoice", remove_choice)
        .typed_mutation::<ChoiceParams, _>("setChoice", set_choice)
        .typed_mutation::<ChoiceParams, _>("addImage", add_image)
        .typed_mutation::<ChoiceParams, _>("removeImage", remove_image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::{synthesize, Namespace, ParamReducer, Params};
    use serde_json::json;

    fn reducer() -> (ParamReducer, form_core::ActionCreatorTree) {
        synthesize(
            Namespace::Field,
            "Choice",
            json!({"choices": [], "maxOthers": 0}),
            &generic_choice_mutations(),
        )
        .unwrap()
    }

    fn run(reducer: &ParamReducer, creators: &form_core::ActionCreatorTree, params: &Params, name: &str, args: Vec<Value>) -> Params {
        let action_type = creators.get(name).unwrap().action_type().clone();
        reducer.reduce(Some(params), &action_type, &Payload::new(args))
    }

    #[test]
    fn test_add_choice_positions_and_duplicates() {
        let (reducer, creators) = reducer();
        let p = reducer.init();

        let p = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": "b"})]);
        let p = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": "a"}), json!(["first"])]);
        let p = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": "c"}), json!(["after", 0])]);
        assert_eq!(p["choices"], json!([{"value": "a"}, {"value": "c"}, {"value": "b"}]));
        assert_eq!(p["maxOthers"], 0);

        let same = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": "a", "label": "A"})]);
        assert!(std::sync::Arc::ptr_eq(&p, &same));
    }

    #[test]
    fn test_remove_and_set_choice() {
        let (reducer, creators) = reducer();
        let p = reducer.init();
        let p = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": 1})]);
        let p = run(&reducer, &creators, &p, "addChoice", vec![json!({"value": 2})]);

        let p = run(&reducer, &creators, &p, "setChoice", vec![json!({"value": 3, "label": "three"}), json!(1)]);
        assert_eq!(p["choices"][1], json!({"value": 3, "label": "three"}));

        let p = run(&reducer, &creators, &p, "removeChoice", vec![json!(0)]);
        assert_eq!(p["choices"], json!([{"value": 3, "label": "three"}]));

        let unchanged = run(&reducer, &creators, &p, "removeChoice", vec![json!(5)]);
        assert!(std::sync::Arc::ptr_eq(&p, &unchanged));
    }

    #[test]
    fn test_images() {
        let (reducer, creators) = reducer();
        let p = reducer.init();

        let p = run(&reducer, &creators, &p, "addImage", vec![Value::Null, json!("a.png")]);
        let p = run(&reducer, &creators, &p, "addImage", vec![Value::Null, json!("b.png")]);
        assert_eq!(p["choices"][0], json!({"value": "Option 1", "images": ["a.png"]}));
        assert_eq!(p["choices"][1]["value"], "Option 2");

        let p = run(&reducer, &creators, &p, "addImage", vec![json!(0), json!("c.png")]);
        assert_eq!(p["choices"][0]["images"], json!(["a.png", "c.png"]));

        let p = run(&reducer, &creators, &p, "removeImage", vec![json!(0), json!(0)]);
        assert_eq!(p["choices"][0]["images"], json!(["c.png"]));

        let unchanged = run(&reducer, &creators, &p, "removeImage", vec![json!(9), json!(0)]);
        assert!(std::sync::Arc::ptr_eq(&p, &unchanged));
        let unchanged = run(&reducer, &creators, &p, "addImage", vec![json!(9), json!("x.png")]);
        assert!(std::sync::Arc::ptr_eq(&p, &unchanged));
    }

    #[test]
    fn test_unknown_choice_keys_survive() {
        let (reducer, creators) = reducer();
        let stored: Params = std::sync::Arc::new(json!({
            "choices": [{"value": "a", "color": "red"}, {"value": "b"}],
            "maxOthers": 0
        }));

        let same = run(&reducer, &creators, &stored, "addChoice", vec![json!({"value": "a"})]);
        assert!(std::sync::Arc::ptr_eq(&stored, &same));

        let p = run(&reducer, &creators, &stored, "removeChoice", vec![json!(1)]);
        assert_eq!(p["choices"], json!([{"value": "a", "color": "red"}]));

        let p = run(&reducer, &creators, &p, "addImage", vec![json!(0), json!("a.png")]);
        assert_eq!(p["choices"][0], json!({"value": "a", "color": "red", "images": ["a.png"]}));
    }

    #[test]
    fn test_next_option_value_skips_taken() {
        let params = ChoiceParams {
            choices: vec![GenericChoice::new("Option 2")],
            rest: Map::new(),
        };
        assert_eq!(params.next_option_value(), "Option 3");
    }
}
