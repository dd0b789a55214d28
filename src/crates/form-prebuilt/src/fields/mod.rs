//! Prebuilt field classes
//!
//! Each class comes as a registration function over
//! [`SchemaBuilder`](form_core::schema::SchemaBuilder). The `Std.*` and
//! `Questionnaire.*` classes are assembled from an inner definition and one
//! of the wrappers.

pub mod checkbox;
pub mod choices;
pub mod display;
pub mod markdown;
pub mod option;
pub mod questionnaire;
pub mod score;
pub mod std_field;
pub mod text_input;

pub use checkbox::std_checkbox_field;
pub use choices::{generic_choice_mutations, ChoiceParams, GenericChoice};
pub use display::display_field;
pub use markdown::markdown_field;
pub use option::option_field;
pub use questionnaire::{questionnaire_field, wrap_questionnaire};
pub use score::{std_score_field, ScoreChoice, ScoreChoicePatch};
pub use std_field::{std_field, wrap_std, StdFieldLayout};
pub use text_input::{std_text_input_field, KeyboardType};
