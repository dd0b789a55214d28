//! # form-prebuilt - Stock Field Classes and Calculables
//!
//! Ready-made registrations for [`form_core`] schemas, written purely
//! against the public registration surface.
//!
//! ## Field classes
//!
//! - `Display`, `Markdown`: static content
//! - `Std.TextInput`, `Std.ScoreField`, `Std.Checkbox`: inputs wrapped by
//!   [`std_field`](fields::std_field) with label, layout and `required`
//!   validation; inner params live under `fieldProps`
//! - `Questionnaire.Option`: a choice question wrapped by
//!   [`questionnaire_field`](fields::questionnaire_field); inner params live
//!   under `responseProps`
//!
//! ## Calculables
//!
//! - `Condition` (boolean): grouped and/or/nor logic over form data
//! - `Summation` (number): sum of numeric inputs of visible fields
//!
//! ## Example
//!
//! ```rust
//! use form_core::FormBuilder;
//! use form_prebuilt::default_schema;
//!
//! let schema = default_schema()?;
//! let mut form = FormBuilder::new(&schema)?;
//!
//! form.insert_field("Std.TextInput", Some("name"))?
//!     .param("setLabel", ("Patient Name",))?
//!     .param("fieldProps.setPlaceholder", ("First and Last",))?;
//!
//! let descriptor = form.descriptor();
//! assert_eq!(descriptor.fields["name"].params["fieldProps"]["placeholder"], "First and Last");
//! # Ok::<(), form_core::FormError>(())
//! ```

pub mod calculables;
pub mod default_schema;
pub mod fields;

// Re-export main types
pub use calculables::{Condition, ConditionGroup, ConditionParams, Logic, Operator};
pub use default_schema::{default_schema, register_defaults, DEFAULT_SCHEMA_VERSION};
pub use fields::{GenericChoice, KeyboardType, ScoreChoice, StdFieldLayout};
