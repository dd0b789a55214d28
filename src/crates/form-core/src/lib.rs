//! # form-core - Pluggable Form Schemas with Reducer-Driven State
//!
//! A form is a serializable [`FormDescriptor`]: field instances keyed by id,
//! rules keyed by target path, and a layout of sections plus an optional
//! footer. Everything a field or rule can be is defined by *classes*
//! registered into a [`FormSchema`].
//!
//! ## Overview
//!
//! - **Classes**: a field class declares initial params, an initial input
//!   value, a tree of param mutations, overridable paths and optional
//!   label/validation callbacks. A calculable class declares a result type
//!   and a pure `calculate` function.
//! - **Reducer synthesis**: every mutation tree is turned into a
//!   [`ParamReducer`](params::ParamReducer) plus a mirror tree of action
//!   creators, see [`params::synthesize`].
//! - **Descriptor reducer**: [`FormReducer`] routes field param actions,
//!   rule actions and the structural `@form/...` actions.
//! - **Rule evaluation**: [`rules::apply_rules`] computes every rule against
//!   current input data and writes results into a derived descriptor,
//!   `hidden` rules first.
//!
//! ## Structural sharing
//!
//! Params, field maps, rule maps and layouts sit behind `Arc`s. Reducers
//! return the *same* `Arc` when nothing changed, so change detection is
//! `Arc::ptr_eq`. Invalid actions never panic or error: they are logged with
//! `tracing::warn!` and leave the state untouched.
//!
//! ## Quick Start
//!
//! ```rust
//! use form_core::action::SectionTarget;
//! use form_core::layout::InsertPosition;
//! use form_core::params::MutationTree;
//! use form_core::schema::FieldClass;
//! use form_core::{Action, FormSchema};
//! use serde_json::json;
//!
//! let schema = FormSchema::new("1.0.0", |builder| {
//!     builder.append(
//!         "Text",
//!         FieldClass::new(json!({"label": ""}), json!("")).mutations(
//!             MutationTree::new().mutation("setLabel", |p, args| {
//!                 p["label"] = args.arg(0)?;
//!                 Ok(())
//!             }),
//!         ),
//!     )?;
//!     Ok(())
//! })?;
//!
//! let mut store = schema.create_editor_store();
//! store.dispatch(&Action::insert_field(
//!     "Text",
//!     SectionTarget::NewSection,
//!     InsertPosition::Last,
//!     Some("name".to_string()),
//! ));
//!
//! let set_label = schema.field_action_creators("Text").unwrap().get("setLabel").unwrap();
//! store.dispatch(&set_label.call("name", ("Name",))?);
//!
//! assert_eq!(store.form().fields["name"].params["label"], "Name");
//! # Ok::<(), form_core::FormError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`schema`], [`form_schema`]: class definitions, registry, versioned schema
//! - [`params`], [`merge`]: mutation trees, synthesized reducers, param merging
//! - [`action`]: action types, payloads, the `Action` wire enum
//! - [`descriptor`], [`layout`], [`id`]: descriptor data and layout helpers
//! - [`reducer`], [`rule_reducer`]: descriptor state machine
//! - [`rules`], [`validation`]: rule evaluation and input validation
//! - [`editor`], [`viewer`], [`builder`]: stores and the code-first builder
//! - [`config`], [`error`]: configuration and error types

pub mod action;
pub mod builder;
pub mod config;
pub mod descriptor;
pub mod editor;
pub mod error;
pub mod form_schema;
pub mod id;
pub mod layout;
pub mod merge;
pub mod params;
pub mod reducer;
pub mod rule_reducer;
pub mod rules;
pub mod schema;
pub mod validation;
pub mod viewer;

// Re-export main types
pub use action::{Action, ActionType, FieldAction, FormAction, IntoPayload, Namespace, Payload, RuleAction, SectionTarget};
pub use builder::{FieldHandle, FormBuilder, RuleHandle};
pub use config::{FormConfig, IdConfig};
pub use descriptor::{FieldEntry, FormData, FormDescriptor, Layout, Params, RuleEntry};
pub use editor::{EditorState, EditorStore, FieldApi};
pub use error::{FormError, MutationError, Result, RuleIncompatibility};
pub use form_schema::FormSchema;
pub use id::IdGenerator;
pub use layout::{ArrayPosition, InsertPosition};
pub use params::{synthesize, ActionCreator, ActionCreatorTree, MutationTree, ParamReducer};
pub use reducer::FormReducer;
pub use rule_reducer::RuleReducer;
pub use rules::apply_rules;
pub use schema::{CalculableClass, CalculateContext, ClassRegistry, FieldClass, FieldMeta, SchemaBuilder, TypeSpec};
pub use viewer::{ViewerAction, ViewerState, ViewerStore};
