//! Fluent, code-first form construction
//!
//! [`FormBuilder`] drives an [`EditorStore`] over a programmatic copy of a
//! schema. Authoring mistakes (unknown classes, unknown mutation paths,
//! incompatible rules) surface as [`FormError`]s instead of silent no-ops.
//!
//! ```rust
//! use form_core::params::MutationTree;
//! use form_core::schema::{CalculableClass, FieldClass};
//! use form_core::{FormBuilder, FormSchema};
//! use serde_json::json;
//!
//! let schema = FormSchema::new("1.0.0", |builder| {
//!     builder
//!         .append(
//!             "Text",
//!             FieldClass::new(json!({"label": ""}), json!("")).mutations(
//!                 MutationTree::new().mutation("setLabel", |p, args| {
//!                     p["label"] = args.arg(0)?;
//!                     Ok(())
//!                 }),
//!             ),
//!         )?
//!         .calculable("Never", CalculableClass::new("boolean", json!({}), |_| json!(false)))?;
//!     Ok(())
//! })?;
//!
//! let mut form = FormBuilder::new(&schema)?;
//! form.insert_field("Text", Some("age"))?
//!     .param("setLabel", ("Age",))?
//!     .add_rule("hidden", "Never")?;
//!
//! let descriptor = form.descriptor();
//! assert_eq!(descriptor.fields["age"].params["label"], "Age");
//! assert!(descriptor.rules.contains_key("age.hidden"));
//! # Ok::<(), form_core::FormError>(())
//! ```

use crate::action::{Action, IntoPayload, SectionTarget};
use crate::descriptor::FormDescriptor;
use crate::editor::EditorStore;
use crate::error::{FormError, Result};
use crate::form_schema::FormSchema;
use crate::layout::InsertPosition;
use serde::Serialize;
use std::sync::Arc;

/// Code-first form builder
#[derive(Debug)]
pub struct FormBuilder {
    schema: FormSchema,
    store: EditorStore,
}

impl FormBuilder {
    /// Builder over the programmatic variant of `schema`
    pub fn new(schema: &FormSchema) -> Result<Self> {
        let schema = schema.programmatic()?;
        let store = schema.create_editor_store();
        Ok(Self { schema, store })
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Resulting descriptor
    pub fn descriptor(&self) -> Arc<FormDescriptor> {
        self.store.form()
    }

    /// Append a field to the first section
    pub fn insert_field(&mut self, field_class: &str, id: Option<&str>) -> Result<FieldHandle<'_>> {
        self.insert_at(field_class, SectionTarget::Section(0), id)
    }

    /// Append a field to the footer
    pub fn insert_footer(&mut self, field_class: &str, id: Option<&str>) -> Result<FieldHandle<'_>> {
        self.insert_at(field_class, SectionTarget::Footer, id)
    }

    /// Handle on an existing field
    pub fn field(&mut self, field_id: &str) -> Option<FieldHandle<'_>> {
        let field_class = self.store.form().field(field_id)?.field_class.clone();
        Some(FieldHandle {
            builder: self,
            field_id: field_id.to_string(),
            field_class,
        })
    }

    fn insert_at(&mut self, field_class: &str, section: SectionTarget, id: Option<&str>) -> Result<FieldHandle<'_>> {
        if !self.schema.has_field_class(field_class) {
            return Err(FormError::UnknownFieldClass(field_class.to_string()));
        }

        let form = self.store.form();
        let field_id = match id {
            Some(id) => id.to_string(),
            None => self.store.reducer().allocate_id(&form),
        };
        if form.fields.contains_key(&field_id) {
            return Err(FormError::Config(format!("field id \"{field_id}\" is already in use")));
        }

        self.store.dispatch(&Action::insert_field(
            field_class,
            section,
            InsertPosition::Last,
            Some(field_id.clone()),
        ));

        Ok(FieldHandle {
            builder: self,
            field_id,
            field_class: field_class.to_string(),
        })
    }
}

/// Chainable operations on one field
#[derive(Debug)]
pub struct FieldHandle<'a> {
    builder: &'a mut FormBuilder,
    field_id: String,
    field_class: String,
}

impl<'a> FieldHandle<'a> {
    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn field_class(&self) -> &str {
        &self.field_class
    }

    /// Dispatch the class mutation at dotted `path` with `args`
    pub fn param(&mut self, path: &str, args: impl IntoPayload) -> Result<&mut Self> {
        let creator = self
            .builder
            .schema
            .field_action_creators(&self.field_class)
            .and_then(|tree| tree.get(path))
            .ok_or_else(|| FormError::UnknownMutation {
                class: self.field_class.clone(),
                path: path.to_string(),
            })?;
        let action = creator.call(self.field_id.as_str(), args)?;
        self.builder.store.dispatch(&action);
        Ok(self)
    }

    /// Replace params outright
    pub fn set_params<P: Serialize>(&mut self, params: &P) -> Result<&mut Self> {
        let params = serde_json::to_value(params)?;
        self.builder
            .store
            .dispatch(&Action::set_params(self.field_id.as_str(), params, false));
        Ok(self)
    }

    /// Deep-merge into params; lists are concatenated
    pub fn merge_params<P: Serialize>(&mut self, params: &P) -> Result<&mut Self> {
        let params = serde_json::to_value(params)?;
        self.builder
            .store
            .dispatch(&Action::set_params(self.field_id.as_str(), params, true));
        Ok(self)
    }

    /// Attach a rule at `path` (relative to the field) and return its handle
    pub fn add_rule(&mut self, path: &str, calculable_class: &str) -> Result<RuleHandle<'_>> {
        self.builder
            .schema
            .validate_rule_compatible(&self.field_class, path, calculable_class)?;

        let target_path = format!("{}.{}", self.field_id, path);
        self.builder
            .store
            .dispatch(&Action::add_rule(target_path.as_str(), calculable_class));

        Ok(RuleHandle {
            builder: &mut *self.builder,
            target_path,
            calculable_class: calculable_class.to_string(),
        })
    }

    /// Remove the field together with its rules
    pub fn remove(self) {
        self.builder.store.remove_field(&self.field_id);
    }
}

/// Chainable operations on one rule
#[derive(Debug)]
pub struct RuleHandle<'a> {
    builder: &'a mut FormBuilder,
    target_path: String,
    calculable_class: String,
}

impl RuleHandle<'_> {
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Dispatch the calculable mutation at dotted `path` with `args`
    pub fn param(&mut self, path: &str, args: impl IntoPayload) -> Result<&mut Self> {
        let creator = self
            .builder
            .schema
            .calculable_action_creators(&self.calculable_class)
            .and_then(|tree| tree.get(path))
            .ok_or_else(|| FormError::UnknownMutation {
                class: self.calculable_class.clone(),
                path: path.to_string(),
            })?;
        let action = creator.call(self.target_path.as_str(), args)?;
        self.builder.store.dispatch(&action);
        Ok(self)
    }
}
