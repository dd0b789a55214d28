//! Versioned form schema
//!
//! A [`FormSchema`] pairs a version string with a registration function.
//! The function runs against a fresh [`SchemaBuilder`] and the result is
//! frozen into a shared [`ClassRegistry`]. Keeping the function lets the
//! schema rebuild itself in programmatic mode, where plugins pick
//! builder-friendly defaults.
//!
//! ```rust
//! use form_core::schema::FieldClass;
//! use form_core::FormSchema;
//! use serde_json::json;
//!
//! let schema = FormSchema::new("1.0.0", |builder| {
//!     builder.append("Text", FieldClass::new(json!({"label": ""}), json!("")))?;
//!     Ok(())
//! })?;
//!
//! assert_eq!(schema.field_class_list(), vec!["Text"]);
//! let descriptor = schema.initial_descriptor();
//! assert_eq!(descriptor.schema_version, "1.0.0");
//! # Ok::<(), form_core::FormError>(())
//! ```

use crate::config::FormConfig;
use crate::descriptor::{FormData, FormDescriptor};
use crate::editor::EditorStore;
use crate::error::Result;
use crate::id::IdGenerator;
use crate::params::ActionCreatorTree;
use crate::reducer::FormReducer;
use crate::rules::apply_rules;
use crate::schema::{CalculableClass, CalculateFn, ClassRegistry, FieldMeta, Overridable, SchemaBuilder, TypeSpec};
use crate::validation::{validate_field, validate_form};
use crate::viewer::ViewerStore;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type DefineFn = Arc<dyn Fn(&mut SchemaBuilder) -> Result<()> + Send + Sync>;

/// Version + registration function + built registry
#[derive(Clone)]
pub struct FormSchema {
    version: String,
    define: DefineFn,
    registry: Arc<ClassRegistry>,
    config: FormConfig,
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("version", &self.version)
            .field("field_classes", &self.registry.field_class_list())
            .field("calculables", &self.registry.calculable_class_list())
            .field("config", &self.config)
            .finish()
    }
}

impl FormSchema {
    /// Build a schema from a registration function
    pub fn new<F>(version: impl Into<String>, define: F) -> Result<Self>
    where
        F: Fn(&mut SchemaBuilder) -> Result<()> + Send + Sync + 'static,
    {
        let define: DefineFn = Arc::new(define);
        let config = FormConfig::default();
        let registry = build_registry(&define, config.programmatic)?;
        Ok(Self {
            version: version.into(),
            define,
            registry,
            config,
        })
    }

    /// Apply configuration, rebuilding the registry when the mode changes
    pub fn with_config(mut self, config: FormConfig) -> Result<Self> {
        if config.programmatic != self.config.programmatic {
            self.registry = build_registry(&self.define, config.programmatic)?;
        }
        self.config = config;
        Ok(self)
    }

    /// Same schema rebuilt in programmatic mode
    pub fn programmatic(&self) -> Result<Self> {
        if self.is_programmatic() {
            return Ok(self.clone());
        }
        let config = FormConfig {
            programmatic: true,
            ..self.config.clone()
        };
        self.clone().with_config(config)
    }

    pub fn is_programmatic(&self) -> bool {
        self.config.programmatic
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Empty descriptor stamped with the schema version
    pub fn initial_descriptor(&self) -> FormDescriptor {
        let version = self.config.schema_version.as_deref().unwrap_or(self.version.as_str());
        FormDescriptor::new(version)
    }

    /// Reducer over descriptors of this schema
    pub fn create_form_reducer(&self) -> FormReducer {
        FormReducer::new(Arc::clone(&self.registry)).with_id_generator(IdGenerator::from_config(&self.config.ids))
    }

    /// Editor store over an empty descriptor
    pub fn create_editor_store(&self) -> EditorStore {
        EditorStore::new(self.create_form_reducer(), self.initial_descriptor())
    }

    /// Viewer store, optionally preloaded with data
    pub fn create_viewer_store(&self, initial_data: Option<FormData>) -> ViewerStore {
        ViewerStore::new(initial_data)
    }

    pub fn field_class_list(&self) -> Vec<&str> {
        self.registry.field_class_list()
    }

    pub fn has_field_class(&self, field_class: &str) -> bool {
        self.registry.has_field_class(field_class)
    }

    /// Overridable paths of `field_class`; empty for unknown classes
    pub fn overridable(&self, field_class: &str) -> Overridable {
        self.registry.overridable(field_class).cloned().unwrap_or_default()
    }

    pub fn field_class_meta(&self, field_class: &str) -> Option<&FieldMeta> {
        self.registry.field_meta(field_class)
    }

    pub fn validate_rule_compatible(&self, field_class: &str, path: &str, calculable_class: &str) -> Result<()> {
        self.registry.validate_rule_compatible(field_class, path, calculable_class)
    }

    pub fn calculate_fn(&self, calculable_class: &str) -> Option<&CalculateFn> {
        self.registry.calculate_fn(calculable_class)
    }

    pub fn calculables_for_type(&self, types: &TypeSpec) -> Vec<(&str, &CalculableClass)> {
        self.registry.calculables_for_type(types)
    }

    pub fn field_action_creators(&self, field_class: &str) -> Option<&ActionCreatorTree> {
        self.registry.field_action_creators(field_class)
    }

    pub fn calculable_action_creators(&self, calculable_class: &str) -> Option<&ActionCreatorTree> {
        self.registry.calculable_action_creators(calculable_class)
    }

    /// Evaluate the descriptor's rules against `data`
    pub fn apply_rules(&self, descriptor: &FormDescriptor, data: &FormData) -> FormDescriptor {
        apply_rules(&self.registry, descriptor, data)
    }

    pub fn validate_form(&self, data: &FormData, descriptor: &FormDescriptor) -> IndexMap<String, String> {
        validate_form(data, descriptor, &self.registry)
    }

    pub fn validate_field(&self, field_id: &str, value: &Value, descriptor: &FormDescriptor) -> Option<String> {
        validate_field(field_id, value, descriptor, &self.registry)
    }
}

fn build_registry(define: &DefineFn, programmatic: bool) -> Result<Arc<ClassRegistry>> {
    let mut builder = SchemaBuilder::new(programmatic);
    define(&mut builder)?;
    Ok(Arc::new(builder.build()?))
}
