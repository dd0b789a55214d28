//! Class registration and the immutable class registry
//!
//! Schema authors describe field classes and calculable (rule) classes on a
//! [`SchemaBuilder`]. [`SchemaBuilder::build`] synthesizes a parameter
//! reducer and action creators for every class and freezes the result into
//! a [`ClassRegistry`].
//!
//! # Registration
//!
//! ```rust
//! use form_core::action::Payload;
//! use form_core::params::MutationTree;
//! use form_core::schema::{FieldClass, SchemaBuilder};
//! use serde_json::json;
//!
//! let mut builder = SchemaBuilder::new(false);
//! builder.append(
//!     "Text",
//!     FieldClass::new(json!({"label": ""}), json!(""))
//!         .mutations(MutationTree::new().mutation("setLabel", |p, args| {
//!             p["label"] = args.arg(0)?;
//!             Ok(())
//!         }))
//!         .overridable("label", "string", "Label"),
//! )?;
//! let registry = builder.build()?;
//!
//! // declared paths are prefixed with `params.`; `hidden` is always present
//! let overridable = registry.overridable("Text").unwrap();
//! assert!(overridable.contains_key("params.label"));
//! assert!(overridable.contains_key("hidden"));
//! # Ok::<(), form_core::FormError>(())
//! ```
//!
//! # Composition
//!
//! Reusable registration logic is a plain function over the builder:
//!
//! ```rust
//! use form_core::schema::{FieldClass, SchemaBuilder};
//! use form_core::Result;
//! use serde_json::json;
//!
//! fn yes_no(builder: &mut SchemaBuilder) -> Result<()> {
//!     builder.append("YesNo", FieldClass::new(json!({"choices": ["Yes", "No"]}), json!(null)))?;
//!     Ok(())
//! }
//!
//! fn note(builder: &mut SchemaBuilder) -> Result<()> {
//!     builder.append("Note", FieldClass::new(json!({"text": ""}), json!(null)))?;
//!     Ok(())
//! }
//!
//! let mut builder = SchemaBuilder::new(false);
//! builder.apply_all([yes_no, note])?;
//! assert_eq!(builder.field_classes().len(), 2);
//! # Ok::<(), form_core::FormError>(())
//! ```

use crate::action::Namespace;
use crate::descriptor::{FormData, FormDescriptor};
use crate::error::{FormError, Result, RuleIncompatibility};
use crate::params::{synthesize, ActionCreatorTree, MutationTree, ParamReducer};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Class names take part in action types
static CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^/@\s]+$").unwrap());

/// Overridable path present on every field class
pub const HIDDEN_PATH: &str = "hidden";

/// Display label derived from params
pub type LabelFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Validation of an input value against params; `Some(message)` on failure
pub type ValidateFn = Arc<dyn Fn(&Value, &Value) -> Option<String> + Send + Sync>;

/// Rule computation
pub type CalculateFn = Arc<dyn Fn(&CalculateContext<'_>) -> Value + Send + Sync>;

/// Opaque render callback stored for the host UI; never invoked here
pub type Renderer = Arc<dyn Any + Send + Sync>;

/// Inputs of a rule computation
#[derive(Debug, Clone, Copy)]
pub struct CalculateContext<'a> {
    /// Form input data keyed by field id
    pub data: &'a FormData,
    /// Descriptor as updated by the rules evaluated so far
    pub descriptor: &'a FormDescriptor,
    /// The rule's own params
    pub params: &'a Value,
}

/// Accepted result type(s) of an overridable path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    One(String),
    Many(Vec<String>),
}

impl TypeSpec {
    /// True when `result_type` is accepted
    pub fn accepts(&self, result_type: &str) -> bool {
        match self {
            TypeSpec::One(t) => t == result_type,
            TypeSpec::Many(ts) => ts.iter().any(|t| t == result_type),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::One(t) => f.write_str(t),
            TypeSpec::Many(ts) => f.write_str(&ts.join(", ")),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(t: &str) -> Self {
        TypeSpec::One(t.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(t: String) -> Self {
        TypeSpec::One(t)
    }
}

impl<const N: usize> From<[&str; N]> for TypeSpec {
    fn from(ts: [&str; N]) -> Self {
        TypeSpec::Many(ts.iter().map(|t| t.to_string()).collect())
    }
}

/// Declaration of a path that rules may override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridableParam {
    #[serde(rename = "type")]
    pub accepts: TypeSpec,
    pub label: String,
}

/// Path -> declaration, in declaration order
pub type Overridable = IndexMap<String, OverridableParam>;

/// Optional callbacks of a field class
#[derive(Clone, Default)]
pub struct FieldMeta {
    get_label: Option<LabelFn>,
    on_validate: Option<ValidateFn>,
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("get_label", &self.get_label.is_some())
            .field("on_validate", &self.on_validate.is_some())
            .finish()
    }
}

impl FieldMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label callback
    pub fn with_label<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.get_label = Some(Arc::new(f));
        self
    }

    /// Set the validation callback
    pub fn with_validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Option<String> + Send + Sync + 'static,
    {
        self.on_validate = Some(Arc::new(f));
        self
    }

    /// Label for `params`, `None` when the class has no label callback
    pub fn label(&self, params: &Value) -> Option<String> {
        self.get_label.as_ref().map(|f| f(params))
    }

    /// Validation message for `value`, `None` when valid or unvalidated
    pub fn validate(&self, params: &Value, value: &Value) -> Option<String> {
        self.on_validate.as_ref().and_then(|f| f(params, value))
    }

    pub fn has_label(&self) -> bool {
        self.get_label.is_some()
    }

    pub fn has_validate(&self) -> bool {
        self.on_validate.is_some()
    }
}

/// Field class definition
#[derive(Clone)]
pub struct FieldClass {
    initial_params: Value,
    initial_value: Value,
    mutations: MutationTree,
    overridable: Overridable,
    meta: FieldMeta,
    renderer: Option<Renderer>,
}

impl fmt::Debug for FieldClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldClass")
            .field("initial_params", &self.initial_params)
            .field("initial_value", &self.initial_value)
            .field("mutations", &self.mutations)
            .field("overridable", &self.overridable)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl FieldClass {
    /// Class with the given defaults and no mutations
    pub fn new(initial_params: Value, initial_value: Value) -> Self {
        Self {
            initial_params,
            initial_value,
            mutations: MutationTree::new(),
            overridable: Overridable::new(),
            meta: FieldMeta::default(),
            renderer: None,
        }
    }

    /// Set the mutation tree
    pub fn mutations(mut self, tree: MutationTree) -> Self {
        self.mutations = tree;
        self
    }

    /// Declare `path` (relative to params) overridable by rules
    pub fn overridable(mut self, path: impl Into<String>, accepts: impl Into<TypeSpec>, label: impl Into<String>) -> Self {
        self.overridable.insert(
            path.into(),
            OverridableParam {
                accepts: accepts.into(),
                label: label.into(),
            },
        );
        self
    }

    /// Replace every overridable declaration
    pub fn with_overridable(mut self, overridable: Overridable) -> Self {
        self.overridable = overridable;
        self
    }

    pub fn meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn initial_params(&self) -> &Value {
        &self.initial_params
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    pub fn mutation_tree(&self) -> &MutationTree {
        &self.mutations
    }

    pub fn overridable_params(&self) -> &Overridable {
        &self.overridable
    }

    pub fn field_meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn render_callback(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }
}

/// Calculable (rule) class definition
#[derive(Clone)]
pub struct CalculableClass {
    result_type: String,
    initial_params: Value,
    mutations: MutationTree,
    calculate: CalculateFn,
    renderer: Option<Renderer>,
}

impl fmt::Debug for CalculableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculableClass")
            .field("result_type", &self.result_type)
            .field("initial_params", &self.initial_params)
            .field("mutations", &self.mutations)
            .finish_non_exhaustive()
    }
}

impl CalculableClass {
    /// Calculable returning values of `result_type`
    pub fn new<F>(result_type: impl Into<String>, initial_params: Value, calculate: F) -> Self
    where
        F: Fn(&CalculateContext<'_>) -> Value + Send + Sync + 'static,
    {
        Self {
            result_type: result_type.into(),
            initial_params,
            mutations: MutationTree::new(),
            calculate: Arc::new(calculate),
            renderer: None,
        }
    }

    pub fn mutations(mut self, tree: MutationTree) -> Self {
        self.mutations = tree;
        self
    }

    pub fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn result_type(&self) -> &str {
        &self.result_type
    }

    pub fn initial_params(&self) -> &Value {
        &self.initial_params
    }

    pub fn mutation_tree(&self) -> &MutationTree {
        &self.mutations
    }

    pub fn calculate_fn(&self) -> &CalculateFn {
        &self.calculate
    }

    pub fn render_callback(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Run the computation
    pub fn calculate(&self, ctx: &CalculateContext<'_>) -> Value {
        (self.calculate)(ctx)
    }
}

/// Accumulates class definitions before synthesis
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    programmatic: bool,
    fields: IndexMap<String, FieldClass>,
    calculables: IndexMap<String, CalculableClass>,
}

impl SchemaBuilder {
    /// Empty builder; `programmatic` is read by plugins choosing defaults
    pub fn new(programmatic: bool) -> Self {
        Self {
            programmatic,
            ..Self::default()
        }
    }

    /// True when the registry is built for builder-driven forms
    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    /// Register a field class
    ///
    /// Overridable paths are prefixed with `params.` and the universal
    /// `hidden` entry is added.
    pub fn append(&mut self, name: &str, class: FieldClass) -> Result<&mut Self> {
        check_class_name(name)?;
        if self.fields.contains_key(name) {
            return Err(FormError::duplicate_class(Namespace::Field.as_str(), name));
        }

        let mut overridable = Overridable::new();
        overridable.insert(
            HIDDEN_PATH.to_string(),
            OverridableParam {
                accepts: TypeSpec::from("boolean"),
                label: "Hidden".to_string(),
            },
        );
        for (path, param) in class.overridable.iter() {
            overridable.insert(format!("params.{path}"), param.clone());
        }

        debug!(class = name, "field class registered");
        self.fields.insert(name.to_string(), class.with_overridable(overridable));
        Ok(self)
    }

    /// Register a calculable class
    pub fn calculable(&mut self, name: &str, class: CalculableClass) -> Result<&mut Self> {
        check_class_name(name)?;
        if self.calculables.contains_key(name) {
            return Err(FormError::duplicate_class(Namespace::Calculable.as_str(), name));
        }

        debug!(class = name, result_type = %class.result_type, "calculable class registered");
        self.calculables.insert(name.to_string(), class);
        Ok(self)
    }

    /// Run a reusable registration function
    pub fn apply<F>(&mut self, register: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<()>,
    {
        register(self)?;
        Ok(self)
    }

    /// Run several registration functions in order
    pub fn apply_all<I, F>(&mut self, registers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&mut SchemaBuilder) -> Result<()>,
    {
        for register in registers {
            register(self)?;
        }
        Ok(self)
    }

    /// Field classes registered so far
    pub fn field_classes(&self) -> &IndexMap<String, FieldClass> {
        &self.fields
    }

    /// Calculable classes registered so far
    pub fn calculable_classes(&self) -> &IndexMap<String, CalculableClass> {
        &self.calculables
    }

    /// Synthesize every class and freeze the registry
    pub fn build(self) -> Result<ClassRegistry> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, class) in self.fields {
            let (reducer, creators) =
                synthesize(Namespace::Field, &name, class.initial_params.clone(), &class.mutations)?;
            fields.insert(
                name,
                Registered {
                    class,
                    reducer,
                    creators,
                },
            );
        }

        let mut calculables = IndexMap::with_capacity(self.calculables.len());
        for (name, class) in self.calculables {
            let (reducer, creators) = synthesize(
                Namespace::Calculable,
                &name,
                class.initial_params.clone(),
                &class.mutations,
            )?;
            calculables.insert(
                name,
                Registered {
                    class,
                    reducer,
                    creators,
                },
            );
        }

        debug!(
            fields = fields.len(),
            calculables = calculables.len(),
            "class registry built"
        );
        Ok(ClassRegistry {
            programmatic: self.programmatic,
            fields,
            calculables,
        })
    }
}

fn check_class_name(name: &str) -> Result<()> {
    if CLASS_NAME.is_match(name) {
        Ok(())
    } else {
        Err(FormError::InvalidClassName(name.to_string()))
    }
}

#[derive(Debug, Clone)]
struct Registered<C> {
    class: C,
    reducer: ParamReducer,
    creators: ActionCreatorTree,
}

/// Immutable registry of synthesized classes
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    programmatic: bool,
    fields: IndexMap<String, Registered<FieldClass>>,
    calculables: IndexMap<String, Registered<CalculableClass>>,
}

impl ClassRegistry {
    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    /// Field class names in registration order
    pub fn field_class_list(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Calculable class names in registration order
    pub fn calculable_class_list(&self) -> Vec<&str> {
        self.calculables.keys().map(String::as_str).collect()
    }

    pub fn has_field_class(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn has_calculable_class(&self, name: &str) -> bool {
        self.calculables.contains_key(name)
    }

    pub fn field_class(&self, name: &str) -> Option<&FieldClass> {
        self.fields.get(name).map(|r| &r.class)
    }

    pub fn calculable_class(&self, name: &str) -> Option<&CalculableClass> {
        self.calculables.get(name).map(|r| &r.class)
    }

    /// Overridable paths of a field class, `params.`-prefixed plus `hidden`
    pub fn overridable(&self, field_class: &str) -> Option<&Overridable> {
        self.field_class(field_class).map(FieldClass::overridable_params)
    }

    pub fn field_meta(&self, field_class: &str) -> Option<&FieldMeta> {
        self.field_class(field_class).map(FieldClass::field_meta)
    }

    pub fn field_reducer(&self, field_class: &str) -> Option<&ParamReducer> {
        self.fields.get(field_class).map(|r| &r.reducer)
    }

    pub fn field_action_creators(&self, field_class: &str) -> Option<&ActionCreatorTree> {
        self.fields.get(field_class).map(|r| &r.creators)
    }

    pub fn calculable_reducer(&self, calculable_class: &str) -> Option<&ParamReducer> {
        self.calculables.get(calculable_class).map(|r| &r.reducer)
    }

    pub fn calculable_action_creators(&self, calculable_class: &str) -> Option<&ActionCreatorTree> {
        self.calculables.get(calculable_class).map(|r| &r.creators)
    }

    pub fn calculate_fn(&self, calculable_class: &str) -> Option<&CalculateFn> {
        self.calculable_class(calculable_class).map(CalculableClass::calculate_fn)
    }

    /// Calculables whose result type is accepted by `types`
    pub fn calculables_for_type(&self, types: &TypeSpec) -> Vec<(&str, &CalculableClass)> {
        self.calculables
            .iter()
            .filter(|(_, r)| types.accepts(&r.class.result_type))
            .map(|(name, r)| (name.as_str(), &r.class))
            .collect()
    }

    /// Check that a rule of `calculable_class` may target `path` of `field_class`
    ///
    /// `path` is relative to the field, e.g. `hidden` or `params.label`.
    pub fn validate_rule_compatible(&self, field_class: &str, path: &str, calculable_class: &str) -> Result<()> {
        let field = self
            .field_class(field_class)
            .ok_or_else(|| RuleIncompatibility::UnknownFieldClass(field_class.to_string()))?;
        let calculable = self
            .calculable_class(calculable_class)
            .ok_or_else(|| RuleIncompatibility::UnknownCalculableClass(calculable_class.to_string()))?;

        let declared = field
            .overridable_params()
            .get(path)
            .ok_or_else(|| RuleIncompatibility::NotOverridable {
                field_class: field_class.to_string(),
                path: path.to_string(),
            })?;

        if !declared.accepts.accepts(calculable.result_type()) {
            return Err(RuleIncompatibility::TypeMismatch {
                path: path.to_string(),
                expected: declared.accepts.to_string(),
                calculable: calculable_class.to_string(),
                actual: calculable.result_type().to_string(),
            }
            .into());
        }

        Ok(())
    }
}
