//! Action protocol
//!
//! Every state transition is driven by an [`Action`]. Two kinds exist:
//!
//! | Kind | Wire shape | Type string |
//! |------|------------|-------------|
//! | Synthesized field mutation | `{type, targetField, payload: [...]}` | `@field/<Class>/<path>` |
//! | Synthesized rule mutation | `{type, targetPath, payload: [...]}` | `@calculable/<Class>/<path>` |
//! | Structural | `{type, payload: {...}}` | `@form/insertField`, `@form/addRule`, ... |
//!
//! Synthesized types are held as a typed [`ActionType`] key (namespace,
//! class, mutation path) and only rendered to the string grammar at the
//! serialization boundary.
//!
//! ```rust
//! use form_core::action::{ActionType, Namespace};
//!
//! let ty: ActionType = "@field/Std.TextInput/fieldProps/setPlaceholder".parse().unwrap();
//! assert_eq!(ty.namespace(), Namespace::Field);
//! assert_eq!(ty.class_name(), "Std.TextInput");
//! assert_eq!(ty.path(), ["fieldProps", "setPlaceholder"]);
//! assert_eq!(ty.to_string(), "@field/Std.TextInput/fieldProps/setPlaceholder");
//! ```

use crate::error::{FormError, MutationError};
use crate::layout::InsertPosition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Sentinel section index addressing the footer on the wire
pub const FOOTER_SECTION_INDEX: i64 = -1;

/// Namespace part of a synthesized action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Field class parameter mutations
    Field,
    /// Calculable (rule) class parameter mutations
    Calculable,
}

impl Namespace {
    /// Wire name of the namespace
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Field => "field",
            Namespace::Calculable => "calculable",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed key of a synthesized action: namespace x class x mutation path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionType {
    namespace: Namespace,
    class_name: String,
    path: Vec<String>,
}

impl ActionType {
    /// Create an action type for the leaf at `path` of `class_name`'s tree
    pub fn new(namespace: Namespace, class_name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            namespace,
            class_name: class_name.into(),
            path,
        }
    }

    /// Namespace of the owning class
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Owning class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Structural path of the leaf inside the mutation tree
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}/{}/{}",
            self.namespace,
            self.class_name,
            self.path.join("/")
        )
    }
}

impl FromStr for ActionType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormError::InvalidActionType(s.to_string());

        let rest = s.strip_prefix('@').ok_or_else(invalid)?;
        let mut parts = rest.split('/');

        let namespace = match parts.next() {
            Some("field") => Namespace::Field,
            Some("calculable") => Namespace::Calculable,
            _ => return Err(invalid()),
        };
        let class_name = parts.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
        let path: Vec<String> = parts.map(str::to_string).collect();
        if path.is_empty() || path.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self::new(namespace, class_name, path))
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Positional argument list of a synthesized action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Vec<Value>);

impl Payload {
    /// Wrap raw positional arguments
    pub fn new(args: Vec<Value>) -> Self {
        Self(args)
    }

    /// Number of positional arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no argument was given
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Decode argument `index`; a missing trailing argument decodes from `null`
    ///
    /// so `Option<T>` parameters behave like optional trailing arguments.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, MutationError> {
        let raw = self.0.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(raw).map_err(|source| MutationError::InvalidArgument { index, source })
    }

    /// Arguments as a slice
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

/// Conversion of Rust arguments into a [`Payload`]
///
/// Implemented for `()`, [`Payload`], `Vec<Value>` and tuples of up to four
/// serializable values.
pub trait IntoPayload {
    /// Serialize the arguments positionally
    fn into_payload(self) -> Result<Payload, serde_json::Error>;
}

impl IntoPayload for () {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::default())
    }
}

impl IntoPayload for Payload {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(self)
    }
}

impl IntoPayload for Vec<Value> {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload(self))
    }
}

macro_rules! impl_into_payload_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> IntoPayload for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_payload(self) -> Result<Payload, serde_json::Error> {
                let ($($name,)+) = self;
                Ok(Payload(vec![$(serde_json::to_value($name)?),+]))
            }
        }
    };
}

impl_into_payload_for_tuple!(A);
impl_into_payload_for_tuple!(A, B);
impl_into_payload_for_tuple!(A, B, C);
impl_into_payload_for_tuple!(A, B, C, D);

/// Synthesized mutation aimed at one field's params
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAction {
    /// Synthesized type
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Field id
    pub target_field: String,
    /// Positional arguments for the mutation leaf
    pub payload: Payload,
}

/// Synthesized mutation aimed at one rule's params
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    /// Synthesized type
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Dotted rule path, e.g. `fieldId.params.label`
    pub target_path: String,
    /// Positional arguments for the mutation leaf
    pub payload: Payload,
}

/// Section addressed by an insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum SectionTarget {
    /// Existing section by index; falls back to a new section when out of range
    Section(usize),
    /// The footer field list
    Footer,
    /// A freshly appended section
    #[default]
    NewSection,
}

impl From<Option<i64>> for SectionTarget {
    fn from(raw: Option<i64>) -> Self {
        match raw {
            Some(FOOTER_SECTION_INDEX) => SectionTarget::Footer,
            Some(i) if i >= 0 => SectionTarget::Section(i as usize),
            _ => SectionTarget::NewSection,
        }
    }
}

impl From<SectionTarget> for Option<i64> {
    fn from(target: SectionTarget) -> Self {
        match target {
            SectionTarget::Section(i) => Some(i as i64),
            SectionTarget::Footer => Some(FOOTER_SECTION_INDEX),
            SectionTarget::NewSection => None,
        }
    }
}

/// Structural actions with fixed `@form/...` types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum FormAction {
    /// Add a field of `field_class` to the layout
    #[serde(rename = "@form/insertField", rename_all = "camelCase")]
    InsertField {
        field_class: String,
        #[serde(default)]
        section_index: SectionTarget,
        position: InsertPosition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_id: Option<String>,
    },

    /// Delete a field, its layout slot and its rules
    #[serde(rename = "@form/removeField", rename_all = "camelCase")]
    RemoveField { field_id: String },

    /// Replace or deep-merge a field's params without going through mutations
    #[serde(rename = "@form/setParams", rename_all = "camelCase")]
    SetParams {
        field_id: String,
        params: Value,
        #[serde(default)]
        merge: bool,
    },

    /// Switch a field to another class, resetting its params
    #[serde(rename = "@form/setFieldClass", rename_all = "camelCase")]
    SetFieldClass { field_id: String, field_class: String },

    /// Attach a rule at a dotted path
    #[serde(rename = "@form/addRule", rename_all = "camelCase")]
    AddRule {
        target_path: String,
        calculable_class: String,
    },

    /// Detach the rule at a dotted path
    #[serde(rename = "@form/removeRule", rename_all = "camelCase")]
    RemoveRule { target_path: String },

    /// Change the calculable class of a rule, resetting its params
    #[serde(rename = "@form/setRuleType", rename_all = "camelCase")]
    SetRuleType {
        target_path: String,
        calculable_class: String,
    },
}

/// Any action the form reducer accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// Synthesized field mutation
    Field(FieldAction),
    /// Synthesized rule mutation
    Rule(RuleAction),
    /// Structural change
    Form(FormAction),
}

impl Action {
    /// `@form/insertField`
    pub fn insert_field(
        field_class: impl Into<String>,
        section_index: SectionTarget,
        position: InsertPosition,
        created_id: Option<String>,
    ) -> Self {
        Action::Form(FormAction::InsertField {
            field_class: field_class.into(),
            section_index,
            position,
            created_id,
        })
    }

    /// `@form/removeField`
    pub fn remove_field(field_id: impl Into<String>) -> Self {
        Action::Form(FormAction::RemoveField {
            field_id: field_id.into(),
        })
    }

    /// `@form/setParams`
    pub fn set_params(field_id: impl Into<String>, params: Value, merge: bool) -> Self {
        Action::Form(FormAction::SetParams {
            field_id: field_id.into(),
            params,
            merge,
        })
    }

    /// `@form/setFieldClass`
    pub fn set_field_class(field_id: impl Into<String>, field_class: impl Into<String>) -> Self {
        Action::Form(FormAction::SetFieldClass {
            field_id: field_id.into(),
            field_class: field_class.into(),
        })
    }

    /// `@form/addRule`
    pub fn add_rule(target_path: impl Into<String>, calculable_class: impl Into<String>) -> Self {
        Action::Form(FormAction::AddRule {
            target_path: target_path.into(),
            calculable_class: calculable_class.into(),
        })
    }

    /// `@form/removeRule`
    pub fn remove_rule(target_path: impl Into<String>) -> Self {
        Action::Form(FormAction::RemoveRule {
            target_path: target_path.into(),
        })
    }

    /// `@form/setRuleType`
    pub fn set_rule_type(
        target_path: impl Into<String>,
        calculable_class: impl Into<String>,
    ) -> Self {
        Action::Form(FormAction::SetRuleType {
            target_path: target_path.into(),
            calculable_class: calculable_class.into(),
        })
    }

    /// Type string as it appears on the wire
    pub fn type_name(&self) -> String {
        match self {
            Action::Field(a) => a.action_type.to_string(),
            Action::Rule(a) => a.action_type.to_string(),
            Action::Form(f) => match f {
                FormAction::InsertField { .. } => "@form/insertField",
                FormAction::RemoveField { .. } => "@form/removeField",
                FormAction::SetParams { .. } => "@form/setParams",
                FormAction::SetFieldClass { .. } => "@form/setFieldClass",
                FormAction::AddRule { .. } => "@form/addRule",
                FormAction::RemoveRule { .. } => "@form/removeRule",
                FormAction::SetRuleType { .. } => "@form/setRuleType",
            }
            .to_string(),
        }
    }
}
