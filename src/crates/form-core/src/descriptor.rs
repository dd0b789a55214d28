//! Form descriptor: the single serializable state object of one form
//!
//! ```text
//! FormDescriptor
//! ├── schemaVersion, name, title
//! ├── fields: fieldId -> { fieldClass, hidden, params, ...rule outputs }
//! ├── rules:  dotted path -> { calculableClass, params }
//! └── layout: { sections: [{ title, description, fields }], footer?: { fields } }
//! ```
//!
//! Every sub-structure sits behind an [`Arc`]. Transitions never write
//! through a shared `Arc`; they build a replacement and leave the previous
//! snapshot intact, so `Arc::ptr_eq` on any branch tells whether it changed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Immutable parameter structure shared between snapshots
pub type Params = Arc<Value>;

/// Field id -> field entry, in insertion order
pub type FieldMap = IndexMap<String, FieldEntry>;

/// Dotted path -> rule entry, in insertion order
pub type RuleMap = IndexMap<String, RuleEntry>;

/// Input data of a filled-in form, keyed by field id
pub type FormData = Map<String, Value>;

/// One field instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    /// Registered field class name
    pub field_class: String,
    /// Visibility, usually driven by a `<fieldId>.hidden` rule
    #[serde(default)]
    pub hidden: bool,
    /// Class-specific parameters
    pub params: Params,
    /// Other rule targets, such as `value`, stored next to the known keys
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl FieldEntry {
    /// Visible field of `field_class` with the given params
    pub fn new(field_class: impl Into<String>, params: Params) -> Self {
        Self {
            field_class: field_class.into(),
            hidden: false,
            params,
            extra: Map::new(),
        }
    }

    /// Write `value` at a path relative to this entry (`hidden`, `params.x.y`,
    /// `value`, `meta.x`)
    ///
    /// Paths outside `hidden` and `params` land in [`FieldEntry::extra`],
    /// creating intermediate objects. Returns false for an empty path, for
    /// `fieldClass` and for paths below `hidden`.
    pub fn set_at_path(&mut self, path: &[&str], value: Value) -> bool {
        match path {
            ["hidden"] => {
                self.hidden = value.as_bool().unwrap_or(false);
                true
            }
            ["params", rest @ ..] => {
                set_value_at(Arc::make_mut(&mut self.params), rest, value);
                true
            }
            [] | ["fieldClass", ..] | ["hidden", ..] => false,
            [head, rest @ ..] => {
                let slot = self.extra.entry(head.to_string()).or_insert(Value::Null);
                set_value_at(slot, rest, value);
                true
            }
        }
    }
}

/// One rule instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    /// Registered calculable class name
    pub calculable_class: String,
    /// Class-specific parameters
    pub params: Params,
}

/// Ordered group of fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSection {
    #[serde(default, alias = "sectionTitle")]
    pub title: String,
    #[serde(default, alias = "sectionDescription")]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Fields pinned below all sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Order and organization of the fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub sections: Vec<FormSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
}

impl Layout {
    /// Every field id referenced by the layout, sections first, then footer
    pub fn field_ids(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .chain(self.footer.iter().flat_map(|f| f.fields.iter()))
            .map(String::as_str)
            .collect()
    }
}

/// Full state of one form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDescriptor {
    #[serde(default)]
    pub schema_version: String,
    /// User defined form name
    #[serde(default)]
    pub name: String,
    /// Form title
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Arc<FieldMap>,
    #[serde(default)]
    pub rules: Arc<RuleMap>,
    #[serde(default)]
    pub layout: Arc<Layout>,
}

impl FormDescriptor {
    /// Empty descriptor stamped with `schema_version`
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            ..Self::default()
        }
    }

    /// Field entry by id
    pub fn field(&self, field_id: &str) -> Option<&FieldEntry> {
        self.fields.get(field_id)
    }

    /// Rule entry by dotted path
    pub fn rule(&self, path: &str) -> Option<&RuleEntry> {
        self.rules.get(path)
    }

    /// Write `value` at a dotted path inside the field map
    ///
    /// The first segment names the field. Shared branches are copied before
    /// the write, so snapshots this descriptor was cloned from stay intact.
    /// Returns false when the field does not exist or the path is not
    /// writable.
    pub fn set_at_path(&mut self, path: &str, value: Value) -> bool {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((field_id, rest)) = segments.split_first() else {
            return false;
        };
        if !self.fields.contains_key(*field_id) {
            return false;
        }

        Arc::make_mut(&mut self.fields)
            .get_mut(*field_id)
            .map(|entry| entry.set_at_path(rest, value))
            .unwrap_or(false)
    }

    /// Describe every broken structural invariant, empty when consistent
    ///
    /// Checks that layout ids are unique and live, and that every rule path
    /// starts with a live field id.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for id in self.layout.field_ids() {
            if !seen.insert(id) {
                problems.push(format!("field \"{id}\" appears more than once in layout"));
            }
            if !self.fields.contains_key(id) {
                problems.push(format!("layout references unknown field \"{id}\""));
            }
        }
        for id in self.fields.keys() {
            if !seen.contains(id.as_str()) {
                problems.push(format!("field \"{id}\" is missing from layout"));
            }
        }
        for path in self.rules.keys() {
            if !self.fields.contains_key(rule_host(path)) {
                problems.push(format!("rule \"{path}\" targets an unknown field"));
            }
        }

        problems
    }
}

/// Field id a dotted rule path belongs to
pub fn rule_host(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Read the value at `path` inside `root`
pub fn value_at<'v>(root: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `path` inside `root`, creating intermediate objects
///
/// A numeric segment addressing an existing array element writes into the
/// array; any other non-object on the way is replaced by an object.
pub fn set_value_at(root: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *root = value;
        return;
    };

    if let Value::Array(items) = root {
        if let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            set_value_at(slot, rest, value);
            return;
        }
    }

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(map) = root {
        let slot = map.entry(head.to_string()).or_insert(Value::Null);
        set_value_at(slot, rest, value);
    }
}
