//! Input validation through each field class's `on_validate` callback
//!
//! Hidden fields are never validated.

use crate::descriptor::{FormData, FormDescriptor};
use crate::schema::ClassRegistry;
use indexmap::IndexMap;
use serde_json::Value;

/// Validate every visible field, returning field id -> message
pub fn validate_form(data: &FormData, descriptor: &FormDescriptor, registry: &ClassRegistry) -> IndexMap<String, String> {
    descriptor
        .fields
        .iter()
        .filter(|(_, field)| !field.hidden)
        .filter_map(|(id, field)| {
            let value = data.get(id).unwrap_or(&Value::Null);
            registry
                .field_meta(&field.field_class)
                .and_then(|meta| meta.validate(&field.params, value))
                .map(|message| (id.clone(), message))
        })
        .collect()
}

/// Validate one value for `field_id`; `None` when valid, hidden or unknown
pub fn validate_field(
    field_id: &str,
    value: &Value,
    descriptor: &FormDescriptor,
    registry: &ClassRegistry,
) -> Option<String> {
    let field = descriptor.field(field_id)?;
    if field.hidden {
        return None;
    }
    registry.field_meta(&field.field_class)?.validate(&field.params, value)
}
