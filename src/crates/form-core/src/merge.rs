//! Deep merge of parameter structures
//!
//! | Base | Patch | Result |
//! |------|-------|--------|
//! | array | array | concatenation |
//! | array | other | patch appended as one element |
//! | object | object | key-wise merge, recursively |
//! | anything | anything else | patch |
//!
//! Lists are concatenated rather than merged element by element, so merging
//! `{choices: ["c"]}` into `{choices: ["a", "b"]}` yields three choices.

use serde_json::Value;

/// Merge `patch` into `base`, returning a new value
pub fn merge_params(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Array(items), Value::Array(more)) => {
            let mut result = items.clone();
            result.extend_from_slice(more);
            Value::Array(result)
        }
        (Value::Array(items), single) => {
            let mut result = items.clone();
            result.push(single.clone());
            Value::Array(result)
        }
        (Value::Object(base_obj), Value::Object(patch_obj)) => {
            let mut result = base_obj.clone();
            for (key, value) in patch_obj {
                let merged = match base_obj.get(key) {
                    Some(existing) => merge_params(existing, value),
                    None => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }
        (_, replacement) => replacement.clone(),
    }
}
