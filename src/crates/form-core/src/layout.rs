//! Pure operations over field-id sequences and section lists
//!
//! Every function returns a fresh value and leaves its input untouched.
//! Out-of-range moves are silent no-ops.

use crate::descriptor::{rule_host, FormSection, RuleMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Where to put a field id inside an id list
///
/// Wire form: `["first"]`, `["last"]`, `["before", id]`, `["after", id]`.
/// `before`/`after` fall back to the end of the list when `id` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub enum InsertPosition {
    First,
    Last,
    Before(String),
    After(String),
}

impl TryFrom<Vec<String>> for InsertPosition {
    type Error = String;

    fn try_from(raw: Vec<String>) -> Result<Self, Self::Error> {
        match raw.as_slice() {
            [kind] if kind == "first" => Ok(InsertPosition::First),
            [kind] if kind == "last" => Ok(InsertPosition::Last),
            [kind, id] if kind == "before" => Ok(InsertPosition::Before(id.clone())),
            [kind, id] if kind == "after" => Ok(InsertPosition::After(id.clone())),
            _ => Err(format!("invalid insert position {:?}", raw)),
        }
    }
}

impl From<InsertPosition> for Vec<String> {
    fn from(position: InsertPosition) -> Self {
        match position {
            InsertPosition::First => vec!["first".to_string()],
            InsertPosition::Last => vec!["last".to_string()],
            InsertPosition::Before(id) => vec!["before".to_string(), id],
            InsertPosition::After(id) => vec!["after".to_string(), id],
        }
    }
}

/// Where to put an item inside a list, by index
///
/// Wire form: `["first"]`, `["last"]`, `["before", n]`, `["after", n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub enum ArrayPosition {
    First,
    #[default]
    Last,
    Before(usize),
    After(usize),
}

impl TryFrom<Vec<Value>> for ArrayPosition {
    type Error = String;

    fn try_from(raw: Vec<Value>) -> Result<Self, Self::Error> {
        let index = |v: &Value| v.as_u64().map(|n| n as usize);
        match raw.as_slice() {
            [kind] if kind == "first" => Ok(ArrayPosition::First),
            [kind] if kind == "last" => Ok(ArrayPosition::Last),
            [kind, n] if kind == "before" && index(n).is_some() => {
                Ok(ArrayPosition::Before(index(n).unwrap_or_default()))
            }
            [kind, n] if kind == "after" && index(n).is_some() => {
                Ok(ArrayPosition::After(index(n).unwrap_or_default()))
            }
            _ => Err(format!("invalid array position {:?}", raw)),
        }
    }
}

impl From<ArrayPosition> for Vec<Value> {
    fn from(position: ArrayPosition) -> Self {
        match position {
            ArrayPosition::First => vec![Value::from("first")],
            ArrayPosition::Last => vec![Value::from("last")],
            ArrayPosition::Before(i) => vec![Value::from("before"), Value::from(i)],
            ArrayPosition::After(i) => vec![Value::from("after"), Value::from(i)],
        }
    }
}

/// Empty section with optional title and description
pub fn create_section(title: Option<&str>, description: Option<&str>) -> FormSection {
    FormSection {
        title: title.unwrap_or_default().to_string(),
        description: description.unwrap_or_default().to_string(),
        fields: Vec::new(),
    }
}

/// Insert `field_id` into an id list
pub fn insert_field_to_array(list: &[String], position: &InsertPosition, field_id: &str) -> Vec<String> {
    let id = field_id.to_string();
    match position {
        InsertPosition::First => std::iter::once(id).chain(list.iter().cloned()).collect(),
        InsertPosition::Last => list.iter().cloned().chain(std::iter::once(id)).collect(),
        InsertPosition::Before(anchor) => insert_before_or_last(list, anchor, id),
        InsertPosition::After(anchor) => insert_after_or_last(list, anchor, id),
    }
}

/// Insert `field_id` into section `section_index`
///
/// A missing or out-of-range index appends a new section holding the id.
pub fn insert_field_to_layout(
    sections: &[FormSection],
    section_index: Option<usize>,
    field_id: &str,
    position: &InsertPosition,
) -> Vec<FormSection> {
    let mut next = sections.to_vec();

    match section_index.filter(|&i| i < next.len()) {
        Some(i) => {
            next[i].fields = insert_field_to_array(&next[i].fields, position, field_id);
        }
        None => {
            let mut section = create_section(None, None);
            section.fields = insert_field_to_array(&section.fields, position, field_id);
            next.push(section);
        }
    }

    next
}

/// Remove `field_id` from every section that contains it
///
/// Logs a warning and returns an equal layout when nothing matched.
pub fn remove_field_from_layout(sections: &[FormSection], field_id: &str) -> Vec<FormSection> {
    let mut removed = false;

    let next = sections
        .iter()
        .map(|section| match section.fields.iter().position(|f| f == field_id) {
            Some(idx) => {
                removed = true;
                let mut fields = section.fields.clone();
                fields.remove(idx);
                FormSection {
                    fields,
                    ..section.clone()
                }
            }
            None => section.clone(),
        })
        .collect();

    if !removed {
        warn!(field_id, "no field matched id; nothing removed");
    }

    next
}

/// Insert `item` at an index-based position
///
/// Indices past the end clamp to the end of the list.
pub fn insert_array_position<T: Clone>(list: &[T], position: ArrayPosition, item: T) -> Vec<T> {
    let mut next = list.to_vec();
    match position {
        ArrayPosition::First => next.insert(0, item),
        ArrayPosition::Last => next.push(item),
        ArrayPosition::Before(i) => next.insert(i.min(next.len()), item),
        ArrayPosition::After(i) => next.insert((i + 1).min(next.len()), item),
    }
    next
}

/// Insert `item` right after `search`, or at the end when `search` is absent
pub fn insert_after_or_last<T: Clone + PartialEq>(list: &[T], search: &T, item: T) -> Vec<T> {
    let mut next = list.to_vec();
    match list.iter().position(|x| x == search) {
        Some(idx) => next.insert(idx + 1, item),
        None => next.push(item),
    }
    next
}

/// Insert `item` right before `search`, or at the end when `search` is absent
pub fn insert_before_or_last<T: Clone + PartialEq>(list: &[T], search: &T, item: T) -> Vec<T> {
    let mut next = list.to_vec();
    match list.iter().position(|x| x == search) {
        Some(idx) => next.insert(idx, item),
        None => next.push(item),
    }
    next
}

/// Swap the item at `index` with its predecessor
pub fn move_up<T: Clone>(list: &[T], index: usize) -> Vec<T> {
    let mut next = list.to_vec();
    if index == 0 || index >= list.len() {
        return next;
    }
    next.swap(index - 1, index);
    next
}

/// Swap the item at `index` with its successor
pub fn move_down<T: Clone>(list: &[T], index: usize) -> Vec<T> {
    let mut next = list.to_vec();
    if index + 1 >= list.len() {
        return next;
    }
    next.swap(index, index + 1);
    next
}

/// Drop every rule attached to `field_id`
///
/// A rule belongs to the field whose id is the first segment of its path.
pub fn remove_field_rules(rules: &RuleMap, field_id: &str) -> RuleMap {
    rules
        .iter()
        .filter(|(path, _)| rule_host(path) != field_id)
        .map(|(path, entry)| (path.clone(), entry.clone()))
        .collect()
}

/// Drop the rules attached to `field_id`'s params, keeping `hidden` rules
pub fn remove_params_rules(rules: &RuleMap, field_id: &str) -> RuleMap {
    rules
        .iter()
        .filter(|(path, _)| {
            let mut segments = path.split('.');
            !(segments.next() == Some(field_id) && segments.next() == Some("params"))
        })
        .map(|(path, entry)| (path.clone(), entry.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_field_to_array_positions() {
        let list = ids(&["a", "b", "c"]);

        assert_eq!(insert_field_to_array(&list, &InsertPosition::First, "x"), ids(&["x", "a", "b", "c"]));
        assert_eq!(insert_field_to_array(&list, &InsertPosition::Last, "x"), ids(&["a", "b", "c", "x"]));
        assert_eq!(
            insert_field_to_array(&list, &InsertPosition::Before("b".into()), "x"),
            ids(&["a", "x", "b", "c"])
        );
        assert_eq!(
            insert_field_to_array(&list, &InsertPosition::After("b".into()), "x"),
            ids(&["a", "b", "x", "c"])
        );
        // unknown anchor falls back to the end
        assert_eq!(
            insert_field_to_array(&list, &InsertPosition::Before("zz".into()), "x"),
            ids(&["a", "b", "c", "x"])
        );
    }

    #[test]
    fn test_insert_field_to_layout_creates_section() {
        let sections = vec![create_section(Some("One"), None)];

        let next = insert_field_to_layout(&sections, Some(4), "x", &InsertPosition::Last);
        assert_eq!(next.len(), 2);
        assert_eq!(next[1].fields, ids(&["x"]));

        let next = insert_field_to_layout(&sections, Some(0), "x", &InsertPosition::Last);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].title, "One");
        assert_eq!(next[0].fields, ids(&["x"]));

        // input untouched
        assert!(sections[0].fields.is_empty());
    }

    #[test]
    fn test_remove_field_from_layout_without_match() {
        let sections = vec![FormSection {
            fields: ids(&["a", "b"]),
            ..FormSection::default()
        }];

        let next = remove_field_from_layout(&sections, "zz");
        assert_eq!(next, sections);
    }

    #[test]
    fn test_insert_array_position() {
        let list = vec![1, 2, 3];
        assert_eq!(insert_array_position(&list, ArrayPosition::First, 0), vec![0, 1, 2, 3]);
        assert_eq!(insert_array_position(&list, ArrayPosition::Before(1), 9), vec![1, 9, 2, 3]);
        assert_eq!(insert_array_position(&list, ArrayPosition::After(1), 9), vec![1, 2, 9, 3]);
        assert_eq!(insert_array_position(&list, ArrayPosition::After(10), 9), vec![1, 2, 3, 9]);
    }

    #[test]
    fn test_move_boundaries_are_silent() {
        let list = vec!['a', 'b', 'c'];
        assert_eq!(move_up(&list, 0), list);
        assert_eq!(move_up(&list, 3), list);
        assert_eq!(move_down(&list, 2), list);
        assert_eq!(move_down(&Vec::<char>::new(), 0), Vec::<char>::new());
        assert_eq!(move_up(&list, 2), vec!['a', 'c', 'b']);
        assert_eq!(move_down(&list, 0), vec!['b', 'a', 'c']);
    }

    #[test]
    fn test_position_wire_forms() {
        let position: InsertPosition = serde_json::from_value(json!(["after", "a"])).unwrap();
        assert_eq!(position, InsertPosition::After("a".into()));
        assert!(serde_json::from_value::<InsertPosition>(json!(["sideways"])).is_err());

        let position: ArrayPosition = serde_json::from_value(json!(["before", 2])).unwrap();
        assert_eq!(position, ArrayPosition::Before(2));
        assert_eq!(serde_json::to_value(ArrayPosition::Last).unwrap(), json!(["last"]));
        assert!(serde_json::from_value::<ArrayPosition>(json!(["before", "x"])).is_err());
    }

    fn rule_map(paths: &[&str]) -> RuleMap {
        paths
            .iter()
            .map(|p| {
                (
                    p.to_string(),
                    crate::descriptor::RuleEntry {
                        calculable_class: "Condition".to_string(),
                        params: std::sync::Arc::new(json!({})),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_remove_field_rules_matches_whole_segment() {
        let rules = rule_map(&["a.hidden", "a.params.label", "ab.hidden", "b.params.x"]);

        let next = remove_field_rules(&rules, "a");
        let kept: Vec<&str> = next.keys().map(String::as_str).collect();
        assert_eq!(kept, vec!["ab.hidden", "b.params.x"]);
    }

    #[test]
    fn test_remove_params_rules_keeps_hidden() {
        let rules = rule_map(&["a.hidden", "a.params.label", "a.params.x.y", "b.params.x"]);

        let next = remove_params_rules(&rules, "a");
        let kept: Vec<&str> = next.keys().map(String::as_str).collect();
        assert_eq!(kept, vec!["a.hidden", "b.params.x"]);
    }

    proptest! {
        #[test]
        fn prop_insert_then_remove_restores_layout(
            existing in proptest::collection::vec("[a-z]{1,4}", 0..6),
            at_front in any::<bool>(),
        ) {
            let sections = vec![FormSection { fields: existing.clone(), ..FormSection::default() }];
            let position = if at_front { InsertPosition::First } else { InsertPosition::Last };

            let inserted = insert_field_to_layout(&sections, Some(0), "NEW_ID", &position);
            prop_assert_eq!(inserted[0].fields.len(), existing.len() + 1);

            let removed = remove_field_from_layout(&inserted, "NEW_ID");
            prop_assert_eq!(removed, sections);
        }

        #[test]
        fn prop_moves_preserve_elements(list in proptest::collection::vec(0u8..50, 0..8), index in 0usize..10) {
            let mut up = move_up(&list, index);
            let mut down = move_down(&list, index);
            let mut sorted = list.clone();
            sorted.sort();
            up.sort();
            down.sort();
            prop_assert_eq!(&up, &sorted);
            prop_assert_eq!(&down, &sorted);
        }
    }
}
