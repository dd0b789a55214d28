//! Form descriptor reducer
//!
//! [`FormReducer::reduce`] is a pure transition
//! `(Arc<FormDescriptor>, &Action) -> Arc<FormDescriptor>` resolved in
//! three stages:
//!
//! 1. A field mutation aimed at an existing field runs through that field
//!    class's synthesized reducer. Only `fields[id].params` is replaced.
//! 2. Otherwise the [`RuleReducer`] gets a chance at the rules map.
//! 3. Otherwise structural `@form/...` actions edit fields and layout.
//!
//! Any transition that changes nothing returns the input `Arc`, so callers
//! detect change with `Arc::ptr_eq`. Invalid runtime input (unknown ids,
//! unknown classes, rejected mutations) logs a warning and changes nothing.

use crate::action::{Action, FieldAction, FormAction, SectionTarget};
use crate::descriptor::{rule_host, FieldEntry, FieldMap, Footer, FormDescriptor, Layout};
use crate::id::IdGenerator;
use crate::layout::{
    insert_field_to_array, insert_field_to_layout, remove_field_from_layout, remove_field_rules,
    remove_params_rules, InsertPosition,
};
use crate::merge::merge_params;
use crate::rule_reducer::RuleReducer;
use crate::schema::ClassRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reducer over whole form descriptors
#[derive(Debug, Clone)]
pub struct FormReducer {
    registry: Arc<ClassRegistry>,
    rules: RuleReducer,
    ids: IdGenerator,
}

impl FormReducer {
    /// Reducer with random field ids
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self {
            rules: RuleReducer::new(Arc::clone(&registry)),
            registry,
            ids: IdGenerator::default(),
        }
    }

    /// Replace the id generator
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    /// Allocate an id not yet used by `state`
    pub fn allocate_id(&self, state: &FormDescriptor) -> String {
        self.ids.create_uid(|id| state.fields.contains_key(id))
    }

    /// Apply `action` to `state`
    pub fn reduce(&self, state: &Arc<FormDescriptor>, action: &Action) -> Arc<FormDescriptor> {
        if let Action::Field(field_action) = action {
            if state.fields.contains_key(&field_action.target_field) {
                return self.reduce_field_params(state, field_action);
            }
            debug!(field_id = %field_action.target_field, "field action for missing field");
        }

        if let Some(path) = rule_target_without_host(state, action) {
            warn!(path, "rule targets a field that does not exist; ignored");
            return Arc::clone(state);
        }
        let next_rules = self.rules.reduce(&state.rules, action);
        if !Arc::ptr_eq(&next_rules, &state.rules) {
            return Arc::new(FormDescriptor {
                rules: next_rules,
                ..FormDescriptor::clone(state)
            });
        }

        let Action::Form(form_action) = action else {
            return Arc::clone(state);
        };

        match form_action {
            FormAction::InsertField {
                field_class,
                section_index,
                position,
                created_id,
            } => self.insert_field(state, field_class, *section_index, position, created_id.as_deref()),
            FormAction::RemoveField { field_id } => remove_field(state, field_id),
            FormAction::SetParams {
                field_id,
                params,
                merge,
            } => set_params(state, field_id, params, *merge),
            FormAction::SetFieldClass { field_id, field_class } => self.set_field_class(state, field_id, field_class),
            FormAction::AddRule { .. } | FormAction::RemoveRule { .. } | FormAction::SetRuleType { .. } => {
                Arc::clone(state)
            }
        }
    }

    fn reduce_field_params(&self, state: &Arc<FormDescriptor>, action: &FieldAction) -> Arc<FormDescriptor> {
        let Some(current) = state.fields.get(&action.target_field) else {
            return Arc::clone(state);
        };
        let Some(reducer) = self.registry.field_reducer(&current.field_class) else {
            warn!(class = %current.field_class, "field class is not registered");
            return Arc::clone(state);
        };

        let next_params = reducer.reduce(Some(&current.params), &action.action_type, &action.payload);
        if Arc::ptr_eq(&next_params, &current.params) {
            return Arc::clone(state);
        }

        let entry = FieldEntry {
            params: next_params,
            ..current.clone()
        };
        with_field(state, &action.target_field, entry)
    }

    fn insert_field(
        &self,
        state: &Arc<FormDescriptor>,
        field_class: &str,
        section: SectionTarget,
        position: &InsertPosition,
        created_id: Option<&str>,
    ) -> Arc<FormDescriptor> {
        let id = match created_id {
            Some(id) => id.to_string(),
            None => self.allocate_id(state),
        };
        if state.fields.contains_key(&id) {
            warn!(field_id = %id, "duplicated field id; insert ignored");
            return Arc::clone(state);
        }
        let Some(reducer) = self.registry.field_reducer(field_class) else {
            warn!(class = field_class, "field class is not registered; insert ignored");
            return Arc::clone(state);
        };

        let mut fields = FieldMap::clone(&state.fields);
        fields.insert(id.clone(), FieldEntry::new(field_class, reducer.init()));

        let mut layout = Layout::clone(&state.layout);
        match section {
            SectionTarget::Footer => {
                let footer = layout.footer.get_or_insert_with(Footer::default);
                footer.fields = insert_field_to_array(&footer.fields, position, &id);
            }
            SectionTarget::Section(index) => {
                layout.sections = insert_field_to_layout(&layout.sections, Some(index), &id, position);
            }
            SectionTarget::NewSection => {
                layout.sections = insert_field_to_layout(&layout.sections, None, &id, position);
            }
        }

        debug!(field_id = %id, class = field_class, "field inserted");
        Arc::new(FormDescriptor {
            fields: Arc::new(fields),
            layout: Arc::new(layout),
            ..FormDescriptor::clone(state)
        })
    }

    fn set_field_class(&self, state: &Arc<FormDescriptor>, field_id: &str, field_class: &str) -> Arc<FormDescriptor> {
        let Some(current) = state.fields.get(field_id) else {
            warn!(field_id, "field does not exist; class unchanged");
            return Arc::clone(state);
        };
        if current.field_class == field_class {
            return Arc::clone(state);
        }
        let Some(reducer) = self.registry.field_reducer(field_class) else {
            warn!(class = field_class, "field class is not registered; class unchanged");
            return Arc::clone(state);
        };

        let entry = FieldEntry {
            field_class: field_class.to_string(),
            params: reducer.init(),
            hidden: current.hidden,
            extra: current.extra.clone(),
        };
        let next = with_field(state, field_id, entry);
        Arc::new(FormDescriptor {
            rules: Arc::new(remove_params_rules(&state.rules, field_id)),
            ..FormDescriptor::clone(&next)
        })
    }
}

/// Path of an add/retype rule action whose host field is missing
fn rule_target_without_host<'a>(state: &FormDescriptor, action: &'a Action) -> Option<&'a str> {
    match action {
        Action::Form(FormAction::AddRule { target_path, .. })
        | Action::Form(FormAction::SetRuleType { target_path, .. }) => {
            (!state.fields.contains_key(rule_host(target_path))).then_some(target_path.as_str())
        }
        _ => None,
    }
}

fn with_field(state: &FormDescriptor, field_id: &str, entry: FieldEntry) -> Arc<FormDescriptor> {
    let mut fields = FieldMap::clone(&state.fields);
    fields.insert(field_id.to_string(), entry);
    Arc::new(FormDescriptor {
        fields: Arc::new(fields),
        ..state.clone()
    })
}

fn remove_field(state: &Arc<FormDescriptor>, field_id: &str) -> Arc<FormDescriptor> {
    if !state.fields.contains_key(field_id) {
        warn!(field_id, "no field matched id; nothing removed");
        return Arc::clone(state);
    }

    let mut fields = FieldMap::clone(&state.fields);
    fields.shift_remove(field_id);

    let mut layout = Layout::clone(&state.layout);
    let in_footer = layout
        .footer
        .as_mut()
        .and_then(|footer| {
            let idx = footer.fields.iter().position(|f| f == field_id)?;
            footer.fields.remove(idx);
            Some(())
        })
        .is_some();
    if !in_footer {
        layout.sections = remove_field_from_layout(&layout.sections, field_id);
    }

    debug!(field_id, "field removed");
    Arc::new(FormDescriptor {
        fields: Arc::new(fields),
        layout: Arc::new(layout),
        rules: Arc::new(remove_field_rules(&state.rules, field_id)),
        ..FormDescriptor::clone(state)
    })
}

fn set_params(state: &Arc<FormDescriptor>, field_id: &str, params: &Value, merge: bool) -> Arc<FormDescriptor> {
    let Some(current) = state.fields.get(field_id) else {
        warn!(field_id, "field does not exist; params unchanged");
        return Arc::clone(state);
    };

    let next = if merge {
        merge_params(&current.params, params)
    } else {
        params.clone()
    };
    if next == *current.params {
        return Arc::clone(state);
    }

    let entry = FieldEntry {
        params: Arc::new(next),
        ..current.clone()
    };
    with_field(state, field_id, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Payload;
    use crate::params::MutationTree;
    use crate::schema::{CalculableClass, FieldClass, SchemaBuilder};
    use serde_json::json;

    fn registry() -> Arc<ClassRegistry> {
        let mut builder = SchemaBuilder::new(false);
        builder
            .append(
                "Text",
                FieldClass::new(json!({"label": ""}), json!("")).mutations(MutationTree::new().mutation(
                    "setLabel",
                    |p, args| {
                        p["label"] = args.arg(0)?;
                        Ok(())
                    },
                )),
            )
            .unwrap()
            .append("Number", FieldClass::new(json!({"min": 0}), json!(0)))
            .unwrap()
            .calculable("Always", CalculableClass::new("boolean", json!({}), |_| json!(true)))
            .unwrap();
        Arc::new(builder.build().unwrap())
    }

    fn insert(reducer: &FormReducer, state: &Arc<FormDescriptor>, class: &str, id: &str) -> Arc<FormDescriptor> {
        reducer.reduce(
            state,
            &Action::insert_field(class, SectionTarget::Section(0), InsertPosition::Last, Some(id.to_string())),
        )
    }

    #[test]
    fn test_insert_initializes_params() {
        let reducer = FormReducer::new(registry());
        let state = Arc::new(FormDescriptor::new("1"));

        let state = insert(&reducer, &state, "Text", "a");
        let state = insert(&reducer, &state, "Number", "b");

        assert_eq!(*state.field("a").unwrap().params, json!({"label": ""}));
        assert_eq!(state.layout.sections.len(), 1);
        assert_eq!(state.layout.sections[0].fields, vec!["a", "b"]);
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn test_insert_generates_unique_id() {
        let reducer = FormReducer::new(registry());
        let state = Arc::new(FormDescriptor::new("1"));
        let action = Action::insert_field("Text", SectionTarget::Footer, InsertPosition::First, None);

        let state = reducer.reduce(&state, &action);
        let state = reducer.reduce(&state, &action);

        assert_eq!(state.fields.len(), 2);
        assert_eq!(state.layout.footer.as_ref().unwrap().fields.len(), 2);
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn test_insert_refusals() {
        let reducer = FormReducer::new(registry());
        let state = insert(&reducer, &Arc::new(FormDescriptor::new("1")), "Text", "a");

        assert!(Arc::ptr_eq(&state, &insert(&reducer, &state, "Text", "a")));
        assert!(Arc::ptr_eq(&state, &insert(&reducer, &state, "Unknown", "z")));
    }

    #[test]
    fn test_field_mutation_replaces_only_params() {
        let registry = registry();
        let reducer = FormReducer::new(Arc::clone(&registry));
        let state = insert(&reducer, &Arc::new(FormDescriptor::new("1")), "Text", "a");

        let set_label = registry.field_action_creators("Text").unwrap().get("setLabel").unwrap();
        let next = reducer.reduce(&state, &set_label.create("a", Payload::new(vec![json!("Age")])));

        assert_eq!(next.field("a").unwrap().params["label"], "Age");
        assert!(Arc::ptr_eq(&state.layout, &next.layout));
        assert!(Arc::ptr_eq(&state.rules, &next.rules));

        let again = reducer.reduce(&next, &set_label.create("a", Payload::new(vec![json!("Age")])));
        assert!(Arc::ptr_eq(&next, &again));
    }

    #[test]
    fn test_set_params_replace_and_merge() {
        let reducer = FormReducer::new(registry());
        let state = insert(&reducer, &Arc::new(FormDescriptor::new("1")), "Text", "a");

        let merged = reducer.reduce(&state, &Action::set_params("a", json!({"extra": [1]}), true));
        assert_eq!(*merged.field("a").unwrap().params, json!({"label": "", "extra": [1]}));

        let merged = reducer.reduce(&merged, &Action::set_params("a", json!({"extra": [2]}), true));
        assert_eq!(merged.field("a").unwrap().params["extra"], json!([1, 2]));

        let replaced = reducer.reduce(&merged, &Action::set_params("a", json!({"label": "x"}), false));
        assert_eq!(*replaced.field("a").unwrap().params, json!({"label": "x"}));

        let same = reducer.reduce(&replaced, &Action::set_params("a", json!({"label": "x"}), false));
        assert!(Arc::ptr_eq(&replaced, &same));
    }

    #[test]
    fn test_add_rule_requires_live_host() {
        let reducer = FormReducer::new(registry());
        let state = insert(&reducer, &Arc::new(FormDescriptor::new("1")), "Text", "a");

        let same = reducer.reduce(&state, &Action::add_rule("ghost.hidden", "Always"));
        assert!(Arc::ptr_eq(&state, &same));

        let ruled = reducer.reduce(&state, &Action::add_rule("a.hidden", "Always"));
        assert!(ruled.rule("a.hidden").is_some());
        assert!(Arc::ptr_eq(&state.fields, &ruled.fields));
    }

    #[test]
    fn test_unknown_targets_are_noops() {
        let reducer = FormReducer::new(registry());
        let state = insert(&reducer, &Arc::new(FormDescriptor::new("1")), "Text", "a");

        for action in [
            Action::remove_field("zz"),
            Action::set_params("zz", json!({}), false),
            Action::set_field_class("zz", "Number"),
            Action::set_field_class("a", "Text"),
            Action::set_field_class("a", "Unknown"),
            Action::remove_rule("a.hidden"),
        ] {
            let next = reducer.reduce(&state, &action);
            assert!(Arc::ptr_eq(&state, &next), "{}", action.type_name());
        }
    }
}
