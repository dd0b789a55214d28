//! Reducer over the `rules` map of a descriptor
//!
//! Handles synthesized calculable mutations (keyed by dotted rule path) and
//! the `@form/addRule`, `@form/removeRule` and `@form/setRuleType`
//! structural actions. Anything else returns the input `Arc` untouched.

use crate::action::{Action, FormAction, RuleAction};
use crate::descriptor::{RuleEntry, RuleMap};
use crate::schema::ClassRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rule map reducer bound to a registry
#[derive(Debug, Clone)]
pub struct RuleReducer {
    registry: Arc<ClassRegistry>,
}

impl RuleReducer {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }

    /// Apply `action` to `rules`
    ///
    /// Returns the same `Arc` when nothing changed.
    pub fn reduce(&self, rules: &Arc<RuleMap>, action: &Action) -> Arc<RuleMap> {
        match action {
            Action::Rule(rule_action) => self.reduce_params(rules, rule_action),
            Action::Form(FormAction::AddRule {
                target_path,
                calculable_class,
            }) => match self.init_entry(calculable_class) {
                Some(entry) => {
                    debug!(path = %target_path, class = %calculable_class, "rule added");
                    with_entry(rules, target_path, entry)
                }
                None => Arc::clone(rules),
            },
            Action::Form(FormAction::RemoveRule { target_path }) => {
                if !rules.contains_key(target_path) {
                    debug!(path = %target_path, "no rule to remove");
                    return Arc::clone(rules);
                }
                let mut next = RuleMap::clone(rules);
                next.shift_remove(target_path);
                Arc::new(next)
            }
            Action::Form(FormAction::SetRuleType {
                target_path,
                calculable_class,
            }) => {
                if rules
                    .get(target_path)
                    .is_some_and(|r| &r.calculable_class == calculable_class)
                {
                    return Arc::clone(rules);
                }
                match self.init_entry(calculable_class) {
                    Some(entry) => with_entry(rules, target_path, entry),
                    None => Arc::clone(rules),
                }
            }
            _ => Arc::clone(rules),
        }
    }

    fn reduce_params(&self, rules: &Arc<RuleMap>, action: &RuleAction) -> Arc<RuleMap> {
        let Some(current) = rules.get(&action.target_path) else {
            warn!(path = %action.target_path, "rule does not exist");
            return Arc::clone(rules);
        };
        let Some(reducer) = self.registry.calculable_reducer(&current.calculable_class) else {
            warn!(class = %current.calculable_class, "calculable class is not registered");
            return Arc::clone(rules);
        };

        let next_params = reducer.reduce(Some(&current.params), &action.action_type, &action.payload);
        if Arc::ptr_eq(&next_params, &current.params) {
            return Arc::clone(rules);
        }

        let entry = RuleEntry {
            calculable_class: current.calculable_class.clone(),
            params: next_params,
        };
        with_entry(rules, &action.target_path, entry)
    }

    fn init_entry(&self, calculable_class: &str) -> Option<RuleEntry> {
        match self.registry.calculable_reducer(calculable_class) {
            Some(reducer) => Some(RuleEntry {
                calculable_class: calculable_class.to_string(),
                params: reducer.init(),
            }),
            None => {
                warn!(class = calculable_class, "calculable class is not registered; rule ignored");
                None
            }
        }
    }
}

fn with_entry(rules: &RuleMap, path: &str, entry: RuleEntry) -> Arc<RuleMap> {
    let mut next = rules.clone();
    next.insert(path.to_string(), entry);
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Payload;
    use crate::params::MutationTree;
    use crate::schema::{CalculableClass, SchemaBuilder};
    use serde_json::json;

    fn reducer() -> RuleReducer {
        let mut builder = SchemaBuilder::new(false);
        builder
            .calculable(
                "Flag",
                CalculableClass::new("boolean", json!({"on": false}), |ctx| ctx.params["on"].clone()).mutations(
                    MutationTree::new().mutation("setOn", |p, args| {
                        p["on"] = args.arg(0)?;
                        Ok(())
                    }),
                ),
            )
            .unwrap()
            .calculable("Zero", CalculableClass::new("number", json!({}), |_| json!(0)))
            .unwrap();
        RuleReducer::new(Arc::new(builder.build().unwrap()))
    }

    fn set_on(reducer: &RuleReducer, path: &str, on: bool) -> Action {
        reducer
            .registry
            .calculable_action_creators("Flag")
            .unwrap()
            .get("setOn")
            .unwrap()
            .create(path, Payload::new(vec![json!(on)]))
    }

    #[test]
    fn test_add_mutate_remove() {
        let reducer = reducer();
        let empty = Arc::new(RuleMap::new());

        let added = reducer.reduce(&empty, &Action::add_rule("a.hidden", "Flag"));
        assert_eq!(*added["a.hidden"].params, json!({"on": false}));

        let switched = reducer.reduce(&added, &set_on(&reducer, "a.hidden", true));
        assert_eq!(*switched["a.hidden"].params, json!({"on": true}));
        assert_eq!(*added["a.hidden"].params, json!({"on": false}));

        let removed = reducer.reduce(&switched, &Action::remove_rule("a.hidden"));
        assert!(removed.is_empty());
    }

    #[test]
    fn test_noops_keep_reference() {
        let reducer = reducer();
        let rules = reducer.reduce(&Arc::new(RuleMap::new()), &Action::add_rule("a.hidden", "Flag"));

        let cases = [
            set_on(&reducer, "a.hidden", false),
            set_on(&reducer, "missing.hidden", true),
            Action::remove_rule("missing.hidden"),
            Action::set_rule_type("a.hidden", "Flag"),
            Action::add_rule("b.hidden", "Unknown"),
            Action::remove_field("a"),
        ];
        for action in cases {
            let next = reducer.reduce(&rules, &action);
            assert!(Arc::ptr_eq(&rules, &next), "{}", action.type_name());
        }
    }

    #[test]
    fn test_set_rule_type_reinitializes() {
        let reducer = reducer();
        let rules = reducer.reduce(&Arc::new(RuleMap::new()), &Action::add_rule("a.params.n", "Flag"));
        let rules = reducer.reduce(&rules, &set_on(&reducer, "a.params.n", true));

        let retyped = reducer.reduce(&rules, &Action::set_rule_type("a.params.n", "Zero"));
        assert_eq!(retyped["a.params.n"].calculable_class, "Zero");
        assert_eq!(*retyped["a.params.n"].params, json!({}));
    }
}
