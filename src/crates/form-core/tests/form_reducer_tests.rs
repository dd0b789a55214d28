//! Integration tests for the descriptor state machine
//!
//! These tests drive a schema through its editor store the way a form editor
//! would, and check the structural guarantees callers depend on.

use form_core::layout::{remove_field_from_layout, InsertPosition};
use form_core::{
    Action, CalculableClass, FieldClass, FormBuilder, FormData, FormDescriptor, FormSchema, MutationTree,
    SectionTarget,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn schema() -> FormSchema {
    FormSchema::new("1.0.0", |builder| {
        builder
            .append(
                "Text",
                FieldClass::new(json!({"label": "", "fieldProps": {"placeholder": ""}}), json!(""))
                    .mutations(
                        MutationTree::new()
                            .mutation("setLabel", |p, args| {
                                p["label"] = args.arg(0)?;
                                Ok(())
                            })
                            .with(
                                "fieldProps",
                                MutationTree::new().mutation("setPlaceholder", |p, args| {
                                    p["placeholder"] = args.arg(0)?;
                                    Ok(())
                                }),
                            ),
                    )
                    .overridable("label", "string", "Label"),
            )?
            .append("Number", FieldClass::new(json!({"min": 0}), json!(0)))?
            .calculable(
                "IsFilled",
                CalculableClass::new("boolean", json!({"field": null}), |ctx| {
                    let field = ctx.params["field"].as_str().unwrap_or_default();
                    let filled = ctx.data.get(field).is_some_and(|v| !v.is_null() && *v != json!(""));
                    Value::Bool(!filled)
                })
                .mutations(MutationTree::new().mutation("setField", |p, args| {
                    p["field"] = args.arg(0)?;
                    Ok(())
                })),
            )?
            .calculable(
                "VisibleCount",
                CalculableClass::new("string", json!({}), |ctx| {
                    let visible = ctx.descriptor.fields.values().filter(|f| !f.hidden).count();
                    Value::String(format!("{visible} visible"))
                }),
            )?;
        Ok(())
    })
    .unwrap()
}

fn insert(id: &str, class: &str, section: SectionTarget) -> Action {
    Action::insert_field(class, section, InsertPosition::Last, Some(id.to_string()))
}

#[test]
fn test_set_label_through_action_creator() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("age", "Text", SectionTarget::NewSection));

    let creators = schema.field_action_creators("Text").unwrap();
    let action = creators.get("setLabel").unwrap().call("age", ("Age",)).unwrap();
    assert_eq!(action.type_name(), "@field/Text/setLabel");
    assert!(store.dispatch(&action));

    let nested = creators.get("fieldProps.setPlaceholder").unwrap().call("age", ("years",)).unwrap();
    assert!(store.dispatch(&nested));

    let form = store.form();
    assert_eq!(
        *form.fields["age"].params,
        json!({"label": "Age", "fieldProps": {"placeholder": "years"}})
    );
}

#[test]
fn test_noop_actions_keep_reference() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    let before = store.form();

    let set_label = schema.field_action_creators("Text").unwrap().get("setLabel").unwrap();
    assert!(!store.dispatch(&set_label.call("a", ("",)).unwrap()));
    assert!(!store.dispatch(&set_label.call("missing", ("x",)).unwrap()));
    assert!(!store.dispatch(&Action::remove_field("missing")));
    assert!(!store.dispatch(&Action::set_params("a", json!({"label": ""}), true)));
    assert!(!store.dispatch(&Action::add_rule("missing.hidden", "IsFilled")));
    assert!(!store.dispatch(&insert("b", "Unknown", SectionTarget::NewSection)));

    assert!(Arc::ptr_eq(&before, &store.form()));
}

#[test]
fn test_untouched_branches_are_shared() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&insert("b", "Number", SectionTarget::Section(0)));
    let before = store.form();

    let set_label = schema.field_action_creators("Text").unwrap().get("setLabel").unwrap();
    store.dispatch(&set_label.call("a", ("A",)).unwrap());
    let after = store.form();

    assert!(Arc::ptr_eq(&before.layout, &after.layout));
    assert!(Arc::ptr_eq(&before.rules, &after.rules));
    assert!(Arc::ptr_eq(&before.fields["b"].params, &after.fields["b"].params));
    assert!(!Arc::ptr_eq(&before.fields["a"].params, &after.fields["a"].params));
}

#[test]
fn test_insert_then_remove_restores_descriptor() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&insert("f", "Number", SectionTarget::Footer));
    let before = store.form();

    store.dispatch(&Action::insert_field(
        "Number",
        SectionTarget::Section(0),
        InsertPosition::Before("a".to_string()),
        Some("n".to_string()),
    ));
    store.dispatch(&Action::add_rule("n.hidden", "IsFilled"));
    store.dispatch(&Action::add_rule("a.params.label", "VisibleCount"));
    assert_eq!(store.form().layout.sections[0].fields, vec!["n", "a"]);
    assert_eq!(store.form().rules.len(), 2);

    store.dispatch(&Action::remove_field("n"));
    let after = store.form();
    assert_eq!(after.fields, before.fields);
    assert_eq!(after.layout, before.layout);
    assert_eq!(after.rules.len(), 1);
    assert!(after.rule("a.params.label").is_some());
}

#[test]
fn test_footer_fields_are_removed_from_footer() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&insert("f", "Text", SectionTarget::Footer));

    store.dispatch(&Action::remove_field("f"));
    let form = store.form();
    assert_eq!(form.layout.footer.as_ref().unwrap().fields, Vec::<String>::new());
    assert_eq!(form.layout.sections[0].fields, vec!["a"]);
    assert!(form.invariant_violations().is_empty());
}

#[test]
fn test_set_field_class_purges_param_rules() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&Action::add_rule("a.hidden", "IsFilled"));
    store.dispatch(&Action::add_rule("a.params.label", "VisibleCount"));

    assert!(store.dispatch(&Action::set_field_class("a", "Number")));
    let form = store.form();
    assert_eq!(form.fields["a"].field_class, "Number");
    assert_eq!(*form.fields["a"].params, json!({"min": 0}));
    assert!(form.rule("a.hidden").is_some());
    assert!(form.rule("a.params.label").is_none());
}

#[test]
fn test_rule_params_and_retyping() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&Action::add_rule("a.hidden", "IsFilled"));

    let set_field = schema
        .calculable_action_creators("IsFilled")
        .unwrap()
        .get("setField")
        .unwrap();
    let action = set_field.call("a.hidden", ("b",)).unwrap();
    assert_eq!(action.type_name(), "@calculable/IsFilled/setField");
    assert!(store.dispatch(&action));
    assert_eq!(*store.form().rules["a.hidden"].params, json!({"field": "b"}));

    assert!(!store.dispatch(&Action::set_rule_type("a.hidden", "IsFilled")));
    assert!(store.dispatch(&Action::set_rule_type("a.hidden", "VisibleCount")));
    assert_eq!(store.form().rules["a.hidden"].calculable_class, "VisibleCount");
    assert_eq!(*store.form().rules["a.hidden"].params, json!({}));

    assert!(store.dispatch(&Action::remove_rule("a.hidden")));
    assert!(store.form().rules.is_empty());
}

#[test]
fn test_rules_see_hidden_results_first() {
    let schema = schema();
    let mut form = FormBuilder::new(&schema).unwrap();
    form.insert_field("Text", Some("summary"))
        .unwrap()
        .add_rule("params.label", "VisibleCount")
        .unwrap();
    form.insert_field("Text", Some("name"))
        .unwrap()
        .add_rule("hidden", "IsFilled")
        .unwrap()
        .param("setField", ("trigger",))
        .unwrap();

    let descriptor = form.descriptor();
    let mut data = FormData::new();

    let applied = schema.apply_rules(&descriptor, &data);
    assert!(applied.fields["name"].hidden);
    assert_eq!(applied.fields["summary"].params["label"], "1 visible");

    data.insert("trigger".to_string(), json!("yes"));
    let applied = schema.apply_rules(&descriptor, &data);
    assert!(!applied.fields["name"].hidden);
    assert_eq!(applied.fields["summary"].params["label"], "2 visible");

    assert_eq!(descriptor.fields["summary"].params["label"], "");
    assert!(!descriptor.fields["name"].hidden);
}

#[test]
fn test_remove_from_layout_without_match_is_equal() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));

    let sections = store.form().layout.sections.clone();
    assert_eq!(remove_field_from_layout(&sections, "missing"), sections);
}

#[test]
fn test_descriptor_json_shape() {
    let schema = schema();
    let mut store = schema.create_editor_store();
    store.dispatch(&insert("a", "Text", SectionTarget::NewSection));
    store.dispatch(&Action::add_rule("a.hidden", "IsFilled"));

    let value = serde_json::to_value(&*store.form()).unwrap();
    assert_eq!(value["schemaVersion"], "1.0.0");
    assert_eq!(value["fields"]["a"]["fieldClass"], "Text");
    assert_eq!(value["rules"]["a.hidden"]["calculableClass"], "IsFilled");
    assert_eq!(value["layout"]["sections"][0]["fields"], json!(["a"]));

    let back: FormDescriptor = serde_json::from_value(value).unwrap();
    assert_eq!(back, *store.form());
}

#[derive(Debug, Clone)]
enum Op {
    Insert(SectionTarget),
    Remove(usize),
    AddHiddenRule(usize),
    Retype(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop_oneof![
            Just(SectionTarget::NewSection),
            Just(SectionTarget::Footer),
            (0usize..3).prop_map(SectionTarget::Section),
        ]
        .prop_map(Op::Insert),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8).prop_map(Op::AddHiddenRule),
        (0usize..8).prop_map(Op::Retype),
    ]
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_any_sequence(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let schema = schema();
        let mut store = schema.create_editor_store();

        for op in ops {
            let ids: Vec<String> = store.form().fields.keys().cloned().collect();
            let pick = |i: usize| ids.get(i % ids.len().max(1)).cloned();
            let action = match op {
                Op::Insert(section) => Action::insert_field("Text", section, InsertPosition::Last, None),
                Op::Remove(i) => match pick(i) {
                    Some(id) => Action::remove_field(id),
                    None => continue,
                },
                Op::AddHiddenRule(i) => match pick(i) {
                    Some(id) => Action::add_rule(format!("{id}.hidden"), "IsFilled"),
                    None => continue,
                },
                Op::Retype(i) => match pick(i) {
                    Some(id) => Action::set_field_class(id, "Number"),
                    None => continue,
                },
            };
            store.dispatch(&action);
            let form = store.form();
            prop_assert!(form.invariant_violations().is_empty(), "{:?}", form.invariant_violations());
        }
    }
}
