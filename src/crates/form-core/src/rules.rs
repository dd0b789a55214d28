//! Rule evaluation
//!
//! [`apply_rules`] computes every rule against the form data and writes each
//! result into the field map of a working copy of the descriptor. Rules on
//! `<fieldId>.hidden` run first so later rules see final visibility; within
//! each group rules keep their insertion order, and every rule observes the
//! writes of the rules before it.

use crate::descriptor::{FormData, FormDescriptor, RuleEntry};
use crate::schema::{CalculateContext, ClassRegistry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static HIDDEN_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^.]+\.hidden$").unwrap());

/// True for a rule path of the form `<fieldId>.hidden`
pub fn is_rule_for_hidden(path: &str) -> bool {
    HIDDEN_RULE.is_match(path)
}

/// Evaluate every rule of `descriptor` against `data`
///
/// The input descriptor is left untouched; unchanged branches of the result
/// share storage with it. Rules of unknown calculable classes are skipped.
pub fn apply_rules(registry: &ClassRegistry, descriptor: &FormDescriptor, data: &FormData) -> FormDescriptor {
    let mut draft = descriptor.clone();

    let (hidden, others): (Vec<(&String, &RuleEntry)>, Vec<_>) =
        descriptor.rules.iter().partition(|(path, _)| is_rule_for_hidden(path));

    for (path, rule) in hidden.into_iter().chain(others) {
        let Some(calculable) = registry.calculable_class(&rule.calculable_class) else {
            continue;
        };

        let result = calculable.calculate(&CalculateContext {
            data,
            descriptor: &draft,
            params: &rule.params,
        });

        if draft.set_at_path(path, result) {
            debug!(path = %path, "rule applied");
        } else {
            warn!(path = %path, "rule target is not writable; result dropped");
        }
    }

    draft
}
