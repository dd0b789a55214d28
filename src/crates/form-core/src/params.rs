//! Parameter reducer synthesis
//!
//! A class declares its parameter mutations as a [`MutationTree`]: nested
//! string keys whose leaves are mutation functions. [`synthesize`] walks the
//! tree once and produces two mirror structures:
//!
//! - a [`ParamReducer`] that maps every synthesized [`ActionType`] to its
//!   leaf and the params sub-path the leaf operates on;
//! - an [`ActionCreatorTree`] with the same shape as the mutation tree whose
//!   leaves build ready-to-dispatch actions.
//!
//! # Sub-path semantics
//!
//! A leaf stored at `fieldProps.setPlaceholder` receives the params value at
//! `fieldProps` as its draft. Leaves at the root receive the whole params.
//! Missing intermediate objects are created on write.
//!
//! # Structural sharing
//!
//! ```text
//! params ──► Arc<Value>
//!              │ leaf mutates a draft copy of the addressed sub-value
//!              ▼
//!   draft == original ? same Arc : rebuild the path above the sub-value
//! ```
//!
//! Old `Arc`s are never written through, so every previously returned params
//! value stays valid for comparison.
//!
//! # Example
//!
//! ```rust
//! use form_core::action::{Namespace, Payload};
//! use form_core::params::{synthesize, MutationTree};
//! use serde_json::json;
//!
//! let tree = MutationTree::new().mutation("setLabel", |params, args| {
//!     params["label"] = args.arg(0)?;
//!     Ok(())
//! });
//!
//! let (reducer, creators) =
//!     synthesize(Namespace::Field, "Text", json!({"label": ""}), &tree).unwrap();
//!
//! let set_label = creators.get("setLabel").unwrap();
//! let next = reducer.reduce(None, set_label.action_type(), &Payload::new(vec![json!("Age")]));
//! assert_eq!(*next, json!({"label": "Age"}));
//! ```

use crate::action::{Action, ActionType, FieldAction, IntoPayload, Namespace, Payload, RuleAction};
use crate::descriptor::Params;
use crate::error::{FormError, MutationError, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// Keys of a mutation tree become action type segments
static MUTATION_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^/@\s]+$").unwrap());

/// One mutation leaf: edits a draft of its params sub-value in place
pub type MutationFn = Arc<dyn Fn(&mut Value, &Payload) -> std::result::Result<(), MutationError> + Send + Sync>;

/// Nested mutation declarations of one class
#[derive(Clone)]
pub enum MutationTree {
    /// Mutation applied to the sub-value at the enclosing branch's path
    Leaf(MutationFn),
    /// Named children; a child key is one path segment
    Branch(IndexMap<String, MutationTree>),
}

impl Default for MutationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MutationTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationTree::Leaf(_) => f.write_str("Leaf"),
            MutationTree::Branch(children) => f.debug_map().entries(children.iter()).finish(),
        }
    }
}

impl MutationTree {
    /// Empty branch
    pub fn new() -> Self {
        MutationTree::Branch(IndexMap::new())
    }

    /// Leaf over raw JSON
    pub fn leaf<F>(f: F) -> Self
    where
        F: Fn(&mut Value, &Payload) -> std::result::Result<(), MutationError> + Send + Sync + 'static,
    {
        MutationTree::Leaf(Arc::new(f))
    }

    /// Leaf over a typed view of the sub-value
    ///
    /// The draft is decoded into `P`, mutated, and encoded back. A draft that
    /// does not decode rejects the mutation with [`MutationError::InvalidParams`].
    pub fn typed<P, F>(f: F) -> Self
    where
        P: Serialize + DeserializeOwned,
        F: Fn(&mut P, &Payload) -> std::result::Result<(), MutationError> + Send + Sync + 'static,
    {
        Self::leaf(move |draft, payload| {
            let mut typed: P = serde_json::from_value(draft.clone()).map_err(MutationError::InvalidParams)?;
            f(&mut typed, payload)?;
            *draft = serde_json::to_value(typed).map_err(MutationError::InvalidParams)?;
            Ok(())
        })
    }

    /// Add a child under `key`, replacing any previous child of that name
    pub fn with(self, key: impl Into<String>, child: MutationTree) -> Self {
        match self {
            MutationTree::Branch(mut children) => {
                children.insert(key.into(), child);
                MutationTree::Branch(children)
            }
            MutationTree::Leaf(_) => MutationTree::Branch(IndexMap::from([(key.into(), child)])),
        }
    }

    /// Add a raw JSON leaf under `key`
    pub fn mutation<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Value, &Payload) -> std::result::Result<(), MutationError> + Send + Sync + 'static,
    {
        self.with(key, Self::leaf(f))
    }

    /// Add a typed leaf under `key`
    pub fn typed_mutation<P, F>(self, key: impl Into<String>, f: F) -> Self
    where
        P: Serialize + DeserializeOwned,
        F: Fn(&mut P, &Payload) -> std::result::Result<(), MutationError> + Send + Sync + 'static,
    {
        self.with(key, Self::typed(f))
    }

    /// True for a branch without children
    pub fn is_empty(&self) -> bool {
        matches!(self, MutationTree::Branch(children) if children.is_empty())
    }
}

#[derive(Clone)]
struct IndexEntry {
    mutation: MutationFn,
    sub_path: Vec<String>,
}

/// Synthesized reducer over one class's params
#[derive(Clone)]
pub struct ParamReducer {
    class_name: String,
    initial_params: Params,
    index: HashMap<ActionType, IndexEntry>,
}

impl std::fmt::Debug for ParamReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamReducer")
            .field("class_name", &self.class_name)
            .field("initial_params", &self.initial_params)
            .field("actions", &self.index.len())
            .finish()
    }
}

impl ParamReducer {
    /// Initial params; every call returns the same shared value
    pub fn init(&self) -> Params {
        Arc::clone(&self.initial_params)
    }

    /// Owning class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// True when `action_type` addresses one of this class's leaves
    pub fn handles(&self, action_type: &ActionType) -> bool {
        self.index.contains_key(action_type)
    }

    /// Every action type this reducer understands
    pub fn action_types(&self) -> impl Iterator<Item = &ActionType> {
        self.index.keys()
    }

    /// Apply the action to `params`
    ///
    /// `None` params start from the initial params. Unknown action types and
    /// mutations that leave the value unchanged return the input `Arc`. A
    /// rejected mutation is logged and also returns the input.
    pub fn reduce(&self, params: Option<&Params>, action_type: &ActionType, payload: &Payload) -> Params {
        let current = params.cloned().unwrap_or_else(|| self.init());

        let Some(entry) = self.index.get(action_type) else {
            debug!(action = %action_type, class = %self.class_name, "action not handled by class");
            return current;
        };

        match apply_along(&current, &entry.sub_path, entry.mutation.as_ref(), payload) {
            Ok(Some(next)) => {
                debug!(action = %action_type, "params updated");
                Arc::new(next)
            }
            Ok(None) => current,
            Err(e) => {
                warn!(action = %action_type, error = %e, "mutation rejected; params unchanged");
                current
            }
        }
    }
}

/// Descend `path` and run `mutation` on a draft of the addressed sub-value
///
/// `Ok(None)` means nothing changed.
fn apply_along(
    current: &Value,
    path: &[String],
    mutation: &(dyn Fn(&mut Value, &Payload) -> std::result::Result<(), MutationError> + Send + Sync),
    payload: &Payload,
) -> std::result::Result<Option<Value>, MutationError> {
    let Some((head, rest)) = path.split_first() else {
        let mut draft = current.clone();
        mutation(&mut draft, payload)?;
        return Ok((draft != *current).then_some(draft));
    };

    let child = current.get(head.as_str()).unwrap_or(&Value::Null);
    let Some(next_child) = apply_along(child, rest, mutation, payload)? else {
        return Ok(None);
    };

    let mut next = match current {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => {
            return Err(MutationError::Rejected(format!(
                "cannot descend into \"{head}\": parent is not an object"
            )))
        }
    };
    next.insert(head.clone(), next_child);
    Ok(Some(Value::Object(next)))
}

/// Builds actions for one synthesized leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreator {
    action_type: ActionType,
}

impl ActionCreator {
    /// Type of the actions this creator builds
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    /// Build an action aimed at `target`
    ///
    /// `target` is a field id for field classes and a dotted rule path for
    /// calculable classes.
    pub fn create(&self, target: impl Into<String>, payload: Payload) -> Action {
        match self.action_type.namespace() {
            Namespace::Field => Action::Field(FieldAction {
                action_type: self.action_type.clone(),
                target_field: target.into(),
                payload,
            }),
            Namespace::Calculable => Action::Rule(RuleAction {
                action_type: self.action_type.clone(),
                target_path: target.into(),
                payload,
            }),
        }
    }

    /// Build an action from Rust arguments
    pub fn call(&self, target: impl Into<String>, args: impl IntoPayload) -> Result<Action> {
        Ok(self.create(target, args.into_payload()?))
    }
}

/// Action creators mirroring a class's mutation tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCreatorTree {
    Leaf(ActionCreator),
    Branch(IndexMap<String, ActionCreatorTree>),
}

impl Default for ActionCreatorTree {
    fn default() -> Self {
        ActionCreatorTree::Branch(IndexMap::new())
    }
}

impl ActionCreatorTree {
    /// Creator at a dotted path such as `fieldProps.setPlaceholder`
    pub fn get(&self, dotted: &str) -> Option<&ActionCreator> {
        dotted
            .split('.')
            .try_fold(self, |node, key| node.child(key))
            .and_then(|node| match node {
                ActionCreatorTree::Leaf(creator) => Some(creator),
                ActionCreatorTree::Branch(_) => None,
            })
    }

    /// Direct child by key
    pub fn child(&self, key: &str) -> Option<&ActionCreatorTree> {
        match self {
            ActionCreatorTree::Branch(children) => children.get(key),
            ActionCreatorTree::Leaf(_) => None,
        }
    }

    /// Every creator in declaration order
    pub fn creators(&self) -> Vec<&ActionCreator> {
        match self {
            ActionCreatorTree::Leaf(creator) => vec![creator],
            ActionCreatorTree::Branch(children) => children.values().flat_map(|c| c.creators()).collect(),
        }
    }
}

/// Walk `tree` and produce the reducer and its mirror creator tree
///
/// Fails when a key is empty or contains `/`, `@` or whitespace, when the
/// root is a bare leaf, or when two leaves would share an action type.
pub fn synthesize(
    namespace: Namespace,
    class_name: &str,
    initial_params: Value,
    tree: &MutationTree,
) -> Result<(ParamReducer, ActionCreatorTree)> {
    let MutationTree::Branch(root) = tree else {
        return Err(FormError::InvalidMutationKey {
            class: class_name.to_string(),
            key: String::new(),
        });
    };

    let mut index = HashMap::new();
    let creators = synthesize_branch(namespace, class_name, root, &mut Vec::new(), &mut index)?;

    let reducer = ParamReducer {
        class_name: class_name.to_string(),
        initial_params: Arc::new(initial_params),
        index,
    };
    Ok((reducer, creators))
}

fn synthesize_branch(
    namespace: Namespace,
    class_name: &str,
    children: &IndexMap<String, MutationTree>,
    path: &mut Vec<String>,
    index: &mut HashMap<ActionType, IndexEntry>,
) -> Result<ActionCreatorTree> {
    let mut out = IndexMap::with_capacity(children.len());

    for (key, child) in children {
        if !MUTATION_KEY.is_match(key) {
            return Err(FormError::InvalidMutationKey {
                class: class_name.to_string(),
                key: key.clone(),
            });
        }

        let node = match child {
            MutationTree::Leaf(mutation) => {
                let mut full = path.clone();
                full.push(key.clone());
                let action_type = ActionType::new(namespace, class_name, full);

                let entry = IndexEntry {
                    mutation: Arc::clone(mutation),
                    sub_path: path.clone(),
                };
                if index.insert(action_type.clone(), entry).is_some() {
                    return Err(FormError::DuplicateActionType(action_type.to_string()));
                }
                ActionCreatorTree::Leaf(ActionCreator { action_type })
            }
            MutationTree::Branch(grandchildren) => {
                path.push(key.clone());
                let node = synthesize_branch(namespace, class_name, grandchildren, path, index)?;
                path.pop();
                node
            }
        };
        out.insert(key.clone(), node);
    }

    Ok(ActionCreatorTree::Branch(out))
}
