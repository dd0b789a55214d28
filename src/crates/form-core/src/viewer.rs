//! Viewer store: input data and per-field interaction state of a form being
//! filled in

use crate::descriptor::FormData;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Touched flags and error messages keyed by field id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerFieldState {
    #[serde(default)]
    pub touched: IndexMap<String, bool>,
    #[serde(default)]
    pub errors: IndexMap<String, String>,
}

/// Full viewer state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub data: Arc<FormData>,
    pub field_state: Arc<ViewerFieldState>,
}

/// Viewer transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ViewerAction {
    /// Store a value and mark the field touched
    #[serde(rename = "@form/viewer/setFieldValue", rename_all = "camelCase")]
    SetFieldValue { field_id: String, value: Value },
    /// Forget a field's value
    #[serde(rename = "@form/viewer/clearValue", rename_all = "camelCase")]
    ClearValue { field_id: String },
    #[serde(rename = "viewerFieldState/touch")]
    Touch(Vec<String>),
    #[serde(rename = "viewerFieldState/setError")]
    SetError { field: String, error: String },
    #[serde(rename = "viewerFieldState/setErrors")]
    SetErrors(IndexMap<String, String>),
    #[serde(rename = "viewerFieldState/setTouches")]
    SetTouches(IndexMap<String, bool>),
    /// Clear touched flags and errors; data is kept
    #[serde(rename = "viewerFieldState/reset")]
    Reset,
}

/// Apply `action`, sharing every untouched branch with `state`
pub fn reduce_viewer(state: &ViewerState, action: &ViewerAction) -> ViewerState {
    let mut next = state.clone();
    match action {
        ViewerAction::SetFieldValue { field_id, value } => {
            Arc::make_mut(&mut next.data).insert(field_id.clone(), value.clone());
            Arc::make_mut(&mut next.field_state)
                .touched
                .insert(field_id.clone(), true);
        }
        ViewerAction::ClearValue { field_id } => {
            if next.data.contains_key(field_id) {
                Arc::make_mut(&mut next.data).remove(field_id);
            }
        }
        ViewerAction::Touch(field_ids) => {
            let field_state = Arc::make_mut(&mut next.field_state);
            for id in field_ids {
                field_state.touched.insert(id.clone(), true);
            }
        }
        ViewerAction::SetError { field, error } => {
            Arc::make_mut(&mut next.field_state)
                .errors
                .insert(field.clone(), error.clone());
        }
        ViewerAction::SetErrors(errors) => {
            Arc::make_mut(&mut next.field_state).errors = errors.clone();
        }
        ViewerAction::SetTouches(touched) => {
            Arc::make_mut(&mut next.field_state).touched = touched.clone();
        }
        ViewerAction::Reset => {
            next.field_state = Arc::new(ViewerFieldState::default());
        }
    }
    next
}

/// Viewer state holder
#[derive(Debug, Clone, Default)]
pub struct ViewerStore {
    state: ViewerState,
}

impl ViewerStore {
    /// Store preloaded with `data`
    pub fn new(data: Option<FormData>) -> Self {
        Self {
            state: ViewerState {
                data: Arc::new(data.unwrap_or_default()),
                field_state: Arc::default(),
            },
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn data(&self) -> &FormData {
        &self.state.data
    }

    pub fn field_state(&self) -> &ViewerFieldState {
        &self.state.field_state
    }

    pub fn dispatch(&mut self, action: &ViewerAction) {
        self.state = reduce_viewer(&self.state, action);
    }

    pub fn set_field_value(&mut self, field_id: impl Into<String>, value: Value) {
        self.dispatch(&ViewerAction::SetFieldValue {
            field_id: field_id.into(),
            value,
        });
    }

    pub fn clear_value(&mut self, field_id: impl Into<String>) {
        self.dispatch(&ViewerAction::ClearValue {
            field_id: field_id.into(),
        });
    }

    pub fn touch<I, S>(&mut self, field_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch(&ViewerAction::Touch(field_ids.into_iter().map(Into::into).collect()));
    }

    pub fn set_error(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.dispatch(&ViewerAction::SetError {
            field: field.into(),
            error: error.into(),
        });
    }

    pub fn set_errors(&mut self, errors: IndexMap<String, String>) {
        self.dispatch(&ViewerAction::SetErrors(errors));
    }

    pub fn set_touches(&mut self, touched: IndexMap<String, bool>) {
        self.dispatch(&ViewerAction::SetTouches(touched));
    }

    pub fn reset(&mut self) {
        self.dispatch(&ViewerAction::Reset);
    }
}
