//! Editor store
//!
//! Holds the descriptor being edited together with editor-only state (the
//! selected field). Selecting a freshly inserted field is deferred: the
//! selection is queued and applied by [`EditorStore::run_pending`], after
//! the host had a chance to observe the insertion.

use crate::action::{Action, SectionTarget};
use crate::descriptor::FormDescriptor;
use crate::layout::InsertPosition;
use crate::reducer::FormReducer;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Editor-only state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub selected_field_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EditorTask {
    Select(Option<String>),
}

/// Descriptor plus editor state, driven by actions
#[derive(Debug)]
pub struct EditorStore {
    reducer: FormReducer,
    form: Arc<FormDescriptor>,
    editor: EditorState,
    pending: VecDeque<EditorTask>,
}

impl EditorStore {
    pub fn new(reducer: FormReducer, initial: FormDescriptor) -> Self {
        Self {
            reducer,
            form: Arc::new(initial),
            editor: EditorState::default(),
            pending: VecDeque::new(),
        }
    }

    /// Current descriptor snapshot
    pub fn form(&self) -> Arc<FormDescriptor> {
        Arc::clone(&self.form)
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn selected_field_id(&self) -> Option<&str> {
        self.editor.selected_field_id.as_deref()
    }

    pub fn reducer(&self) -> &FormReducer {
        &self.reducer
    }

    /// Run `action` through the form reducer; true when the descriptor changed
    pub fn dispatch(&mut self, action: &Action) -> bool {
        let next = self.reducer.reduce(&self.form, action);
        if Arc::ptr_eq(&next, &self.form) {
            return false;
        }
        self.form = next;
        true
    }

    /// Select a field now
    pub fn select_field(&mut self, field_id: Option<String>) {
        self.editor.selected_field_id = field_id;
    }

    /// Queue a selection for the next [`run_pending`](Self::run_pending)
    pub fn select_field_deferred(&mut self, field_id: Option<String>) {
        self.pending.push_back(EditorTask::Select(field_id));
    }

    /// Remove a field and clear the selection if it pointed at it
    pub fn remove_field(&mut self, field_id: &str) -> bool {
        let changed = self.dispatch(&Action::remove_field(field_id));
        if self.selected_field_id() == Some(field_id) {
            self.select_field(None);
        }
        changed
    }

    /// Insert a field with a fresh id and queue its selection
    ///
    /// Returns the new id, or `None` when the insertion was refused.
    pub fn insert_field_auto_select(
        &mut self,
        field_class: &str,
        section: SectionTarget,
        position: InsertPosition,
    ) -> Option<String> {
        let id = self.reducer.allocate_id(&self.form);
        if !self.dispatch(&Action::insert_field(field_class, section, position, Some(id.clone()))) {
            return None;
        }
        self.select_field_deferred(Some(id.clone()));
        Some(id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply every queued task, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pending.pop_front() {
            match task {
                EditorTask::Select(field_id) => {
                    debug!(field_id = ?field_id, "deferred selection applied");
                    self.select_field(field_id);
                }
            }
            ran += 1;
        }
        ran
    }

    /// Field-scoped operations for the field `field_id` shown in `section_index`
    pub fn field_api(&mut self, field_id: impl Into<String>, section_index: SectionTarget) -> FieldApi<'_> {
        FieldApi {
            store: self,
            field_id: field_id.into(),
            section_index,
        }
    }
}

/// Operations a rendered field exposes to the editor UI
#[derive(Debug)]
pub struct FieldApi<'a> {
    store: &'a mut EditorStore,
    field_id: String,
    section_index: SectionTarget,
}

impl FieldApi<'_> {
    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn section_index(&self) -> SectionTarget {
        self.section_index
    }

    /// Current class of the field, if it still exists
    pub fn field_class(&self) -> Option<String> {
        self.store.form.field(&self.field_id).map(|f| f.field_class.clone())
    }

    /// Insert a sibling into this field's section
    ///
    /// With `auto_select` the new field gets selected on the next
    /// `run_pending`. Returns the new id when the insertion happened.
    pub fn insert_field_at_current_section(
        &mut self,
        field_class: &str,
        position: InsertPosition,
        auto_select: bool,
    ) -> Option<String> {
        if auto_select {
            return self
                .store
                .insert_field_auto_select(field_class, self.section_index, position);
        }
        let id = self.store.reducer.allocate_id(&self.store.form);
        self.store
            .dispatch(&Action::insert_field(field_class, self.section_index, position, Some(id.clone())))
            .then_some(id)
    }

    pub fn remove_field(&mut self) -> bool {
        self.store.remove_field(&self.field_id)
    }

    pub fn set_field_class(&mut self, field_class: &str) -> bool {
        self.store
            .dispatch(&Action::set_field_class(self.field_id.as_str(), field_class))
    }

    /// Attach a rule at a path relative to this field
    pub fn add_rule(&mut self, rel_path: &str, calculable_class: &str) -> bool {
        let path = format!("{}.{}", self.field_id, rel_path);
        self.store.dispatch(&Action::add_rule(path, calculable_class))
    }

    pub fn remove_rule(&mut self, rel_path: &str) -> bool {
        let path = format!("{}.{}", self.field_id, rel_path);
        self.store.dispatch(&Action::remove_rule(path))
    }

    pub fn set_rule_type(&mut self, rel_path: &str, calculable_class: &str) -> bool {
        let path = format!("{}.{}", self.field_id, rel_path);
        self.store.dispatch(&Action::set_rule_type(path, calculable_class))
    }
}
