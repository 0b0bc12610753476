//! Ordered tab collection with active and selection pointers.
//!
//! # Responsibility
//! - Own every `Tab` and its display order.
//! - Keep the `active` pointer and the bulk-selection set consistent with
//!   the owned tabs.
//!
//! # Invariants
//! - `active` and each selected id reference a tab in `tabs`.
//! - Removing the active tab moves `active` to the previous tab, else to the
//!   next one.
//! - Removing the last tab synthesizes an empty tab and activates it, so a
//!   workspace that has been populated never becomes empty again.

use crate::model::schema::TabSchema;
use crate::model::snapshot::WorkspaceSnapshot;
use crate::model::tab::{Tab, TabId};
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub struct Workspace {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    selected: Vec<TabId>,
    schema: Arc<dyn TabSchema>,
}

impl Debug for Workspace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("tabs", &self.tabs)
            .field("active", &self.active)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Creates an empty, not yet populated workspace.
    pub fn new(schema: Arc<dyn TabSchema>) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            selected: Vec::new(),
            schema,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(Tab::id).collect()
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id() == id)
    }

    pub fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id() == id)
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    /// Points `active` at `id`. Unknown ids leave the pointer unchanged.
    pub fn set_active(&mut self, id: TabId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Appends a tab without touching the active pointer.
    pub fn push(&mut self, tab: Tab) -> TabId {
        let id = tab.id();
        self.tabs.push(tab);
        id
    }

    /// Appends a blank tab and makes it active.
    pub fn add_empty(&mut self) -> TabId {
        let id = self.push(Tab::new(self.schema.empty_payload()));
        self.active = Some(id);
        id
    }

    /// Appends a clone of `source` and makes it active.
    pub fn clone_tab(&mut self, source: TabId) -> Option<TabId> {
        let payload = self.schema.clone_payload(self.get(source)?.payload());
        let id = self.push(Tab::new(payload));
        self.active = Some(id);
        Some(id)
    }

    /// Applies `edit` to the payload of `id`.
    pub fn edit(&mut self, id: TabId, edit: impl FnOnce(&mut Value)) -> bool {
        match self.tabs.iter_mut().find(|tab| tab.id() == id) {
            Some(tab) => {
                edit(tab.payload_mut());
                true
            }
            None => false,
        }
    }

    /// Removes one tab, repairing the active pointer and selection.
    pub fn remove(&mut self, id: TabId) -> Option<Tab> {
        let index = self.position(id)?;

        if self.active == Some(id) {
            let neighbor = if index > 0 {
                self.tabs.get(index - 1)
            } else {
                self.tabs.get(index + 1)
            };
            self.active = neighbor.map(Tab::id);
        }

        let removed = self.tabs.remove(index);
        self.selected.retain(|selected| *selected != id);
        self.ensure_not_empty();
        Some(removed)
    }

    /// Replaces every tab with `payloads`, activating the first one.
    ///
    /// Returns the number of tabs built from `payloads`; when it is zero an
    /// empty tab has been synthesized instead.
    pub fn replace_all(&mut self, payloads: Vec<Value>) -> usize {
        self.tabs = payloads.into_iter().map(Tab::new).collect();
        self.selected.clear();
        self.active = self.tabs.first().map(Tab::id);
        let loaded = self.tabs.len();
        self.ensure_not_empty();
        loaded
    }

    /// Synthesizes an active empty tab when no tab exists.
    pub fn ensure_not_empty(&mut self) -> bool {
        if !self.tabs.is_empty() {
            return false;
        }
        self.add_empty();
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.tab_ids();
    }

    /// Flips selection of `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: TabId) -> bool {
        if let Some(index) = self.selected.iter().position(|selected| *selected == id) {
            self.selected.remove(index);
            return false;
        }
        if self.position(id).is_none() {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub fn is_selected(&self, id: TabId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> &[TabId] {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Whether any tab carries content according to the schema.
    pub fn has_meaningful_content(&self) -> bool {
        self.tabs
            .iter()
            .any(|tab| self.schema.is_meaningful(tab.payload()))
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot::from_tabs(&self.tabs)
    }
}
