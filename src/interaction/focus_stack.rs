use smallvec::SmallVec;
use tracing::debug;

use crate::core::{Event, EventId};

/// Drill-down navigation through container events.
///
/// The top entry is the focused container. Adjacent entries are never equal:
/// focusing the top is a no-op and focusing an ancestor truncates back to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusStack {
    entries: SmallVec<[EventId; 8]>,
    focused_event: Option<Event>,
}

impl FocusStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[EventId] {
        &self.entries
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Identity that scopes the remote query, if any.
    #[must_use]
    pub fn active_root(&self) -> Option<&EventId> {
        self.entries.last()
    }

    /// The resolved event object for the current top, once it has been fetched.
    #[must_use]
    pub fn focused_event(&self) -> Option<&Event> {
        self.focused_event.as_ref()
    }

    /// Focuses `id`. Returns `true` when the stack changed.
    pub fn focus(&mut self, id: EventId) -> bool {
        if self.active_root() == Some(&id) {
            return false;
        }
        match self.entries.iter().position(|entry| *entry == id) {
            Some(position) => {
                self.entries.truncate(position + 1);
                debug!(root = %id, depth = self.entries.len(), "focus re-entered ancestor");
            }
            None => {
                self.entries.push(id);
                debug!(depth = self.entries.len(), "focus pushed");
            }
        }
        self.drop_stale_focused_event();
        true
    }

    /// Moves one level up. Returns `true` when the stack changed.
    ///
    /// At depth one the stack jumps to the focused event's `parent_id` when
    /// it is known, otherwise it empties.
    pub fn go_up(&mut self) -> bool {
        match self.entries.len() {
            0 => false,
            1 => {
                let parent = self
                    .focused_event
                    .as_ref()
                    .and_then(|event| event.parent_id.clone());
                self.entries.clear();
                if let Some(parent) = parent {
                    debug!(root = %parent, "focus jumped to unvisited parent");
                    self.entries.push(parent);
                }
                self.focused_event = None;
                true
            }
            _ => {
                self.entries.pop();
                self.drop_stale_focused_event();
                true
            }
        }
    }

    /// Clears the stack and the cached focused event.
    pub fn exit(&mut self) {
        self.entries.clear();
        self.focused_event = None;
    }

    #[must_use]
    pub fn can_go_up(&self) -> bool {
        match self.entries.len() {
            0 => false,
            1 => self
                .focused_event
                .as_ref()
                .is_some_and(|event| event.parent_id.is_some()),
            _ => true,
        }
    }

    /// Caches `event` as the focused object when it is the current top.
    pub fn resolve(&mut self, event: &Event) -> bool {
        if self.active_root() == Some(&event.id) {
            self.focused_event = Some(event.clone());
            return true;
        }
        false
    }

    fn drop_stale_focused_event(&mut self) {
        let top = self.entries.last();
        if self
            .focused_event
            .as_ref()
            .is_some_and(|event| Some(&event.id) != top)
        {
            self.focused_event = None;
        }
    }
}
