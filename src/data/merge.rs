use indexmap::IndexMap;
use tracing::debug;

use crate::core::{Event, EventId, SourceId};

use super::QueryScope;

/// Accumulated base results for one query scope.
///
/// Re-fetching replaces entries in place; a scope change empties the cache
/// before anything from the new scope is absorbed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseCache {
    scope: Option<QueryScope>,
    events: IndexMap<EventId, Event>,
}

impl BaseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scope(&self) -> Option<&QueryScope> {
        self.scope.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Binds the cache to `scope`. Returns `true` when it had to be cleared.
    pub fn bind_scope(&mut self, scope: &QueryScope) -> bool {
        if self.scope.as_ref() == Some(scope) {
            return false;
        }
        let cleared = !self.events.is_empty();
        self.events.clear();
        self.scope = Some(scope.clone());
        if cleared {
            debug!(dataset = %scope.dataset, "base cache cleared for new scope");
        }
        cleared
    }

    pub fn absorb(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.events.insert(event.id.clone(), event);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Union of the three fetch results plus a business-id index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedEvents {
    events: Vec<Event>,
    positions: IndexMap<EventId, usize>,
    by_source: IndexMap<SourceId, Event>,
}

impl MergedEvents {
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.positions.get(id).map(|&position| &self.events[position])
    }

    #[must_use]
    pub fn contains(&self, id: &EventId) -> bool {
        self.positions.contains_key(id)
    }

    #[must_use]
    pub fn by_source(&self, source_id: &SourceId) -> Option<&Event> {
        self.by_source.get(source_id)
    }

    #[must_use]
    pub fn source_index_len(&self) -> usize {
        self.by_source.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EventId> {
        self.events.iter().map(|event| &event.id)
    }

    /// Resolves `parent.children` through the business-id index, skipping
    /// ids that have not been loaded.
    #[must_use]
    pub fn children_of(&self, parent: &Event) -> Vec<&Event> {
        parent
            .children
            .iter()
            .filter_map(|source| self.by_source.get(source))
            .collect()
    }
}

/// Merges the base set with the focus anchor and its children.
///
/// Base order is kept, then the anchor and then each child are appended
/// only when their id is not present yet. The business-id index is written
/// base, anchor, children, so on collision the later set wins.
#[must_use]
pub fn hybrid_merge<'a>(
    base: impl IntoIterator<Item = &'a Event>,
    anchor: Option<&Event>,
    children: &[Event],
) -> MergedEvents {
    let mut merged = MergedEvents::default();
    let base: Vec<&Event> = base.into_iter().collect();
    merged.events.reserve(base.len() + children.len() + 1);

    for event in base.iter().copied().chain(anchor).chain(children) {
        if !merged.positions.contains_key(&event.id) {
            merged
                .positions
                .insert(event.id.clone(), merged.events.len());
            merged.events.push(event.clone());
        }
    }
    for event in base.into_iter().chain(anchor).chain(children) {
        if let Some(source_id) = &event.source_id {
            merged.by_source.insert(source_id.clone(), event.clone());
        }
    }
    merged
}
