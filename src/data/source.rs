use serde_json::Value;

use crate::core::{Event, EventId, is_in_bounds};
use crate::error::{EngineError, EngineResult};

use super::{EventQuery, EventRow, EventSource, IdentityQuery};

/// In-memory `EventSource` for headless hosts and tests.
///
/// Answers base queries with the events inside the bounds whose interval
/// overlaps the range. A focus-scoped query returns descendants of the root
/// (events whose `parent_id` chain reaches it).
#[derive(Debug, Clone, Default)]
pub struct StaticEventSource {
    events: Vec<Event>,
    extra_rows: Vec<Value>,
}

impl StaticEventSource {
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            extra_rows: Vec::new(),
        }
    }

    /// Appends raw rows to every base response, e.g. malformed ones.
    #[must_use]
    pub fn with_extra_rows(mut self, rows: Vec<Value>) -> Self {
        self.extra_rows = rows;
        self
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    fn descends_from(&self, event: &Event, root: &EventId) -> bool {
        let mut parent = event.parent_id.as_ref();
        let mut hops = 0;
        while let Some(id) = parent {
            if id == root {
                return true;
            }
            hops += 1;
            if hops > self.events.len() {
                return false;
            }
            parent = self
                .events
                .iter()
                .find(|candidate| &candidate.id == id)
                .and_then(|candidate| candidate.parent_id.as_ref());
        }
        false
    }
}

impl EventSource for StaticEventSource {
    fn fetch_events(&self, query: &EventQuery) -> EngineResult<Vec<Value>> {
        let mut rows = Vec::new();
        for event in &self.events {
            if !is_in_bounds(event.location.lat, event.location.lng, query.bounds) {
                continue;
            }
            if !query.range.overlaps(event.start_value(), event.end_value()) {
                continue;
            }
            if let Some(collection) = &query.scope.collection {
                if !event.collections.contains(collection) {
                    continue;
                }
            }
            if let Some(root) = &query.scope.focus_root {
                if !self.descends_from(event, root) {
                    continue;
                }
            }
            rows.push(row_value(event)?);
        }
        rows.extend(self.extra_rows.iter().cloned());
        Ok(rows)
    }

    fn fetch_by_identity(&self, query: &IdentityQuery) -> EngineResult<Vec<Value>> {
        self.events
            .iter()
            .filter(|event| match query {
                IdentityQuery::ByEventId(ids) => ids.contains(&event.id),
                IdentityQuery::BySourceId(ids) => event
                    .source_id
                    .as_ref()
                    .is_some_and(|source| ids.contains(source)),
            })
            .map(row_value)
            .collect()
    }
}

fn row_value(event: &Event) -> EngineResult<Value> {
    serde_json::to_value(EventRow::from_event(event))
        .map_err(|e| EngineError::Serialization(e.to_string()))
}
