use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{EventId, SourceId, ViewRange, Viewport};
use crate::error::EngineResult;

/// Which result set a base query belongs to.
///
/// Results from different scopes are never merged together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryScope {
    pub dataset: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub focus_root: Option<EventId>,
}

impl QueryScope {
    #[must_use]
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            collection: None,
            focus_root: None,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    #[must_use]
    pub fn with_focus_root(mut self, focus_root: EventId) -> Self {
        self.focus_root = Some(focus_root);
        self
    }
}

/// Viewport + time window request for the base event set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    pub bounds: Viewport,
    pub range: ViewRange,
    pub zoom: f64,
    pub scope: QueryScope,
}

/// Direct lookup by one of the two identity spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityQuery {
    ByEventId(Vec<EventId>),
    BySourceId(Vec<SourceId>),
}

impl IdentityQuery {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::ByEventId(ids) => ids.len(),
            Self::BySourceId(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Synchronous seam over the remote query boundary.
///
/// Implementations return raw rows; validation happens in the engine so a
/// source never has to know the `Event` invariants.
pub trait EventSource {
    fn fetch_events(&self, query: &EventQuery) -> EngineResult<Vec<Value>>;
    fn fetch_by_identity(&self, query: &IdentityQuery) -> EngineResult<Vec<Value>>;
}
