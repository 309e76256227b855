use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{EventId, ViewRange, Viewport};
use crate::data::{EventQuery, IdentityQuery, RequestTicket};
use crate::error::EngineResult;
use crate::interaction::InteractionMode;

/// Messages accepted by `ExplorerEngine::dispatch`.
#[derive(Debug)]
pub enum EngineAction {
    SetViewport { viewport: Viewport, map_zoom: f64 },
    SetViewRange(ViewRange),
    SetScope {
        dataset: String,
        collection: Option<String>,
    },
    SetMode(InteractionMode),
    SetTimePointer(f64),
    Select(Option<EventId>),
    Focus(EventId),
    FocusUp,
    FocusExit,
    ToggleExpanded(EventId),
    StartPlayback { now_ms: f64 },
    PausePlayback,
    SetPlaybackSpeed(f64),
    /// Re-issues the base (and anchor) requests for the current state.
    Refresh,
    FetchCompleted {
        ticket: RequestTicket,
        result: EngineResult<Vec<Value>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FetchQuery {
    Events(EventQuery),
    Identity(IdentityQuery),
}

/// A request the host must run against the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticket: RequestTicket,
    pub query: FetchQuery,
}

/// Side effects produced by `dispatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEffect {
    Fetch(FetchRequest),
    /// An in-flight request whose result will be ignored; hosts may cancel it.
    Superseded(RequestTicket),
}

impl EngineEffect {
    #[must_use]
    pub fn as_fetch(&self) -> Option<&FetchRequest> {
        match self {
            Self::Fetch(request) => Some(request),
            Self::Superseded(_) => None,
        }
    }
}
