use serde::{Deserialize, Serialize};

use crate::core::{EventId, ViewRange, Viewport};
use crate::interaction::InteractionMode;

/// Serializable deterministic state snapshot used by regression tests and
/// debugging tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub dataset: String,
    pub collection: Option<String>,
    pub viewport: Viewport,
    pub map_zoom: f64,
    pub view_range: ViewRange,
    pub mode: InteractionMode,
    pub time_pointer: f64,
    pub playing: bool,
    pub lod_threshold: u8,
    pub selected: Option<EventId>,
    pub focus_stack: Vec<EventId>,
    pub can_go_up: bool,
    pub expanded: Vec<EventId>,
    pub played: Vec<EventId>,
    pub merged_ids: Vec<EventId>,
    pub source_index_len: usize,
    pub base_cache_len: usize,
    pub data_generation: u64,
}
