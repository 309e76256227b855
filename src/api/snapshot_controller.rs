use crate::error::{EngineError, EngineResult};
use crate::render::Renderer;

use super::{EngineSnapshot, ExplorerEngine};

impl<R: Renderer> ExplorerEngine<R> {
    /// Builds a deterministic snapshot useful for regression tests.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let merged = self.merged_events();
        EngineSnapshot {
            dataset: self.view.dataset.clone(),
            collection: self.view.collection.clone(),
            viewport: self.view.viewport,
            map_zoom: self.view.map_zoom,
            view_range: self.view.view_range,
            mode: self.view.mode,
            time_pointer: self.playback.pointer(),
            playing: self.playback.is_running(),
            lod_threshold: self.lod_threshold(),
            selected: self.view.selected.clone(),
            focus_stack: self.focus.entries().to_vec(),
            can_go_up: self.focus.can_go_up(),
            expanded: self.playback.expanded().iter().cloned().collect(),
            played: self.playback.played().iter().cloned().collect(),
            merged_ids: merged.ids().cloned().collect(),
            source_index_len: merged.source_index_len(),
            base_cache_len: self.data.base.len(),
            data_generation: self.data.generation,
        }
    }

    /// Serializes snapshot as pretty JSON for fixture-based regression checks.
    pub fn snapshot_json_pretty(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| EngineError::Serialization(format!("failed to serialize snapshot: {e}")))
    }
}
