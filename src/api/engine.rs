use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::core::{DensityHistogram, Event, EventId, ViewRange, Viewport};
use crate::data::{BaseCache, FetchSlot, MergedEvents, QueryScope, RequestSlot};
use crate::error::{EngineError, EngineResult};
use crate::interaction::{FocusStack, InteractionMode, PlaybackScheduler};
use crate::render::Renderer;

use super::EngineConfig;

/// Main orchestration facade consumed by host applications.
///
/// `ExplorerEngine` owns every piece of mutable explorer state: view, focus,
/// fetch slots and caches, playback and histogram animation. Collections that
/// a render pass reads are held behind `Arc` and replaced wholesale, never
/// edited in place.
pub struct ExplorerEngine<R: Renderer> {
    pub(super) renderer: R,
    pub(super) config: EngineConfig,
    pub(super) view: ViewState,
    pub(super) focus: Arc<FocusStack>,
    pub(super) playback: PlaybackScheduler,
    pub(super) data: DataState,
    pub(super) histograms: HistogramState,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ViewState {
    pub(super) viewport: Viewport,
    pub(super) map_zoom: f64,
    pub(super) view_range: ViewRange,
    pub(super) dataset: String,
    pub(super) collection: Option<String>,
    pub(super) mode: InteractionMode,
    pub(super) selected: Option<EventId>,
}

#[derive(Debug, Clone)]
pub(super) struct DataState {
    pub(super) base: Arc<BaseCache>,
    pub(super) anchor: Option<Arc<Event>>,
    pub(super) children: Arc<Vec<Event>>,
    pub(super) merged: Arc<MergedEvents>,
    /// Bumped on every merge; keys histogram recomputation.
    pub(super) generation: u64,
    pub(super) base_slot: RequestSlot,
    pub(super) anchor_slot: RequestSlot,
    pub(super) children_slot: RequestSlot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct HistogramKey {
    pub(super) generation: u64,
    pub(super) viewport: Viewport,
    pub(super) view_range: ViewRange,
}

#[derive(Debug, Clone)]
pub(super) struct HistogramState {
    pub(super) overview: DensityHistogram,
    pub(super) track: DensityHistogram,
    pub(super) key: Option<HistogramKey>,
}

impl<R: Renderer> ExplorerEngine<R> {
    /// Creates an engine with empty caches. Call `dispatch(EngineAction::Refresh)`
    /// to obtain the first fetch effects.
    pub fn new(renderer: R, config: EngineConfig) -> EngineResult<Self> {
        let config = config.validate()?;
        let view_range = config.view_range;
        let mut playback = PlaybackScheduler::new(config.playback);
        playback.seek(view_range.min)?;

        debug!(dataset = %config.dataset, "explorer engine created");
        Ok(Self {
            renderer,
            view: ViewState {
                viewport: config.viewport,
                map_zoom: config.map_zoom,
                view_range,
                dataset: config.dataset.clone(),
                collection: config.collection.clone(),
                mode: config.mode,
                selected: None,
            },
            focus: Arc::new(FocusStack::new()),
            playback,
            data: DataState {
                base: Arc::new(BaseCache::new()),
                anchor: None,
                children: Arc::new(Vec::new()),
                merged: Arc::new(MergedEvents::default()),
                generation: 0,
                base_slot: RequestSlot::new(FetchSlot::Base),
                anchor_slot: RequestSlot::new(FetchSlot::Anchor),
                children_slot: RequestSlot::new(FetchSlot::Children),
            },
            histograms: HistogramState {
                overview: DensityHistogram::new(config.histogram.overview_bins, config.histogram),
                track: DensityHistogram::new(config.histogram.track_bins, config.histogram),
                key: None,
            },
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.view.viewport
    }

    #[must_use]
    pub fn map_zoom(&self) -> f64 {
        self.view.map_zoom
    }

    #[must_use]
    pub fn view_range(&self) -> ViewRange {
        self.view.view_range
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.view.mode
    }

    #[must_use]
    pub fn time_pointer(&self) -> f64 {
        self.playback.pointer()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&EventId> {
        self.view.selected.as_ref()
    }

    #[must_use]
    pub fn focus_stack(&self) -> Arc<FocusStack> {
        Arc::clone(&self.focus)
    }

    #[must_use]
    pub fn merged_events(&self) -> Arc<MergedEvents> {
        Arc::clone(&self.data.merged)
    }

    #[must_use]
    pub fn base_cache(&self) -> Arc<BaseCache> {
        Arc::clone(&self.data.base)
    }

    #[must_use]
    pub fn expanded(&self) -> Arc<IndexSet<EventId>> {
        Arc::clone(self.playback.expanded())
    }

    #[must_use]
    pub fn played(&self) -> Arc<IndexSet<EventId>> {
        Arc::clone(self.playback.played())
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playback.is_running()
    }

    /// Minimum importance for the current span and zoom.
    #[must_use]
    pub fn lod_threshold(&self) -> u8 {
        self.config
            .lod
            .threshold(self.view.view_range.span(), self.view.map_zoom)
    }

    #[must_use]
    pub fn overview_histogram(&self) -> &[f64] {
        self.histograms.overview.current()
    }

    #[must_use]
    pub fn track_histogram(&self) -> &[f64] {
        self.histograms.track.current()
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub(super) fn query_scope(&self) -> QueryScope {
        QueryScope {
            dataset: self.view.dataset.clone(),
            collection: self.view.collection.clone(),
            focus_root: self.focus.active_root().cloned(),
        }
    }

    /// Replaces the focus stack with an edited copy. Returns `true` when the
    /// edit changed it.
    pub(super) fn update_focus(&mut self, edit: impl FnOnce(&mut FocusStack) -> bool) -> bool {
        let mut next = (*self.focus).clone();
        if !edit(&mut next) {
            return false;
        }
        self.focus = Arc::new(next);
        true
    }
}

pub(super) fn require_finite(value: f64, what: &str) -> EngineResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InvalidData(format!("{what} must be finite")))
    }
}
