use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::core::{Event, EventId, SourceId, ViewRange, Viewport, is_in_bounds};
use crate::error::{EngineError, EngineResult};
use crate::interaction::InteractionMode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Half-width of the investigation spotlight as a fraction of the view span.
    pub investigation_window_ratio: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            investigation_window_ratio: 0.01,
        }
    }
}

impl CompositionConfig {
    pub fn validate(self) -> EngineResult<Self> {
        if !self.investigation_window_ratio.is_finite() || self.investigation_window_ratio < 0.0 {
            return Err(EngineError::InvalidData(
                "investigation window ratio must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Events that must render regardless of the importance threshold.
///
/// Rebuilt from the current selection and focus every time either changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LodOverrides {
    ids: HashSet<EventId>,
    child_sources: HashSet<SourceId>,
}

impl LodOverrides {
    /// `focus_root` is the resolved anchor event when it has arrived; its
    /// `children` list the business ids that stay visible.
    #[must_use]
    pub fn build(
        selected: Option<&EventId>,
        focus_root_id: Option<&EventId>,
        focus_root: Option<&Event>,
    ) -> Self {
        let mut ids = HashSet::new();
        ids.extend(selected.cloned());
        ids.extend(focus_root_id.cloned());
        let child_sources = focus_root
            .filter(|root| focus_root_id.is_none_or(|id| *id == root.id))
            .map(|root| root.children.iter().cloned().collect())
            .unwrap_or_default();
        Self { ids, child_sources }
    }

    #[must_use]
    pub fn admits(&self, event: &Event) -> bool {
        self.ids.contains(&event.id)
            || event
                .source_id
                .as_ref()
                .is_some_and(|source| self.child_sources.contains(source))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.child_sources.is_empty()
    }
}

/// Inputs for one pass of the composition pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CompositionContext<'a> {
    pub viewport: Viewport,
    pub view_range: ViewRange,
    pub lod_threshold: u8,
    pub mode: InteractionMode,
    pub time_pointer: f64,
    pub overrides: &'a LodOverrides,
    pub expanded: &'a IndexSet<EventId>,
    pub played: &'a IndexSet<EventId>,
    pub config: CompositionConfig,
}

/// Output of the pipeline.
///
/// `density_source` is the spatially filtered set before LOD thinning, so the
/// background waveform reflects true density.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition<'a> {
    pub renderable: Vec<&'a Event>,
    pub density_source: Vec<&'a Event>,
}

/// Runs focus scope, spatial, LOD and temporal stages over `events`.
#[must_use]
pub fn compose_events<'a>(events: &'a [Event], ctx: CompositionContext<'_>) -> Composition<'a> {
    let mut composition = Composition::default();
    let threshold = f64::from(ctx.lod_threshold);

    for event in focus_scope(events) {
        let in_view = is_in_bounds(event.location.lat, event.location.lng, ctx.viewport);
        if in_view {
            composition.density_source.push(event);
        }

        let pinned = ctx.mode == InteractionMode::Playback
            && (ctx.expanded.contains(&event.id) || ctx.played.contains(&event.id));
        if !in_view && !pinned {
            continue;
        }
        if !(pinned || event.importance >= threshold || ctx.overrides.admits(event)) {
            continue;
        }
        if passes_temporal(event, ctx) {
            composition.renderable.push(event);
        }
    }

    composition
}

/// The base fetch is already scoped to the focus root's descendants, so
/// this stage keeps every event.
fn focus_scope(events: &[Event]) -> impl Iterator<Item = &Event> {
    events.iter()
}

fn passes_temporal(event: &Event, ctx: CompositionContext<'_>) -> bool {
    let range = ctx.view_range;
    match ctx.mode {
        InteractionMode::Exploration => range.overlaps(event.start_value(), event.end_value()),
        InteractionMode::Investigation => {
            let window = range.span().max(0.0) * ctx.config.investigation_window_ratio;
            (event.start_value() - ctx.time_pointer).abs() <= window
        }
        InteractionMode::Playback => {
            let start = event.start_value();
            start <= ctx.time_pointer && start >= range.min
        }
    }
}
