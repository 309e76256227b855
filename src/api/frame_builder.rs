use tracing::trace;

use crate::core::{
    CompositionContext, DensitySamples, Event, LodOverrides, compose_events, is_in_bounds,
};
use crate::error::EngineResult;
use crate::interaction::PlaybackTick;
use crate::layout::{CardAnchor, solve_card_layout};
use crate::render::{MapProjection, RenderFrame, RenderableEvent, Renderer};

use super::ExplorerEngine;
use super::engine::{HistogramKey, require_finite};

impl<R: Renderer> ExplorerEngine<R> {
    /// Drives the playback timer without building a frame.
    ///
    /// Only events inside the viewport are activated.
    pub fn advance_playback(&mut self, now_ms: f64) -> EngineResult<PlaybackTick> {
        let now_ms = require_finite(now_ms, "frame time")?;
        let merged = self.merged_events();
        let viewport = self.view.viewport;
        let visible = merged
            .events()
            .iter()
            .filter(move |event| is_in_bounds(event.location.lat, event.location.lng, viewport));
        Ok(self.playback.tick(now_ms, self.view.view_range, visible))
    }

    /// Runs one render pass over the current state.
    pub fn frame(
        &mut self,
        now_ms: f64,
        projection: &impl MapProjection,
    ) -> EngineResult<RenderFrame> {
        self.advance_playback(now_ms)?;

        let merged = self.merged_events();
        let focus = self.focus_stack();
        let expanded = self.expanded();
        let played = self.played();
        let lod_threshold = self.lod_threshold();
        let overrides = LodOverrides::build(
            self.view.selected.as_ref(),
            focus.active_root(),
            focus.focused_event(),
        );
        let composition = compose_events(
            merged.events(),
            CompositionContext {
                viewport: self.view.viewport,
                view_range: self.view.view_range,
                lod_threshold,
                mode: self.view.mode,
                time_pointer: self.playback.pointer(),
                overrides: &overrides,
                expanded: &expanded,
                played: &played,
                config: self.config.composition,
            },
        );

        self.refresh_histograms(&composition.density_source);
        self.histograms.overview.tick();
        self.histograms.track.tick();

        let anchors: Vec<CardAnchor> = composition
            .renderable
            .iter()
            .filter(|event| expanded.contains(&event.id))
            .filter_map(|event| {
                projection
                    .project(event.location.lat, event.location.lng)
                    .map(|point| CardAnchor::new(event.id.clone(), point.x, point.y))
            })
            .collect();
        let layout = solve_card_layout(&anchors, self.config.card_layout);

        let renderable = composition
            .renderable
            .iter()
            .map(|event| RenderableEvent {
                event: (*event).clone(),
                expanded: expanded.contains(&event.id),
                highlighted: self.view.selected.as_ref() == Some(&event.id)
                    || focus.active_root() == Some(&event.id),
                played: played.contains(&event.id),
                offset: layout.offsets.get(&event.id).copied(),
            })
            .collect::<Vec<_>>();
        trace!(
            renderable = renderable.len(),
            density_source = composition.density_source.len(),
            cards = layout.offsets.len(),
            lod_threshold,
            "frame composed"
        );

        Ok(RenderFrame {
            renderable,
            overview_histogram: self.histograms.overview.current().to_vec(),
            track_histogram: self.histograms.track.current().to_vec(),
            time_pointer: self.playback.pointer(),
            mode: self.view.mode,
            lod_threshold,
        })
    }

    /// Builds a frame and hands it to the renderer.
    pub fn render(&mut self, now_ms: f64, projection: &impl MapProjection) -> EngineResult<()> {
        let frame = self.frame(now_ms, projection)?;
        self.renderer.render(&frame)
    }

    /// Recomputes histogram targets only when data, viewport or range moved.
    fn refresh_histograms(&mut self, density_source: &[&Event]) {
        let key = HistogramKey {
            generation: self.data.generation,
            viewport: self.view.viewport,
            view_range: self.view.view_range,
        };
        if self.histograms.key == Some(key) {
            return;
        }
        let samples = DensitySamples::from_events(density_source.iter().copied());
        self.histograms
            .overview
            .update_target(&samples, self.config.timeline_extent);
        self.histograms
            .track
            .update_target(&samples, self.view.view_range);
        self.histograms.key = Some(key);
        trace!(samples = samples.len(), "histogram targets refreshed");
    }
}
