use tracing::debug;

use crate::core::{EventId, ViewRange};
use crate::error::{EngineError, EngineResult};
use crate::interaction::InteractionMode;
use crate::render::Renderer;

use super::engine::require_finite;
use super::{EngineAction, EngineEffect, ExplorerEngine};

impl<R: Renderer> ExplorerEngine<R> {
    /// Applies one action and returns the fetches the host should run.
    ///
    /// Invalid numeric input is rejected without touching state.
    pub fn dispatch(&mut self, action: EngineAction) -> EngineResult<Vec<EngineEffect>> {
        let mut effects = Vec::new();
        match action {
            EngineAction::SetViewport { viewport, map_zoom } => {
                if !viewport.is_valid() {
                    return Err(EngineError::InvalidData(
                        "viewport bounds must be finite".to_owned(),
                    ));
                }
                self.view.map_zoom = require_finite(map_zoom, "map zoom")?;
                self.view.viewport = viewport;
                self.issue_base_fetch(&mut effects);
            }
            EngineAction::SetViewRange(range) => {
                self.view.view_range = ViewRange::new(range.min, range.max)?;
                self.issue_base_fetch(&mut effects);
            }
            EngineAction::SetScope {
                dataset,
                collection,
            } => self.set_scope(dataset, collection, &mut effects)?,
            EngineAction::SetMode(mode) => self.set_mode(mode),
            EngineAction::SetTimePointer(pointer) => self.playback.seek(pointer)?,
            EngineAction::Select(selected) => self.view.selected = selected,
            EngineAction::Focus(id) => {
                let previous = self.focus.active_root().cloned();
                if self.update_focus(|stack| stack.focus(id.clone())) {
                    self.resolve_focus_from_cache(&id);
                    self.on_focus_root_changed(previous, &mut effects);
                }
            }
            EngineAction::FocusUp => {
                let previous = self.focus.active_root().cloned();
                if self.update_focus(|stack| stack.go_up()) {
                    if let Some(root) = self.focus.active_root().cloned() {
                        self.resolve_focus_from_cache(&root);
                    }
                    self.on_focus_root_changed(previous, &mut effects);
                }
            }
            EngineAction::FocusExit => {
                let previous = self.focus.active_root().cloned();
                let changed = self.update_focus(|stack| {
                    let had_entries = stack.depth() > 0;
                    stack.exit();
                    had_entries
                });
                if changed {
                    self.on_focus_root_changed(previous, &mut effects);
                }
            }
            EngineAction::ToggleExpanded(id) => {
                self.playback.toggle_expanded(id);
            }
            EngineAction::StartPlayback { now_ms } => {
                let now_ms = require_finite(now_ms, "playback start time")?;
                self.set_mode(InteractionMode::Playback);
                if !self.playback.start(now_ms, self.view.view_range) {
                    debug!("playback already running");
                }
            }
            EngineAction::PausePlayback => {
                self.playback.pause();
            }
            EngineAction::SetPlaybackSpeed(speed) => self.playback.set_speed(speed)?,
            EngineAction::Refresh => {
                self.issue_base_fetch(&mut effects);
                if self.focus.active_root().is_some() {
                    self.issue_anchor_fetch(&mut effects);
                }
            }
            EngineAction::FetchCompleted { ticket, result } => {
                return self.complete_fetch(ticket, result);
            }
        }
        Ok(effects)
    }

    fn set_mode(&mut self, mode: InteractionMode) {
        if self.view.mode == mode {
            return;
        }
        if self.view.mode == InteractionMode::Playback {
            self.playback.pause();
        }
        debug!(from = ?self.view.mode, to = ?mode, "interaction mode changed");
        self.view.mode = mode;
    }

    fn set_scope(
        &mut self,
        dataset: String,
        collection: Option<String>,
        effects: &mut Vec<EngineEffect>,
    ) -> EngineResult<()> {
        if dataset.trim().is_empty() {
            return Err(EngineError::InvalidData(
                "dataset must not be empty".to_owned(),
            ));
        }
        if self.view.dataset == dataset && self.view.collection == collection {
            return Ok(());
        }
        debug!(%dataset, ?collection, "scope changed");
        self.view.dataset = dataset;
        self.view.collection = collection;
        self.view.selected = None;
        self.update_focus(|stack| {
            stack.exit();
            true
        });
        self.playback.pause();
        self.playback.reset_marks();
        self.clear_focus_data(effects);
        self.issue_base_fetch(effects);
        self.remerge();
        Ok(())
    }

    /// Uses an already-loaded copy of the new root so `can_go_up` works
    /// before the anchor request returns.
    fn resolve_focus_from_cache(&mut self, id: &EventId) {
        let merged = self.merged_events();
        if let Some(event) = merged.get(id) {
            self.update_focus(|stack| stack.resolve(event));
        }
    }

    fn on_focus_root_changed(
        &mut self,
        previous: Option<EventId>,
        effects: &mut Vec<EngineEffect>,
    ) {
        if self.focus.active_root() == previous.as_ref() {
            return;
        }
        debug!(
            from = ?previous,
            to = ?self.focus.active_root(),
            depth = self.focus.depth(),
            "focus root changed"
        );
        self.clear_focus_data(effects);
        self.issue_base_fetch(effects);
        self.issue_anchor_fetch(effects);
        self.remerge();
    }
}
