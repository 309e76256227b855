use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{Event, EventId, ViewRange, ZoomScale};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Step cadence at speed 1.0.
    pub base_interval_ms: f64,
    pub speed: f64,
    /// Expanded cards of events without a meaningful end collapse after this delay.
    pub auto_collapse_ms: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 500.0,
            speed: 1.0,
            auto_collapse_ms: 2_000.0,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(self) -> EngineResult<Self> {
        for (value, name) in [
            (self.base_interval_ms, "base_interval_ms"),
            (self.speed, "speed"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidData(format!(
                    "playback `{name}` must be finite and > 0"
                )));
            }
        }
        if !self.auto_collapse_ms.is_finite() || self.auto_collapse_ms < 0.0 {
            return Err(EngineError::InvalidData(
                "playback auto-collapse delay must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Side effects of one scheduler invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackTick {
    pub stepped: bool,
    pub previous_pointer: f64,
    pub pointer: f64,
    pub activated: Vec<EventId>,
    pub collapsed: Vec<EventId>,
    pub stopped: bool,
}

/// Timer-free playback stepper.
///
/// The host calls `tick(now_ms, ..)` from its own loop; the scheduler keeps
/// the single logical timer (last step time) and only steps once the cadence
/// interval has elapsed. The expanded and played sets are replaced wholesale
/// on every change so readers holding a previous `Arc` never see a partial
/// update.
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    config: PlaybackConfig,
    running: bool,
    pointer: f64,
    inclusive_start: bool,
    last_step_ms: Option<f64>,
    expanded: Arc<IndexSet<EventId>>,
    played: Arc<IndexSet<EventId>>,
    collapse_deadlines: IndexMap<EventId, f64>,
}

impl PlaybackScheduler {
    #[must_use]
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            running: false,
            pointer: 0.0,
            inclusive_start: true,
            last_step_ms: None,
            expanded: Arc::new(IndexSet::new()),
            played: Arc::new(IndexSet::new()),
            collapse_deadlines: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> PlaybackConfig {
        self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn pointer(&self) -> f64 {
        self.pointer
    }

    #[must_use]
    pub fn expanded(&self) -> &Arc<IndexSet<EventId>> {
        &self.expanded
    }

    #[must_use]
    pub fn played(&self) -> &Arc<IndexSet<EventId>> {
        &self.played
    }

    /// Effective cadence after the speed multiplier.
    #[must_use]
    pub fn interval_ms(&self) -> f64 {
        self.config.base_interval_ms / self.config.speed
    }

    pub fn set_speed(&mut self, speed: f64) -> EngineResult<()> {
        let config = PlaybackConfig {
            speed,
            ..self.config
        }
        .validate()?;
        self.config = config;
        Ok(())
    }

    /// Step size for a view range: the largest named scale below its span.
    #[must_use]
    pub fn step_size(range: ViewRange) -> f64 {
        let span = range.span();
        ZoomScale::step_for_span(span).map_or(span.max(0.0), ZoomScale::span)
    }

    /// Starts playback. Returns `false` when it is already running, so a
    /// second timer is never created.
    pub fn start(&mut self, now_ms: f64, range: ViewRange) -> bool {
        if self.running {
            return false;
        }
        if self.pointer < range.min || self.pointer >= range.max {
            self.pointer = range.min;
            self.inclusive_start = true;
        }
        self.running = true;
        self.last_step_ms = Some(now_ms);
        debug!(pointer = self.pointer, interval_ms = self.interval_ms(), "playback started");
        true
    }

    /// Stops the timer. Returns `true` when playback was running.
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.last_step_ms = None;
        if was_running {
            debug!(pointer = self.pointer, "playback paused");
        }
        was_running
    }

    /// Moves the pointer without activating anything in between.
    pub fn seek(&mut self, pointer: f64) -> EngineResult<()> {
        if !pointer.is_finite() {
            return Err(EngineError::InvalidData(
                "time pointer must be finite".to_owned(),
            ));
        }
        self.pointer = pointer;
        self.inclusive_start = true;
        Ok(())
    }

    /// Forgets played/expanded state and pending collapses.
    pub fn reset_marks(&mut self) {
        self.expanded = Arc::new(IndexSet::new());
        self.played = Arc::new(IndexSet::new());
        self.collapse_deadlines.clear();
    }

    /// Flips the expanded state of one card outside the playback flow.
    pub fn toggle_expanded(&mut self, id: EventId) -> bool {
        let mut next = (*self.expanded).clone();
        let expanded = if next.shift_remove(&id) {
            self.collapse_deadlines.shift_remove(&id);
            false
        } else {
            next.insert(id);
            true
        };
        self.expanded = Arc::new(next);
        expanded
    }

    /// Timer entry point: expires auto-collapse deadlines and steps when the
    /// cadence interval has elapsed since the previous step.
    pub fn tick<'a, I>(&mut self, now_ms: f64, range: ViewRange, events: I) -> PlaybackTick
    where
        I: IntoIterator<Item = &'a Event> + Clone,
    {
        let mut outcome = PlaybackTick {
            previous_pointer: self.pointer,
            pointer: self.pointer,
            ..PlaybackTick::default()
        };
        let due = self.running
            && self
                .last_step_ms
                .is_none_or(|last| now_ms - last >= self.interval_ms());
        if due {
            outcome = self.step(now_ms, range, events);
        } else {
            outcome.collapsed = self.expire_deadlines(now_ms);
        }
        outcome
    }

    /// Advances the pointer by one scale-aligned step.
    ///
    /// `events` is walked twice: once for activation, once for collapse.
    pub fn step<'a, I>(&mut self, now_ms: f64, range: ViewRange, events: I) -> PlaybackTick
    where
        I: IntoIterator<Item = &'a Event> + Clone,
    {
        let previous = self.pointer.clamp(range.min, range.max.max(range.min));
        let next = (previous + Self::step_size(range)).min(range.max);
        let inclusive = std::mem::replace(&mut self.inclusive_start, false);

        let mut activated = Vec::new();
        let mut expanded = (*self.expanded).clone();
        let mut played = (*self.played).clone();
        for event in events.clone() {
            let start = event.start_value();
            let after_previous = if inclusive {
                start >= previous
            } else {
                start > previous
            };
            if !after_previous || start > next {
                continue;
            }
            activated.push(event.id.clone());
            expanded.insert(event.id.clone());
            played.insert(event.id.clone());
            if event.has_meaningful_end() {
                self.collapse_deadlines.shift_remove(&event.id);
            } else {
                self.collapse_deadlines
                    .insert(event.id.clone(), now_ms + self.config.auto_collapse_ms);
            }
        }

        let mut collapsed: Vec<EventId> = events
            .into_iter()
            .filter(|event| expanded.contains(&event.id))
            .filter(|event| event.has_meaningful_end() && event.end_value() < next)
            .map(|event| event.id.clone())
            .collect();
        for id in &collapsed {
            expanded.shift_remove(id);
            self.collapse_deadlines.shift_remove(id);
        }

        self.expanded = Arc::new(expanded);
        self.played = Arc::new(played);
        collapsed.extend(self.expire_deadlines(now_ms));

        self.pointer = next;
        self.last_step_ms = Some(now_ms);
        let stopped = self.running && next >= range.max;
        if stopped {
            self.running = false;
            self.last_step_ms = None;
            debug!(pointer = next, "playback reached range end");
        }
        trace!(
            previous,
            next,
            activated = activated.len(),
            collapsed = collapsed.len(),
            "playback step"
        );

        PlaybackTick {
            stepped: true,
            previous_pointer: previous,
            pointer: next,
            activated,
            collapsed,
            stopped,
        }
    }

    fn expire_deadlines(&mut self, now_ms: f64) -> Vec<EventId> {
        let due: Vec<EventId> = self
            .collapse_deadlines
            .iter()
            .filter(|(_, deadline)| now_ms >= **deadline)
            .map(|(id, _)| id.clone())
            .collect();
        if due.is_empty() {
            return due;
        }
        let mut expanded = (*self.expanded).clone();
        for id in &due {
            self.collapse_deadlines.shift_remove(id);
            expanded.shift_remove(id);
        }
        self.expanded = Arc::new(expanded);
        due
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}
