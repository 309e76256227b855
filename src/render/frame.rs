use serde::{Deserialize, Serialize};

use crate::core::Event;
use crate::error::{EngineError, EngineResult};
use crate::interaction::InteractionMode;
use crate::layout::CardOffset;

/// One event as the presentation layer should draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableEvent {
    pub event: Event,
    pub expanded: bool,
    pub highlighted: bool,
    pub played: bool,
    /// Card placement relative to the marker; only set for expanded cards
    /// that the projection could place on screen.
    pub offset: Option<CardOffset>,
}

/// Backend-agnostic output of one engine pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub renderable: Vec<RenderableEvent>,
    pub overview_histogram: Vec<f64>,
    pub track_histogram: Vec<f64>,
    pub time_pointer: f64,
    pub mode: InteractionMode,
    pub lod_threshold: u8,
}

impl RenderFrame {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.time_pointer.is_finite() {
            return Err(EngineError::InvalidData(
                "render frame time pointer must be finite".to_owned(),
            ));
        }
        for (strip, values) in [
            ("overview", &self.overview_histogram),
            ("track", &self.track_histogram),
        ] {
            if let Some(bad) = values
                .iter()
                .find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0)
            {
                return Err(EngineError::InvalidData(format!(
                    "{strip} histogram intensity {bad} is outside [0, 1]"
                )));
            }
        }
        for item in &self.renderable {
            if let Some(offset) = item.offset {
                if !offset.offset_x.is_finite() || !offset.offset_y.is_finite() {
                    return Err(EngineError::InvalidData(format!(
                        "card offset for `{}` must be finite",
                        item.event.id
                    )));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderable.is_empty()
    }

    #[must_use]
    pub fn expanded_count(&self) -> usize {
        self.renderable.iter().filter(|item| item.expanded).count()
    }
}
