mod focus_stack;
mod playback;

use serde::{Deserialize, Serialize};

pub use focus_stack::FocusStack;
pub use playback::{PlaybackConfig, PlaybackScheduler, PlaybackTick};

/// Selects the temporal stage of the composition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Free browsing: events whose interval overlaps the view range.
    #[default]
    Exploration,
    /// Scrubbing spotlight around the time pointer.
    Investigation,
    /// Time-lapse curtain revealed as the pointer advances.
    Playback,
}
