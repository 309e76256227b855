use serde::{Deserialize, Serialize};

use crate::core::{CompositionConfig, HistogramConfig, LodConfig, ViewRange, Viewport};
use crate::error::{EngineError, EngineResult};
use crate::interaction::{InteractionMode, PlaybackConfig};
use crate::layout::CardLayoutConfig;

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load explorer
/// setup without inventing their own ad-hoc format. Every tuning section
/// falls back to its defaults when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub dataset: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    #[serde(default = "default_map_zoom")]
    pub map_zoom: f64,
    #[serde(default = "default_view_range")]
    pub view_range: ViewRange,
    /// Full timeline covered by the overview strip.
    #[serde(default = "default_timeline_extent")]
    pub timeline_extent: ViewRange,
    #[serde(default)]
    pub mode: InteractionMode,
    #[serde(default)]
    pub lod: LodConfig,
    #[serde(default)]
    pub histogram: HistogramConfig,
    #[serde(default)]
    pub composition: CompositionConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub card_layout: CardLayoutConfig,
}

impl EngineConfig {
    /// Creates a world-view config with default tuning.
    #[must_use]
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            collection: None,
            viewport: default_viewport(),
            map_zoom: default_map_zoom(),
            view_range: default_view_range(),
            timeline_extent: default_timeline_extent(),
            mode: InteractionMode::default(),
            lod: LodConfig::default(),
            histogram: HistogramConfig::default(),
            composition: CompositionConfig::default(),
            playback: PlaybackConfig::default(),
            card_layout: CardLayoutConfig::default(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport, map_zoom: f64) -> Self {
        self.viewport = viewport;
        self.map_zoom = map_zoom;
        self
    }

    #[must_use]
    pub fn with_view_range(mut self, view_range: ViewRange) -> Self {
        self.view_range = view_range;
        self
    }

    #[must_use]
    pub fn with_timeline_extent(mut self, extent: ViewRange) -> Self {
        self.timeline_extent = extent;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: InteractionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_lod(mut self, lod: LodConfig) -> Self {
        self.lod = lod;
        self
    }

    #[must_use]
    pub fn with_histogram(mut self, histogram: HistogramConfig) -> Self {
        self.histogram = histogram;
        self
    }

    #[must_use]
    pub fn with_composition(mut self, composition: CompositionConfig) -> Self {
        self.composition = composition;
        self
    }

    #[must_use]
    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    #[must_use]
    pub fn with_card_layout(mut self, card_layout: CardLayoutConfig) -> Self {
        self.card_layout = card_layout;
        self
    }

    /// Checks every section. Reversed ranges come back normalized.
    pub fn validate(mut self) -> EngineResult<Self> {
        if self.dataset.trim().is_empty() {
            return Err(EngineError::InvalidData(
                "engine dataset must not be empty".to_owned(),
            ));
        }
        if !self.viewport.is_valid() {
            return Err(EngineError::InvalidData(
                "engine viewport bounds must be finite".to_owned(),
            ));
        }
        if !self.map_zoom.is_finite() {
            return Err(EngineError::InvalidData(
                "engine map zoom must be finite".to_owned(),
            ));
        }
        self.view_range = ViewRange::new(self.view_range.min, self.view_range.max)?;
        self.timeline_extent = ViewRange::new(self.timeline_extent.min, self.timeline_extent.max)?;
        self.lod.validate()?;
        self.histogram.validate()?;
        self.composition.validate()?;
        self.playback.validate()?;
        self.card_layout.validate()?;
        Ok(self)
    }

    pub fn to_json_pretty(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::Serialization(format!("failed to serialize config: {e}")))
    }

    pub fn from_json_str(input: &str) -> EngineResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| EngineError::Serialization(format!("failed to parse config: {e}")))
    }
}

fn default_viewport() -> Viewport {
    Viewport::world()
}

fn default_map_zoom() -> f64 {
    2.0
}

fn default_view_range() -> ViewRange {
    ViewRange {
        min: 1800.0,
        max: 2000.0,
    }
}

fn default_timeline_extent() -> ViewRange {
    ViewRange {
        min: -3000.0,
        max: 2100.0,
    }
}
