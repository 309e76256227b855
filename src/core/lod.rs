use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const MIN_THRESHOLD: u8 = 1;
pub const MAX_THRESHOLD: u8 = 10;

/// Tunable level-of-detail curve.
///
/// The threshold grows with `log10(span / span_floor_years)` and with how far
/// the map zoom sits below `reference_zoom`:
///
/// `threshold = floor(1 + span_weight * log10(max(span / floor, 1))
///                      + zoom_weight * max(reference_zoom - zoom, 0))`
///
/// clamped to `[1, 10]`. Both terms are non-decreasing as the view zooms out,
/// so zooming out never lowers the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    pub span_floor_years: f64,
    pub span_weight: f64,
    pub reference_zoom: f64,
    pub zoom_weight: f64,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            span_floor_years: 1.0,
            span_weight: 1.5,
            reference_zoom: 6.0,
            zoom_weight: 0.75,
        }
    }
}

impl LodConfig {
    pub fn validate(self) -> EngineResult<Self> {
        if !self.span_floor_years.is_finite() || self.span_floor_years <= 0.0 {
            return Err(EngineError::InvalidData(
                "lod span floor must be finite and > 0".to_owned(),
            ));
        }
        for (value, name) in [
            (self.span_weight, "span_weight"),
            (self.zoom_weight, "zoom_weight"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidData(format!(
                    "lod `{name}` must be finite and >= 0"
                )));
            }
        }
        if !self.reference_zoom.is_finite() {
            return Err(EngineError::InvalidData(
                "lod reference zoom must be finite".to_owned(),
            ));
        }
        Ok(self)
    }

    /// Minimum importance an event needs to render at this time span and map zoom.
    ///
    /// A NaN or infinite span is treated as unbounded and a NaN zoom as fully
    /// zoomed out, so invalid input is strict rather than permissive.
    #[must_use]
    pub fn threshold(self, time_span: f64, map_zoom: f64) -> u8 {
        let span_term = if time_span.is_nan() || time_span == f64::INFINITY {
            f64::from(MAX_THRESHOLD)
        } else {
            let ratio = (time_span / self.span_floor_years).max(1.0);
            self.span_weight * ratio.log10()
        };
        let zoom_term = if map_zoom.is_nan() || map_zoom == f64::NEG_INFINITY {
            f64::from(MAX_THRESHOLD)
        } else {
            self.zoom_weight * (self.reference_zoom - map_zoom).max(0.0)
        };

        let raw = (1.0 + span_term + zoom_term).floor();
        raw.clamp(f64::from(MIN_THRESHOLD), f64::from(MAX_THRESHOLD)) as u8
    }
}

/// Convenience wrapper over the default curve.
#[must_use]
pub fn lod_threshold(time_span: f64, map_zoom: f64) -> u8 {
    LodConfig::default().threshold(time_span, map_zoom)
}
