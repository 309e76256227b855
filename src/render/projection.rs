use serde::{Deserialize, Serialize};

use crate::core::{Viewport, is_in_bounds};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Geographic to screen mapping supplied by the map host.
pub trait MapProjection {
    /// Returns `None` when the coordinate is not on screen.
    fn project(&self, lat: f64, lng: f64) -> Option<ScreenPoint>;
}

/// Linear lat/lng projection over a pixel canvas.
///
/// Longitudes are moved to the copy of the world nearest the viewport
/// centre, matching the spatial filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquirectangularProjection {
    pub viewport: Viewport,
    pub width_px: f64,
    pub height_px: f64,
}

impl EquirectangularProjection {
    #[must_use]
    pub fn new(viewport: Viewport, width_px: f64, height_px: f64) -> Self {
        Self {
            viewport,
            width_px,
            height_px,
        }
    }
}

impl MapProjection for EquirectangularProjection {
    fn project(&self, lat: f64, lng: f64) -> Option<ScreenPoint> {
        let lng_span = self.viewport.east - self.viewport.west;
        let lat_span = self.viewport.north - self.viewport.south;
        if lng_span <= 0.0 || lat_span <= 0.0 || !is_in_bounds(lat, lng, self.viewport) {
            return None;
        }
        let shift = ((self.viewport.center_lng() - lng) / 360.0).round();
        let lng = lng + shift * 360.0;
        Some(ScreenPoint {
            x: (lng - self.viewport.west) / lng_span * self.width_px,
            y: (self.viewport.north - lat) / lat_span * self.height_px,
        })
    }
}
