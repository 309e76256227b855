use crate::core::Viewport;

/// Padding ratio applied around fitted point bounds.
pub const BOUNDS_PADDING_RATIO: f64 = 0.1;
/// Minimum absolute padding in degrees, so a single point still yields an area.
pub const BOUNDS_MIN_PADDING_DEG: f64 = 0.5;

/// Tests whether a point lies inside a possibly wrapped viewport.
///
/// The longitude is moved to the copy of the world tile nearest to the
/// viewport center before comparing, so the result does not depend on how
/// many full turns the map has been panned.
#[must_use]
pub fn is_in_bounds(lat: f64, lng: f64, viewport: Viewport) -> bool {
    if !lat.is_finite() || !lng.is_finite() || !viewport.is_valid() {
        return false;
    }
    if lat < viewport.south || lat > viewport.north {
        return false;
    }
    if viewport.east - viewport.west >= 360.0 {
        return true;
    }

    let shift = ((viewport.center_lng() - lng) / 360.0).round();
    let projected = lng + shift * 360.0;
    projected >= viewport.west && projected <= viewport.east
}

/// Padded bounding box around `(lat, lng)` points; `None` for empty input.
///
/// Latitude is clamped to the poles after padding.
#[must_use]
pub fn bounds_for_points(points: &[(f64, f64)]) -> Option<Viewport> {
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lng = f64::INFINITY;
    let mut max_lng = f64::NEG_INFINITY;

    for &(lat, lng) in points {
        if !lat.is_finite() || !lng.is_finite() {
            continue;
        }
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
        min_lng = min_lng.min(lng);
        max_lng = max_lng.max(lng);
    }
    if !min_lat.is_finite() {
        return None;
    }

    let lat_pad = ((max_lat - min_lat) * BOUNDS_PADDING_RATIO).max(BOUNDS_MIN_PADDING_DEG);
    let lng_pad = ((max_lng - min_lng) * BOUNDS_PADDING_RATIO).max(BOUNDS_MIN_PADDING_DEG);

    Some(Viewport {
        north: (max_lat + lat_pad).min(90.0),
        south: (min_lat - lat_pad).max(-90.0),
        east: max_lng + lng_pad,
        west: min_lng - lng_pad,
    })
}
