use approx::assert_relative_eq;
use chronomap::core::{Viewport, bounds_for_points, is_in_bounds};
use proptest::prelude::*;

fn europe() -> Viewport {
    Viewport::new(60.0, 30.0, 40.0, -10.0)
}

#[test]
fn rome_is_visible_after_any_number_of_full_pans() {
    let (lat, lng) = (41.9, 12.5);
    assert!(is_in_bounds(lat, lng, europe()));
    assert!(is_in_bounds(lat, lng, Viewport::new(60.0, 30.0, 400.0, 350.0)));
    assert!(is_in_bounds(lat, lng, Viewport::new(60.0, 30.0, -680.0, -730.0)));
}

#[test]
fn new_york_is_outside_europe() {
    assert!(!is_in_bounds(40.7, -74.0, europe()));
}

#[test]
fn latitude_is_checked_before_longitude() {
    assert!(!is_in_bounds(61.0, 12.5, europe()));
    assert!(!is_in_bounds(29.9, 12.5, europe()));
}

#[test]
fn global_view_accepts_every_longitude() {
    let global = Viewport::new(85.0, -85.0, 200.0, -160.0);
    for lng in [-179.0, -90.0, 0.0, 90.0, 179.9] {
        assert!(is_in_bounds(0.0, lng, global));
    }
}

#[test]
fn antimeridian_viewport_wraps() {
    // Pacific view straddling 180: west 170, east 190.
    let pacific = Viewport::new(10.0, -30.0, 190.0, 170.0);
    assert!(is_in_bounds(-17.7, 178.0, pacific));
    assert!(is_in_bounds(-17.7, -178.0, pacific));
    assert!(!is_in_bounds(-17.7, 160.0, pacific));
}

#[test]
fn non_finite_input_is_never_in_bounds() {
    assert!(!is_in_bounds(f64::NAN, 0.0, Viewport::world()));
    assert!(!is_in_bounds(0.0, 0.0, Viewport::new(f64::NAN, 0.0, 1.0, -1.0)));
}

#[test]
fn bounds_for_points_pads_and_handles_empty_input() {
    assert_eq!(bounds_for_points(&[]), None);

    let single = bounds_for_points(&[(10.0, 20.0)]).expect("one point");
    assert_relative_eq!(single.north, 10.5);
    assert_relative_eq!(single.south, 9.5);
    assert_relative_eq!(single.east, 20.5);
    assert_relative_eq!(single.west, 19.5);

    let pair = bounds_for_points(&[(0.0, 0.0), (10.0, 20.0)]).expect("two points");
    assert_relative_eq!(pair.north, 11.0);
    assert_relative_eq!(pair.south, -1.0);
    assert_relative_eq!(pair.east, 22.0);
    assert_relative_eq!(pair.west, -2.0);

    let polar = bounds_for_points(&[(89.9, 0.0)]).expect("polar point");
    assert_relative_eq!(polar.north, 90.0);
}

proptest! {
    #[test]
    fn membership_is_invariant_under_full_turn_shifts(
        lat in -89.0f64..89.0,
        lng in -180.0f64..180.0,
        south in -80.0f64..0.0,
        height in 1.0f64..80.0,
        west in -180.0f64..170.0,
        width in 1.0f64..300.0,
        turns in -5i32..=5
    ) {
        let viewport = Viewport::new(south + height, south, west + width, west);
        let shifted = viewport.shifted_lng(f64::from(turns) * 360.0);
        prop_assert_eq!(
            is_in_bounds(lat, lng, viewport),
            is_in_bounds(lat, lng, shifted)
        );
    }

    #[test]
    fn fitted_bounds_contain_every_point(
        points in prop::collection::vec((-80.0f64..80.0, -170.0f64..170.0), 1..32)
    ) {
        let bounds = bounds_for_points(&points).expect("non-empty input");
        for (lat, lng) in points {
            prop_assert!(is_in_bounds(lat, lng, bounds));
        }
    }
}
