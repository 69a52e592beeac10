use super::*;

fn bounds(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> GeoBounds {
    GeoBounds {
        min: GeoPoint::new(min_lat, min_lon),
        max: GeoPoint::new(max_lat, max_lon),
    }
}

const FRAME: Rect = Rect::new(0.0, 0.0, 800.0, 480.0);

#[test]
fn tall_extent_is_widened_and_centered() {
    let extent = bounds(0.0, 0.0, 1.0, 0.1);
    let vp = Viewport::fit(extent, FRAME, Placement::Center).unwrap();
    assert!(vp.extent().contains_bounds(extent));
    let center = vp.project(extent.center());
    assert!((center.x - 400.0).abs() < 1e-6);
    assert!((center.y - 240.0).abs() < 1e-6);

    let top_right = vp.project(vp.extent().max);
    assert!(top_right.x > 799.0 && top_right.y.abs() < 1e-6);
}

#[test]
fn left_placement_starts_at_the_frame_edge() {
    let extent = bounds(0.0, 0.0, 1.0, 0.1);
    let vp = Viewport::fit(extent, FRAME, Placement::Left).unwrap();
    let p = vp.project(GeoPoint::new(1.0, 0.0));
    assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
    assert!(vp.project(GeoPoint::new(0.0, 0.1)).x < 400.0);
}

#[test]
fn wide_extent_is_widened_vertically() {
    let extent = bounds(0.0, 0.0, 0.1, 2.0);
    let vp = Viewport::fit(extent, FRAME, Placement::Left).unwrap();
    assert!(vp.extent().contains_bounds(extent));
    assert!((vp.project(GeoPoint::new(0.05, 0.0)).x).abs() < 1e-9);
    assert!((vp.project(GeoPoint::new(0.05, 2.0)).x - 800.0).abs() < 1e-6);
    assert!((vp.project(GeoPoint::new(0.05, 1.0)).y - 240.0).abs() < 1e-6);
}

#[test]
fn pixels_are_square_on_the_ground() {
    let extent = bounds(48.0, 9.0, 48.1, 9.2);
    let vp = Viewport::fit(extent, FRAME, Placement::Center).unwrap();
    let a = GeoPoint::new(48.05, 9.05);
    let east = GeoPoint::new(48.05, 9.1);
    let north = GeoPoint::new(48.05 + a.distance_m(east) / METERS_PER_DEG_LAT, 9.05);
    let dx = vp.project(east).x - vp.project(a).x;
    let dy = vp.project(a).y - vp.project(north).y;
    assert!((dx - dy).abs() / dx < 1e-3);
    assert!((vp.meters_per_px() * dx - a.distance_m(east)).abs() / a.distance_m(east) < 1e-3);
}

#[test]
fn degenerate_inputs_are_rejected() {
    let point = bounds(1.0, 1.0, 1.0, 1.0);
    assert!(Viewport::fit(point, FRAME, Placement::Center).is_err());
    let extent = bounds(0.0, 0.0, 1.0, 1.0);
    assert!(Viewport::fit(extent, Rect::new(0.0, 0.0, 0.0, 10.0), Placement::Center).is_err());
}
