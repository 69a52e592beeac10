use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "inkboard_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_track(root: &Path, id: &str, metadata: Option<&str>, csv: &str) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    if let Some(m) = metadata {
        fs::write(dir.join(METADATA_FILE), m).unwrap();
    }
    fs::write(dir.join(POINTS_FILE), csv).unwrap();
}

#[test]
fn distance_of_one_degree_latitude() {
    let d = GeoPoint::new(48.0, 9.0).distance_m(GeoPoint::new(49.0, 9.0));
    assert!((d - 111_195.0).abs() < 100.0, "{d}");
}

#[test]
fn bounds_padding_and_intersection() {
    let b = GeoBounds::of(&[GeoPoint::new(48.0, 9.0), GeoPoint::new(48.2, 9.4)]).unwrap();
    let p = b.padded(0.1, 0.0);
    assert!(p.contains_bounds(b));
    assert!((p.min.lon - 8.96).abs() < 1e-9);

    let other = GeoBounds::of(&[GeoPoint::new(48.1, 9.3), GeoPoint::new(50.0, 10.0)]).unwrap();
    assert!(b.intersects(other));
    let far = GeoBounds::of(&[GeoPoint::new(10.0, 10.0)]).unwrap();
    assert!(!b.intersects(far));
    assert!(GeoBounds::of(&[]).is_none());
}

#[test]
fn list_sorts_and_skips_excluded_tracks() {
    let tmp = temp_dir("track_list");
    write_track(&tmp, "b-alb", None, "lat,lon\n48.0,9.0\n");
    write_track(
        &tmp,
        "a-harz",
        Some(r#"{"country": "Deutschland", "landmarks": ["Brocken"]}"#),
        "lat,lon\n51.8,10.6\n",
    );
    write_track(
        &tmp,
        "c-secret",
        Some(r#"{"exclude_from_quiz": true}"#),
        "lat,lon\n1.0,1.0\n",
    );
    fs::write(tmp.join("README.txt"), "not a track").unwrap();

    let store = TrackStore::new(&tmp);
    let list = store.list().unwrap();
    let ids: Vec<&str> = list.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a-harz", "b-alb"]);
    assert_eq!(list[0].metadata.country.as_deref(), Some("Deutschland"));
    assert_eq!(list[0].metadata.landmarks, ["Brocken"]);

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn load_reads_points_and_ignores_extra_columns() {
    let tmp = temp_dir("track_load");
    write_track(
        &tmp,
        "t1",
        None,
        "lat,lon,ele\n48.0,9.0,400\n48.01,9.01,420\n",
    );
    let store = TrackStore::new(&tmp);
    let entry = store.list().unwrap().remove(0);
    let track = store.load(&entry).unwrap();
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.points[1], GeoPoint::new(48.01, 9.01));
    assert!(track.length_m() > 1000.0);

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn load_rejects_empty_track() {
    let tmp = temp_dir("track_empty");
    write_track(&tmp, "t1", None, "lat,lon\n");
    let store = TrackStore::new(&tmp);
    let entry = store.list().unwrap().remove(0);
    assert!(matches!(store.load(&entry), Err(InkError::Render(_))));
    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_tracks_dir_lists_nothing() {
    let store = TrackStore::new(temp_dir("no_such_tracks"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn parse_feature_collection_reads_elevation_and_shapes() {
    let json = br#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"ELEV": 500.0},
         "geometry": {"type": "LineString", "coordinates": [[9.0, 48.0], [9.1, 48.1, 500.0]]}},
        {"type": "Feature", "properties": {},
         "geometry": {"type": "Polygon", "coordinates": [[[9.0, 48.0], [9.2, 48.0], [9.2, 48.2], [9.0, 48.0]]]}},
        {"type": "Feature", "properties": null, "geometry": null}
      ]
    }"#;
    let features = parse_feature_collection(json).unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0].elevation, Some(500.0));
    assert!(matches!(&features[0].shape, FeatureShape::Lines(l) if l[0].len() == 2));
    assert!(matches!(&features[1].shape, FeatureShape::Areas(a) if a[0][0].len() == 4));
    assert_eq!(features[1].bounds.max, GeoPoint::new(48.2, 9.2));
}

#[test]
fn parse_feature_collection_skips_points_and_collections() {
    let json = br#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"name": "Gipfel"},
         "geometry": {"type": "Point", "coordinates": [9.05, 48.05]}},
        {"type": "Feature", "properties": {"ele": 420},
         "geometry": {"type": "LineString", "coordinates": [[9.0, 48.0], [9.1, 48.1]]}},
        {"type": "Feature", "properties": {},
         "geometry": {"type": "MultiPoint", "coordinates": [[9.0, 48.0], [9.1, 48.1]]}},
        {"type": "Feature", "properties": {},
         "geometry": {"type": "GeometryCollection", "geometries": [
           {"type": "Point", "coordinates": [9.0, 48.0]}
         ]}}
      ]
    }"#;
    let features = parse_feature_collection(json).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].elevation, Some(420.0));
    assert!(matches!(&features[0].shape, FeatureShape::Lines(l) if l[0].len() == 2));
}

#[test]
fn parse_feature_collection_rejects_short_positions() {
    let json = br#"{"features": [{"geometry": {"type": "LineString", "coordinates": [[9.0]]}}]}"#;
    assert!(parse_feature_collection(json).is_err());
}

#[test]
fn layer_region_query_filters_by_bounds() {
    let near = TopoFeature {
        elevation: Some(100.0),
        shape: FeatureShape::Lines(vec![vec![GeoPoint::new(48.0, 9.0)]]),
        bounds: GeoBounds::of(&[GeoPoint::new(48.0, 9.0)]).unwrap(),
    };
    let mut far = near.clone();
    far.bounds = GeoBounds::of(&[GeoPoint::new(0.0, 0.0)]).unwrap();
    let layer = TopoLayer::from_features(vec![near, far]);

    let region = GeoBounds::of(&[GeoPoint::new(47.9, 8.9), GeoPoint::new(48.1, 9.1)]).unwrap();
    assert_eq!(layer.features_in(region).count(), 1);
    assert_eq!(layer.len(), 2);
}

#[test]
fn missing_layer_dir_is_empty() {
    let layer = TopoLayer::load(&temp_dir("no_such_layer")).unwrap();
    assert!(layer.is_empty());
}
