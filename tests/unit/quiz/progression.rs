use super::*;
use crate::assets::geo::TrackMetadata;
use chrono::FixedOffset;

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

fn entries(ids: &[&str]) -> Vec<TrackEntry> {
    ids.iter()
        .map(|id| TrackEntry {
            id: id.to_string(),
            dir: std::path::PathBuf::from(id),
            metadata: TrackMetadata::default(),
        })
        .collect()
}

fn straight_track(n: usize) -> Track {
    Track {
        id: "line".into(),
        metadata: TrackMetadata::default(),
        points: (0..n)
            .map(|i| GeoPoint::new(48.0, 9.0 + i as f64 * 0.001))
            .collect(),
    }
}

#[test]
fn week_counts_from_first_monday_of_2000() {
    assert_eq!(QuizWeek::of(&local(2000, 1, 3, 0, 0)), QuizWeek(0));
    assert_eq!(QuizWeek::of(&local(2000, 1, 9, 23, 59)), QuizWeek(0));
    assert_eq!(QuizWeek::of(&local(2000, 1, 10, 0, 0)), QuizWeek(1));
    assert_eq!(QuizWeek::of(&local(2000, 1, 2, 12, 0)), QuizWeek(-1));
}

#[test]
fn week_uses_local_date_not_utc() {
    // 2000-01-10 00:30 at UTC+1 is still Sunday in UTC
    assert_eq!(QuizWeek::of(&local(2000, 1, 10, 0, 30)), QuizWeek(1));
}

#[test]
fn hint_level_follows_weekday() {
    // 2024-05-06 is a Monday
    assert_eq!(hint_level(&local(2024, 5, 6, 8, 0)), HintLevel(0));
    assert_eq!(hint_level(&local(2024, 5, 8, 23, 0)), HintLevel(2));
    assert_eq!(hint_level(&local(2024, 5, 12, 1, 0)), HintLevel(6));
}

#[test]
fn path_grows_on_monday_in_ten_minute_steps() {
    assert_eq!(Stage::at_hours(0.0).path_fraction, 0.0);
    assert_eq!(Stage::at_hours(5.99).path_fraction, 0.0);
    assert_eq!(Stage::at_hours(6.0).path_fraction, 0.0);
    assert_eq!(Stage::at_hours(13.0).path_fraction, 0.5);
    // 13:05 is still the 13:00 step
    assert_eq!(Stage::at_hours(13.0 + 5.0 / 60.0).path_fraction, 0.5);
    assert_eq!(Stage::at_hours(20.0).path_fraction, 1.0);
    assert_eq!(Stage::at_hours(30.0).path_fraction, 1.0);
}

#[test]
fn hints_unlock_through_the_week() {
    let mon = Stage::at_hours(12.0);
    assert!(!mon.add_scale && !mon.draw_topo && mon.info.is_empty());

    let tue = Stage::at_hours(25.0);
    assert!(tue.add_scale && !tue.draw_topo);

    let wed = Stage::at_hours(49.0);
    assert!(wed.draw_topo && !wed.draw_level_labels);
    assert!(Stage::at_hours(61.0).draw_level_labels);

    let thu = Stage::at_hours(73.0);
    assert_eq!(thu.info, vec![InfoField::Country]);
    assert!(Stage::at_hours(85.0).shows(InfoField::Year));

    let sun = Stage::at_hours(150.0);
    assert_eq!(sun.level, HintLevel::MAX);
    assert_eq!(sun.info.len(), 6);
    assert!(sun.shows(InfoField::Landmarks));
}

#[test]
fn stage_is_monotonic_over_the_week() {
    let mut prev = Stage::at_hours(0.0);
    for tenth in 1..(7 * 24 * 10) {
        let s = Stage::at_hours(f64::from(tenth) / 10.0);
        assert!(s.level >= prev.level);
        assert!(s.path_fraction >= prev.path_fraction);
        assert!(s.add_scale >= prev.add_scale);
        assert!(s.draw_topo >= prev.draw_topo);
        assert!(s.info.len() >= prev.info.len());
        prev = s;
    }
}

#[test]
fn stage_from_hint_level_is_start_of_day() {
    assert_eq!(Stage::from(HintLevel(0)).path_fraction, 0.0);
    assert_eq!(Stage::from(HintLevel(1)), Stage::at_hours(24.0));
    assert_eq!(Stage::from(HintLevel(3)).info, vec![InfoField::Country]);
    assert_eq!(Stage::from(HintLevel(9)), Stage::from(HintLevel::MAX));
}

#[test]
fn round_robin_cycles_sorted_ids() {
    let tracks = entries(&["t2", "t1", "t3"]);
    let history = QuizHistory::default();
    let pick = |w| {
        select_week_track(QuizWeek(w), &tracks, &history, RotationPolicy::RoundRobin)
            .unwrap()
            .id
            .clone()
    };
    assert_eq!(pick(0), "t1");
    assert_eq!(pick(1), "t2");
    assert_eq!(pick(2), "t3");
    assert_eq!(pick(3), "t1");
    assert_eq!(pick(-1), "t3");
}

#[test]
fn no_tracks_is_no_content() {
    let err = select_week_track(
        QuizWeek(0),
        &[],
        &QuizHistory::default(),
        RotationPolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, InkError::NoContentAvailable(_)));
}

#[test]
fn shuffled_is_deterministic_and_honours_history() {
    let tracks = entries(&["a", "b", "c", "d"]);
    let policy = RotationPolicy::Shuffled { seed: 7 };
    let empty = QuizHistory::default();

    let first = select_week_track(QuizWeek(100), &tracks, &empty, policy).unwrap();
    let again = select_week_track(QuizWeek(100), &tracks, &empty, policy).unwrap();
    assert_eq!(first.id, again.id);

    let mut recorded = QuizHistory::default();
    recorded.record(QuizWeek(100), "c");
    let kept = select_week_track(QuizWeek(100), &tracks, &recorded, policy).unwrap();
    assert_eq!(kept.id, "c");
}

#[test]
fn shuffled_skips_recent_tracks() {
    let tracks = entries(&["a", "b", "c", "d"]);
    let policy = RotationPolicy::Shuffled { seed: 1 };
    let mut history = QuizHistory::default();
    history.record(QuizWeek(8), "a");
    history.record(QuizWeek(9), "b");
    for week in 10..30 {
        let pick = select_week_track(QuizWeek(week), &tracks, &history, policy).unwrap();
        assert!(pick.id != "a" && pick.id != "b", "week {week}: {}", pick.id);
    }
}

#[test]
fn shuffled_ignores_history_of_removed_tracks() {
    let tracks = entries(&["a", "b"]);
    let mut history = QuizHistory::default();
    history.record(QuizWeek(5), "gone");
    let pick =
        select_week_track(QuizWeek(5), &tracks, &history, RotationPolicy::default()).unwrap();
    assert!(pick.id == "a" || pick.id == "b");
}

#[test]
fn reveal_at_zero_is_start_point_only() {
    let track = straight_track(5);
    let subset = reveal(&track, &Stage::at_hours(0.0)).unwrap();
    assert_eq!(subset.points, vec![track.points[0]]);
    assert_eq!(subset.length_m(), 0.0);
}

#[test]
fn reveal_half_interpolates_inside_a_segment() {
    let track = straight_track(4);
    let stage = Stage {
        path_fraction: 0.5,
        ..Stage::at_hours(0.0)
    };
    let subset = reveal(&track, &stage).unwrap();
    assert_eq!(subset.points.len(), 3);
    let expected = track.length_m() * 0.5;
    assert!((subset.length_m() - expected).abs() < 1e-6 * expected);
    assert!((subset.points[2].lon - 9.0015).abs() < 1e-9);
}

#[test]
fn reveal_full_returns_whole_track_and_constant_extent() {
    let track = straight_track(6);
    let partial = reveal(&track, &Stage::at_hours(10.0)).unwrap();
    let full = reveal(&track, &Stage::at_hours(100.0)).unwrap();
    assert_eq!(full.points, track.points);
    assert_eq!(partial.extent, full.extent);
    assert!(full.extent.contains_bounds(full.track_bounds));
    assert!(partial.length_m() < full.length_m());
}

#[test]
fn reveal_empty_track_is_no_content() {
    let track = Track {
        id: "empty".into(),
        metadata: TrackMetadata::default(),
        points: vec![],
    };
    assert!(matches!(
        reveal(&track, &Stage::at_hours(0.0)),
        Err(InkError::NoContentAvailable(_))
    ));
}
