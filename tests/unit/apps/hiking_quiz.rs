use super::*;
use chrono::{FixedOffset, TimeZone};

use crate::quiz::progression::HintLevel;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "inkboard_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn metadata() -> TrackMetadata {
    TrackMetadata {
        year: Some(2021),
        month: Some(3),
        country: Some("Deutschland".to_string()),
        state: Some("Baden-Württemberg".to_string()),
        city: Some("Esslingen".to_string()),
        landmarks: vec![
            "Burg".to_string(),
            "Neckar".to_string(),
            "Weinberge".to_string(),
        ],
        ..TrackMetadata::default()
    }
}

fn write_track(root: &std::path::Path, id: &str) {
    let dir = root.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("metadata.json"),
        serde_json::to_vec(&metadata()).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("track.csv"),
        "lat,lon\n48.740,9.300\n48.745,9.310\n48.750,9.305\n48.748,9.295\n",
    )
    .unwrap();
}

fn local(d: u32, h: u32) -> Now {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, d, h, 0, 0)
        .unwrap()
}

#[test]
fn description_grows_with_the_week() {
    let meta = metadata();
    assert!(description_lines(&meta, &Stage::from(HintLevel(2))).is_empty());
    assert_eq!(
        description_lines(&meta, &Stage::from(HintLevel(3))),
        vec!["Deutschland".to_string()]
    );
    assert_eq!(
        description_lines(&meta, &Stage::at_hours(4.0 * 24.0 + 13.0)),
        vec![
            "März 2021".to_string(),
            String::new(),
            "Baden-Württemberg, Deutschland".to_string(),
        ]
    );
    assert_eq!(
        description_lines(&meta, &Stage::from(HintLevel::MAX)),
        vec![
            "März 2021".to_string(),
            String::new(),
            "Esslingen, Baden-Württemberg, Deutschland".to_string(),
            String::new(),
            "Burg, Neckar und Weinberge".to_string(),
        ]
    );
}

#[test]
fn missing_metadata_fields_are_left_out() {
    let meta = TrackMetadata {
        country: Some("Schweiz".to_string()),
        month: Some(13),
        ..TrackMetadata::default()
    };
    assert_eq!(
        description_lines(&meta, &Stage::from(HintLevel::MAX)),
        vec!["Schweiz".to_string()]
    );
}

#[test]
fn lists_join_with_und() {
    let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    assert_eq!(format_list(&[]), "");
    assert_eq!(format_list(&s(&["A"])), "A");
    assert_eq!(format_list(&s(&["A", "B"])), "A und B");
    assert_eq!(format_list(&s(&["A", "B", "C"])), "A, B und C");
}

#[test]
fn scale_bar_picks_round_lengths() {
    assert_eq!(scale_bar(10.0), (1000.0, "1 km".to_string()));
    assert_eq!(scale_bar(3.0), (200.0, "200 m".to_string()));
    assert_eq!(scale_bar(40.0), (5000.0, "5 km".to_string()));
    assert_eq!(nice_floor(0.0), 1.0);
}

#[test]
fn description_layout_per_corner() {
    let mut fonts = Fonts::disabled();
    let lines = vec!["März 2021".to_string(), String::new(), "Deutschland".to_string()];

    let br = layout_description(&mut fonts, &lines, DescriptionCorner::BottomRight, 800.0, 480.0)
        .unwrap();
    assert_eq!(br.len(), 2);
    // drawn bottom to top, right-aligned
    assert_eq!(br[0].0, "Deutschland");
    assert_eq!(br[0].1.y1, 470.0);
    assert_eq!(br[0].1.x1, 790.0);
    assert_eq!(br[1].1.y1, 470.0 - PAR_SKIP);

    let bl = layout_description(&mut fonts, &lines, DescriptionCorner::BottomLeft, 800.0, 480.0)
        .unwrap();
    assert_eq!(bl[0].1.x0, 10.0);
    assert_eq!(bl[0].1.y1, 480.0 - 10.0 - SCALE_HEIGHT);

    let tr = layout_description(&mut fonts, &lines, DescriptionCorner::TopRight, 800.0, 480.0)
        .unwrap();
    assert_eq!(tr[0].0, "März 2021");
    assert_eq!(tr[0].1.y0, 10.0);
    assert_eq!(tr[1].1.y1, 34.0 + PAR_SKIP);
}

#[test]
fn long_lines_wrap_to_a_third_of_the_width() {
    let mut fonts = Fonts::disabled();
    let lines = vec!["Burg Hohenneuffen, Schwäbische Alb und Albtrauf".to_string()];
    let boxes =
        layout_description(&mut fonts, &lines, DescriptionCorner::TopRight, 800.0, 480.0).unwrap();
    assert!(boxes.len() > 1);
    assert!(boxes.iter().all(|(_, r)| r.width() <= 800.0 / 3.0));
}

#[test]
fn render_all_draws_three_screens_without_recording() {
    let root = temp_dir("quiz_render");
    let tracks = root.join("tracks");
    write_track(&tracks, "alb");
    write_track(&tracks, "neckar");
    let history = root.join("history.csv");

    let app = HikingQuizApp::new(TrackStore::new(&tracks))
        .with_history(history.clone())
        .with_policy(RotationPolicy::RoundRobin);
    let mut res = RenderResources::disabled();
    let now = local(10, 15); // Friday afternoon

    let screens = app.render_all(&now, &mut res).unwrap();
    assert_eq!(screens.len(), QUIZ_SCREENS);
    for screen in &screens {
        let raster = screen.as_ref().unwrap();
        assert_eq!(raster.bitmap().width(), DISPLAY_WIDTH);
        assert!(raster.bitmap().count_black() > 0);
    }

    assert!(!history.exists());
    let plan = app.plan(&now).unwrap();
    assert!(app.record(&plan).unwrap());
    let recorded = QuizHistory::load(&history).unwrap();
    assert_eq!(recorded.track_for_week(plan.week), Some(plan.track_id.as_str()));
    assert!(!app.record(&plan).unwrap());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn render_key_changes_only_with_the_stage() {
    let root = temp_dir("quiz_key");
    write_track(&root, "alb");
    let app = HikingQuizApp::new(TrackStore::new(&root));

    let a = app.plan(&local(8, 9)).unwrap().render_key().unwrap();
    let b = app.plan(&local(8, 11)).unwrap().render_key().unwrap();
    let c = app.plan(&local(8, 13)).unwrap().render_key().unwrap();
    assert_eq!(a, b);
    assert_ne!(b, c);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn empty_store_has_no_content() {
    let app = HikingQuizApp::new(TrackStore::new(temp_dir("quiz_empty")));
    let mut res = RenderResources::disabled();
    assert!(matches!(
        app.render_all(&local(6, 12), &mut res),
        Err(InkError::NoContentAvailable(_))
    ));
    assert!(matches!(
        app.render_screen(3, &local(6, 12), &mut res),
        Err(InkError::Validation(_))
    ));
}
