use super::*;

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!(
            "inkboard_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
        .join("history.csv")
}

#[test]
fn missing_file_is_empty() {
    let h = QuizHistory::load(&temp_file("history_missing")).unwrap();
    assert!(h.entries().is_empty());
}

#[test]
fn save_then_load_keeps_rows() {
    let path = temp_file("history_save");
    let mut h = QuizHistory::default();
    assert!(h.record(QuizWeek(10), "alb"));
    assert!(h.record(QuizWeek(11), "harz"));
    assert!(!h.record(QuizWeek(11), "other"));
    h.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("week,track_name"));

    let loaded = QuizHistory::load(&path).unwrap();
    assert_eq!(loaded, h);
    assert_eq!(loaded.track_for_week(QuizWeek(11)), Some("harz"));
    assert_eq!(loaded.track_for_week(QuizWeek(12)), None);

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn recent_before_ignores_current_and_later_weeks() {
    let h = QuizHistory::from_entries(vec![
        HistoryEntry {
            week: 1,
            track_name: "a".into(),
        },
        HistoryEntry {
            week: 2,
            track_name: "b".into(),
        },
        HistoryEntry {
            week: 3,
            track_name: "c".into(),
        },
        HistoryEntry {
            week: 4,
            track_name: "d".into(),
        },
    ]);
    assert_eq!(h.recent_before(QuizWeek(4), 2), ["b", "c"]);
    assert_eq!(h.recent_before(QuizWeek(2), 5), ["a"]);
    assert!(h.recent_before(QuizWeek(4), 0).is_empty());
}

#[test]
fn malformed_file_is_validation_error() {
    let path = temp_file("history_bad");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "week,track_name\nnot-a-number,x\n").unwrap();
    assert!(matches!(
        QuizHistory::load(&path),
        Err(InkError::Validation(_))
    ));
    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}
