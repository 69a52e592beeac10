use super::*;
use crate::publish::{Publisher, ScreenOutcome};

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

const FULL: &str = r#"{
  "catalog_dir": "static",
  "data_dir": "data",
  "icons_dir": "/srv/icons",
  "retry": { "attempts": 3, "backoff_ms": 50 },
  "apps": [
    { "type": "hiking_quiz", "policy": { "kind": "round_robin" } },
    { "type": "sun_weather", "latitude": 48.74, "longitude": 9.31 },
    {
      "type": "air_quality",
      "url": "http://192.168.178.222:8086",
      "org": "home",
      "bucket": "sensors",
      "sensor_id": "1",
      "token_file": "influx.token"
    }
  ]
}"#;

fn write_config(dir: &Path, json: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("inkboard.json");
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn relative_paths_resolve_against_the_config_file() {
    let dir = temp_dir("config_paths");
    let config = Config::from_path(write_config(&dir, FULL)).unwrap();
    assert_eq!(config.catalog_dir, dir.join("static"));
    assert_eq!(config.data_dir, dir.join("data"));
    assert_eq!(config.icons_dir, Some(PathBuf::from("/srv/icons")));
    assert_eq!(config.font, None);
    assert_eq!(config.timeout_secs, 10);
    assert_eq!(config.retry.attempts, 3);
    match &config.apps[1] {
        AppConfig::SunWeather(sw) => {
            assert_eq!(sw.days, 7);
            assert_eq!(sw.url, OPEN_METEO_URL);
        }
        other => panic!("unexpected app {other:?}"),
    }
    match &config.apps[2] {
        AppConfig::AirQuality(aq) => assert_eq!(aq.token_file, dir.join("influx.token")),
        other => panic!("unexpected app {other:?}"),
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn build_apps_keeps_config_order_and_reads_the_token() {
    let dir = temp_dir("config_build");
    let path = write_config(&dir, FULL);
    std::fs::write(dir.join("influx.token"), "secret\n").unwrap();
    let config = Config::from_path(&path).unwrap();

    let apps = config.build_apps().unwrap();
    let names: Vec<&str> = apps.iter().map(|a| a.name()).collect();
    assert_eq!(names, ["hiking_quiz", "sun_weather", "air_quality"]);

    let res = config.build_resources().unwrap();
    assert!(!res.fonts.is_enabled());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_token_file_only_disables_air_quality() {
    let dir = temp_dir("config_token");
    let track = dir.join("data").join("tracks").join("schurwald");
    std::fs::create_dir_all(&track).unwrap();
    std::fs::write(track.join("metadata.json"), r#"{"country":"Deutschland"}"#).unwrap();
    std::fs::write(
        track.join("track.csv"),
        "lat,lon\n48.74,9.30\n48.75,9.31\n48.76,9.30\n",
    )
    .unwrap();
    let path = write_config(
        &dir,
        r#"{
  "catalog_dir": "static",
  "data_dir": "data",
  "retry": { "attempts": 1, "backoff_ms": 0 },
  "apps": [
    { "type": "hiking_quiz", "policy": { "kind": "round_robin" } },
    {
      "type": "air_quality",
      "url": "http://127.0.0.1:9",
      "org": "home",
      "bucket": "sensors",
      "sensor_id": "1",
      "token_file": "missing_token.txt"
    }
  ]
}"#,
    );
    let config = Config::from_path(&path).unwrap();
    let apps = config.build_apps().unwrap();
    assert_eq!(apps.len(), 2);

    let now = chrono::DateTime::parse_from_rfc3339("2024-05-09T18:00:00+02:00").unwrap();
    let mut res = config.build_resources().unwrap();
    let result = Publisher::new(&config.catalog_dir)
        .publish_all(&apps, &now, &mut res)
        .unwrap();

    let quiz: Vec<ScreenOutcome> = result
        .screens
        .iter()
        .filter(|s| s.app_id == 0)
        .map(|s| s.outcome)
        .collect();
    assert_eq!(quiz, [ScreenOutcome::Rendered; 3]);
    assert!(config.catalog_dir.join("app/0/2.png").is_file());
    assert!(config.catalog_dir.join("app/1/0.png").is_file());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_configs_are_rejected() {
    let dir = temp_dir("config_invalid");
    let cases = [
        r#"{"catalog_dir":"s","data_dir":"d","apps":[]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","timeout_secs":0,"apps":[{"type":"hiking_quiz"}]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","apps":[{"type":"sun_weather","latitude":91,"longitude":0}]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","apps":[{"type":"sun_weather","latitude":0,"longitude":0,"days":30}]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","apps":[{"type":"air_quality","url":"","org":"o","bucket":"b","sensor_id":"1","token_file":"t"}]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","apps":[{"type":"slideshow"}]}"#,
        r#"{"catalog_dir":"s","data_dir":"d","colour":"red","apps":[{"type":"hiking_quiz"}]}"#,
    ];
    for json in cases {
        let err = Config::from_path(write_config(&dir, json)).unwrap_err();
        assert!(matches!(err, InkError::Validation(_)), "{json}: {err}");
    }
    assert!(matches!(
        Config::from_path(dir.join("absent.json")),
        Err(InkError::Validation(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn configured_font_must_be_readable() {
    let mut config: Config = serde_json::from_str(FULL).unwrap();
    config.font = Some(temp_dir("config_font").join("missing.ttf"));
    assert!(config.build_resources().is_err());
}
