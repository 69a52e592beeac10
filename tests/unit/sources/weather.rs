use super::*;

const BODY: &str = r#"{
  "latitude": 48.74,
  "longitude": 9.31,
  "daily": {
    "time": ["2024-05-06", "2024-05-07"],
    "temperature_2m_max": [18.4, null],
    "temperature_2m_min": [7.1, 8.0],
    "precipitation_sum": [0.4, 0.0],
    "precipitation_hours": [2.0, 0.0],
    "wind_speed_10m_max": [24.5, 10.0],
    "sunrise": ["2024-05-06T05:50", "2024-05-07T05:48"],
    "sunset": ["2024-05-06T20:46", null]
  },
  "hourly": {
    "time": ["2024-05-06T07:00", "2024-05-06T08:00", "2024-05-06T13:00",
             "2024-05-06T20:00", "2024-05-07T09:00"],
    "weather_code": [95, 3, 61, 99, null],
    "precipitation": [0.0, 0.0, 0.4, 0.0, null]
  }
}"#;

#[test]
fn parses_days_and_assigns_hours() {
    let days = parse_forecast(BODY).unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    assert_eq!(days[0].hours.len(), 4);
    assert_eq!(days[1].hours.len(), 1);
    assert_eq!(days[0].temperature_max, 18.4);
    assert_eq!(days[1].temperature_max, 0.0);
    assert_eq!(days[0].precipitation_sum, 0.4);
    assert_eq!(days[0].wind_speed_max, 24.5);
}

#[test]
fn daytime_code_ignores_night_hours() {
    let days = parse_forecast(BODY).unwrap();
    // 07:00 thunderstorm and 20:00 hail are outside 08-20
    assert_eq!(days[0].daytime_weather_code(), Some(61));
    assert_eq!(days[1].daytime_weather_code(), None);
    assert_eq!(days[0].max_hourly_precipitation(), 0.4);
}

#[test]
fn malformed_body_is_data_fetch_error() {
    assert!(matches!(
        parse_forecast("{\"daily\": 3}"),
        Err(InkError::DataFetch(_))
    ));
    let bad_time = BODY.replace("2024-05-06T13:00", "13 o'clock");
    assert!(matches!(
        parse_forecast(&bad_time),
        Err(InkError::DataFetch(_))
    ));
}
