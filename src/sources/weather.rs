use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::{
    assets::geo::GeoPoint,
    foundation::error::{InkError, InkResult},
    sources::retry::{RetryPolicy, retry_with_backoff},
};

/// Daytime hours considered when picking the weather of a day (`[from, to)`).
pub const DAYTIME_HOURS: (u32, u32) = (8, 20);

#[derive(Clone, Debug, PartialEq)]
pub struct HourForecast {
    /// Local time at the forecast location.
    pub time: NaiveDateTime,
    /// WMO weather interpretation code.
    pub weather_code: Option<u8>,
    pub precipitation_mm: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub precipitation_sum: f64,
    pub wind_speed_max: f64,
    pub hours: Vec<HourForecast>,
}

impl DayForecast {
    /// Most severe (highest) weather code between 08:00 and 20:00.
    pub fn daytime_weather_code(&self) -> Option<u8> {
        self.hours
            .iter()
            .filter(|h| (DAYTIME_HOURS.0..DAYTIME_HOURS.1).contains(&h.time.hour()))
            .filter_map(|h| h.weather_code)
            .max()
    }

    pub fn max_hourly_precipitation(&self) -> f64 {
        self.hours
            .iter()
            .map(|h| h.precipitation_mm)
            .fold(0.0, f64::max)
    }
}

/// A multi-day forecast provider.
pub trait WeatherSource {
    fn forecast(&self, location: GeoPoint, days: u32) -> InkResult<Vec<DayForecast>>;
}

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max";
const HOURLY_FIELDS: &str = "weather_code,precipitation";

/// Open-Meteo forecast API over blocking HTTP.
pub struct OpenMeteoClient {
    base_url: String,
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl OpenMeteoClient {
    pub fn new(
        base_url: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> InkResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InkError::data_fetch(format!("build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            retry,
        })
    }

    fn fetch(&self, location: GeoPoint, days: u32) -> InkResult<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", location.lat.to_string()),
                ("longitude", location.lon.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .map_err(|e| InkError::data_fetch(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(InkError::data_fetch(format!("status {status}: {body}")));
        }
        response
            .text()
            .map_err(|e| InkError::data_fetch(e.to_string()))
    }
}

impl WeatherSource for OpenMeteoClient {
    #[tracing::instrument(skip(self))]
    fn forecast(&self, location: GeoPoint, days: u32) -> InkResult<Vec<DayForecast>> {
        let body = retry_with_backoff(&self.retry, "open-meteo forecast", || {
            self.fetch(location, days)
        })?;
        let forecast = parse_forecast(&body)?;
        tracing::info!(days = forecast.len(), "fetched weather forecast");
        Ok(forecast)
    }
}

#[derive(serde::Deserialize)]
struct ForecastBody {
    daily: DailyBlock,
    hourly: HourlyBlock,
}

#[derive(serde::Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(serde::Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    weather_code: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
}

const LOCAL_MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn parse_local(s: &str) -> InkResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, LOCAL_MINUTE_FORMAT)
        .map_err(|e| InkError::data_fetch(format!("invalid time '{s}': {e}")))
}

fn column<T: Clone + Default>(values: &[Option<T>], i: usize) -> T {
    values.get(i).cloned().flatten().unwrap_or_default()
}

/// Decode an Open-Meteo JSON reply requested with local timestamps (`timezone=auto`).
pub fn parse_forecast(body: &str) -> InkResult<Vec<DayForecast>> {
    let parsed: ForecastBody = serde_json::from_str(body)
        .map_err(|e| InkError::data_fetch(format!("malformed forecast: {e}")))?;
    let daily = parsed.daily;
    let hourly = parsed.hourly;

    let mut hours = Vec::with_capacity(hourly.time.len());
    for (i, t) in hourly.time.iter().enumerate() {
        hours.push(HourForecast {
            time: parse_local(t)?,
            weather_code: hourly
                .weather_code
                .get(i)
                .copied()
                .flatten()
                .filter(|c| (0.0..=255.0).contains(c))
                .map(|c| c as u8),
            precipitation_mm: column(&hourly.precipitation, i),
        });
    }

    let mut out = Vec::with_capacity(daily.time.len());
    for (i, d) in daily.time.iter().enumerate() {
        let date = NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|e| InkError::data_fetch(format!("invalid date '{d}': {e}")))?;
        out.push(DayForecast {
            date,
            temperature_min: column(&daily.temperature_2m_min, i),
            temperature_max: column(&daily.temperature_2m_max, i),
            precipitation_sum: column(&daily.precipitation_sum, i),
            wind_speed_max: column(&daily.wind_speed_10m_max, i),
            hours: hours
                .iter()
                .filter(|h| h.time.date() == date)
                .cloned()
                .collect(),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/sources/weather.rs"]
mod tests;
