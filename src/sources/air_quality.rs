use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    foundation::{
        error::{InkError, InkResult},
        math::round_to,
    },
    sources::retry::{RetryPolicy, retry_with_backoff},
};

/// Indoor climate quantities recorded by the sensor.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    Co2,
}

impl Metric {
    /// Field name in the time-series database.
    pub fn field(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Co2 => "co2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperatur",
            Metric::Humidity => "Luftfeuchtigkeit",
            Metric::Co2 => "CO₂ Gehalt",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Co2 => "ppm",
        }
    }

    /// Decimal places shown; negative values round to tens.
    pub fn precision(self) -> i32 {
        match self {
            Metric::Temperature => 1,
            Metric::Humidity => 0,
            Metric::Co2 => -1,
        }
    }

    /// The trend chart's y axis always covers at least this range.
    pub fn min_range(self) -> (f64, f64) {
        match self {
            Metric::Temperature => (18.0, 24.0),
            Metric::Humidity => (40.0, 60.0),
            Metric::Co2 => (400.0, 1000.0),
        }
    }

    /// `value` rounded to [`Metric::precision`], without unit.
    pub fn format(self, value: f64) -> String {
        let p = self.precision();
        if p < 0 {
            format!("{:.0}", round_to(value, p))
        } else {
            format!("{value:.prec$}", prec = p as usize)
        }
    }
}

/// One reading; `value` is `None` for an aggregation window without data.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Access to recorded indoor climate data.
pub trait AirQualitySource {
    /// Samples inside `window`, oldest first, possibly with gaps.
    fn history(
        &self,
        metric: Metric,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> InkResult<Vec<Sample>>;

    /// The most recent sample, if any was ever recorded.
    fn latest(&self, metric: Metric) -> InkResult<Option<Sample>>;
}

/// Connection settings of an InfluxDB 2 instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfluxSettings {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub sensor_id: String,
    pub token: String,
}

/// Aggregation window of the trend queries.
pub const AGGREGATE_EVERY: &str = "5m";

/// InfluxDB 2 client posting Flux queries and decoding the annotated CSV reply.
pub struct InfluxClient {
    settings: InfluxSettings,
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl InfluxClient {
    pub fn new(settings: InfluxSettings, retry: RetryPolicy, timeout: Duration) -> InkResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InkError::data_fetch(format!("build http client: {e}")))?;
        Ok(Self {
            settings,
            client,
            retry,
        })
    }

    fn filter(&self, metric: Metric) -> String {
        format!(
            "|> filter(fn: (r) => r._field == \"{}\" and r.sensorid == \"{}\")",
            metric.field(),
            flux_escape(&self.settings.sensor_id)
        )
    }

    pub fn history_query(&self, metric: Metric, window: (DateTime<Utc>, DateTime<Utc>)) -> String {
        format!(
            "from(bucket: \"{}\")\n    |> range(start: {}, stop: {})\n    {}\n    \
             |> aggregateWindow(every: {AGGREGATE_EVERY}, fn: mean, createEmpty: true)",
            flux_escape(&self.settings.bucket),
            window.0.to_rfc3339_opts(SecondsFormat::Secs, true),
            window.1.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.filter(metric)
        )
    }

    pub fn latest_query(&self, metric: Metric) -> String {
        format!(
            "from(bucket: \"{}\")\n    |> range(start: 0)\n    {}\n    |> last()",
            flux_escape(&self.settings.bucket),
            self.filter(metric)
        )
    }

    fn query(&self, flux: &str) -> InkResult<Vec<Sample>> {
        let url = format!("{}/api/v2/query", self.settings.url.trim_end_matches('/'));
        let body = serde_json::json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "annotations": ["datatype", "group", "default"],
                "header": true,
            },
        });
        let text = retry_with_backoff(&self.retry, "influxdb query", || {
            let response = self
                .client
                .post(&url)
                .query(&[("org", self.settings.org.as_str())])
                .header("Authorization", format!("Token {}", self.settings.token))
                .header("Accept", "application/csv")
                .json(&body)
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
        })?;
        parse_flux_csv(&text)
    }
}

impl AirQualitySource for InfluxClient {
    #[tracing::instrument(skip(self))]
    fn history(
        &self,
        metric: Metric,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> InkResult<Vec<Sample>> {
        let mut samples = self.query(&self.history_query(metric, window))?;
        samples.sort_by_key(|s| s.time);
        tracing::debug!(n = samples.len(), "fetched history");
        Ok(samples)
    }

    #[tracing::instrument(skip(self))]
    fn latest(&self, metric: Metric) -> InkResult<Option<Sample>> {
        Ok(self
            .query(&self.latest_query(metric))?
            .into_iter()
            .max_by_key(|s| s.time))
    }
}

/// Stand-in for a source that could not be set up; every query fails with `reason`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AirQualitySource for UnavailableSource {
    fn history(
        &self,
        _metric: Metric,
        _window: (DateTime<Utc>, DateTime<Utc>),
    ) -> InkResult<Vec<Sample>> {
        Err(InkError::data_fetch(self.reason.clone()))
    }

    fn latest(&self, _metric: Metric) -> InkResult<Option<Sample>> {
        Err(InkError::data_fetch(self.reason.clone()))
    }
}

fn flux_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Decode annotated CSV as returned by `/api/v2/query`. Annotation rows are skipped, every
/// table may repeat its header, and an empty `_value` cell is a missing sample.
pub fn parse_flux_csv(text: &str) -> InkResult<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut columns: Option<(usize, usize)> = None;
    let mut out = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| InkError::data_fetch(format!("malformed query reply: {e}")))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let find = |name: &str| record.iter().position(|f| f == name);
        if let (Some(t), Some(v)) = (find("_time"), find("_value")) {
            columns = Some((t, v));
            continue;
        }
        if find("error").is_some() {
            return Err(InkError::data_fetch("query returned an error table"));
        }
        let Some((ti, vi)) = columns else {
            return Err(InkError::data_fetch("query reply has no _time/_value header"));
        };
        let time_str = record.get(ti).unwrap_or_default();
        let time = DateTime::parse_from_rfc3339(time_str)
            .map_err(|e| InkError::data_fetch(format!("invalid _time '{time_str}': {e}")))?
            .with_timezone(&Utc);
        let value = match record.get(vi).unwrap_or_default().trim() {
            "" => None,
            v => Some(
                v.parse::<f64>()
                    .map_err(|e| InkError::data_fetch(format!("invalid _value '{v}': {e}")))?,
            ),
        };
        out.push(Sample { time, value });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/sources/air_quality.rs"]
mod tests;
