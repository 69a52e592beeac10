//! JSON configuration of a deployment: where the catalog goes, where assets live and which
//! apps are published in which order.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    apps::{AirQualityApp, App, HikingQuizApp, RenderResources, SunWeatherApp},
    assets::{fonts::Fonts, geo::GeoPoint, geo::TrackStore, icons::IconSet},
    foundation::error::{InkError, InkResult},
    quiz::progression::RotationPolicy,
    sources::{
        air_quality::{AirQualitySource, InfluxClient, InfluxSettings, UnavailableSource},
        retry::RetryPolicy,
        weather::{OPEN_METEO_URL, OpenMeteoClient},
    },
};

/// Open-Meteo serves at most this many forecast days.
pub const MAX_FORECAST_DAYS: u32 = 16;

fn default_timeout_secs() -> u64 {
    10
}

fn default_forecast_days() -> u32 {
    crate::apps::sun_weather::DEFAULT_FORECAST_DAYS
}

fn default_weather_url() -> String {
    OPEN_METEO_URL.to_string()
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path served to the displays; becomes a symlink to the live version.
    pub catalog_dir: PathBuf,
    /// Root of tracks, topography and the quiz history.
    pub data_dir: PathBuf,
    /// TTF/OTF used for all text. Without it, text is laid out but not drawn.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Directory of weather icons (`<name>.svg`).
    #[serde(default)]
    pub icons_dir: Option<PathBuf>,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub apps: Vec<AppConfig>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppConfig {
    HikingQuiz(HikingQuizConfig),
    SunWeather(SunWeatherConfig),
    AirQuality(AirQualityConfig),
}

/// Paths default to `tracks/`, `topo/land/`, `topo/water/` and `quiz_history.csv` below
/// the data directory.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HikingQuizConfig {
    pub tracks_dir: Option<PathBuf>,
    pub land_dir: Option<PathBuf>,
    pub water_dir: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub policy: RotationPolicy,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SunWeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_forecast_days")]
    pub days: u32,
    #[serde(default = "default_weather_url")]
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AirQualityConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub sensor_id: String,
    /// File holding the API token; surrounding whitespace is ignored.
    pub token_file: PathBuf,
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> InkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            InkError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let mut config: Config = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            InkError::validation(format!("parse config '{}': {e}", path.display()))
        })?;
        let base = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        config.resolve_paths(&base);
        config.validate()?;
        Ok(config)
    }

    /// Make every relative path relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.catalog_dir);
        resolve(&mut self.data_dir);
        self.font.iter_mut().for_each(resolve);
        self.icons_dir.iter_mut().for_each(resolve);
        for app in &mut self.apps {
            match app {
                AppConfig::HikingQuiz(quiz) => {
                    quiz.tracks_dir.iter_mut().for_each(resolve);
                    quiz.land_dir.iter_mut().for_each(resolve);
                    quiz.water_dir.iter_mut().for_each(resolve);
                    quiz.history.iter_mut().for_each(resolve);
                }
                AppConfig::AirQuality(aq) => resolve(&mut aq.token_file),
                AppConfig::SunWeather(_) => {}
            }
        }
    }

    pub fn validate(&self) -> InkResult<()> {
        if self.apps.is_empty() {
            return Err(InkError::validation("config must list at least one app"));
        }
        if self.timeout_secs == 0 {
            return Err(InkError::validation("timeout_secs must be > 0"));
        }
        for (id, app) in self.apps.iter().enumerate() {
            match app {
                AppConfig::HikingQuiz(_) => {}
                AppConfig::SunWeather(sw) => {
                    if !sw.latitude.is_finite() || !(-90.0..=90.0).contains(&sw.latitude) {
                        return Err(InkError::validation(format!(
                            "app {id}: latitude must be within [-90, 90]"
                        )));
                    }
                    if !sw.longitude.is_finite() || !(-180.0..=180.0).contains(&sw.longitude) {
                        return Err(InkError::validation(format!(
                            "app {id}: longitude must be within [-180, 180]"
                        )));
                    }
                    if !(1..=MAX_FORECAST_DAYS).contains(&sw.days) {
                        return Err(InkError::validation(format!(
                            "app {id}: days must be within 1..={MAX_FORECAST_DAYS}"
                        )));
                    }
                }
                AppConfig::AirQuality(aq) => {
                    for (name, value) in [
                        ("url", &aq.url),
                        ("org", &aq.org),
                        ("bucket", &aq.bucket),
                        ("sensor_id", &aq.sensor_id),
                    ] {
                        if value.trim().is_empty() {
                            return Err(InkError::validation(format!(
                                "app {id}: {name} must not be empty"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Instantiate the configured apps, wired to the real HTTP clients. An unreadable token
    /// file only disables its own app, whose queries then fail at render time.
    pub fn build_apps(&self) -> InkResult<Vec<App>> {
        self.apps
            .iter()
            .map(|app| self.build_app(app))
            .collect()
    }

    pub fn build_app(&self, app: &AppConfig) -> InkResult<App> {
        Ok(match app {
            AppConfig::HikingQuiz(quiz) => {
                let or_data = |p: &Option<PathBuf>, default: &str| {
                    p.clone().unwrap_or_else(|| self.data_dir.join(default))
                };
                App::HikingQuiz(
                    HikingQuizApp::new(TrackStore::new(or_data(&quiz.tracks_dir, "tracks")))
                        .with_topo(
                            Some(or_data(&quiz.land_dir, "topo/land")),
                            Some(or_data(&quiz.water_dir, "topo/water")),
                        )
                        .with_history(or_data(&quiz.history, "quiz_history.csv"))
                        .with_policy(quiz.policy),
                )
            }
            AppConfig::SunWeather(sw) => {
                let client = OpenMeteoClient::new(sw.url.clone(), self.retry, self.timeout())?;
                App::SunWeather(SunWeatherApp::new(
                    GeoPoint::new(sw.latitude, sw.longitude),
                    sw.days,
                    Box::new(client),
                ))
            }
            AppConfig::AirQuality(aq) => {
                let token = std::fs::read_to_string(&aq.token_file);
                let source: Box<dyn AirQualitySource> = match token {
                    Ok(token) => Box::new(InfluxClient::new(
                        InfluxSettings {
                            url: aq.url.clone(),
                            org: aq.org.clone(),
                            bucket: aq.bucket.clone(),
                            sensor_id: aq.sensor_id.clone(),
                            token: token.trim().to_string(),
                        },
                        self.retry,
                        self.timeout(),
                    )?),
                    Err(err) => {
                        let reason =
                            format!("read token '{}': {err}", aq.token_file.display());
                        tracing::error!(error = %reason, "air quality source unavailable");
                        Box::new(UnavailableSource::new(reason))
                    }
                };
                App::AirQuality(AirQualityApp::new(source))
            }
        })
    }

    /// Font and icon set shared by all apps. A configured but unreadable font is an error.
    pub fn build_resources(&self) -> InkResult<RenderResources> {
        let fonts = match &self.font {
            Some(path) => Fonts::load(path)?,
            None => {
                tracing::warn!("no font configured, text will not be drawn");
                Fonts::disabled()
            }
        };
        let icons = match &self.icons_dir {
            Some(dir) => IconSet::new(dir.clone()),
            None => IconSet::disabled(),
        };
        Ok(RenderResources::new(fonts, icons))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
