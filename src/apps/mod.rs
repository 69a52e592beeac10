//! The configured apps and the screens they render.

use chrono::{DateTime, FixedOffset};

use crate::{
    assets::{fonts::Fonts, icons::IconSet},
    foundation::{
        core::Raster,
        error::{InkError, InkResult},
    },
};

/// Indoor climate dashboard: current values and 24 h trends.
pub mod air_quality;
/// Weekly map quiz with daily hints.
pub mod hiking_quiz;
/// Sun elevation over the day and a multi-day forecast.
pub mod sun_weather;
/// Widget slots and failure-tolerant screen composition.
pub mod widget;

pub use air_quality::AirQualityApp;
pub use hiking_quiz::HikingQuizApp;
pub use sun_weather::SunWeatherApp;

/// Wall-clock time of a publish cycle, in the display's local offset.
pub type Now = DateTime<FixedOffset>;

/// Font and icons shared by every renderer of one cycle.
#[derive(Debug)]
pub struct RenderResources {
    pub fonts: Fonts,
    pub icons: IconSet,
}

impl RenderResources {
    pub fn new(fonts: Fonts, icons: IconSet) -> Self {
        Self { fonts, icons }
    }

    /// No font and no icons: text and icons are laid out but not drawn.
    pub fn disabled() -> Self {
        Self::new(Fonts::disabled(), IconSet::disabled())
    }
}

/// A statically configured content source.
pub enum App {
    HikingQuiz(HikingQuizApp),
    SunWeather(SunWeatherApp),
    AirQuality(AirQualityApp),
}

impl App {
    /// Stable machine name written to the manifest.
    pub fn name(&self) -> &'static str {
        match self {
            App::HikingQuiz(_) => "hiking_quiz",
            App::SunWeather(_) => "sun_weather",
            App::AirQuality(_) => "air_quality",
        }
    }

    /// Display title written to the manifest.
    pub fn title(&self) -> &'static str {
        match self {
            App::HikingQuiz(_) => "Wander-Quiz",
            App::SunWeather(_) => "Sonne & Wetter",
            App::AirQuality(_) => "Raumklima",
        }
    }

    pub fn nb_screens(&self) -> usize {
        match self {
            App::HikingQuiz(_) => hiking_quiz::QUIZ_SCREENS,
            App::SunWeather(_) | App::AirQuality(_) => 1,
        }
    }

    /// Fingerprint of the content `now` would produce, if the app can tell without rendering.
    /// Equal keys mean the previously published rasters are still current.
    pub fn render_key(&self, now: &Now) -> InkResult<Option<String>> {
        match self {
            App::HikingQuiz(app) => Ok(Some(app.plan(now)?.render_key()?)),
            App::SunWeather(_) | App::AirQuality(_) => Ok(None),
        }
    }

    /// Remember what a published catalog showed for `now`, so later selections can avoid it.
    pub fn record_published(&self, now: &Now) -> InkResult<()> {
        match self {
            App::HikingQuiz(app) => {
                app.record(&app.plan(now)?)?;
                Ok(())
            }
            App::SunWeather(_) | App::AirQuality(_) => Ok(()),
        }
    }

    /// Render a single screen.
    pub fn render(&self, screen: usize, now: &Now, res: &mut RenderResources) -> InkResult<Raster> {
        if screen >= self.nb_screens() {
            return Err(InkError::validation(format!(
                "app '{}' has {} screen(s), got index {screen}",
                self.name(),
                self.nb_screens()
            )));
        }
        match self {
            App::HikingQuiz(app) => app.render_screen(screen, now, res),
            App::SunWeather(app) => app.render(now, res),
            App::AirQuality(app) => app.render(now, res),
        }
    }

    /// Render every screen of a publish cycle. The outer error fails the whole app; inner
    /// errors fail single screens.
    #[tracing::instrument(skip(self, res), fields(app = self.name()))]
    pub fn render_all(
        &self,
        now: &Now,
        res: &mut RenderResources,
    ) -> InkResult<Vec<InkResult<Raster>>> {
        match self {
            App::HikingQuiz(app) => app.render_all(now, res),
            App::SunWeather(app) => Ok(vec![app.render(now, res)]),
            App::AirQuality(app) => Ok(vec![app.render(now, res)]),
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name())
            .field("nb_screens", &self.nb_screens())
            .finish()
    }
}
