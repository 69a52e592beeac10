//! Sun elevation over the day and a multi-day weather forecast on one screen.

use chrono::{Datelike, Duration, Weekday};

use crate::{
    apps::{
        Now, RenderResources,
        widget::{Slot, Widget, compose},
    },
    assets::geo::GeoPoint,
    foundation::{
        core::{Bitmap, Point, Raster, Rect},
        error::{InkError, InkResult},
    },
    render::canvas::{Canvas, Dither, HAlign, Ink, LineStyle, TextAnchor, VAlign, polyline},
    sources::{
        solar::{SolarModel, local_midnight, round_to_minutes},
        weather::{DayForecast, HourForecast, WeatherSource},
    },
};

pub const SUN_SLOT: Slot = Slot::new(10, 10, 780, 210);
pub const WEATHER_SLOT: Slot = Slot::new(10, 210, 780, 260);
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Icon for a WMO weather code; unknown codes map to the fallback icon.
pub fn weather_icon(code: Option<u8>) -> &'static str {
    match code {
        Some(0 | 1) => "wi-day-sunny",
        Some(2) => "wi-day-cloudy",
        Some(3) => "wi-cloudy",
        Some(45 | 48 | 49) => "wi-fog",
        Some(51 | 53 | 61 | 80) => "wi-day-showers",
        Some(55 | 63 | 81 | 82) => "wi-showers",
        Some(65) => "wi-rain",
        Some(56 | 66) => "wi-day-sleet",
        Some(57 | 67) => "wi-sleet",
        Some(71 | 77) => "wi-day-snow",
        Some(73 | 75) => "wi-snow",
        Some(85) => "wi-day-rain-mix",
        Some(86) => "wi-rain-mix",
        Some(95 | 96 | 99) => "wi-thunderstorm",
        _ => crate::assets::icons::FALLBACK_ICON,
    }
}

/// Two-line German description of a WMO weather code.
pub fn weather_text(code: Option<u8>) -> [&'static str; 2] {
    match code {
        Some(0) => ["sonnig", ""],
        Some(1) => ["überwiegend", "sonnig"],
        Some(2) => ["leicht", "bewölkt"],
        Some(3) => ["bedeckt", ""],
        Some(45) => ["Nebel", ""],
        Some(48 | 49) => ["Raureif", ""],
        Some(51) => ["leichter", "Sprühregen"],
        Some(53) => ["Sprühregen", ""],
        Some(55) => ["starker", "Sprühregen"],
        Some(56 | 57) => ["gefrierender", "Sprühregen"],
        Some(61) => ["leichter", "Regen"],
        Some(63) => ["Regen", ""],
        Some(65) => ["starker", "Regen"],
        Some(66 | 67) => ["gefrierender", "Regen"],
        Some(71) => ["leichter", "Schneefall"],
        Some(73) => ["Schneefall", ""],
        Some(75) => ["starker", "Schneefall"],
        Some(77) => ["Schneegriesel", ""],
        Some(80) => ["leichter", "Schauer"],
        Some(81) => ["Schauer", ""],
        Some(82) => ["starker", "Schauer"],
        Some(85) => ["leichter", "Schneeschauer"],
        Some(86) => ["Schneeschauer", ""],
        Some(95) => ["Gewitter", ""],
        Some(96) => ["Gewitter,", "Hagel"],
        Some(99) => ["Gewitter,", "starker Hagel"],
        _ => ["???", ""],
    }
}

pub fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Di",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Do",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "So",
    }
}

/// Daily precipitation label: one decimal below 1 l/m², none above.
pub fn format_precipitation(sum_mm: f64) -> Option<String> {
    if sum_mm <= 0.0 {
        None
    } else if sum_mm < 1.0 {
        Some(format!("{sum_mm:.1} l/m²"))
    } else {
        Some(format!("{sum_mm:.0} l/m²"))
    }
}

/// Sun elevation curve for the local day with sunrise, sunset and day length.
pub struct SunWidget {
    pub slot: Slot,
    pub model: SolarModel,
    pub axis_label_px: f32,
    pub time_label_px: f32,
}

impl SunWidget {
    pub fn new(location: GeoPoint) -> Self {
        Self {
            slot: SUN_SLOT,
            model: SolarModel::new(location),
            axis_label_px: 16.0,
            time_label_px: 22.0,
        }
    }
}

impl Widget for SunWidget {
    fn kind(&self) -> &'static str {
        "sun"
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Bitmap> {
        let fonts = &mut res.fonts;
        let tz = *now.offset();
        let at = round_to_minutes(*now, 15);
        let date = at.date_naive();
        let midnight = local_midnight(date, tz)
            .ok_or_else(|| InkError::render(format!("no local midnight on {date}")))?;

        let mut canvas = Canvas::new(self.slot.width, self.slot.height)?;
        let axis_px = f64::from(self.axis_label_px);
        let plot = Rect::new(
            3.0 * axis_px,
            axis_px / 2.0,
            canvas.width() - 8.0,
            canvas.height() * 0.9,
        );
        let to_px = |t: chrono::DateTime<chrono::FixedOffset>, elevation: f64| {
            let fx = (t - midnight).num_seconds() as f64 / 86_400.0;
            let fy = (elevation + 91.0) / 182.0;
            Point::new(plot.x0 + fx * plot.width(), plot.y1 - fy * plot.height())
        };

        let grid = LineStyle::dashed(1.0, 2.0, 3.0);
        for elevation in (-90..=90).step_by(30) {
            let y = to_px(midnight, f64::from(elevation)).y;
            canvas.line(Point::new(plot.x0, y), Point::new(plot.x1, y), grid, Ink::Black);
            canvas.draw_text(
                fonts,
                &format!("{elevation}°"),
                self.axis_label_px,
                Point::new(plot.x0 - 4.0, y),
                TextAnchor::new(HAlign::Right, VAlign::Middle),
                Ink::Black,
            )?;
        }
        let horizon = to_px(midnight, 0.0).y;
        canvas.line(
            Point::new(plot.x0, horizon),
            Point::new(plot.x1, horizon),
            LineStyle::solid(1.5),
            Ink::Black,
        );

        let trace: Vec<Point> = self
            .model
            .day_trace(date, tz, 5)
            .into_iter()
            .map(|(t, e)| to_px(t, e))
            .collect();
        canvas.stroke_path(&polyline(&trace), LineStyle::solid(2.0), Ink::Black);

        let label_y = to_px(midnight, -7.0).y;
        match self.model.sunrise_sunset(date, tz) {
            Some((rise, set)) => {
                for t in [rise, set] {
                    canvas.line(
                        to_px(t, 0.0),
                        to_px(t, -10.0),
                        LineStyle::solid(2.0),
                        Ink::Black,
                    );
                }
                canvas.draw_text(
                    fonts,
                    &format!("↗ {}", rise.format("%H:%M")),
                    self.time_label_px,
                    Point::new(to_px(rise, 0.0).x, label_y),
                    TextAnchor::new(HAlign::Left, VAlign::Top),
                    Ink::Black,
                )?;
                canvas.draw_text(
                    fonts,
                    &format!("↘ {}", set.format("%H:%M")),
                    self.time_label_px,
                    Point::new(to_px(set - Duration::minutes(10), 0.0).x, label_y),
                    TextAnchor::new(HAlign::Right, VAlign::Top),
                    Ink::Black,
                )?;
                let daylight = set - rise;
                canvas.draw_text(
                    fonts,
                    &format!(
                        "☀ {:02}:{:02}",
                        daylight.num_hours(),
                        daylight.num_minutes() % 60
                    ),
                    self.time_label_px,
                    Point::new(to_px(rise + daylight / 2, 0.0).x, label_y),
                    TextAnchor::new(HAlign::Center, VAlign::Top),
                    Ink::Black,
                )?;
            }
            None => {
                let noon = midnight + Duration::hours(12);
                let label = if self.model.elevation_deg(&noon) > 0.0 {
                    "Polartag"
                } else {
                    "Polarnacht"
                };
                canvas.draw_text(
                    fonts,
                    label,
                    self.time_label_px,
                    Point::new(plot.center().x, label_y),
                    TextAnchor::new(HAlign::Center, VAlign::Top),
                    Ink::Black,
                )?;
            }
        }

        let sun = to_px(at, self.model.elevation_deg(&at));
        canvas.fill_circle(sun, 9.0, Ink::Black);
        canvas.fill_circle(sun, 6.0, Ink::White);
        canvas.fill_circle(sun, 3.0, Ink::Black);

        Ok(canvas.finish(Dither::default()))
    }
}

/// One column per forecast day: weekday, icon, condition, temperatures, rain and wind.
pub struct WeatherWidget {
    pub slot: Slot,
    pub location: GeoPoint,
    pub days: u32,
    pub source: Box<dyn WeatherSource>,
    pub header_px: f32,
    pub text_px: f32,
}

/// Hourly rain bars are scaled so this many mm/h fill the diagram.
const RAIN_DIAGRAM_MAX_MM: f64 = 10.0;
const RAIN_DIAGRAM_HEIGHT: f64 = 25.0;
/// Wind speeds above this are shown with a wind icon.
pub const STRONG_WIND_KMH: f64 = 20.0;

impl WeatherWidget {
    pub fn new(location: GeoPoint, days: u32, source: Box<dyn WeatherSource>) -> Self {
        Self {
            slot: WEATHER_SLOT,
            location,
            days: days.max(1),
            source,
            header_px: 22.0,
            text_px: 16.0,
        }
    }

    fn draw_day(
        &self,
        canvas: &mut Canvas,
        res: &mut RenderResources,
        day: &DayForecast,
        x0: f64,
        width: f64,
    ) -> InkResult<()> {
        let cx = x0 + width / 2.0;
        let text_px = f64::from(self.text_px);
        let centered = TextAnchor::new(HAlign::Center, VAlign::Top);
        let mut pos = 0.0;

        canvas.draw_text(
            &mut res.fonts,
            weekday_short(day.date.weekday()),
            self.header_px,
            Point::new(cx, pos),
            centered,
            Ink::Black,
        )?;
        pos += f64::from(self.header_px);

        let code = day.daytime_weather_code();
        if code.is_some_and(|c| weather_icon(Some(c)) == crate::assets::icons::FALLBACK_ICON) {
            tracing::warn!(code, "unknown weather code, using default icon");
        }
        let icon_size = (width * 0.8) as u32;
        match res.icons.get(weather_icon(code), icon_size)? {
            Some(icon) => {
                canvas.draw_image(&icon, Point::new(cx - f64::from(icon.width) / 2.0, pos))?;
                pos += f64::from(icon.height);
            }
            None => pos += f64::from(icon_size),
        }

        for line in weather_text(code) {
            canvas.draw_text(
                &mut res.fonts,
                line,
                self.text_px,
                Point::new(cx, pos),
                centered,
                Ink::Black,
            )?;
            pos += text_px * 1.2;
        }
        pos += 10.0;

        canvas.draw_text(
            &mut res.fonts,
            &format!(
                "{:.0}°C / {:.0}°C",
                day.temperature_min, day.temperature_max
            ),
            self.text_px,
            Point::new(cx, pos),
            centered,
            Ink::Black,
        )?;
        pos += text_px * 1.2 + 5.0;

        if let Some(label) = format_precipitation(day.precipitation_sum) {
            canvas.draw_text(
                &mut res.fonts,
                &label,
                self.text_px,
                Point::new(cx, pos),
                centered,
                Ink::Black,
            )?;
        }
        pos += text_px * 1.2;

        if day.max_hourly_precipitation() > 0.0 {
            let w = width * 0.8;
            let frame = Rect::new(cx - w / 2.0, pos, cx + w / 2.0, pos + RAIN_DIAGRAM_HEIGHT);
            draw_rain_bars(canvas, frame, &day.hours);
        }
        pos += RAIN_DIAGRAM_HEIGHT + 5.0;

        if day.wind_speed_max > STRONG_WIND_KMH {
            let mid = pos + 0.7 * text_px;
            let mut text_x = x0 + 2.0;
            if let Some(icon) = res.icons.get("wi-strong-wind", 40)? {
                canvas.draw_image(
                    &icon,
                    Point::new(text_x, mid - f64::from(icon.height) / 2.0),
                )?;
                text_x += f64::from(icon.width);
            }
            canvas.draw_text(
                &mut res.fonts,
                &format!("{:.0} km/h", day.wind_speed_max),
                self.text_px,
                Point::new(text_x, mid),
                TextAnchor::new(HAlign::Left, VAlign::Middle),
                Ink::Black,
            )?;
        }
        Ok(())
    }
}

/// Hourly precipitation as bars above a baseline; any rain gets at least one pixel.
pub fn draw_rain_bars(canvas: &mut Canvas, frame: Rect, hours: &[HourForecast]) {
    canvas.line(
        Point::new(frame.x0, frame.y1 - 0.5),
        Point::new(frame.x1, frame.y1 - 0.5),
        LineStyle::solid(1.0),
        Ink::Black,
    );
    if hours.is_empty() {
        return;
    }
    let bin = frame.width() / hours.len() as f64;
    for (i, hour) in hours.iter().enumerate() {
        if hour.precipitation_mm <= 0.0 {
            continue;
        }
        let h = (hour.precipitation_mm / RAIN_DIAGRAM_MAX_MM * frame.height())
            .clamp(1.0, frame.height() - 1.0);
        let left = frame.x0 + bin * i as f64;
        let base = frame.y1 - 1.0;
        canvas.fill_rect(
            Rect::new(left, base - h, left + (bin - 1.0).max(1.0), base),
            Ink::Black,
        );
    }
}

impl Widget for WeatherWidget {
    fn kind(&self) -> &'static str {
        "weather"
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn render(&self, _now: &Now, res: &mut RenderResources) -> InkResult<Bitmap> {
        let forecast = self.source.forecast(self.location, self.days)?;
        if forecast.is_empty() {
            return Err(InkError::no_content("forecast has no days"));
        }
        let mut canvas = Canvas::new(self.slot.width, self.slot.height)?;
        let day_width = canvas.width() / f64::from(self.days);
        for (i, day) in forecast.iter().take(self.days as usize).enumerate() {
            let x0 = day_width * i as f64;
            self.draw_day(&mut canvas, res, day, x0, day_width)?;
            canvas.line(
                Point::new(x0 + 0.5, 0.0),
                Point::new(x0 + 0.5, canvas.height()),
                LineStyle::solid(1.0),
                Ink::Black,
            );
        }
        let right = canvas.width() - 0.5;
        canvas.line(
            Point::new(right, 0.0),
            Point::new(right, canvas.height()),
            LineStyle::solid(1.0),
            Ink::Black,
        );
        Ok(canvas.finish(Dither::default()))
    }
}

/// Sun widget above a weather forecast.
pub struct SunWeatherApp {
    pub sun: SunWidget,
    pub weather: WeatherWidget,
}

impl SunWeatherApp {
    pub fn new(location: GeoPoint, days: u32, source: Box<dyn WeatherSource>) -> Self {
        Self {
            sun: SunWidget::new(location),
            weather: WeatherWidget::new(location, days, source),
        }
    }

    pub fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Raster> {
        compose(&[&self.sun, &self.weather], now, res)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/apps/sun_weather.rs"]
mod tests;
