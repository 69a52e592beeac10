//! Indoor climate dashboard: latest readings and one 24 h trend per metric.

use chrono::{Duration, Utc};

use crate::{
    apps::{
        Now, RenderResources,
        widget::{Slot, Widget, compose},
    },
    foundation::{
        core::{Bitmap, Point, Raster},
        error::InkResult,
    },
    render::{
        canvas::{Canvas, Dither, HAlign, Ink, TextAnchor, VAlign},
        chart::{ChartStyle, TrendChart, trailing_window},
    },
    sources::air_quality::{AirQualitySource, Metric, Sample},
};

pub const CURRENT_SLOT: Slot = Slot::new(70, 30, 250, 180);
/// Trend chart slots, in the order of [`METRICS`].
pub const TREND_SLOTS: [Slot; 3] = [
    Slot::new(405, 10, 395, 230),
    Slot::new(10, 240, 395, 230),
    Slot::new(405, 240, 395, 230),
];
pub const METRICS: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::Co2];

pub const TREND_HOURS: i64 = 24;
/// A latest sample older than this is shown as offline.
pub const OFFLINE_AFTER_MINUTES: i64 = 5;
pub const OFFLINE_LABEL: &str = "offline";

const LABEL_PX: f32 = 16.0;
const VALUE_PX: f32 = 32.0;

/// Value and unit shown for a metric; `None` unit means the sensor is offline.
pub fn current_reading(
    metric: Metric,
    latest: Option<&Sample>,
    now: &Now,
) -> (String, Option<&'static str>) {
    let cutoff = now.with_timezone(&Utc) - Duration::minutes(OFFLINE_AFTER_MINUTES);
    match latest {
        Some(Sample {
            time,
            value: Some(v),
        }) if *time >= cutoff && v.is_finite() => {
            (format!("{} ", metric.format(*v)), Some(metric.unit()))
        }
        _ => (OFFLINE_LABEL.to_string(), None),
    }
}

/// Labels on the left, values right-aligned so that their units line up.
pub struct CurrentValues<'a> {
    pub slot: Slot,
    pub metrics: &'a [Metric],
    pub source: &'a dyn AirQualitySource,
}

impl Widget for CurrentValues<'_> {
    fn kind(&self) -> &'static str {
        "current_values"
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Bitmap> {
        let mut readings = Vec::with_capacity(self.metrics.len());
        for metric in self.metrics {
            let latest = self.source.latest(*metric)?;
            readings.push((*metric, current_reading(*metric, latest.as_ref(), now)));
        }

        let mut canvas = Canvas::new(self.slot.width, self.slot.height)?;
        let fonts = &mut res.fonts;
        let mut unit_width = 0.0f64;
        for (_, (_, unit)) in &readings {
            if let Some(unit) = unit {
                unit_width = unit_width.max(f64::from(fonts.measure(unit, VALUE_PX)?));
            }
        }

        let row = canvas.height() / (2.0 * readings.len().max(1) as f64);
        let right = canvas.width();
        for (i, (metric, (value, unit))) in readings.iter().enumerate() {
            let center = row * (2 * i + 1) as f64;
            canvas.draw_text(
                fonts,
                metric.label(),
                LABEL_PX,
                Point::new(0.0, center),
                TextAnchor::new(HAlign::Left, VAlign::Middle),
                Ink::Black,
            )?;
            let value_right = match unit {
                Some(unit) => {
                    canvas.draw_text(
                        fonts,
                        unit,
                        VALUE_PX,
                        Point::new(right - unit_width, center),
                        TextAnchor::new(HAlign::Left, VAlign::Middle),
                        Ink::Black,
                    )?;
                    right - unit_width
                }
                None => right,
            };
            canvas.draw_text(
                fonts,
                value,
                VALUE_PX,
                Point::new(value_right, center),
                TextAnchor::new(HAlign::Right, VAlign::Middle),
                Ink::Black,
            )?;
        }
        Ok(canvas.finish(Dither::default()))
    }
}

/// The last [`TREND_HOURS`] of one metric.
pub struct Trend<'a> {
    pub slot: Slot,
    pub metric: Metric,
    pub source: &'a dyn AirQualitySource,
}

impl Widget for Trend<'_> {
    fn kind(&self) -> &'static str {
        "trend"
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Bitmap> {
        let window = trailing_window(now, TREND_HOURS);
        let samples = self.source.history(self.metric, window)?;
        let gaps = samples.iter().filter(|s| s.value.is_none()).count();
        if gaps > 0 {
            tracing::debug!(metric = self.metric.field(), gaps, "trend has gaps");
        }
        let style = ChartStyle {
            min_range: self.metric.min_range(),
            unit: self.metric.unit().to_string(),
            ..ChartStyle::default()
        };
        TrendChart::new(style, *now.offset()).render(
            &mut res.fonts,
            self.slot.width,
            self.slot.height,
            &samples,
            window,
        )
    }
}

pub struct AirQualityApp {
    source: Box<dyn AirQualitySource>,
}

impl AirQualityApp {
    pub fn new(source: Box<dyn AirQualitySource>) -> Self {
        Self { source }
    }

    pub fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Raster> {
        let source = self.source.as_ref();
        let current = CurrentValues {
            slot: CURRENT_SLOT,
            metrics: &METRICS,
            source,
        };
        let trends: Vec<Trend<'_>> = METRICS
            .iter()
            .zip(TREND_SLOTS)
            .map(|(metric, slot)| Trend {
                slot,
                metric: *metric,
                source,
            })
            .collect();
        let mut widgets: Vec<&dyn Widget> = vec![&current];
        widgets.extend(trends.iter().map(|t| t as &dyn Widget));
        compose(&widgets, now, res)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/apps/air_quality.rs"]
mod tests;
