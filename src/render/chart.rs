//! Time-series trend charts for the dashboard widgets.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};

use crate::{
    assets::fonts::Fonts,
    foundation::{
        core::{Bitmap, Point, Rect},
        error::InkResult,
        math::{nice_step, round_to},
    },
    render::canvas::{Canvas, Dither, HAlign, Ink, LineStyle, TextAnchor, VAlign, polyline},
    sources::air_quality::Sample,
};

/// Shown in place of the curve when a series has no usable sample.
pub const NO_DATA_LABEL: &str = "keine Daten";

/// Axis and label settings of one chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartStyle {
    /// The y axis always covers at least this range.
    pub min_range: (f64, f64),
    pub unit: String,
    pub tick_every_hours: i64,
    pub label_size_px: f32,
    pub line_width: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            min_range: (0.0, 0.0),
            unit: String::new(),
            tick_every_hours: 6,
            label_size_px: 12.0,
            line_width: 2.0,
        }
    }
}

/// Samples kept for drawing: missing and non-finite values are dropped, so the curve joins the
/// neighbours of a gap with a straight line. Sorted by time.
pub fn valid_points(samples: &[Sample]) -> Vec<(DateTime<Utc>, f64)> {
    let mut out: Vec<(DateTime<Utc>, f64)> = samples
        .iter()
        .filter_map(|s| s.value.filter(|v| v.is_finite()).map(|v| (s.time, v)))
        .collect();
    out.sort_by_key(|(t, _)| *t);
    out
}

/// Y range covering `values` plus a 10 % margin, never narrower than `min_range`.
pub fn y_range(values: &[f64], min_range: (f64, f64)) -> (f64, f64) {
    let (mut lo, mut hi) = min_range;
    if let (Some(vmin), Some(vmax)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) {
        lo = lo.min(vmin - 0.1 * (hi - lo));
        hi = hi.max(vmax + 0.1 * (hi - lo));
    }
    if hi - lo <= 0.0 {
        hi = lo + 1.0;
    }
    (lo, hi)
}

/// Tick times on multiples of `every_hours` after local midnight, strictly inside `(start, end)`.
pub fn x_ticks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    every_hours: i64,
    tz: FixedOffset,
) -> Vec<DateTime<FixedOffset>> {
    let mut out = Vec::new();
    if every_hours <= 0 || end <= start {
        return out;
    }
    let local_start = start.with_timezone(&tz);
    let Some(midnight) = local_start
        .with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
    else {
        return out;
    };
    let step = Duration::hours(every_hours);
    let mut t = midnight;
    while t < end {
        if t > start {
            out.push(t);
        }
        t += step;
    }
    out
}

/// Evenly spaced "nice" values inside `[lo, hi]`.
pub fn y_ticks(lo: f64, hi: f64, target_count: usize) -> Vec<f64> {
    let step = nice_step((hi - lo) / target_count.max(1) as f64);
    let mut v = (lo / step).ceil() * step;
    let mut out = Vec::new();
    while v <= hi + step * 1e-9 {
        out.push(round_to(v, 9));
        v += step;
    }
    out
}

/// A 24 h style trend: light grid, labelled axes and the series as a thick polyline.
#[derive(Clone, Debug)]
pub struct TrendChart {
    pub style: ChartStyle,
    pub tz: FixedOffset,
}

impl TrendChart {
    pub fn new(style: ChartStyle, tz: FixedOffset) -> Self {
        Self { style, tz }
    }

    /// Draw `samples` on a `width` x `height` bitmap. `window` is the x range used when fewer
    /// than two valid samples exist.
    pub fn render(
        &self,
        fonts: &mut Fonts,
        width: u32,
        height: u32,
        samples: &[Sample],
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> InkResult<Bitmap> {
        let mut canvas = Canvas::new(width, height)?;
        let fs = f64::from(self.style.label_size_px);
        let plot = Rect::new(
            3.8 * fs,
            1.4 * fs,
            f64::from(width) - 1.6 * fs,
            f64::from(height) - 1.6 * fs,
        );

        let points = valid_points(samples);
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let (lo, hi) = y_range(&values, self.style.min_range);
        let (t0, t1) = match (points.first(), points.last()) {
            (Some((a, _)), Some((b, _))) if b > a => (*a, *b),
            _ => window,
        };
        let span_s = (t1 - t0).num_milliseconds().max(1) as f64 / 1000.0;
        let to_px = |t: DateTime<Utc>, v: f64| {
            let fx = (t - t0).num_milliseconds() as f64 / 1000.0 / span_s;
            let fy = (v - lo) / (hi - lo);
            Point::new(
                plot.x0 + fx * plot.width(),
                plot.y1 - fy * plot.height(),
            )
        };

        let grid = LineStyle::dashed(1.0, 2.0, 3.0);
        for v in y_ticks(lo, hi, 4) {
            let y = plot.y1 - (v - lo) / (hi - lo) * plot.height();
            canvas.line(Point::new(plot.x0, y), Point::new(plot.x1, y), grid, Ink::Black);
            self.draw_y_label(&mut canvas, fonts, v, Point::new(plot.x0 - 4.0, y))?;
        }
        for tick in x_ticks(t0, t1, self.style.tick_every_hours, self.tz) {
            let x = to_px(tick.with_timezone(&Utc), lo).x;
            canvas.line(Point::new(x, plot.y0), Point::new(x, plot.y1), grid, Ink::Black);
            canvas.draw_text(
                fonts,
                &tick.format("%H:%M").to_string(),
                self.style.label_size_px,
                Point::new(x, plot.y1 + 3.0),
                TextAnchor::new(HAlign::Center, VAlign::Top),
                Ink::Black,
            )?;
        }
        let axis = LineStyle::solid(1.0);
        canvas.line(
            Point::new(plot.x0, plot.y0),
            Point::new(plot.x0, plot.y1),
            axis,
            Ink::Black,
        );
        canvas.line(
            Point::new(plot.x0, plot.y1),
            Point::new(plot.x1, plot.y1),
            axis,
            Ink::Black,
        );

        match points.as_slice() {
            [] => {
                canvas.draw_text(
                    fonts,
                    NO_DATA_LABEL,
                    self.style.label_size_px * 1.5,
                    plot.center(),
                    TextAnchor::CENTER,
                    Ink::Black,
                )?;
            }
            [(t, v)] => canvas.fill_circle(to_px(*t, *v), self.style.line_width * 1.5, Ink::Black),
            _ => {
                let pts: Vec<Point> = points.iter().map(|(t, v)| to_px(*t, *v)).collect();
                canvas.stroke_path(
                    &polyline(&pts),
                    LineStyle::solid(self.style.line_width),
                    Ink::Black,
                );
            }
        }

        Ok(canvas.finish(Dither::default()))
    }

    fn draw_y_label(
        &self,
        canvas: &mut Canvas,
        fonts: &mut Fonts,
        value: f64,
        right_middle: Point,
    ) -> InkResult<()> {
        let size = self.style.label_size_px;
        let number = format!("{:.0}", round_to(value, 0));
        let anchor = TextAnchor::new(HAlign::Right, VAlign::Middle);
        if value.abs() > 100.0 && !self.style.unit.is_empty() {
            // large numbers leave no room for the unit on the same line
            let half = f64::from(size) * 0.6;
            canvas.draw_text(
                fonts,
                &number,
                size,
                Point::new(right_middle.x, right_middle.y - half),
                anchor,
                Ink::Black,
            )?;
            canvas.draw_text(
                fonts,
                &self.style.unit,
                size,
                Point::new(right_middle.x, right_middle.y + half),
                anchor,
                Ink::Black,
            )?;
        } else {
            let label = if self.style.unit.is_empty() {
                number
            } else {
                format!("{number} {}", self.style.unit)
            };
            canvas.draw_text(fonts, &label, size, right_middle, anchor, Ink::Black)?;
        }
        Ok(())
    }
}

/// `now - hours .. now`, the default trend window.
pub fn trailing_window<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hours: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = now.with_timezone(&Utc);
    (end - Duration::hours(hours), end)
}

#[cfg(test)]
#[path = "../../tests/unit/render/chart.rs"]
mod tests;
