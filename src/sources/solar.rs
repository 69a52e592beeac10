//! Low-precision solar position, good to a few hundredths of a degree for current dates.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};

use crate::assets::geo::GeoPoint;

/// Elevation of the sun's center at the visible sunrise/sunset (refraction and disc radius).
pub const HORIZON_DEG: f64 = -0.833;

const SCAN_STEP_MINUTES: i64 = 10;

/// Sun elevation and sunrise/sunset at a fixed location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolarModel {
    pub location: GeoPoint,
}

impl SolarModel {
    pub fn new(location: GeoPoint) -> Self {
        Self { location }
    }

    /// Geometric elevation of the sun above the horizon, in degrees.
    pub fn elevation_deg<Tz: TimeZone>(&self, t: &DateTime<Tz>) -> f64 {
        let unix = t.timestamp() as f64 + f64::from(t.timestamp_subsec_millis()) / 1000.0;
        let n = unix / 86_400.0 + 2_440_587.5 - 2_451_545.0;

        let mean_lon = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
        let anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
        let ecl_lon =
            (mean_lon + 1.915 * anomaly.sin() + 0.020 * (2.0 * anomaly).sin()).to_radians();
        let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

        let ra = (obliquity.cos() * ecl_lon.sin()).atan2(ecl_lon.cos());
        let dec = (obliquity.sin() * ecl_lon.sin()).asin();

        let gmst_h = (18.697_374_558 + 24.065_709_824_419_08 * n).rem_euclid(24.0);
        let hour_angle = (gmst_h * 15.0 + self.location.lon).to_radians() - ra;

        let lat = self.location.lat.to_radians();
        (lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
    }

    /// Elevation sampled every `step_minutes` over the local day `date`.
    pub fn day_trace(
        &self,
        date: NaiveDate,
        tz: FixedOffset,
        step_minutes: i64,
    ) -> Vec<(DateTime<FixedOffset>, f64)> {
        let Some(start) = local_midnight(date, tz) else {
            return Vec::new();
        };
        let step = step_minutes.max(1);
        (0..=(24 * 60 / step))
            .map(|i| {
                let t = start + Duration::minutes(i * step);
                (t, self.elevation_deg(&t))
            })
            .collect()
    }

    /// First upward and last downward crossing of [`HORIZON_DEG`] during the local day.
    /// `None` during polar day or night.
    pub fn sunrise_sunset(
        &self,
        date: NaiveDate,
        tz: FixedOffset,
    ) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let start = local_midnight(date, tz)?;
        let above = |t: &DateTime<FixedOffset>| self.elevation_deg(t) > HORIZON_DEG;

        let mut sunrise = None;
        let mut sunset = None;
        let mut prev = start;
        for i in 1..=(24 * 60 / SCAN_STEP_MINUTES) {
            let t = start + Duration::minutes(i * SCAN_STEP_MINUTES);
            match (above(&prev), above(&t)) {
                (false, true) if sunrise.is_none() => sunrise = Some(self.bisect(prev, t)),
                (true, false) => sunset = Some(self.bisect(prev, t)),
                _ => {}
            }
            prev = t;
        }
        Some((sunrise?, sunset?))
    }

    fn bisect(
        &self,
        mut a: DateTime<FixedOffset>,
        mut b: DateTime<FixedOffset>,
    ) -> DateTime<FixedOffset> {
        let a_above = self.elevation_deg(&a) > HORIZON_DEG;
        while b - a > Duration::seconds(1) {
            let mid = a + (b - a) / 2;
            if (self.elevation_deg(&mid) > HORIZON_DEG) == a_above {
                a = mid;
            } else {
                b = mid;
            }
        }
        b
    }
}

pub(crate) fn local_midnight(date: NaiveDate, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

/// Round `t` to the nearest multiple of `minutes` after local midnight.
pub fn round_to_minutes(t: DateTime<FixedOffset>, minutes: i64) -> DateTime<FixedOffset> {
    let step = Duration::minutes(minutes.max(1));
    let shifted = t + step / 2;
    let Some(midnight) = local_midnight(shifted.date_naive(), *t.offset()) else {
        return t;
    };
    let since = shifted - midnight;
    let steps = since.num_seconds() / step.num_seconds();
    midnight + step * steps as i32
}

#[cfg(test)]
#[path = "../../tests/unit/sources/solar.rs"]
mod tests;
