//! Which track is shown this week and how much of it is revealed right now.
//!
//! Everything here is a pure function of the local wall-clock time, the track listing and the
//! (optional) history ledger, so each publish cycle can re-derive the quiz state from scratch.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};
use rand::{SeedableRng, seq::SliceRandom};

use crate::{
    assets::geo::{GeoBounds, GeoPoint, Track, TrackEntry},
    foundation::error::{InkError, InkResult},
    quiz::history::QuizHistory,
};

pub const DAYS_IN_WEEK: u8 = 7;

/// Fraction of the track's larger span added around it on every side of the map extent.
pub const EXTENT_MARGIN: f64 = 0.1;
/// Minimum padding in degrees so very short tracks still show some surroundings.
pub const EXTENT_MIN_PAD_DEG: f64 = 0.002;

/// Weeks elapsed since Monday 2000-01-03, in local time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct QuizWeek(pub i64);

impl QuizWeek {
    pub fn of<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default();
        let days = (now.naive_local().date() - epoch).num_days();
        Self(days.div_euclid(i64::from(DAYS_IN_WEEK)))
    }
}

/// Daily reveal step: Monday = 0 ... Sunday = 6.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct HintLevel(pub u8);

impl HintLevel {
    pub const MAX: HintLevel = HintLevel(DAYS_IN_WEEK - 1);
}

pub fn hint_level<Tz: TimeZone>(now: &DateTime<Tz>) -> HintLevel {
    HintLevel(now.naive_local().weekday().num_days_from_monday() as u8)
}

/// Hours since Monday 00:00 local time, in `[0, 168)`.
pub fn hours_into_week<Tz: TimeZone>(now: &DateTime<Tz>) -> f64 {
    let local = now.naive_local();
    let day = f64::from(local.weekday().num_days_from_monday());
    day * 24.0 + f64::from(local.time().num_seconds_from_midnight()) / 3600.0
}

/// Hint shown as text once the stage includes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    Country,
    Year,
    State,
    Month,
    City,
    Landmarks,
}

/// Everything that is revealed at a given moment of the quiz week.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stage {
    pub level: HintLevel,
    /// Share of the path length drawn, in `[0, 1]`.
    pub path_fraction: f64,
    pub add_scale: bool,
    pub draw_topo: bool,
    pub draw_level_labels: bool,
    pub info: Vec<InfoField>,
}

/// Monday: path drawn progressively between these hours, in steps of [`PATH_STEP_MINUTES`].
const PATH_START_HOUR: f64 = 6.0;
const PATH_END_HOUR: f64 = 20.0;
const PATH_STEP_MINUTES: f64 = 10.0;

impl Stage {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::at_hours(hours_into_week(now))
    }

    /// Stage for `hours` since Monday 00:00 (clamped to the week).
    pub fn at_hours(hours: f64) -> Self {
        let h = if hours.is_finite() {
            hours.clamp(0.0, 7.0 * 24.0 - 1e-9)
        } else {
            0.0
        };
        let level = HintLevel(((h / 24.0).floor() as u8).min(HintLevel::MAX.0));

        let steps_per_hour = 60.0 / PATH_STEP_MINUTES;
        let total_steps = ((PATH_END_HOUR - PATH_START_HOUR) * steps_per_hour).round();
        let path_fraction = if h < PATH_START_HOUR {
            0.0
        } else {
            let step = ((h - PATH_START_HOUR) * steps_per_hour + 1e-9)
                .floor()
                .min(total_steps);
            ((step / total_steps) * 1000.0).round() / 1000.0
        };

        let info_schedule: [(f64, InfoField); 6] = [
            (3.0 * 24.0, InfoField::Country),
            (3.0 * 24.0 + 12.0, InfoField::Year),
            (4.0 * 24.0, InfoField::State),
            (4.0 * 24.0 + 12.0, InfoField::Month),
            (5.0 * 24.0, InfoField::City),
            (6.0 * 24.0, InfoField::Landmarks),
        ];

        Self {
            level,
            path_fraction,
            add_scale: h >= 24.0,
            draw_topo: h >= 2.0 * 24.0,
            draw_level_labels: h >= 2.0 * 24.0 + 12.0,
            info: info_schedule
                .iter()
                .filter(|(from, _)| h >= *from)
                .map(|(_, field)| *field)
                .collect(),
        }
    }

    pub fn shows(&self, field: InfoField) -> bool {
        self.info.contains(&field)
    }
}

impl From<HintLevel> for Stage {
    /// The stage at the start of that day.
    fn from(level: HintLevel) -> Self {
        Stage::at_hours(f64::from(level.0.min(HintLevel::MAX.0)) * 24.0)
    }
}

/// How a week number is mapped onto the track listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Tracks sorted by id, `week mod n`.
    RoundRobin,
    /// Tracks shuffled once with a fixed seed; tracks used in the last `n/2` recorded weeks are
    /// skipped, and a week already in the history keeps its track.
    Shuffled { seed: u64 },
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::Shuffled { seed: 1 }
    }
}

/// Pick the track of `week`.
///
/// Deterministic for a given week, listing and history; `history` only ever biases away from
/// recent repeats.
#[tracing::instrument(skip(available, history), fields(n = available.len()))]
pub fn select_week_track<'a>(
    week: QuizWeek,
    available: &'a [TrackEntry],
    history: &QuizHistory,
    policy: RotationPolicy,
) -> InkResult<&'a TrackEntry> {
    if available.is_empty() {
        return Err(InkError::no_content("no quiz tracks available"));
    }
    let mut sorted: Vec<&TrackEntry> = available.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    let n = sorted.len() as i64;

    match policy {
        RotationPolicy::RoundRobin => Ok(sorted[week.0.rem_euclid(n) as usize]),
        RotationPolicy::Shuffled { seed } => {
            if let Some(recorded) = history.track_for_week(week) {
                if let Some(entry) = sorted.iter().find(|e| e.id == recorded) {
                    return Ok(entry);
                }
                tracing::warn!(track = recorded, "recorded track is no longer available");
            }

            let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
            sorted.shuffle(&mut rng);

            let recent = history.recent_before(week, sorted.len() / 2);
            let eligible: Vec<&TrackEntry> = sorted
                .iter()
                .copied()
                .filter(|e| !recent.contains(&e.id.as_str()))
                .collect();
            let pool = if eligible.is_empty() { &sorted } else { &eligible };
            Ok(pool[week.0.rem_euclid(pool.len() as i64) as usize])
        }
    }
}

/// The part of a track (and of the map around it) visible at a stage.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealedSubset {
    /// Prefix of the path; the last point may be interpolated inside a segment.
    pub points: Vec<GeoPoint>,
    pub fraction: f64,
    /// Map extent to draw: the whole track with [`EXTENT_MARGIN`] around it.
    pub extent: GeoBounds,
    pub track_bounds: GeoBounds,
}

impl RevealedSubset {
    /// Path length covered by `points`, in meters.
    pub fn length_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_m(w[1]))
            .sum()
    }
}

/// Reveal `stage.path_fraction` of the track by distance. At fraction 0 only the start point
/// is revealed; at 1 every point is.
pub fn reveal(track: &Track, stage: &Stage) -> InkResult<RevealedSubset> {
    let track_bounds = track
        .bounds()
        .ok_or_else(|| InkError::no_content(format!("track '{}' has no points", track.id)))?;
    let extent = track_bounds.padded(EXTENT_MARGIN, EXTENT_MIN_PAD_DEG);
    let fraction = stage.path_fraction.clamp(0.0, 1.0);

    let points = if fraction >= 1.0 {
        track.points.clone()
    } else {
        let target = track.length_m() * fraction;
        let mut out = vec![track.points[0]];
        let mut acc = 0.0;
        for w in track.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let d = a.distance_m(b);
            if d == 0.0 {
                continue;
            }
            if acc + d <= target {
                out.push(b);
                acc += d;
            } else {
                if target > acc {
                    out.push(a.lerp(b, (target - acc) / d));
                }
                break;
            }
        }
        out
    };

    Ok(RevealedSubset {
        points,
        fraction,
        extent,
        track_bounds,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/quiz/progression.rs"]
mod tests;
