//! The weekly hiking quiz: one track per week, drawn a little more completely every day.

use std::path::PathBuf;

use crate::{
    apps::{Now, RenderResources},
    assets::{
        fonts::Fonts,
        geo::{FeatureShape, GeoPoint, TopoLayer, Track, TrackMetadata, TrackStore},
    },
    foundation::{
        core::{BezPath, DISPLAY_HEIGHT, DISPLAY_WIDTH, Point, Raster, Rect},
        error::{InkError, InkResult},
    },
    quiz::{
        history::QuizHistory,
        progression::{
            InfoField, QuizWeek, RevealedSubset, RotationPolicy, Stage, reveal, select_week_track,
        },
    },
    render::{
        canvas::{Canvas, Dither, HAlign, Ink, LineStyle, TextAnchor, VAlign, polygon, polyline},
        textwrap::split_evenly,
        viewport::{Placement, Viewport},
    },
};

pub const QUIZ_SCREENS: usize = 3;

pub const DESCRIPTION_FONT_PX: f32 = 24.0;
const LABEL_FONT_PX: f32 = 12.0;
const SCALE_FONT_PX: f32 = 14.0;

const LINE_SKIP: f64 = 29.0;
const PAR_SKIP: f64 = 36.0;
const BOX_MARGIN: f64 = 15.0;
const OUTER_MARGIN: f64 = 10.0;
/// Room kept free for the scale bar below a bottom-left description.
const SCALE_HEIGHT: f64 = 35.0;

/// Contours at multiples of this elevation are drawn bold and may be labelled.
pub const MAJOR_CONTOUR_M: f64 = 100.0;
const SCALE_TARGET_PX: f64 = 150.0;

const MONTH_NAMES: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Where the hint text sits on each of the quiz screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptionCorner {
    BottomRight,
    TopRight,
    BottomLeft,
}

impl DescriptionCorner {
    /// Screen `i` uses `ALL[i]`.
    pub const ALL: [DescriptionCorner; QUIZ_SCREENS] = [
        DescriptionCorner::BottomRight,
        DescriptionCorner::TopRight,
        DescriptionCorner::BottomLeft,
    ];
}

/// The quiz state for one moment: selected track and reveal stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizPlan {
    pub week: QuizWeek,
    pub track_id: String,
    pub stage: Stage,
}

impl QuizPlan {
    /// Same track and stage give the same key, so unchanged screens can be reused.
    pub fn render_key(&self) -> InkResult<String> {
        #[derive(serde::Serialize)]
        struct Key<'a> {
            track_name: &'a str,
            stage: &'a Stage,
        }
        serde_json::to_string(&Key {
            track_name: &self.track_id,
            stage: &self.stage,
        })
        .map_err(|e| InkError::render(format!("serialize render key: {e}")))
    }
}

pub struct HikingQuizApp {
    store: TrackStore,
    land_dir: Option<PathBuf>,
    water_dir: Option<PathBuf>,
    history_path: Option<PathBuf>,
    policy: RotationPolicy,
}

struct Prepared {
    plan: QuizPlan,
    track: Track,
    subset: RevealedSubset,
    land: TopoLayer,
    water: TopoLayer,
}

impl HikingQuizApp {
    pub fn new(store: TrackStore) -> Self {
        Self {
            store,
            land_dir: None,
            water_dir: None,
            history_path: None,
            policy: RotationPolicy::default(),
        }
    }

    /// Contour (land) and water layers drawn once the stage enables topography.
    pub fn with_topo(mut self, land_dir: Option<PathBuf>, water_dir: Option<PathBuf>) -> Self {
        self.land_dir = land_dir;
        self.water_dir = water_dir;
        self
    }

    /// Ledger of past selections; without one, selection ignores history.
    pub fn with_history(mut self, path: PathBuf) -> Self {
        self.history_path = Some(path);
        self
    }

    pub fn with_policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn history(&self) -> InkResult<QuizHistory> {
        match &self.history_path {
            Some(path) => QuizHistory::load(path),
            None => Ok(QuizHistory::default()),
        }
    }

    /// Track and stage for `now`. Reads the history but never writes it.
    pub fn plan(&self, now: &Now) -> InkResult<QuizPlan> {
        let week = QuizWeek::of(now);
        let available = self.store.list()?;
        let history = self.history()?;
        let entry = select_week_track(week, &available, &history, self.policy)?;
        Ok(QuizPlan {
            week,
            track_id: entry.id.clone(),
            stage: Stage::at(now),
        })
    }

    /// Append the plan's week to the history ledger. Returns whether the ledger changed.
    pub fn record(&self, plan: &QuizPlan) -> InkResult<bool> {
        let Some(path) = &self.history_path else {
            return Ok(false);
        };
        let mut history = QuizHistory::load(path)?;
        if !history.record(plan.week, &plan.track_id) {
            return Ok(false);
        }
        history.save(path)?;
        tracing::info!(week = plan.week.0, track = %plan.track_id, "recorded quiz week");
        Ok(true)
    }

    fn prepare(&self, now: &Now) -> InkResult<Prepared> {
        let plan = self.plan(now)?;
        tracing::info!(
            week = plan.week.0,
            track = %plan.track_id,
            level = plan.stage.level.0,
            path_fraction = plan.stage.path_fraction,
            "quiz plan"
        );
        let entry = self
            .store
            .list()?
            .into_iter()
            .find(|e| e.id == plan.track_id)
            .ok_or_else(|| InkError::no_content(format!("track '{}' vanished", plan.track_id)))?;
        let track = self.store.load(&entry)?;
        let subset = reveal(&track, &plan.stage)?;
        let (land, water) = if plan.stage.draw_topo {
            (load_layer(&self.land_dir)?, load_layer(&self.water_dir)?)
        } else {
            (TopoLayer::default(), TopoLayer::default())
        };
        Ok(Prepared {
            plan,
            track,
            subset,
            land,
            water,
        })
    }

    /// All three screens. The history is left alone until the catalog is published.
    pub fn render_all(
        &self,
        now: &Now,
        res: &mut RenderResources,
    ) -> InkResult<Vec<InkResult<Raster>>> {
        let prepared = self.prepare(now)?;
        Ok(DescriptionCorner::ALL
            .iter()
            .map(|corner| draw_screen(&prepared, *corner, res))
            .collect())
    }

    pub fn render_screen(
        &self,
        screen: usize,
        now: &Now,
        res: &mut RenderResources,
    ) -> InkResult<Raster> {
        let corner = DescriptionCorner::ALL
            .get(screen)
            .copied()
            .ok_or_else(|| InkError::validation(format!("quiz has no screen {screen}")))?;
        let prepared = self.prepare(now)?;
        draw_screen(&prepared, corner, res)
    }
}

fn load_layer(dir: &Option<PathBuf>) -> InkResult<TopoLayer> {
    match dir {
        Some(dir) => TopoLayer::load(dir),
        None => Ok(TopoLayer::default()),
    }
}

fn draw_screen(
    p: &Prepared,
    corner: DescriptionCorner,
    res: &mut RenderResources,
) -> InkResult<Raster> {
    let stage = &p.plan.stage;
    let mut canvas = Canvas::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)?;
    let placement = if stage.info.is_empty() {
        Placement::Center
    } else {
        Placement::Left
    };
    let viewport = Viewport::fit(p.subset.extent, canvas.bounds(), placement)?;

    if stage.draw_topo {
        draw_water(&mut canvas, &viewport, &p.water);
        draw_contours(&mut canvas, &viewport, &p.land);
        if stage.draw_level_labels {
            draw_contour_labels(&mut canvas, &mut res.fonts, &viewport, &p.land)?;
        }
    }
    draw_track(&mut canvas, &viewport, &p.subset.points);
    if stage.add_scale {
        draw_scale_bar(&mut canvas, &mut res.fonts, &viewport)?;
    }
    let lines = description_lines(&p.track.metadata, stage);
    draw_description(&mut canvas, &mut res.fonts, &lines, corner)?;

    Raster::from_bitmap(canvas.finish(Dither::Ordered))
}

fn rings_path(viewport: &Viewport, rings: &[Vec<GeoPoint>]) -> BezPath {
    let mut path = BezPath::new();
    for ring in rings {
        path.extend(polygon(&viewport.project_all(ring)).elements().iter().copied());
    }
    path
}

fn draw_water(canvas: &mut Canvas, viewport: &Viewport, water: &TopoLayer) {
    for feature in water.features_in(viewport.extent()) {
        match &feature.shape {
            FeatureShape::Areas(polygons) => {
                for rings in polygons {
                    canvas.fill_path(&rings_path(viewport, rings), Ink::Gray(190));
                }
            }
            FeatureShape::Lines(lines) => {
                for line in lines {
                    let path = polyline(&viewport.project_all(line));
                    canvas.stroke_path(&path, LineStyle::solid(1.5), Ink::Gray(120));
                }
            }
        }
    }
}

fn is_major(elevation: Option<f64>) -> bool {
    elevation.is_some_and(|e| (e / MAJOR_CONTOUR_M - (e / MAJOR_CONTOUR_M).round()).abs() < 1e-6)
}

fn draw_contours(canvas: &mut Canvas, viewport: &Viewport, land: &TopoLayer) {
    for feature in land.features_in(viewport.extent()) {
        let (style, ink) = if is_major(feature.elevation) {
            (LineStyle::solid(1.4), Ink::Black)
        } else {
            (LineStyle::solid(0.8), Ink::Gray(110))
        };
        let lines: Vec<&Vec<GeoPoint>> = match &feature.shape {
            FeatureShape::Lines(lines) => lines.iter().collect(),
            FeatureShape::Areas(polygons) => polygons.iter().flatten().collect(),
        };
        for line in lines {
            canvas.stroke_path(&polyline(&viewport.project_all(line)), style, ink);
        }
    }
}

/// Elevation labels at the middle of each major contour's longest visible line, skipping labels
/// that would overlap an earlier one.
fn draw_contour_labels(
    canvas: &mut Canvas,
    fonts: &mut Fonts,
    viewport: &Viewport,
    land: &TopoLayer,
) -> InkResult<()> {
    let inner = Rect::new(20.0, 20.0, canvas.width() - 20.0, canvas.height() - 20.0);
    let mut taken: Vec<Rect> = Vec::new();
    for feature in land.features_in(viewport.extent()) {
        let Some(elevation) = feature.elevation.filter(|_| is_major(feature.elevation)) else {
            continue;
        };
        let lines: Vec<&Vec<GeoPoint>> = match &feature.shape {
            FeatureShape::Lines(lines) => lines.iter().collect(),
            FeatureShape::Areas(polygons) => polygons.iter().flatten().collect(),
        };
        let Some(longest) = lines.into_iter().max_by_key(|l| l.len()) else {
            continue;
        };
        let Some(anchor) = longest.get(longest.len() / 2).map(|p| viewport.project(*p)) else {
            continue;
        };
        if !inner.contains(anchor) {
            continue;
        }
        let label = format!("{elevation:.0}");
        let width = f64::from(fonts.measure(&label, LABEL_FONT_PX)?);
        let height = f64::from(LABEL_FONT_PX);
        let rect = Rect::from_center_size(anchor, (width + 4.0, height + 2.0));
        if taken.iter().any(|r| r.intersect(rect).area() > 0.0) {
            continue;
        }
        canvas.fill_rect(rect, Ink::White);
        canvas.draw_text(fonts, &label, LABEL_FONT_PX, anchor, TextAnchor::CENTER, Ink::Black)?;
        taken.push(rect);
    }
    Ok(())
}

fn draw_track(canvas: &mut Canvas, viewport: &Viewport, points: &[GeoPoint]) {
    let projected = viewport.project_all(points);
    canvas.stroke_path(&polyline(&projected), LineStyle::solid(4.0), Ink::Black);
    if let Some(start) = projected.first() {
        canvas.fill_circle(*start, 8.0, Ink::Black);
        canvas.fill_circle(*start, 4.0, Ink::White);
    }
}

/// Largest 1/2/5 x 10^k value not above `raw`.
fn nice_floor(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let base = 10f64.powf(raw.log10().floor());
    let frac = raw / base;
    let nice = if frac >= 5.0 {
        5.0
    } else if frac >= 2.0 {
        2.0
    } else {
        1.0
    };
    nice * base
}

/// Ground length shown by the scale bar and its label.
pub fn scale_bar(meters_per_px: f64) -> (f64, String) {
    let meters = nice_floor(SCALE_TARGET_PX * meters_per_px);
    let label = if meters >= 1000.0 {
        format!("{} km", meters / 1000.0)
    } else {
        format!("{meters} m")
    };
    (meters, label)
}

fn draw_scale_bar(canvas: &mut Canvas, fonts: &mut Fonts, viewport: &Viewport) -> InkResult<()> {
    let (meters, label) = scale_bar(viewport.meters_per_px());
    let length = meters / viewport.meters_per_px();
    let x0 = 2.0 * OUTER_MARGIN;
    let baseline = canvas.height() - 2.0 * OUTER_MARGIN;

    let label_width = f64::from(fonts.measure(&label, SCALE_FONT_PX)?);
    canvas.fill_rect(
        Rect::new(
            OUTER_MARGIN,
            canvas.height() - OUTER_MARGIN - SCALE_HEIGHT,
            x0 + length.max(label_width) + OUTER_MARGIN,
            canvas.height() - OUTER_MARGIN,
        ),
        Ink::White,
    );

    let bar = Rect::new(x0, baseline - 6.0, x0 + length, baseline);
    let quarter = length / 4.0;
    for i in 0..4 {
        let segment = Rect::new(
            x0 + quarter * f64::from(i),
            bar.y0,
            x0 + quarter * f64::from(i + 1),
            bar.y1,
        );
        let ink = if i % 2 == 0 { Ink::Black } else { Ink::White };
        canvas.fill_rect(segment, ink);
    }
    canvas.stroke_rect(bar, LineStyle::solid(1.0), Ink::Black);
    canvas.draw_text(
        fonts,
        &label,
        SCALE_FONT_PX,
        Point::new(x0, bar.y0 - 3.0),
        TextAnchor::new(HAlign::Left, VAlign::Bottom),
        Ink::Black,
    )?;
    Ok(())
}

/// "a und b", "a, b und c".
pub fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} und {last}", init.join(", ")),
    }
}

/// Hint paragraphs unlocked by `stage`: date, location, landmarks. Paragraphs are separated by
/// empty strings.
pub fn description_lines(meta: &TrackMetadata, stage: &Stage) -> Vec<String> {
    let mut date = Vec::new();
    if stage.shows(InfoField::Month) {
        if let Some(name) = meta
            .month
            .and_then(|m| m.checked_sub(1))
            .and_then(|i| MONTH_NAMES.get(i as usize))
        {
            date.push(name.to_string());
        }
    }
    if stage.shows(InfoField::Year) {
        if let Some(year) = meta.year {
            date.push(year.to_string());
        }
    }

    let location: Vec<String> = [
        (InfoField::City, &meta.city),
        (InfoField::State, &meta.state),
        (InfoField::Country, &meta.country),
    ]
    .into_iter()
    .filter(|(field, _)| stage.shows(*field))
    .filter_map(|(_, value)| value.clone())
    .collect();

    let landmarks = if stage.shows(InfoField::Landmarks) {
        format_list(&meta.landmarks)
    } else {
        String::new()
    };

    let paragraphs: Vec<String> = [date.join(" "), location.join(", "), landmarks]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    let mut out = Vec::with_capacity(paragraphs.len() * 2);
    for (i, p) in paragraphs.into_iter().enumerate() {
        if i > 0 {
            out.push(String::new());
        }
        out.push(p);
    }
    out
}

/// Boxes of the wrapped description lines for `corner` on a `width` x `height` screen.
pub fn layout_description(
    fonts: &mut Fonts,
    lines: &[String],
    corner: DescriptionCorner,
    width: f64,
    height: f64,
) -> InkResult<Vec<(String, Rect)>> {
    let mut wrapped = Vec::new();
    for line in lines {
        if line.is_empty() {
            wrapped.push(String::new());
            continue;
        }
        wrapped.extend(split_evenly(
            line,
            |s| fonts.measure(s, DESCRIPTION_FONT_PX).map(f64::from),
            width / 3.0,
        )?);
    }

    let text_height = f64::from(DESCRIPTION_FONT_PX);
    let mut boxes = Vec::new();
    match corner {
        DescriptionCorner::BottomRight | DescriptionCorner::BottomLeft => {
            let mut bottom = if corner == DescriptionCorner::BottomLeft {
                height - OUTER_MARGIN - SCALE_HEIGHT
            } else {
                height - OUTER_MARGIN
            };
            for line in wrapped.iter().rev() {
                if line.is_empty() {
                    bottom -= PAR_SKIP - LINE_SKIP;
                    continue;
                }
                let w = f64::from(fonts.measure(line, DESCRIPTION_FONT_PX)?);
                let left = if corner == DescriptionCorner::BottomLeft {
                    OUTER_MARGIN
                } else {
                    width - OUTER_MARGIN - w
                };
                boxes.push((line.clone(), Rect::new(left, bottom - text_height, left + w, bottom)));
                bottom -= LINE_SKIP;
            }
        }
        DescriptionCorner::TopRight => {
            let mut bottom = OUTER_MARGIN + text_height;
            for line in &wrapped {
                if line.is_empty() {
                    bottom += PAR_SKIP - LINE_SKIP;
                    continue;
                }
                let w = f64::from(fonts.measure(line, DESCRIPTION_FONT_PX)?);
                let right = width - OUTER_MARGIN;
                boxes.push((line.clone(), Rect::new(right - w, bottom - text_height, right, bottom)));
                bottom += LINE_SKIP;
            }
        }
    }
    Ok(boxes)
}

fn draw_description(
    canvas: &mut Canvas,
    fonts: &mut Fonts,
    lines: &[String],
    corner: DescriptionCorner,
) -> InkResult<()> {
    let boxes = layout_description(fonts, lines, corner, canvas.width(), canvas.height())?;
    for (_, rect) in &boxes {
        canvas.fill_rect(rect.inflate(BOX_MARGIN, BOX_MARGIN), Ink::White);
    }
    for (text, rect) in &boxes {
        canvas.draw_text(
            fonts,
            text,
            DESCRIPTION_FONT_PX,
            rect.origin(),
            TextAnchor::TOP_LEFT,
            Ink::Black,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/apps/hiking_quiz.rs"]
mod tests;
