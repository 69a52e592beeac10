use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::foundation::error::{InkError, InkResult};

/// WGS84 coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let (la1, la2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = la2 - la1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + la1.cos() * la2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Linear interpolation in coordinate space; fine for the short segments of a recording.
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// Axis-aligned lat/lon box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    /// Bounding box of `points`; `None` for an empty slice.
    pub fn of(points: &[GeoPoint]) -> Option<Self> {
        let first = *points.first()?;
        let mut b = GeoBounds {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            b.include(*p);
        }
        Some(b)
    }

    pub fn include(&mut self, p: GeoPoint) {
        self.min.lat = self.min.lat.min(p.lat);
        self.min.lon = self.min.lon.min(p.lon);
        self.max.lat = self.max.lat.max(p.lat);
        self.max.lon = self.max.lon.max(p.lon);
    }

    pub fn union(self, other: GeoBounds) -> GeoBounds {
        let mut b = self;
        b.include(other.min);
        b.include(other.max);
        b
    }

    pub fn center(self) -> GeoPoint {
        self.min.lerp(self.max, 0.5)
    }

    pub fn lat_span(self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn lon_span(self) -> f64 {
        self.max.lon - self.min.lon
    }

    /// Grow every side by `fraction` of the larger span, with at least `min_pad_deg`.
    pub fn padded(self, fraction: f64, min_pad_deg: f64) -> GeoBounds {
        let pad = (self.lat_span().max(self.lon_span()) * fraction).max(min_pad_deg);
        GeoBounds {
            min: GeoPoint::new(self.min.lat - pad, self.min.lon - pad),
            max: GeoPoint::new(self.max.lat + pad, self.max.lon + pad),
        }
    }

    pub fn contains(self, p: GeoPoint) -> bool {
        p.lat >= self.min.lat
            && p.lat <= self.max.lat
            && p.lon >= self.min.lon
            && p.lon <= self.max.lon
    }

    pub fn contains_bounds(self, other: GeoBounds) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn intersects(self, other: GeoBounds) -> bool {
        self.min.lat <= other.max.lat
            && other.min.lat <= self.max.lat
            && self.min.lon <= other.max.lon
            && other.min.lon <= self.max.lon
    }
}

/// Descriptive data shown as quiz hints.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackMetadata {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub landmarks: Vec<String>,
    pub exclude_from_quiz: bool,
}

/// A track listed in the store; points are loaded on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEntry {
    /// Folder name, stable across runs.
    pub id: String,
    pub dir: PathBuf,
    pub metadata: TrackMetadata,
}

/// A recorded path with its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: String,
    pub metadata: TrackMetadata,
    pub points: Vec<GeoPoint>,
}

impl Track {
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::of(&self.points)
    }

    /// Total path length in meters.
    pub fn length_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_m(w[1]))
            .sum()
    }
}

#[derive(serde::Deserialize)]
struct TrackRow {
    lat: f64,
    lon: f64,
}

const METADATA_FILE: &str = "metadata.json";
const POINTS_FILE: &str = "track.csv";

/// Read-only access to the recordings directory (one sub-directory per track).
#[derive(Clone, Debug)]
pub struct TrackStore {
    root: PathBuf,
}

impl TrackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Quiz-eligible tracks sorted by id. A missing directory lists nothing.
    pub fn list(&self) -> InkResult<Vec<TrackEntry>> {
        let mut out = Vec::new();
        if !self.root.is_dir() {
            tracing::warn!(root = %self.root.display(), "tracks directory does not exist");
            return Ok(out);
        }
        let dir = fs::read_dir(&self.root)
            .with_context(|| format!("list tracks in '{}'", self.root.display()))?;
        for entry in dir {
            let entry = entry.with_context(|| format!("read '{}'", self.root.display()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            let metadata = read_metadata(&path)?;
            if metadata.exclude_from_quiz {
                tracing::info!(track = %id, "excluded track");
                continue;
            }
            out.push(TrackEntry {
                id,
                dir: path,
                metadata,
            });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    /// Parse the points of a listed track.
    pub fn load(&self, entry: &TrackEntry) -> InkResult<Track> {
        let path = entry.dir.join(POINTS_FILE);
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| InkError::render(format!("open '{}': {e}", path.display())))?;
        let mut points = Vec::new();
        for row in reader.deserialize::<TrackRow>() {
            let row =
                row.map_err(|e| InkError::render(format!("parse '{}': {e}", path.display())))?;
            if !row.lat.is_finite() || !row.lon.is_finite() {
                return Err(InkError::render(format!(
                    "non-finite coordinate in '{}'",
                    path.display()
                )));
            }
            points.push(GeoPoint::new(row.lat, row.lon));
        }
        if points.is_empty() {
            return Err(InkError::render(format!(
                "track '{}' has no points",
                entry.id
            )));
        }
        Ok(Track {
            id: entry.id.clone(),
            metadata: entry.metadata.clone(),
            points,
        })
    }
}

fn read_metadata(track_dir: &Path) -> InkResult<TrackMetadata> {
    let path = track_dir.join(METADATA_FILE);
    if !path.is_file() {
        return Ok(TrackMetadata::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| InkError::validation(format!("parse '{}': {e}", path.display())))
}

/// Geometry of one topographic feature, already split into coordinate rings/lines.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureShape {
    /// Open polylines (contours, rivers).
    Lines(Vec<Vec<GeoPoint>>),
    /// Polygons; each polygon is an outer ring followed by holes.
    Areas(Vec<Vec<Vec<GeoPoint>>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopoFeature {
    pub elevation: Option<f64>,
    pub shape: FeatureShape,
    pub bounds: GeoBounds,
}

#[derive(serde::Deserialize)]
struct FeatureCollection {
    features: Vec<GeoJsonFeature>,
}

#[derive(serde::Deserialize)]
struct GeoJsonFeature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Option<serde_json::Value>,
}

/// Geometry types drawn as topography; anything else (points, collections) is skipped.
const DRAWN_GEOMETRIES: [&str; 4] = ["LineString", "MultiLineString", "Polygon", "MultiPolygon"];

#[derive(serde::Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    LineString(Vec<Vec<f64>>),
    MultiLineString(Vec<Vec<Vec<f64>>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// A static land or water layer read from GeoJSON files.
#[derive(Clone, Debug, Default)]
pub struct TopoLayer {
    features: Vec<TopoFeature>,
}

impl TopoLayer {
    pub fn from_features(features: Vec<TopoFeature>) -> Self {
        Self { features }
    }

    /// Load every `*.json` / `*.geojson` file in `dir` (sorted by file name).
    pub fn load(dir: &Path) -> InkResult<Self> {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "topo layer missing, using empty layer");
            return Ok(Self::default());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("list topo layer '{}'", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("json") | Some("geojson")
                )
            })
            .collect();
        files.sort();

        let mut features = Vec::new();
        for file in files {
            let bytes = fs::read(&file).with_context(|| format!("read '{}'", file.display()))?;
            features.extend(parse_feature_collection(&bytes).map_err(|e| {
                InkError::render(format!("decode topo layer '{}': {e}", file.display()))
            })?);
        }
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features_in(&self, region: GeoBounds) -> impl Iterator<Item = &TopoFeature> {
        self.features
            .iter()
            .filter(move |f| f.bounds.intersects(region))
    }
}

/// Parse a GeoJSON `FeatureCollection` into topo features. Features without geometry, or
/// with a geometry that is neither a line nor a polygon, are skipped.
pub fn parse_feature_collection(bytes: &[u8]) -> InkResult<Vec<TopoFeature>> {
    let fc: FeatureCollection = serde_json::from_slice(bytes)
        .map_err(|e| InkError::render(format!("invalid GeoJSON: {e}")))?;

    let mut out = Vec::with_capacity(fc.features.len());
    for feature in fc.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let kind = geometry.get("type").and_then(|t| t.as_str());
        if !kind.is_some_and(|k| DRAWN_GEOMETRIES.contains(&k)) {
            tracing::debug!(geometry = kind.unwrap_or("?"), "skipping unsupported geometry");
            continue;
        }
        let geometry: Geometry = serde_json::from_value(geometry)
            .map_err(|e| InkError::render(format!("invalid GeoJSON geometry: {e}")))?;
        let elevation = feature.properties.as_ref().and_then(|props| {
            ["elevation", "ELEV", "ele"]
                .iter()
                .find_map(|k| props.get(*k).and_then(|v| v.as_f64()))
        });
        let shape = match geometry {
            Geometry::LineString(line) => FeatureShape::Lines(vec![to_points(&line)?]),
            Geometry::MultiLineString(lines) => FeatureShape::Lines(
                lines
                    .iter()
                    .map(|l| to_points(l))
                    .collect::<InkResult<_>>()?,
            ),
            Geometry::Polygon(rings) => FeatureShape::Areas(vec![
                rings
                    .iter()
                    .map(|r| to_points(r))
                    .collect::<InkResult<_>>()?,
            ]),
            Geometry::MultiPolygon(polys) => FeatureShape::Areas(
                polys
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|r| to_points(r))
                            .collect::<InkResult<Vec<_>>>()
                    })
                    .collect::<InkResult<_>>()?,
            ),
        };
        let all: Vec<GeoPoint> = match &shape {
            FeatureShape::Lines(lines) => lines.iter().flatten().copied().collect(),
            FeatureShape::Areas(polys) => polys.iter().flatten().flatten().copied().collect(),
        };
        let Some(bounds) = GeoBounds::of(&all) else {
            continue;
        };
        out.push(TopoFeature {
            elevation,
            shape,
            bounds,
        });
    }
    Ok(out)
}

fn to_points(positions: &[Vec<f64>]) -> InkResult<Vec<GeoPoint>> {
    positions
        .iter()
        .map(|pos| match pos.as_slice() {
            [lon, lat, ..] => Ok(GeoPoint::new(*lat, *lon)),
            _ => Err(InkError::render("GeoJSON position needs at least 2 values")),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/geo.rs"]
mod tests;
