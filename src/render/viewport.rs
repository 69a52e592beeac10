use crate::{
    assets::geo::{GeoBounds, GeoPoint},
    foundation::{
        core::{Point, Rect},
        error::{InkError, InkResult},
    },
};

/// Meters per degree of latitude on the sphere used by [`GeoPoint::distance_m`].
pub const METERS_PER_DEG_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

/// Where the requested extent sits inside the widened one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Left,
    Center,
}

/// Local equirectangular projection of a geographic extent onto a pixel frame.
///
/// Longitudes are shortened by the cosine of the central latitude so that one pixel covers the
/// same ground distance in both directions. The extent is widened (never cropped) to the aspect
/// ratio of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    frame: Rect,
    extent: GeoBounds,
    lon_factor: f64,
    px_per_deg_lat: f64,
}

impl Viewport {
    pub fn fit(extent: GeoBounds, frame: Rect, placement: Placement) -> InkResult<Self> {
        if frame.width() <= 0.0 || frame.height() <= 0.0 {
            return Err(InkError::render("viewport frame must be non-empty"));
        }
        let lon_factor = extent.center().lat.to_radians().cos();
        let (w, h) = (extent.lon_span() * lon_factor, extent.lat_span());
        if !(w.is_finite() && h.is_finite()) || lon_factor <= 0.0 || (w <= 0.0 && h <= 0.0) {
            return Err(InkError::render("viewport extent is degenerate"));
        }

        let aspect = frame.width() / frame.height();
        let mut widened = extent;
        if w < h * aspect {
            let extra_lon = (h * aspect - w) / lon_factor;
            match placement {
                Placement::Left => widened.max.lon += extra_lon,
                Placement::Center => {
                    widened.min.lon -= extra_lon / 2.0;
                    widened.max.lon += extra_lon / 2.0;
                }
            }
        } else {
            let extra_lat = w / aspect - h;
            widened.min.lat -= extra_lat / 2.0;
            widened.max.lat += extra_lat / 2.0;
        }

        Ok(Self {
            frame,
            extent: widened,
            lon_factor,
            px_per_deg_lat: frame.height() / widened.lat_span(),
        })
    }

    /// The widened extent actually shown.
    pub fn extent(&self) -> GeoBounds {
        self.extent
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn project(&self, p: GeoPoint) -> Point {
        Point::new(
            self.frame.x0 + (p.lon - self.extent.min.lon) * self.lon_factor * self.px_per_deg_lat,
            self.frame.y0 + (self.extent.max.lat - p.lat) * self.px_per_deg_lat,
        )
    }

    pub fn project_all(&self, points: &[GeoPoint]) -> Vec<Point> {
        points.iter().map(|p| self.project(*p)).collect()
    }

    /// Ground distance covered by one pixel, in meters.
    pub fn meters_per_px(&self) -> f64 {
        METERS_PER_DEG_LAT / self.px_per_deg_lat
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/viewport.rs"]
mod tests;
