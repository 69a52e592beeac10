use std::sync::Arc;

use crate::{
    assets::{
        fonts::{Fonts, ShapedText},
        icons::IconImage,
    },
    foundation::{
        core::{Affine, BezPath, Bitmap, Point, Rect},
        error::{InkError, InkResult},
    },
};

/// Paint colors. Gray levels only survive as dither patterns after [`Canvas::finish`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    Black,
    White,
    Gray(u8),
}

impl Ink {
    fn luma(self) -> u8 {
        match self {
            Ink::Black => 0,
            Ink::White => 255,
            Ink::Gray(v) => v,
        }
    }

    fn paint(self) -> vello_cpu::peniko::Color {
        let v = self.luma();
        vello_cpu::peniko::Color::from_rgba8(v, v, v, 255)
    }
}

/// How anti-aliased coverage is reduced to two tones in [`Canvas::finish`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dither {
    /// Luma below the threshold becomes black. Crisp text and lines.
    Threshold(u8),
    /// 4x4 Bayer matrix; keeps the impression of thin strokes and light fills.
    Ordered,
}

impl Default for Dither {
    fn default() -> Self {
        Dither::Threshold(160)
    }
}

const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Stroke parameters for lines and outlines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    /// `(dash, gap)` lengths in pixels.
    pub dash: Option<(f64, f64)>,
}

impl LineStyle {
    pub fn solid(width: f64) -> Self {
        Self { width, dash: None }
    }

    pub fn dashed(width: f64, dash: f64, gap: f64) -> Self {
        Self {
            width,
            dash: Some((dash, gap)),
        }
    }

    fn to_kurbo(self) -> kurbo::Stroke {
        let stroke = kurbo::Stroke::new(self.width)
            .with_caps(kurbo::Cap::Butt)
            .with_join(kurbo::Join::Round);
        match self.dash {
            Some((dash, gap)) => stroke.with_dashes(0.0, [dash, gap]),
            None => stroke,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Which point of the text box is placed at the anchor position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextAnchor {
    pub h: HAlign,
    pub v: VAlign,
}

impl TextAnchor {
    pub const TOP_LEFT: TextAnchor = TextAnchor {
        h: HAlign::Left,
        v: VAlign::Top,
    };
    pub const CENTER: TextAnchor = TextAnchor {
        h: HAlign::Center,
        v: VAlign::Middle,
    };

    pub fn new(h: HAlign, v: VAlign) -> Self {
        Self { h, v }
    }

    /// Top-left corner of a `width` x `height` box anchored at `at`.
    pub fn origin(self, at: Point, width: f64, height: f64) -> Point {
        let x = match self.h {
            HAlign::Left => at.x,
            HAlign::Center => at.x - width / 2.0,
            HAlign::Right => at.x - width,
        };
        let y = match self.v {
            VAlign::Top => at.y,
            VAlign::Middle => at.y - height / 2.0,
            VAlign::Bottom => at.y - height,
        };
        Point::new(x, y)
    }
}

/// A vector drawing surface backed by `vello_cpu`, reduced to a two-tone [`Bitmap`] at the end.
///
/// The surface starts white. Everything outside it is clipped.
pub struct Canvas {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> InkResult<Self> {
        if width == 0 || height == 0 {
            return Err(InkError::render("canvas must be non-empty"));
        }
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| InkError::render("canvas width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| InkError::render("canvas height exceeds u16"))?;
        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_paint(Ink::White.paint());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
        Ok(Self {
            width: width_u16,
            height: height_u16,
            ctx,
        })
    }

    pub fn width(&self) -> f64 {
        f64::from(self.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }

    pub fn fill_path(&mut self, path: &BezPath, ink: Ink) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(ink.paint());
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub fn fill_rect(&mut self, rect: Rect, ink: Ink) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(ink.paint());
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    /// Stroke `path` by filling its outline.
    pub fn stroke_path(&mut self, path: &BezPath, style: LineStyle, ink: Ink) {
        if style.width <= 0.0 || path.elements().is_empty() {
            return;
        }
        let outline = kurbo::stroke(
            path.iter(),
            &style.to_kurbo(),
            &kurbo::StrokeOpts::default(),
            0.1,
        );
        self.fill_path(&outline, ink);
    }

    pub fn stroke_rect(&mut self, rect: Rect, style: LineStyle, ink: Ink) {
        let mut path = BezPath::new();
        path.move_to((rect.x0, rect.y0));
        path.line_to((rect.x1, rect.y0));
        path.line_to((rect.x1, rect.y1));
        path.line_to((rect.x0, rect.y1));
        path.close_path();
        self.stroke_path(&path, style, ink);
    }

    pub fn line(&mut self, from: Point, to: Point, style: LineStyle, ink: Ink) {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        self.stroke_path(&path, style, ink);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, ink: Ink) {
        let circle = kurbo::Circle::new(center, radius);
        self.fill_path(&kurbo::Shape::to_path(&circle, 0.1), ink);
    }

    /// Paint a rasterized icon with its top-left corner at `origin`.
    pub fn draw_image(&mut self, img: &IconImage, origin: Point) -> InkResult<()> {
        let pixmap = premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_transform(affine_to_cpu(Affine::translate(origin.to_vec2())));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Draw one line of text anchored at `at`. Returns the box the text occupies.
    ///
    /// With fonts disabled nothing is drawn but the box is still computed.
    pub fn draw_text(
        &mut self,
        fonts: &mut Fonts,
        text: &str,
        size_px: f32,
        at: Point,
        anchor: TextAnchor,
        ink: Ink,
    ) -> InkResult<Rect> {
        let shaped = fonts.shape(text, size_px)?;
        let origin = anchor.origin(at, f64::from(shaped.width), f64::from(shaped.height));
        if let Some(font) = fonts.font_data() {
            self.draw_shaped(&shaped, font, origin, ink);
        }
        Ok(Rect::from_origin_size(
            origin,
            (f64::from(shaped.width), f64::from(shaped.height)),
        ))
    }

    fn draw_shaped(
        &mut self,
        shaped: &ShapedText,
        font: &vello_cpu::peniko::FontData,
        origin: Point,
        ink: Ink,
    ) {
        let Some(layout) = shaped.layout.as_ref() else {
            return;
        };
        self.ctx
            .set_transform(affine_to_cpu(Affine::translate(origin.to_vec2())));
        self.ctx.set_paint(ink.paint());
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Rasterize everything drawn so far and reduce it to two tones.
    pub fn finish(mut self, dither: Dither) -> Bitmap {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);

        let (w, h) = (u32::from(self.width), u32::from(self.height));
        let mut out = Bitmap::blank(w, h);
        for (i, px) in pixmap.data_as_u8_slice().chunks_exact(4).enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            // background is opaque white, so premultiplied channels are plain luma
            let luma = ((u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114)
                / 1000) as u8;
            let black = match dither {
                Dither::Threshold(t) => luma < t,
                Dither::Ordered => {
                    let level = BAYER_4X4[(y % 4) as usize][(x % 4) as usize];
                    u32::from(luma) < u32::from(level) * 16 + 8
                }
            };
            if black {
                out.set(x, y, true);
            }
        }
        out
    }
}

/// Open polyline through `points`; empty for fewer than two points.
pub fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if points.len() < 2 {
        return path;
    }
    path.move_to(points[0]);
    for p in &points[1..] {
        path.line_to(*p);
    }
    path
}

/// Closed polygon through `ring`.
pub fn polygon(ring: &[Point]) -> BezPath {
    let mut path = polyline(ring);
    if !path.elements().is_empty() {
        path.close_path();
    }
    path
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> InkResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| InkError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| InkError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(InkError::render("icon byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
