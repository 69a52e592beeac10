use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{InkError, InkResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Display width shared by every published screen.
pub const DISPLAY_WIDTH: u32 = 800;
/// Display height shared by every published screen.
pub const DISPLAY_HEIGHT: u32 = 480;

/// Pixel value for ink.
pub const BLACK: u8 = 0;
/// Pixel value for paper.
pub const WHITE: u8 = 255;

/// Two-tone pixel buffer of arbitrary size.
///
/// Every byte is either [`BLACK`] or [`WHITE`]; the constructors enforce it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// All-white bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![WHITE; width as usize * height as usize],
        }
    }

    /// Build from row-major luma bytes; anything below 128 becomes black.
    pub fn from_luma(width: u32, height: u32, luma: Vec<u8>) -> InkResult<Self> {
        if luma.len() != width as usize * height as usize {
            return Err(InkError::render(format!(
                "bitmap byte length {} does not match {width}x{height}",
                luma.len()
            )));
        }
        let pixels = luma
            .into_iter()
            .map(|v| if v < 128 { BLACK } else { WHITE })
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel bytes (0 or 255).
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// `true` when the pixel is inked. Out-of-range coordinates read as paper.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[(y * self.width + x) as usize] == BLACK
    }

    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[(y * self.width + x) as usize] = if black { BLACK } else { WHITE };
    }

    pub fn count_black(&self) -> usize {
        self.pixels.iter().filter(|&&p| p == BLACK).count()
    }

    /// Copy `src` with its top-left corner at `(x, y)`, clipping at the borders.
    pub fn blit(&mut self, src: &Bitmap, x: i64, y: i64) {
        for sy in 0..src.height {
            let dy = y + i64::from(sy);
            if dy < 0 || dy >= i64::from(self.height) {
                continue;
            }
            for sx in 0..src.width {
                let dx = x + i64::from(sx);
                if dx < 0 || dx >= i64::from(self.width) {
                    continue;
                }
                let v = src.pixels[(sy * src.width + sx) as usize];
                self.pixels[(dy as u32 * self.width + dx as u32) as usize] = v;
            }
        }
    }
}

/// A published screen: a [`Bitmap`] of exactly [`DISPLAY_WIDTH`] x [`DISPLAY_HEIGHT`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster(Bitmap);

impl Raster {
    pub fn blank() -> Self {
        Self(Bitmap::blank(DISPLAY_WIDTH, DISPLAY_HEIGHT))
    }

    /// Wrap a bitmap, rejecting any size other than the display size.
    pub fn from_bitmap(bitmap: Bitmap) -> InkResult<Self> {
        if bitmap.width() != DISPLAY_WIDTH || bitmap.height() != DISPLAY_HEIGHT {
            return Err(InkError::render(format!(
                "raster must be {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}, got {}x{}",
                bitmap.width(),
                bitmap.height()
            )));
        }
        Ok(Self(bitmap))
    }

    /// Screen shown when nothing valid can be published: a frame with both diagonals.
    pub fn placeholder() -> Self {
        Self(crossed_box(DISPLAY_WIDTH, DISPLAY_HEIGHT))
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.0
    }

    /// Encode as an 8-bit grayscale PNG holding only the two tones.
    pub fn to_png(&self) -> InkResult<Vec<u8>> {
        let img =
            image::GrayImage::from_raw(DISPLAY_WIDTH, DISPLAY_HEIGHT, self.0.pixels.clone())
                .ok_or_else(|| InkError::render("raster buffer does not match display size"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode raster png")?;
        Ok(buf)
    }

    /// Decode a PNG previously written by [`Raster::to_png`] (or any image of display size).
    pub fn from_png(bytes: &[u8]) -> InkResult<Self> {
        let img = image::load_from_memory(bytes).context("decode raster png")?;
        let luma = img.to_luma8();
        let (w, h) = luma.dimensions();
        Self::from_bitmap(Bitmap::from_luma(w, h, luma.into_raw())?)
    }
}

/// Rectangle outline with both diagonals, the error marker used for failed widgets and screens.
pub fn crossed_box(width: u32, height: u32) -> Bitmap {
    let mut bmp = Bitmap::blank(width, height);
    if width == 0 || height == 0 {
        return bmp;
    }
    for x in 0..width {
        bmp.set(x, 0, true);
        bmp.set(x, height - 1, true);
    }
    for y in 0..height {
        bmp.set(0, y, true);
        bmp.set(width - 1, y, true);
    }
    let steps = width.max(height);
    for i in 0..steps {
        let t = f64::from(i) / f64::from(steps.saturating_sub(1).max(1));
        let x = (t * f64::from(width - 1)).round() as u32;
        let y = (t * f64::from(height - 1)).round() as u32;
        bmp.set(x, y, true);
        bmp.set(x, height - 1 - y, true);
    }
    bmp
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
