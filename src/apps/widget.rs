//! Dashboard screens composed of independently rendered rectangular widgets.

use std::time::Instant;

use crate::{
    apps::{Now, RenderResources},
    foundation::{
        core::{Bitmap, DISPLAY_HEIGHT, DISPLAY_WIDTH, Raster, crossed_box},
        error::{InkError, InkResult},
    },
};

/// Position and size of a widget on the screen, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Slot {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Slot {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangular piece of a dashboard screen.
pub trait Widget {
    /// Short name used in log lines.
    fn kind(&self) -> &'static str;

    fn slot(&self) -> Slot;

    /// Draw the widget on a bitmap of exactly [`Widget::slot`]'s size.
    fn render(&self, now: &Now, res: &mut RenderResources) -> InkResult<Bitmap>;
}

/// Render every widget and paste it at its slot on a blank screen.
///
/// A widget that fails, or returns a bitmap of the wrong size, is replaced by a crossed-out box
/// of its slot's size; the other widgets are unaffected.
pub fn compose(widgets: &[&dyn Widget], now: &Now, res: &mut RenderResources) -> InkResult<Raster> {
    let mut screen = Bitmap::blank(DISPLAY_WIDTH, DISPLAY_HEIGHT);
    for widget in widgets {
        let slot = widget.slot();
        let started = Instant::now();
        let rendered = widget.render(now, res).and_then(|bmp| {
            if (bmp.width(), bmp.height()) == (slot.width, slot.height) {
                Ok(bmp)
            } else {
                Err(InkError::render(format!(
                    "widget returned {}x{}, slot is {}x{}",
                    bmp.width(),
                    bmp.height(),
                    slot.width,
                    slot.height
                )))
            }
        });
        let bmp = match rendered {
            Ok(bmp) => bmp,
            Err(err) => {
                tracing::warn!(
                    widget = widget.kind(),
                    x = slot.x,
                    y = slot.y,
                    error = %err,
                    "widget failed, drawing error box"
                );
                crossed_box(slot.width, slot.height)
            }
        };
        tracing::debug!(
            widget = widget.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered widget"
        );
        screen.blit(&bmp, slot.x, slot.y);
    }
    Raster::from_bitmap(screen)
}

#[cfg(test)]
#[path = "../../tests/unit/apps/widget.rs"]
mod tests;
