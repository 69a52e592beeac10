use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{InkError, InkResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Brush carried through Parley layouts; only the luma is used by the two-tone canvas.
pub struct TextBrush {
    /// 0 = black, 255 = white.
    pub luma: u8,
}

/// Advance used for measuring when no font is loaded, as a fraction of the font size.
const FALLBACK_ADVANCE_EM: f32 = 0.55;

/// Laid-out text ready to be drawn on a canvas.
pub struct ShapedText {
    pub(crate) layout: Option<parley::Layout<TextBrush>>,
    pub width: f32,
    pub height: f32,
}

/// The single UI font plus the Parley contexts used to shape with it.
///
/// Without a font file every operation still succeeds: measuring uses a fixed per-character
/// advance and drawing is skipped. Tests and font-less deployments rely on this.
pub struct Fonts {
    face: Option<FontFace>,
}

struct FontFace {
    family_name: String,
    data: vello_cpu::peniko::FontData,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Fonts {
    /// No font: text is measured approximately and never drawn.
    pub fn disabled() -> Self {
        Self { face: None }
    }

    pub fn load(path: &Path) -> InkResult<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(font_bytes: Vec<u8>) -> InkResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            InkError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| InkError::validation("registered font family has no name"))?
            .to_string();

        let data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            face: Some(FontFace {
                family_name,
                data,
                font_ctx,
                layout_ctx: parley::LayoutContext::new(),
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.face.is_some()
    }

    pub(crate) fn font_data(&self) -> Option<&vello_cpu::peniko::FontData> {
        self.face.as_ref().map(|f| &f.data)
    }

    /// Shape a single paragraph (no wrapping) at `size_px`.
    pub fn shape(&mut self, text: &str, size_px: f32) -> InkResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(InkError::validation("text size_px must be finite and > 0"));
        }
        let Some(face) = self.face.as_mut() else {
            return Ok(ShapedText {
                layout: None,
                width: text.chars().count() as f32 * size_px * FALLBACK_ADVANCE_EM,
                height: size_px,
            });
        };

        let mut builder = face
            .layout_ctx
            .ranged_builder(&mut face.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush { luma: 0 }));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        let (width, height) = (layout.width(), layout.height());
        Ok(ShapedText {
            layout: Some(layout),
            width,
            height,
        })
    }

    /// Width of `text` in pixels at `size_px`.
    pub fn measure(&mut self, text: &str, size_px: f32) -> InkResult<f32> {
        Ok(self.shape(text, size_px)?.width)
    }
}

impl std::fmt::Debug for Fonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fonts")
            .field(
                "family",
                &self.face.as_ref().map(|face| face.family_name.as_str()),
            )
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
