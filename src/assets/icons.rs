use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::foundation::error::{InkError, InkResult};

/// Icon shown for names that have no file.
pub const FALLBACK_ICON: &str = "wi-na";

#[derive(Clone, Debug)]
/// Rasterized icon in premultiplied RGBA8.
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// SVG icons looked up by name in a directory (`<dir>/<name>.svg`).
#[derive(Debug, Default)]
pub struct IconSet {
    dir: Option<PathBuf>,
    trees: HashMap<String, Arc<usvg::Tree>>,
    rasters: HashMap<(String, u32), IconImage>,
}

impl IconSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// No icon directory: every lookup returns `None`.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Icon `name` fitted into a `size` x `size` box, falling back to [`FALLBACK_ICON`].
    /// `Ok(None)` means neither file exists.
    pub fn get(&mut self, name: &str, size: u32) -> InkResult<Option<IconImage>> {
        let Some(dir) = self.dir.clone() else {
            return Ok(None);
        };
        let resolved = if dir.join(format!("{name}.svg")).is_file() {
            name
        } else {
            tracing::warn!(icon = name, "icon not found, using fallback");
            FALLBACK_ICON
        };
        let key = (resolved.to_string(), size);
        if let Some(img) = self.rasters.get(&key) {
            return Ok(Some(img.clone()));
        }

        let path = dir.join(format!("{resolved}.svg"));
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "fallback icon missing, skipping icon");
            return Ok(None);
        }
        let tree = match self.trees.get(resolved) {
            Some(t) => t.clone(),
            None => {
                let t = Arc::new(parse_svg_file(&path)?);
                self.trees.insert(resolved.to_string(), t.clone());
                t
            }
        };
        let img = rasterize_fit(&tree, size)?;
        self.rasters.insert(key, img.clone());
        Ok(Some(img))
    }
}

fn parse_svg_file(path: &Path) -> InkResult<usvg::Tree> {
    let bytes = std::fs::read(path).with_context(|| format!("read icon '{}'", path.display()))?;
    parse_svg(&bytes)
}

/// Parse SVG bytes into a `usvg` tree.
pub fn parse_svg(bytes: &[u8]) -> InkResult<usvg::Tree> {
    let opts = usvg::Options::default();
    usvg::Tree::from_data(bytes, &opts).map_err(|e| InkError::render(format!("parse svg: {e}")))
}

/// Rasterize `tree` so that its larger side equals `size`, keeping the aspect ratio.
pub fn rasterize_fit(tree: &usvg::Tree, size: u32) -> InkResult<IconImage> {
    let svg = tree.size();
    let (sw, sh) = (svg.width(), svg.height());
    if !sw.is_finite() || !sh.is_finite() || sw <= 0.0 || sh <= 0.0 || size == 0 {
        return Err(InkError::render("svg has invalid width/height"));
    }
    let scale = size as f32 / sw.max(sh);
    let width = ((sw * scale).round() as u32).max(1);
    let height = ((sh * scale).round() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| InkError::render("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(tree, xform, &mut pixmap.as_mut());

    Ok(IconImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/icons.rs"]
mod tests;
