//! Drawing seam between the viewer's layout logic and a pixel buffer.

use std::fmt;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use tracing::warn;

use crate::error::RenderError;
use crate::overlay;

/// DejaVu Sans Mono, used when no font file is configured.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

/// Label font; without one, labels draw their background strip only.
#[derive(Clone)]
pub struct Typeface {
    font: Option<FontArc>,
    scale: PxScale,
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeface")
            .field("font", &self.font.is_some())
            .field("scale", &self.scale)
            .finish()
    }
}

impl Default for Typeface {
    fn default() -> Self {
        let font = FontArc::try_from_slice(BUNDLED_FONT)
            .map_err(|e| warn!("bundled label font unusable: {e}"))
            .ok();
        Self {
            font,
            ..Self::blank()
        }
    }
}

impl Typeface {
    /// No font: label strips are drawn, their text is not.
    pub fn blank() -> Self {
        Self {
            font: None,
            scale: PxScale::from(22.0),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, path: &Path) -> Result<Self, RenderError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| RenderError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            font: Some(font),
            ..Self::blank()
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|e| RenderError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(bytes, path)
    }

    pub fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }

    pub fn scale(&self) -> PxScale {
        self.scale
    }
}

/// Primitive shapes the viewer needs. Coordinates are pixels, corners inclusive.
pub trait Canvas {
    fn stroke_rect(
        &mut self,
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: Rgb<u8>,
        thickness: u32,
    );

    fn fill_rect(&mut self, top_left: (i32, i32), bottom_right: (i32, i32), color: Rgb<u8>);

    fn line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgb<u8>, thickness: u32);

    /// Draw `text` with its top-left corner at `origin`.
    fn text(&mut self, origin: (i32, i32), text: &str, color: Rgb<u8>, typeface: &Typeface);
}

impl Canvas for RgbImage {
    fn stroke_rect(
        &mut self,
        top_left: (i32, i32),
        bottom_right: (i32, i32),
        color: Rgb<u8>,
        thickness: u32,
    ) {
        overlay::draw_rect(self, top_left, bottom_right, color, thickness);
    }

    fn fill_rect(&mut self, top_left: (i32, i32), bottom_right: (i32, i32), color: Rgb<u8>) {
        overlay::fill_rect(self, top_left, bottom_right, color);
    }

    fn line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgb<u8>, thickness: u32) {
        overlay::draw_line(self, from, to, color, thickness);
    }

    fn text(&mut self, origin: (i32, i32), text: &str, color: Rgb<u8>, typeface: &Typeface) {
        match typeface.font() {
            Some(font) => draw_text_mut(self, color, origin.0, origin.1, typeface.scale(), font, text),
            None => warn!(text, "no label font; text dropped"),
        }
    }
}
