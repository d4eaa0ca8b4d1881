//! The one place chunk widths come from
//!
//! The wrapper decides line breaks with [`Measurer::chunk_width`] and the
//! compositor advances its cursor with the same call, so a layout that
//! fitted during wrapping is drawn at exactly the widths it was fitted at.

use std::sync::Arc;

use boxfit_core::{
    error::Result,
    traits::{FontProvider, FontRef, TextShaper},
    RunKind, Style,
};

/// Smallest width a word gap may have
pub const MIN_SPACE_WIDTH: f32 = 2.0;

/// Shared width oracle for wrapping and drawing
#[derive(Clone)]
pub struct Measurer {
    fonts: Arc<dyn FontProvider>,
    shaper: Arc<dyn TextShaper>,
}

impl Measurer {
    pub fn new(fonts: Arc<dyn FontProvider>, shaper: Arc<dyn TextShaper>) -> Self {
        Self { fonts, shaper }
    }

    /// Advance of one chunk at `size` px.
    ///
    /// Emoji occupy a square cell as wide as their size; text is shaped
    /// with the face for its style variant.
    pub fn chunk_width(&self, text: &str, style: Style, kind: RunKind, size: u32) -> Result<f32> {
        match kind {
            RunKind::Emoji => Ok(size as f32),
            RunKind::Text => {
                if text.is_empty() {
                    return Ok(0.0);
                }
                let font = self.font(style, size)?;
                self.shaper.advance(text, font.as_ref(), size as f32)
            },
        }
    }

    /// Width of the gap between two words
    pub fn space_width(&self, style: Style, size: u32) -> Result<f32> {
        Ok(self
            .chunk_width(" ", style, RunKind::Text, size)?
            .max(MIN_SPACE_WIDTH))
    }

    pub fn font(&self, style: Style, size: u32) -> Result<Arc<dyn FontRef>> {
        self.fonts.font_for(style.variant(), size)
    }

    pub fn shaper(&self) -> &dyn TextShaper {
        self.shaper.as_ref()
    }
}

impl std::fmt::Debug for Measurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Measurer")
            .field("shaper", &self.shaper.name())
            .finish()
    }
}
