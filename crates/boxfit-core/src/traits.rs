//! The seams where backends plug into the pipeline
//!
//! - [`FontRef`] - read access to one loaded face
//! - [`FontProvider`] - maps a style variant and size to a face
//! - [`TextShaper`] - turns text into positioned glyphs and widths
//! - [`GlyphSynthesizer`] - turns emoji sequences into bitmaps
//!
//! Every trait is `Send + Sync` so one set of backends can serve a whole
//! batch of jobs running on worker threads.

use crate::error::Result;
use crate::types::{EmojiBitmap, GlyphId, ShapingResult, StyleVariant};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Read access to font data and metrics
///
/// ```ignore
/// struct MyFont {
///     data: Vec<u8>,
/// }
///
/// impl FontRef for MyFont {
///     fn data(&self) -> &[u8] {
///         &self.data
///     }
///
///     fn units_per_em(&self) -> u16 {
///         1000
///     }
///
///     fn glyph_id(&self, ch: char) -> Option<GlyphId> {
///         Some(42)
///     }
///
///     fn advance_width(&self, glyph_id: GlyphId) -> f32 {
///         500.0
///     }
/// }
/// ```
pub trait FontRef: Send + Sync {
    /// Raw font bytes; may be empty for synthetic fonts
    fn data(&self) -> &[u8];

    /// The font's design grid
    fn units_per_em(&self) -> u16;

    /// Map a character through the cmap; `None` when the font lacks it
    fn glyph_id(&self, ch: char) -> Option<GlyphId>;

    /// Horizontal advance in font units
    fn advance_width(&self, glyph_id: GlyphId) -> f32;

    /// Face index inside a collection
    fn face_index(&self) -> u32 {
        0
    }

    /// Distance from line top to baseline at `size` pixels
    fn ascent(&self, size: f32) -> f32 {
        size * 0.75
    }

    /// Identity used in cache keys
    ///
    /// The default hashes the object address and data length, which is
    /// only stable while the font stays alive. Loaded fonts override this
    /// with a fingerprint of their source.
    fn cache_id(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        (self as *const Self as *const () as usize).hash(&mut hasher);
        self.data().len().hash(&mut hasher);
        hasher.finish()
    }
}

/// Supplies a face for a style variant at a pixel size
pub trait FontProvider: Send + Sync {
    fn font_for(&self, variant: StyleVariant, size: u32) -> Result<Arc<dyn FontRef>>;
}

/// Shapes text into positioned glyphs
pub trait TextShaper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Shape `text` left to right at `size` pixels
    fn shape(&self, text: &str, font: &dyn FontRef, size: f32) -> Result<ShapingResult>;

    /// Total advance of `text`; backends may cache this
    fn advance(&self, text: &str, font: &dyn FontRef, size: f32) -> Result<f32> {
        Ok(self.shape(text, font, size)?.advance_width)
    }

    /// Drop any cached shaping data
    fn clear_cache(&self) {}
}

/// Produces emoji bitmaps
pub trait GlyphSynthesizer: Send + Sync {
    /// Whether the backing font has color glyphs worth rasterizing
    fn renders_color(&self) -> bool;

    /// Bitmap for `sequence` at exactly `size` pixels, or `None` when the
    /// font cannot draw it
    fn synthesize(&self, sequence: &str, size: u32) -> Option<Arc<EmojiBitmap>>;
}
