//! Where boxfit finds its faces
//!
//! The third stage of the pipeline. Callers hand over a [`FontSet`] (paths
//! or bytes for regular, bold and italic) and an [`EmojiFontChain`]; the
//! [`FontResolver`] turns a style variant and pixel size into a cached
//! [`FontHandle`], falling back through the set and finally to well-known
//! system fonts.
//!
//! ## Memory Management
//!
//! Fonts keep their raw bytes behind an `Arc<[u8]>` and parse on demand,
//! so one loaded face can back every size and every handle that uses it.

use std::path::Path;
use std::sync::Arc;

use read_fonts::{types::Tag, FontRef as ReadFontRef, TableProvider};
use skrifa::instance::{LocationRef, Size};
use skrifa::MetadataProvider;

use boxfit_core::{
    error::{FontLoadError, Result},
    traits::FontRef as BoxfitFontRef,
};

pub mod cache;
pub mod resolver;
pub mod source;

pub use cache::{FontCache, FontCacheStats};
pub use resolver::{EmojiFont, EmojiTier, FontHandle, FontKey, FontResolver};
pub use source::{EmojiFontChain, FontSet, FontSource};

/// Which color glyph formats a face carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSupport {
    /// CBDT/CBLC or sbix strikes
    pub bitmap: bool,
    /// COLR layers (v0 or v1)
    pub colr: bool,
    /// SVG table
    pub svg: bool,
}

impl ColorSupport {
    /// True when the emoji synthesizer can draw color from this face
    pub fn renders_color(&self) -> bool {
        self.bitmap || self.colr
    }
}

/// A font brought into memory, ready to shape and draw
pub struct Font {
    data: Arc<[u8]>,
    face_index: u32,
    units_per_em: u16,
    fingerprint: u64,
    name: String,
}

impl Font {
    /// Opens a font file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        FontSource::path(path.as_ref()).load()
    }

    /// Turns raw font bytes into a usable face
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        FontSource::bytes("memory", data).load()
    }

    pub(crate) fn from_parts(
        data: Arc<[u8]>,
        face_index: u32,
        fingerprint: u64,
        name: String,
    ) -> Result<Self> {
        let font_ref = ReadFontRef::from_index(&data, face_index)
            .map_err(|e| FontLoadError::InvalidData(format!("{}: {}", name, e)))?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .unwrap_or(1000);

        Ok(Font {
            data,
            face_index,
            units_per_em,
            fingerprint,
            name,
        })
    }

    fn font_ref(&self) -> Option<ReadFontRef<'_>> {
        ReadFontRef::from_index(&self.data, self.face_index).ok()
    }

    /// Label of the source this face came from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the source bytes; changes when the source changes
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Shared handle to the raw bytes
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Finds which glyph draws this character
    pub fn glyph_id(&self, ch: char) -> Option<u32> {
        self.font_ref()
            .and_then(|font| font.cmap().ok()?.map_codepoint(ch).map(|gid| gid.to_u32()))
            .filter(|gid| *gid != 0)
    }

    /// True when every non-control character of `text` maps to a glyph
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_control() && !is_default_ignorable(*c))
            .all(|c| self.glyph_id(c).is_some())
    }

    /// Horizontal advance in font units
    pub fn advance_width(&self, glyph_id: u32) -> f32 {
        self.font_ref()
            .and_then(|font| {
                let hmtx = font.hmtx().ok()?;
                let advance = hmtx.advance(read_fonts::types::GlyphId::new(glyph_id))?;
                Some(advance as f32)
            })
            .unwrap_or(self.units_per_em as f32 / 2.0)
    }

    /// Ascender in pixels at `size`
    pub fn ascent(&self, size: f32) -> f32 {
        self.font_ref()
            .map(|font| font.metrics(Size::new(size), LocationRef::default()).ascent)
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(size * 0.75)
    }

    pub fn glyph_count(&self) -> Option<u32> {
        self.font_ref()
            .and_then(|font| font.maxp().ok().map(|maxp| maxp.num_glyphs() as u32))
    }

    /// Which color tables this face carries
    pub fn color_support(&self) -> ColorSupport {
        let Some(font) = self.font_ref() else {
            return ColorSupport::default();
        };
        let has = |tag: &[u8; 4]| font.table_data(Tag::new(tag)).is_some();
        ColorSupport {
            bitmap: has(b"CBDT") || has(b"sbix"),
            colr: has(b"COLR"),
            svg: has(b"SVG "),
        }
    }
}

/// Joiners and selectors that fonts routinely leave out of the cmap
fn is_default_ignorable(c: char) -> bool {
    matches!(c, '\u{200D}' | '\u{FE00}'..='\u{FE0F}' | '\u{E0020}'..='\u{E007F}')
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl BoxfitFontRef for Font {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        self.glyph_id(ch)
    }

    fn advance_width(&self, glyph_id: u32) -> f32 {
        self.advance_width(glyph_id)
    }

    fn face_index(&self) -> u32 {
        self.face_index
    }

    fn ascent(&self, size: f32) -> f32 {
        self.ascent(size)
    }

    fn cache_id(&self) -> u64 {
        self.fingerprint ^ (self.face_index as u64).rotate_left(48)
    }
}
