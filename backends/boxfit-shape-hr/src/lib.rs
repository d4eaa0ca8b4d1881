//! Pure Rust text shaping backend using harfrust
//!
//! Harfrust is a pure Rust port of HarfBuzz. This backend shapes each text
//! chunk left to right and remembers the result per (text, face, size), so
//! the wrapper, the fitter and the compositor all see the same widths
//! without shaping a chunk twice.
//!
//! Fonts without bytes (synthetic test fonts) or with bytes harfrust cannot
//! parse are shaped one character at a time from the font's own advances.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use harfrust::{Direction, FontRef as HrFontRef, GlyphBuffer, ShaperData, UnicodeBuffer};
use moka::sync::Cache;

use boxfit_core::{
    error::Result,
    traits::{FontRef, TextShaper},
    types::{PositionedGlyph, ShapingResult},
};

/// Default number of shaped chunks kept around
pub const DEFAULT_CACHE_CAPACITY: u64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    text: String,
    font: u64,
    size_bits: u32,
}

/// Hit/miss counters of the shaping cache
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

impl ShapeCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Pure Rust text shaping powered by harfrust
pub struct HarfrustShaper {
    cache: Option<Cache<ShapeKey, Arc<ShapingResult>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HarfrustShaper {
    /// Shaper without a cache
    pub fn new() -> Self {
        Self {
            cache: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Shaper remembering up to [`DEFAULT_CACHE_CAPACITY`] results
    pub fn with_cache() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            cache: Some(Cache::new(capacity)),
            ..Self::new()
        }
    }

    /// `None` when caching is off
    pub fn cache_stats(&self) -> Option<ShapeCacheStats> {
        self.cache.as_ref().map(|c| {
            c.run_pending_tasks();
            ShapeCacheStats {
                entries: c.entry_count(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
            }
        })
    }

    /// One glyph per character from the font's advance table
    fn fallback_shape(text: &str, font: &dyn FontRef, size: f32) -> ShapingResult {
        let scale = size / font.units_per_em().max(1) as f32;
        let mut glyphs = Vec::new();
        let mut x = 0.0;

        for (cluster, ch) in text.char_indices() {
            let id = font.glyph_id(ch).unwrap_or(0);
            let advance = font.advance_width(id) * scale;
            glyphs.push(PositionedGlyph {
                id,
                x,
                y: 0.0,
                advance,
                cluster: cluster as u32,
            });
            x += advance;
        }

        ShapingResult {
            glyphs,
            advance_width: x,
        }
    }

    /// Positioned glyphs in pixels from harfrust's buffer
    fn extract_glyphs(buffer: &GlyphBuffer, size: f32, upem: u16) -> ShapingResult {
        let scale = size / upem.max(1) as f32;
        let mut glyphs = Vec::new();
        let mut x = 0.0;

        for (info, pos) in buffer.glyph_infos().iter().zip(buffer.glyph_positions()) {
            let advance = pos.x_advance as f32 * scale;
            glyphs.push(PositionedGlyph {
                id: info.glyph_id,
                x: x + pos.x_offset as f32 * scale,
                y: pos.y_offset as f32 * scale,
                advance,
                cluster: info.cluster,
            });
            x += advance;
        }

        ShapingResult {
            glyphs,
            advance_width: x,
        }
    }

    fn shape_uncached(text: &str, font: &dyn FontRef, size: f32) -> ShapingResult {
        let data = font.data();
        if data.is_empty() {
            return Self::fallback_shape(text, font, size);
        }
        let hr_font = match HrFontRef::from_index(data, font.face_index()) {
            Ok(f) => f,
            Err(e) => {
                log::debug!("harfrust could not parse font ({}), using advances", e);
                return Self::fallback_shape(text, font, size);
            },
        };

        let shaper_data = ShaperData::new(&hr_font);
        let shaper = shaper_data.shaper(&hr_font).point_size(Some(size)).build();

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(Direction::LeftToRight);

        let output = shaper.shape(buffer, &[]);
        Self::extract_glyphs(&output, size, font.units_per_em())
    }
}

impl Default for HarfrustShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HarfrustShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarfrustShaper")
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl TextShaper for HarfrustShaper {
    fn name(&self) -> &'static str {
        "Harfrust"
    }

    fn shape(&self, text: &str, font: &dyn FontRef, size: f32) -> Result<ShapingResult> {
        if text.is_empty() {
            return Ok(ShapingResult::default());
        }

        let Some(cache) = &self.cache else {
            return Ok(Self::shape_uncached(text, font, size));
        };

        let key = ShapeKey {
            text: text.to_string(),
            font: font.cache_id(),
            size_bits: size.to_bits(),
        };
        if let Some(hit) = cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit.as_ref().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let result = Arc::new(Self::shape_uncached(text, font, size));
        cache.insert(key, Arc::clone(&result));
        Ok(result.as_ref().clone())
    }

    fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            self.hits.store(0, Ordering::Relaxed);
            self.misses.store(0, Ordering::Relaxed);
        }
    }
}
