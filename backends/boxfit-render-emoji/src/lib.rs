//! Emoji bitmaps for boxfit
//!
//! [`EmojiSynthesizer`] turns one emoji sequence into a padded RGBA bitmap
//! at an exact pixel size:
//!
//! 1. shape the sequence with the emoji face (ZWJ families and flags
//!    ligate into one glyph)
//! 2. pick the art for the glyph: an embedded strike, COLR layers, or the
//!    plain outline
//! 3. draw it on a supersampled canvas with padding around the ink
//! 4. downscale with a Lanczos3 filter and un-premultiply
//!
//! Finished bitmaps are cached per `(sequence, size)`. Anything that
//! cannot be drawn comes back as `None` and the caller draws the sequence
//! as text.
//!
//! [`glyph_path`] and [`PathPen`] are public so text drawing can share
//! the same outline extraction.

use std::sync::Arc;

use image::{imageops, imageops::FilterType, RgbaImage};
use thiserror::Error;
use tiny_skia::Pixmap;

use boxfit_core::{
    cache::{CacheStats, SharedCache},
    traits::{GlyphSynthesizer, TextShaper},
    BoxfitError, EmojiBitmap, FitConfig,
};
use boxfit_fontdb::{EmojiFont, Font};

mod bitmap;
mod glyph;
mod paint;

use glyph::PreparedGlyph;
pub use paint::{glyph_path, PathPen};

/// Why a sequence produced no bitmap
#[derive(Debug, Error)]
enum Miss {
    #[error("size is zero")]
    ZeroSize,
    #[error("font has no glyph for it")]
    Tofu,
    #[error("no glyph has visible art")]
    NoArt,
    #[error("emoji font could not be parsed")]
    Unparsable,
    #[error("canvas {0}x{1} could not be allocated")]
    Canvas(u32, u32),
    #[error("glyph art could not be painted")]
    Paint,
    #[error("nothing was painted")]
    EmptyInk,
    #[error(transparent)]
    Shaping(#[from] BoxfitError),
}

/// Renders emoji sequences from one face into cached bitmaps
pub struct EmojiSynthesizer {
    font: Arc<Font>,
    renders_color: bool,
    shaper: Arc<dyn TextShaper>,
    config: FitConfig,
    cache: SharedCache<(String, u32), EmojiBitmap>,
}

impl EmojiSynthesizer {
    /// Synthesizer for a resolved emoji face
    pub fn new(emoji: &EmojiFont, shaper: Arc<dyn TextShaper>, config: &FitConfig) -> Self {
        Self::from_font(Arc::clone(&emoji.font), emoji.renders_color, shaper, config)
    }

    /// Synthesizer for any face; `renders_color` is what
    /// [`GlyphSynthesizer::renders_color`] reports
    pub fn from_font(
        font: Arc<Font>,
        renders_color: bool,
        shaper: Arc<dyn TextShaper>,
        config: &FitConfig,
    ) -> Self {
        Self {
            font,
            renders_color,
            shaper,
            cache: SharedCache::with_capacity(config.emoji_cache_capacity),
            config: config.clone(),
        }
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn render(&self, sequence: &str, size: u32) -> Result<EmojiBitmap, Miss> {
        if size == 0 {
            return Err(Miss::ZeroSize);
        }
        let factor = self.config.supersample_factor.max(1);
        let working = size.saturating_mul(factor);

        let shaped = self
            .shaper
            .shape(sequence, self.font.as_ref(), working as f32)?;
        if shaped.glyphs.is_empty() || shaped.has_missing_glyphs() {
            return Err(Miss::Tofu);
        }

        let data = self.font.shared_data();
        let font = skrifa::FontRef::from_index(&data, self.font.face_index())
            .map_err(|_| Miss::Unparsable)?;

        let (chosen, dropped) = largest_glyph(
            shaped
                .glyphs
                .iter()
                .filter_map(|g| glyph::prepare(&font, g.id, working as f32)),
        );
        let chosen = chosen.ok_or(Miss::NoArt)?;
        if dropped > 0 {
            log::debug!(
                "emoji {:?} did not ligate, {} inked glyphs dropped",
                sequence,
                dropped
            );
        }

        let pad = self.config.emoji_padding(size) * factor;
        let layout = CanvasLayout::new(&chosen, working, pad, factor);
        let canvas = paint_canvas(&chosen, &font, layout, pad)?;
        let b = chosen.bounds;

        let (width, height, pixels) = downscale(canvas, factor).ok_or(Miss::EmptyInk)?;
        let ink = EmojiBitmap::measure_ink(width, height, &pixels);
        if ink.is_empty() {
            return Err(Miss::EmptyInk);
        }
        log::trace!(
            "synthesized {:?} at {}px from {} art ({}x{})",
            sequence,
            size,
            chosen.art.kind(),
            width,
            height
        );
        Ok(EmojiBitmap {
            width,
            height,
            pixels,
            origin: layout.origin(&b, pad, factor),
            ink,
        })
    }
}

/// Ligated sequences leave one glyph; otherwise the biggest one is the
/// picture. Also returns how many other inked glyphs were passed over.
fn largest_glyph(
    candidates: impl IntoIterator<Item = PreparedGlyph>,
) -> (Option<PreparedGlyph>, usize) {
    let mut chosen: Option<PreparedGlyph> = None;
    let mut seen: usize = 0;
    for candidate in candidates {
        seen += 1;
        if chosen
            .as_ref()
            .map_or(true, |best| candidate.bounds.area() > best.bounds.area())
        {
            chosen = Some(candidate);
        }
    }
    (chosen, seen.saturating_sub(1))
}

/// Draw `glyph` with its ink corner `pad` working pixels into a fresh canvas
fn paint_canvas(
    glyph: &PreparedGlyph,
    font: &skrifa::FontRef<'_>,
    layout: CanvasLayout,
    pad: u32,
) -> Result<Pixmap, Miss> {
    let mut canvas =
        Pixmap::new(layout.width, layout.height).ok_or(Miss::Canvas(layout.width, layout.height))?;
    let b = glyph.bounds;
    glyph
        .draw(font, &mut canvas, pad as f32 - b.left, pad as f32 - b.top)
        .ok_or(Miss::Paint)?;
    Ok(canvas)
}

/// Canvas dimensions at working scale, whole multiples of the factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CanvasLayout {
    width: u32,
    height: u32,
}

impl CanvasLayout {
    fn new(glyph: &PreparedGlyph, working: u32, pad: u32, factor: u32) -> Self {
        Self::for_bounds(
            glyph.bounds.width().ceil() as u32,
            glyph.bounds.height().ceil() as u32,
            working,
            pad,
            factor,
        )
    }

    fn for_bounds(content_w: u32, content_h: u32, working: u32, pad: u32, factor: u32) -> Self {
        let side = |content: u32| {
            let raw = content.saturating_add(pad * 2).max(working);
            raw.div_ceil(factor) * factor
        };
        Self {
            width: side(content_w),
            height: side(content_h),
        }
    }

    /// Canvas top-left relative to the pen on the baseline, final pixels
    fn origin(&self, bounds: &glyph::GlyphBounds, pad: u32, factor: u32) -> (i32, i32) {
        let f = factor as f32;
        (
            ((bounds.left - pad as f32) / f).floor() as i32,
            ((bounds.top - pad as f32) / f).floor() as i32,
        )
    }
}

/// Shrink a premultiplied canvas by `factor` and return straight RGBA
fn downscale(canvas: Pixmap, factor: u32) -> Option<(u32, u32, Vec<u8>)> {
    let (w, h) = (canvas.width(), canvas.height());
    let image = RgbaImage::from_raw(w, h, canvas.take())?;
    let image = if factor > 1 {
        imageops::resize(&image, (w / factor).max(1), (h / factor).max(1), FilterType::Lanczos3)
    } else {
        image
    };
    let (w, h) = image.dimensions();
    let mut pixels = image.into_raw();
    pixels.chunks_exact_mut(4).for_each(unpremultiply);
    Some((w, h, pixels))
}

/// Lanczos rings, so color is clamped to alpha before dividing
fn unpremultiply(px: &mut [u8]) {
    let a = px[3] as u32;
    if a == 0 {
        px[..3].fill(0);
        return;
    }
    for c in &mut px[..3] {
        let v = (*c as u32).min(a);
        *c = ((v * 255 + a / 2) / a) as u8;
    }
}

impl GlyphSynthesizer for EmojiSynthesizer {
    fn renders_color(&self) -> bool {
        self.renders_color
    }

    fn synthesize(&self, sequence: &str, size: u32) -> Option<Arc<EmojiBitmap>> {
        let key = (sequence.to_string(), size);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }
        match self.render(sequence, size) {
            Ok(bitmap) => Some(self.cache.insert(key, Arc::new(bitmap))),
            Err(miss) => {
                log::debug!(
                    "emoji {:?} at {}px not synthesized: {}",
                    sequence,
                    size,
                    miss
                );
                None
            },
        }
    }
}

impl std::fmt::Debug for EmojiSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiSynthesizer")
            .field("font", &self.font.name())
            .field("renders_color", &self.renders_color)
            .field("shaper", &self.shaper.name())
            .field("cached", &self.cache.len())
            .finish()
    }
}
