//! Picking the art for one glyph and measuring where it lands
//!
//! Bounds are in working pixels relative to the pen on the baseline, with
//! y growing downward, so `top` is negative for anything above the
//! baseline.

use skrifa::color::ColorPalettes;
use skrifa::instance::{LocationRef, Size};
use skrifa::raw::TableProvider;
use skrifa::{GlyphId, MetadataProvider};
use tiny_skia::{FillRule, Paint, Pixmap, PixmapPaint, Transform};

use crate::bitmap::{strike_glyph, StrikeGlyph};
use crate::paint::{glyph_path, ColrPainter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GlyphBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl GlyphBounds {
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Convert a y-up box scaled by `scale` into pen-relative y-down bounds
    fn from_y_up(x_min: f32, y_min: f32, x_max: f32, y_max: f32, scale: f32) -> Self {
        Self {
            left: x_min * scale,
            top: -y_max * scale,
            right: x_max * scale,
            bottom: -y_min * scale,
        }
    }
}

pub(crate) enum GlyphArt {
    Strike(StrikeGlyph),
    Colr { glyph_id: GlyphId, scale: f32 },
    Outline(tiny_skia::Path),
}

impl GlyphArt {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Strike(_) => "strike",
            Self::Colr { .. } => "colr",
            Self::Outline(_) => "outline",
        }
    }
}

/// A glyph ready to draw, with its ink box
pub(crate) struct PreparedGlyph {
    pub art: GlyphArt,
    pub bounds: GlyphBounds,
}

fn units_per_em(font: &skrifa::FontRef<'_>) -> f32 {
    font.head()
        .map(|h| h.units_per_em() as f32)
        .unwrap_or(1000.0)
}

/// Find the art for `glyph_id` at `size` working pixels
///
/// Strikes win over COLR, COLR over a plain outline. `None` when the
/// glyph has nothing visible.
pub(crate) fn prepare(
    font: &skrifa::FontRef<'_>,
    glyph_id: u32,
    size: f32,
) -> Option<PreparedGlyph> {
    let gid = GlyphId::new(glyph_id);

    if let Some(strike) = strike_glyph(font, gid, size) {
        let bounds = GlyphBounds {
            left: strike.left,
            top: strike.top,
            right: strike.left + strike.width(),
            bottom: strike.top + strike.height(),
        };
        return Some(PreparedGlyph {
            art: GlyphArt::Strike(strike),
            bounds,
        })
        .filter(|g| g.bounds.area() > 0.0);
    }

    if let Some(color) = font.color_glyphs().get(gid) {
        let scale = size / units_per_em(font);
        let bounds = color
            .bounding_box(LocationRef::default(), Size::unscaled())
            .map(|b| GlyphBounds::from_y_up(b.x_min, b.y_min, b.x_max, b.y_max, scale))
            .or_else(|| {
                glyph_path(font, gid, Size::new(size)).map(|p| {
                    let b = p.bounds();
                    GlyphBounds::from_y_up(b.left(), b.top(), b.right(), b.bottom(), 1.0)
                })
            })
            .unwrap_or_else(|| em_box(font, gid, size));
        return Some(PreparedGlyph {
            art: GlyphArt::Colr {
                glyph_id: gid,
                scale,
            },
            bounds,
        })
        .filter(|g| g.bounds.area() > 0.0);
    }

    let path = glyph_path(font, gid, Size::new(size))?;
    let b = path.bounds();
    Some(PreparedGlyph {
        bounds: GlyphBounds::from_y_up(b.left(), b.top(), b.right(), b.bottom(), 1.0),
        art: GlyphArt::Outline(path),
    })
    .filter(|g| g.bounds.area() > 0.0)
}

/// Advance by ascent-to-descent, for color glyphs with no usable extent
fn em_box(font: &skrifa::FontRef<'_>, gid: GlyphId, size: f32) -> GlyphBounds {
    let metrics = font.metrics(Size::new(size), LocationRef::default());
    let advance = font
        .glyph_metrics(Size::new(size), LocationRef::default())
        .advance_width(gid)
        .unwrap_or(size);
    GlyphBounds {
        left: 0.0,
        top: -metrics.ascent,
        right: advance,
        bottom: -metrics.descent,
    }
}

impl PreparedGlyph {
    /// Draw with the pen at `(pen_x, baseline)` on the canvas
    pub fn draw(
        &self,
        font: &skrifa::FontRef<'_>,
        canvas: &mut Pixmap,
        pen_x: f32,
        baseline: f32,
    ) -> Option<()> {
        match &self.art {
            GlyphArt::Strike(strike) => {
                let paint = PixmapPaint {
                    quality: tiny_skia::FilterQuality::Bicubic,
                    ..Default::default()
                };
                let transform = Transform::from_scale(strike.scale_x, strike.scale_y)
                    .post_translate(pen_x + strike.left, baseline + strike.top);
                canvas.draw_pixmap(0, 0, strike.pixmap.as_ref(), &paint, transform, None);
            },
            GlyphArt::Colr { glyph_id, scale } => {
                let color = font.color_glyphs().get(*glyph_id)?;
                let palettes = ColorPalettes::new(font);
                let palette = palettes.get(0);
                let colors = palette.as_ref().map(|p| p.colors()).unwrap_or(&[]);
                let base = Transform::from_scale(*scale, -*scale).post_translate(pen_x, baseline);
                let mut painter = ColrPainter::new(canvas, font, colors, base);
                color
                    .paint(LocationRef::default(), &mut painter)
                    .map_err(|e| log::debug!("COLR paint of {:?} failed: {:?}", glyph_id, e))
                    .ok()?;
            },
            GlyphArt::Outline(path) => {
                let mut paint = Paint::default();
                paint.set_color_rgba8(0, 0, 0, 255);
                paint.anti_alias = true;
                let transform = Transform::from_scale(1.0, -1.0).post_translate(pen_x, baseline);
                canvas.fill_path(path, &paint, FillRule::Winding, transform, None);
            },
        }
        Some(())
    }
}
