//! COLR painting onto a tiny-skia canvas
//!
//! skrifa walks the paint graph and calls back into [`ColrPainter`]; each
//! callback maps onto a tiny-skia primitive. Glyph clips are built in font
//! units and placed with the current transform, so the caller only has to
//! seed the stack with the font-to-canvas mapping.

use skrifa::color::{Brush, ColorPainter, ColorStop, CompositeMode, Extend, Transform};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::raw::types::BoundingBox;
use skrifa::{GlyphId, MetadataProvider};
use tiny_skia::{
    BlendMode, Color, FillRule, GradientStop, LinearGradient, Mask, Paint, PathBuilder, Pixmap,
    PixmapPaint, Point, RadialGradient, Rect, SpreadMode,
};

/// Palette index COLR uses for "the current text color"
const FOREGROUND_INDEX: u16 = 0xFFFF;

/// Collects skrifa outline commands into a tiny-skia path
pub struct PathPen {
    builder: PathBuilder,
}

impl PathPen {
    pub fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    /// `None` when the glyph drew nothing
    pub fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl Default for PathPen {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlinePen for PathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.builder.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.builder.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Outline of `glyph_id` at `size`, y up; `Size::unscaled()` gives font units
pub fn glyph_path(
    font: &skrifa::FontRef<'_>,
    glyph_id: GlyphId,
    size: Size,
) -> Option<tiny_skia::Path> {
    let outlines = font.outline_glyphs();
    let outline = outlines.get(glyph_id)?;
    let mut pen = PathPen::new();
    outline
        .draw(DrawSettings::unhinted(size, LocationRef::default()), &mut pen)
        .ok()?;
    pen.finish()
}

struct Layer {
    pixmap: Pixmap,
    mode: CompositeMode,
}

/// Paints one color glyph onto a pixmap
pub(crate) struct ColrPainter<'a> {
    target: &'a mut Pixmap,
    font: &'a skrifa::FontRef<'a>,
    palette: &'a [skrifa::color::Color],
    transforms: Vec<tiny_skia::Transform>,
    /// Each entry is already intersected with the one below it
    clips: Vec<Option<Mask>>,
    layers: Vec<Layer>,
}

impl<'a> ColrPainter<'a> {
    /// `base` maps font units onto the canvas
    pub(crate) fn new(
        target: &'a mut Pixmap,
        font: &'a skrifa::FontRef<'a>,
        palette: &'a [skrifa::color::Color],
        base: tiny_skia::Transform,
    ) -> Self {
        Self {
            target,
            font,
            palette,
            transforms: vec![base],
            clips: Vec::new(),
            layers: Vec::new(),
        }
    }

    fn transform(&self) -> tiny_skia::Transform {
        self.transforms
            .last()
            .copied()
            .unwrap_or_else(tiny_skia::Transform::identity)
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.target.width(), self.target.height())
    }

    fn color(&self, palette_index: u16, alpha: f32) -> Color {
        let alpha = alpha.clamp(0.0, 1.0);
        match self.palette.get(palette_index as usize) {
            Some(c) if palette_index != FOREGROUND_INDEX => {
                let a = (c.alpha as f32 / 255.0) * alpha;
                Color::from_rgba8(c.red, c.green, c.blue, (a * 255.0).round() as u8)
            },
            _ => Color::from_rgba8(0, 0, 0, (alpha * 255.0).round() as u8),
        }
    }

    fn stops(&self, stops: &[ColorStop]) -> Vec<GradientStop> {
        stops
            .iter()
            .map(|s| GradientStop::new(s.offset, self.color(s.palette_index, s.alpha)))
            .collect()
    }

    /// Narrow the current clip by `path` placed with the current transform
    fn push_clip_path(&mut self, path: Option<tiny_skia::Path>) {
        let (w, h) = self.canvas_size();
        let transform = self.transform();
        let parent = self.clips.last().and_then(Option::as_ref).cloned();
        let mask = match (path, parent) {
            (Some(path), Some(mut mask)) => {
                mask.intersect_path(&path, FillRule::Winding, true, transform);
                Some(mask)
            },
            (Some(path), None) => Mask::new(w, h).map(|mut mask| {
                mask.fill_path(&path, FillRule::Winding, true, transform);
                mask
            }),
            // an unusable clip hides everything beneath it
            (None, _) => Mask::new(w, h),
        };
        self.clips.push(mask);
    }

    fn fill_canvas(&mut self, paint: &Paint<'_>) {
        let (w, h) = self.canvas_size();
        let Some(rect) = Rect::from_xywh(0.0, 0.0, w as f32, h as f32) else {
            return;
        };
        let clip = self.clips.last().and_then(Option::as_ref);
        let target = match self.layers.last_mut() {
            Some(layer) => &mut layer.pixmap,
            None => &mut *self.target,
        };
        target.fill_rect(rect, paint, tiny_skia::Transform::identity(), clip);
    }
}

fn to_skia(t: Transform) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(t.xx, t.yx, t.xy, t.yy, t.dx, t.dy)
}

fn spread(extend: Extend) -> SpreadMode {
    match extend {
        Extend::Pad | Extend::Unknown => SpreadMode::Pad,
        Extend::Repeat => SpreadMode::Repeat,
        Extend::Reflect => SpreadMode::Reflect,
    }
}

fn blend_mode(mode: CompositeMode) -> BlendMode {
    match mode {
        CompositeMode::Clear => BlendMode::Clear,
        CompositeMode::Src => BlendMode::Source,
        CompositeMode::Dest => BlendMode::Destination,
        CompositeMode::SrcOver => BlendMode::SourceOver,
        CompositeMode::DestOver => BlendMode::DestinationOver,
        CompositeMode::SrcIn => BlendMode::SourceIn,
        CompositeMode::DestIn => BlendMode::DestinationIn,
        CompositeMode::SrcOut => BlendMode::SourceOut,
        CompositeMode::DestOut => BlendMode::DestinationOut,
        CompositeMode::SrcAtop => BlendMode::SourceAtop,
        CompositeMode::DestAtop => BlendMode::DestinationAtop,
        CompositeMode::Xor => BlendMode::Xor,
        CompositeMode::Plus => BlendMode::Plus,
        CompositeMode::Screen => BlendMode::Screen,
        CompositeMode::Overlay => BlendMode::Overlay,
        CompositeMode::Darken => BlendMode::Darken,
        CompositeMode::Lighten => BlendMode::Lighten,
        CompositeMode::ColorDodge => BlendMode::ColorDodge,
        CompositeMode::ColorBurn => BlendMode::ColorBurn,
        CompositeMode::HardLight => BlendMode::HardLight,
        CompositeMode::SoftLight => BlendMode::SoftLight,
        CompositeMode::Difference => BlendMode::Difference,
        CompositeMode::Exclusion => BlendMode::Exclusion,
        CompositeMode::Multiply => BlendMode::Multiply,
        CompositeMode::HslHue => BlendMode::Hue,
        CompositeMode::HslSaturation => BlendMode::Saturation,
        CompositeMode::HslColor => BlendMode::Color,
        CompositeMode::HslLuminosity => BlendMode::Luminosity,
        CompositeMode::Unknown => BlendMode::SourceOver,
    }
}

impl ColorPainter for ColrPainter<'_> {
    fn push_transform(&mut self, transform: Transform) {
        let next = self.transform().pre_concat(to_skia(transform));
        self.transforms.push(next);
    }

    fn pop_transform(&mut self) {
        if self.transforms.len() > 1 {
            self.transforms.pop();
        }
    }

    fn push_clip_glyph(&mut self, glyph_id: GlyphId) {
        let path = glyph_path(self.font, glyph_id, Size::unscaled());
        if path.is_none() {
            log::trace!("clip glyph {:?} has no outline", glyph_id);
        }
        self.push_clip_path(path);
    }

    fn push_clip_box(&mut self, clip_box: BoundingBox<f32>) {
        let path = Rect::from_ltrb(clip_box.x_min, clip_box.y_min, clip_box.x_max, clip_box.y_max)
            .map(PathBuilder::from_rect);
        self.push_clip_path(path);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }

    fn fill(&mut self, brush: Brush<'_>) {
        let transform = self.transform();
        let shader = match brush {
            Brush::Solid {
                palette_index,
                alpha,
            } => {
                let mut paint = Paint::default();
                paint.set_color(self.color(palette_index, alpha));
                paint.anti_alias = true;
                self.fill_canvas(&paint);
                return;
            },
            Brush::LinearGradient {
                p0,
                p1,
                color_stops,
                extend,
            } => LinearGradient::new(
                Point::from_xy(p0.x, p0.y),
                Point::from_xy(p1.x, p1.y),
                self.stops(color_stops),
                spread(extend),
                transform,
            ),
            Brush::RadialGradient {
                c0,
                r0,
                c1,
                r1,
                color_stops,
                extend,
            } => RadialGradient::new(
                Point::from_xy(c0.x, c0.y),
                Point::from_xy(c1.x, c1.y),
                // two-radius gradients collapse onto the outer circle
                r0.max(r1).max(0.001),
                self.stops(color_stops),
                spread(extend),
                transform,
            ),
            Brush::SweepGradient { color_stops, .. } => {
                // no sweep shader in tiny-skia; paint the middle stop
                let Some(stop) = color_stops.get(color_stops.len() / 2) else {
                    return;
                };
                let mut paint = Paint::default();
                paint.set_color(self.color(stop.palette_index, stop.alpha));
                paint.anti_alias = true;
                self.fill_canvas(&paint);
                return;
            },
        };
        if let Some(shader) = shader {
            let paint = Paint {
                shader,
                anti_alias: true,
                ..Default::default()
            };
            self.fill_canvas(&paint);
        }
    }

    fn push_layer(&mut self, mode: CompositeMode) {
        let (w, h) = self.canvas_size();
        if let Some(pixmap) = Pixmap::new(w, h) {
            self.layers.push(Layer { pixmap, mode });
        }
    }

    fn pop_layer(&mut self) {
        let Some(layer) = self.layers.pop() else {
            return;
        };
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: blend_mode(layer.mode),
            quality: tiny_skia::FilterQuality::Nearest,
        };
        let target = match self.layers.last_mut() {
            Some(parent) => &mut parent.pixmap,
            None => &mut *self.target,
        };
        target.draw_pixmap(
            0,
            0,
            layer.pixmap.as_ref(),
            &paint,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    fn pop_layer_with_mode(&mut self, mode: CompositeMode) {
        if let Some(layer) = self.layers.last_mut() {
            layer.mode = mode;
        }
        self.pop_layer();
    }
}
