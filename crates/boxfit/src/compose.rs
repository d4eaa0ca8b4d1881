//! Drawing fitted lines onto the image
//!
//! The compositor takes a [`FitResult`] and the area it was fitted for
//! and paints every chunk in order:
//!
//! - text is shaped with the measurer's shaper, its outlines filled into a
//!   coverage mask and blended in the palette color
//! - emoji are synthesized at their chunk size, cropped to their ink and
//!   pinned inside the area horizontally and inside their line vertically
//! - underline and strike bars follow the chunk's advance
//!
//! The pen moves by each chunk's measured width, never by what was drawn,
//! so the picture matches the layout that was fitted.

use image::{imageops, imageops::FilterType, RgbaImage};
use skrifa::{instance::Size, GlyphId};
use tiny_skia::{FillRule, Mask, Transform};

use boxfit_core::{
    error::Result, traits::GlyphSynthesizer, Capabilities, Color, EmojiBitmap, HorizontalAlign,
    Palette, Rect, RunKind, Style, VerticalAlign,
};
use boxfit_layout::{FitOutcome, FitResult, LineChunk, Measurer, WrappedLine};
use boxfit_render_emoji::glyph_path;

use crate::banner::ErrorBanner;
use crate::canvas;

/// Outline and background painted behind the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxFrame {
    pub border: Color,
    pub border_width: u32,
    pub background: Option<Color>,
}

impl Default for BoxFrame {
    fn default() -> Self {
        Self {
            border: Color::rgb(255, 0, 0),
            border_width: 3,
            background: None,
        }
    }
}

/// How lines are placed and colored
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    pub align: HorizontalAlign,
    pub valign: VerticalAlign,
    pub palette: Palette,
    pub show_error_banner: bool,
    pub frame: Option<BoxFrame>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            align: HorizontalAlign::default(),
            valign: VerticalAlign::default(),
            palette: Palette::default(),
            show_error_banner: true,
            frame: None,
        }
    }
}

/// Where one emoji bitmap ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiPlacement {
    pub sequence: String,
    /// Pixels the bitmap covers
    pub rect: Rect,
    /// The line band it was clamped into
    pub line: Rect,
    /// True when it had to shrink to fit the box or line
    pub scaled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeOutput {
    pub placements: Vec<EmojiPlacement>,
    pub warnings: Vec<String>,
    pub banner_drawn: bool,
}

/// Paints fitted lines with one measurer and an optional emoji source
pub struct Compositor<'a> {
    measurer: &'a Measurer,
    synthesizer: Option<&'a dyn GlyphSynthesizer>,
    capabilities: Capabilities,
}

impl<'a> Compositor<'a> {
    pub fn new(
        measurer: &'a Measurer,
        synthesizer: Option<&'a dyn GlyphSynthesizer>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            measurer,
            synthesizer,
            capabilities,
        }
    }

    pub fn measurer(&self) -> &Measurer {
        self.measurer
    }

    /// Draw `fit` inside `area`
    ///
    /// When the fitter fell all the way back and the banner is enabled,
    /// the banner replaces the overflow line.
    pub fn compose(
        &self,
        image: &mut RgbaImage,
        fit: &FitResult,
        area: Rect,
        options: &ComposeOptions,
    ) -> Result<ComposeOutput> {
        let mut out = ComposeOutput::default();

        if let Some(frame) = options.frame {
            if let Some(bg) = frame.background {
                canvas::fill_rect(image, area, bg);
            }
            if frame.border_width > 0 {
                canvas::stroke_rect(image, area, frame.border, frame.border_width);
            }
        }

        if fit.outcome == FitOutcome::Fallback && options.show_error_banner {
            ErrorBanner::default().draw(self, image, area)?;
            out.banner_drawn = true;
            return Ok(out);
        }

        let slack = area.height as f32 - fit.total_text_height;
        let offset = match options.valign {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Middle => slack / 2.0,
            VerticalAlign::Bottom => slack,
        };
        let mut y = area.y as f32 + offset.max(0.0);

        for line in &fit.wrapped_lines {
            let band = line_band(area, y, line.height);
            if !line.is_empty() {
                self.draw_line(image, line, area, band, options, &mut out)?;
            }
            y += line.height;
        }
        Ok(out)
    }

    fn draw_line(
        &self,
        image: &mut RgbaImage,
        line: &WrappedLine,
        area: Rect,
        band: Rect,
        options: &ComposeOptions,
        out: &mut ComposeOutput,
    ) -> Result<()> {
        let slack = area.width as f32 - line.width;
        let offset = match options.align {
            HorizontalAlign::Left => 0.0,
            HorizontalAlign::Center => slack / 2.0,
            HorizontalAlign::Right => slack,
        };
        let mut pen = area.x as f32 + offset.max(0.0);
        let baseline = band.y as f32 + self.line_ascent(line)?;

        for chunk in &line.chunks {
            let color = options.palette.color_for(chunk.style.ink());
            match chunk.kind {
                RunKind::Emoji => self.draw_emoji(image, chunk, pen, baseline, area, band, color, out)?,
                RunKind::Text => {
                    if !chunk.is_space() {
                        self.draw_text(image, &chunk.text, chunk.style, chunk.size, pen, baseline, color, area)?;
                    }
                    self.decorate(image, chunk, pen, baseline, color);
                },
            }
            pen += chunk.width;
        }
        Ok(())
    }

    /// Tallest ascent among the line's chunks
    fn line_ascent(&self, line: &WrappedLine) -> Result<f32> {
        let mut ascent: f32 = 0.0;
        for chunk in &line.chunks {
            let font = self.measurer.font(chunk.style, chunk.size)?;
            ascent = ascent.max(font.ascent(chunk.size as f32));
        }
        Ok(ascent)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_emoji(
        &self,
        image: &mut RgbaImage,
        chunk: &LineChunk,
        pen: f32,
        baseline: f32,
        area: Rect,
        band: Rect,
        color: Color,
        out: &mut ComposeOutput,
    ) -> Result<()> {
        let synth = self
            .synthesizer
            .filter(|s| self.capabilities.emoji_support && s.renders_color());

        if let Some(synth) = synth {
            let placed = synth
                .synthesize(&chunk.text, chunk.size)
                .and_then(|bmp| place_emoji(image, &bmp, chunk, pen, baseline, area, band));
            if let Some(placement) = placed {
                out.placements.push(placement);
                return Ok(());
            }
            let warning = format!("Emoji could not be rendered: {}", chunk.text);
            if !out.warnings.contains(&warning) {
                log::warn!("{}", warning);
                out.warnings.push(warning);
            }
        }

        self.draw_text(image, &chunk.text, chunk.style, chunk.size, pen, baseline, color, area)
    }

    /// Fill the outlines of `text` with the pen on the baseline
    ///
    /// Nothing is painted outside `clip`. Fonts without data (synthetic
    /// test faces) draw nothing.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw_text(
        &self,
        image: &mut RgbaImage,
        text: &str,
        style: Style,
        size: u32,
        pen_x: f32,
        baseline: f32,
        color: Color,
        clip: Rect,
    ) -> Result<()> {
        if size == 0 || text.trim().is_empty() {
            return Ok(());
        }
        let font = self.measurer.font(style, size)?;
        let data = font.data();
        if data.is_empty() {
            return Ok(());
        }
        let face = match skrifa::FontRef::from_index(data, font.face_index()) {
            Ok(face) => face,
            Err(e) => {
                log::debug!("cannot read outlines for {:?}: {}", text, e);
                return Ok(());
            },
        };
        let shaped = self.measurer.shaper().shape(text, font.as_ref(), size as f32)?;

        // room for descenders and accents around the advance
        let reach = size as i32;
        let region = Rect::new(
            pen_x.floor() as i32 - reach,
            baseline.floor() as i32 - 2 * reach,
            shaped.advance_width.max(0.0).ceil() as u32 + 2 * size,
            3 * size,
        );
        let Some(clip) = region
            .intersect(&clip)
            .and_then(|r| r.intersect(&canvas::bounds(image)))
        else {
            return Ok(());
        };
        let Some(mut mask) = Mask::new(clip.width, clip.height) else {
            return Ok(());
        };

        let px = Size::new(size as f32);
        for g in &shaped.glyphs {
            let Some(path) = glyph_path(&face, GlyphId::new(g.id), px) else {
                continue;
            };
            let transform = Transform::from_scale(1.0, -1.0).post_translate(
                pen_x + g.x - clip.x as f32,
                baseline - g.y - clip.y as f32,
            );
            mask.fill_path(&path, FillRule::Winding, true, transform);
        }
        canvas::fill_mask(image, &mask, clip.x, clip.y, color);
        Ok(())
    }

    fn decorate(&self, image: &mut RgbaImage, chunk: &LineChunk, pen: f32, baseline: f32, color: Color) {
        let size = chunk.size as f32;
        let thickness = (chunk.size / 15).max(1);
        let width = chunk.width.round() as u32;
        if width == 0 {
            return;
        }
        let mut bar = |y: f32| {
            canvas::fill_rect(
                image,
                Rect::new(pen.round() as i32, y.round() as i32, width, thickness),
                color,
            )
        };
        if chunk.style.underline {
            bar(baseline + size / 10.0);
        }
        if chunk.style.strike {
            bar(baseline - size / 3.0);
        }
    }
}

/// The pixel rows a line occupies, never less than one
fn line_band(area: Rect, top: f32, height: f32) -> Rect {
    Rect::new(
        area.x,
        top.round() as i32,
        area.width,
        (height.floor() as u32).max(1),
    )
}

/// Crop to ink, shrink if needed, put the ink where the bitmap's origin
/// says it sits after the pen with its bottom on the baseline, then pin
/// inside the area and the line
fn place_emoji(
    image: &mut RgbaImage,
    bitmap: &EmojiBitmap,
    chunk: &LineChunk,
    pen: f32,
    baseline: f32,
    area: Rect,
    band: Rect,
) -> Option<EmojiPlacement> {
    let ink = bitmap.ink;
    if ink.is_empty() {
        return None;
    }
    let full = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())?;
    let sprite = imageops::crop_imm(&full, ink.left, ink.top, ink.width(), ink.height()).to_image();

    let (max_w, max_h) = (area.width.max(1), band.height.max(1));
    let (iw, ih) = sprite.dimensions();
    let scale = (max_w as f32 / iw as f32)
        .min(max_h as f32 / ih as f32)
        .min(1.0);
    let scaled = scale < 1.0;
    let sprite = if scaled {
        let w = ((iw as f32 * scale).floor() as u32).clamp(1, max_w);
        let h = ((ih as f32 * scale).floor() as u32).clamp(1, max_h);
        imageops::resize(&sprite, w, h, FilterType::Lanczos3)
    } else {
        sprite
    };

    let (w, h) = sprite.dimensions();
    let x = (pen + ink_offset(bitmap) as f32 * scale).round() as i32;
    let y = baseline.round() as i32 - h as i32;
    let x = x.min(area.right() - w as i32).max(area.left());
    let y = y.min(band.bottom() - h as i32).max(band.top());

    canvas::blit(image, &sprite, x, y);
    Some(EmojiPlacement {
        sequence: chunk.text.clone(),
        rect: Rect::new(x, y, w, h),
        line: band,
        scaled,
    })
}

/// Pen-relative left edge of the ink
fn ink_offset(bitmap: &EmojiBitmap) -> i32 {
    bitmap.origin.0 + bitmap.ink.left as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_measurer, SquareSynth};
    use boxfit_core::{FitConfig, InkRole, StyledRun};
    use boxfit_layout::{fit, FitParams};

    fn fit_runs(m: &Measurer, runs: &[StyledRun], area: Rect, max: u32) -> FitResult {
        fit(
            runs,
            m,
            FitParams::new(area.width, area.height, max),
            &FitConfig::default(),
            Capabilities::default(),
        )
        .unwrap()
    }

    fn compose_with(
        synth: &SquareSynth,
        runs: &[StyledRun],
        area: Rect,
        max: u32,
        options: &ComposeOptions,
    ) -> (RgbaImage, ComposeOutput) {
        let m = fixed_measurer(500.0);
        let result = fit_runs(&m, runs, area, max);
        let mut img = RgbaImage::new(area.right() as u32 + 10, area.bottom() as u32 + 10);
        let out = Compositor::new(&m, Some(synth), Capabilities::default())
            .compose(&mut img, &result, area, options)
            .unwrap();
        (img, out)
    }

    #[test]
    fn emoji_sits_on_its_line_inside_the_box() {
        let synth = SquareSynth::color();
        let area = Rect::new(5, 5, 50, 50);
        let runs = [StyledRun::emoji("😀", Style::PLAIN)];
        let (img, out) = compose_with(&synth, &runs, area, 30, &ComposeOptions::default());
        assert_eq!(out.placements.len(), 1);
        let p = &out.placements[0];
        assert!(area.contains_rect(&p.rect));
        assert!(p.line.top() <= p.rect.top() && p.rect.bottom() <= p.line.bottom());
        assert_eq!(p.rect.width, 30);
        let c = img.get_pixel((p.rect.x + 15) as u32, (p.rect.y + 15) as u32);
        assert_eq!(c.0, SquareSynth::PIXEL);
    }

    #[test]
    fn emoji_as_large_as_the_box_is_not_clipped() {
        let synth = SquareSynth::color();
        let area = Rect::new(0, 0, 40, 40);
        let runs = [StyledRun::emoji("🎉", Style::PLAIN)];
        let (_, out) = compose_with(&synth, &runs, area, 40, &ComposeOptions::default());
        for p in &out.placements {
            assert!(area.contains_rect(&p.rect), "{:?}", p);
            assert!(p.rect.bottom() <= p.line.bottom());
        }
    }

    #[test]
    fn emoji_ink_follows_the_bitmap_origin() {
        let mut bitmap = (*SquareSynth::color().synthesize("😀", 10).unwrap()).clone();
        let chunk = LineChunk {
            text: "😀".into(),
            style: Style::PLAIN,
            kind: RunKind::Emoji,
            size: 10,
            width: 14.0,
        };
        let area = Rect::new(0, 0, 60, 30);
        let band = Rect::new(0, 0, 60, 30);
        let mut img = RgbaImage::new(60, 30);

        let at_pen = place_emoji(&mut img, &bitmap, &chunk, 20.0, 20.0, area, band).unwrap();
        assert_eq!(at_pen.rect, Rect::new(20, 10, 10, 10));

        // a glyph with a 3px left bearing
        bitmap.origin.0 += 3;
        let shifted = place_emoji(&mut img, &bitmap, &chunk, 20.0, 20.0, area, band).unwrap();
        assert_eq!(shifted.rect.x, 23);

        // still pinned inside the area
        bitmap.origin.0 += 100;
        let pinned = place_emoji(&mut img, &bitmap, &chunk, 20.0, 20.0, area, band).unwrap();
        assert_eq!(pinned.rect.right(), area.right());
    }

    #[test]
    fn alignment_moves_the_line() {
        let synth = SquareSynth::color();
        let area = Rect::new(0, 0, 100, 40);
        let runs = [StyledRun::emoji("⭐", Style::PLAIN)];
        let at = |align| {
            let options = ComposeOptions {
                align,
                valign: VerticalAlign::Top,
                ..ComposeOptions::default()
            };
            compose_with(&synth, &runs, area, 20, &options).1.placements[0].rect
        };
        assert_eq!(at(HorizontalAlign::Left).x, 0);
        assert_eq!(at(HorizontalAlign::Center).x, 40);
        assert_eq!(at(HorizontalAlign::Right).x, 80);
    }

    #[test]
    fn monochrome_synthesizer_draws_text_instead() {
        let synth = SquareSynth::monochrome();
        let area = Rect::new(0, 0, 60, 60);
        let runs = [StyledRun::emoji("😀", Style::PLAIN)];
        let (img, out) = compose_with(&synth, &runs, area, 20, &ComposeOptions::default());
        assert!(out.placements.is_empty());
        assert!(out.warnings.is_empty());
        // the test face has no outlines, so nothing lands
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn failed_synthesis_warns_once_per_sequence() {
        let synth = SquareSynth::refusing();
        let area = Rect::new(0, 0, 200, 60);
        let runs = [
            StyledRun::emoji("😀", Style::PLAIN),
            StyledRun::plain(" "),
            StyledRun::emoji("😀", Style::PLAIN),
        ];
        let (_, out) = compose_with(&synth, &runs, area, 20, &ComposeOptions::default());
        assert_eq!(out.warnings, vec!["Emoji could not be rendered: 😀".to_string()]);
    }

    #[test]
    fn underline_spans_the_chunk_advance() {
        let synth = SquareSynth::color();
        let area = Rect::new(0, 0, 200, 40);
        let style = Style {
            underline: true,
            ..Style::PLAIN
        };
        let runs = [StyledRun::text("abcd", style)];
        let options = ComposeOptions {
            align: HorizontalAlign::Left,
            valign: VerticalAlign::Top,
            palette: Palette::uniform(Color::rgb(0, 128, 0)),
            ..ComposeOptions::default()
        };
        let (img, _) = compose_with(&synth, &runs, area, 20, &options);
        // 4 chars * 10px, baseline at 15, bar at 17
        assert_eq!(img.get_pixel(0, 17).0, [0, 128, 0, 255]);
        assert_eq!(img.get_pixel(39, 17).0, [0, 128, 0, 255]);
        assert_eq!(img.get_pixel(40, 17).0[3], 0);
        assert_eq!(img.get_pixel(10, 5).0[3], 0);
    }

    #[test]
    fn hashtag_ink_uses_the_hashtag_color() {
        let palette = Palette::default();
        assert_eq!(
            palette.color_for(Style::PLAIN.with_hashtag().ink()),
            palette.color_for(InkRole::Hashtag)
        );
    }

    #[test]
    fn banner_replaces_the_overflow_line() {
        let m = fixed_measurer(500.0);
        let area = Rect::new(10, 10, 80, 40);
        let mut result = fit_runs(&m, &[StyledRun::plain("x")], area, 10);
        result.outcome = FitOutcome::Fallback;
        let mut img = RgbaImage::new(100, 60);
        let out = Compositor::new(&m, None, Capabilities::default())
            .compose(&mut img, &result, area, &ComposeOptions::default())
            .unwrap();
        assert!(out.banner_drawn);
        assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(50, 30).0, [255, 200, 200, 180]);
        assert_eq!(img.get_pixel(5, 5).0[3], 0);

        let quiet = ComposeOptions {
            show_error_banner: false,
            ..ComposeOptions::default()
        };
        let mut img = RgbaImage::new(100, 60);
        let out = Compositor::new(&m, None, Capabilities::default())
            .compose(&mut img, &result, area, &quiet)
            .unwrap();
        assert!(!out.banner_drawn);
    }

    #[test]
    fn frame_outlines_the_area() {
        let synth = SquareSynth::color();
        let area = Rect::new(4, 4, 30, 30);
        let options = ComposeOptions {
            frame: Some(BoxFrame {
                border: Color::rgb(0, 0, 255),
                border_width: 2,
                background: Some(Color::white()),
            }),
            ..ComposeOptions::default()
        };
        let (img, _) = compose_with(&synth, &[], area, 10, &options);
        assert_eq!(img.get_pixel(4, 4).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(33, 20).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
    }

    #[test]
    fn emoji_support_off_skips_synthesis() {
        let synth = SquareSynth::color();
        let m = fixed_measurer(500.0);
        let area = Rect::new(0, 0, 50, 50);
        let result = fit_runs(&m, &[StyledRun::emoji("😀", Style::PLAIN)], area, 20);
        let mut img = RgbaImage::new(50, 50);
        let out = Compositor::new(&m, Some(&synth), Capabilities::basic())
            .compose(&mut img, &result, area, &ComposeOptions::default())
            .unwrap();
        assert!(out.placements.is_empty());
    }

    #[test]
    fn composing_is_deterministic() {
        let synth = SquareSynth::color();
        let area = Rect::new(3, 7, 120, 90);
        let runs = [
            StyledRun::plain("one "),
            StyledRun::emoji("🇯🇵", Style::PLAIN),
            StyledRun::plain(" two three"),
        ];
        let (a, _) = compose_with(&synth, &runs, area, 24, &ComposeOptions::default());
        let (b, _) = compose_with(&synth, &runs, area, 24, &ComposeOptions::default());
        assert_eq!(a.as_raw(), b.as_raw());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            #[test]
            fn emoji_never_leave_box_or_line(
                width in 10u32..200,
                height in 10u32..200,
                max in 4u32..80,
                count in 1usize..6,
                align in 0u8..3,
            ) {
                let synth = SquareSynth::color();
                let area = Rect::new(7, 3, width, height);
                let mut runs = Vec::new();
                for i in 0..count {
                    if i > 0 {
                        runs.push(StyledRun::plain(" word "));
                    }
                    runs.push(StyledRun::emoji("😀", Style::PLAIN));
                }
                let options = ComposeOptions {
                    align: [HorizontalAlign::Left, HorizontalAlign::Center, HorizontalAlign::Right][align as usize],
                    show_error_banner: false,
                    ..ComposeOptions::default()
                };
                let (_, out) = compose_with(&synth, &runs, area, max, &options);
                for p in &out.placements {
                    prop_assert!(p.rect.left() >= area.left() && p.rect.right() <= area.right(), "{:?}", p);
                    prop_assert!(p.rect.top() >= p.line.top() && p.rect.bottom() <= p.line.bottom(), "{:?}", p);
                }
            }
        }
    }
}
