//! Font-free doubles for compositor and overlay tests

use std::sync::Arc;

use boxfit_core::{
    error::Result,
    traits::{FontProvider, FontRef, GlyphSynthesizer},
    EmojiBitmap, StyleVariant,
};
use boxfit_layout::Measurer;
use boxfit_shape_hr::HarfrustShaper;

/// Every glyph is `advance` units on a 1000-unit grid, with no outlines
pub struct TestFont {
    pub advance: f32,
}

impl FontRef for TestFont {
    fn data(&self) -> &[u8] {
        &[]
    }

    fn units_per_em(&self) -> u16 {
        1000
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        Some(ch as u32)
    }

    fn advance_width(&self, _: u32) -> f32 {
        self.advance
    }
}

pub struct TestFonts(pub Arc<TestFont>);

impl FontProvider for TestFonts {
    fn font_for(&self, _: StyleVariant, _: u32) -> Result<Arc<dyn FontRef>> {
        let font: Arc<dyn FontRef> = self.0.clone();
        Ok(font)
    }
}

pub fn fixed_measurer(advance: f32) -> Measurer {
    Measurer::new(
        Arc::new(TestFonts(Arc::new(TestFont { advance }))),
        Arc::new(HarfrustShaper::new()),
    )
}

/// Paints every sequence as a solid square exactly `size` pixels wide,
/// inside a four-pixel transparent margin
pub struct SquareSynth {
    color: bool,
    refuse: bool,
}

impl SquareSynth {
    pub const PIXEL: [u8; 4] = [250, 180, 20, 255];
    const PAD: u32 = 4;

    pub fn color() -> Self {
        Self {
            color: true,
            refuse: false,
        }
    }

    pub fn monochrome() -> Self {
        Self {
            color: false,
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            color: true,
            refuse: true,
        }
    }
}

impl GlyphSynthesizer for SquareSynth {
    fn renders_color(&self) -> bool {
        self.color
    }

    fn synthesize(&self, _: &str, size: u32) -> Option<Arc<EmojiBitmap>> {
        if self.refuse || size == 0 {
            return None;
        }
        let side = size + 2 * Self::PAD;
        let mut pixels = vec![0; (side * side * 4) as usize];
        for y in Self::PAD..Self::PAD + size {
            for x in Self::PAD..Self::PAD + size {
                let i = ((y * side + x) * 4) as usize;
                pixels[i..i + 4].copy_from_slice(&Self::PIXEL);
            }
        }
        let ink = EmojiBitmap::measure_ink(side, side, &pixels);
        Some(Arc::new(EmojiBitmap {
            width: side,
            height: side,
            pixels,
            origin: (-(Self::PAD as i32), -((size + Self::PAD) as i32)),
            ink,
        }))
    }
}
