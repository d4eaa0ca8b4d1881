//! Shaping against a real face, when the machine has one.
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use boxfit_core::traits::TextShaper;
use boxfit_fontdb::{source::system_text_paths, Font};
use boxfit_shape_hr::HarfrustShaper;

fn load_system_font() -> Option<Font> {
    system_text_paths()
        .into_iter()
        .filter(|p| p.is_file())
        .find_map(|p| Font::from_file(p).ok())
}

#[test]
fn real_font_shapes_to_glyphs() {
    let Some(font) = load_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let shaper = HarfrustShaper::with_cache();

    let shaped = shaper.shape("Hello, World!", &font, 24.0).unwrap();
    assert!(shaped.glyphs.len() > 10);
    assert!(!shaped.has_missing_glyphs());
    assert!(shaped.advance_width > 0.0);
    assert!(shaped.glyphs.iter().all(|g| g.advance >= 0.0));
}

#[test]
fn width_grows_with_size_and_text() {
    let Some(font) = load_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let shaper = HarfrustShaper::new();

    let small = shaper.advance("boxfit", &font, 12.0).unwrap();
    let large = shaper.advance("boxfit", &font, 24.0).unwrap();
    let longer = shaper.advance("boxfit boxfit", &font, 12.0).unwrap();
    assert!(large > small);
    assert!(longer > small);
}
