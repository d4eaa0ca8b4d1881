//! Synthesis against real faces, skipped when the machine has none.
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use std::sync::Arc;

use boxfit_core::{traits::GlyphSynthesizer, FitConfig};
use boxfit_fontdb::{
    source::{platform_emoji_paths, system_text_paths},
    EmojiFontChain, Font, FontResolver, FontSet,
};
use boxfit_render_emoji::EmojiSynthesizer;
use boxfit_shape_hr::HarfrustShaper;

fn first_font(paths: Vec<std::path::PathBuf>) -> Option<Arc<Font>> {
    paths
        .into_iter()
        .filter(|p| p.is_file())
        .find_map(|p| Font::from_file(p).ok())
        .map(Arc::new)
}

fn synthesizer(font: Arc<Font>, config: &FitConfig) -> EmojiSynthesizer {
    EmojiSynthesizer::from_font(font, false, Arc::new(HarfrustShaper::with_cache()), config)
}

#[test]
fn outline_glyphs_become_padded_black_bitmaps() {
    let Some(font) = first_font(system_text_paths()) else {
        eprintln!("skipping: no system font found");
        return;
    };
    let config = FitConfig::default();
    let synth = synthesizer(font, &config);

    let bmp = synth.synthesize("W", 24).expect("W has an outline");
    assert!(bmp.width >= 24 && bmp.height >= 24);
    assert_eq!(bmp.pixels.len(), (bmp.width * bmp.height * 4) as usize);
    assert!(!bmp.ink.is_empty());
    // ink starts inside the padding, never on the canvas edge
    assert!(bmp.ink.left >= 1 && bmp.ink.top >= 1);
    assert!(bmp.ink.right < bmp.width && bmp.ink.bottom < bmp.height);
    // the canvas corner sits above and left of the pen
    assert!(bmp.origin.0 < 0 && bmp.origin.1 < 0);
    // every painted pixel is black
    assert!(bmp
        .pixels
        .chunks_exact(4)
        .filter(|p| p[3] > 200)
        .all(|p| p[0] < 40 && p[1] < 40 && p[2] < 40));
}

#[test]
fn missing_glyphs_give_none() {
    let Some(font) = first_font(system_text_paths()) else {
        eprintln!("skipping: no system font found");
        return;
    };
    let synth = synthesizer(font, &FitConfig::default());
    assert!(synth.synthesize("\u{10FFFD}", 24).is_none());
    assert!(synth.synthesize("W", 0).is_none());
    assert!(synth.cache_stats().size == 0);
}

#[test]
fn results_are_cached_per_sequence_and_size() {
    let Some(font) = first_font(system_text_paths()) else {
        eprintln!("skipping: no system font found");
        return;
    };
    let synth = synthesizer(font, &FitConfig::default());
    let a = synth.synthesize("W", 20).unwrap();
    let b = synth.synthesize("W", 20).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let c = synth.synthesize("W", 21).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    let stats = synth.cache_stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.hits, 1);

    synth.clear_cache();
    assert_eq!(synth.cache_stats().size, 0);
}

#[test]
fn zero_capacity_cache_still_synthesizes() {
    let Some(font) = first_font(system_text_paths()) else {
        eprintln!("skipping: no system font found");
        return;
    };
    let config = FitConfig {
        emoji_cache_capacity: Some(0),
        ..FitConfig::default()
    };
    let synth = synthesizer(font, &config);
    let a = synth.synthesize("W", 20).unwrap();
    let b = synth.synthesize("W", 20).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a, b);
    assert_eq!(synth.cache_stats().size, 0);
}

#[test]
fn output_is_deterministic() {
    let Some(font) = first_font(system_text_paths()) else {
        eprintln!("skipping: no system font found");
        return;
    };
    let config = FitConfig::default();
    let one = synthesizer(Arc::clone(&font), &config).synthesize("Q", 31).unwrap();
    let two = synthesizer(font, &config).synthesize("Q", 31).unwrap();
    assert_eq!(one, two);
}

#[test]
fn color_emoji_render_in_color() {
    let Some(font) = first_font(platform_emoji_paths()) else {
        eprintln!("skipping: no emoji font found");
        return;
    };
    if !font.color_support().renders_color() {
        eprintln!("skipping: emoji font has no color tables");
        return;
    }
    let synth = synthesizer(font, &FitConfig::default());
    for sequence in ["😀", "🇯🇵", "👍🏽"] {
        let Some(bmp) = synth.synthesize(sequence, 32) else {
            eprintln!("skipping {}: not in this font", sequence);
            continue;
        };
        assert!(bmp.width >= 32 && bmp.height >= 32);
        let colored = bmp
            .pixels
            .chunks_exact(4)
            .filter(|p| p[3] > 0 && (p[0] != p[1] || p[1] != p[2]))
            .count();
        assert!(colored > 0, "{} drew no color", sequence);
    }
}

#[test]
fn resolved_emoji_face_feeds_the_synthesizer() {
    let resolver = FontResolver::new(FontSet::new()).with_emoji_chain(EmojiFontChain::system());
    let Ok(emoji) = resolver.resolve_emoji() else {
        eprintln!("skipping: no emoji or text face found");
        return;
    };
    let synth = EmojiSynthesizer::new(
        &emoji,
        Arc::new(HarfrustShaper::new()),
        &FitConfig::default(),
    );
    assert_eq!(synth.renders_color(), emoji.renders_color);
}
