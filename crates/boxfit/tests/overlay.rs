//! End-to-end renders against installed fonts; skipped when there are none.
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use boxfit::prelude::*;
use boxfit::fontdb::source::system_text_paths;
use image::{Rgba, RgbaImage};

fn system_overlay() -> Option<Overlay> {
    let regular = system_text_paths().into_iter().find(|p| p.is_file())?;
    Overlay::builder()
        .fonts(FontSet::new().with_regular(regular))
        .build()
        .ok()
}

fn white(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
}

fn ink_rows(img: &RgbaImage) -> (u32, u32) {
    let mut top = u32::MAX;
    let mut bottom = 0;
    for (_, y, p) in img.enumerate_pixels() {
        if p.0 != [255, 255, 255, 255] {
            top = top.min(y);
            bottom = bottom.max(y);
        }
    }
    (top, bottom)
}

#[test]
fn hello_world_fits_at_max_without_warnings() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut img = white(400, 200);
    let request = OverlayRequest::new("Hello **World**").with_box(TextBox::new(0, 0, 400, 200));
    let report = overlay.render(&mut img, &request).unwrap();
    assert_eq!(report.chosen_font_size, 30);
    assert_eq!(report.outcome, "fits");
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.processing_info(), "No issues detected");
    assert!(img.pixels().any(|p| p.0[0] < 100), "no dark text pixels");
}

#[test]
fn text_stays_inside_the_box() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut img = white(300, 300);
    let request = OverlayRequest::new("Some words that need to wrap over several lines")
        .with_box(TextBox::new(50, 60, 200, 120))
        .with_palette(Palette::uniform(Color::rgb(200, 0, 0)));
    overlay.render(&mut img, &request).unwrap();
    for (x, y, p) in img.enumerate_pixels() {
        if p.0 != [255, 255, 255, 255] {
            assert!((40..=260).contains(&x) && (50..=190).contains(&y), "ink at {},{}", x, y);
        }
    }
}

#[test]
fn vertical_alignment_moves_the_block() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let render = |valign| {
        let mut img = white(200, 300);
        let request = OverlayRequest::new("Hi")
            .with_box(TextBox::new(0, 0, 200, 300))
            .with_alignment(HorizontalAlign::Center, valign);
        overlay.render(&mut img, &request).unwrap();
        ink_rows(&img)
    };
    let top = render(VerticalAlign::Top);
    let middle = render(VerticalAlign::Middle);
    let bottom = render(VerticalAlign::Bottom);
    assert!(top.0 < middle.0 && middle.0 < bottom.0);
    assert!(top.0 < 40);
    assert!(bottom.1 < 300);
}

#[test]
fn renders_are_byte_identical() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let request = OverlayRequest::new("Same *input* __same__ ~~output~~ #always 😀")
        .with_box(TextBox::new(10, 10, 280, 180).with_padding(8));
    let mut a = white(300, 200);
    let mut b = white(300, 200);
    overlay.render(&mut a, &request).unwrap();
    overlay.render(&mut b, &request).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn tiny_box_scales_aggressively() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut img = white(50, 50);
    let request = OverlayRequest::new("a handful of words here").with_box(TextBox::new(0, 0, 10, 10));
    let report = overlay.render(&mut img, &request).unwrap();
    assert!(report.chosen_font_size < 6, "{:?}", report);
    assert_ne!(report.outcome, "fits");
}

#[test]
fn overflow_text_is_clipped_to_a_tiny_box() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let area = TextBox::new(20, 20, 6, 6);
    let mut img = white(40, 40);
    let request = OverlayRequest::new("far too many words for this box ".repeat(20))
        .with_box(area)
        .with_error_banner(false);
    let report = overlay.render(&mut img, &request).unwrap();
    assert!(!report.banner_drawn);
    for (x, y, p) in img.enumerate_pixels() {
        if p.0 != [255, 255, 255, 255] {
            assert!((20..26).contains(&x) && (20..26).contains(&y), "ink at {},{}", x, y);
        }
    }
}

#[test]
fn huge_text_walks_the_truncation_steps() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut img = white(60, 60);
    let text = "overflowing ".repeat(400);
    let request = OverlayRequest::new(text)
        .with_box(TextBox::new(0, 0, 20, 20))
        .with_max_font_size(12);
    let report = overlay.render(&mut img, &request).unwrap();
    let truncations: Vec<&String> = report
        .warnings
        .iter()
        .filter(|w| w.contains("runcat"))
        .collect();
    assert!(!truncations.is_empty(), "{:?}", report.warnings);
    assert!(matches!(report.outcome.as_str(), "truncated" | "fallback"));
    if report.outcome == "fallback" {
        assert!(report.banner_drawn);
    }
}

#[test]
fn batch_matches_single_renders() {
    let Some(overlay) = system_overlay() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let request = OverlayRequest::new("batch #two").with_box(TextBox::new(0, 0, 160, 80));
    let mut single = white(160, 80);
    overlay.render(&mut single, &request).unwrap();
    let mut batch = vec![white(160, 80); 3];
    for report in overlay.render_batch(&mut batch, &request) {
        assert_eq!(report.unwrap().detected_hashtags, vec!["#two"]);
    }
    assert!(batch.iter().all(|img| img == &single));
}

#[test]
fn missing_fonts_are_fatal() {
    let overlay = Overlay::builder()
        .fonts(FontSet::new().with_regular(Path::new("/nonexistent/font.ttf")))
        .emoji_fonts(EmojiFontChain::none())
        .without_system_defaults()
        .build()
        .unwrap();
    let mut img = white(10, 10);
    let err = overlay
        .render(&mut img, &OverlayRequest::new("text"))
        .unwrap_err();
    assert!(matches!(err, BoxfitError::FontUnavailable(_)), "{:?}", err);
}
