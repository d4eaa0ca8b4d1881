//! Pixel operations on the target image
//!
//! The target is straight-alpha RGBA8. Every write goes through
//! [`blend`], a source-over with a coverage factor, so text edges, emoji
//! and the banner all mix with what is already there. Anything outside
//! the image is dropped silently.

use image::RgbaImage;

use boxfit_core::{Color, Rect};

/// The whole image as a rectangle
pub fn bounds(image: &RgbaImage) -> Rect {
    Rect::new(0, 0, image.width(), image.height())
}

/// Source-over of `color` at `coverage` onto one pixel
pub fn blend(image: &mut RgbaImage, x: i32, y: i32, color: Color, coverage: u8) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    let src_a = color.a as u32 * coverage as u32 / 255;
    if src_a == 0 {
        return;
    }
    let px = image.get_pixel_mut(x as u32, y as u32);
    px.0 = over(px.0, [color.r, color.g, color.b, src_a as u8]);
}

/// Porter-Duff source-over for straight alpha, integer only so output is
/// the same on every platform
fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    let da = dst[3] as u32;
    // dst weight, scaled by 255
    let dw = da * (255 - sa) / 255;
    let out_a = sa + dw;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let mix = |s: u8, d: u8| ((s as u32 * sa + d as u32 * dw + out_a / 2) / out_a) as u8;
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_a.min(255) as u8,
    ]
}

pub fn fill_rect(image: &mut RgbaImage, rect: Rect, color: Color) {
    let Some(clip) = rect.intersect(&bounds(image)) else {
        return;
    };
    for y in clip.top()..clip.bottom() {
        for x in clip.left()..clip.right() {
            blend(image, x, y, color, 255);
        }
    }
}

/// Outline drawn inside `rect`, `width` pixels thick
pub fn stroke_rect(image: &mut RgbaImage, rect: Rect, color: Color, width: u32) {
    let w = width.min(rect.width / 2 + 1).min(rect.height / 2 + 1).max(1);
    let inner_h = rect.height.saturating_sub(2 * w);
    let edges = [
        Rect::new(rect.x, rect.y, rect.width, w),
        Rect::new(rect.x, rect.bottom() - w as i32, rect.width, w),
        Rect::new(rect.x, rect.y + w as i32, w, inner_h),
        Rect::new(rect.right() - w as i32, rect.y + w as i32, w, inner_h),
    ];
    for edge in edges {
        if edge.width > 0 && edge.height > 0 {
            fill_rect(image, edge, color);
        }
    }
}

/// Color a coverage mask whose top-left pixel lands at `(x, y)`
pub fn fill_mask(image: &mut RgbaImage, mask: &tiny_skia::Mask, x: i32, y: i32, color: Color) {
    let (w, h) = (mask.width(), mask.height());
    let data = mask.data();
    for my in 0..h {
        let row = &data[(my * w) as usize..((my + 1) * w) as usize];
        for (mx, &coverage) in row.iter().enumerate() {
            if coverage != 0 {
                blend(image, x + mx as i32, y + my as i32, color, coverage);
            }
        }
    }
}

/// Straight-alpha `src` over the image with its top-left at `(x, y)`
pub fn blit(image: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    for (sx, sy, px) in src.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        if a != 0 {
            blend(image, x + sx as i32, y + sy as i32, Color::rgba(r, g, b, a), 255);
        }
    }
}
