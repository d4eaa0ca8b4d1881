//! Embedded bitmap strikes (sbix, CBDT/CBLC)
//!
//! A strike glyph is decoded at its native ppem and kept as a premultiplied
//! pixmap together with the scale that brings it to the working size and
//! the position of its top-left corner relative to the pen on the baseline.

use skrifa::bitmap::{BitmapData, BitmapFormat, BitmapStrikes, Origin};
use skrifa::instance::Size;
use skrifa::raw::TableProvider;
use skrifa::GlyphId;
use tiny_skia::{IntSize, Pixmap};

/// sbix strikes with no vertical bearing sit this many font units up
const SBIX_BASELINE_UNITS: f32 = 100.0;

/// A decoded strike glyph, not yet scaled
pub(crate) struct StrikeGlyph {
    pub pixmap: Pixmap,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Left edge relative to the pen, working pixels
    pub left: f32,
    /// Top edge relative to the baseline, working pixels, y down
    pub top: f32,
}

impl StrikeGlyph {
    pub fn width(&self) -> f32 {
        self.pixmap.width() as f32 * self.scale_x
    }

    pub fn height(&self) -> f32 {
        self.pixmap.height() as f32 * self.scale_y
    }
}

/// Best strike glyph for `size` working pixels, if the face has strikes
pub(crate) fn strike_glyph(
    font: &skrifa::FontRef<'_>,
    glyph_id: GlyphId,
    size: f32,
) -> Option<StrikeGlyph> {
    let strikes = BitmapStrikes::new(font);
    if strikes.is_empty() {
        return None;
    }
    let glyph = strikes.glyph_for_size(Size::new(size), glyph_id)?;
    let pixmap = match &glyph.data {
        BitmapData::Png(data) => decode_png(data),
        BitmapData::Bgra(data) => decode_bgra(data, glyph.width, glyph.height),
        BitmapData::Mask(mask) if mask.bpp == 8 => decode_mask(mask.data, glyph.width, glyph.height),
        BitmapData::Mask(mask) => {
            log::debug!("{}-bit mask strikes are not supported", mask.bpp);
            None
        },
    }?;

    if glyph.ppem_x <= 0.0 || glyph.ppem_y <= 0.0 {
        return None;
    }
    let scale_x = size / glyph.ppem_x;
    let scale_y = size / glyph.ppem_y;

    let bearing_y = if glyph.bearing_y == 0.0 && strikes.format() == Some(BitmapFormat::Sbix) {
        let upem = font
            .head()
            .map(|h| h.units_per_em() as f32)
            .unwrap_or(1000.0);
        SBIX_BASELINE_UNITS * size / upem
    } else {
        glyph.bearing_y * scale_y
    };
    let left = glyph.bearing_x * scale_x - glyph.inner_bearing_x * scale_x;
    // distance of the top edge above the baseline
    let above = match glyph.placement_origin {
        Origin::TopLeft => bearing_y - glyph.inner_bearing_y * scale_y,
        Origin::BottomLeft => {
            bearing_y - glyph.inner_bearing_y * scale_y + pixmap.height() as f32 * scale_y
        },
    };

    Some(StrikeGlyph {
        pixmap,
        scale_x,
        scale_y,
        left,
        top: -above,
    })
}

fn pixmap_from(rgba: Vec<u8>, width: u32, height: u32) -> Option<Pixmap> {
    Pixmap::from_vec(rgba, IntSize::from_wh(width, height)?)
}

fn premultiply(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    [mul(r), mul(g), mul(b), a]
}

pub(crate) fn decode_png(data: &[u8]) -> Option<Pixmap> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| log::debug!("strike PNG header: {}", e))
        .ok()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| log::debug!("strike PNG frame: {}", e))
        .ok()?;
    let buf = &buf[..info.buffer_size()];

    let mut rgba = Vec::with_capacity(info.width as usize * info.height as usize * 4);
    match info.color_type {
        png::ColorType::Rgba => {
            for px in buf.chunks_exact(4) {
                rgba.extend_from_slice(&premultiply(px[0], px[1], px[2], px[3]));
            }
        },
        png::ColorType::Rgb => {
            for px in buf.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        },
        png::ColorType::GrayscaleAlpha => {
            for px in buf.chunks_exact(2) {
                rgba.extend_from_slice(&premultiply(px[0], px[0], px[0], px[1]));
            }
        },
        png::ColorType::Grayscale => {
            for &g in buf {
                rgba.extend_from_slice(&[g, g, g, 255]);
            }
        },
        png::ColorType::Indexed => {
            log::debug!("indexed strike PNG survived expansion");
            return None;
        },
    }
    pixmap_from(rgba, info.width, info.height)
}

/// BGRA strikes are stored premultiplied already
fn decode_bgra(data: &[u8], width: u32, height: u32) -> Option<Pixmap> {
    let rgba = data
        .chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0], px[3]])
        .collect();
    pixmap_from(rgba, width, height)
}

fn decode_mask(data: &[u8], width: u32, height: u32) -> Option<Pixmap> {
    let rgba = data.iter().flat_map(|&a| [0, 0, 0, a]).collect();
    pixmap_from(rgba, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn rgba_png_is_premultiplied() {
        let png = encode_png(1, 1, png::ColorType::Rgba, &[255, 0, 0, 128]);
        let pixmap = decode_png(&png).unwrap();
        assert_eq!(pixmap.data(), &[128, 0, 0, 128]);
    }

    #[test]
    fn gray_png_becomes_opaque_rgba() {
        let png = encode_png(2, 1, png::ColorType::Grayscale, &[10, 200]);
        let pixmap = decode_png(&png).unwrap();
        assert_eq!(pixmap.data(), &[10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn garbage_png_is_rejected() {
        assert!(decode_png(b"not a png").is_none());
    }

    #[test]
    fn bgra_swaps_channels() {
        let pixmap = decode_bgra(&[1, 2, 3, 4], 1, 1).unwrap();
        assert_eq!(pixmap.data(), &[3, 2, 1, 4]);
    }

    #[test]
    fn mask_is_black_coverage() {
        let pixmap = decode_mask(&[0, 255], 2, 1).unwrap();
        assert_eq!(pixmap.data(), &[0, 0, 0, 0, 0, 0, 0, 255]);
        assert!(decode_mask(&[1, 2, 3], 2, 2).is_none());
    }
}
