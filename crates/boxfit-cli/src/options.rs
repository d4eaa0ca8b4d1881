//! Turning parsed arguments into overlay requests

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use boxfit::prelude::*;

use crate::cli::{ColorArgs, FontArgs, LayoutArgs, TextArgs};

pub fn parse_markup(s: &str) -> std::result::Result<MarkupMode, String> {
    MarkupMode::from_str(s).map_err(|e| e.to_string())
}

pub fn parse_align(s: &str) -> std::result::Result<HorizontalAlign, String> {
    HorizontalAlign::from_str(s).map_err(|e| e.to_string())
}

pub fn parse_valign(s: &str) -> std::result::Result<VerticalAlign, String> {
    VerticalAlign::from_str(s).map_err(|e| e.to_string())
}

/// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`
pub fn parse_color(s: &str) -> Result<Color> {
    let hex = s.trim().trim_start_matches('#');
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        bail!("Invalid color '{}': expected RRGGBB or RRGGBBAA", s);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .with_context(|| format!("Invalid color '{}'", s))
    };
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("Invalid size '{}': expected WIDTHxHEIGHT", s))?;
    let w: u32 = w.trim().parse().with_context(|| format!("Invalid width in '{}'", s))?;
    let h: u32 = h.trim().parse().with_context(|| format!("Invalid height in '{}'", s))?;
    if w == 0 || h == 0 {
        bail!("Canvas size must be positive, got {}x{}", w, h);
    }
    Ok((w, h))
}

impl TextArgs {
    /// The text from `--text`, `--text-file` or stdin, in that order
    pub fn read(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        let raw = match &self.text_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read text from {}", path.display()))?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read text from stdin")?;
                buf
            },
        };
        Ok(strip_final_newline(raw))
    }
}

fn strip_final_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

impl FontArgs {
    pub fn font_set(&self) -> FontSet {
        let mut fonts = FontSet::new();
        if let Some(path) = &self.font {
            fonts = fonts.with_regular(path.as_path());
        }
        if let Some(path) = &self.bold_font {
            fonts = fonts.with_bold(path.as_path());
        }
        if let Some(path) = &self.italic_font {
            fonts = fonts.with_italic(path.as_path());
        }
        if let Some(path) = &self.bold_italic_font {
            fonts = fonts.with_bold_italic(path.as_path());
        }
        for path in &self.fallback_fonts {
            fonts = fonts.with_fallback(path.as_path());
        }
        fonts
    }

    pub fn emoji_chain(&self) -> EmojiFontChain {
        let base = if self.no_system_emoji {
            EmojiFontChain::none()
        } else {
            EmojiFontChain::system()
        };
        self.emoji_fonts
            .iter()
            .fold(base, |chain, path| chain.with_bundled(path.as_path()))
    }

    pub fn overlay(&self) -> Result<Overlay> {
        let mut builder = Overlay::builder()
            .fonts(self.font_set())
            .emoji_fonts(self.emoji_chain());
        if self.no_system_fonts {
            builder = builder.without_system_defaults();
        }
        builder.build().context("Failed to set up the overlay")
    }
}

impl ColorArgs {
    pub fn palette(&self) -> Result<Palette> {
        let mut palette = match &self.color {
            Some(c) => Palette::uniform(parse_color(c)?),
            None => Palette::default(),
        };
        if let Some(c) = &self.bold_color {
            palette.bold = parse_color(c)?;
        }
        if let Some(c) = &self.italic_color {
            palette.italic = parse_color(c)?;
        }
        if let Some(c) = &self.hashtag_color {
            palette.hashtag = parse_color(c)?;
        }
        Ok(palette)
    }
}

impl LayoutArgs {
    pub fn text_box(&self) -> TextBox {
        TextBox::new(self.x, self.y, self.width, self.height).with_padding(self.padding)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            emoji_support: !self.no_emoji,
            hashtag_support: !self.no_hashtags,
            aggressive_scaling: !self.no_aggressive,
        }
    }

    pub fn frame(&self) -> Result<Option<BoxFrame>> {
        if !self.show_box && self.box_background.is_none() {
            return Ok(None);
        }
        let border = if self.show_box {
            parse_color(&self.box_color)?
        } else {
            Color::rgba(0, 0, 0, 0)
        };
        let background = self.box_background.as_deref().map(parse_color).transpose()?;
        Ok(Some(BoxFrame {
            border,
            border_width: if self.show_box { self.box_line_width } else { 0 },
            background,
        }))
    }

    pub fn request(&self, text: impl Into<String>, colors: &ColorArgs) -> Result<OverlayRequest> {
        let mut request = OverlayRequest::new(text)
            .with_markup(self.markup)
            .with_box(self.text_box())
            .with_max_font_size(self.max_font_size)
            .with_line_height_ratio(self.line_height)
            .with_alignment(self.align, self.valign)
            .with_palette(colors.palette()?)
            .with_capabilities(self.capabilities())
            .with_error_banner(!self.no_banner);
        if let Some(frame) = self.frame()? {
            request = request.with_frame(frame);
        }
        Ok(request)
    }
}

/// Open `path` as RGBA, or make a blank canvas
pub fn load_canvas(path: Option<&Path>, size: &str, background: &str) -> Result<image::RgbaImage> {
    match path {
        Some(path) => Ok(image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?
            .to_rgba8()),
        None => {
            let (w, h) = parse_size(size)?;
            let c = parse_color(background)?;
            Ok(image::RgbaImage::from_pixel(w, h, image::Rgba([c.r, c.g, c.b, c.a])))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Layout {
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        colors: ColorArgs,
    }

    #[test]
    fn colors_in_both_lengths() {
        assert_eq!(parse_color("#FF8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(parse_color("0066cc80").unwrap(), Color::rgba(0, 0x66, 0xCC, 0x80));
        assert!(parse_color("fff").is_err());
        assert!(parse_color("GG0000").is_err());
        assert!(parse_color("ééé").is_err());
    }

    #[test]
    fn canvas_sizes() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert_eq!(parse_size("10X20").unwrap(), (10, 20));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn final_newline_only() {
        assert_eq!(strip_final_newline("a\nb\n".into()), "a\nb");
        assert_eq!(strip_final_newline("a\r\n".into()), "a");
        assert_eq!(strip_final_newline("a\n\n".into()), "a\n");
    }

    #[test]
    fn layout_flags_reach_the_request() {
        let parsed = Layout::parse_from([
            "t", "-x", "-5", "-y", "10", "-W", "300", "-H", "120", "-p", "8", "-m", "rich",
            "--align", "left", "--valign", "bottom", "--no-emoji", "--no-banner", "--color",
            "112233", "--hashtag-color", "FF0000",
        ]);
        let req = parsed.layout.request("hi", &parsed.colors).unwrap();
        assert_eq!(req.text_box, TextBox::new(-5, 10, 300, 120).with_padding(8));
        assert_eq!(req.markup, MarkupMode::RichText);
        assert_eq!(req.align, HorizontalAlign::Left);
        assert_eq!(req.valign, VerticalAlign::Bottom);
        assert!(!req.capabilities.emoji_support);
        assert!(req.capabilities.hashtag_support);
        assert!(!req.show_error_banner);
        assert_eq!(req.palette.bold, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(req.palette.hashtag, Color::rgb(255, 0, 0));
        assert!(req.frame.is_none());
    }

    #[test]
    fn background_alone_gives_a_borderless_frame() {
        let parsed = Layout::parse_from(["t", "--box-background", "FFFFFF80"]);
        let frame = parsed.layout.frame().unwrap().unwrap();
        assert_eq!(frame.border_width, 0);
        assert_eq!(frame.background, Some(Color::rgba(255, 255, 255, 128)));

        let parsed = Layout::parse_from(["t", "--show-box", "--box-line-width", "5"]);
        let frame = parsed.layout.frame().unwrap().unwrap();
        assert_eq!(frame.border, Color::rgb(255, 0, 0));
        assert_eq!(frame.border_width, 5);
    }

    #[test]
    fn unknown_markup_is_rejected() {
        assert!(Layout::try_parse_from(["t", "-m", "latex"]).is_err());
        assert!(Layout::try_parse_from(["t", "-m", "markdown_extended"]).is_ok());
    }

    #[test]
    fn emoji_fonts_are_bundled_first() {
        let fonts = FontArgs {
            emoji_fonts: vec!["a.ttf".into(), "b.ttf".into()],
            no_system_emoji: true,
            ..FontArgs::default()
        };
        let chain = fonts.emoji_chain();
        assert_eq!(chain.bundled.len(), 2);
        assert!(chain.platform.is_empty());
    }
}
