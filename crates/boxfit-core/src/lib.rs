//! boxfit core: the vocabulary shared by every stage of the overlay pipeline
//!
//! Text goes in with markup, comes out composited onto an image inside a
//! fixed box. Between those two points it passes through seven stages:
//!
//! 1. **Markup parsing** - raw text becomes styled runs
//! 2. **Scanning** - hashtags and emoji get split into their own runs
//! 3. **Font resolution** - a style variant and a pixel size map to a face
//! 4. **Wrapping** - runs are measured and broken into lines
//! 5. **Fitting** - the wrapper is retried at shrinking sizes until it fits
//! 6. **Emoji synthesis** - emoji become padded, super-sampled bitmaps
//! 7. **Composition** - lines are drawn onto the target image
//!
//! This crate holds the data that flows between those stages ([`types`]),
//! the traits that let backends plug in ([`traits`]), the tuning knobs
//! ([`config`]) and the cache used for long-lived shared state ([`cache`]).

pub mod cache;
pub mod config;
pub mod error;
pub mod traits;

pub use config::{Capabilities, FitConfig};
pub use error::{BoxfitError, Result};
pub use traits::{FontProvider, FontRef, GlyphSynthesizer, TextShaper};
pub use types::*;

/// The data structures that travel through the pipeline
pub mod types {
    use crate::error::BoxfitError;
    use std::str::FromStr;

    /// Unique identifier for a glyph within a font
    pub type GlyphId = u32;

    /// Style flags carried by a run
    ///
    /// Flags combine freely: a bold italic hashtag inside a header is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Style {
        pub bold: bool,
        pub italic: bool,
        pub underline: bool,
        pub strike: bool,
        pub hashtag: bool,
        /// Markdown header level (1..=3), if the run sits in a header line
        pub header_level: Option<u8>,
    }

    impl Style {
        pub const PLAIN: Style = Style {
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            hashtag: false,
            header_level: None,
        };

        pub const fn bold() -> Self {
            Self {
                bold: true,
                ..Self::PLAIN
            }
        }

        pub const fn italic() -> Self {
            Self {
                italic: true,
                ..Self::PLAIN
            }
        }

        pub fn is_plain(&self) -> bool {
            *self == Self::PLAIN
        }

        /// OR two flag sets together; the deeper header level wins
        pub fn union(self, other: Style) -> Style {
            Style {
                bold: self.bold || other.bold,
                italic: self.italic || other.italic,
                underline: self.underline || other.underline,
                strike: self.strike || other.strike,
                hashtag: self.hashtag || other.hashtag,
                header_level: match (self.header_level, other.header_level) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                },
            }
        }

        pub fn with_hashtag(self) -> Style {
            Style {
                hashtag: true,
                ..self
            }
        }

        /// Which face this style is drawn with
        pub fn variant(&self) -> StyleVariant {
            match (self.bold, self.italic) {
                (false, false) => StyleVariant::Regular,
                (true, false) => StyleVariant::Bold,
                (false, true) => StyleVariant::Italic,
                (true, true) => StyleVariant::BoldItalic,
            }
        }

        /// Which palette entry this style is painted with
        pub fn ink(&self) -> InkRole {
            match (self.hashtag, self.bold, self.italic) {
                (true, _, _) => InkRole::Hashtag,
                (false, true, _) => InkRole::Bold,
                (false, false, true) => InkRole::Italic,
                (false, false, false) => InkRole::Regular,
            }
        }

        /// Size multiplier applied on top of the line's base font size
        pub fn size_scale(&self) -> f32 {
            match self.header_level {
                Some(1) => 1.5,
                Some(2) => 1.3,
                Some(3) => 1.15,
                _ => 1.0,
            }
        }

        /// Pixel size of a chunk with this style at the given base size
        pub fn scaled_size(&self, base: u32) -> u32 {
            ((base as f32 * self.size_scale()).round() as u32).max(1)
        }
    }

    /// Font face selector
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StyleVariant {
        Regular,
        Bold,
        Italic,
        BoldItalic,
    }

    impl StyleVariant {
        pub const ALL: [StyleVariant; 4] = [
            StyleVariant::Regular,
            StyleVariant::Bold,
            StyleVariant::Italic,
            StyleVariant::BoldItalic,
        ];

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Regular => "regular",
                Self::Bold => "bold",
                Self::Italic => "italic",
                Self::BoldItalic => "bold-italic",
            }
        }
    }

    /// Color selector
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum InkRole {
        Hashtag,
        Bold,
        Italic,
        Regular,
    }

    /// What a run becomes when drawn
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum RunKind {
        Text,
        /// One atomic emoji sequence, drawn as an image
        Emoji,
    }

    /// A slice of text that shares one style
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StyledRun {
        pub text: String,
        pub style: Style,
        pub kind: RunKind,
    }

    impl StyledRun {
        pub fn text(text: impl Into<String>, style: Style) -> Self {
            Self {
                text: text.into(),
                style,
                kind: RunKind::Text,
            }
        }

        pub fn plain(text: impl Into<String>) -> Self {
            Self::text(text, Style::PLAIN)
        }

        pub fn emoji(sequence: impl Into<String>, style: Style) -> Self {
            Self {
                text: sequence.into(),
                style,
                kind: RunKind::Emoji,
            }
        }

        pub fn is_emoji(&self) -> bool {
            self.kind == RunKind::Emoji
        }
    }

    /// Which markup dialect the input text is written in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum MarkupMode {
        /// `<b>`, `<i>`, `<u>`, `<s>` tags
        RichText,
        /// `**bold**`, `*italic*`, `__underline__`, `~~strike~~`
        #[default]
        MarkdownBasic,
        /// Basic markdown plus `#`..`###` headers
        MarkdownHeaders,
        /// Headers plus list markers and `` `code` ``
        MarkdownExtended,
    }

    impl MarkupMode {
        pub fn headers(&self) -> bool {
            matches!(self, Self::MarkdownHeaders | Self::MarkdownExtended)
        }

        pub fn lists_and_code(&self) -> bool {
            matches!(self, Self::MarkdownExtended)
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::RichText => "rich",
                Self::MarkdownBasic => "basic",
                Self::MarkdownHeaders => "headers",
                Self::MarkdownExtended => "extended",
            }
        }
    }

    impl FromStr for MarkupMode {
        type Err = BoxfitError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "rich" | "rich_text" | "rich-text" => Ok(Self::RichText),
                "basic" | "markdown" | "markdown_basic" => Ok(Self::MarkdownBasic),
                "headers" | "with_headers" | "markdown_headers" => Ok(Self::MarkdownHeaders),
                "extended" | "markdown_extended" => Ok(Self::MarkdownExtended),
                other => Err(BoxfitError::ConfigError(format!(
                    "Unknown markup mode '{}'",
                    other
                ))),
            }
        }
    }

    /// Horizontal placement of each line inside the box
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum HorizontalAlign {
        Left,
        #[default]
        Center,
        Right,
    }

    impl FromStr for HorizontalAlign {
        type Err = BoxfitError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "left" => Ok(Self::Left),
                "center" | "centre" => Ok(Self::Center),
                "right" => Ok(Self::Right),
                other => Err(BoxfitError::ConfigError(format!(
                    "Unknown alignment '{}'",
                    other
                ))),
            }
        }
    }

    /// Vertical placement of the whole text block inside the box
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum VerticalAlign {
        Top,
        #[default]
        Middle,
        Bottom,
    }

    impl FromStr for VerticalAlign {
        type Err = BoxfitError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "top" => Ok(Self::Top),
                "middle" | "center" => Ok(Self::Middle),
                "bottom" => Ok(Self::Bottom),
                other => Err(BoxfitError::ConfigError(format!(
                    "Unknown vertical alignment '{}'",
                    other
                ))),
            }
        }
    }

    /// Axis-aligned pixel rectangle; may extend past the image
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rect {
        pub x: i32,
        pub y: i32,
        pub width: u32,
        pub height: u32,
    }

    impl Rect {
        pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
            Self {
                x,
                y,
                width,
                height,
            }
        }

        pub fn left(&self) -> i32 {
            self.x
        }

        pub fn top(&self) -> i32 {
            self.y
        }

        pub fn right(&self) -> i32 {
            self.x + self.width as i32
        }

        pub fn bottom(&self) -> i32 {
            self.y + self.height as i32
        }

        pub fn contains_rect(&self, other: &Rect) -> bool {
            other.left() >= self.left()
                && other.top() >= self.top()
                && other.right() <= self.right()
                && other.bottom() <= self.bottom()
        }

        /// Overlap of two rectangles, `None` when they do not touch
        pub fn intersect(&self, other: &Rect) -> Option<Rect> {
            let left = self.left().max(other.left());
            let top = self.top().max(other.top());
            let right = self.right().min(other.right());
            let bottom = self.bottom().min(other.bottom());
            (right > left && bottom > top).then(|| {
                Rect::new(left, top, (right - left) as u32, (bottom - top) as u32)
            })
        }
    }

    /// The text box on the target image, with inner padding
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextBox {
        pub x: i32,
        pub y: i32,
        pub width: u32,
        pub height: u32,
        pub padding: u32,
    }

    impl TextBox {
        pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
            Self {
                x,
                y,
                width,
                height,
                padding: 0,
            }
        }

        pub const fn with_padding(mut self, padding: u32) -> Self {
            self.padding = padding;
            self
        }

        pub fn outer(&self) -> Rect {
            Rect::new(self.x, self.y, self.width, self.height)
        }

        /// The area text is laid out in; never narrower than one pixel
        pub fn effective(&self) -> Rect {
            let inset = self.padding.saturating_mul(2);
            Rect::new(
                self.x + self.padding as i32,
                self.y + self.padding as i32,
                self.width.saturating_sub(inset).max(1),
                self.height.saturating_sub(inset).max(1),
            )
        }

        /// True when padding eats the whole box on either axis
        pub fn padding_collapses(&self) -> bool {
            let inset = self.padding.saturating_mul(2);
            inset >= self.width || inset >= self.height
        }
    }

    impl Default for TextBox {
        fn default() -> Self {
            Self::new(0, 0, 200, 200)
        }
    }

    /// Simple RGBA color
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Color {
        pub r: u8,
        pub g: u8,
        pub b: u8,
        pub a: u8,
    }

    impl Color {
        pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
            Self { r, g, b, a }
        }

        pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
            Self::rgba(r, g, b, 255)
        }

        pub const fn black() -> Self {
            Self::rgb(0, 0, 0)
        }

        pub const fn white() -> Self {
            Self::rgb(255, 255, 255)
        }
    }

    /// Text colors, one per [`InkRole`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Palette {
        pub regular: Color,
        pub bold: Color,
        pub italic: Color,
        pub hashtag: Color,
    }

    impl Palette {
        pub fn color_for(&self, role: InkRole) -> Color {
            match role {
                InkRole::Hashtag => self.hashtag,
                InkRole::Bold => self.bold,
                InkRole::Italic => self.italic,
                InkRole::Regular => self.regular,
            }
        }

        /// One color for all text, default hashtag blue
        pub fn uniform(color: Color) -> Self {
            Self {
                regular: color,
                bold: color,
                italic: color,
                ..Self::default()
            }
        }
    }

    impl Default for Palette {
        fn default() -> Self {
            Self {
                regular: Color::black(),
                bold: Color::black(),
                italic: Color::black(),
                hashtag: Color::rgb(0x00, 0x66, 0xCC),
            }
        }
    }

    /// A glyph that knows where it sits relative to the run origin
    #[derive(Debug, Clone, PartialEq)]
    pub struct PositionedGlyph {
        pub id: GlyphId,
        pub x: f32,
        pub y: f32,
        pub advance: f32,
        pub cluster: u32,
    }

    /// Output of shaping one run of text at one size
    #[derive(Debug, Clone, Default)]
    pub struct ShapingResult {
        pub glyphs: Vec<PositionedGlyph>,
        pub advance_width: f32,
    }

    impl ShapingResult {
        /// True when any glyph fell back to `.notdef`
        pub fn has_missing_glyphs(&self) -> bool {
            self.glyphs.iter().any(|g| g.id == 0)
        }
    }

    /// Ink extent inside a bitmap, in bitmap pixels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InkBounds {
        pub left: u32,
        pub top: u32,
        pub right: u32,
        pub bottom: u32,
    }

    impl InkBounds {
        pub fn width(&self) -> u32 {
            self.right.saturating_sub(self.left)
        }

        pub fn height(&self) -> u32 {
            self.bottom.saturating_sub(self.top)
        }

        pub fn is_empty(&self) -> bool {
            self.width() == 0 || self.height() == 0
        }
    }

    /// A synthesized emoji image, straight (non-premultiplied) RGBA8
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EmojiBitmap {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
        /// Where the bitmap's top-left corner sits relative to the pen
        /// position on the baseline (y grows downward)
        pub origin: (i32, i32),
        pub ink: InkBounds,
    }

    impl EmojiBitmap {
        /// Scan alpha to find the painted area
        pub fn measure_ink(width: u32, height: u32, pixels: &[u8]) -> InkBounds {
            let mut bounds: Option<InkBounds> = None;
            for y in 0..height {
                for x in 0..width {
                    let idx = ((y * width + x) * 4 + 3) as usize;
                    if pixels.get(idx).copied().unwrap_or(0) == 0 {
                        continue;
                    }
                    let b = bounds.get_or_insert(InkBounds {
                        left: x,
                        top: y,
                        right: x + 1,
                        bottom: y + 1,
                    });
                    b.left = b.left.min(x);
                    b.top = b.top.min(y);
                    b.right = b.right.max(x + 1);
                    b.bottom = b.bottom.max(y + 1);
                }
            }
            bounds.unwrap_or_default()
        }
    }
}
