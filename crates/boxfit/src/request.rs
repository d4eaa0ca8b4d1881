//! What to draw and where

use boxfit_core::{
    Capabilities, HorizontalAlign, MarkupMode, Palette, TextBox, VerticalAlign,
};
use boxfit_layout::FitParams;

use crate::compose::{BoxFrame, ComposeOptions};

/// One overlay job
///
/// ```ignore
/// let request = OverlayRequest::new("Hello **World** 🎉")
///     .with_box(TextBox::new(40, 40, 400, 200).with_padding(10))
///     .with_max_font_size(48);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRequest {
    pub text: String,
    pub markup: MarkupMode,
    pub text_box: TextBox,
    pub max_font_size: u32,
    pub line_height_ratio: f32,
    pub align: HorizontalAlign,
    pub valign: VerticalAlign,
    pub palette: Palette,
    pub capabilities: Capabilities,
    pub show_error_banner: bool,
    /// Outline (and optional fill) around the text area
    pub frame: Option<BoxFrame>,
}

impl OverlayRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: MarkupMode::default(),
            text_box: TextBox::default(),
            max_font_size: 30,
            line_height_ratio: 1.2,
            align: HorizontalAlign::default(),
            valign: VerticalAlign::default(),
            palette: Palette::default(),
            capabilities: Capabilities::default(),
            show_error_banner: true,
            frame: None,
        }
    }

    pub fn with_markup(mut self, markup: MarkupMode) -> Self {
        self.markup = markup;
        self
    }

    pub fn with_box(mut self, text_box: TextBox) -> Self {
        self.text_box = text_box;
        self
    }

    pub fn with_max_font_size(mut self, size: u32) -> Self {
        self.max_font_size = size;
        self
    }

    pub fn with_line_height_ratio(mut self, ratio: f32) -> Self {
        self.line_height_ratio = ratio;
        self
    }

    pub fn with_alignment(mut self, align: HorizontalAlign, valign: VerticalAlign) -> Self {
        self.align = align;
        self.valign = valign;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_error_banner(mut self, show: bool) -> Self {
        self.show_error_banner = show;
        self
    }

    pub fn with_frame(mut self, frame: BoxFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub(crate) fn fit_params(&self) -> FitParams {
        let area = self.text_box.effective();
        FitParams::new(area.width, area.height, self.max_font_size)
            .with_line_height_ratio(self.line_height_ratio)
    }

    pub(crate) fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            align: self.align,
            valign: self.valign,
            palette: self.palette,
            show_error_banner: self.show_error_banner,
            frame: self.frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxfit_core::Color;

    #[test]
    fn defaults() {
        let r = OverlayRequest::new("hi");
        assert_eq!(r.text_box, TextBox::new(0, 0, 200, 200));
        assert_eq!(r.max_font_size, 30);
        assert_eq!(r.line_height_ratio, 1.2);
        assert_eq!(r.align, HorizontalAlign::Center);
        assert_eq!(r.valign, VerticalAlign::Middle);
        assert_eq!(r.palette.regular, Color::black());
        assert_eq!(r.palette.hashtag, Color::rgb(0x00, 0x66, 0xCC));
        assert_eq!(r.markup, MarkupMode::MarkdownBasic);
        assert!(r.show_error_banner);
    }

    #[test]
    fn fit_params_use_the_padded_box() {
        let r = OverlayRequest::new("hi")
            .with_box(TextBox::new(10, 10, 300, 100).with_padding(20))
            .with_max_font_size(40)
            .with_line_height_ratio(1.5);
        let p = r.fit_params();
        assert_eq!((p.max_width, p.max_height), (260, 60));
        assert_eq!(p.max_font_size, 40);
        assert_eq!(p.line_height_ratio, 1.5);
    }
}
