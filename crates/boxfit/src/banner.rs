//! The overflow banner
//!
//! Drawn over the text area when every fitting strategy failed, so a
//! broken layout is obvious on the output image rather than only in logs.

use image::RgbaImage;

use boxfit_core::{error::Result, Color, Rect, RunKind, Style};

use crate::canvas;
use crate::compose::Compositor;

pub const DEFAULT_BANNER_MESSAGE: &str = "Text overflow - all scaling strategies failed";

/// Messages longer than this many characters are shortened
const MAX_MESSAGE_CHARS: usize = 50;

/// Largest size the message is drawn at
const MESSAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub fill: Color,
    pub border: Color,
    pub border_width: u32,
    pub text: Color,
}

impl Default for ErrorBanner {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_MESSAGE)
    }
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fill: Color::rgba(255, 200, 200, 180),
            border: Color::rgb(255, 0, 0),
            border_width: 2,
            text: Color::rgb(255, 0, 0),
        }
    }

    /// The message as drawn: 47 characters and an ellipsis when too long
    pub fn display_text(&self) -> String {
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            let mut short: String = self.message.chars().take(MAX_MESSAGE_CHARS - 3).collect();
            short.push_str("...");
            short
        } else {
            self.message.clone()
        }
    }

    pub(crate) fn draw(&self, compositor: &Compositor<'_>, image: &mut RgbaImage, area: Rect) -> Result<()> {
        canvas::fill_rect(image, area, self.fill);
        canvas::stroke_rect(image, area, self.border, self.border_width);

        let text = self.display_text();
        let size = MESSAGE_SIZE.min(area.height).max(1);
        let width = compositor
            .measurer()
            .chunk_width(&text, Style::PLAIN, RunKind::Text, size)?;
        let top = text_top(area, size);
        let ascent = compositor.measurer().font(Style::PLAIN, size)?.ascent(size as f32);
        let x = area.x as f32 + (area.width as f32 - width) / 2.0;

        log::debug!("drawing overflow banner over {:?}", area);
        compositor.draw_text(
            image,
            &text,
            Style::PLAIN,
            size,
            x,
            top as f32 + ascent,
            self.text,
            area,
        )
    }
}

/// Top of a `size`-pixel line centered in `area`
fn text_top(area: Rect, size: u32) -> i32 {
    area.y + (area.height as i32 - size as i32) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_fits_unshortened() {
        let banner = ErrorBanner::default();
        assert_eq!(banner.display_text(), DEFAULT_BANNER_MESSAGE);
    }

    #[test]
    fn long_messages_are_cut_to_fifty() {
        let banner = ErrorBanner::new("x".repeat(51));
        let shown = banner.display_text();
        assert_eq!(shown.chars().count(), 50);
        assert!(shown.ends_with("..."));
        assert!(shown.starts_with(&"x".repeat(47)));

        let exact = ErrorBanner::new("é".repeat(50));
        assert_eq!(exact.display_text(), "é".repeat(50));
    }

    #[test]
    fn short_areas_center_the_shrunken_line() {
        let area = Rect::new(20, 20, 80, 6);
        let size = MESSAGE_SIZE.min(area.height);
        assert_eq!(text_top(area, size), 20);
        assert_eq!(text_top(Rect::new(0, 10, 80, 40), MESSAGE_SIZE), 24);
        assert_eq!(text_top(Rect::new(0, 0, 80, 9), 5), 2);
    }
}
