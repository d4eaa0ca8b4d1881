//! boxfit: styled, emoji-aware text fitted into a box on an image
//!
//! Give it an RGBA image, a rectangle and some lightly marked-up text.
//! boxfit picks the largest font size at which the text wraps into the
//! rectangle, shrinking, then truncating, then showing an overflow banner
//! when nothing fits. It draws the text in place with bold, italic,
//! underline, strike, header sizes, colored hashtags and color emoji.
//!
//! ## Quick start
//!
//! ```ignore
//! use boxfit::prelude::*;
//!
//! let overlay = Overlay::builder()
//!     .fonts(FontSet::new().with_regular(Path::new("Inter-Regular.ttf")))
//!     .build()?;
//!
//! let mut image = image::open("photo.jpg")?.to_rgba8();
//! let request = OverlayRequest::new("## Launch day 🚀\nThanks **everyone** #shipit")
//!     .with_markup(MarkupMode::MarkdownHeaders)
//!     .with_box(TextBox::new(40, 40, 600, 300).with_padding(20));
//! let report = overlay.render(&mut image, &request)?;
//! println!("{}", report.processing_info());
//! ```
//!
//! ## Pieces
//!
//! - [`Overlay`] - the long-lived context holding fonts, caches and backends
//! - [`OverlayRequest`] - one job: text, box, sizes, colors and switches
//! - [`OverlayReport`] - what was found and decided
//! - [`Compositor`] - draws a fitted layout; usable without an `Overlay`
//!
//! The stages live in their own crates and are re-exported here:
//! [`markup`], [`fontdb`], [`layout`], [`emoji`] and [`shaper`].

pub mod banner;
pub mod canvas;
pub mod compose;
pub mod overlay;
pub mod report;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use banner::{ErrorBanner, DEFAULT_BANNER_MESSAGE};
pub use compose::{BoxFrame, ComposeOptions, ComposeOutput, Compositor, EmojiPlacement};
pub use overlay::{Overlay, OverlayBuilder};
pub use report::OverlayReport;
pub use request::OverlayRequest;

pub use boxfit_core::{BoxfitError, Result, RunKind, Style, StyledRun};
pub use boxfit_fontdb as fontdb;
pub use boxfit_layout as layout;
pub use boxfit_markup as markup;
pub use boxfit_render_emoji as emoji;
pub use boxfit_shape_hr as shaper;

/// Everything a typical caller needs
pub mod prelude {
    pub use std::path::Path;

    pub use crate::{BoxFrame, Overlay, OverlayReport, OverlayRequest};
    pub use boxfit_core::{
        BoxfitError, Capabilities, Color, FitConfig, HorizontalAlign, MarkupMode, Palette,
        Result, TextBox, VerticalAlign,
    };
    pub use boxfit_fontdb::{EmojiFontChain, FontSet, FontSource};
}
