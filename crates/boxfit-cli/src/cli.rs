//! CLI argument definitions using Clap v4

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use boxfit::prelude::{HorizontalAlign, MarkupMode, VerticalAlign};

use crate::options::{parse_align, parse_markup, parse_valign};

/// boxfit - fit styled text, hashtags and emoji into a box on an image
#[derive(Parser, Debug)]
#[command(name = "boxfit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw text into a box on an image
    #[command(alias = "r")]
    Render(Box<RenderArgs>),

    /// Show how text is parsed, and optionally how it would be fitted
    #[command(alias = "i")]
    Inspect(Box<InspectArgs>),

    /// Run many overlay jobs from a JSONL file
    Batch(Box<BatchArgs>),
}

/// Font selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct FontArgs {
    /// Regular text face (.ttf, .otf, .ttc)
    #[arg(short = 'f', long = "font")]
    pub font: Option<PathBuf>,

    #[arg(long = "bold-font")]
    pub bold_font: Option<PathBuf>,

    #[arg(long = "italic-font")]
    pub italic_font: Option<PathBuf>,

    #[arg(long = "bold-italic-font")]
    pub bold_italic_font: Option<PathBuf>,

    /// Extra text face tried after the styled ones (repeatable)
    #[arg(long = "fallback-font")]
    pub fallback_fonts: Vec<PathBuf>,

    /// Emoji face tried before the platform ones (repeatable)
    #[arg(long = "emoji-font")]
    pub emoji_fonts: Vec<PathBuf>,

    /// Ignore emoji faces installed with the OS
    #[arg(long = "no-system-emoji")]
    pub no_system_emoji: bool,

    /// Never fall back to well-known system text faces
    #[arg(long = "no-system-fonts")]
    pub no_system_fonts: bool,
}

/// Box geometry and fitting behavior
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Markup dialect: rich, basic, headers, extended
    #[arg(short = 'm', long, default_value = "basic", value_parser = parse_markup)]
    pub markup: MarkupMode,

    /// Left edge of the box
    #[arg(short = 'x', long, default_value_t = 0, allow_negative_numbers = true)]
    pub x: i32,

    /// Top edge of the box
    #[arg(short = 'y', long, default_value_t = 0, allow_negative_numbers = true)]
    pub y: i32,

    #[arg(short = 'W', long, default_value_t = 200)]
    pub width: u32,

    #[arg(short = 'H', long, default_value_t = 200)]
    pub height: u32,

    /// Inner padding on every side
    #[arg(short = 'p', long, default_value_t = 0)]
    pub padding: u32,

    /// Largest font size tried
    #[arg(short = 's', long = "max-font-size", default_value_t = 30)]
    pub max_font_size: u32,

    /// Line height as a multiple of the font size
    #[arg(long = "line-height", default_value_t = 1.2)]
    pub line_height: f32,

    /// left, center, right
    #[arg(long, default_value = "center", value_parser = parse_align)]
    pub align: HorizontalAlign,

    /// top, middle, bottom
    #[arg(long, default_value = "middle", value_parser = parse_valign)]
    pub valign: VerticalAlign,

    /// Treat #words as plain text
    #[arg(long = "no-hashtags")]
    pub no_hashtags: bool,

    /// Draw emoji as text instead of color images
    #[arg(long = "no-emoji")]
    pub no_emoji: bool,

    /// Stop at the minimum size instead of shrinking further
    #[arg(long = "no-aggressive")]
    pub no_aggressive: bool,

    /// Do not draw the overflow banner when nothing fits
    #[arg(long = "no-banner")]
    pub no_banner: bool,

    /// Outline the box
    #[arg(long = "show-box")]
    pub show_box: bool,

    /// Outline color as RRGGBB or RRGGBBAA
    #[arg(long = "box-color", default_value = "FF0000")]
    pub box_color: String,

    #[arg(long = "box-line-width", default_value_t = 3)]
    pub box_line_width: u32,

    /// Fill behind the text area, RRGGBB or RRGGBBAA
    #[arg(long = "box-background")]
    pub box_background: Option<String>,
}

/// Text colors, RRGGBB or RRGGBBAA
#[derive(Args, Debug, Clone, Default)]
pub struct ColorArgs {
    /// Color for all text that has no more specific color
    #[arg(short = 'c', long = "color")]
    pub color: Option<String>,

    #[arg(long = "bold-color")]
    pub bold_color: Option<String>,

    #[arg(long = "italic-color")]
    pub italic_color: Option<String>,

    #[arg(long = "hashtag-color")]
    pub hashtag_color: Option<String>,
}

/// Where the text comes from
#[derive(Args, Debug, Clone, Default)]
pub struct TextArgs {
    /// Text to draw (reads from stdin if omitted)
    #[arg(short = 't', long = "text", conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short = 'T', long = "text-file")]
    pub text_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Image to draw on; a blank canvas is used when omitted
    pub input: Option<PathBuf>,

    /// Where to write the result (format from the extension)
    #[arg(short = 'o', long = "output-file")]
    pub output: PathBuf,

    /// Blank canvas size as WIDTHxHEIGHT
    #[arg(long, default_value = "512x512")]
    pub canvas: String,

    /// Blank canvas color
    #[arg(long, default_value = "FFFFFF")]
    pub background: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub text: TextArgs,

    #[command(flatten)]
    pub fonts: FontArgs,

    #[command(flatten)]
    pub layout: LayoutArgs,

    #[command(flatten)]
    pub colors: ColorArgs,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Also fit the text into the box (needs fonts)
    #[arg(long)]
    pub fit: bool,

    /// Print JSON instead of a listing
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub text: TextArgs,

    #[command(flatten)]
    pub fonts: FontArgs,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// JSONL job file (reads from stdin if omitted)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Worker threads, 0 for one per core
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    pub jobs: usize,

    /// Blank canvas size for jobs without an input image
    #[arg(long, default_value = "512x512")]
    pub canvas: String,

    /// Blank canvas color
    #[arg(long, default_value = "FFFFFF")]
    pub background: String,

    #[command(flatten)]
    pub fonts: FontArgs,

    #[command(flatten)]
    pub layout: LayoutArgs,

    #[command(flatten)]
    pub colors: ColorArgs,
}
