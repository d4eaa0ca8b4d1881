//! Render command: one overlay onto one image

use anyhow::{Context, Result};

use crate::cli::RenderArgs;
use crate::options::load_canvas;

pub fn run(args: &RenderArgs) -> Result<()> {
    let text = args.text.read()?;
    let overlay = args.fonts.overlay()?;
    let request = args.layout.request(text, &args.colors)?;

    let mut image = load_canvas(args.input.as_deref(), &args.canvas, &args.background)?;
    let report = overlay.render(&mut image, &request)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Hashtags: {}", report.hashtags_found());
        println!("Emoji: {}", report.emoji_found());
        println!("Font size: {}px ({})", report.chosen_font_size, report.outcome);
        println!("{}", report.processing_info());
    }
    Ok(())
}
