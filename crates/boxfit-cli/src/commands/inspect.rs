//! Inspect command: parsed runs, detected tokens and an optional dry-run fit

use anyhow::Result;
use serde::Serialize;

use boxfit::markup::{detected_emoji, detected_hashtags};
use boxfit::{RunKind, StyledRun};

use crate::cli::{ColorArgs, InspectArgs};

#[derive(Debug, Serialize)]
struct RunView<'a> {
    text: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    style: Vec<String>,
}

impl<'a> From<&'a StyledRun> for RunView<'a> {
    fn from(run: &'a StyledRun) -> Self {
        let s = run.style;
        let mut style: Vec<String> = [
            (s.bold, "bold"),
            (s.italic, "italic"),
            (s.underline, "underline"),
            (s.strike, "strike"),
            (s.hashtag, "hashtag"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| name.to_string())
        .collect();
        if let Some(level) = s.header_level {
            style.push(format!("h{}", level));
        }
        Self {
            text: &run.text,
            kind: match run.kind {
                RunKind::Text => "text",
                RunKind::Emoji => "emoji",
            },
            style,
        }
    }
}

#[derive(Debug, Serialize)]
struct FitView {
    font_size: u32,
    outcome: &'static str,
    lines: Vec<String>,
    total_text_height: f32,
    suggested_font_size: Option<u32>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InspectView<'a> {
    markup: &'static str,
    runs: Vec<RunView<'a>>,
    hashtags: Vec<String>,
    emoji: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fit: Option<FitView>,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let text = args.text.read()?;
    let overlay = args.fonts.overlay()?;
    let request = args.layout.request(text, &ColorArgs::default())?;
    let runs = overlay.runs(&request);

    let fit = if args.fit {
        let layout = overlay.layout(&request)?;
        Some(FitView {
            font_size: layout.chosen_font_size,
            outcome: layout.outcome.name(),
            lines: layout.wrapped_lines.iter().map(|l| l.text()).collect(),
            total_text_height: layout.total_text_height,
            suggested_font_size: overlay.suggest_font_size(&request)?,
            warnings: layout.warnings,
        })
    } else {
        None
    };

    let view = InspectView {
        markup: request.markup.as_str(),
        runs: runs.iter().map(RunView::from).collect(),
        hashtags: detected_hashtags(&runs),
        emoji: detected_emoji(&runs),
        fit,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_listing(&view);
    }
    Ok(())
}

fn print_listing(view: &InspectView<'_>) {
    println!("Markup: {}", view.markup);
    println!("Runs:");
    for run in &view.runs {
        if run.style.is_empty() {
            println!("  {:<5} {:?}", run.kind, run.text);
        } else {
            println!("  {:<5} {:?} [{}]", run.kind, run.text, run.style.join(", "));
        }
    }
    println!("Hashtags: {}", join_or_none(&view.hashtags));
    println!("Emoji: {}", join_or_none(&view.emoji));

    if let Some(fit) = &view.fit {
        println!("Font size: {}px ({})", fit.font_size, fit.outcome);
        match fit.suggested_font_size {
            Some(size) => println!("Suggested single-line size: {}px", size),
            None => println!("Suggested single-line size: none fits"),
        }
        println!("Lines ({}, {:.1}px tall):", fit.lines.len(), fit.total_text_height);
        for line in &fit.lines {
            println!("  {}", line);
        }
        for warning in &fit.warnings {
            println!("Warning: {}", warning);
        }
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}
