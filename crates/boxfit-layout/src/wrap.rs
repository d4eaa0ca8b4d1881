//! Greedy word wrapping over styled runs
//!
//! A word is a maximal stretch of non-space material. It can cross run
//! boundaries (`**bold**tail`) and contain any number of emoji, and it is
//! never split: a word wider than the box sits alone on its line and the
//! caller gets a warning.

use boxfit_core::{error::Result, RunKind, Style, StyledRun};

use crate::measure::Measurer;

/// One measured piece of a line
#[derive(Debug, Clone, PartialEq)]
pub struct LineChunk {
    pub text: String,
    pub style: Style,
    pub kind: RunKind,
    /// Pixel size after header scaling
    pub size: u32,
    pub width: f32,
}

impl LineChunk {
    pub fn is_emoji(&self) -> bool {
        self.kind == RunKind::Emoji
    }

    pub fn is_space(&self) -> bool {
        self.kind == RunKind::Text && self.text == " "
    }
}

/// A laid-out line
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub chunks: Vec<LineChunk>,
    pub width: f32,
    pub height: f32,
    /// Base size the line was wrapped at
    pub font_size: u32,
}

impl WrappedLine {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Visible text of the line
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    /// Largest chunk size, or the base size for an empty line
    pub fn max_chunk_size(&self) -> u32 {
        self.chunks
            .iter()
            .map(|c| c.size)
            .max()
            .unwrap_or(self.font_size)
    }
}

/// Lines plus anything worth telling the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapOutput {
    pub lines: Vec<WrappedLine>,
    pub warnings: Vec<String>,
}

impl WrapOutput {
    pub fn total_height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }

    pub fn max_width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }
}

#[derive(Debug)]
struct Piece {
    text: String,
    style: Style,
    kind: RunKind,
}

#[derive(Debug)]
enum Token {
    Word(Vec<Piece>),
    Space,
    Break,
}

/// Split runs into words, gaps and hard breaks
fn tokenize(runs: &[StyledRun]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Vec<Piece> = Vec::new();

    fn flush(word: &mut Vec<Piece>, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    for run in runs {
        if run.kind == RunKind::Emoji {
            word.push(Piece {
                text: run.text.clone(),
                style: run.style,
                kind: RunKind::Emoji,
            });
            continue;
        }
        let mut current = String::new();
        for ch in run.text.chars() {
            if ch == '\n' || (ch.is_whitespace() && ch != '\u{00A0}') {
                if !current.is_empty() {
                    word.push(Piece {
                        text: std::mem::take(&mut current),
                        style: run.style,
                        kind: RunKind::Text,
                    });
                }
                flush(&mut word, &mut tokens);
                if ch == '\n' {
                    tokens.push(Token::Break);
                } else if !matches!(tokens.last(), Some(Token::Space)) {
                    tokens.push(Token::Space);
                }
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            word.push(Piece {
                text: current,
                style: run.style,
                kind: RunKind::Text,
            });
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

struct LineBuilder {
    font_size: u32,
    ratio: f32,
    chunks: Vec<LineChunk>,
    width: f32,
}

impl LineBuilder {
    fn new(font_size: u32, ratio: f32) -> Self {
        Self {
            font_size,
            ratio,
            chunks: Vec::new(),
            width: 0.0,
        }
    }

    fn finish(&mut self, lines: &mut Vec<WrappedLine>) {
        let chunks = std::mem::take(&mut self.chunks);
        let tallest = chunks
            .iter()
            .map(|c| c.size)
            .max()
            .unwrap_or(self.font_size);
        lines.push(WrappedLine {
            chunks,
            width: self.width,
            height: tallest as f32 * self.ratio,
            font_size: self.font_size,
        });
        self.width = 0.0;
    }

    fn last_style(&self) -> Option<Style> {
        self.chunks.last().map(|c| c.style)
    }
}

/// Decorations only bridge a gap when both sides carry them
fn gap_style(before: Style, after: Style) -> Style {
    Style {
        underline: before.underline && after.underline,
        strike: before.strike && after.strike,
        hashtag: false,
        ..before
    }
}

/// Wrap `runs` at `font_size` into lines no wider than `max_width` where
/// possible
pub fn wrap(
    runs: &[StyledRun],
    measurer: &Measurer,
    font_size: u32,
    max_width: f32,
    line_height_ratio: f32,
) -> Result<WrapOutput> {
    let mut out = WrapOutput::default();
    let mut line = LineBuilder::new(font_size, line_height_ratio);
    let mut pending_space = false;

    for token in tokenize(runs) {
        let pieces = match token {
            Token::Space => {
                pending_space = true;
                continue;
            },
            Token::Break => {
                line.finish(&mut out.lines);
                pending_space = false;
                continue;
            },
            Token::Word(pieces) => pieces,
        };

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut word_width = 0.0;
        for piece in pieces {
            let size = piece.style.scaled_size(font_size);
            let width = measurer.chunk_width(&piece.text, piece.style, piece.kind, size)?;
            word_width += width;
            chunks.push(LineChunk {
                text: piece.text,
                style: piece.style,
                kind: piece.kind,
                size,
                width,
            });
        }

        let gap = match (pending_space, line.last_style(), chunks.first()) {
            (true, Some(before), Some(first)) => {
                let style = gap_style(before, first.style);
                let size = style.scaled_size(font_size);
                Some(LineChunk {
                    text: " ".to_string(),
                    style,
                    kind: RunKind::Text,
                    size,
                    width: measurer.space_width(style, size)?,
                })
            },
            _ => None,
        };
        pending_space = false;

        let gap_width = gap.as_ref().map_or(0.0, |g| g.width);
        if !line.chunks.is_empty() && line.width + gap_width + word_width > max_width {
            line.finish(&mut out.lines);
        } else if let Some(gap) = gap {
            line.width += gap.width;
            line.chunks.push(gap);
        }

        if word_width > max_width {
            let text: String = chunks.iter().map(|c| c.text.as_str()).collect();
            let head: String = text.chars().take(10).collect();
            let warning = format!("Word too wide for box: {}...", head);
            log::debug!("{} ({:.1}px > {:.1}px)", warning, word_width, max_width);
            out.warnings.push(warning);
        }

        line.width += word_width;
        line.chunks.extend(chunks);
    }

    if !line.chunks.is_empty() {
        line.finish(&mut out.lines);
    }
    Ok(out)
}
