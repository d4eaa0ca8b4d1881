//! Font-size fitting
//!
//! The fitter walks an ordered list of [`FitStrategy`] values. Each one
//! either produces a layout that fits or hands its warnings to the next.
//! The last strategy always succeeds, so fitting only fails when no font
//! can be loaded at all.

use unicode_segmentation::UnicodeSegmentation;

use boxfit_core::{error::Result, Capabilities, FitConfig, RunKind, Style, StyledRun};

use crate::measure::Measurer;
use crate::wrap::{wrap, WrapOutput, WrappedLine};

/// Largest base size accepted
pub const MAX_FONT_SIZE_LIMIT: u32 = 256;

/// Box sides outside this range are accepted with a warning
pub const USUAL_BOX_RANGE: std::ops::RangeInclusive<u32> = 10..=10000;

/// Content of the last-resort line
pub const OVERFLOW_TEXT: &str = "Text overflow";

/// Appended to truncated text
pub const ELLIPSIS: &str = "\u{2026}";

/// Space and size limits for one fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    pub max_width: u32,
    pub max_height: u32,
    pub max_font_size: u32,
    pub line_height_ratio: f32,
}

impl FitParams {
    pub fn new(max_width: u32, max_height: u32, max_font_size: u32) -> Self {
        Self {
            max_width,
            max_height,
            max_font_size,
            line_height_ratio: 1.2,
        }
    }

    pub fn with_line_height_ratio(mut self, ratio: f32) -> Self {
        self.line_height_ratio = ratio;
        self
    }

    /// Clamp out-of-range values, reporting each adjustment
    pub fn validated(self) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut params = self;

        for (side, value) in [("width", params.max_width), ("height", params.max_height)] {
            if value < *USUAL_BOX_RANGE.start() {
                warnings.push(format!("Text box {} is unusually small ({}px)", side, value));
            } else if value > *USUAL_BOX_RANGE.end() {
                warnings.push(format!("Text box {} is unusually large ({}px)", side, value));
            }
        }
        params.max_width = params.max_width.max(1);
        params.max_height = params.max_height.max(1);

        let clamped = params.max_font_size.clamp(1, MAX_FONT_SIZE_LIMIT);
        if clamped != params.max_font_size {
            warnings.push(format!(
                "Font size {} out of range, using {}",
                params.max_font_size, clamped
            ));
            params.max_font_size = clamped;
        }

        if !params.line_height_ratio.is_finite() || params.line_height_ratio <= 0.0 {
            warnings.push(format!(
                "Line height ratio {} is invalid, using 1.2",
                params.line_height_ratio
            ));
            params.line_height_ratio = 1.2;
        }

        (params, warnings)
    }
}

/// Which strategy produced the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Fit at or above the minimum size
    Fits,
    /// Fit only below the minimum size
    Aggressive,
    /// Fit after cutting the text to this many graphemes
    Truncated(usize),
    /// Nothing fit; the overflow line is shown instead
    Fallback,
}

impl FitOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fits => "fits",
            Self::Aggressive => "aggressive",
            Self::Truncated(_) => "truncated",
            Self::Fallback => "fallback",
        }
    }

    /// Grapheme budget the text was cut to, if it was
    pub fn truncated_to(&self) -> Option<usize> {
        match self {
            Self::Truncated(n) => Some(*n),
            _ => None,
        }
    }
}

/// Chosen size and the lines laid out at it
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub chosen_font_size: u32,
    pub wrapped_lines: Vec<WrappedLine>,
    pub total_text_height: f32,
    pub warnings: Vec<String>,
    pub outcome: FitOutcome,
}

impl FitResult {
    fn from_layout(size: u32, layout: WrapOutput, mut warnings: Vec<String>, outcome: FitOutcome) -> Self {
        let total_text_height = layout.total_height();
        warnings.extend(layout.warnings);
        Self {
            chosen_font_size: size,
            wrapped_lines: layout.lines,
            total_text_height,
            warnings,
            outcome,
        }
    }

    /// Nothing to draw
    pub fn empty(size: u32, warnings: Vec<String>) -> Self {
        Self {
            chosen_font_size: size,
            wrapped_lines: Vec::new(),
            total_text_height: 0.0,
            warnings,
            outcome: FitOutcome::Fits,
        }
    }

    pub fn max_line_width(&self) -> f32 {
        self.wrapped_lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }
}

/// What a strategy concluded
#[derive(Debug)]
pub enum StrategyOutcome {
    Fits(FitResult),
    Continue(Vec<String>),
}

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// Max size down to the minimum, one pixel at a time
    NormalScaling,
    /// Below the minimum, down to the aggressive floor
    AggressiveScaling,
    /// Cut the text at each configured budget and retry at the floor size
    Truncation,
    /// Show a fixed overflow line
    TerminalFallback,
}

impl FitStrategy {
    /// The chain used for `caps`
    pub fn chain(caps: Capabilities) -> Vec<FitStrategy> {
        let mut chain = vec![FitStrategy::NormalScaling];
        if caps.aggressive_scaling {
            chain.push(FitStrategy::AggressiveScaling);
        }
        chain.push(FitStrategy::Truncation);
        chain.push(FitStrategy::TerminalFallback);
        chain
    }

    pub fn name(&self) -> &'static str {
        match self {
            FitStrategy::NormalScaling => "normal scaling",
            FitStrategy::AggressiveScaling => "aggressive scaling",
            FitStrategy::Truncation => "truncation",
            FitStrategy::TerminalFallback => "terminal fallback",
        }
    }

    pub fn attempt(&self, job: &FitJob<'_>) -> Result<StrategyOutcome> {
        match self {
            FitStrategy::NormalScaling => {
                let min = job.config.min_font_size.max(1);
                for size in (min..=job.params.max_font_size).rev() {
                    if let Some(layout) = job.try_size(job.runs, size)? {
                        return Ok(StrategyOutcome::Fits(FitResult::from_layout(
                            size,
                            layout,
                            Vec::new(),
                            FitOutcome::Fits,
                        )));
                    }
                }
                let note = if job.capabilities.aggressive_scaling {
                    "Normal font scaling failed, trying aggressive scaling"
                } else {
                    "Normal font scaling failed"
                };
                Ok(StrategyOutcome::Continue(vec![note.to_string()]))
            },
            FitStrategy::AggressiveScaling => {
                let top = job
                    .config
                    .min_font_size
                    .saturating_sub(1)
                    .min(job.params.max_font_size);
                let floor = job.floor();
                for size in (floor..=top).rev() {
                    if let Some(layout) = job.try_size(job.runs, size)? {
                        return Ok(StrategyOutcome::Fits(FitResult::from_layout(
                            size,
                            layout,
                            vec![format!("Text fits with aggressive scaling at font size {}", size)],
                            FitOutcome::Aggressive,
                        )));
                    }
                }
                Ok(StrategyOutcome::Continue(Vec::new()))
            },
            FitStrategy::Truncation => {
                let mut notes = vec!["All scaling methods failed, trying text truncation".to_string()];
                let size = job.floor();
                for &budget in &job.config.truncation_steps {
                    let cut = truncate_runs(job.runs, budget);
                    notes.push(format!("Truncated text to {} characters", budget));
                    if let Some(layout) = job.try_size(&cut, size)? {
                        return Ok(StrategyOutcome::Fits(FitResult::from_layout(
                            size,
                            layout,
                            notes,
                            FitOutcome::Truncated(budget),
                        )));
                    }
                }
                Ok(StrategyOutcome::Continue(notes))
            },
            FitStrategy::TerminalFallback => {
                let size = job.floor();
                let layout = wrap(
                    &[StyledRun::plain(OVERFLOW_TEXT)],
                    job.measurer,
                    size,
                    f32::MAX,
                    job.params.line_height_ratio,
                )?;
                Ok(StrategyOutcome::Fits(FitResult::from_layout(
                    size,
                    layout,
                    vec![
                        "All fallback strategies failed".to_string(),
                        format!("Using fallback font size: {}", size),
                    ],
                    FitOutcome::Fallback,
                )))
            },
        }
    }
}

/// Everything a strategy needs to try sizes
pub struct FitJob<'a> {
    pub runs: &'a [StyledRun],
    pub measurer: &'a Measurer,
    pub params: FitParams,
    pub config: &'a FitConfig,
    pub capabilities: Capabilities,
}

impl FitJob<'_> {
    /// Smallest size any strategy will use
    pub fn floor(&self) -> u32 {
        let floor = if self.capabilities.aggressive_scaling {
            self.config.aggressive_floor
        } else {
            self.config.min_font_size
        };
        floor.max(1).min(self.params.max_font_size)
    }

    /// Layout at `size` if it fits the box
    pub fn try_size(&self, runs: &[StyledRun], size: u32) -> Result<Option<WrapOutput>> {
        let layout = wrap(
            runs,
            self.measurer,
            size,
            self.params.max_width as f32,
            self.params.line_height_ratio,
        )?;
        let fits = layout
            .lines
            .iter()
            .all(|l| l.width <= self.params.max_width as f32)
            && layout.total_height() <= self.params.max_height as f32;
        log::trace!("size {}: {} lines, fits: {}", size, layout.lines.len(), fits);
        Ok(fits.then_some(layout))
    }
}

fn note(warnings: &mut Vec<String>, new: Vec<String>) {
    for w in new {
        log::warn!("{}", w);
        warnings.push(w);
    }
}

/// True when the runs hold nothing but whitespace
pub fn is_blank(runs: &[StyledRun]) -> bool {
    runs.iter()
        .all(|r| r.kind == RunKind::Text && r.text.trim().is_empty())
}

/// Keep the first `budget` graphemes (an emoji counts as one) and append
/// an ellipsis when anything was cut
pub fn truncate_runs(runs: &[StyledRun], budget: usize) -> Vec<StyledRun> {
    let mut out = Vec::new();
    let mut left = budget;
    let mut cut = false;
    let mut last_style = Style::PLAIN;

    for run in runs {
        if left == 0 {
            cut = true;
            break;
        }
        match run.kind {
            RunKind::Emoji => {
                out.push(run.clone());
                left -= 1;
            },
            RunKind::Text => {
                let mut end = run.text.len();
                let mut taken = 0;
                for (at, _) in run.text.grapheme_indices(true) {
                    if taken == left {
                        end = at;
                        cut = true;
                        break;
                    }
                    taken += 1;
                }
                left -= taken;
                if end > 0 {
                    out.push(StyledRun::text(&run.text[..end], run.style));
                }
                if cut {
                    last_style = run.style;
                    break;
                }
            },
        }
        last_style = run.style;
    }

    if cut {
        let style = Style {
            hashtag: false,
            ..last_style
        };
        out.push(StyledRun::text(ELLIPSIS, style));
    }
    out
}

/// Fit `runs` into the box described by `params`
pub fn fit(
    runs: &[StyledRun],
    measurer: &Measurer,
    params: FitParams,
    config: &FitConfig,
    capabilities: Capabilities,
) -> Result<FitResult> {
    let (params, mut warnings) = params.validated();
    for w in &warnings {
        log::warn!("{}", w);
    }

    if is_blank(runs) {
        note(&mut warnings, vec!["Empty text provided".to_string()]);
        return Ok(FitResult::empty(params.max_font_size, warnings));
    }

    let job = FitJob {
        runs,
        measurer,
        params,
        config,
        capabilities,
    };

    for strategy in FitStrategy::chain(capabilities) {
        log::debug!("Trying {}", strategy.name());
        match strategy.attempt(&job)? {
            StrategyOutcome::Fits(mut result) => {
                let own = std::mem::take(&mut result.warnings);
                note(&mut warnings, own);
                result.warnings = warnings;
                log::debug!(
                    "Settled on {}px via {} ({:?})",
                    result.chosen_font_size,
                    strategy.name(),
                    result.outcome
                );
                return Ok(result);
            },
            StrategyOutcome::Continue(notes) => note(&mut warnings, notes),
        }
    }

    // The chain always ends in the terminal fallback
    FitStrategy::TerminalFallback
        .attempt(&job)
        .map(|outcome| match outcome {
            StrategyOutcome::Fits(result) => result,
            StrategyOutcome::Continue(notes) => FitResult::empty(job.floor(), notes),
        })
}

/// Size of `runs` laid out on one unbounded line per paragraph
pub fn natural_dimensions(
    runs: &[StyledRun],
    measurer: &Measurer,
    font_size: u32,
    line_height_ratio: f32,
) -> Result<(f32, f32)> {
    let layout = wrap(runs, measurer, font_size, f32::MAX, line_height_ratio)?;
    Ok((layout.max_width(), layout.total_height()))
}

/// Largest of the common sizes whose natural dimensions fit the target
pub fn suggest_font_size(
    runs: &[StyledRun],
    measurer: &Measurer,
    target_width: u32,
    target_height: u32,
) -> Result<Option<u32>> {
    for size in [24, 20, 16, 14, 12, 10, 8, 6] {
        let (w, h) = natural_dimensions(runs, measurer, size, 1.2)?;
        if w <= target_width as f32 && h <= target_height as f32 {
            return Ok(Some(size));
        }
    }
    Ok(None)
}
