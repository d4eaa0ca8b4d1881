//! Measuring, wrapping and fitting styled runs into a box
//!
//! - [`measure`] - the shared [`Measurer`] every width comes from
//! - [`wrap`] - greedy word wrapping at one size
//! - [`fit`] - the strategy chain that picks the size

pub mod fit;
pub mod measure;
pub mod wrap;

pub use fit::{
    fit, natural_dimensions, suggest_font_size, truncate_runs, FitOutcome, FitParams, FitResult,
    FitStrategy, StrategyOutcome,
};
pub use measure::Measurer;
pub use wrap::{wrap, LineChunk, WrapOutput, WrappedLine};
