//! From raw text to styled, scanned runs
//!
//! [`parser::parse`] turns tagged or markdown text into [`StyledRun`]s;
//! [`scanner::scan`] then splits hashtags and emoji out of those runs.
//! [`prepare`] does both in one call.

pub mod parser;
pub mod scanner;

pub use parser::parse;
pub use scanner::{
    contains_emoji, detected_emoji, detected_hashtags, extract_emoji, extract_hashtags,
    is_emoji_cluster, scan, ScanOptions,
};

use boxfit_core::{MarkupMode, StyledRun};

/// Parse, then scan
pub fn prepare(raw: &str, mode: MarkupMode, options: ScanOptions) -> Vec<StyledRun> {
    let runs = parse(raw, mode);
    log::debug!("parsed {} run(s) in {} mode", runs.len(), mode.as_str());
    scan(&runs, options)
}
