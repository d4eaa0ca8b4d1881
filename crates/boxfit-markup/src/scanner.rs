//! Hashtag and emoji detection over styled runs
//!
//! The scanner walks each text run by extended grapheme cluster, so a
//! flag, a skin-toned hand or a ZWJ family always lands in one emoji run.
//! Hashtags become text runs with the hashtag flag added to the parent
//! style. Scanning is idempotent: feeding the output back in returns it
//! unchanged.

use boxfit_core::{Capabilities, RunKind, StyledRun};
use unicode_segmentation::UnicodeSegmentation;

const VS16: char = '\u{FE0F}';
const KEYCAP: char = '\u{20E3}';

/// Blocks whose code points render as emoji by default
const EMOJI_BLOCKS: &[(u32, u32)] = &[
    // Mahjong, cards, enclosed supplements, regional indicators, pictographs,
    // emoticons, transport, alchemical, geometric ext, supplemental symbols
    (0x1F000, 0x1FAFF),
    // Misc symbols and dingbats
    (0x2600, 0x27BF),
    // Misc technical (watch, hourglass, play buttons)
    (0x2300, 0x23FF),
    // Arrows and stars
    (0x2B00, 0x2BFF),
];

/// Symbols that only turn into emoji with a VS16 selector
const TEXT_DEFAULT_SYMBOLS: &[char] = &[
    '\u{00A9}', '\u{00AE}', '\u{203C}', '\u{2049}', '\u{2122}', '\u{2139}', '\u{3030}',
    '\u{303D}', '\u{3297}', '\u{3299}',
];

/// What to split out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub hashtags: bool,
    pub emoji: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            hashtags: true,
            emoji: true,
        }
    }
}

impl From<Capabilities> for ScanOptions {
    fn from(caps: Capabilities) -> Self {
        Self {
            hashtags: caps.hashtag_support,
            emoji: caps.emoji_support,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn in_emoji_block(c: char) -> bool {
    let cp = c as u32;
    EMOJI_BLOCKS.iter().any(|(lo, hi)| (*lo..=*hi).contains(&cp))
}

/// True when `cluster` (one grapheme) should be drawn as an emoji image
pub fn is_emoji_cluster(cluster: &str) -> bool {
    let Some(first) = cluster.chars().next() else {
        return false;
    };
    if matches!(first, '0'..='9' | '#' | '*') {
        return cluster.ends_with(KEYCAP);
    }
    if in_emoji_block(first) {
        return true;
    }
    TEXT_DEFAULT_SYMBOLS.contains(&first) && cluster.contains(VS16)
}

/// Split hashtags and emoji out of `runs`
pub fn scan(runs: &[StyledRun], options: ScanOptions) -> Vec<StyledRun> {
    let mut out: Vec<StyledRun> = Vec::with_capacity(runs.len());
    let mut prev: Option<char> = None;
    for run in runs {
        match run.kind {
            RunKind::Emoji => out.push(run.clone()),
            RunKind::Text => split_run(run, options, prev, &mut out),
        }
        prev = run.text.chars().last().or(prev);
    }
    out
}

fn push_text(out: &mut Vec<StyledRun>, text: &str, run: &StyledRun, hashtag: bool) {
    if text.is_empty() {
        return;
    }
    let style = if hashtag {
        run.style.with_hashtag()
    } else {
        run.style
    };
    out.push(StyledRun::text(text, style));
}

fn split_run(run: &StyledRun, options: ScanOptions, mut prev: Option<char>, out: &mut Vec<StyledRun>) {
    let text = run.text.as_str();
    let clusters: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
    let emoji_at = |i: usize| options.emoji && is_emoji_cluster(clusters[i].1);
    let mut pending = 0;
    let mut i = 0;

    while i < clusters.len() {
        let (at, cluster) = clusters[i];

        if emoji_at(i) {
            push_text(out, &text[pending..at], run, false);
            out.push(StyledRun::emoji(cluster, run.style));
            pending = at + cluster.len();
            prev = cluster.chars().last();
            i += 1;
            continue;
        }

        let opens_hashtag = options.hashtags
            && cluster == "#"
            && !prev.is_some_and(|c| is_word_char(c) || c == '#');
        if opens_hashtag {
            let mut end = i + 1;
            while end < clusters.len()
                && !emoji_at(end)
                && clusters[end].1.chars().next().is_some_and(is_word_char)
            {
                end += 1;
            }
            if end > i + 1 {
                let (last_at, last) = clusters[end - 1];
                let stop = last_at + last.len();
                push_text(out, &text[pending..at], run, false);
                push_text(out, &text[at..stop], run, true);
                pending = stop;
                prev = last.chars().last();
                i = end;
                continue;
            }
        }

        prev = cluster.chars().last();
        i += 1;
    }
    push_text(out, &text[pending..], run, false);
}

/// Hashtag tokens in order of appearance, e.g. `["#world"]`
pub fn detected_hashtags(runs: &[StyledRun]) -> Vec<String> {
    runs.iter()
        .filter(|r| r.kind == RunKind::Text && r.style.hashtag)
        .map(|r| r.text.clone())
        .collect()
}

/// Emoji sequences in order of appearance
pub fn detected_emoji(runs: &[StyledRun]) -> Vec<String> {
    runs.iter()
        .filter(|r| r.is_emoji())
        .map(|r| r.text.clone())
        .collect()
}

/// Hashtags in unparsed text
pub fn extract_hashtags(text: &str) -> Vec<String> {
    detected_hashtags(&scan(&[StyledRun::plain(text)], ScanOptions::default()))
}

/// Emoji sequences in unparsed text
pub fn extract_emoji(text: &str) -> Vec<String> {
    text.graphemes(true)
        .filter(|g| is_emoji_cluster(g))
        .map(str::to_string)
        .collect()
}

pub fn contains_emoji(text: &str) -> bool {
    text.graphemes(true).any(is_emoji_cluster)
}
