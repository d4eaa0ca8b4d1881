//! Property tests for parsing and scanning.
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use boxfit_core::{MarkupMode, Style, StyledRun};
use boxfit_markup::{parse, prepare, scan, ScanOptions};
use proptest::prelude::*;

const MODES: [MarkupMode; 4] = [
    MarkupMode::RichText,
    MarkupMode::MarkdownBasic,
    MarkupMode::MarkdownHeaders,
    MarkupMode::MarkdownExtended,
];

fn markup_parts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("**".to_string()),
            Just("*".to_string()),
            Just("__".to_string()),
            Just("~~".to_string()),
            Just("`".to_string()),
            Just("<b>".to_string()),
            Just("</i>".to_string()),
            Just("<u".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just("# ".to_string()),
            Just("- ".to_string()),
            Just("#tag".to_string()),
            Just("👍🏽".to_string()),
            Just("🇫🇷".to_string()),
            "[a-z ]{0,6}",
        ],
        0..24,
    )
}

fn markup_soup() -> impl Strategy<Value = String> {
    markup_parts().prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn parsing_never_panics_and_drops_no_words(parts in markup_parts()) {
        let input = parts.concat();
        let words: Vec<&str> = parts
            .iter()
            .filter(|p| p.chars().all(|c| c.is_ascii_lowercase() || c == ' '))
            .flat_map(|p| p.split_whitespace())
            .collect();
        for mode in MODES {
            let runs = parse(&input, mode);
            let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
            for word in &words {
                prop_assert!(joined.contains(word), "{:?} lost {:?} in {:?}", mode, word, joined);
            }
        }
    }

    #[test]
    fn plain_words_parse_to_themselves(input in "[a-zA-Z0-9 ,.!?]{1,40}") {
        for mode in MODES {
            prop_assert_eq!(parse(&input, mode), vec![StyledRun::plain(input.clone())]);
        }
    }

    #[test]
    fn scanning_is_idempotent(input in markup_soup()) {
        let once = prepare(&input, MarkupMode::MarkdownExtended, ScanOptions::default());
        let twice = scan(&once, ScanOptions::default());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn scanning_preserves_text(input in markup_soup()) {
        let runs = parse(&input, MarkupMode::RichText);
        let before: String = runs.iter().map(|r| r.text.as_str()).collect();
        let after: String = scan(&runs, ScanOptions::default()).iter().map(|r| r.text.as_str()).collect();
        prop_assert_eq!(before, after);
    }
}

#[test]
fn hello_world_scenario() {
    let runs = prepare("Hello **World**", MarkupMode::MarkdownBasic, ScanOptions::default());
    assert_eq!(
        runs,
        vec![StyledRun::plain("Hello "), StyledRun::text("World", Style::bold())]
    );
}

#[test]
fn emoji_inside_bold_keeps_style_and_atomicity() {
    let runs = prepare("**go 🏳️‍🌈 now**", MarkupMode::MarkdownBasic, ScanOptions::default());
    let emoji: Vec<_> = runs.iter().filter(|r| r.is_emoji()).collect();
    assert_eq!(emoji.len(), 1);
    assert_eq!(emoji[0].text, "🏳️‍🌈");
    assert!(emoji[0].style.bold);
}
