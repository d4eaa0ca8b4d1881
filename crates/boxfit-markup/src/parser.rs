//! Markup to styled runs
//!
//! Two dialects share one output shape. Rich text uses `<b>`, `<i>`, `<u>`
//! and `<s>` tags; markdown uses `**`, `*`, `__` and `~~` delimiters plus,
//! depending on [`MarkupMode`], headers, list markers and code spans.
//!
//! Parsing never fails. Markup that does not line up degrades to literal
//! text, and the worst case is a single unstyled run holding the input.

use boxfit_core::{MarkupMode, Style, StyledRun};

/// Parse `raw` into ordered runs
pub fn parse(raw: &str, mode: MarkupMode) -> Vec<StyledRun> {
    let mut out = RunBuilder::default();
    match mode {
        MarkupMode::RichText => parse_rich(raw, &mut out),
        _ => parse_markdown(raw, mode, &mut out),
    }
    out.finish()
}

/// Collects runs, merging neighbours that share a style
#[derive(Default)]
struct RunBuilder {
    runs: Vec<StyledRun>,
    sealed: bool,
}

impl RunBuilder {
    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if !self.sealed {
            if let Some(last) = self.runs.last_mut() {
                if last.style == style {
                    last.text.push_str(text);
                    return;
                }
            }
        }
        self.sealed = false;
        self.runs.push(StyledRun::text(text, style));
    }

    /// Keep the next push out of the previous run
    fn seal(&mut self) {
        self.sealed = true;
    }

    fn finish(self) -> Vec<StyledRun> {
        self.runs
    }
}

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Bold,
    Italic,
    Underline,
    Strike,
}

impl Tag {
    fn from_byte(b: u8) -> Option<Tag> {
        match b.to_ascii_lowercase() {
            b'b' => Some(Tag::Bold),
            b'i' => Some(Tag::Italic),
            b'u' => Some(Tag::Underline),
            b's' => Some(Tag::Strike),
            _ => None,
        }
    }

    fn apply(self, mut style: Style) -> Style {
        match self {
            Tag::Bold => style.bold = true,
            Tag::Italic => style.italic = true,
            Tag::Underline => style.underline = true,
            Tag::Strike => style.strike = true,
        }
        style
    }
}

/// Recognize `<x>` or `</x>` at the start of `s`; returns (tag, closing, byte length)
fn match_tag(s: &[u8]) -> Option<(Tag, bool, usize)> {
    let (closing, name_at) = match s.get(1) {
        Some(b'/') => (true, 2),
        Some(_) => (false, 1),
        None => return None,
    };
    let tag = Tag::from_byte(*s.get(name_at)?)?;
    if s.get(name_at + 1) == Some(&b'>') {
        Some((tag, closing, name_at + 2))
    } else {
        None
    }
}

fn rich_style(stack: &[Tag]) -> Style {
    stack.iter().fold(Style::PLAIN, |style, tag| tag.apply(style))
}

fn parse_rich(raw: &str, out: &mut RunBuilder) {
    let bytes = raw.as_bytes();
    let mut stack: Vec<Tag> = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                if let Some((tag, closing, len)) = match_tag(&bytes[i..]) {
                    out.push(&raw[literal_start..i], rich_style(&stack));
                    if closing {
                        match stack.iter().rposition(|t| *t == tag) {
                            Some(pos) => stack.truncate(pos),
                            None => log::trace!("ignoring unmatched closing tag {:?}", tag),
                        }
                    } else {
                        stack.push(tag);
                    }
                    i += len;
                    literal_start = i;
                    continue;
                }
            },
            b'\n' if bytes.get(i + 1) == Some(&b'\n') => {
                // A blank line ends the paragraph and every open tag with it
                out.push(&raw[literal_start..i], rich_style(&stack));
                let end = i + bytes[i..].iter().take_while(|b| **b == b'\n').count();
                out.push(&raw[i..end], Style::PLAIN);
                stack.clear();
                i = end;
                literal_start = i;
                continue;
            },
            _ => {},
        }
        i += 1;
    }
    out.push(&raw[literal_start..], rich_style(&stack));
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Strong,
    Emphasis,
    Underline,
    Strike,
}

impl Delim {
    fn apply(self, mut style: Style) -> Style {
        match self {
            Delim::Strong => style.bold = true,
            Delim::Emphasis => style.italic = true,
            Delim::Underline => style.underline = true,
            Delim::Strike => style.strike = true,
        }
        style
    }
}

#[derive(Debug)]
enum Token<'a> {
    /// Base style for the line that follows
    LineStart(Style),
    /// Bullet or number in front of a list item
    Prefix(String),
    Text(&'a str),
    Delim(Delim, &'a str),
    Code(&'a str),
    Newline(&'a str),
}

fn parse_markdown(raw: &str, mode: MarkupMode, out: &mut RunBuilder) {
    for (paragraph, separator) in split_paragraphs(raw) {
        let tokens = tokenize_paragraph(paragraph, mode);
        emit_paragraph(&tokens, out);
        out.push(separator, Style::PLAIN);
    }
}

/// Split at blank lines, keeping each separator next to its paragraph
fn split_paragraphs(raw: &str) -> Vec<(&str, &str)> {
    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' && bytes.get(i + 1) == Some(&b'\n') {
            let end = i + bytes[i..].iter().take_while(|b| **b == b'\n').count();
            parts.push((&raw[start..i], &raw[i..end]));
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    parts.push((&raw[start..], ""));
    parts
}

fn tokenize_paragraph(paragraph: &str, mode: MarkupMode) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lines = paragraph.split('\n').peekable();
    while let Some(line) = lines.next() {
        let (base, prefix, body) = line_start(line, mode);
        tokens.push(Token::LineStart(base));
        if let Some(prefix) = prefix {
            tokens.push(Token::Prefix(prefix));
        }
        tokenize_inline(body, mode, &mut tokens);
        if lines.peek().is_some() {
            tokens.push(Token::Newline("\n"));
        }
    }
    tokens
}

/// Header and list detection; returns (line style, list prefix, remaining text)
fn line_start(line: &str, mode: MarkupMode) -> (Style, Option<String>, &str) {
    if mode.headers() {
        let hashes = line.bytes().take_while(|b| *b == b'#').count();
        if (1..=3).contains(&hashes) && line[hashes..].starts_with(' ') {
            let style = Style {
                header_level: Some(hashes as u8),
                ..Style::bold()
            };
            return (style, None, line[hashes..].trim_start_matches(' '));
        }
    }
    if mode.lists_and_code() {
        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            return (Style::PLAIN, Some("• ".to_string()), rest);
        }
        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && line[digits..].starts_with(". ") {
            let prefix = format!("{}. ", &line[..digits]);
            return (Style::PLAIN, Some(prefix), &line[digits + 2..]);
        }
    }
    (Style::PLAIN, None, line)
}

fn tokenize_inline<'a>(text: &'a str, mode: MarkupMode, tokens: &mut Vec<Token<'a>>) {
    let bytes = text.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let pair = bytes.get(i + 1) == Some(&bytes[i]);
        let found = match bytes[i] {
            b'*' if pair => Some((Token::Delim(Delim::Strong, &text[i..i + 2]), 2)),
            b'*' => Some((Token::Delim(Delim::Emphasis, &text[i..i + 1]), 1)),
            b'_' if pair => Some((Token::Delim(Delim::Underline, &text[i..i + 2]), 2)),
            b'~' if pair => Some((Token::Delim(Delim::Strike, &text[i..i + 2]), 2)),
            b'`' if mode.lists_and_code() => text[i + 1..]
                .find('`')
                .map(|close| (Token::Code(&text[i + 1..i + 1 + close]), close + 2)),
            _ => None,
        };
        match found {
            Some((token, len)) => {
                if literal_start < i {
                    tokens.push(Token::Text(&text[literal_start..i]));
                }
                tokens.push(token);
                i += len;
                literal_start = i;
            },
            None => i += 1,
        }
    }
    if literal_start < bytes.len() {
        tokens.push(Token::Text(&text[literal_start..]));
    }
}

fn emit_paragraph(tokens: &[Token<'_>], out: &mut RunBuilder) {
    let mut stack: Vec<Delim> = Vec::new();
    let mut line_style = Style::PLAIN;
    let inline = |stack: &[Delim]| stack.iter().fold(Style::PLAIN, |s, d| d.apply(s));

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::LineStart(style) => line_style = *style,
            Token::Prefix(prefix) => {
                out.seal();
                out.push(prefix, line_style);
                out.seal();
            },
            Token::Text(text) => out.push(text, line_style.union(inline(&stack))),
            Token::Code(code) => out.push(code, line_style.union(inline(&stack)).union(Style::bold())),
            Token::Newline(nl) => out.push(nl, inline(&stack)),
            Token::Delim(delim, literal) => {
                if let Some(pos) = stack.iter().rposition(|d| d == delim) {
                    stack.truncate(pos);
                } else if has_closer(&tokens[idx + 1..], *delim) {
                    stack.push(*delim);
                } else {
                    out.push(literal, line_style.union(inline(&stack)));
                }
            },
        }
    }
}

fn has_closer(rest: &[Token<'_>], delim: Delim) -> bool {
    rest.iter()
        .any(|t| matches!(t, Token::Delim(d, _) if *d == delim))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(runs: &[StyledRun]) -> Vec<&str> {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn plain_text_is_one_unstyled_run() {
        for mode in [
            MarkupMode::RichText,
            MarkupMode::MarkdownBasic,
            MarkupMode::MarkdownHeaders,
            MarkupMode::MarkdownExtended,
        ] {
            let runs = parse("no tags here", mode);
            assert_eq!(runs, vec![StyledRun::plain("no tags here")], "{:?}", mode);
        }
    }

    #[test]
    fn empty_input_yields_no_runs() {
        assert!(parse("", MarkupMode::MarkdownBasic).is_empty());
        assert!(parse("", MarkupMode::RichText).is_empty());
    }

    #[test]
    fn markdown_bold_after_plain() {
        let runs = parse("Hello **World**", MarkupMode::MarkdownBasic);
        assert_eq!(
            runs,
            vec![StyledRun::plain("Hello "), StyledRun::text("World", Style::bold())]
        );
    }

    #[test]
    fn markdown_all_inline_delimiters() {
        let runs = parse("*i* __u__ ~~s~~", MarkupMode::MarkdownBasic);
        assert_eq!(texts(&runs), vec!["i", " ", "u", " ", "s"]);
        assert!(runs[0].style.italic);
        assert!(runs[2].style.underline);
        assert!(runs[4].style.strike);
    }

    #[test]
    fn nested_markdown_flags_are_ored() {
        let runs = parse("**bold *both* bold**", MarkupMode::MarkdownBasic);
        assert_eq!(texts(&runs), vec!["bold ", "both", " bold"]);
        assert!(runs[1].style.bold && runs[1].style.italic);
        assert!(runs[2].style.bold && !runs[2].style.italic);
    }

    #[test]
    fn unmatched_markdown_delimiter_is_literal() {
        let runs = parse("2 * 3 = 6", MarkupMode::MarkdownBasic);
        assert_eq!(runs, vec![StyledRun::plain("2 * 3 = 6")]);

        let runs = parse("**never closed", MarkupMode::MarkdownBasic);
        assert_eq!(runs, vec![StyledRun::plain("**never closed")]);
    }

    #[test]
    fn delimiters_do_not_cross_paragraphs() {
        let runs = parse("**a\n\nb**", MarkupMode::MarkdownBasic);
        assert!(runs.iter().all(|r| !r.style.bold));
        assert_eq!(runs.iter().map(|r| r.text.as_str()).collect::<String>(), "**a\n\nb**");
    }

    #[test]
    fn rich_tags_nest() {
        let runs = parse("<b>bold <i>both</i></b> plain", MarkupMode::RichText);
        assert_eq!(texts(&runs), vec!["bold ", "both", " plain"]);
        assert!(runs[0].style.bold && !runs[0].style.italic);
        assert!(runs[1].style.bold && runs[1].style.italic);
        assert!(runs[2].style.is_plain());
    }

    #[test]
    fn unterminated_rich_tag_runs_to_paragraph_end() {
        let runs = parse("<b>bold text", MarkupMode::RichText);
        assert_eq!(runs, vec![StyledRun::text("bold text", Style::bold())]);

        let runs = parse("<b>bold\n\nplain", MarkupMode::RichText);
        assert_eq!(texts(&runs), vec!["bold", "\n\nplain"]);
        assert!(runs[1].style.is_plain());
    }

    #[test]
    fn unmatched_rich_closer_is_ignored() {
        let runs = parse("a</b>b", MarkupMode::RichText);
        assert_eq!(runs, vec![StyledRun::plain("ab")]);
    }

    #[test]
    fn rich_closer_pops_through_inner_tags() {
        let runs = parse("<b><u>x</b>y", MarkupMode::RichText);
        assert_eq!(texts(&runs), vec!["x", "y"]);
        assert!(runs[0].style.bold && runs[0].style.underline);
        assert!(runs[1].style.is_plain());
    }

    #[test]
    fn unknown_tags_stay_literal() {
        let runs = parse("<p>hi</p> <b", MarkupMode::RichText);
        assert_eq!(runs, vec![StyledRun::plain("<p>hi</p> <b")]);
    }

    #[test]
    fn headers_need_header_mode() {
        let basic = parse("# Title", MarkupMode::MarkdownBasic);
        assert_eq!(basic, vec![StyledRun::plain("# Title")]);

        let runs = parse("## Title\nbody", MarkupMode::MarkdownHeaders);
        assert_eq!(texts(&runs), vec!["Title", "\nbody"]);
        assert_eq!(runs[0].style.header_level, Some(2));
        assert!(runs[0].style.bold);
        assert!(runs[1].style.is_plain());
    }

    #[test]
    fn four_hashes_are_not_a_header() {
        let runs = parse("#### deep", MarkupMode::MarkdownExtended);
        assert_eq!(runs, vec![StyledRun::plain("#### deep")]);
    }

    #[test]
    fn list_markers_become_prefix_runs() {
        let runs = parse("- apples\n2. pears", MarkupMode::MarkdownExtended);
        assert_eq!(texts(&runs), vec!["• ", "apples\n", "2. ", "pears"]);
        assert!(runs.iter().all(|r| r.style.is_plain()));
    }

    #[test]
    fn star_list_marker_is_not_italic_in_extended_mode() {
        let runs = parse("* item *x*", MarkupMode::MarkdownExtended);
        assert_eq!(texts(&runs), vec!["• ", "item ", "x"]);
        assert!(runs[2].style.italic);
    }

    #[test]
    fn code_spans_are_bold_and_literal() {
        let runs = parse("run `**x**` now", MarkupMode::MarkdownExtended);
        assert_eq!(texts(&runs), vec!["run ", "**x**", " now"]);
        assert!(runs[1].style.bold);

        let basic = parse("run `x`", MarkupMode::MarkdownBasic);
        assert_eq!(basic, vec![StyledRun::plain("run `x`")]);
    }
}
