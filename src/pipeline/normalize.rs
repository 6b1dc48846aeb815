//! Deterministic text cleanup on both sides of a provider call.
//!
//! Two entry points:
//!
//! - [`clean_extracted_text`] flattens text pulled out of a PDF. PDF text
//!   layers break lines at layout boundaries rather than sentence
//!   boundaries, so every whitespace run becomes a single space. The free
//!   chain's sentence splitter relies on that.
//! - [`normalize_translation`] tidies a model's answer before the
//!   acceptance gate measures it. Models wrap output in code fences or pad
//!   it with zero-width characters often enough that measuring raw output
//!   would accept noise and reject real translations.

use once_cell::sync::Lazy;
use regex::Regex;

/// Flatten PDF text: CRLF to LF, whitespace runs to one space, no space
/// before `, . ; : ! ?`, trimmed.
pub fn clean_extracted_text(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n");
    let s = RE_WHITESPACE_RUN.replace_all(&s, " ");
    let s = RE_SPACE_BEFORE_PUNCT.replace_all(&s, "$1");
    s.trim().to_string()
}

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());

/// Clean a model's translation before acceptance.
///
/// Passes, in order:
/// 1. Drop an outer ```` ``` ```` / ```` ```markdown ```` fence around the whole answer
/// 2. CRLF and lone CR to LF
/// 3. Strip trailing whitespace on each line
/// 4. Squeeze three or more blank lines down to two
/// 5. Remove zero-width and BOM characters
/// 6. Trim the ends
pub fn normalize_translation(raw: &str) -> String {
    let s = unwrap_fence(raw);
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = s
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let s = RE_EXCESS_BLANKS.replace_all(&s, "\n\n\n");
    let s = s.replace(INVISIBLE, "");
    s.trim().to_string()
}

static RE_FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap()
});

static RE_EXCESS_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

fn unwrap_fence(input: &str) -> String {
    let trimmed = input.trim();
    match RE_FENCED.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}
