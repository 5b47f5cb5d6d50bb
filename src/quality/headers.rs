//! Title and subtitle detection on the first lines of a document.

use super::rules::{
    ARTIFACT_MAX_LEN, HEADER_SCAN_LINES, SUBTITLE_MAX_LEN, TITLE_MAX_LEN, TITLE_MIN_LEN,
};
use super::types::Headers;
use regex::RegexSet;
use std::sync::LazyLock;

/// Page numbers, URLs, ISSN codes, watermarks, copyright lines and dates.
static NOISE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^page\s+\d+$",
        r"^\d+\s*$",
        r"(?i)^https?://",
        r"(?i)^www\.",
        r"(?i)^issn\s+[\d\-x]+",
        r"(?i)^draft$",
        r"^©",
        r"^\d{1,2}/\d{1,2}/\d{2,4}",
    ])
    .expect("noise patterns compile")
});

/// EU funding boilerplate that often precedes the real title.
const BOILERPLATE: &[&str] = &[
    "received funding from",
    "grant agreement",
    "horizon 2020",
    "project acronym",
    "project no",
    "dissemination level",
    "call identifier",
];

/// Headers plus the cleaned text they were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderExtraction {
    /// Detected title and subtitle.
    pub headers: Headers,
    /// Input text with surrounding whitespace removed.
    pub clean_text: String,
}

/// Split `text` at every line boundary found in extracted text.
///
/// Besides `\n` and `\r\n` this breaks on a lone `\r`, vertical tab, form feed, the file/group/
/// record separators, NEL and the Unicode line and paragraph separators. A trailing boundary does
/// not produce an empty final line.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(&text[start..index]);
        start = index + ch.len_utf8();
        if ch == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n') {
            chars.next();
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_noise(line: &str) -> bool {
    if NOISE.is_match(line) || line.chars().count() < ARTIFACT_MAX_LEN {
        return true;
    }
    let lower = line.to_lowercase();
    BOILERPLATE.iter().any(|phrase| lower.contains(phrase))
}

/// Find the title and an adjacent subtitle among the first non-empty lines of `text`.
///
/// The title is the first non-noise line within the scan window whose length lies in
/// `[TITLE_MIN_LEN, TITLE_MAX_LEN]`. A subtitle is only taken from the line directly after
/// the title; if that line is noise or too long, no subtitle is reported.
pub fn extract_headers(text: &str) -> HeaderExtraction {
    let lines: Vec<&str> = split_lines(text)
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut headers = Headers::default();
    let mut title_index = None;

    for (index, line) in lines.iter().take(HEADER_SCAN_LINES).enumerate() {
        if is_noise(line) {
            continue;
        }
        let len = line.chars().count();

        match title_index {
            None => {
                if (TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
                    headers.title = Some((*line).to_string());
                    title_index = Some(index);
                }
            }
            Some(title_at) => {
                if index == title_at + 1 && len <= SUBTITLE_MAX_LEN {
                    headers.subtitle = Some((*line).to_string());
                }
                break;
            }
        }
    }

    HeaderExtraction {
        headers,
        clean_text: text.trim().to_string(),
    }
}
