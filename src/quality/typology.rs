//! Heuristic typology classification from headings, keywords and page count.

use super::rules::{
    BRIEF_KEYWORDS, CLASSIFY_WINDOW, MAX_BRIEF_PAGES, MAX_PROMO_PAGES, MIN_DELIVERABLE_PAGES,
    MIN_REPORT_PAGES, PROJECT_KEYWORDS, PROMO_KEYWORDS,
};
use super::types::Typology;
use crate::extraction::DocumentStats;
use regex::Regex;
use std::sync::LazyLock;

static REFERENCES_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(references|bibliography)\s*$").expect("references pattern compiles")
});
static SCIENTIFIC_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(abstract|introduction|methodology)\s*$")
        .expect("section pattern compiles")
});
static TOC_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(table of contents|contents|index)\s*$").expect("toc pattern compiles")
});

/// Lower-cased views of the text used by the classifier.
struct ClassifySample {
    /// Opening characters: titles, abstracts, document codes.
    head: String,
    /// Closing characters: references, appendices, contact details.
    tail: String,
    /// Head and tail with whitespace collapsed, for keyword lookups.
    keywords: String,
}

impl ClassifySample {
    fn new(text: &str) -> Self {
        let char_count = text.chars().count();
        let head: String = text.chars().take(CLASSIFY_WINDOW).collect::<String>().to_lowercase();
        let tail: String = text
            .chars()
            .skip(char_count.saturating_sub(CLASSIFY_WINDOW))
            .collect::<String>()
            .to_lowercase();
        let keywords = format!("{head} {tail}")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            head,
            tail,
            keywords,
        }
    }

    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.keywords.contains(keyword))
    }
}

/// Assign a typology to a document.
///
/// Rules are evaluated in order and the first match wins, so a long paper with reference and
/// section headings stays [`Typology::Scientific`] even when it mentions a "guide".
pub fn classify(text: &str, stats: &DocumentStats) -> Typology {
    let num_pages = stats.num_pages;
    let sample = ClassifySample::new(text);

    let has_references = REFERENCES_HEADING.is_match(&sample.tail);
    let has_sections = SCIENTIFIC_HEADING.is_match(&sample.head);
    if has_references && has_sections {
        return Typology::Scientific;
    }

    if num_pages <= MAX_BRIEF_PAGES && sample.has_any(BRIEF_KEYWORDS) {
        return Typology::Brief;
    }

    if num_pages <= MAX_PROMO_PAGES && sample.has_any(PROMO_KEYWORDS) {
        return Typology::Promo;
    }

    let has_toc = TOC_HEADING.is_match(&sample.head);
    let is_project = sample.has_any(PROJECT_KEYWORDS) || has_toc;
    if is_project
        || (num_pages >= MIN_DELIVERABLE_PAGES && (has_toc || sample.head.contains("version")))
    {
        return Typology::ProjectDeliverable;
    }

    if num_pages > MIN_REPORT_PAGES {
        return Typology::ProjectReport;
    }
    if num_pages <= MAX_PROMO_PAGES {
        return Typology::PromotionalFlyer;
    }

    Typology::Unknown
}
