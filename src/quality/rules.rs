//! Thresholds, keyword lists and the declarative scoring rule table.
//!
//! Scoring is data-driven: each [`Rule`] pairs a predicate over [`ScoringInput`] with the weight
//! it contributes and the diagnostic it reports. Page-count rules are keyed by typology
//! ([`page_rules`]); the remaining checks apply to every assessable document ([`COMMON_RULES`]).

use super::types::{Headers, Typology};

/// Minimum structural score for a document to be considered valid.
pub const MIN_SCORE: f64 = 6.0;

/// Minimum file size, in bytes, for the size check to pass.
pub const MIN_BYTES: u64 = 20_000;
/// Minimum cleaned text length for the density check to pass.
pub const MIN_TEXT_LEN: usize = 300;
/// Cleaned text length above which long-form typologies earn a bonus.
pub const MAX_TEXT_LEN: usize = 10_000;
/// Minimum average line length; shorter lines suggest broken text or bad OCR.
pub const LINE_LEN: f64 = 20.0;

/// Shortest accepted title, in characters.
pub const TITLE_MIN_LEN: usize = 5;
/// Longest accepted title, in characters.
pub const TITLE_MAX_LEN: usize = 300;
/// Longest accepted subtitle, in characters.
pub const SUBTITLE_MAX_LEN: usize = 400;
/// Lines shorter than this are treated as layout artifacts.
pub const ARTIFACT_MAX_LEN: usize = 3;
/// Number of leading lines scanned for a title.
pub const HEADER_SCAN_LINES: usize = 20;

/// Below this many characters per page, multi-page documents are considered empty.
pub const MIN_CHARS_PER_PAGE: usize = 200;
/// Page count above which the sparse-content guard applies.
pub const SPARSE_GUARD_MIN_PAGES: usize = 2;

/// Longest brief or practice abstract.
pub const MAX_BRIEF_PAGES: usize = 5;
/// Shortest scientific paper.
pub const MIN_SCIENTIFIC_PAGES: usize = 3;
/// Scientific papers above this length receive a warning penalty.
pub const MAX_SCIENTIFIC_PAGES: usize = 15;
/// Shortest project deliverable.
pub const MIN_DELIVERABLE_PAGES: usize = 6;
/// Shortest project report.
pub const MIN_REPORT_PAGES: usize = 50;
/// Longest promotional document.
pub const MAX_PROMO_PAGES: usize = 4;

/// Characters taken from each end of the text when classifying.
pub const CLASSIFY_WINDOW: usize = 5_000;

/// Self-identifying phrases of briefs and practice abstracts.
pub const BRIEF_KEYWORDS: &[&str] = &[
    "practice abstract",
    "policy brief",
    "factsheet",
    "executive summary",
    "practical",
    "solution",
    "outcome",
    "roadmap",
    "recommendations",
    "about this abstract",
    "about the project",
    "further information",
    "more info",
];

/// Newsletter and event vocabulary.
pub const PROMO_KEYWORDS: &[&str] = &[
    "newsletter",
    "news",
    "boletín",
    "kick-off",
    "meeting",
    "seminar",
    "highlights",
    "agenda",
    "save the date",
];

/// Deliverable, guide and training vocabulary.
pub const PROJECT_KEYWORDS: &[&str] = &[
    "deliverable",
    "grant agreement",
    "work package",
    "due date",
    "submission date",
    "conceptual framework",
    "guidelines",
    "best practice",
    "training module",
    "tutorial",
    "instructions",
    "handbook",
    "manual",
    "guide",
    "educational material",
    "lesson plan",
    "curriculum",
    "syllabus",
    "training kit",
];

/// Phrases of a funding acknowledgement.
pub const FUNDING_KEYWORDS: &[&str] = &[
    "funded",
    "funds",
    "received funding from",
    "horizon 2020",
    "horizon europe",
    "grant agreement",
];

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    /// Raw extracted text.
    pub text: &'a str,
    /// Assigned typology.
    pub typology: Typology,
    /// Page count.
    pub num_pages: usize,
    /// File size in bytes.
    pub bytes: u64,
    /// Cleaned text length in characters.
    pub text_len: usize,
    /// Mean line length of the cleaned text.
    pub avg_line_len: f64,
    /// Extracted headers.
    pub headers: &'a Headers,
}

/// When a rule writes a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Report `key: reason` when the predicate does not hold.
    WhenMissing {
        /// Diagnostic key.
        key: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Report `key: reason` when the predicate holds.
    WhenHolding {
        /// Diagnostic key.
        key: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Contribute to the score without reporting.
    Silent,
}

/// One weighted scoring check.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Short name of the check.
    pub check: &'static str,
    /// Added to the score when the predicate holds (may be negative).
    pub weight: f64,
    /// Predicate evaluated against the document.
    pub holds: fn(&ScoringInput<'_>) -> bool,
    /// Diagnostic behaviour.
    pub report: Report,
}

const PROMO_PAGE_RULES: &[Rule] = &[Rule {
    check: "promo_pages",
    weight: 2.0,
    holds: |input| input.num_pages <= MAX_PROMO_PAGES,
    report: Report::WhenMissing {
        key: "typology_mismatch",
        reason: "promotional material too long (>4 pages)",
    },
}];

const SCIENTIFIC_PAGE_RULES: &[Rule] = &[
    Rule {
        check: "scientific_pages",
        weight: 2.0,
        holds: |input| input.num_pages >= MIN_SCIENTIFIC_PAGES,
        report: Report::WhenMissing {
            key: "typology_mismatch",
            reason: "scientific paper too short (<3 pages)",
        },
    },
    Rule {
        check: "scientific_length_warning",
        weight: -1.0,
        holds: |input| input.num_pages > MAX_SCIENTIFIC_PAGES,
        report: Report::WhenHolding {
            key: "typology_warning",
            reason: "scientific paper unusually long (>15 pages)",
        },
    },
];

const BRIEF_PAGE_RULES: &[Rule] = &[Rule {
    check: "brief_pages",
    weight: 2.0,
    holds: |input| input.num_pages <= MAX_BRIEF_PAGES,
    report: Report::WhenMissing {
        key: "typology_mismatch",
        reason: "brief/abstract too long (>5 pages)",
    },
}];

const DELIVERABLE_PAGE_RULES: &[Rule] = &[Rule {
    check: "deliverable_pages",
    weight: 2.0,
    holds: |input| input.num_pages >= MIN_DELIVERABLE_PAGES,
    report: Report::WhenMissing {
        key: "typology_mismatch",
        reason: "deliverable too short (<6 pages)",
    },
}];

const REPORT_PAGE_RULES: &[Rule] = &[Rule {
    check: "report_pages",
    weight: 2.0,
    holds: |input| input.num_pages >= MIN_REPORT_PAGES,
    report: Report::WhenMissing {
        key: "typology_mismatch",
        reason: "volume/report too small (<50 pages)",
    },
}];

/// Page-count rules for a typology.
pub fn page_rules(typology: Typology) -> &'static [Rule] {
    match typology {
        Typology::Promo | Typology::PromotionalFlyer => PROMO_PAGE_RULES,
        Typology::Scientific => SCIENTIFIC_PAGE_RULES,
        Typology::Brief => BRIEF_PAGE_RULES,
        Typology::ProjectDeliverable => DELIVERABLE_PAGE_RULES,
        Typology::ProjectReport => REPORT_PAGE_RULES,
        Typology::Unknown => &[],
    }
}

/// Checks applied to every assessable document, in reporting order.
pub const COMMON_RULES: &[Rule] = &[
    Rule {
        check: "funding",
        weight: 1.0,
        holds: has_funding_statement,
        report: Report::WhenHolding {
            key: "funding_check",
            reason: "valid EU Funding statement found",
        },
    },
    Rule {
        check: "file_size",
        weight: 1.0,
        holds: |input| input.bytes > MIN_BYTES,
        report: Report::WhenMissing {
            key: "file_size",
            reason: "file too small or empty",
        },
    },
    Rule {
        check: "text_density",
        weight: 2.0,
        holds: |input| input.text_len > MIN_TEXT_LEN,
        report: Report::WhenMissing {
            key: "text_density",
            reason: "not enough text content",
        },
    },
    Rule {
        check: "long_form_bonus",
        weight: 1.0,
        holds: |input| input.typology.is_long_form() && input.text_len > MAX_TEXT_LEN,
        report: Report::Silent,
    },
    Rule {
        check: "line_length",
        weight: 1.0,
        holds: |input| input.avg_line_len > LINE_LEN,
        report: Report::WhenMissing {
            key: "text_quality",
            reason: "broken text or bad OCR (short lines)",
        },
    },
    Rule {
        check: "title",
        weight: 1.0,
        holds: |input| input.headers.title.is_some(),
        report: Report::WhenMissing {
            key: "title",
            reason: "title not identifiable",
        },
    },
    Rule {
        check: "subtitle",
        weight: 0.5,
        holds: |input| input.headers.title.is_some() && input.headers.subtitle.is_some(),
        report: Report::Silent,
    },
];

fn has_funding_statement(input: &ScoringInput<'_>) -> bool {
    let lower = input.text.to_lowercase();
    FUNDING_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
