//! Typology-aware structural scoring.

use super::headers::{extract_headers, split_lines};
use super::rules::{COMMON_RULES, Report, ScoringInput, page_rules};
use super::types::{Diagnostics, StructureStats, Typology};
use crate::extraction::DocumentStats;

/// Score, diagnostics and enriched statistics for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    /// Weighted sum of the rule contributions.
    pub score: f64,
    /// Failed or flagged checks.
    pub diagnostics: Diagnostics,
    /// Reader statistics enriched with text measurements and headers.
    pub stats: StructureStats,
}

/// Score a document against the rule table for its typology.
///
/// Statistics are always enriched. [`Typology::Unknown`] short-circuits to a zero score with a
/// single `typology` diagnostic; otherwise every rule is evaluated.
pub fn diagnose(text: &str, stats: &DocumentStats, typology: Typology) -> Diagnosis {
    let extraction = extract_headers(text);
    let clean_text = extraction.clean_text;
    let text_len = clean_text.chars().count();
    let line_lengths: Vec<usize> = split_lines(&clean_text)
        .into_iter()
        .map(|line| line.chars().count())
        .collect();
    let num_lines = line_lengths.len();
    let avg_line_len = if num_lines == 0 {
        0.0
    } else {
        line_lengths.iter().sum::<usize>() as f64 / num_lines as f64
    };

    let enriched = StructureStats {
        document: stats.clone(),
        typology,
        text_len,
        avg_line_len: round2(avg_line_len),
        num_lines,
        headers: extraction.headers,
    };

    let mut diagnostics = Diagnostics::new();
    if typology == Typology::Unknown {
        diagnostics.insert("typology".into(), "unknown document structure".into());
        return Diagnosis {
            score: 0.0,
            diagnostics,
            stats: enriched,
        };
    }

    let input = ScoringInput {
        text,
        typology,
        num_pages: stats.num_pages,
        bytes: stats.bytes,
        text_len,
        avg_line_len,
        headers: &enriched.headers,
    };

    let mut score = 0.0;
    for rule in page_rules(typology).iter().chain(COMMON_RULES) {
        let holds = (rule.holds)(&input);
        if holds {
            score += rule.weight;
        }
        match rule.report {
            Report::WhenMissing { key, reason } if !holds => {
                diagnostics.insert(key.into(), reason.into());
            }
            Report::WhenHolding { key, reason } if holds => {
                diagnostics.insert(key.into(), reason.into());
            }
            _ => {}
        }
    }

    tracing::debug!(
        typology = %typology,
        score,
        text_len,
        num_lines,
        failed_checks = diagnostics.len(),
        "Structure diagnosed"
    );

    Diagnosis {
        score,
        diagnostics,
        stats: enriched,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
