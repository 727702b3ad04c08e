//! Answer matching for typed and multiple-choice answers.
//!
//! There is no partial credit: anything that is not a match after
//! normalization is wrong.

use crate::types::SessionMode;
use serde::{Deserialize, Serialize};

/// How a submitted answer is compared to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    Exact,
    CaseInsensitive,
}

impl MatchingMode {
    /// Typed spellings ignore case; chosen meanings must match exactly.
    pub fn for_session(mode: SessionMode) -> Self {
        if mode.is_subjective() {
            Self::CaseInsensitive
        } else {
            Self::Exact
        }
    }
}

/// Result of comparing a submitted answer to the correct answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_correct: bool,
    pub matching_mode: MatchingMode,
    /// Normalized submitted answer (for display).
    pub submitted_normalized: String,
    /// Normalized correct answer (for display).
    pub correct_normalized: String,
}

/// Compare a submitted answer to the correct answer.
pub fn compare_answers(submitted: &str, correct: &str, mode: MatchingMode) -> MatchResult {
    let submitted_normalized = normalize_whitespace(submitted);
    let correct_normalized = normalize_whitespace(correct);

    let is_correct = match mode {
        MatchingMode::Exact => submitted_normalized == correct_normalized,
        MatchingMode::CaseInsensitive => {
            submitted_normalized.to_lowercase() == correct_normalized.to_lowercase()
        }
    };

    MatchResult {
        is_correct,
        matching_mode: mode,
        submitted_normalized,
        correct_normalized,
    }
}

/// Normalize whitespace in a string (trim and collapse multiple spaces).
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
