//! Error types for vocab-core.

use thiserror::Error;

use crate::types::SessionMode;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Misuse of the session state machine. The session is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is finished")]
    Finished,

    #[error("session is not finished yet ({remaining} items left)")]
    NotFinished { remaining: usize },

    #[error("{submission} answers are not accepted in {mode} mode")]
    SubmissionMismatch {
        submission: &'static str,
        mode: &'static str,
    },

    #[error("meaning must be revealed before grading")]
    NotRevealed,

    #[error("{action} is not available in {mode} mode")]
    UnsupportedAction {
        action: &'static str,
        mode: &'static str,
    },

    #[error("waiting for the revealed word to be copied")]
    AwaitingCopy,

    #[error("nothing to copy: the answer was not given up")]
    NothingToCopy,
}

impl SessionError {
    pub(crate) fn unsupported(action: &'static str, mode: SessionMode) -> Self {
        Self::UnsupportedAction {
            action,
            mode: mode.as_str(),
        }
    }
}

/// Errors that can occur while importing a word list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("missing required columns: {0}")]
    MissingColumns(String),

    #[error("unterminated quoted field starting at line {line}")]
    UnterminatedQuote { line: usize },

    #[error("empty file")]
    EmptyFile,

    #[error("unreadable workbook: {0}")]
    Workbook(String),
}
