//! Vocabulary study core shared by the academy backend.
//!
//! Provides:
//! - Session Engine driving learn, review and test sessions
//! - Mastery Store with streak-based mastery transitions
//! - Remediation queues (practice wrongs, mastered words, test wrongs)
//! - Answer matching and multiple-choice generation
//! - CSV word-list import and printable wrong-word sheets

pub mod catalog;
pub mod error;
pub mod export;
pub mod mastery;
pub mod matching;
pub mod parser;
pub mod quiz;
pub mod remediation;
pub mod session;
pub mod types;

pub use catalog::{natural_cmp, Catalog};
pub use error::{ImportError, Result, SessionError};
pub use export::{to_csv, two_column_sheet, SheetRow};
pub use mastery::{mastery_threshold, MasteryStore, RecordOutcome};
pub use matching::{compare_answers, MatchResult, MatchingMode};
pub use parser::{parse, parse_xlsx};
pub use quiz::build_choices;
pub use remediation::{ProgressEntry, TestWrongEntry};
pub use session::{AnswerReport, Phase, Session, SessionSummary, Submission};
pub use types::{
    AnswerOutcome, MasteryRecord, MasteryStatus, SessionMode, TestWrongRecord, VocabItem,
    VocabTestLog,
};
