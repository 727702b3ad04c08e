//! Core types for the vocabulary program.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single catalog entry: one word of one chapter ("day") of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub book: String,
    pub day: String,
    pub word: String,
    pub meaning: String,
}

impl VocabItem {
    pub fn new(
        book: impl Into<String>,
        day: impl Into<String>,
        word: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            book: book.into(),
            day: day.into(),
            word: word.into(),
            meaning: meaning.into(),
        }
    }
}

/// Study or test mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// See the word, reveal the meaning, grade yourself.
    #[serde(alias = "learning")]
    LearnFlashcard,
    /// See the meaning, type the word.
    #[serde(alias = "subjective")]
    LearnSubjective,
    /// Flashcard pass over already mastered words.
    Review,
    /// Pick the meaning out of four choices.
    TestObjective,
    /// Type the word; graded for a score.
    TestSubjective,
}

impl SessionMode {
    pub const ALL: [SessionMode; 5] = [
        Self::LearnFlashcard,
        Self::LearnSubjective,
        Self::Review,
        Self::TestObjective,
        Self::TestSubjective,
    ];

    /// Test modes keep a score and log wrong answers instead of updating mastery.
    pub fn is_test(self) -> bool {
        matches!(self, Self::TestObjective | Self::TestSubjective)
    }

    /// Modes where the student types the word.
    pub fn is_subjective(self) -> bool {
        matches!(self, Self::LearnSubjective | Self::TestSubjective)
    }

    /// Modes where the meaning is revealed and the student grades themselves.
    pub fn is_self_graded(self) -> bool {
        matches!(self, Self::LearnFlashcard | Self::Review)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LearnFlashcard => "learn_flashcard",
            Self::LearnSubjective => "learn_subjective",
            Self::Review => "review",
            Self::TestObjective => "test_objective",
            Self::TestSubjective => "test_subjective",
        }
    }

    /// Parse from string. Accepts the legacy `learning`/`subjective` names.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "learn_flashcard" | "learning" => Some(Self::LearnFlashcard),
            "learn_subjective" | "subjective" => Some(Self::LearnSubjective),
            "review" => Some(Self::Review),
            "test_objective" => Some(Self::TestObjective),
            "test_subjective" => Some(Self::TestSubjective),
            _ => None,
        }
    }
}

/// Learning status of a (student, word) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    Learning,
    Mastered,
}

impl Default for MasteryStatus {
    fn default() -> Self {
        Self::Learning
    }
}

impl MasteryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    /// Parse from string. Anything unknown counts as still learning.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "mastered" => Self::Mastered,
            _ => Self::Learning,
        }
    }
}

/// Practice progress for one word of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub student_id: String,
    pub book: String,
    pub word: String,
    pub streak: u32,
    pub status: MasteryStatus,
}

impl MasteryRecord {
    /// A fresh record: no streak, still learning.
    pub fn new(student_id: &str, item: &VocabItem) -> Self {
        Self {
            student_id: student_id.to_string(),
            book: item.book.clone(),
            word: item.word.clone(),
            streak: 0,
            status: MasteryStatus::Learning,
        }
    }
}

/// A word missed during a test. At most one per (student, word).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestWrongRecord {
    pub student_id: String,
    pub book: String,
    pub word: String,
    pub date: NaiveDate,
}

/// Result of judging one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Wrong,
}

impl AnswerOutcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Wrong
        }
    }

    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

/// A finished test, as appended to the test log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabTestLog {
    pub student_id: String,
    /// `YYYY-MM-DD HH:MM`
    pub date: String,
    pub info: String,
    /// `score/total`
    pub score: String,
}
