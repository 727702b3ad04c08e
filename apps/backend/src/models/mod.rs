//! Sheet records and API types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Re-export shared types from vocab-core
pub use vocab_core::types::{
    AnswerOutcome, MasteryRecord, MasteryStatus, SessionMode, TestWrongRecord, VocabItem,
    VocabTestLog,
};
pub use vocab_core::{Phase, ProgressEntry, SessionSummary, Submission, TestWrongEntry};

/// The head teacher account. Only it manages teachers, and it cannot be deleted.
pub const ADMIN_ID: &str = "admin";

// === Sheet Records ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            "parent" => Some(Role::Parent),
            _ => None,
        }
    }
}

/// Account row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// sha-256 hex digest (legacy rows may still hold plaintext)
    #[serde(skip_serializing, default)]
    pub pw: String,
    pub name: String,
    pub role: Role,
    /// Teachers only: subject taught
    pub subject: String,
    /// Parents only: id of their child
    pub linked_student: String,
    pub math_class: String,
    pub eng_class: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.id == ADMIN_ID
    }

    pub fn in_class(&self, class: &str) -> bool {
        self.math_class == class || self.eng_class == class
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningLogEntry {
    pub student_id: String,
    pub date: String,
    pub content: String,
    pub teacher_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub student_id: String,
    pub exam_name: String,
    pub subject: String,
    /// Kept as entered; non-numeric values are skipped by averages
    pub score: String,
    pub date: String,
}

/// One question image of an exam paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub exam_name: String,
    pub question_no: u32,
    pub image_key: String,
    pub video_url: String,
}

/// A student's note on a missed exam question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeNote {
    pub student_id: String,
    pub exam_name: String,
    pub question_no: u32,
    pub memo: String,
}

// === Auth API Types ===

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// === User API Types ===

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub math_class: String,
    #[serde(default)]
    pub eng_class: String,
    #[serde(default)]
    pub linked_student: String,
}

/// Fields left out keep their current value; a blank password keeps the
/// current hash.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub subject: Option<String>,
    pub math_class: Option<String>,
    pub eng_class: Option<String>,
    pub linked_student: Option<String>,
}

// === Vocabulary API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportVocabRequest {
    pub book: String,
    /// CSV text with day, word and meaning columns
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ImportVocabResponse {
    pub book: String,
    pub imported: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenameBookRequest {
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct BookChangeResponse {
    pub book: String,
    pub affected: usize,
}

// === Study API Types ===

/// Where the words of a new session come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StudySource {
    /// Unmastered words of one chapter
    Chapter { book: String, day: String },
    /// Words of one chapter the student got wrong
    ChapterWrongs { book: String, day: String },
    /// Every word still being learned
    PracticeWrongs,
    /// Every mastered word
    MasteredReview,
    /// Random sample of a day range
    Test {
        book: String,
        start_day: String,
        end_day: String,
        count: usize,
    },
    /// Every word missed in a test
    TestWrongs,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub source: StudySource,
    pub mode: SessionMode,
}

/// The current card, with the parts the student must produce hidden.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub book: String,
    pub day: String,
    pub word: Option<String>,
    pub meaning: Option<String>,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub mode: SessionMode,
    pub info: String,
    pub cursor: usize,
    pub total: usize,
    pub score: u32,
    pub phase: Phase,
    pub finished: bool,
    pub last_result: Option<AnswerOutcome>,
    pub card: Option<CardView>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub outcome: AnswerOutcome,
    pub word: String,
    pub meaning: String,
    pub cursor: usize,
    pub total: usize,
    pub score: u32,
    pub finished: bool,
    /// The word counts as mastered after this answer
    pub mastered: bool,
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub student_id: Option<String>,
}

// === Record API Types ===

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub student_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddLogRequest {
    pub student_id: String,
    pub date: NaiveDate,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogContent {
    pub content: String,
    pub teacher_name: String,
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceLogsRequest {
    pub student_id: String,
    pub date: NaiveDate,
    pub entries: Vec<LogContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddScoreRequest {
    pub student_id: String,
    pub exam_name: String,
    pub subject: String,
    pub score: u32,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub student_id: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreView {
    #[serde(flatten)]
    pub entry: ScoreEntry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAverage {
    pub exam_name: String,
    pub subject: String,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TestLogView {
    #[serde(flatten)]
    pub log: VocabTestLog,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongSource {
    Practice,
    Test,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub student_id: Option<String>,
    pub source: WrongSource,
}

// === Exam API Types ===

#[derive(Debug, Serialize)]
pub struct ExamUploadResponse {
    pub exam_name: String,
    pub uploaded: usize,
    /// File names that were not `<number>.<ext>`
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    #[serde(flatten)]
    pub question: ExamQuestion,
    pub start_seconds: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoLink {
    pub question_no: u32,
    pub video_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateVideoLinksRequest {
    pub links: Vec<VideoLink>,
}

// === Mistake Note API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct AddNotesRequest {
    pub exam_name: String,
    pub question_nos: Vec<u32>,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Serialize)]
pub struct AddNotesResponse {
    pub added: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: MistakeNote,
    pub image_key: Option<String>,
    pub video_url: Option<String>,
    pub start_seconds: u32,
}
