//! Typed access to the academy tables.

use std::sync::Arc;

use chrono::NaiveDate;
use vocab_core::{Catalog, MasteryStore};

use super::{row, Row, SheetStore, StoreError};
use crate::models::*;

/// A record stored as one row of a named table.
pub trait SheetRecord: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Read a row. Cells that do not parse fall back to defaults.
    fn from_row(row: &Row) -> Self;

    fn to_row(&self) -> Row;
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

fn number_cell(row: &Row, column: &str) -> u32 {
    let text = cell(row, column);
    let text = text.trim();
    text.parse::<u32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(|n| n.max(0.0) as u32))
        .unwrap_or(0)
}

impl SheetRecord for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "pw",
        "name",
        "role",
        "subject",
        "linked_student",
        "math_class",
        "eng_class",
    ];

    fn from_row(r: &Row) -> Self {
        Self {
            id: cell(r, "id"),
            pw: cell(r, "pw"),
            name: cell(r, "name"),
            role: Role::parse(&cell(r, "role")).unwrap_or(Role::Student),
            subject: cell(r, "subject"),
            linked_student: cell(r, "linked_student"),
            math_class: cell(r, "math_class"),
            eng_class: cell(r, "eng_class"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("id", self.id.as_str()),
            ("pw", self.pw.as_str()),
            ("name", self.name.as_str()),
            ("role", self.role.as_str()),
            ("subject", self.subject.as_str()),
            ("linked_student", self.linked_student.as_str()),
            ("math_class", self.math_class.as_str()),
            ("eng_class", self.eng_class.as_str()),
        ])
    }
}

impl SheetRecord for VocabItem {
    const TABLE: &'static str = "vocab";
    const COLUMNS: &'static [&'static str] = &["book", "day", "word", "meaning"];

    fn from_row(r: &Row) -> Self {
        VocabItem::new(cell(r, "book"), cell(r, "day"), cell(r, "word"), cell(r, "meaning"))
    }

    fn to_row(&self) -> Row {
        row([
            ("book", self.book.as_str()),
            ("day", self.day.as_str()),
            ("word", self.word.as_str()),
            ("meaning", self.meaning.as_str()),
        ])
    }
}

impl SheetRecord for MasteryRecord {
    const TABLE: &'static str = "vocab_prog";
    const COLUMNS: &'static [&'static str] = &["student_id", "book", "word", "streak", "status"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            book: cell(r, "book"),
            word: cell(r, "word"),
            streak: number_cell(r, "streak"),
            status: MasteryStatus::parse_lenient(&cell(r, "status")),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.clone()),
            ("book", self.book.clone()),
            ("word", self.word.clone()),
            ("streak", self.streak.to_string()),
            ("status", self.status.as_str().to_string()),
        ])
    }
}

impl SheetRecord for TestWrongRecord {
    const TABLE: &'static str = "vocab_test_wrongs";
    const COLUMNS: &'static [&'static str] = &["student_id", "book", "word", "date"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            book: cell(r, "book"),
            word: cell(r, "word"),
            date: NaiveDate::parse_from_str(cell(r, "date").trim(), "%Y-%m-%d").unwrap_or_default(),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.clone()),
            ("book", self.book.clone()),
            ("word", self.word.clone()),
            ("date", self.date.format("%Y-%m-%d").to_string()),
        ])
    }
}

impl SheetRecord for VocabTestLog {
    const TABLE: &'static str = "vocab_test_log";
    const COLUMNS: &'static [&'static str] = &["student_id", "date", "info", "score"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            date: cell(r, "date"),
            info: cell(r, "info"),
            score: cell(r, "score"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.as_str()),
            ("date", self.date.as_str()),
            ("info", self.info.as_str()),
            ("score", self.score.as_str()),
        ])
    }
}

impl SheetRecord for LearningLogEntry {
    const TABLE: &'static str = "learning_log";
    const COLUMNS: &'static [&'static str] =
        &["student_id", "date", "content", "teacher_name", "subject"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            date: cell(r, "date"),
            content: cell(r, "content"),
            teacher_name: cell(r, "teacher_name"),
            subject: cell(r, "subject"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.as_str()),
            ("date", self.date.as_str()),
            ("content", self.content.as_str()),
            ("teacher_name", self.teacher_name.as_str()),
            ("subject", self.subject.as_str()),
        ])
    }
}

impl SheetRecord for ScoreEntry {
    const TABLE: &'static str = "score";
    const COLUMNS: &'static [&'static str] = &["student_id", "exam_name", "subject", "score", "date"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            exam_name: cell(r, "exam_name"),
            subject: cell(r, "subject"),
            score: cell(r, "score"),
            date: cell(r, "date"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.as_str()),
            ("exam_name", self.exam_name.as_str()),
            ("subject", self.subject.as_str()),
            ("score", self.score.as_str()),
            ("date", self.date.as_str()),
        ])
    }
}

impl SheetRecord for ExamQuestion {
    const TABLE: &'static str = "exam";
    const COLUMNS: &'static [&'static str] = &["exam_name", "question_no", "image_key", "video_url"];

    fn from_row(r: &Row) -> Self {
        Self {
            exam_name: cell(r, "exam_name"),
            question_no: number_cell(r, "question_no"),
            image_key: cell(r, "image_key"),
            video_url: cell(r, "video_url"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("exam_name", self.exam_name.clone()),
            ("question_no", self.question_no.to_string()),
            ("image_key", self.image_key.clone()),
            ("video_url", self.video_url.clone()),
        ])
    }
}

impl SheetRecord for MistakeNote {
    const TABLE: &'static str = "mynote";
    const COLUMNS: &'static [&'static str] = &["student_id", "exam_name", "question_no", "memo"];

    fn from_row(r: &Row) -> Self {
        Self {
            student_id: cell(r, "student_id"),
            exam_name: cell(r, "exam_name"),
            question_no: number_cell(r, "question_no"),
            memo: cell(r, "memo"),
        }
    }

    fn to_row(&self) -> Row {
        row([
            ("student_id", self.student_id.clone()),
            ("exam_name", self.exam_name.clone()),
            ("question_no", self.question_no.to_string()),
            ("memo", self.memo.clone()),
        ])
    }
}

/// Typed wrapper over a [`SheetStore`].
#[derive(Clone)]
pub struct Sheets {
    store: Arc<dyn SheetStore>,
}

impl Sheets {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    /// Load every record of `T`'s table.
    pub async fn load<T: SheetRecord>(&self) -> Result<Vec<T>, StoreError> {
        let rows = self.store.load(T::TABLE, T::COLUMNS).await?;
        Ok(rows.iter().map(T::from_row).collect())
    }

    /// Overwrite `T`'s table with `records`.
    pub async fn save<T: SheetRecord>(&self, records: &[T]) -> Result<(), StoreError> {
        let rows: Vec<Row> = records.iter().map(T::to_row).collect();
        self.store.save(T::TABLE, &rows).await
    }

    /// Append `records` to `T`'s table.
    pub async fn append<T: SheetRecord>(&self, records: Vec<T>) -> Result<(), StoreError> {
        let mut all = self.load::<T>().await?;
        all.extend(records);
        self.save(&all).await
    }

    // === Users Repository ===

    pub async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.load::<User>().await?.into_iter().find(|u| u.id == id))
    }

    /// Write `defaults` when the users table is empty. Returns whether it did.
    pub async fn seed_users(&self, defaults: Vec<User>) -> Result<bool, StoreError> {
        if !self.load::<User>().await?.is_empty() {
            return Ok(false);
        }
        self.save(&defaults).await?;
        Ok(true)
    }

    // === Vocabulary Repository ===

    pub async fn catalog(&self) -> Result<Catalog, StoreError> {
        Ok(Catalog::new(self.load::<VocabItem>().await?))
    }

    pub async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.save(catalog.items()).await
    }

    // === Mastery Repository ===

    /// Practice progress and test wrongs of every student.
    pub async fn mastery(&self) -> Result<MasteryStore, StoreError> {
        let progress = self.load::<MasteryRecord>().await?;
        let test_wrongs = self.load::<TestWrongRecord>().await?;
        Ok(MasteryStore::from_parts(progress, test_wrongs))
    }

    pub async fn save_progress(&self, store: &MasteryStore) -> Result<(), StoreError> {
        let records: Vec<MasteryRecord> = store.records().cloned().collect();
        self.save(&records).await
    }

    pub async fn save_test_wrongs(&self, store: &MasteryStore) -> Result<(), StoreError> {
        self.save(store.test_wrongs()).await
    }
}
