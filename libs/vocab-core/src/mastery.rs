//! Mastery progress per (student, word) and the cumulative test-wrongs log.
//!
//! Learning and review answers move a correctness streak; once the streak
//! reaches the threshold for the mode the word counts as mastered. Test
//! answers never touch the streak. A missed test word is logged once per
//! student instead.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{MasteryRecord, MasteryStatus, SessionMode, TestWrongRecord, VocabItem};

/// Streak required for mastery, keyed by session mode and the status the
/// word had before the answer. Test modes have no entry.
const MASTERY_THRESHOLDS: [(SessionMode, MasteryStatus, u32); 6] = [
    (SessionMode::LearnFlashcard, MasteryStatus::Learning, 2),
    (SessionMode::LearnFlashcard, MasteryStatus::Mastered, 4),
    (SessionMode::LearnSubjective, MasteryStatus::Learning, 2),
    (SessionMode::LearnSubjective, MasteryStatus::Mastered, 2),
    (SessionMode::Review, MasteryStatus::Learning, 2),
    (SessionMode::Review, MasteryStatus::Mastered, 4),
];

/// Look up the mastery threshold. `None` for test modes.
pub fn mastery_threshold(mode: SessionMode, prior: MasteryStatus) -> Option<u32> {
    MASTERY_THRESHOLDS
        .iter()
        .find(|(m, s, _)| *m == mode && *s == prior)
        .map(|(_, _, threshold)| *threshold)
}

/// Apply one answer to a record. Returns the updated record.
pub fn apply_answer(record: &MasteryRecord, correct: bool, threshold: u32) -> MasteryRecord {
    let mut next = record.clone();
    if correct {
        next.streak += 1;
        next.status = if next.streak >= threshold {
            MasteryStatus::Mastered
        } else {
            MasteryStatus::Learning
        };
    } else {
        next.streak = 0;
        next.status = MasteryStatus::Learning;
    }
    next
}

/// What `MasteryStore::record_answer` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A learning/review answer; the record after the update.
    Progress(MasteryRecord),
    /// A wrong test answer that was added to the test-wrongs log.
    TestWrongLogged(TestWrongRecord),
    /// A wrong test answer for a word that is already logged.
    TestWrongAlreadyLogged,
    /// A correct test answer. Nothing is stored.
    TestCorrect,
}

impl RecordOutcome {
    /// Whether the practice progress table needs saving.
    pub fn touches_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }

    /// Whether the test-wrongs table needs saving.
    pub fn touches_test_wrongs(&self) -> bool {
        matches!(self, Self::TestWrongLogged(_))
    }
}

type RecordKey = (String, String);

fn key(student_id: &str, word: &str) -> RecordKey {
    (student_id.to_string(), word.to_string())
}

/// In-memory view of the progress and test-wrongs tables.
#[derive(Debug, Clone, Default)]
pub struct MasteryStore {
    records: BTreeMap<RecordKey, MasteryRecord>,
    test_wrongs: Vec<TestWrongRecord>,
}

impl MasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows. Duplicate (student, word) records collapse to
    /// the last one; duplicate test wrongs are dropped.
    pub fn from_parts(
        records: impl IntoIterator<Item = MasteryRecord>,
        test_wrongs: impl IntoIterator<Item = TestWrongRecord>,
    ) -> Self {
        let mut store = Self::new();
        for record in records {
            store.upsert(record);
        }
        for wrong in test_wrongs {
            store.log_test_wrong(wrong);
        }
        store
    }

    pub fn get(&self, student_id: &str, word: &str) -> Option<&MasteryRecord> {
        self.records.get(&key(student_id, word))
    }

    pub fn status_of(&self, student_id: &str, word: &str) -> Option<MasteryStatus> {
        self.get(student_id, word).map(|r| r.status)
    }

    /// Insert or replace the record for (student, word).
    pub fn upsert(&mut self, record: MasteryRecord) {
        self.records
            .insert(key(&record.student_id, &record.word), record);
    }

    /// All records, ordered by (student, word).
    pub fn records(&self) -> impl Iterator<Item = &MasteryRecord> {
        self.records.values()
    }

    /// Records belonging to one student.
    pub fn student_records<'a>(
        &'a self,
        student_id: &'a str,
    ) -> impl Iterator<Item = &'a MasteryRecord> + 'a {
        self.records
            .values()
            .filter(move |r| r.student_id == student_id)
    }

    pub fn test_wrongs(&self) -> &[TestWrongRecord] {
        &self.test_wrongs
    }

    pub fn student_test_wrongs<'a>(
        &'a self,
        student_id: &'a str,
    ) -> impl Iterator<Item = &'a TestWrongRecord> + 'a {
        self.test_wrongs
            .iter()
            .filter(move |w| w.student_id == student_id)
    }

    pub fn has_test_wrong(&self, student_id: &str, word: &str) -> bool {
        self.test_wrongs
            .iter()
            .any(|w| w.student_id == student_id && w.word == word)
    }

    /// Append a test wrong unless the (student, word) pair is already logged.
    /// Returns whether the log changed.
    pub fn log_test_wrong(&mut self, record: TestWrongRecord) -> bool {
        if self.has_test_wrong(&record.student_id, &record.word) {
            return false;
        }
        self.test_wrongs.push(record);
        true
    }

    /// Remove a resolved test wrong. Returns whether anything was removed.
    pub fn remove_test_wrong(&mut self, student_id: &str, word: &str) -> bool {
        let before = self.test_wrongs.len();
        self.test_wrongs
            .retain(|w| !(w.student_id == student_id && w.word == word));
        self.test_wrongs.len() != before
    }

    /// Record one answer for a student.
    ///
    /// Learning and review modes update the streak/status of the record for
    /// (student, word), creating it if needed. Test modes leave records alone
    /// and log wrong answers to the test-wrongs list.
    pub fn record_answer(
        &mut self,
        student_id: &str,
        item: &VocabItem,
        correct: bool,
        mode: SessionMode,
        today: NaiveDate,
    ) -> RecordOutcome {
        if mode.is_test() {
            if correct {
                return RecordOutcome::TestCorrect;
            }
            let wrong = TestWrongRecord {
                student_id: student_id.to_string(),
                book: item.book.clone(),
                word: item.word.clone(),
                date: today,
            };
            return if self.log_test_wrong(wrong.clone()) {
                RecordOutcome::TestWrongLogged(wrong)
            } else {
                RecordOutcome::TestWrongAlreadyLogged
            };
        }

        let current = self
            .get(student_id, &item.word)
            .cloned()
            .unwrap_or_else(|| MasteryRecord::new(student_id, item));
        // Non-test modes always have an entry in the table.
        let threshold = mastery_threshold(mode, current.status).unwrap_or(2);
        let mut next = apply_answer(&current, correct, threshold);
        next.book = item.book.clone();
        self.upsert(next.clone());
        RecordOutcome::Progress(next)
    }

    pub fn into_parts(self) -> (Vec<MasteryRecord>, Vec<TestWrongRecord>) {
        (self.records.into_values().collect(), self.test_wrongs)
    }
}
