//! Study queues built from a student's progress.
//!
//! Two wrong-word sets are kept apart: practice wrongs (records still in
//! `learning`) and cumulative test wrongs. Either can seed a new session.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::mastery::MasteryStore;
use crate::types::{MasteryStatus, SessionMode, VocabItem};

/// A catalog item together with the student's streak on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    #[serde(flatten)]
    pub item: VocabItem,
    pub streak: u32,
}

/// A missed test word with the date it was first missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestWrongEntry {
    #[serde(flatten)]
    pub item: VocabItem,
    pub date: NaiveDate,
}

/// Catalog entry for (book, word), or a bare item when the catalog no
/// longer has it.
fn lookup(catalog: &Catalog, book: &str, word: &str) -> VocabItem {
    catalog
        .find(book, word)
        .cloned()
        .unwrap_or_else(|| VocabItem::new(book, "", word, ""))
}

fn entries_with_status(
    store: &MasteryStore,
    catalog: &Catalog,
    student_id: &str,
    status: MasteryStatus,
) -> Vec<ProgressEntry> {
    store
        .student_records(student_id)
        .filter(|r| r.status == status)
        .map(|r| ProgressEntry {
            item: lookup(catalog, &r.book, &r.word),
            streak: r.streak,
        })
        .collect()
}

/// Words the student is still learning.
pub fn practice_wrongs(store: &MasteryStore, catalog: &Catalog, student_id: &str) -> Vec<ProgressEntry> {
    entries_with_status(store, catalog, student_id, MasteryStatus::Learning)
}

/// Words the student has mastered.
pub fn mastered_words(store: &MasteryStore, catalog: &Catalog, student_id: &str) -> Vec<ProgressEntry> {
    entries_with_status(store, catalog, student_id, MasteryStatus::Mastered)
}

/// Words the student has missed in tests.
pub fn test_wrongs(store: &MasteryStore, catalog: &Catalog, student_id: &str) -> Vec<TestWrongEntry> {
    store
        .student_test_wrongs(student_id)
        .map(|w| TestWrongEntry {
            item: lookup(catalog, &w.book, &w.word),
            date: w.date,
        })
        .collect()
}

/// Words of a chapter the student has not mastered yet.
pub fn chapter_queue(
    catalog: &Catalog,
    store: &MasteryStore,
    student_id: &str,
    book: &str,
    day: &str,
) -> Vec<VocabItem> {
    catalog
        .chapter(book, day)
        .into_iter()
        .filter(|i| store.status_of(student_id, &i.word) != Some(MasteryStatus::Mastered))
        .collect()
}

/// Words of a chapter the student has answered but not mastered.
pub fn chapter_wrongs(
    catalog: &Catalog,
    store: &MasteryStore,
    student_id: &str,
    book: &str,
    day: &str,
) -> Vec<VocabItem> {
    catalog
        .chapter(book, day)
        .into_iter()
        .filter(|i| store.status_of(student_id, &i.word) == Some(MasteryStatus::Learning))
        .collect()
}

/// Draw `count` items from `pool` without replacement. Asking for more than
/// the pool holds returns the whole pool.
pub fn sample_test<R: Rng + ?Sized>(pool: &[VocabItem], count: usize, rng: &mut R) -> Vec<VocabItem> {
    pool.choose_multiple(rng, count.min(pool.len()))
        .cloned()
        .collect()
}

/// Label stored with a cumulative test result.
pub fn test_description(book: &str, start_day: &str, end_day: &str, mode: SessionMode) -> String {
    let kind = if mode == SessionMode::TestObjective {
        "객관식"
    } else {
        "주관식"
    };
    format!("{book} ({start_day}~{end_day}) [{kind}]")
}
