//! Vocabulary study/test session state machine.
//!
//! A session owns a shuffled, fixed queue of items and a cursor that only
//! moves forward. Each answer is judged, recorded in the [`MasteryStore`]
//! and advances the cursor by one. The only way to stay on an item is the
//! subjective give-up path: give up, see the word, copy it, then move on.
//!
//! ```text
//! flashcard/review:  Prompt --reveal--> Revealed --grade--> (next) Prompt
//! subjective:        Prompt --type--> (next) Prompt
//!                    Prompt --give up--> AwaitingCopy --copy--> (next) Prompt
//! objective test:    Prompt --options/choose--> (next) Prompt
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::mastery::{MasteryStore, RecordOutcome};
use crate::matching::{compare_answers, MatchingMode};
use crate::quiz::build_choices;
use crate::types::{AnswerOutcome, SessionMode, VocabItem, VocabTestLog};

/// Where the current item stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for an answer (or a reveal in flashcard modes).
    Prompt,
    /// Meaning shown; waiting for the student's self-grade.
    Revealed,
    /// Gave up on a typed answer; waiting for the word to be copied.
    AwaitingCopy,
}

/// An answer submitted for the current item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    /// Flashcard and review modes: "I knew it" / "I didn't".
    SelfGrade { known: bool },
    /// Subjective modes: the typed word.
    Typed { text: String },
    /// Objective test: the chosen meaning.
    Choice { meaning: String },
}

impl Submission {
    fn kind(&self) -> &'static str {
        match self {
            Self::SelfGrade { .. } => "self_grade",
            Self::Typed { .. } => "typed",
            Self::Choice { .. } => "choice",
        }
    }
}

/// What happened when an answer was applied.
#[derive(Debug, Clone)]
pub struct AnswerReport {
    pub outcome: AnswerOutcome,
    /// The item that was answered.
    pub item: VocabItem,
    /// What the mastery store changed.
    pub record: RecordOutcome,
    /// Cursor after the advance.
    pub cursor: usize,
    pub total: usize,
    pub score: u32,
    pub finished: bool,
}

/// Final numbers of an exhausted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub owner: String,
    pub mode: SessionMode,
    pub total: usize,
    pub score: u32,
    pub info: String,
    /// Row for the test log; only test sessions produce one.
    pub test_log: Option<VocabTestLog>,
}

/// One student's active study or test session.
#[derive(Debug, Clone)]
pub struct Session {
    owner: String,
    mode: SessionMode,
    info: String,
    queue: Vec<VocabItem>,
    cursor: usize,
    score: u32,
    phase: Phase,
    options: Option<Vec<String>>,
    last_result: Option<AnswerOutcome>,
}

impl Session {
    /// Shuffle `items` and start at the first one.
    pub fn start<R: Rng + ?Sized>(
        mut items: Vec<VocabItem>,
        mode: SessionMode,
        owner: impl Into<String>,
        info: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        items.shuffle(rng);
        Self {
            owner: owner.into(),
            mode,
            info: info.into(),
            queue: items,
            cursor: 0,
            score: 0,
            phase: Phase::Prompt,
            options: None,
            last_result: None,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn queue(&self) -> &[VocabItem] {
        &self.queue
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_result(&self) -> Option<AnswerOutcome> {
        self.last_result
    }

    /// Options generated for the current objective item, if any.
    pub fn cached_options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    /// The item under the cursor, or `None` once the queue is exhausted.
    pub fn current_item(&self) -> Option<&VocabItem> {
        self.queue.get(self.cursor)
    }

    fn require_current(&self) -> Result<&VocabItem> {
        self.current_item().ok_or(SessionError::Finished)
    }

    /// Show the meaning of the current flashcard.
    pub fn reveal(&mut self) -> Result<&VocabItem> {
        if !self.mode.is_self_graded() {
            return Err(SessionError::unsupported("reveal", self.mode));
        }
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.phase = Phase::Revealed;
        self.require_current()
    }

    /// Four-way choices for the current objective item. Generated on the
    /// first call and reused until the cursor moves.
    pub fn options<R: Rng + ?Sized>(
        &mut self,
        catalog: &[VocabItem],
        rng: &mut R,
    ) -> Result<&[String]> {
        if self.mode != SessionMode::TestObjective {
            return Err(SessionError::unsupported("options", self.mode));
        }
        let item = self.require_current()?.clone();
        let options = self
            .options
            .get_or_insert_with(|| build_choices(&item, catalog, rng));
        Ok(options.as_slice())
    }

    /// Judge `submission` against the current item, record it and advance.
    pub fn answer(
        &mut self,
        submission: Submission,
        store: &mut MasteryStore,
        today: NaiveDate,
    ) -> Result<AnswerReport> {
        let item = self.require_current()?;
        if self.phase == Phase::AwaitingCopy {
            return Err(SessionError::AwaitingCopy);
        }

        let correct = match (&submission, self.mode) {
            (Submission::SelfGrade { known }, mode) if mode.is_self_graded() => {
                if self.phase != Phase::Revealed {
                    return Err(SessionError::NotRevealed);
                }
                *known
            }
            (Submission::Typed { text }, mode) if mode.is_subjective() => {
                compare_answers(text, &item.word, MatchingMode::for_session(mode)).is_correct
            }
            (Submission::Choice { meaning }, SessionMode::TestObjective) => {
                compare_answers(meaning, &item.meaning, MatchingMode::Exact).is_correct
            }
            (other, mode) => {
                return Err(SessionError::SubmissionMismatch {
                    submission: other.kind(),
                    mode: mode.as_str(),
                })
            }
        };

        Ok(self.advance(correct, store, today))
    }

    /// Give up on a typed answer: the word is revealed and must be copied
    /// before the session moves on.
    pub fn give_up(&mut self) -> Result<&VocabItem> {
        if !self.mode.is_subjective() {
            return Err(SessionError::unsupported("give up", self.mode));
        }
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.phase = Phase::AwaitingCopy;
        self.last_result = Some(AnswerOutcome::Wrong);
        self.require_current()
    }

    /// Finish the give-up step. Records the item as wrong and advances.
    /// The copied text is not graded.
    pub fn copy(
        &mut self,
        _copied: &str,
        store: &mut MasteryStore,
        today: NaiveDate,
    ) -> Result<AnswerReport> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        if self.phase != Phase::AwaitingCopy {
            return Err(SessionError::NothingToCopy);
        }
        Ok(self.advance(false, store, today))
    }

    fn advance(&mut self, correct: bool, store: &mut MasteryStore, today: NaiveDate) -> AnswerReport {
        let item = self.queue[self.cursor].clone();
        let record = store.record_answer(&self.owner, &item, correct, self.mode, today);

        if correct && self.mode.is_test() {
            self.score += 1;
        }
        self.cursor += 1;
        self.phase = Phase::Prompt;
        self.options = None;
        let outcome = AnswerOutcome::from_correct(correct);
        self.last_result = Some(outcome);

        AnswerReport {
            outcome,
            item,
            record,
            cursor: self.cursor,
            total: self.queue.len(),
            score: self.score,
            finished: self.is_finished(),
        }
    }

    /// Summarize an exhausted session. Test sessions also yield the row to
    /// append to the test log.
    pub fn finish(&self, now: NaiveDateTime) -> Result<SessionSummary> {
        if !self.is_finished() {
            return Err(SessionError::NotFinished {
                remaining: self.remaining(),
            });
        }

        let total = self.queue.len();
        let test_log = self.mode.is_test().then(|| VocabTestLog {
            student_id: self.owner.clone(),
            date: now.format("%Y-%m-%d %H:%M").to_string(),
            info: self.info.clone(),
            score: format!("{}/{}", self.score, total),
        });

        Ok(SessionSummary {
            owner: self.owner.clone(),
            mode: self.mode,
            total,
            score: self.score,
            info: self.info.clone(),
            test_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MasteryStatus;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn items() -> Vec<VocabItem> {
        vec![
            VocabItem::new("Voca", "Day 1", "apple", "사과"),
            VocabItem::new("Voca", "Day 1", "banana", "바나나"),
            VocabItem::new("Voca", "Day 1", "cherry", "체리"),
        ]
    }

    fn start(mode: SessionMode) -> Session {
        let mut rng = StdRng::seed_from_u64(42);
        Session::start(items(), mode, "student1", "", &mut rng)
    }

    fn typed(text: &str) -> Submission {
        Submission::Typed {
            text: text.to_string(),
        }
    }

    #[test]
    fn start_keeps_every_item() {
        let session = start(SessionMode::LearnFlashcard);
        let mut words: Vec<_> = session.queue().iter().map(|i| i.word.clone()).collect();
        words.sort();
        assert_eq!(words, vec!["apple", "banana", "cherry"]);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn cursor_moves_one_per_answer_and_ends_at_length() {
        let mut session = start(SessionMode::LearnSubjective);
        let mut store = MasteryStore::new();

        for expected in 1..=3 {
            assert!(!session.is_finished());
            session.answer(typed("nope"), &mut store, today()).unwrap();
            assert_eq!(session.cursor(), expected);
        }

        assert!(session.is_finished());
        assert!(session.current_item().is_none());
        assert_eq!(
            session.answer(typed("apple"), &mut store, today()).unwrap_err(),
            SessionError::Finished
        );
        assert_eq!(session.cursor(), 3);
    }

    #[test]
    fn subjective_answer_ignores_case() {
        let mut session = start(SessionMode::LearnSubjective);
        let mut store = MasteryStore::new();
        let word = session.current_item().unwrap().word.to_uppercase();

        let report = session.answer(typed(&format!("  {word} ")), &mut store, today()).unwrap();
        assert_eq!(report.outcome, AnswerOutcome::Correct);
        assert!(report.record.touches_progress());
        // Learning modes never score.
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn flashcard_requires_reveal_before_grading() {
        let mut session = start(SessionMode::LearnFlashcard);
        let mut store = MasteryStore::new();

        let err = session
            .answer(Submission::SelfGrade { known: true }, &mut store, today())
            .unwrap_err();
        assert_eq!(err, SessionError::NotRevealed);
        assert_eq!(session.cursor(), 0);

        session.reveal().unwrap();
        assert_eq!(session.phase(), Phase::Revealed);
        let report = session
            .answer(Submission::SelfGrade { known: true }, &mut store, today())
            .unwrap();
        assert_eq!(report.outcome, AnswerOutcome::Correct);
        assert_eq!(session.phase(), Phase::Prompt);
        assert_eq!(
            store.get("student1", &report.item.word).unwrap().streak,
            1
        );
    }

    #[test]
    fn wrong_submission_kind_is_rejected() {
        let mut session = start(SessionMode::TestObjective);
        let mut store = MasteryStore::new();
        let err = session.answer(typed("apple"), &mut store, today()).unwrap_err();
        assert!(matches!(err, SessionError::SubmissionMismatch { .. }));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_mode_scores_and_logs_wrongs_only() {
        let mut session = start(SessionMode::TestSubjective);
        let mut store = MasteryStore::new();

        let first = session.current_item().unwrap().word.clone();
        session.answer(typed(&first), &mut store, today()).unwrap();
        session.answer(typed("wrong"), &mut store, today()).unwrap();
        let report = session.answer(typed("wrong"), &mut store, today()).unwrap();

        assert!(report.finished);
        assert_eq!(session.score(), 1);
        assert_eq!(store.records().count(), 0);
        assert_eq!(store.student_test_wrongs("student1").count(), 2);
    }

    #[test]
    fn objective_options_are_cached_until_advance() {
        let catalog = vec![
            VocabItem::new("Voca", "Day 1", "apple", "사과"),
            VocabItem::new("Voca", "Day 1", "banana", "바나나"),
            VocabItem::new("Voca", "Day 1", "cherry", "체리"),
            VocabItem::new("Voca", "Day 2", "grape", "포도"),
            VocabItem::new("Voca", "Day 2", "lemon", "레몬"),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = start(SessionMode::TestObjective);
        let mut store = MasteryStore::new();

        let first = session.options(&catalog, &mut rng).unwrap().to_vec();
        let again = session.options(&catalog, &mut rng).unwrap().to_vec();
        assert_eq!(first, again);
        assert_eq!(first.len(), 4);

        let meaning = session.current_item().unwrap().meaning.clone();
        assert!(first.contains(&meaning));
        let report = session
            .answer(Submission::Choice { meaning }, &mut store, today())
            .unwrap();
        assert_eq!(report.outcome, AnswerOutcome::Correct);
        assert_eq!(session.score(), 1);
        assert!(session.cached_options().is_none());
    }

    #[test]
    fn give_up_defers_advance_until_copy() {
        let mut session = start(SessionMode::LearnSubjective);
        let mut store = MasteryStore::new();

        let word = session.give_up().unwrap().word.clone();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.phase(), Phase::AwaitingCopy);
        assert_eq!(session.last_result(), Some(AnswerOutcome::Wrong));
        assert_eq!(
            session.answer(typed(&word), &mut store, today()).unwrap_err(),
            SessionError::AwaitingCopy
        );
        assert!(store.get("student1", &word).is_none());

        let report = session.copy(&word, &mut store, today()).unwrap();
        assert_eq!(report.outcome, AnswerOutcome::Wrong);
        assert_eq!(session.cursor(), 1);
        let record = store.get("student1", &word).unwrap();
        assert_eq!(record.streak, 0);
        assert_eq!(record.status, MasteryStatus::Learning);
    }

    #[test]
    fn copy_without_give_up_fails() {
        let mut session = start(SessionMode::LearnSubjective);
        let mut store = MasteryStore::new();
        assert_eq!(
            session.copy("apple", &mut store, today()).unwrap_err(),
            SessionError::NothingToCopy
        );
    }

    #[test]
    fn give_up_is_only_for_typed_modes() {
        let mut session = start(SessionMode::Review);
        assert!(matches!(
            session.give_up(),
            Err(SessionError::UnsupportedAction { .. })
        ));
    }

    #[test]
    fn finish_emits_test_log_for_tests() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = Session::start(
            items(),
            SessionMode::TestSubjective,
            "student1",
            "Voca (Day 1~Day 1) [subjective]",
            &mut rng,
        );
        let mut store = MasteryStore::new();
        let now = today().and_hms_opt(14, 5, 0).unwrap();

        assert_eq!(
            session.finish(now).unwrap_err(),
            SessionError::NotFinished { remaining: 3 }
        );

        while let Some(item) = session.current_item().cloned() {
            session.answer(typed(&item.word), &mut store, today()).unwrap();
        }

        let summary = session.finish(now).unwrap();
        assert_eq!(summary.score, 3);
        assert_eq!(
            summary.test_log,
            Some(VocabTestLog {
                student_id: "student1".to_string(),
                date: "2024-05-02 14:05".to_string(),
                info: "Voca (Day 1~Day 1) [subjective]".to_string(),
                score: "3/3".to_string(),
            })
        );
    }

    #[test]
    fn finish_learning_session_has_no_test_log() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = Session::start(vec![], SessionMode::LearnFlashcard, "s", "", &mut rng);
        assert!(session.is_finished());
        let summary = session.finish(today().and_hms_opt(0, 0, 0).unwrap()).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.test_log.is_none());
    }
}
