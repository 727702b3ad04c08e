//! Active vocabulary sessions and the queues that seed them.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};
use vocab_core::remediation::{self, test_description};
use vocab_core::{Catalog, MasteryStore, Phase, RecordOutcome, Session, SessionError};

use crate::db::{Sheets, StoreError};
use crate::error::{ApiError, Result};
use crate::models::{CardView, MasteryStatus, SessionMode, SessionView, StudySource, VocabItem};

/// One session per user, keyed by user id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` for its owner, replacing any previous one.
    pub async fn insert(&self, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(session.owner().to_string(), session);
    }

    /// Run `f` on the user's session.
    pub async fn with_session<T, F>(&self, owner: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> std::result::Result<T, SessionError>,
    {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(owner)
            .ok_or_else(|| ApiError::NotFound("No active session".to_string()))?;
        Ok(f(session)?)
    }

    /// Lock the user's session for a change that must be saved first.
    ///
    /// Other session calls wait until the slot is committed or dropped.
    pub async fn slot(&self, owner: &str) -> Result<SessionSlot<'_>> {
        let sessions = self.sessions.lock().await;
        if !sessions.contains_key(owner) {
            return Err(ApiError::NotFound("No active session".to_string()));
        }
        Ok(SessionSlot {
            sessions,
            owner: owner.to_string(),
        })
    }

    pub async fn remove(&self, owner: &str) -> Option<Session> {
        self.sessions.lock().await.remove(owner)
    }
}

/// A locked session. Dropping it without `commit` leaves the session as it was.
pub struct SessionSlot<'a> {
    sessions: MutexGuard<'a, HashMap<String, Session>>,
    owner: String,
}

impl SessionSlot<'_> {
    /// Working copy of the session.
    pub fn draft(&self) -> Session {
        self.sessions[&self.owner].clone()
    }

    pub fn commit(mut self, session: Session) {
        self.sessions.insert(self.owner, session);
    }
}

fn learn_mode(mode: SessionMode) -> bool {
    matches!(mode, SessionMode::LearnFlashcard | SessionMode::LearnSubjective)
}

fn reject_mode(mode: SessionMode, source: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "{} mode cannot be used with {} words",
        mode.as_str(),
        source
    ))
}

fn retest_description(mode: SessionMode) -> String {
    let kind = if mode == SessionMode::TestObjective {
        "객관식"
    } else {
        "주관식"
    };
    format!("오답 재시험 [{kind}]")
}

/// Words and test description for a new session.
///
/// Chapters are studied in a learn mode, mastered words in review mode and
/// day ranges in a test mode. The wrong-word lists can be re-studied or
/// re-tested.
pub fn build_queue<R: Rng + ?Sized>(
    source: &StudySource,
    mode: SessionMode,
    catalog: &Catalog,
    store: &MasteryStore,
    student_id: &str,
    rng: &mut R,
) -> Result<(Vec<VocabItem>, String)> {
    let items = match source {
        StudySource::Chapter { book, day } => {
            if !learn_mode(mode) {
                return Err(reject_mode(mode, "chapter"));
            }
            remediation::chapter_queue(catalog, store, student_id, book, day)
        }
        StudySource::ChapterWrongs { book, day } => {
            if !learn_mode(mode) {
                return Err(reject_mode(mode, "chapter wrong"));
            }
            remediation::chapter_wrongs(catalog, store, student_id, book, day)
        }
        StudySource::MasteredReview => {
            if mode != SessionMode::Review {
                return Err(reject_mode(mode, "mastered"));
            }
            remediation::mastered_words(store, catalog, student_id)
                .into_iter()
                .map(|e| e.item)
                .collect()
        }
        StudySource::PracticeWrongs => {
            if mode == SessionMode::Review {
                return Err(reject_mode(mode, "practice wrong"));
            }
            remediation::practice_wrongs(store, catalog, student_id)
                .into_iter()
                .map(|e| e.item)
                .collect()
        }
        StudySource::TestWrongs => {
            if mode == SessionMode::Review {
                return Err(reject_mode(mode, "test wrong"));
            }
            remediation::test_wrongs(store, catalog, student_id)
                .into_iter()
                .map(|e| e.item)
                .collect()
        }
        StudySource::Test {
            book,
            start_day,
            end_day,
            count,
        } => {
            if !mode.is_test() {
                return Err(reject_mode(mode, "test range"));
            }
            let pool = catalog.day_range(book, start_day, end_day);
            let items = remediation::sample_test(&pool, *count, rng);
            return Ok((items, test_description(book, start_day, end_day, mode)));
        }
    };

    let info = if mode.is_test() {
        retest_description(mode)
    } else {
        String::new()
    };
    Ok((items, info))
}

/// Session state with the answer hidden as the mode requires.
pub fn session_view(session: &Session) -> SessionView {
    let mode = session.mode();
    let phase = session.phase();

    let card = session.current_item().map(|item| {
        let (show_word, show_meaning) = match mode {
            SessionMode::LearnFlashcard | SessionMode::Review => (true, phase == Phase::Revealed),
            SessionMode::LearnSubjective | SessionMode::TestSubjective => {
                (phase == Phase::AwaitingCopy, true)
            }
            SessionMode::TestObjective => (true, false),
        };
        CardView {
            book: item.book.clone(),
            day: item.day.clone(),
            word: show_word.then(|| item.word.clone()),
            meaning: show_meaning.then(|| item.meaning.clone()),
            options: session.cached_options().map(<[String]>::to_vec),
        }
    });

    SessionView {
        mode,
        info: session.info().to_string(),
        cursor: session.cursor(),
        total: session.len(),
        score: session.score(),
        phase,
        finished: session.is_finished(),
        last_result: session.last_result(),
        card,
    }
}

/// Save whichever table an answer changed.
pub async fn persist_outcome(
    sheets: &Sheets,
    store: &MasteryStore,
    outcome: &RecordOutcome,
) -> std::result::Result<(), StoreError> {
    if outcome.touches_progress() {
        sheets.save_progress(store).await?;
    } else if outcome.touches_test_wrongs() {
        sheets.save_test_wrongs(store).await?;
    }
    Ok(())
}

/// Whether an answer left the word mastered.
pub fn is_mastered(outcome: &RecordOutcome) -> bool {
    matches!(outcome, RecordOutcome::Progress(r) if r.status == MasteryStatus::Mastered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use vocab_core::Submission;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            VocabItem::new("Voca", "Day 1", "apple", "사과"),
            VocabItem::new("Voca", "Day 1", "bee", "벌"),
            VocabItem::new("Voca", "Day 2", "cat", "고양이"),
            VocabItem::new("Voca", "Day 3", "dog", "개"),
        ])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[test]
    fn test_chapter_needs_learn_mode() {
        let mut rng = StdRng::seed_from_u64(1);
        let source = StudySource::Chapter {
            book: "Voca".to_string(),
            day: "Day 1".to_string(),
        };
        let store = MasteryStore::new();
        let (items, info) =
            build_queue(&source, SessionMode::LearnSubjective, &catalog(), &store, "s1", &mut rng)
                .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(info, "");

        let result = build_queue(&source, SessionMode::TestObjective, &catalog(), &store, "s1", &mut rng);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_range_test_samples_and_describes() {
        let mut rng = StdRng::seed_from_u64(2);
        let source = StudySource::Test {
            book: "Voca".to_string(),
            start_day: "Day 1".to_string(),
            end_day: "Day 2".to_string(),
            count: 2,
        };
        let (items, info) = build_queue(
            &source,
            SessionMode::TestSubjective,
            &catalog(),
            &MasteryStore::new(),
            "s1",
            &mut rng,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.day != "Day 3"));
        assert_eq!(info, "Voca (Day 1~Day 2) [주관식]");
    }

    #[test]
    fn test_retest_of_test_wrongs() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut store = MasteryStore::new();
        let item = catalog().items()[3].clone();
        store.record_answer("s1", &item, false, SessionMode::TestObjective, today());

        let (items, info) = build_queue(
            &StudySource::TestWrongs,
            SessionMode::TestObjective,
            &catalog(),
            &store,
            "s1",
            &mut rng,
        )
        .unwrap();
        assert_eq!(items, vec![item]);
        assert_eq!(info, "오답 재시험 [객관식]");
    }

    #[test]
    fn test_view_hides_answers() {
        let mut rng = StdRng::seed_from_u64(4);
        let items = vec![VocabItem::new("Voca", "Day 1", "apple", "사과")];

        let mut flash = Session::start(items.clone(), SessionMode::LearnFlashcard, "s1", "", &mut rng);
        let card = session_view(&flash).card.unwrap();
        assert_eq!(card.word.as_deref(), Some("apple"));
        assert!(card.meaning.is_none());
        flash.reveal().unwrap();
        assert_eq!(session_view(&flash).card.unwrap().meaning.as_deref(), Some("사과"));

        let mut typed = Session::start(items, SessionMode::LearnSubjective, "s1", "", &mut rng);
        let card = session_view(&typed).card.unwrap();
        assert!(card.word.is_none());
        assert_eq!(card.meaning.as_deref(), Some("사과"));
        typed.give_up().unwrap();
        assert_eq!(session_view(&typed).card.unwrap().word.as_deref(), Some("apple"));

        let mut store = MasteryStore::new();
        typed.copy("apple", &mut store, today()).unwrap();
        let view = session_view(&typed);
        assert!(view.finished);
        assert!(view.card.is_none());
    }

    #[test]
    fn test_is_mastered() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = vec![VocabItem::new("Voca", "Day 1", "apple", "사과")];
        let mut store = MasteryStore::new();
        let mut session = Session::start(items, SessionMode::LearnSubjective, "s1", "", &mut rng);
        let report = session
            .answer(
                Submission::Typed {
                    text: "apple".to_string(),
                },
                &mut store,
                today(),
            )
            .unwrap();
        assert!(!is_mastered(&report.record));
    }

    #[tokio::test]
    async fn test_registry_replaces_session() {
        let mut rng = StdRng::seed_from_u64(6);
        let registry = SessionRegistry::new();
        let items = catalog().into_items();
        registry
            .insert(Session::start(items.clone(), SessionMode::Review, "s1", "", &mut rng))
            .await;
        registry
            .insert(Session::start(items, SessionMode::LearnFlashcard, "s1", "", &mut rng))
            .await;

        let mode = registry.with_session("s1", |s| Ok(s.mode())).await.unwrap();
        assert_eq!(mode, SessionMode::LearnFlashcard);
        assert!(registry.remove("s1").await.is_some());
        assert!(matches!(
            registry.with_session("s1", |s| Ok(s.mode())).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_slot_commits_only_on_request() {
        let mut rng = StdRng::seed_from_u64(7);
        let registry = SessionRegistry::new();
        let items = catalog().chapter("Voca", "Day 1");
        registry
            .insert(Session::start(items, SessionMode::LearnSubjective, "s1", "", &mut rng))
            .await;
        let mut store = MasteryStore::new();
        let wrong = || Submission::Typed {
            text: "zzz".to_string(),
        };

        let slot = registry.slot("s1").await.unwrap();
        let mut draft = slot.draft();
        draft.answer(wrong(), &mut store, today()).unwrap();
        drop(slot);
        let cursor = registry.with_session("s1", |s| Ok(s.cursor())).await.unwrap();
        assert_eq!(cursor, 0);

        let slot = registry.slot("s1").await.unwrap();
        let mut draft = slot.draft();
        draft.answer(wrong(), &mut store, today()).unwrap();
        slot.commit(draft);
        let cursor = registry.with_session("s1", |s| Ok(s.cursor())).await.unwrap();
        assert_eq!(cursor, 1);

        assert!(matches!(registry.slot("nobody").await, Err(ApiError::NotFound(_))));
    }
}
