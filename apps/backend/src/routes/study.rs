//! Vocabulary study endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Local;
use rand::{rngs::StdRng, SeedableRng};
use vocab_core::remediation;
use vocab_core::{to_csv, two_column_sheet, AnswerReport, Session};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::study::{build_queue, is_mastered, persist_outcome, session_view};
use crate::AppState;

fn answer_response(report: AnswerReport) -> AnswerResponse {
    AnswerResponse {
        outcome: report.outcome,
        mastered: is_mastered(&report.record),
        word: report.item.word,
        meaning: report.item.meaning,
        cursor: report.cursor,
        total: report.total,
        score: report.score,
        finished: report.finished,
    }
}

/// POST /api/study/sessions
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>)> {
    auth.require_student()?;

    let catalog = state.sheets.catalog().await?;
    let store = state.sheets.mastery().await?;

    let mut rng = StdRng::from_entropy();
    let (items, info) = build_queue(
        &payload.source,
        payload.mode,
        &catalog,
        &store,
        auth.id(),
        &mut rng,
    )?;
    if items.is_empty() {
        return Err(ApiError::BadRequest("No words to study".to_string()));
    }

    let session = Session::start(items, payload.mode, auth.id(), info, &mut rng);
    let view = session_view(&session);
    state.sessions.insert(session).await;

    tracing::info!(
        student = %auth.id(),
        mode = payload.mode.as_str(),
        total = view.total,
        "Started study session"
    );
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/study/session
pub async fn current(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .with_session(auth.id(), |s| Ok(session_view(s)))
        .await?;
    Ok(Json(view))
}

/// DELETE /api/study/session
pub async fn abandon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<StatusCode> {
    state
        .sessions
        .remove(auth.id())
        .await
        .ok_or_else(|| ApiError::NotFound("No active session".to_string()))?;

    tracing::info!(student = %auth.id(), "Abandoned study session");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/study/session/reveal
pub async fn reveal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .with_session(auth.id(), |s| {
            s.reveal()?;
            Ok(session_view(s))
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/study/session/options
pub async fn options(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<OptionsResponse>> {
    let catalog = state.sheets.catalog().await?;
    let options = state
        .sessions
        .with_session(auth.id(), |s| {
            let mut rng = StdRng::from_entropy();
            s.options(catalog.items(), &mut rng).map(<[String]>::to_vec)
        })
        .await?;
    Ok(Json(OptionsResponse { options }))
}

/// POST /api/study/session/answer
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(submission): Json<Submission>,
) -> Result<Json<AnswerResponse>> {
    let mut store = state.sheets.mastery().await?;
    let today = Local::now().date_naive();

    let slot = state.sessions.slot(auth.id()).await?;
    let mut session = slot.draft();
    let report = session.answer(submission, &mut store, today)?;
    persist_outcome(&state.sheets, &store, &report.record).await?;
    slot.commit(session);

    tracing::debug!(
        student = %auth.id(),
        word = %report.item.word,
        correct = report.outcome.is_correct(),
        cursor = report.cursor,
        "Answered"
    );
    Ok(Json(answer_response(report)))
}

/// POST /api/study/session/give-up
pub async fn give_up(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .with_session(auth.id(), |s| {
            s.give_up()?;
            Ok(session_view(s))
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/study/session/copy
pub async fn copy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CopyRequest>,
) -> Result<Json<AnswerResponse>> {
    let mut store = state.sheets.mastery().await?;
    let today = Local::now().date_naive();

    let slot = state.sessions.slot(auth.id()).await?;
    let mut session = slot.draft();
    let report = session.copy(&payload.text, &mut store, today)?;
    persist_outcome(&state.sheets, &store, &report.record).await?;
    slot.commit(session);

    Ok(Json(answer_response(report)))
}

/// POST /api/study/session/finish
pub async fn finish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionSummary>> {
    let now = Local::now().naive_local();
    let summary = state
        .sessions
        .with_session(auth.id(), |s| s.finish(now))
        .await?;

    if let Some(log) = &summary.test_log {
        state.sheets.append(vec![log.clone()]).await?;
        tracing::info!(student = %auth.id(), info = %log.info, score = %log.score, "Saved test result");
    }
    state.sessions.remove(auth.id()).await;

    Ok(Json(summary))
}

/// GET /api/study/wrongs
pub async fn practice_wrongs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<ProgressEntry>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let catalog = state.sheets.catalog().await?;
    let store = state.sheets.mastery().await?;
    Ok(Json(remediation::practice_wrongs(&store, &catalog, &student)))
}

/// GET /api/study/mastered
pub async fn mastered(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<ProgressEntry>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let catalog = state.sheets.catalog().await?;
    let store = state.sheets.mastery().await?;
    Ok(Json(remediation::mastered_words(&store, &catalog, &student)))
}

/// GET /api/study/test-wrongs
pub async fn test_wrongs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<TestWrongEntry>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let catalog = state.sheets.catalog().await?;
    let store = state.sheets.mastery().await?;
    Ok(Json(remediation::test_wrongs(&store, &catalog, &student)))
}

/// DELETE /api/study/test-wrongs/:word
pub async fn delete_test_wrong(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(word): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Result<StatusCode> {
    if auth.user.role == Role::Parent {
        return Err(ApiError::Forbidden("Parents cannot change records".to_string()));
    }
    let student = auth.resolve_student(query.student_id.as_deref())?;

    let mut store = state.sheets.mastery().await?;
    if !store.remove_test_wrong(&student, &word) {
        return Err(ApiError::NotFound(format!("Test wrong {word}")));
    }
    state.sheets.save_test_wrongs(&store).await?;

    tracing::info!(student = %student, word = %word, "Removed test wrong");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/study/test-log
pub async fn test_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<TestLogView>>> {
    let student = match auth.user.role {
        Role::Teacher => query.student_id.filter(|s| !s.trim().is_empty()),
        _ => Some(auth.resolve_student(query.student_id.as_deref())?),
    };

    let users = state.sheets.load::<User>().await?;
    let logs = state
        .sheets
        .load::<VocabTestLog>()
        .await?
        .into_iter()
        .filter(|l| student.as_ref().map_or(true, |s| &l.student_id == s))
        .map(|log| TestLogView {
            name: users
                .iter()
                .find(|u| u.id == log.student_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
            log,
        })
        .collect();

    Ok(Json(logs))
}

/// GET /api/study/wrongs/sheet
///
/// Two-column printable sheet of a student's wrong words as CSV.
pub async fn wrong_sheet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let catalog = state.sheets.catalog().await?;
    let store = state.sheets.mastery().await?;

    let pairs: Vec<(String, String)> = match query.source {
        WrongSource::Practice => remediation::practice_wrongs(&store, &catalog, &student)
            .into_iter()
            .map(|e| (e.item.word, e.item.meaning))
            .collect(),
        WrongSource::Test => remediation::test_wrongs(&store, &catalog, &student)
            .into_iter()
            .map(|e| (e.item.word, e.item.meaning))
            .collect(),
    };
    if pairs.is_empty() {
        return Err(ApiError::NotFound("No wrong words".to_string()));
    }

    let csv = to_csv(&two_column_sheet(&pairs));
    let disposition = format!("attachment; filename=\"{student}_print.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
