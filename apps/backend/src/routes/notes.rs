//! Mistake note endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::exams::youtube_start_seconds;
use crate::AppState;

/// POST /api/notes
///
/// Questions already in the student's notes are skipped.
pub async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<AddNotesRequest>,
) -> Result<(StatusCode, Json<AddNotesResponse>)> {
    auth.require_student()?;

    if payload.question_nos.is_empty() {
        return Err(ApiError::BadRequest("Select at least one question".to_string()));
    }

    let questions = state.sheets.load::<ExamQuestion>().await?;
    if let Some(missing) = payload.question_nos.iter().find(|no| {
        !questions
            .iter()
            .any(|q| q.exam_name == payload.exam_name && q.question_no == **no)
    }) {
        return Err(ApiError::NotFound(format!(
            "Question {missing} of {}",
            payload.exam_name
        )));
    }

    let existing = state.sheets.load::<MistakeNote>().await?;
    let mut new_notes: Vec<MistakeNote> = Vec::new();
    for &question_no in &payload.question_nos {
        let duplicate = existing
            .iter()
            .chain(new_notes.iter())
            .any(|n| {
                n.student_id == auth.id()
                    && n.exam_name == payload.exam_name
                    && n.question_no == question_no
            });
        if !duplicate {
            new_notes.push(MistakeNote {
                student_id: auth.id().to_string(),
                exam_name: payload.exam_name.clone(),
                question_no,
                memo: payload.memo.clone(),
            });
        }
    }

    let added = new_notes.len();
    let skipped = payload.question_nos.len() - added;
    if added > 0 {
        state.sheets.append(new_notes).await?;
    }

    tracing::info!(student = %auth.id(), exam = %payload.exam_name, added, skipped, "Added mistake notes");
    Ok((StatusCode::CREATED, Json(AddNotesResponse { added, skipped })))
}

/// GET /api/notes
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<NoteView>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let questions = state.sheets.load::<ExamQuestion>().await?;

    let notes = state
        .sheets
        .load::<MistakeNote>()
        .await?
        .into_iter()
        .filter(|n| n.student_id == student)
        .map(|note| {
            let question = questions
                .iter()
                .find(|q| q.exam_name == note.exam_name && q.question_no == note.question_no);
            let video_url = question
                .map(|q| q.video_url.clone())
                .filter(|url| !url.is_empty());
            NoteView {
                image_key: question.map(|q| q.image_key.clone()),
                start_seconds: video_url.as_deref().map_or(0, youtube_start_seconds),
                video_url,
                note,
            }
        })
        .collect();

    Ok(Json(notes))
}

/// DELETE /api/notes/:exam/:no
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((exam, question_no)): Path<(String, u32)>,
) -> Result<StatusCode> {
    auth.require_student()?;

    let mut notes = state.sheets.load::<MistakeNote>().await?;
    let before = notes.len();
    notes.retain(|n| {
        !(n.student_id == auth.id() && n.exam_name == exam && n.question_no == question_no)
    });
    if notes.len() == before {
        return Err(ApiError::NotFound(format!("Note on question {question_no} of {exam}")));
    }
    state.sheets.save(&notes).await?;

    tracing::info!(student = %auth.id(), exam = %exam, question_no, "Removed mistake note");
    Ok(StatusCode::NO_CONTENT)
}
