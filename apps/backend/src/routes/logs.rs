//! Learning log endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::records::calendar_events;
use crate::AppState;

/// GET /api/logs
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LearningLogEntry>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let date = query.date.map(|d| d.format("%Y-%m-%d").to_string());

    let logs = state
        .sheets
        .load::<LearningLogEntry>()
        .await?
        .into_iter()
        .filter(|l| l.student_id == student)
        .filter(|l| date.as_ref().map_or(true, |d| &l.date == d))
        .collect();

    Ok(Json(logs))
}

/// POST /api/logs
pub async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<AddLogRequest>,
) -> Result<(StatusCode, Json<LearningLogEntry>)> {
    auth.require_teacher()?;

    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Log content must not be empty".to_string()));
    }

    let entry = LearningLogEntry {
        student_id: payload.student_id,
        date: payload.date.format("%Y-%m-%d").to_string(),
        content: content.to_string(),
        teacher_name: auth.user.name.clone(),
        subject: auth.user.subject.clone(),
    };
    state.sheets.append(vec![entry.clone()]).await?;

    tracing::info!(teacher = %auth.id(), student = %entry.student_id, date = %entry.date, "Added learning log");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/logs
///
/// Replaces every entry of the student on the given date.
pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ReplaceLogsRequest>,
) -> Result<Json<Vec<LearningLogEntry>>> {
    auth.require_teacher()?;

    let date = payload.date.format("%Y-%m-%d").to_string();
    let replacement: Vec<LearningLogEntry> = payload
        .entries
        .into_iter()
        .filter(|e| !e.content.trim().is_empty())
        .map(|e| LearningLogEntry {
            student_id: payload.student_id.clone(),
            date: date.clone(),
            content: e.content.trim().to_string(),
            teacher_name: e.teacher_name,
            subject: e.subject,
        })
        .collect();

    let mut logs = state.sheets.load::<LearningLogEntry>().await?;
    logs.retain(|l| !(l.student_id == payload.student_id && l.date == date));
    logs.extend(replacement.iter().cloned());
    state.sheets.save(&logs).await?;

    tracing::info!(
        teacher = %auth.id(),
        student = %payload.student_id,
        date = %date,
        entries = replacement.len(),
        "Replaced learning logs"
    );
    Ok(Json(replacement))
}

/// GET /api/logs/calendar
pub async fn calendar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<CalendarEvent>>> {
    let student = auth.resolve_student(query.student_id.as_deref())?;
    let logs = state.sheets.load::<LearningLogEntry>().await?;
    Ok(Json(calendar_events(&logs, &student)))
}
