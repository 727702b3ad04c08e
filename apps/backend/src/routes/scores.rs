//! Exam score endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::records::{filter_by_class, score_averages, score_classes};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassQuery {
    pub class: Option<String>,
}

fn with_names(scores: Vec<ScoreEntry>, users: &[User]) -> Vec<ScoreView> {
    scores
        .into_iter()
        .map(|entry| ScoreView {
            name: users
                .iter()
                .find(|u| u.id == entry.student_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
            entry,
        })
        .collect()
}

/// GET /api/scores
///
/// Teachers may filter by student or class. Students and parents see one
/// student's scores.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<Vec<ScoreView>>> {
    let users = state.sheets.load::<User>().await?;
    let scores = state.sheets.load::<ScoreEntry>().await?;

    let student = match auth.user.role {
        Role::Teacher => query.student_id.filter(|s| !s.trim().is_empty()),
        _ => Some(auth.resolve_student(query.student_id.as_deref())?),
    };
    let class = query.class.filter(|c| !c.trim().is_empty());

    let selected: Vec<ScoreEntry> = match class {
        Some(class) => filter_by_class(&scores, &users, &class)
            .into_iter()
            .cloned()
            .collect(),
        None => scores,
    };
    let selected = selected
        .into_iter()
        .filter(|s| student.as_ref().map_or(true, |id| &s.student_id == id))
        .collect();

    Ok(Json(with_names(selected, &users)))
}

/// POST /api/scores
pub async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<AddScoreRequest>,
) -> Result<(StatusCode, Json<ScoreEntry>)> {
    auth.require_teacher()?;

    let exam_name = payload.exam_name.trim();
    if exam_name.is_empty() {
        return Err(ApiError::BadRequest("Exam name must not be empty".to_string()));
    }
    if payload.score > 100 {
        return Err(ApiError::BadRequest("Score must be between 0 and 100".to_string()));
    }

    let entry = ScoreEntry {
        student_id: payload.student_id,
        exam_name: exam_name.to_string(),
        subject: payload.subject,
        score: payload.score.to_string(),
        date: payload.date.format("%Y-%m-%d").to_string(),
    };
    state.sheets.append(vec![entry.clone()]).await?;

    tracing::info!(
        teacher = %auth.id(),
        student = %entry.student_id,
        exam = %entry.exam_name,
        "Recorded score"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/scores
///
/// Replaces the whole score table with an edited copy.
pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(scores): Json<Vec<ScoreEntry>>,
) -> Result<Json<Vec<ScoreEntry>>> {
    auth.require_teacher()?;

    state.sheets.save(&scores).await?;

    tracing::info!(teacher = %auth.id(), rows = scores.len(), "Replaced score table");
    Ok(Json(scores))
}

/// GET /api/scores/classes
pub async fn classes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<String>>> {
    auth.require_teacher()?;

    let users = state.sheets.load::<User>().await?;
    let scores = state.sheets.load::<ScoreEntry>().await?;
    Ok(Json(score_classes(&scores, &users)))
}

/// GET /api/scores/averages
pub async fn averages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Vec<ScoreAverage>>> {
    auth.require_teacher()?;

    let users = state.sheets.load::<User>().await?;
    let scores = state.sheets.load::<ScoreEntry>().await?;

    let averages = match query.class.filter(|c| !c.trim().is_empty()) {
        Some(class) => score_averages(filter_by_class(&scores, &users, &class)),
        None => score_averages(&scores),
    };
    Ok(Json(averages))
}
