//! Exam paper endpoints: question images and explanation videos

use std::collections::BTreeSet;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::exams::{is_valid_video_url, parse_question_file, youtube_start_seconds};
use crate::services::storage::{content_type_for, exam_image_key, exam_prefix};
use crate::AppState;

/// An uploaded file field
struct UploadedFile {
    file_name: String,
    content: Vec<u8>,
}

async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(String::from) else {
            continue;
        };
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {file_name}: {e}")))?
            .to_vec();
        files.push(UploadedFile { file_name, content });
    }
    Ok(files)
}

fn valid_exam_name(exam: &str) -> Result<&str> {
    let exam = exam.trim();
    if exam.is_empty() || exam.contains('/') {
        return Err(ApiError::BadRequest(format!("Invalid exam name: {exam:?}")));
    }
    Ok(exam)
}

/// POST /api/exams/:exam/images
///
/// Files must be named `<question number>.<ext>`. Re-uploading a number
/// replaces its image and keeps its video link.
pub async fn upload_images(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(exam): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ExamUploadResponse>)> {
    auth.require_teacher()?;
    let exam = valid_exam_name(&exam)?.to_string();

    let files = read_files(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let mut questions = state.sheets.load::<ExamQuestion>().await?;
    let mut uploaded = 0;
    let mut skipped = Vec::new();

    for file in files {
        let Some((question_no, extension)) = parse_question_file(&file.file_name) else {
            skipped.push(file.file_name);
            continue;
        };
        let key = exam_image_key(&exam, question_no, &extension);

        let previous = questions
            .iter()
            .position(|q| q.exam_name == exam && q.question_no == question_no);
        let video_url = match previous {
            Some(idx) => {
                let old = questions.remove(idx);
                if old.image_key != key {
                    state.storage.delete(&old.image_key).await?;
                }
                old.video_url
            }
            None => String::new(),
        };

        state
            .storage
            .put(&key, file.content, Some(content_type_for(&key)))
            .await?;
        questions.push(ExamQuestion {
            exam_name: exam.clone(),
            question_no,
            image_key: key,
            video_url,
        });
        uploaded += 1;
    }

    if uploaded > 0 {
        state.sheets.save(&questions).await?;
    }

    tracing::info!(exam = %exam, uploaded, skipped = skipped.len(), "Uploaded exam images");
    Ok((
        StatusCode::CREATED,
        Json(ExamUploadResponse {
            exam_name: exam,
            uploaded,
            skipped,
        }),
    ))
}

/// GET /api/exams
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let names: BTreeSet<String> = state
        .sheets
        .load::<ExamQuestion>()
        .await?
        .into_iter()
        .map(|q| q.exam_name)
        .collect();
    Ok(Json(names.into_iter().collect()))
}

/// GET /api/exams/:exam/questions
pub async fn questions(
    State(state): State<AppState>,
    Path(exam): Path<String>,
) -> Result<Json<Vec<QuestionView>>> {
    let questions = state.sheets.load::<ExamQuestion>().await?;
    if !questions.iter().any(|q| q.exam_name == exam) {
        return Err(ApiError::NotFound(format!("Exam {exam}")));
    }
    questions_view(questions, &exam)
}

/// PUT /api/exams/:exam/videos
pub async fn update_videos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(exam): Path<String>,
    Json(payload): Json<UpdateVideoLinksRequest>,
) -> Result<Json<Vec<QuestionView>>> {
    auth.require_teacher()?;

    if let Some(bad) = payload.links.iter().find(|l| !is_valid_video_url(&l.video_url)) {
        return Err(ApiError::BadRequest(format!(
            "Question {}: video link must start with http:// or https://",
            bad.question_no
        )));
    }

    let mut questions = state.sheets.load::<ExamQuestion>().await?;
    for link in &payload.links {
        let question = questions
            .iter_mut()
            .find(|q| q.exam_name == exam && q.question_no == link.question_no)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Question {} of {exam}", link.question_no))
            })?;
        question.video_url = link.video_url.trim().to_string();
    }
    state.sheets.save(&questions).await?;

    tracing::info!(exam = %exam, links = payload.links.len(), "Updated video links");
    questions_view(questions, &exam)
}

fn questions_view(questions: Vec<ExamQuestion>, exam: &str) -> Result<Json<Vec<QuestionView>>> {
    let mut view: Vec<QuestionView> = questions
        .into_iter()
        .filter(|q| q.exam_name == exam)
        .map(|question| QuestionView {
            start_seconds: youtube_start_seconds(&question.video_url),
            question,
        })
        .collect();
    view.sort_by_key(|v| v.question.question_no);
    Ok(Json(view))
}

/// PUT /api/exams/:exam/questions/:no/image
pub async fn replace_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path((exam, question_no)): Path<(String, u32)>,
    multipart: Multipart,
) -> Result<Json<ExamQuestion>> {
    auth.require_teacher()?;

    let file = read_files(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let extension = file
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} has no extension", file.file_name)))?;

    let mut questions = state.sheets.load::<ExamQuestion>().await?;
    let question = questions
        .iter_mut()
        .find(|q| q.exam_name == exam && q.question_no == question_no)
        .ok_or_else(|| ApiError::NotFound(format!("Question {question_no} of {exam}")))?;

    let key = exam_image_key(&exam, question_no, &extension);
    if question.image_key != key {
        state.storage.delete(&question.image_key).await?;
    }
    state
        .storage
        .put(&key, file.content, Some(content_type_for(&key)))
        .await?;
    question.image_key = key;

    let updated = question.clone();
    state.sheets.save(&questions).await?;

    tracing::info!(exam = %exam, question_no, "Replaced question image");
    Ok(Json(updated))
}

/// GET /api/exams/:exam/questions/:no/image
pub async fn image(
    State(state): State<AppState>,
    Path((exam, question_no)): Path<(String, u32)>,
) -> Result<impl IntoResponse> {
    let question = state
        .sheets
        .load::<ExamQuestion>()
        .await?
        .into_iter()
        .find(|q| q.exam_name == exam && q.question_no == question_no)
        .ok_or_else(|| ApiError::NotFound(format!("Question {question_no} of {exam}")))?;

    let object = state.storage.get(&question.image_key).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| content_type_for(&question.image_key).to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], object.content))
}

/// DELETE /api/exams/:exam
///
/// Removes the exam's question rows and every stored image.
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(exam): Path<String>,
) -> Result<StatusCode> {
    auth.require_teacher()?;

    let mut questions = state.sheets.load::<ExamQuestion>().await?;
    let before = questions.len();
    questions.retain(|q| q.exam_name != exam);
    if questions.len() == before {
        return Err(ApiError::NotFound(format!("Exam {exam}")));
    }
    state.sheets.save(&questions).await?;

    let keys = state.storage.list(&exam_prefix(&exam)).await?;
    for key in &keys {
        state.storage.delete(key).await?;
    }

    tracing::info!(exam = %exam, questions = before - questions.len(), images = keys.len(), "Deleted exam");
    Ok(StatusCode::NO_CONTENT)
}
