//! Vocabulary catalog endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub day: Option<String>,
}

fn book_name(book: &str) -> Result<&str> {
    let book = book.trim();
    if book.is_empty() {
        return Err(ApiError::BadRequest("Book name must not be empty".to_string()));
    }
    Ok(book)
}

async fn add_to_catalog(
    state: &AppState,
    book: &str,
    items: Vec<VocabItem>,
) -> Result<(StatusCode, Json<ImportVocabResponse>)> {
    if items.is_empty() {
        return Err(ApiError::BadRequest("No words found in the file".to_string()));
    }

    let imported = items.len();
    let mut catalog = state.sheets.catalog().await?;
    catalog.extend(items);
    state.sheets.save_catalog(&catalog).await?;

    tracing::info!(book, imported, "Imported word list");
    Ok((
        StatusCode::CREATED,
        Json(ImportVocabResponse {
            book: book.to_string(),
            imported,
        }),
    ))
}

/// POST /api/vocab/import
pub async fn import(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ImportVocabRequest>,
) -> Result<(StatusCode, Json<ImportVocabResponse>)> {
    auth.require_teacher()?;

    let book = book_name(&payload.book)?;
    let items = vocab_core::parse(&payload.content, book)?;
    add_to_catalog(&state, book, items).await
}

/// POST /api/vocab/import/file
///
/// Multipart form with a `book` text field and a `.csv` or `.xlsx` file.
pub async fn import_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportVocabResponse>)> {
    auth.require_teacher()?;

    let mut book = String::new();
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if let Some(file_name) = field.file_name().map(String::from) {
            let content = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read {file_name}: {e}")))?;
            file = Some((file_name, content.to_vec()));
        } else if field.name() == Some("book") {
            book = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid book field: {e}")))?;
        }
    }

    let book = book_name(&book)?;
    let (file_name, content) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let lower = file_name.to_lowercase();
    let items = if lower.ends_with(".xlsx") {
        vocab_core::parse_xlsx(&content, book)?
    } else if lower.ends_with(".csv") {
        let text = String::from_utf8(content)
            .map_err(|_| ApiError::BadRequest(format!("{file_name} is not UTF-8 text")))?;
        vocab_core::parse(&text, book)?
    } else {
        return Err(ApiError::BadRequest(format!(
            "Unsupported word list {file_name}: expected .csv or .xlsx"
        )));
    };

    add_to_catalog(&state, book, items).await
}

/// GET /api/vocab/books
pub async fn books(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.sheets.catalog().await?.books()))
}

/// GET /api/vocab/books/:book/days
pub async fn days(
    State(state): State<AppState>,
    Path(book): Path<String>,
) -> Result<Json<Vec<String>>> {
    let days = state.sheets.catalog().await?.days(&book);
    if days.is_empty() {
        return Err(ApiError::NotFound(format!("Book {book}")));
    }
    Ok(Json(days))
}

/// GET /api/vocab/books/:book/words
pub async fn words(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(book): Path<String>,
    Query(query): Query<WordsQuery>,
) -> Result<Json<Vec<VocabItem>>> {
    auth.require_teacher()?;

    let catalog = state.sheets.catalog().await?;
    let items = match query.day {
        Some(day) => catalog.chapter(&book, &day),
        None => catalog.book_items(&book).cloned().collect(),
    };
    Ok(Json(items))
}

/// PUT /api/vocab/books/:book
pub async fn rename_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(book): Path<String>,
    Json(payload): Json<RenameBookRequest>,
) -> Result<Json<BookChangeResponse>> {
    auth.require_teacher()?;

    let new_name = payload.new_name.trim();
    if new_name.is_empty() {
        return Err(ApiError::BadRequest("New name must not be empty".to_string()));
    }

    let mut catalog = state.sheets.catalog().await?;
    let affected = catalog.rename_book(&book, new_name);
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Book {book}")));
    }
    state.sheets.save_catalog(&catalog).await?;

    tracing::info!(from = %book, to = new_name, affected, "Renamed book");
    Ok(Json(BookChangeResponse {
        book: new_name.to_string(),
        affected,
    }))
}

/// DELETE /api/vocab/books/:book
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(book): Path<String>,
) -> Result<Json<BookChangeResponse>> {
    auth.require_teacher()?;

    let mut catalog = state.sheets.catalog().await?;
    let affected = catalog.delete_book(&book);
    if affected == 0 {
        return Err(ApiError::NotFound(format!("Book {book}")));
    }
    state.sheets.save_catalog(&catalog).await?;

    tracing::info!(book = %book, affected, "Deleted book");
    Ok(Json(BookChangeResponse { book, affected }))
}
