//! Account management endpoints (teachers only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::auth::hash_password;
use crate::AppState;

/// Teacher accounts are managed by the admin account alone.
fn check_manage(auth: &AuthenticatedUser, role: Role) -> Result<()> {
    auth.require_teacher()?;
    if role == Role::Teacher {
        auth.require_admin()?;
    }
    Ok(())
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>> {
    auth.require_teacher()?;

    let users = state
        .sheets
        .load::<User>()
        .await?
        .into_iter()
        .filter(|u| query.role.map_or(true, |r| u.role == r))
        .collect();

    Ok(Json(users))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    check_manage(&auth, payload.role)?;

    let id = payload.id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".to_string()));
    }

    let mut users = state.sheets.load::<User>().await?;
    if users.iter().any(|u| u.id == id) {
        return Err(ApiError::Conflict(format!("User {id} already exists")));
    }

    let user = User {
        id: id.to_string(),
        pw: hash_password(&payload.password),
        name: payload.name,
        role: payload.role,
        subject: payload.subject,
        linked_student: payload.linked_student,
        math_class: payload.math_class,
        eng_class: payload.eng_class,
    };
    users.push(user.clone());
    state.sheets.save(&users).await?;

    tracing::info!(by = %auth.id(), user = %user.id, role = user.role.as_str(), "Created account");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let mut users = state.sheets.load::<User>().await?;
    let user = users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("User {id}")))?;
    check_manage(&auth, user.role)?;

    if let Some(name) = payload.name {
        user.name = name;
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        user.pw = hash_password(&password);
    }
    if let Some(subject) = payload.subject {
        user.subject = subject;
    }
    if let Some(math_class) = payload.math_class {
        user.math_class = math_class;
    }
    if let Some(eng_class) = payload.eng_class {
        user.eng_class = eng_class;
    }
    if let Some(linked) = payload.linked_student {
        user.linked_student = linked;
    }

    let updated = user.clone();
    state.sheets.save(&users).await?;

    tracing::info!(by = %auth.id(), user = %updated.id, "Updated account");
    Ok(Json(updated))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if id == ADMIN_ID {
        return Err(ApiError::Forbidden("The admin account cannot be deleted".to_string()));
    }

    let mut users = state.sheets.load::<User>().await?;
    let role = users
        .iter()
        .find(|u| u.id == id)
        .map(|u| u.role)
        .ok_or_else(|| ApiError::NotFound(format!("User {id}")))?;
    check_manage(&auth, role)?;

    users.retain(|u| u.id != id);
    state.sheets.save(&users).await?;

    tracing::info!(by = %auth.id(), user = %id, "Deleted account");
    Ok(StatusCode::NO_CONTENT)
}
