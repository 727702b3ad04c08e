//! Authentication middleware, login endpoints and role guards

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::auth::{check_password, hash_password, PasswordCheck};
use crate::AppState;

/// Logged-in user stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn require_teacher(&self) -> Result<()> {
        match self.user.role {
            Role::Teacher => Ok(()),
            _ => Err(ApiError::Forbidden("Teachers only".to_string())),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Only the admin account may do this".to_string()))
        }
    }

    pub fn require_student(&self) -> Result<()> {
        match self.user.role {
            Role::Student => Ok(()),
            _ => Err(ApiError::Forbidden("Students only".to_string())),
        }
    }

    /// The student whose records this user may see.
    ///
    /// Students see themselves and parents their linked child. Teachers
    /// must name the student.
    pub fn resolve_student(&self, requested: Option<&str>) -> Result<String> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());
        let own = match self.user.role {
            Role::Teacher => {
                return requested
                    .map(String::from)
                    .ok_or_else(|| ApiError::BadRequest("student_id is required".to_string()));
            }
            Role::Student => self.user.id.as_str(),
            Role::Parent => {
                if self.user.linked_student.is_empty() {
                    return Err(ApiError::NotFound("No linked student".to_string()));
                }
                self.user.linked_student.as_str()
            }
        };

        match requested {
            Some(other) if other != own => Err(ApiError::Forbidden(format!(
                "Not allowed to view records of {other}"
            ))),
            _ => Ok(own.to_string()),
        }
    }
}

/// Auth middleware - resolves the bearer token to a user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    // Extract Bearer token
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    let user_id = state
        .tokens
        .resolve(&token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    // Load the account on every request so role changes apply at once
    let user = state
        .sheets
        .find_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, token });

    Ok(next.run(request).await)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid id or password".to_string());

    let mut users = state.sheets.load::<User>().await?;
    let idx = users
        .iter()
        .position(|u| u.id == payload.id)
        .ok_or_else(invalid)?;

    match check_password(&users[idx].pw, &payload.password) {
        PasswordCheck::Valid => {}
        PasswordCheck::ValidLegacy => {
            users[idx].pw = hash_password(&payload.password);
            state.sheets.save(&users).await?;
            tracing::info!(user = %payload.id, "Upgraded plaintext password to hash");
        }
        PasswordCheck::Invalid => return Err(invalid()),
    }

    let user = users.swap_remove(idx);
    let token = state.tokens.issue(&user.id).await;
    tracing::info!(user = %user.id, role = user.role.as_str(), "Logged in");

    Ok(Json(LoginResponse { token, user }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> StatusCode {
    state.tokens.revoke(&auth.token).await;
    StatusCode::NO_CONTENT
}

/// GET /api/auth/me
pub async fn me(Extension(auth): Extension<AuthenticatedUser>) -> Json<User> {
    Json(auth.user)
}
