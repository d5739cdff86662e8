//! Account endpoints and the bearer-session principal.
//!
//! Every protected handler receives an explicit [`AuthUser`] resolved from
//! the `Authorization: Bearer <token>` header; there is no ambient user
//! context anywhere downstream.

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use snapshop_catalog::CatalogClient;
use snapshop_core::domain::user::{ProfileUpdateInput, RegistrationInput, Role, User};
use snapshop_core::errors::{ApplicationError, DomainError, InterfaceError};
use snapshop_core::password;
use snapshop_db::repositories::{NewUser, RepositoryError, SqlUserRepository, UserRepository};
use snapshop_db::DbPool;

use crate::bootstrap::Application;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub catalog: CatalogClient,
    pub session_ttl_hours: u64,
    pub min_password_len: usize,
}

impl AppState {
    pub fn new(app: &Application) -> Self {
        Self {
            db_pool: app.db_pool.clone(),
            catalog: app.catalog.clone(),
            session_ttl_hours: app.config.auth.session_ttl_hours,
            min_password_len: app.config.auth.min_password_len,
        }
    }
}

// ---------------------------------------------------------------------------
// Error payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: &'static str,
    pub message: String,
}

pub fn api_error(code: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (code, Json(ApiError { status: "error", message: message.into() }))
}

/// Map the layered error taxonomy onto a response. The correlation id stays
/// in the logs; clients only see the user-safe message.
pub fn domain_error(error: DomainError) -> (StatusCode, Json<ApiError>) {
    let correlation_id = Uuid::new_v4().simple().to_string();
    let interface = ApplicationError::from(error).into_interface(correlation_id.clone());
    let code = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    warn!(correlation_id = %correlation_id, error = %interface, "request rejected");
    api_error(code, interface.user_message())
}

pub fn repository_error(error: RepositoryError) -> (StatusCode, Json<ApiError>) {
    match error {
        RepositoryError::NotFound => domain_error(DomainError::NotFound),
        RepositoryError::Conflict(message) => domain_error(DomainError::Conflict(message)),
        other => {
            error!(error = %other, "storefront database error");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
        }
    }
}

// ---------------------------------------------------------------------------
// Principal extractor
// ---------------------------------------------------------------------------

/// Authenticated principal for a request. Wraps the full user row so
/// handlers never re-fetch it.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Authentication required."))?;

        let users = SqlUserRepository::new(state.db_pool.clone());
        match users.find_session_user(token).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => {
                Err(api_error(StatusCode::UNAUTHORIZED, "Session is invalid or has expired."))
            }
            Err(error) => Err(repository_error(error)),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer ").map(str::trim))
        .filter(|token| !token.is_empty())
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub accepted_terms: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email, matched case-insensitively.
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub status: &'static str,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, Json<ApiError>)> {
    let input = RegistrationInput {
        name: body.name,
        username: body.username,
        email: body.email,
        password: SecretString::from(body.password),
        confirm_password: SecretString::from(body.confirm_password),
        role: body.role.as_deref().map(Role::parse).unwrap_or_default(),
        accepted_terms: body.accepted_terms,
    };
    input.validate(state.min_password_len).map_err(domain_error)?;

    let password_hash = password::hash(&input.password).map_err(|error| {
        error!(error = %error, "password hashing failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    })?;

    let users = SqlUserRepository::new(state.db_pool.clone());
    let user = users
        .create(NewUser {
            name: input.name.trim().to_string(),
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password_hash,
            role: input.role,
        })
        .await
        .map_err(repository_error)?;

    let token = open_session(&users, &user, state.session_ttl_hours).await?;

    info!(
        event_name = "auth.user.registered",
        user_id = user.id.0,
        username = %user.username,
        "new account registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            status: "success",
            message: format!("Welcome, {}! Your account has been created.", user.name),
            token,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ApiError>)> {
    let login = body.login.trim();
    if login.is_empty() || body.password.is_empty() {
        return Err(domain_error(DomainError::validation(
            "Username/email and password are required.",
        )));
    }

    let users = SqlUserRepository::new(state.db_pool.clone());
    let credentials = users
        .find_credentials(login)
        .await
        .map_err(repository_error)?
        .ok_or_else(|| {
            api_error(StatusCode::UNAUTHORIZED, "No account matches that username or email.")
        })?;

    let submitted = SecretString::from(body.password);
    let verified =
        password::verify(&submitted, &credentials.password_hash).map_err(|error| {
            error!(error = %error, "password verification failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
        })?;
    if !verified {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Incorrect password."));
    }

    let user = credentials.user;
    let token = open_session(&users, &user, state.session_ttl_hours).await?;

    info!(event_name = "auth.user.logged_in", user_id = user.id.0, "user logged in");

    Ok(Json(SessionResponse {
        status: "success",
        message: format!("Welcome back, {}!", user.name),
        token,
        user,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, (StatusCode, Json<ApiError>)> {
    let token = bearer_token(&headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Authentication required."))?;

    let users = SqlUserRepository::new(state.db_pool.clone());
    users.delete_session(token).await.map_err(repository_error)?;

    Ok(Json(LogoutResponse {
        status: "success",
        message: "You have been logged out.".to_string(),
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProfileUpdateInput>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ApiError>)> {
    input.validate().map_err(domain_error)?;

    let users = SqlUserRepository::new(state.db_pool.clone());
    let updated = users.update_profile(user.id, &input).await.map_err(repository_error)?;

    info!(event_name = "auth.profile.updated", user_id = updated.id.0, "profile updated");

    Ok(Json(SessionResponse {
        status: "success",
        message: "Your profile has been updated.".to_string(),
        token: String::new(),
        user: updated,
    }))
}

async fn open_session(
    users: &SqlUserRepository,
    user: &User,
    ttl_hours: u64,
) -> Result<String, (StatusCode, Json<ApiError>)> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::hours(ttl_hours.min(i64::MAX as u64) as i64);
    users.create_session(user.id, &token, expires_at).await.map_err(repository_error)?;
    Ok(token)
}
