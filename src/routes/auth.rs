// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: password signup/login, Google and GitHub OAuth,
//! and the caller's profile.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{AuthProvider, User};
use crate::routes::allowed_frontend;
use crate::services::{accounts, oauth};
use crate::validation::{Sanitize, ValidatedJson};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", get(google_start))
        .route("/api/auth/google/callback", get(google_callback))
        .route("/api/auth/github", get(github_start))
        .route("/api/auth/github/callback", get(github_callback))
}

/// Routes that need a bearer token; the middleware is applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/profile", get(profile))
}

// ─── Password Flow ───────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: String,
}

impl Sanitize for SignupRequest {
    fn sanitize(&mut self) {
        self.email = crate::models::user::normalize_email(&self.email);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Sanitize for LoginRequest {
    fn sanitize(&mut self) {
        self.email = crate::models::user::normalize_email(&self.email);
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: String,
    pub email: String,
}

/// Create a password account.
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let user = accounts::register(&state.db, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Exchange email + password for a bearer token.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = accounts::authenticate(&state.db, &req.email, &req.password).await?;

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "Password login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user_id: user.id,
        email: user.email,
    }))
}

// ─── Profile ─────────────────────────────────────────────────

/// Public view of a user (no password hash).
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_id: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for ProfileUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            google_id: user.google_id,
            github_id: user.github_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub message: String,
    pub user: ProfileUser,
}

/// Get current user profile.
async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    // A valid token for a user that no longer exists is still unauthenticated.
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(ProfileResponse {
        message: "Access Granted".to_string(),
        user: user.into(),
    }))
}

// ─── OAuth Flow ──────────────────────────────────────────────

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// Ignored unless it is an allowed frontend origin.
    #[serde(default)]
    redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn google_start(
    state: State<Arc<AppState>>,
    params: Query<AuthStartParams>,
    headers: HeaderMap,
) -> Result<Redirect> {
    oauth_start(AuthProvider::Google, state, params, headers).await
}

async fn github_start(
    state: State<Arc<AppState>>,
    params: Query<AuthStartParams>,
    headers: HeaderMap,
) -> Result<Redirect> {
    oauth_start(AuthProvider::Github, state, params, headers).await
}

async fn google_callback(
    state: State<Arc<AppState>>,
    headers: HeaderMap,
    params: Query<CallbackParams>,
) -> Result<Redirect> {
    oauth_callback(AuthProvider::Google, state, headers, params).await
}

async fn github_callback(
    state: State<Arc<AppState>>,
    headers: HeaderMap,
    params: Query<CallbackParams>,
) -> Result<Redirect> {
    oauth_callback(AuthProvider::Github, state, headers, params).await
}

/// Public base URL of this API as seen by the browser.
fn public_base_url(headers: &HeaderMap) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string())
    };

    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(axum::http::header::HOST.as_str()))
        .unwrap_or_else(|| "localhost:3000".to_string());

    let scheme = header_str("x-forwarded-proto").unwrap_or_else(|| {
        if host.contains("localhost") || host.contains("127.0.0.1") {
            "http".to_string()
        } else {
            "https".to_string()
        }
    });

    format!("{}://{}", scheme, host)
}

fn callback_url(headers: &HeaderMap, provider: AuthProvider) -> String {
    format!(
        "{}/api/auth/{}/callback",
        public_base_url(headers),
        provider.as_str()
    )
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn oauth_start(
    provider: AuthProvider,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
    headers: HeaderMap,
) -> Result<Redirect> {
    let client = state.oauth_client(provider).ok_or_else(|| {
        AppError::NotFound(format!("{} login is not configured", provider.as_str()))
    })?;

    let frontend_url = params
        .redirect_uri
        .as_deref()
        .and_then(|uri| allowed_frontend(uri, &state.config))
        .unwrap_or_else(|| state.config.frontend_url.clone());

    let oauth_state = oauth::sign_state(&frontend_url, &state.config.oauth_state_key)?;
    let auth_url = client.authorize_url(&callback_url(&headers, provider), &oauth_state);

    tracing::info!(
        provider = provider.as_str(),
        frontend_url = %frontend_url,
        "Starting OAuth flow"
    );

    Ok(Redirect::temporary(&auth_url))
}

fn login_error_redirect(frontend_url: &str, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/login?error={}",
        frontend_url,
        urlencoding::encode(error)
    ))
}

/// OAuth callback - resolve the account, issue a token, redirect to the frontend.
async fn oauth_callback(
    provider: AuthProvider,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let client = state.oauth_client(provider).ok_or_else(|| {
        AppError::NotFound(format!("{} login is not configured", provider.as_str()))
    })?;

    // Decode and verify frontend URL from state parameter
    let frontend_url = params
        .state
        .as_deref()
        .and_then(|s| oauth::verify_state(s, &state.config.oauth_state_key))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or missing state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    if let Some(error) = params.error {
        tracing::warn!(provider = provider.as_str(), error = %error, "OAuth error from provider");
        return Ok(login_error_redirect(&frontend_url, &error));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Ok(login_error_redirect(&frontend_url, "missing_code"));
    };

    let profile = match client
        .authenticate(&code, &callback_url(&headers, provider))
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(provider = provider.as_str(), error = %e, "OAuth login failed");
            return Ok(login_error_redirect(&frontend_url, "oauth_failed"));
        }
    };

    let user = match accounts::link_federated_user(&state.db, &profile).await {
        Ok(user) => user,
        Err(AppError::UnverifiedEmail) => {
            return Ok(login_error_redirect(&frontend_url, "unverified_email"));
        }
        Err(AppError::Conflict(msg)) => {
            tracing::warn!(provider = provider.as_str(), error = %msg, "Federated account conflict");
            return Ok(login_error_redirect(&frontend_url, "account_conflict"));
        }
        Err(e) => return Err(e),
    };

    let jwt = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        provider = provider.as_str(),
        "OAuth login successful"
    );

    let redirect_url = format!(
        "{}/login?token={}&email={}",
        frontend_url,
        jwt,
        urlencoding::encode(&user.email)
    );

    Ok(Redirect::temporary(&redirect_url))
}
