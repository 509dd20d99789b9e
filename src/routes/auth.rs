// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, Viewer, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{User, UserSummary};
use crate::services::users::{Credentials, Registration};
use crate::AppState;

/// Public auth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes that read the session viewer.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: UserSummary,
    pub token: String,
}

/// Cookies are `Secure` unless the frontend is served from localhost.
fn is_secure(state: &AppState) -> bool {
    let url = &state.config.frontend_url;
    !(url.starts_with("http://localhost") || url.starts_with("http://127.0.0.1"))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(state))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, String)> {
    let token = create_jwt(user, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar.add(session_cookie(state, token.clone()));
    Ok((jar, token))
}

/// Create an account and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<Registration>,
) -> Result<impl IntoResponse> {
    let credentials = Credentials {
        email: form.email.clone(),
        password: form.password.clone(),
    };
    state.users.register(form).await?;

    let user = state.users.authenticate(&credentials).await?;
    let (jar, token) = start_session(&state, jar, &user)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse> {
    let user = state.users.authenticate(&credentials).await?;
    let (jar, token) = start_session(&state, jar, &user)?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok((
        jar,
        Json(SessionResponse {
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

/// Clear the session cookie. Removal attributes match creation.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(&state))
        .build();
    (StatusCode::NO_CONTENT, jar.remove(removal))
}

/// Current user.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<UserSummary>> {
    let viewer = viewer.require()?;
    Ok(Json(state.users.get(&viewer.user_id).await?))
}
