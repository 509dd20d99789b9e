// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware.
//!
//! Read paths degrade to "no viewer" instead of rejecting, so every `/api`
//! route gets a [`Viewer`] extension; routes that only make sense with a
//! session sit behind [`require_auth`].

use crate::error::AppError;
use crate::models::{normalize_email, User};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "trip_planner_token";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Normalized email, matched against collaborator rows
    pub email: String,
    /// Display name
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

/// The requesting viewer, if any.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }

    /// The authenticated user, or `Unauthorized` for mutation paths.
    pub fn require(&self) -> Result<&AuthUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Pull the raw session token from the cookie or the bearer header.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decode and verify a session token.
pub fn decode_session(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    Some(AuthUser {
        user_id: token_data.claims.sub,
        email: normalize_email(&token_data.claims.email),
        name: token_data.claims.name,
    })
}

fn viewer_from_request(state: &AppState, jar: &CookieJar, request: &Request) -> Viewer {
    let user = session_token(jar, request.headers())
        .and_then(|token| decode_session(&token, &state.config.jwt_signing_key));
    Viewer(user)
}

/// Middleware that attaches the (possibly anonymous) viewer.
pub async fn attach_viewer(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = viewer_from_request(&state, &jar, &request);
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let viewer = viewer_from_request(&state, &jar, &request);
    if viewer.user().is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    request.extensions_mut().insert(viewer);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user: &User, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
