// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redirect rules for browser page routes, applied before the frontend is
//! served.

use crate::middleware::auth::{decode_session, session_token};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

fn is_protected(path: &str) -> bool {
    path == "/trips" || path == "/trip-overview" || path.starts_with("/trip-overview/")
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}

/// Where a page request should be sent instead, if anywhere.
///
/// - `/login`, `/register`, `/auth` go to `/`, keeping the query.
/// - Signed-in visitors of `/` go to `/trips`, keeping the query.
/// - Anonymous visitors of `/trips` or `/trip-overview[/...]` go to `/` with
///   the requested path in `from`.
pub fn page_redirect(path: &str, query: Option<&str>, authenticated: bool) -> Option<String> {
    match path {
        "/login" | "/register" | "/auth" => Some(with_query("/", query)),
        "/" if authenticated => Some(with_query("/trips", query)),
        p if !authenticated && is_protected(p) => {
            Some(format!("/?from={}", urlencoding::encode(p)))
        }
        _ => None,
    }
}

/// Middleware applying [`page_redirect`].
pub async fn redirect_pages(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let authenticated = session_token(&jar, request.headers())
        .and_then(|token| decode_session(&token, &state.config.jwt_signing_key))
        .is_some();

    let uri = request.uri();
    match page_redirect(uri.path(), uri.query(), authenticated) {
        Some(target) => {
            tracing::debug!(from = %uri.path(), to = %target, "Page redirect");
            Redirect::temporary(&target).into_response()
        }
        None => next.run(request).await,
    }
}
