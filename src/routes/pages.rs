// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser page routes. Each serves the frontend's `index.html` after the
//! redirect rules have run.

use crate::middleware::pages::redirect_pages;
use crate::AppState;
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::services::ServeFile;

const PAGE_PATHS: [&str; 7] = [
    "/",
    "/trips",
    "/trip-overview",
    "/trip-overview/{*rest}",
    "/login",
    "/register",
    "/auth",
];

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let index = state.config.static_dir.join("index.html");

    PAGE_PATHS
        .iter()
        .fold(Router::new(), |router, path| {
            router.route_service(path, ServeFile::new(&index))
        })
        .route_layer(middleware::from_fn_with_state(state.clone(), redirect_pages))
}
