// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transit estimate routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::Viewer;
use crate::models::{TransitInfo, TravelMode};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips/{trip_id}/transit", get(get_transit))
        .route("/api/trips/{trip_id}/transit/mode", put(select_mode))
}

#[derive(Debug, Deserialize)]
pub struct PairParams {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeSelection {
    pub from: String,
    pub to: String,
    pub mode: TravelMode,
}

/// Estimates from one activity to the next; `null` when either has no
/// location.
async fn get_transit(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(trip_id): Path<String>,
    Query(pair): Query<PairParams>,
) -> Result<Json<Option<TransitInfo>>> {
    let (from, to) = state
        .trips
        .activity_pair(viewer.user(), &trip_id, &pair.from, &pair.to)
        .await?;
    Ok(Json(state.transit.get_or_compute(&from, &to).await))
}

async fn select_mode(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(trip_id): Path<String>,
    Json(selection): Json<ModeSelection>,
) -> Result<Json<TransitInfo>> {
    state
        .trips
        .activity_pair(viewer.user(), &trip_id, &selection.from, &selection.to)
        .await?;

    state
        .transit
        .select_mode(&selection.from, &selection.to, selection.mode)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No transit estimate for this pair".to_string()))
}
