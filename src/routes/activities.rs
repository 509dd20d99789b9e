// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity routes: per-day list, add, reorder, update and delete.

use crate::error::{AppError, Result};
use crate::middleware::auth::Viewer;
use crate::models::Activity;
use crate::services::trips::{ActivityPatch, NewActivity, ReorderOutcome};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/trips/{trip_id}/days/{day_id}/activities",
            get(list_day_activities).post(add_activity),
        )
        .route(
            "/api/trips/{trip_id}/days/{day_id}/activities/order",
            put(reorder_activities),
        )
        .route(
            "/api/activities/{id}",
            put(update_activity).delete(delete_activity),
        )
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub activity_ids: Vec<String>,
}

async fn list_day_activities(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((trip_id, day_id)): Path<(String, String)>,
) -> Result<Json<Vec<Activity>>> {
    Ok(Json(
        state
            .trips
            .day_activities(viewer.user(), &trip_id, &day_id)
            .await?,
    ))
}

/// Add an activity; with `place_id` the place's details fill it in.
async fn add_activity(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((trip_id, day_id)): Path<(String, String)>,
    Json(mut input): Json<NewActivity>,
) -> Result<(StatusCode, Json<Activity>)> {
    let user = viewer.require()?;

    if let Some(place_id) = input.place_id.clone().filter(|id| !id.trim().is_empty()) {
        let place = state
            .places
            .details(&place_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Place {} not found", place_id)))?;
        input.fill_from_place(&place);
    }

    let activity = state
        .trips
        .add_activity(Some(user), &trip_id, &day_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn reorder_activities(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((trip_id, day_id)): Path<(String, String)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderOutcome>> {
    Ok(Json(
        state
            .trips
            .reorder_activities(viewer.user(), &trip_id, &day_id, request.activity_ids)
            .await?,
    ))
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(patch): Json<ActivityPatch>,
) -> Result<Json<Activity>> {
    Ok(Json(
        state
            .trips
            .update_activity(viewer.user(), &id, patch)
            .await?,
    ))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.trips.delete_activity(viewer.user(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
