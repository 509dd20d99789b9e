// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place lookup routes backed by the place resolver.

use crate::error::{AppError, Result};
use crate::models::Place;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/places/search", get(search_places))
        .route("/api/places/photo", get(place_photo))
        .route("/api/places/{place_id}", get(place_details))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, max = 200))]
    pub query: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhotoParams {
    #[serde(rename = "ref")]
    #[validate(length(min = 1, max = 1024))]
    pub reference: String,
}

async fn search_places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Place>>> {
    params.validate()?;
    let query = params.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be blank".to_string()));
    }
    Ok(Json(state.places.search(query).await?))
}

async fn place_details(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<Place>> {
    state
        .places
        .details(&place_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Place {} not found", place_id)))
}

/// Proxy a place photo so the provider key stays server-side.
async fn place_photo(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PhotoParams>,
) -> Result<impl IntoResponse> {
    params.validate()?;
    let (content_type, bytes) = state.places.photo(&params.reference).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
        ],
        bytes,
    ))
}
