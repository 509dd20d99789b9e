// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip routes, including the per-trip change stream.

use crate::error::Result;
use crate::middleware::auth::Viewer;
use crate::models::Collaborator;
use crate::services::changes::ChangeKind;
use crate::services::trips::{CollaboratorInput, NewTrip, TripPatch, TripView};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips", get(list_trips).post(create_trip))
        .route(
            "/api/trips/{id}",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/api/trips/{id}/collaborators", post(share_trip))
        .route("/api/trips/{id}/events", get(trip_events))
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<TripView>>> {
    Ok(Json(state.trips.list_trips(viewer.user()).await?))
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(input): Json<NewTrip>,
) -> Result<(StatusCode, Json<TripView>)> {
    let trip = state.trips.create_trip(viewer.user(), input).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<TripView>> {
    Ok(Json(state.trips.get_trip(viewer.user(), &id).await?))
}

async fn update_trip(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(patch): Json<TripPatch>,
) -> Result<Json<TripView>> {
    Ok(Json(state.trips.update_trip(viewer.user(), &id, patch).await?))
}

async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.trips.delete_trip(viewer.user(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn share_trip(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(input): Json<CollaboratorInput>,
) -> Result<(StatusCode, Json<Collaborator>)> {
    let collaborator = state.trips.share_trip(viewer.user(), &id, input).await?;
    Ok((StatusCode::CREATED, Json(collaborator)))
}

/// Server-Sent Events stream of changes to one trip. Clients re-fetch the
/// trip on each `trip_changed` event, and on `resync` after missing some.
async fn trip_events(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    state.trips.authorize_read(viewer.user(), &id).await?;
    let rx = state.changes.subscribe();
    tracing::debug!(trip_id = %id, "Change stream opened");

    // The stream ends after delivering the trip's deletion.
    let events = stream::unfold(Some((rx, id)), |next| async move {
        let (mut rx, trip_id) = next?;
        loop {
            match rx.recv().await {
                Ok(change) if change.trip_id == trip_id => {
                    let event = Event::default()
                        .event("trip_changed")
                        .json_data(&change)
                        .unwrap_or_else(|_| Event::default().event("trip_changed"));
                    let next = if change.kind == ChangeKind::TripDeleted {
                        None
                    } else {
                        Some((rx, trip_id))
                    };
                    return Some((Ok::<_, Infallible>(event), next));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%trip_id, skipped, "Change stream lagged");
                    return Some((Ok(Event::default().event("resync")), Some((rx, trip_id))));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
