// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use trip_planner::config::Config;
use trip_planner::db::{FirestoreDb, MemoryStore};
use trip_planner::error::AppError;
use trip_planner::middleware::auth::create_jwt;
use trip_planner::models::{ModeEstimate, Place, Position, TravelMode, User};
use trip_planner::routes::create_router;
use trip_planner::services::{PlaceResolver, RouteEstimator};
use trip_planner::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Maps fake: two known places and a route estimator that counts calls.
/// Transit has no coverage.
#[derive(Default)]
pub struct FakeMaps {
    pub estimate_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeMaps {
    pub fn calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }
}

fn fake_place(place_id: &str) -> Option<Place> {
    let (name, address, types, lat) = match place_id {
        "joes-pizza" => (
            "Joe's Pizza",
            "7 Carmine St, New York, NY",
            vec!["restaurant", "food", "point_of_interest"],
            40.7305,
        ),
        "the-met" => (
            "The Metropolitan Museum of Art",
            "1000 5th Ave, New York, NY",
            vec!["museum", "tourist_attraction"],
            40.7794,
        ),
        _ => return None,
    };
    Some(Place {
        place_id: place_id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        position: Some(Position { lat, lng: -73.99 }),
        types: types.into_iter().map(str::to_string).collect(),
        website: Some(format!("https://{}.example", place_id)),
        ..Place::default()
    })
}

#[async_trait]
impl PlaceResolver for FakeMaps {
    async fn search(&self, query: &str) -> Result<Vec<Place>, AppError> {
        let query = query.to_ascii_lowercase();
        Ok(["joes-pizza", "the-met"]
            .into_iter()
            .filter_map(fake_place)
            .filter(|p| p.name.to_ascii_lowercase().contains(&query))
            .collect())
    }

    async fn details(&self, place_id: &str) -> Result<Option<Place>, AppError> {
        Ok(fake_place(place_id))
    }

    async fn photo(&self, _reference: &str) -> Result<(String, Vec<u8>), AppError> {
        Ok(("image/jpeg".to_string(), vec![0xff, 0xd8, 0xff]))
    }
}

#[async_trait]
impl RouteEstimator for FakeMaps {
    async fn estimate(
        &self,
        _origin: &str,
        _destination: &str,
        mode: TravelMode,
    ) -> Result<Option<ModeEstimate>, AppError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if mode == TravelMode::Transit {
            return Ok(None);
        }
        Ok(Some(ModeEstimate {
            distance_meters: 4200,
            distance_text: "4.2 km".to_string(),
            duration_seconds: 1200,
            duration_text: "20 mins".to_string(),
        }))
    }
}

/// Test config with a private upload directory.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::test_default();
    config.upload_dir =
        std::env::temp_dir().join(format!("trip-planner-test-{}", uuid::Uuid::new_v4()));
    config
}

/// Create a test app over the in-memory store and fake maps.
/// Returns the router, the shared state and the maps fake.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<FakeMaps>) {
    let (app, state, maps, _) = create_test_app_with_store();
    (app, state, maps)
}

/// [`create_test_app`] that also hands back the store, for fault injection.
#[allow(dead_code)]
pub fn create_test_app_with_store() -> (axum::Router, Arc<AppState>, Arc<FakeMaps>, Arc<MemoryStore>) {
    let maps = Arc::new(FakeMaps::default());
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        test_config(),
        store.clone(),
        maps.clone(),
        maps.clone(),
    ));
    (create_router(state.clone()), state, maps, store)
}

/// Session token for a user that need not exist in the store.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, email: &str, signing_key: &[u8]) -> String {
    let user = User {
        id: user_id.to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };
    create_jwt(&user, signing_key).expect("Failed to create test JWT")
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON body (`Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register an account and return `(user_id, token)`.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "name": name,
                "email": email,
                "password": "password123",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Create a two-day flexible trip and return its JSON view.
#[allow(dead_code)]
pub async fn create_trip(app: &axum::Router, token: &str, title: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/trips",
            Some(token),
            Some(serde_json::json!({
                "title": title,
                "dates": {"kind": "flexible", "days": 2},
                "location": "New York",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create trip failed: {body}");
    body
}

/// Add an activity to a day and return its JSON.
#[allow(dead_code)]
pub async fn add_activity(
    app: &axum::Router,
    token: &str,
    trip_id: &str,
    day_id: &str,
    body: Value,
) -> Value {
    let (status, json) = send(
        app,
        request(
            "POST",
            &format!("/api/trips/{}/days/{}/activities", trip_id, day_id),
            Some(token),
            Some(body),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add activity failed: {json}");
    json
}
