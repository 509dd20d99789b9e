// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Maps client: place search/details (Places API) and per-mode route
//! estimates (Distance Matrix API).
//!
//! The two capabilities sit behind [`PlaceResolver`] and [`RouteEstimator`]
//! so tests and the transit cache can swap in fakes.

use crate::error::AppError;
use crate::models::{ModeEstimate, Place, Position, TravelMode};
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Fields requested from the details endpoint.
const DETAIL_FIELDS: &str = "place_id,name,formatted_address,geometry,types,rating,price_level,\
opening_hours,photos,website,formatted_phone_number";

const PHOTO_MAX_WIDTH: u32 = 800;

/// Resolves free text or a place id to geocoded places.
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Candidate places for a free-text query, summary fields only.
    async fn search(&self, query: &str) -> Result<Vec<Place>, AppError>;

    /// Full record for one place, `None` if the provider doesn't know it.
    async fn details(&self, place_id: &str) -> Result<Option<Place>, AppError>;

    /// Photo bytes and content type for a photo reference.
    async fn photo(&self, reference: &str) -> Result<(String, Vec<u8>), AppError>;
}

/// Distance and duration between two waypoints for one travel mode.
#[async_trait]
pub trait RouteEstimator: Send + Sync {
    /// `Ok(None)` when the provider cannot route this pair in this mode.
    async fn estimate(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Option<ModeEstimate>, AppError>;
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct PhotoRef {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    geometry: Option<Geometry>,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f32>,
    price_level: Option<u8>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    photos: Vec<PhotoRef>,
    website: Option<String>,
    formatted_phone_number: Option<String>,
}

impl From<PlaceResult> for Place {
    fn from(r: PlaceResult) -> Self {
        Place {
            place_id: r.place_id,
            name: r.name,
            address: r.formatted_address,
            position: r.geometry.map(|g| Position {
                lat: g.location.lat,
                lng: g.location.lng,
            }),
            types: r.types,
            rating: r.rating,
            price_level: r.price_level,
            opening_hours: r.opening_hours.map(|h| h.weekday_text).unwrap_or_default(),
            photo_url: r
                .photos
                .first()
                .map(|p| photo_path(&p.photo_reference)),
            website: r.website,
            phone_number: r.formatted_phone_number,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    error_message: Option<String>,
}

/// Path the API serves place photos from, so the key never reaches clients.
pub fn photo_path(reference: &str) -> String {
    format!("/api/places/photo?ref={}", urlencoding::encode(reference))
}

/// Transport failure. The request URL carries the API key, so it is dropped.
fn request_error(e: reqwest::Error) -> AppError {
    AppError::MapsApi(e.without_url().to_string())
}

fn api_error(status: &str, message: Option<String>) -> AppError {
    match message {
        Some(msg) => AppError::MapsApi(format!("{}: {}", status, msg)),
        None => AppError::MapsApi(status.to_string()),
    }
}

// ─── Response parsing ────────────────────────────────────────

/// Parse a text search response body.
pub fn parse_search(body: &str) -> Result<Vec<Place>, AppError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))?;

    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().map(Place::from).collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        other => Err(api_error(other, response.error_message)),
    }
}

/// Parse a place details response body.
pub fn parse_details(body: &str) -> Result<Option<Place>, AppError> {
    let response: DetailsResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))?;

    match response.status.as_str() {
        "OK" => Ok(response.result.map(Place::from)),
        "NOT_FOUND" | "ZERO_RESULTS" | "INVALID_REQUEST" => Ok(None),
        other => Err(api_error(other, response.error_message)),
    }
}

/// Parse a single-pair distance matrix response body.
pub fn parse_matrix(body: &str) -> Result<Option<ModeEstimate>, AppError> {
    let response: MatrixResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))?;

    if response.status != "OK" {
        return Err(api_error(&response.status, response.error_message));
    }

    let Some(element) = response
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
    else {
        return Ok(None);
    };

    // NOT_FOUND / ZERO_RESULTS: no route in this mode
    if element.status != "OK" {
        return Ok(None);
    }

    match (element.distance, element.duration) {
        (Some(distance), Some(duration)) => Ok(Some(ModeEstimate {
            distance_meters: distance.value,
            distance_text: distance.text,
            duration_seconds: duration.value,
            duration_text: duration.text,
        })),
        _ => Ok(None),
    }
}

// ─── Client ──────────────────────────────────────────────────

/// Google Maps HTTP client.
#[derive(Clone)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleMapsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another host (a local stub in tests).
    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or(AppError::MapsUnavailable)
    }

    async fn get_text(&self, path: &str, params: &[(&str, &str)]) -> Result<String, AppError> {
        let key = self.key()?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", key)])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "Maps API request failed");
            return Err(AppError::MapsApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .text()
            .await
            .map_err(request_error)
    }
}

#[async_trait]
impl PlaceResolver for GoogleMapsClient {
    async fn search(&self, query: &str) -> Result<Vec<Place>, AppError> {
        let body = self
            .get_text("place/textsearch/json", &[("query", query)])
            .await?;
        let places = parse_search(&body)?;
        tracing::debug!(count = places.len(), "Place search completed");
        Ok(places)
    }

    async fn details(&self, place_id: &str) -> Result<Option<Place>, AppError> {
        let body = self
            .get_text(
                "place/details/json",
                &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
            )
            .await?;
        parse_details(&body)
    }

    async fn photo(&self, reference: &str) -> Result<(String, Vec<u8>), AppError> {
        let key = self.key()?;
        let url = format!("{}/place/photo", self.base_url);
        let max_width = PHOTO_MAX_WIDTH.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("photo_reference", reference),
                ("maxwidth", max_width.as_str()),
                ("key", key),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::MapsApi(format!("photo fetch returned HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(request_error)?;

        Ok((content_type, bytes.to_vec()))
    }
}

#[async_trait]
impl RouteEstimator for GoogleMapsClient {
    async fn estimate(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Option<ModeEstimate>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }

        let body = self
            .get_text(
                "distancematrix/json",
                &[
                    ("origins", origin),
                    ("destinations", destination),
                    ("mode", mode.as_str()),
                ],
            )
            .await?;
        parse_matrix(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_parse_search() {
        let body = r#"{
            "status": "OK",
            "results": [{
                "place_id": "abc",
                "name": "Metropolitan Museum of Art",
                "formatted_address": "1000 5th Ave, New York, NY 10028",
                "geometry": {"location": {"lat": 40.7794, "lng": -73.9632}},
                "types": ["museum", "tourist_attraction", "point_of_interest"],
                "rating": 4.8,
                "photos": [{"photo_reference": "ref/1+2"}]
            }]
        }"#;
        let places = parse_search(body).unwrap();
        assert_eq!(places.len(), 1);
        let place = &places[0];
        assert_eq!(place.place_id, "abc");
        assert_eq!(place.position.unwrap().lat, 40.7794);
        assert_eq!(place.category(), Category::Museum);
        assert_eq!(
            place.photo_url.as_deref(),
            Some("/api/places/photo?ref=ref%2F1%2B2")
        );
        assert!(place.opening_hours.is_empty());
    }

    #[test]
    fn test_parse_search_statuses() {
        assert!(parse_search(r#"{"status":"ZERO_RESULTS","results":[]}"#)
            .unwrap()
            .is_empty());
        let err = parse_search(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::MapsApi(ref m) if m == "REQUEST_DENIED: bad key"));
        assert!(matches!(parse_search("<html>"), Err(AppError::MapsApi(_))));
    }

    #[test]
    fn test_parse_details() {
        let body = r#"{
            "status": "OK",
            "result": {
                "place_id": "p1",
                "name": "Joe's Pizza",
                "formatted_address": "7 Carmine St",
                "types": ["restaurant", "food"],
                "price_level": 1,
                "opening_hours": {"weekday_text": ["Monday: 10AM-4AM"]},
                "website": "https://joes.example",
                "formatted_phone_number": "(212) 366-1182"
            }
        }"#;
        let place = parse_details(body).unwrap().unwrap();
        assert_eq!(place.category(), Category::Restaurant);
        assert_eq!(place.opening_hours, vec!["Monday: 10AM-4AM"]);
        assert_eq!(place.phone_number.as_deref(), Some("(212) 366-1182"));
        assert_eq!(place.price_level, Some(1));
        assert!(place.position.is_none());

        assert_eq!(parse_details(r#"{"status":"NOT_FOUND"}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_matrix() {
        let body = r#"{
            "status": "OK",
            "rows": [{"elements": [{
                "status": "OK",
                "distance": {"text": "1.2 km", "value": 1234},
                "duration": {"text": "15 mins", "value": 900}
            }]}]
        }"#;
        let estimate = parse_matrix(body).unwrap().unwrap();
        assert_eq!(estimate.distance_meters, 1234);
        assert_eq!(estimate.duration_text, "15 mins");

        let no_route = r#"{"status":"OK","rows":[{"elements":[{"status":"ZERO_RESULTS"}]}]}"#;
        assert_eq!(parse_matrix(no_route).unwrap(), None);

        let denied = r#"{"status":"OVER_QUERY_LIMIT","rows":[]}"#;
        assert!(matches!(parse_matrix(denied), Err(AppError::MapsApi(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = GoogleMapsClient::new(None);
        assert!(!client.is_configured());
        assert!(matches!(
            client.search("pizza").await,
            Err(AppError::MapsUnavailable)
        ));
        let estimate = client
            .estimate("a", "b", TravelMode::Walking)
            .await
            .unwrap();
        assert!(estimate.is_none());
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_leak_key() {
        use axum::response::IntoResponse;
        use http_body_util::BodyExt;

        // Nothing listens on the discard port.
        let client =
            GoogleMapsClient::with_base_url(Some("SECRETKEY123".to_string()), "http://127.0.0.1:9");

        let err = client.search("pizza").await.unwrap_err();
        assert!(matches!(err, AppError::MapsApi(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));

        let body = err.into_response().into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("maps_error"));
        assert!(!body.contains("SECRETKEY123"), "{body}");

        let err = client.photo("ref").await.unwrap_err();
        assert!(!err.to_string().contains("SECRETKEY123"));
        let err = client
            .estimate("a", "b", TravelMode::Driving)
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("SECRETKEY123"));
    }
}
