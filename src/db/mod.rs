// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer.
//!
//! [`TripStore`] is the port the trip service talks to. Two adapters exist:
//! Firestore for deployments and an in-process store for local development
//! and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Activity, Collaborator, Day, Trip, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COLLABORATORS: &str = "collaborators";
    pub const TRIPS: &str = "trips";
    /// Keyed by `{trip_id}_{day_id}`
    pub const DAYS: &str = "days";
    pub const ACTIVITIES: &str = "activities";
    /// Trip ↔ collaborator join, keyed by `{trip_id}_{collaborator_id}`
    pub const TRIP_COLLABORATORS: &str = "trip_collaborators";
}

/// Storage port for the trip aggregate and its surroundings.
///
/// Adapter faults are reported as [`AppError::Database`]; callers decide how
/// much of that reaches the client.
#[async_trait]
pub trait TripStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user. Fails with [`AppError::Conflict`] if the email is
    /// already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    // ─── Collaborators ───────────────────────────────────────────

    async fn get_collaborator(&self, id: &str) -> Result<Option<Collaborator>, AppError>;

    async fn find_collaborator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Collaborator>, AppError>;

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<(), AppError>;

    /// Link a collaborator to a trip. Linking twice is a no-op.
    async fn attach_collaborator(
        &self,
        trip_id: &str,
        collaborator_id: &str,
    ) -> Result<(), AppError>;

    async fn collaborators_for_trip(&self, trip_id: &str)
        -> Result<Vec<Collaborator>, AppError>;

    // ─── Trips ───────────────────────────────────────────────────

    /// Insert a trip together with its days.
    async fn insert_trip(&self, trip: &Trip, days: &[Day]) -> Result<(), AppError>;

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError>;

    async fn trips_owned_by(&self, user_id: &str) -> Result<Vec<Trip>, AppError>;

    /// Trips with a collaborator whose email equals `email`.
    async fn trips_shared_with(&self, email: &str) -> Result<Vec<Trip>, AppError>;

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError>;

    /// Delete a trip with its days, activities and collaborator links.
    /// Collaborator rows themselves are kept.
    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError>;

    /// Days of a trip ordered by number.
    async fn days_for_trip(&self, trip_id: &str) -> Result<Vec<Day>, AppError>;

    // ─── Activities ──────────────────────────────────────────────

    async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError>;

    /// All activities of a trip, in no particular order.
    async fn activities_for_trip(&self, trip_id: &str) -> Result<Vec<Activity>, AppError>;

    async fn insert_activity(&self, activity: &Activity) -> Result<(), AppError>;

    async fn update_activity(&self, activity: &Activity) -> Result<(), AppError>;

    async fn delete_activity(&self, activity_id: &str) -> Result<(), AppError>;

    /// Write new ranks for activities of one day. Either every rank is
    /// written or none is.
    async fn set_activity_ranks(
        &self,
        trip_id: &str,
        day_id: &str,
        ranks: &[(String, u32)],
    ) -> Result<(), AppError>;
}
