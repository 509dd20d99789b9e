// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip aggregate service.
//!
//! Owns the rules around trips, their days and each day's ordered
//! activities. Every operation returns a fresh snapshot built from the store
//! rather than mutating shared state, and storage faults reach callers only as
//! the operation-named failure (the cause is logged here).

use crate::db::TripStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::activity::sort_for_display;
use crate::models::trip::MAX_TRIP_DAYS;
use crate::models::{
    normalize_email, Activity, Category, Collaborator, Day, Place, Position, Trip, TripDates,
    PLACEHOLDER_IMAGE,
};
use crate::services::access::{access_for, Access};
use crate::services::changes::{ChangeKind, ChangeNotifier};
use crate::time_utils::{format_day_label, format_utc_rfc3339};
use chrono::Days;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub const ACTIVITY_MODIFY_DENIED: &str =
    "Activity not found or you don't have permission to modify it";

const DEFAULT_COLLABORATOR_COLOR: &str = "bg-gray-500";

// ─── Inputs ──────────────────────────────────────────────────

/// Day skeleton supplied at trip creation. Order in the list is the day order.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DaySkeleton {
    #[serde(default)]
    #[validate(length(max = 100))]
    pub date: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,
}

/// Collaborator descriptor: matched by id, then by email, else created.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CollaboratorInput {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

fn default_color() -> String {
    DEFAULT_COLLABORATOR_COLOR.to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTrip {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub dates: TripDates,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub location: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub days: Vec<DaySkeleton>,
    #[serde(default)]
    #[validate(nested)]
    pub collaborators: Vec<CollaboratorInput>,
}

/// Partial trip update. Days and collaborators cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TripPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub dates: Option<TripDates>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// An empty string clears the image.
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewActivity {
    #[serde(default)]
    #[validate(length(max = 50))]
    pub time: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub location: String,
    /// Display name of a category; ignored when `place_types` is non-empty
    #[serde(default)]
    pub category: Option<String>,
    /// Provider type tags of the place this activity came from
    #[serde(default)]
    pub place_types: Vec<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Resolve this place and fill the activity from it
    #[serde(default)]
    pub place_id: Option<String>,
}

impl NewActivity {
    /// Fill place-derived fields from a resolved place. A title the client
    /// already chose is kept.
    pub fn fill_from_place(&mut self, place: &Place) {
        if self.title.trim().is_empty() {
            self.title = place.name.clone();
        }
        self.location = place.address.clone();
        self.position = place.position;
        self.place_types = place.types.clone();
        if self.website.is_none() {
            self.website = place.website.clone();
        }
        if self.phone_number.is_none() {
            self.phone_number = place.phone_number.clone();
        }
        if self.image.is_none() {
            self.image = place.photo_url.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActivityPatch {
    #[validate(length(max = 50))]
    pub time: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub category: Option<String>,
    pub place_types: Option<Vec<String>>,
    pub position: Option<Position>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub image: Option<String>,
}

// ─── Views ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub id: String,
    pub number: u32,
    pub date: String,
    pub title: String,
    /// In display order
    pub activities: Vec<Activity>,
}

/// Trip snapshot as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    pub id: String,
    pub title: String,
    pub dates: TripDates,
    pub location: String,
    pub image: String,
    /// True when the viewer is not the owner
    pub is_collaborative: bool,
    /// Present for collaborative trips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSummary>,
    pub collaborators: Vec<Collaborator>,
    pub days: Vec<DayView>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReorderOutcome {
    pub ordered_ids: Vec<String>,
    /// False when the requested order was already in place
    pub changed: bool,
}

// ─── Helpers ─────────────────────────────────────────────────

/// Build the day records for a new trip.
///
/// Skeletons, when given, fix the number of days and their labels; missing
/// labels and titles are generated. Without skeletons the dates decide.
pub fn build_days(
    trip_id: &str,
    dates: &TripDates,
    day_count: u32,
    skeletons: &[DaySkeleton],
) -> Vec<Day> {
    let count = if skeletons.is_empty() {
        day_count
    } else {
        skeletons.len() as u32
    };

    (1..=count)
        .map(|number| {
            let skeleton = skeletons.get(number as usize - 1);
            let date = skeleton
                .map(|s| s.date.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| generated_label(dates, number));
            let title = skeleton
                .map(|s| s.title.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Day {}", number));

            Day {
                id: Day::id_for(number),
                trip_id: trip_id.to_string(),
                number,
                date,
                title,
            }
        })
        .collect()
}

fn generated_label(dates: &TripDates, number: u32) -> String {
    match dates {
        TripDates::Fixed { start_date, .. } => start_date
            .checked_add_days(Days::new(u64::from(number - 1)))
            .map(format_day_label)
            .unwrap_or_else(|| format!("Day {}", number)),
        TripDates::Flexible { .. } => format!("Day {}", number),
    }
}

/// Category for an activity: place tags win over a client-chosen name.
pub fn resolve_category(place_types: &[String], category: Option<&str>) -> Category {
    if place_types.is_empty() {
        category.map(Category::from_display).unwrap_or_default()
    } else {
        Category::from_place_types(place_types)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_permutation(current: &[&str], requested: &[String]) -> bool {
    if current.len() != requested.len() {
        return false;
    }
    let mut a: Vec<&str> = current.to_vec();
    let mut b: Vec<&str> = requested.iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

// ─── Service ─────────────────────────────────────────────────

/// Trip aggregate service.
#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn TripStore>,
    changes: ChangeNotifier,
}

impl TripService {
    pub fn new(store: Arc<dyn TripStore>, changes: ChangeNotifier) -> Self {
        Self { store, changes }
    }

    /// Load a trip with its collaborators and the viewer's access to it.
    async fn load_with_access(
        &self,
        trip_id: &str,
        viewer: &AuthUser,
    ) -> Result<Option<(Trip, Vec<Collaborator>, Access)>> {
        let Some(trip) = self.store.get_trip(trip_id).await? else {
            return Ok(None);
        };
        let collaborators = self.store.collaborators_for_trip(trip_id).await?;
        let access = access_for(&trip, &collaborators, viewer);
        Ok(Some((trip, collaborators, access)))
    }

    /// Trip the viewer may read, or `NotFound`.
    async fn readable(
        &self,
        trip_id: &str,
        viewer: Option<&AuthUser>,
    ) -> Result<(Trip, Vec<Collaborator>, Access)> {
        let not_found = || AppError::NotFound("Trip not found".to_string());
        let viewer = viewer.ok_or_else(not_found)?;
        match self.load_with_access(trip_id, viewer).await? {
            Some(loaded) if loaded.2.can_read() => Ok(loaded),
            _ => Err(not_found()),
        }
    }

    /// Trip whose itinerary the viewer may edit.
    async fn editable_itinerary(
        &self,
        trip_id: &str,
        viewer: &AuthUser,
        denied: &'static str,
    ) -> Result<Trip> {
        match self.load_with_access(trip_id, viewer).await? {
            Some((trip, _, access)) if access.can_edit_itinerary() => Ok(trip),
            _ => Err(AppError::NotFoundOrForbidden(denied.to_string())),
        }
    }

    /// Trip the viewer owns.
    async fn owned(
        &self,
        trip_id: &str,
        viewer: &AuthUser,
        denied: &'static str,
    ) -> Result<(Trip, Vec<Collaborator>)> {
        match self.load_with_access(trip_id, viewer).await? {
            Some((trip, collaborators, access)) if access.can_manage_trip() => {
                Ok((trip, collaborators))
            }
            _ => Err(AppError::NotFoundOrForbidden(denied.to_string())),
        }
    }

    async fn assemble(
        &self,
        trip: Trip,
        collaborators: Vec<Collaborator>,
        access: Access,
    ) -> Result<TripView> {
        let days = self.store.days_for_trip(&trip.id).await?;
        let mut activities = self.store.activities_for_trip(&trip.id).await?;
        sort_for_display(&mut activities);

        let owner = if access == Access::Collaborator {
            let name = self
                .store
                .get_user(&trip.owner_id)
                .await?
                .map(|u| u.name)
                .unwrap_or_else(|| "Unknown".to_string());
            Some(OwnerSummary {
                id: trip.owner_id.clone(),
                name,
            })
        } else {
            None
        };

        let days = days
            .into_iter()
            .map(|day| DayView {
                activities: activities
                    .iter()
                    .filter(|a| a.day_id == day.id)
                    .cloned()
                    .collect(),
                id: day.id,
                number: day.number,
                date: day.date,
                title: day.title,
            })
            .collect();

        Ok(TripView {
            id: trip.id,
            title: trip.title,
            dates: trip.dates,
            location: trip.location,
            image: trip
                .image
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            is_collaborative: access == Access::Collaborator,
            owner,
            collaborators,
            days,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        })
    }

    async fn resolve_collaborator(&self, input: &CollaboratorInput) -> Result<Collaborator> {
        let id = non_empty(input.id.clone());
        let email = input
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty());

        if let Some(id) = &id {
            if let Some(existing) = self.store.get_collaborator(id).await? {
                return Ok(existing);
            }
        }
        if let Some(email) = &email {
            if let Some(existing) = self.store.find_collaborator_by_email(email).await? {
                return Ok(existing);
            }
        }

        let collaborator = Collaborator {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: input.name.trim().to_string(),
            color: non_empty(Some(input.color.clone())).unwrap_or_else(default_color),
            email,
        };
        self.store.insert_collaborator(&collaborator).await?;
        tracing::debug!(collaborator_id = %collaborator.id, "Collaborator created");
        Ok(collaborator)
    }

    // ─── Trips ───────────────────────────────────────────────────

    /// Trips the viewer owns or collaborates on, newest first. Anonymous
    /// viewers get an empty list.
    pub async fn list_trips(&self, viewer: Option<&AuthUser>) -> Result<Vec<TripView>> {
        let Some(viewer) = viewer else {
            return Ok(Vec::new());
        };

        async {
            let mut trips = self.store.trips_owned_by(&viewer.user_id).await?;

            let email = normalize_email(&viewer.email);
            if !email.is_empty() {
                for shared in self.store.trips_shared_with(&email).await? {
                    if !trips.iter().any(|t| t.id == shared.id) {
                        trips.push(shared);
                    }
                }
            }
            trips.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });

            let mut views = Vec::with_capacity(trips.len());
            for trip in trips {
                let collaborators = self.store.collaborators_for_trip(&trip.id).await?;
                let access = access_for(&trip, &collaborators, viewer);
                if access.can_read() {
                    views.push(self.assemble(trip, collaborators, access).await?);
                }
            }

            tracing::debug!(user_id = %viewer.user_id, count = views.len(), "Trips listed");
            Ok::<_, AppError>(views)
        }
        .await
        .map_err(AppError::during("Failed to fetch trips"))
    }

    /// One trip, if the viewer may read it. Missing and forbidden trips are
    /// both `NotFound`.
    pub async fn get_trip(&self, viewer: Option<&AuthUser>, trip_id: &str) -> Result<TripView> {
        async {
            let (trip, collaborators, access) = self.readable(trip_id, viewer).await?;
            self.assemble(trip, collaborators, access).await
        }
        .await
        .map_err(AppError::during("Failed to fetch trip"))
    }

    /// Check read access without building the full view.
    pub async fn authorize_read(&self, viewer: Option<&AuthUser>, trip_id: &str) -> Result<()> {
        self.readable(trip_id, viewer)
            .await
            .map(|_| ())
            .map_err(AppError::during("Failed to fetch trip"))
    }

    pub async fn create_trip(&self, viewer: Option<&AuthUser>, input: NewTrip) -> Result<TripView> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;
        input.validate()?;
        let day_count = input.dates.validate().map_err(AppError::BadRequest)?;
        if input.days.len() > MAX_TRIP_DAYS as usize {
            return Err(AppError::BadRequest(format!(
                "a trip can span at most {} days",
                MAX_TRIP_DAYS
            )));
        }

        async {
            // Resolve collaborators first so a failure leaves no half-built trip.
            let mut collaborators: Vec<Collaborator> = Vec::new();
            for descriptor in &input.collaborators {
                let collaborator = self.resolve_collaborator(descriptor).await?;
                if !collaborators.iter().any(|c| c.id == collaborator.id) {
                    collaborators.push(collaborator);
                }
            }

            let now = format_utc_rfc3339(chrono::Utc::now());
            let trip = Trip {
                id: uuid::Uuid::new_v4().to_string(),
                title: input.title.trim().to_string(),
                dates: input.dates,
                location: input.location.trim().to_string(),
                image: non_empty(input.image.clone()),
                owner_id: viewer.user_id.clone(),
                created_at: now.clone(),
                updated_at: now,
            };
            let days = build_days(&trip.id, &trip.dates, day_count, &input.days);

            self.store.insert_trip(&trip, &days).await?;
            for collaborator in &collaborators {
                self.store
                    .attach_collaborator(&trip.id, &collaborator.id)
                    .await?;
            }

            tracing::info!(
                trip_id = %trip.id,
                user_id = %viewer.user_id,
                days = days.len(),
                collaborators = collaborators.len(),
                "Trip created"
            );
            self.changes.publish(&trip.id, ChangeKind::TripCreated);

            self.assemble(trip, collaborators, Access::Owner).await
        }
        .await
        .map_err(AppError::during("Failed to create trip"))
    }

    /// Update title, dates, location or image. Owner only.
    pub async fn update_trip(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        patch: TripPatch,
    ) -> Result<TripView> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;
        patch.validate()?;
        if let Some(dates) = &patch.dates {
            dates.validate().map_err(AppError::BadRequest)?;
        }

        async {
            let (mut trip, collaborators) = self
                .owned(trip_id, viewer, AppError::TRIP_MODIFY_DENIED)
                .await?;

            if let Some(title) = patch.title {
                trip.title = title.trim().to_string();
            }
            if let Some(dates) = patch.dates {
                trip.dates = dates;
            }
            if let Some(location) = patch.location {
                trip.location = location.trim().to_string();
            }
            if let Some(image) = patch.image {
                trip.image = non_empty(Some(image));
            }
            trip.updated_at = format_utc_rfc3339(chrono::Utc::now());

            self.store.update_trip(&trip).await?;
            tracing::info!(trip_id, "Trip updated");
            self.changes.publish(trip_id, ChangeKind::TripUpdated);

            self.assemble(trip, collaborators, Access::Owner).await
        }
        .await
        .map_err(AppError::during("Failed to update trip"))
    }

    /// Delete a trip with its days and activities. Owner only.
    pub async fn delete_trip(&self, viewer: Option<&AuthUser>, trip_id: &str) -> Result<()> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;

        async {
            self.owned(trip_id, viewer, AppError::TRIP_DELETE_DENIED)
                .await?;
            self.store.delete_trip(trip_id).await?;

            tracing::info!(trip_id, user_id = %viewer.user_id, "Trip deleted");
            self.changes.publish(trip_id, ChangeKind::TripDeleted);
            Ok::<_, AppError>(())
        }
        .await
        .map_err(AppError::during("Failed to delete trip"))
    }

    /// Invite someone by email: the collaborator row is found or created and
    /// attached, which grants read access to that email. Owner only.
    pub async fn share_trip(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        input: CollaboratorInput,
    ) -> Result<Collaborator> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;
        input.validate()?;
        let has_email = input
            .email
            .as_deref()
            .map(normalize_email)
            .is_some_and(|e| !e.is_empty());
        if !has_email {
            return Err(AppError::BadRequest(
                "an email is required to share a trip".to_string(),
            ));
        }

        async {
            self.owned(trip_id, viewer, AppError::TRIP_MODIFY_DENIED)
                .await?;
            let collaborator = self.resolve_collaborator(&input).await?;
            self.store
                .attach_collaborator(trip_id, &collaborator.id)
                .await?;

            tracing::info!(trip_id, collaborator_id = %collaborator.id, "Trip shared");
            self.changes.publish(trip_id, ChangeKind::CollaboratorAdded);
            Ok::<_, AppError>(collaborator)
        }
        .await
        .map_err(AppError::during("Failed to share trip"))
    }

    // ─── Activities ──────────────────────────────────────────────

    /// Activities of one day in display order.
    pub async fn day_activities(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        day_id: &str,
    ) -> Result<Vec<Activity>> {
        async {
            self.readable(trip_id, viewer).await?;
            let days = self.store.days_for_trip(trip_id).await?;
            if !days.iter().any(|d| d.id == day_id) {
                return Err(AppError::NotFound(format!("Day {} not found", day_id)));
            }

            let mut activities: Vec<Activity> = self
                .store
                .activities_for_trip(trip_id)
                .await?
                .into_iter()
                .filter(|a| a.day_id == day_id)
                .collect();
            sort_for_display(&mut activities);
            Ok::<_, AppError>(activities)
        }
        .await
        .map_err(AppError::during("Failed to fetch activities"))
    }

    /// Append an activity to a day.
    pub async fn add_activity(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        day_id: &str,
        input: NewActivity,
    ) -> Result<Activity> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;
        input.validate()?;

        async {
            self.editable_itinerary(trip_id, viewer, AppError::TRIP_MODIFY_DENIED)
                .await?;

            let days = self.store.days_for_trip(trip_id).await?;
            if !days.iter().any(|d| d.id == day_id) {
                return Err(AppError::NotFound(format!("Day {} not found", day_id)));
            }

            let next_rank = self
                .store
                .activities_for_trip(trip_id)
                .await?
                .iter()
                .filter(|a| a.day_id == day_id)
                .map(|a| a.rank + 1)
                .max()
                .unwrap_or(0);

            let activity = Activity {
                id: uuid::Uuid::new_v4().to_string(),
                trip_id: trip_id.to_string(),
                day_id: day_id.to_string(),
                rank: next_rank,
                time: input.time.trim().to_string(),
                title: input.title.trim().to_string(),
                description: input.description,
                location: input.location.trim().to_string(),
                category: resolve_category(&input.place_types, input.category.as_deref()),
                position: input.position,
                website: non_empty(input.website),
                phone_number: non_empty(input.phone_number),
                image: non_empty(input.image),
                created_at: format_utc_rfc3339(chrono::Utc::now()),
            };
            self.store.insert_activity(&activity).await?;

            tracing::info!(
                trip_id,
                day_id,
                activity_id = %activity.id,
                category = %activity.category,
                "Activity added"
            );
            self.changes.publish(trip_id, ChangeKind::ActivityAdded);
            Ok(activity)
        }
        .await
        .map_err(AppError::during("Failed to create activity"))
    }

    /// Load an activity the viewer may edit.
    async fn editable_activity(&self, viewer: &AuthUser, activity_id: &str) -> Result<Activity> {
        let activity = self
            .store
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| AppError::NotFoundOrForbidden(ACTIVITY_MODIFY_DENIED.to_string()))?;
        self.editable_itinerary(&activity.trip_id, viewer, ACTIVITY_MODIFY_DENIED)
            .await?;
        Ok(activity)
    }

    pub async fn update_activity(
        &self,
        viewer: Option<&AuthUser>,
        activity_id: &str,
        patch: ActivityPatch,
    ) -> Result<Activity> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;
        patch.validate()?;

        async {
            let mut activity = self.editable_activity(viewer, activity_id).await?;

            if let Some(time) = patch.time {
                activity.time = time.trim().to_string();
            }
            if let Some(title) = patch.title {
                activity.title = title.trim().to_string();
            }
            if let Some(description) = patch.description {
                activity.description = description;
            }
            if let Some(location) = patch.location {
                activity.location = location.trim().to_string();
            }
            match (&patch.place_types, &patch.category) {
                (Some(types), _) if !types.is_empty() => {
                    activity.category = Category::from_place_types(types);
                }
                (_, Some(category)) => activity.category = Category::from_display(category),
                _ => {}
            }
            if let Some(position) = patch.position {
                activity.position = Some(position);
            }
            if let Some(website) = patch.website {
                activity.website = non_empty(Some(website));
            }
            if let Some(phone_number) = patch.phone_number {
                activity.phone_number = non_empty(Some(phone_number));
            }
            if let Some(image) = patch.image {
                activity.image = non_empty(Some(image));
            }

            self.store.update_activity(&activity).await?;
            tracing::info!(activity_id, trip_id = %activity.trip_id, "Activity updated");
            self.changes
                .publish(&activity.trip_id, ChangeKind::ActivityUpdated);
            Ok::<_, AppError>(activity)
        }
        .await
        .map_err(AppError::during("Failed to update activity"))
    }

    pub async fn delete_activity(&self, viewer: Option<&AuthUser>, activity_id: &str) -> Result<()> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;

        async {
            let activity = self.editable_activity(viewer, activity_id).await?;
            self.store.delete_activity(activity_id).await?;

            tracing::info!(activity_id, trip_id = %activity.trip_id, "Activity deleted");
            self.changes
                .publish(&activity.trip_id, ChangeKind::ActivityDeleted);
            Ok::<_, AppError>(())
        }
        .await
        .map_err(AppError::during("Failed to delete activity"))
    }

    /// Persist a new order for a day's activities.
    ///
    /// `ordered_ids` must list exactly the day's activities. Asking for the
    /// order already in place writes nothing and signals nothing.
    pub async fn reorder_activities(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        day_id: &str,
        ordered_ids: Vec<String>,
    ) -> Result<ReorderOutcome> {
        let viewer = viewer.ok_or(AppError::Unauthorized)?;

        async {
            self.editable_itinerary(trip_id, viewer, AppError::TRIP_MODIFY_DENIED)
                .await?;

            let days = self.store.days_for_trip(trip_id).await?;
            if !days.iter().any(|d| d.id == day_id) {
                return Err(AppError::NotFound(format!("Day {} not found", day_id)));
            }

            let mut current: Vec<Activity> = self
                .store
                .activities_for_trip(trip_id)
                .await?
                .into_iter()
                .filter(|a| a.day_id == day_id)
                .collect();
            sort_for_display(&mut current);
            let current_ids: Vec<&str> = current.iter().map(|a| a.id.as_str()).collect();

            if !is_permutation(&current_ids, &ordered_ids) {
                return Err(AppError::BadRequest(
                    "activity ids must list exactly the activities of the day".to_string(),
                ));
            }

            if current_ids.iter().copied().eq(ordered_ids.iter().map(String::as_str)) {
                tracing::debug!(trip_id, day_id, "Reorder is a no-op");
                return Ok(ReorderOutcome {
                    ordered_ids,
                    changed: false,
                });
            }

            let ranks: Vec<(String, u32)> = ordered_ids
                .iter()
                .enumerate()
                .map(|(rank, id)| (id.clone(), rank as u32))
                .collect();
            self.store
                .set_activity_ranks(trip_id, day_id, &ranks)
                .await?;

            tracing::info!(trip_id, day_id, count = ranks.len(), "Activities reordered");
            self.changes
                .publish(trip_id, ChangeKind::ActivitiesReordered);
            Ok(ReorderOutcome {
                ordered_ids,
                changed: true,
            })
        }
        .await
        .map_err(AppError::during("Failed to reorder activities"))
    }

    /// Two activities of a trip the viewer may read, for transit lookups.
    pub async fn activity_pair(
        &self,
        viewer: Option<&AuthUser>,
        trip_id: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(Activity, Activity)> {
        async {
            self.readable(trip_id, viewer).await?;

            let mut pair = Vec::with_capacity(2);
            for id in [from_id, to_id] {
                let activity = self
                    .store
                    .get_activity(id)
                    .await?
                    .filter(|a| a.trip_id == trip_id)
                    .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;
                pair.push(activity);
            }
            let to = pair.pop();
            let from = pair.pop();
            match (from, to) {
                (Some(from), Some(to)) => Ok((from, to)),
                _ => Err(AppError::NotFound("Activity not found".to_string())),
            }
        }
        .await
        .map_err(AppError::during("Failed to fetch activities"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::NaiveDate;

    fn viewer() -> AuthUser {
        AuthUser {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            name: "User One".to_string(),
        }
    }

    fn new_trip(title: &str) -> NewTrip {
        NewTrip {
            title: title.to_string(),
            dates: TripDates::Flexible { days: 2 },
            location: "Lisbon".to_string(),
            image: None,
            days: Vec::new(),
            collaborators: Vec::new(),
        }
    }

    #[test]
    fn test_build_days_from_fixed_dates() {
        let dates = TripDates::Fixed {
            start_date: NaiveDate::from_ymd_opt(2023, 4, 29).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(),
        };
        let days = build_days("t1", &dates, 4, &[]);
        let ids: Vec<&str> = days.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["day1", "day2", "day3", "day4"]);
        assert_eq!(days[0].date, "April 29, 2023");
        assert_eq!(days[2].date, "May 1, 2023");
        assert_eq!(days[3].title, "Day 4");
        assert!(days.iter().all(|d| d.trip_id == "t1"));
    }

    #[test]
    fn test_build_days_from_skeletons() {
        let skeletons = vec![
            DaySkeleton {
                date: "May 1".to_string(),
                title: "Arrival".to_string(),
            },
            DaySkeleton::default(),
        ];
        let days = build_days("t1", &TripDates::Flexible { days: 5 }, 5, &skeletons);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].title, "Arrival");
        assert_eq!(days[0].date, "May 1");
        assert_eq!(days[1].date, "Day 2");
        assert_eq!(days[1].number, 2);
    }

    #[test]
    fn test_resolve_category() {
        let tags = vec!["restaurant".to_string(), "food".to_string()];
        assert_eq!(resolve_category(&tags, Some("Hotel")), Category::Restaurant);
        assert_eq!(resolve_category(&[], Some("Hotel")), Category::Hotel);
        assert_eq!(resolve_category(&[], Some("Culture")), Category::ThingsToDo);
        assert_eq!(resolve_category(&[], None), Category::ThingsToDo);
    }

    #[test]
    fn test_is_permutation() {
        let current = ["a", "b", "c"];
        let ids = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(is_permutation(&current, &ids(&["c", "a", "b"])));
        assert!(!is_permutation(&current, &ids(&["a", "b"])));
        assert!(!is_permutation(&current, &ids(&["a", "a", "b"])));
        assert!(!is_permutation(&current, &ids(&["a", "b", "x"])));
    }

    #[test]
    fn test_fill_from_place() {
        let place = Place {
            place_id: "p1".to_string(),
            name: "Joe's Pizza".to_string(),
            address: "7 Carmine St, New York".to_string(),
            types: vec!["restaurant".to_string(), "food".to_string()],
            website: Some("https://joespizza.example".to_string()),
            ..Place::default()
        };
        let mut input = NewActivity {
            time: "12:30 PM".to_string(),
            ..NewActivity::default()
        };
        input.fill_from_place(&place);

        assert_eq!(input.title, "Joe's Pizza");
        assert_eq!(input.location, "7 Carmine St, New York");
        assert_eq!(input.time, "12:30 PM");
        assert_eq!(
            resolve_category(&input.place_types, input.category.as_deref()),
            Category::Restaurant
        );
    }

    #[tokio::test]
    async fn test_storage_faults_name_the_operation() {
        let store = Arc::new(MemoryStore::new());
        let trips = TripService::new(store.clone(), ChangeNotifier::new());
        let viewer = viewer();
        let trip = trips
            .create_trip(Some(&viewer), new_trip("Lisbon"))
            .await
            .unwrap();

        store.set_offline(true);
        let mut rx = trips.changes.subscribe();

        let err = trips.list_trips(Some(&viewer)).await.unwrap_err();
        assert!(matches!(err, AppError::OperationFailed("Failed to fetch trips")));

        let err = trips
            .create_trip(Some(&viewer), new_trip("Porto"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OperationFailed("Failed to create trip")));

        let err = trips.get_trip(Some(&viewer), &trip.id).await.unwrap_err();
        assert!(matches!(err, AppError::OperationFailed("Failed to fetch trip")));

        let err = trips.delete_trip(Some(&viewer), &trip.id).await.unwrap_err();
        assert!(matches!(err, AppError::OperationFailed("Failed to delete trip")));

        // Failed mutations publish nothing.
        assert!(rx.try_recv().is_err());

        // Validation still comes first.
        let err = trips
            .create_trip(Some(&viewer), new_trip(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
