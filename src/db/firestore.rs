// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore adapter for [`TripStore`].
//!
//! Collections:
//! - `users`, `collaborators`, `trips`, `activities` (keyed by ID)
//! - `days` (keyed by `{trip_id}_{day_id}`)
//! - `trip_collaborators` (join, keyed by `{trip_id}_{collaborator_id}`)

use super::{collections, TripStore};
use crate::error::AppError;
use crate::models::{Activity, Collaborator, Day, Trip, TripCollaborator, User};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// One write queued into a transaction.
enum Write<'a, T: Serialize + Send + Sync> {
    Upsert {
        collection: &'static str,
        doc_id: String,
        object: &'a T,
    },
    Delete {
        collection: &'static str,
        doc_id: String,
    },
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection; skip the
        // credential lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Upsert one document.
    async fn put<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply writes in transactions of at most [`BATCH_SIZE`] operations.
    async fn commit_writes<T>(&self, writes: &[Write<'_, T>]) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
    {
        let client = self.get_client()?;

        for chunk in writes.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for write in chunk {
                match write {
                    Write::Upsert {
                        collection,
                        doc_id,
                        object,
                    } => {
                        client
                            .fluent()
                            .update()
                            .in_col(collection)
                            .document_id(doc_id)
                            .object(*object)
                            .add_to_transaction(&mut transaction)
                            .map_err(|e| {
                                AppError::Database(format!(
                                    "Failed to add write to transaction for {}: {}",
                                    collection, e
                                ))
                            })?;
                    }
                    Write::Delete { collection, doc_id } => {
                        client
                            .fluent()
                            .delete()
                            .from(collection)
                            .document_id(doc_id)
                            .add_to_transaction(&mut transaction)
                            .map_err(|e| {
                                AppError::Database(format!(
                                    "Failed to add deletion to transaction for {}: {}",
                                    collection, e
                                ))
                            })?;
                    }
                }
            }

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        }

        Ok(())
    }

    async fn links_for_trip(&self, trip_id: &str) -> Result<Vec<TripCollaborator>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIP_COLLABORATORS)
            .filter(|q| q.for_all([q.field("trip_id").eq(trip_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl TripStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        // Check-then-write; two registrations racing on one email can both pass.
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        self.put(collections::USERS, &user.id, user).await
    }

    // ─── Collaborator Operations ─────────────────────────────────

    async fn get_collaborator(&self, id: &str) -> Result<Option<Collaborator>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COLLABORATORS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_collaborator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Collaborator>, AppError> {
        let found: Vec<Collaborator> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COLLABORATORS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<(), AppError> {
        self.put(collections::COLLABORATORS, &collaborator.id, collaborator)
            .await
    }

    async fn attach_collaborator(
        &self,
        trip_id: &str,
        collaborator_id: &str,
    ) -> Result<(), AppError> {
        let link = TripCollaborator {
            trip_id: trip_id.to_string(),
            collaborator_id: collaborator_id.to_string(),
        };
        // Deterministic doc ID makes the upsert idempotent.
        self.put(collections::TRIP_COLLABORATORS, &link.doc_id(), &link)
            .await
    }

    async fn collaborators_for_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<Collaborator>, AppError> {
        let links = self.links_for_trip(trip_id).await?;

        let found = stream::iter(links)
            .map(|link| async move { self.get_collaborator(&link.collaborator_id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Collaborator>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    // ─── Trip Operations ─────────────────────────────────────────

    async fn insert_trip(&self, trip: &Trip, days: &[Day]) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .document_id(&trip.id)
            .object(trip)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add trip to transaction: {}", e)))?;

        for day in days {
            client
                .fluent()
                .update()
                .in_col(collections::DAYS)
                .document_id(Day::doc_id(&trip.id, &day.id))
                .object(day)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add day to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(trip_id = %trip.id, days = days.len(), "Trip stored");
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(trip_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn trips_owned_by(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(|q| q.for_all([q.field("owner_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn trips_shared_with(&self, email: &str) -> Result<Vec<Trip>, AppError> {
        let client = self.get_client()?;

        let collaborators: Vec<Collaborator> = client
            .fluent()
            .select()
            .from(collections::COLLABORATORS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut trip_ids: Vec<String> = Vec::new();
        for collaborator in &collaborators {
            let links: Vec<TripCollaborator> = client
                .fluent()
                .select()
                .from(collections::TRIP_COLLABORATORS)
                .filter(|q| q.for_all([q.field("collaborator_id").eq(collaborator.id.as_str())]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            trip_ids.extend(links.into_iter().map(|l| l.trip_id));
        }
        trip_ids.sort_unstable();
        trip_ids.dedup();

        let trips = stream::iter(trip_ids)
            .map(|id| async move { self.get_trip(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Trip>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(trips.into_iter().flatten().collect())
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.put(collections::TRIPS, &trip.id, trip).await
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        let days = self.days_for_trip(trip_id).await?;
        let activities = self.activities_for_trip(trip_id).await?;
        let links = self.links_for_trip(trip_id).await?;

        let mut writes: Vec<Write<'_, Trip>> = Vec::new();
        writes.extend(activities.iter().map(|a| Write::Delete {
            collection: collections::ACTIVITIES,
            doc_id: a.id.clone(),
        }));
        writes.extend(days.iter().map(|d| Write::Delete {
            collection: collections::DAYS,
            doc_id: Day::doc_id(trip_id, &d.id),
        }));
        writes.extend(links.iter().map(|l| Write::Delete {
            collection: collections::TRIP_COLLABORATORS,
            doc_id: l.doc_id(),
        }));
        // Trip document goes last so a partial failure leaves it reachable
        // for a retried delete.
        writes.push(Write::Delete {
            collection: collections::TRIPS,
            doc_id: trip_id.to_string(),
        });

        self.commit_writes(&writes).await?;

        tracing::info!(
            trip_id,
            days = days.len(),
            activities = activities.len(),
            collaborators = links.len(),
            "Trip deleted"
        );
        Ok(())
    }

    async fn days_for_trip(&self, trip_id: &str) -> Result<Vec<Day>, AppError> {
        let mut days: Vec<Day> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::DAYS)
            .filter(|q| q.for_all([q.field("trip_id").eq(trip_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        days.sort_by_key(|d| d.number);
        Ok(days)
    }

    // ─── Activity Operations ─────────────────────────────────────

    async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn activities_for_trip(&self, trip_id: &str) -> Result<Vec<Activity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(|q| q.for_all([q.field("trip_id").eq(trip_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.put(collections::ACTIVITIES, &activity.id, activity)
            .await
    }

    async fn update_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.put(collections::ACTIVITIES, &activity.id, activity)
            .await
    }

    async fn delete_activity(&self, activity_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVITIES)
            .document_id(activity_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn set_activity_ranks(
        &self,
        trip_id: &str,
        day_id: &str,
        ranks: &[(String, u32)],
    ) -> Result<(), AppError> {
        let mut day_activities: Vec<Activity> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(|q| {
                q.for_all([
                    q.field("trip_id").eq(trip_id),
                    q.field("day_id").eq(day_id),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for (id, rank) in ranks {
            let activity = day_activities
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| {
                    AppError::Database(format!(
                        "activity {} is not in {}/{}",
                        id, trip_id, day_id
                    ))
                })?;
            activity.rank = *rank;
        }

        if ranks.len() > BATCH_SIZE {
            return Err(AppError::Database(format!(
                "cannot reorder more than {} activities atomically",
                BATCH_SIZE
            )));
        }

        let writes: Vec<Write<'_, Activity>> = day_activities
            .iter()
            .filter(|a| ranks.iter().any(|(id, _)| id == &a.id))
            .map(|a| Write::Upsert {
                collection: collections::ACTIVITIES,
                doc_id: a.id.clone(),
                object: a,
            })
            .collect();

        self.commit_writes(&writes).await?;

        tracing::debug!(trip_id, day_id, count = writes.len(), "Activity ranks written");
        Ok(())
    }
}
