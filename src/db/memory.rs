// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! All tables live behind one lock, so every operation (cascade deletes and
//! rank updates included) is atomic.

use super::TripStore;
use crate::error::AppError;
use crate::models::{Activity, Collaborator, Day, Trip, TripCollaborator, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    collaborators: HashMap<String, Collaborator>,
    trips: HashMap<String, Trip>,
    /// Keyed by [`Day::doc_id`]
    days: HashMap<String, Day>,
    activities: HashMap<String, Activity>,
    links: Vec<TripCollaborator>,
}

/// In-memory [`TripStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a database error (or
    /// recover). Used to exercise storage-fault handling.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.check_online()?;
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_collaborator(&self, id: &str) -> Result<Option<Collaborator>, AppError> {
        self.check_online()?;
        Ok(self.tables.read().await.collaborators.get(id).cloned())
    }

    async fn find_collaborator_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Collaborator>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .collaborators
            .values()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<(), AppError> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .collaborators
            .insert(collaborator.id.clone(), collaborator.clone());
        Ok(())
    }

    async fn attach_collaborator(
        &self,
        trip_id: &str,
        collaborator_id: &str,
    ) -> Result<(), AppError> {
        self.check_online()?;
        let link = TripCollaborator {
            trip_id: trip_id.to_string(),
            collaborator_id: collaborator_id.to_string(),
        };
        let mut tables = self.tables.write().await;
        if !tables.links.contains(&link) {
            tables.links.push(link);
        }
        Ok(())
    }

    async fn collaborators_for_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<Collaborator>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|l| l.trip_id == trip_id)
            .filter_map(|l| tables.collaborators.get(&l.collaborator_id).cloned())
            .collect())
    }

    async fn insert_trip(&self, trip: &Trip, days: &[Day]) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        tables.trips.insert(trip.id.clone(), trip.clone());
        for day in days {
            tables
                .days
                .insert(Day::doc_id(&trip.id, &day.id), day.clone());
        }
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        self.check_online()?;
        Ok(self.tables.read().await.trips.get(trip_id).cloned())
    }

    async fn trips_owned_by(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .trips
            .values()
            .filter(|t| t.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn trips_shared_with(&self, email: &str) -> Result<Vec<Trip>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut trip_ids: Vec<&str> = tables
            .links
            .iter()
            .filter(|l| {
                tables
                    .collaborators
                    .get(&l.collaborator_id)
                    .is_some_and(|c| c.email.as_deref() == Some(email))
            })
            .map(|l| l.trip_id.as_str())
            .collect();
        trip_ids.sort_unstable();
        trip_ids.dedup();
        Ok(trip_ids
            .into_iter()
            .filter_map(|id| tables.trips.get(id).cloned())
            .collect())
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .trips
            .insert(trip.id.clone(), trip.clone());
        Ok(())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        tables.trips.remove(trip_id);
        tables.days.retain(|_, d| d.trip_id != trip_id);
        tables.activities.retain(|_, a| a.trip_id != trip_id);
        tables.links.retain(|l| l.trip_id != trip_id);
        Ok(())
    }

    async fn days_for_trip(&self, trip_id: &str) -> Result<Vec<Day>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut days: Vec<Day> = tables
            .days
            .values()
            .filter(|d| d.trip_id == trip_id)
            .cloned()
            .collect();
        days.sort_by_key(|d| d.number);
        Ok(days)
    }

    async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        self.check_online()?;
        Ok(self.tables.read().await.activities.get(activity_id).cloned())
    }

    async fn activities_for_trip(&self, trip_id: &str) -> Result<Vec<Activity>, AppError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .activities
            .values()
            .filter(|a| a.trip_id == trip_id)
            .cloned()
            .collect())
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .activities
            .insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn update_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        match tables.activities.get_mut(&activity.id) {
            Some(existing) => {
                *existing = activity.clone();
                Ok(())
            }
            None => Err(AppError::Database(format!(
                "activity {} does not exist",
                activity.id
            ))),
        }
    }

    async fn delete_activity(&self, activity_id: &str) -> Result<(), AppError> {
        self.check_online()?;
        self.tables.write().await.activities.remove(activity_id);
        Ok(())
    }

    async fn set_activity_ranks(
        &self,
        trip_id: &str,
        day_id: &str,
        ranks: &[(String, u32)],
    ) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;

        // Validate every target before touching any of them.
        for (id, _) in ranks {
            let belongs = tables
                .activities
                .get(id)
                .is_some_and(|a| a.trip_id == trip_id && a.day_id == day_id);
            if !belongs {
                return Err(AppError::Database(format!(
                    "activity {} is not in {}/{}",
                    id, trip_id, day_id
                )));
            }
        }

        for (id, rank) in ranks {
            if let Some(activity) = tables.activities.get_mut(id) {
                activity.rank = *rank;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TripDates};

    fn trip(id: &str, owner: &str) -> Trip {
        Trip {
            id: id.to_string(),
            title: "Trip".to_string(),
            dates: TripDates::Flexible { days: 1 },
            location: "NYC".to_string(),
            image: None,
            owner_id: owner.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn day(trip_id: &str, number: u32) -> Day {
        Day {
            id: Day::id_for(number),
            trip_id: trip_id.to_string(),
            number,
            date: format!("Day {}", number),
            title: format!("Day {}", number),
        }
    }

    fn activity(id: &str, trip_id: &str, rank: u32) -> Activity {
        Activity {
            id: id.to_string(),
            trip_id: trip_id.to_string(),
            day_id: "day1".to_string(),
            rank,
            time: String::new(),
            title: id.to_string(),
            description: String::new(),
            location: "none".to_string(),
            category: Category::ThingsToDo,
            position: None,
            website: None,
            phone_number: None,
            image: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_delete_trip_cascades() {
        let store = MemoryStore::new();
        store
            .insert_trip(&trip("t1", "u1"), &[day("t1", 1), day("t1", 2)])
            .await
            .unwrap();
        store.insert_trip(&trip("t2", "u1"), &[day("t2", 1)]).await.unwrap();
        store.insert_activity(&activity("a1", "t1", 0)).await.unwrap();
        store.insert_activity(&activity("a2", "t2", 0)).await.unwrap();

        store.delete_trip("t1").await.unwrap();

        assert!(store.get_trip("t1").await.unwrap().is_none());
        assert!(store.days_for_trip("t1").await.unwrap().is_empty());
        assert!(store.get_activity("a1").await.unwrap().is_none());
        assert!(store.get_activity("a2").await.unwrap().is_some());
        assert_eq!(store.days_for_trip("t2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_ranks_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert_activity(&activity("a1", "t1", 0)).await.unwrap();
        store.insert_activity(&activity("a2", "t1", 1)).await.unwrap();

        let bad = vec![("a1".to_string(), 5), ("missing".to_string(), 6)];
        assert!(store.set_activity_ranks("t1", "day1", &bad).await.is_err());
        assert_eq!(store.get_activity("a1").await.unwrap().unwrap().rank, 0);

        let good = vec![("a1".to_string(), 1), ("a2".to_string(), 0)];
        store.set_activity_ranks("t1", "day1", &good).await.unwrap();
        assert_eq!(store.get_activity("a1").await.unwrap().unwrap().rank, 1);
        assert_eq!(store.get_activity("a2").await.unwrap().unwrap().rank, 0);
    }

    #[tokio::test]
    async fn test_offline_mode() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.get_trip("t1").await,
            Err(AppError::Database(_))
        ));
        store.set_offline(false);
        assert!(store.get_trip("t1").await.unwrap().is_none());
    }
}
