// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transit cache: memoized route estimates per ordered activity pair.
//!
//! An entry is reused while younger than the freshness window; after that all
//! four modes are fetched again. Concurrent fills for the same pair are not
//! deduplicated, last insert wins. The viewer's selected mode survives a
//! recompute of the same pair. Every fill drops other expired entries, so the
//! cache only holds pairs looked up within the last window.

use crate::models::{Activity, TransitInfo, TravelMode};
use crate::services::maps::RouteEstimator;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;

type PairKey = (String, String);

pub struct TransitCache {
    estimator: Arc<dyn RouteEstimator>,
    entries: DashMap<PairKey, TransitInfo>,
    freshness: Duration,
}

impl TransitCache {
    pub fn new(estimator: Arc<dyn RouteEstimator>, freshness_secs: i64) -> Self {
        Self {
            estimator,
            entries: DashMap::new(),
            freshness: Duration::seconds(freshness_secs),
        }
    }

    /// Estimates for travelling from `from` to `to`, or `None` when either end
    /// has no physical location.
    pub async fn get_or_compute(&self, from: &Activity, to: &Activity) -> Option<TransitInfo> {
        self.get_or_compute_at(from, to, Utc::now()).await
    }

    /// [`get_or_compute`](Self::get_or_compute) with an explicit clock.
    pub async fn get_or_compute_at(
        &self,
        from: &Activity,
        to: &Activity,
        now: DateTime<Utc>,
    ) -> Option<TransitInfo> {
        let (Some(origin), Some(destination)) = (from.waypoint(), to.waypoint()) else {
            return None;
        };
        let key = (from.id.clone(), to.id.clone());

        // Clone out so no map guard is held across the estimator calls.
        let cached = self.entries.get(&key).map(|entry| entry.value().clone());
        if let Some(entry) = &cached {
            if now - entry.captured_at < self.freshness {
                tracing::debug!(from = %key.0, to = %key.1, "Transit cache hit");
                return Some(entry.clone());
            }
        }

        let results = join_all(
            TravelMode::ALL
                .iter()
                .map(|mode| self.estimator.estimate(&origin, &destination, *mode)),
        )
        .await;

        let mut info = TransitInfo {
            from_activity_id: key.0.clone(),
            to_activity_id: key.1.clone(),
            walking: None,
            bicycling: None,
            driving: None,
            transit: None,
            selected_mode: cached.map(|c| c.selected_mode).unwrap_or_default(),
            captured_at: now,
        };
        for (mode, result) in TravelMode::ALL.into_iter().zip(results) {
            match result {
                Ok(estimate) => info.set_estimate(mode, estimate),
                Err(e) => tracing::warn!(
                    error = %e,
                    mode = mode.as_str(),
                    from = %key.0,
                    to = %key.1,
                    "Route estimate failed"
                ),
            }
        }

        self.prune_expired(&key, now);

        // A selection made while we were fetching wins.
        if let Some(current) = self.entries.get(&key) {
            info.selected_mode = current.selected_mode;
        }
        self.entries.insert(key, info.clone());

        tracing::debug!(
            from = %info.from_activity_id,
            to = %info.to_activity_id,
            "Transit estimates computed"
        );
        Some(info)
    }

    /// Drop entries that are past the freshness window, except `keep`.
    fn prune_expired(&self, keep: &PairKey, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| key == keep || now - entry.captured_at < self.freshness);
        let pruned = before.saturating_sub(self.entries.len());
        if pruned > 0 {
            tracing::debug!(pruned, "Expired transit entries dropped");
        }
    }

    /// Change the displayed mode of a cached entry. `None` if the pair was
    /// never computed. Modes without an estimate may be selected.
    pub fn select_mode(&self, from_id: &str, to_id: &str, mode: TravelMode) -> Option<TransitInfo> {
        let key = (from_id.to_string(), to_id.to_string());
        let mut entry = self.entries.get_mut(&key)?;
        entry.selected_mode = mode;
        Some(entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Category, ModeEstimate, Position};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; transit has no coverage and bicycling always errors.
    #[derive(Default)]
    struct CountingEstimator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RouteEstimator for CountingEstimator {
        async fn estimate(
            &self,
            _origin: &str,
            _destination: &str,
            mode: TravelMode,
        ) -> Result<Option<ModeEstimate>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match mode {
                TravelMode::Bicycling => Err(AppError::MapsApi("boom".to_string())),
                TravelMode::Transit => Ok(None),
                _ => Ok(Some(ModeEstimate {
                    distance_meters: 1000,
                    distance_text: "1 km".to_string(),
                    duration_seconds: 600,
                    duration_text: "10 mins".to_string(),
                })),
            }
        }
    }

    fn activity(id: &str, location: &str) -> Activity {
        Activity {
            id: id.to_string(),
            trip_id: "t1".to_string(),
            day_id: "day1".to_string(),
            rank: 0,
            time: String::new(),
            title: id.to_string(),
            description: String::new(),
            location: location.to_string(),
            category: Category::ThingsToDo,
            position: Some(Position {
                lat: 40.0,
                lng: -73.0,
            }),
            website: None,
            phone_number: None,
            image: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn cache() -> (TransitCache, Arc<CountingEstimator>) {
        let estimator = Arc::new(CountingEstimator::default());
        (TransitCache::new(estimator.clone(), 15 * 60), estimator)
    }

    #[tokio::test]
    async fn test_fresh_entry_reused_then_recomputed() {
        let (cache, estimator) = cache();
        let (a, b) = (activity("a", "1 Main St"), activity("b", "2 Main St"));
        let t0 = Utc::now();

        cache.get_or_compute_at(&a, &b, t0).await.unwrap();
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 4);

        cache
            .get_or_compute_at(&a, &b, t0 + Duration::minutes(14))
            .await
            .unwrap();
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 4);

        let info = cache
            .get_or_compute_at(&a, &b, t0 + Duration::minutes(16))
            .await
            .unwrap();
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 8);
        assert_eq!(info.captured_at, t0 + Duration::minutes(16));
    }

    #[tokio::test]
    async fn test_pair_is_ordered() {
        let (cache, estimator) = cache();
        let (a, b) = (activity("a", "1 Main St"), activity("b", "2 Main St"));
        cache.get_or_compute(&a, &b).await.unwrap();
        cache.get_or_compute(&b, &a).await.unwrap();
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 8);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_mode_failures_leave_mode_absent() {
        let (cache, _) = cache();
        let info = cache
            .get_or_compute(&activity("a", "x"), &activity("b", "y"))
            .await
            .unwrap();
        assert!(info.walking.is_some());
        assert!(info.driving.is_some());
        assert!(info.bicycling.is_none());
        assert!(info.transit.is_none());
        assert_eq!(info.selected_mode, TravelMode::Driving);
    }

    #[tokio::test]
    async fn test_no_location_skips_estimator() {
        let (cache, estimator) = cache();
        let mut note = activity("n", "none");
        note.position = None;

        assert!(cache
            .get_or_compute(&note, &activity("b", "2 Main St"))
            .await
            .is_none());
        assert!(cache
            .get_or_compute(&activity("a", "1 Main St"), &note)
            .await
            .is_none());
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fill_prunes_expired_entries() {
        let (cache, _) = cache();
        let t0 = Utc::now();
        let hub = activity("hub", "0 Main St");
        for i in 0..50 {
            let stop = activity(&format!("stop{i}"), "1 Main St");
            cache.get_or_compute_at(&hub, &stop, t0).await.unwrap();
        }
        assert_eq!(cache.len(), 50);

        // Still fresh: nothing is dropped.
        let fresh = activity("fresh", "2 Main St");
        cache
            .get_or_compute_at(&hub, &fresh, t0 + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(cache.len(), 51);

        let late = activity("late", "3 Main St");
        cache
            .get_or_compute_at(&hub, &late, t0 + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.select_mode("hub", "late", TravelMode::Walking).is_some());
        assert!(cache.select_mode("hub", "stop0", TravelMode::Walking).is_none());
    }

    #[tokio::test]
    async fn test_selected_mode_survives_recompute() {
        let (cache, _) = cache();
        let (a, b) = (activity("a", "1 Main St"), activity("b", "2 Main St"));
        assert!(cache.select_mode("a", "b", TravelMode::Walking).is_none());

        let t0 = Utc::now();
        cache.get_or_compute_at(&a, &b, t0).await.unwrap();

        // Selecting a mode without an estimate is allowed.
        let info = cache.select_mode("a", "b", TravelMode::Transit).unwrap();
        assert_eq!(info.selected_mode, TravelMode::Transit);
        assert!(info.selected().is_none());

        let info = cache
            .get_or_compute_at(&a, &b, t0 + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(info.selected_mode, TravelMode::Transit);
    }
}
