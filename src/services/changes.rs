// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh signals for trip views.
//!
//! Every successful mutation publishes a [`TripChange`]; listeners (the SSE
//! endpoint) re-fetch the trip when they see one for a trip they display.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    TripCreated,
    TripUpdated,
    TripDeleted,
    CollaboratorAdded,
    ActivityAdded,
    ActivityUpdated,
    ActivityDeleted,
    ActivitiesReordered,
}

/// A change to one trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripChange {
    pub trip_id: String,
    pub kind: ChangeKind,
}

/// Broadcast hub for [`TripChange`] events.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<TripChange>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a change. Having no listeners is fine.
    pub fn publish(&self, trip_id: &str, kind: ChangeKind) {
        let change = TripChange {
            trip_id: trip_id.to_string(),
            kind,
        };
        let listeners = self.tx.send(change).unwrap_or(0);
        tracing::debug!(trip_id, ?kind, listeners, "Trip change published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TripChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.publish("t1", ChangeKind::ActivityAdded);

        let change = rx.recv().await.unwrap();
        assert_eq!(change.trip_id, "t1");
        assert_eq!(change.kind, ChangeKind::ActivityAdded);
    }

    #[test]
    fn test_publish_without_listeners() {
        ChangeNotifier::new().publish("t1", ChangeKind::TripDeleted);
    }
}
