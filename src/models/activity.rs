// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Itinerary activity model for storage and API.

use super::Category;
use serde::{Deserialize, Serialize};

/// Location value meaning "no physical location" (custom note activity).
pub const NO_LOCATION: &str = "none";

/// Geographic coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Stored activity record in the `activities` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    /// Server-assigned activity ID (also used as document ID)
    pub id: String,
    /// Parent trip, denormalized for access checks and cascade deletes
    pub trip_id: String,
    /// Parent day (`day<N>`)
    pub day_id: String,
    /// Display order within the day, ascending
    pub rank: u32,
    /// Free-text time label ("9:00 AM", "Morning")
    #[serde(default)]
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Address, or `"none"`/empty for activities without a place
    #[serde(default)]
    pub location: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// RFC3339, tie-breaker for equal ranks
    pub created_at: String,
}

impl Activity {
    /// Whether the address is a real one rather than the no-location sentinel.
    fn has_address(&self) -> bool {
        let location = self.location.trim();
        !(location.is_empty() || location.eq_ignore_ascii_case(NO_LOCATION))
    }

    /// Whether the activity refers to a physical place: it has a coordinate
    /// or an address.
    pub fn has_location(&self) -> bool {
        self.position.is_some() || self.has_address()
    }

    /// Waypoint string for route queries: the coordinate when known,
    /// otherwise the address.
    pub fn waypoint(&self) -> Option<String> {
        match self.position {
            Some(p) => Some(format!("{},{}", p.lat, p.lng)),
            None if self.has_address() => Some(self.location.trim().to_string()),
            None => None,
        }
    }
}

/// Sort activities into display order.
pub fn sort_for_display(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
