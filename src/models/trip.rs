// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip and day models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Image shown for trips that have no cover image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=80&width=80";

/// Upper bound on the number of days a trip can span.
pub const MAX_TRIP_DAYS: u32 = 366;

/// Trip dates: either a calendar range or a flexible day count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripDates {
    Fixed {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Flexible {
        days: u32,
    },
}

impl TripDates {
    /// Number of days the dates span (inclusive for fixed ranges).
    ///
    /// Returns `None` when the range is inverted.
    pub fn day_count(&self) -> Option<u32> {
        match *self {
            TripDates::Fixed {
                start_date,
                end_date,
            } => {
                let span = end_date.signed_duration_since(start_date).num_days();
                u32::try_from(span).ok().map(|d| d + 1)
            }
            TripDates::Flexible { days } => Some(days),
        }
    }

    /// Check the dates describe at least one and at most [`MAX_TRIP_DAYS`] days.
    pub fn validate(&self) -> Result<u32, String> {
        match self.day_count() {
            None => Err("end date must not be before start date".to_string()),
            Some(0) => Err("a trip needs at least one day".to_string()),
            Some(n) if n > MAX_TRIP_DAYS => {
                Err(format!("a trip can span at most {} days", MAX_TRIP_DAYS))
            }
            Some(n) => Ok(n),
        }
    }
}

/// Stored trip record in the `trips` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    /// Trip ID (also used as document ID)
    pub id: String,
    pub title: String,
    pub dates: TripDates,
    pub location: String,
    /// Cover image path or URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Owning user ID
    pub owner_id: String,
    /// RFC3339
    pub created_at: String,
    /// RFC3339
    pub updated_at: String,
}

/// Stored day record in the `days` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    /// `day<N>`, unique within the trip
    pub id: String,
    pub trip_id: String,
    /// 1-based sequence number
    pub number: u32,
    /// Display date label ("May 1, 2023" or "Day 3")
    pub date: String,
    pub title: String,
}

impl Day {
    /// Day ID for the given 1-based sequence number.
    pub fn id_for(number: u32) -> String {
        format!("day{}", number)
    }

    /// Document ID: day IDs are only unique within a trip.
    pub fn doc_id(trip_id: &str, day_id: &str) -> String {
        format!("{}_{}", trip_id, day_id)
    }
}
