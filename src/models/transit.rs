// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transit estimates between consecutive activities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Travel mode understood by the route estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Walking,
    Bicycling,
    #[default]
    Driving,
    Transit,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Walking,
        TravelMode::Bicycling,
        TravelMode::Driving,
        TravelMode::Transit,
    ];

    /// Query-parameter value used by the Distance Matrix API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
        }
    }
}

/// Distance and duration for one mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeEstimate {
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
}

/// Cached estimate for an ordered activity pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitInfo {
    pub from_activity_id: String,
    pub to_activity_id: String,
    pub walking: Option<ModeEstimate>,
    pub bicycling: Option<ModeEstimate>,
    pub driving: Option<ModeEstimate>,
    pub transit: Option<ModeEstimate>,
    /// Mode the viewer chose to display
    pub selected_mode: TravelMode,
    /// When the estimates were fetched
    pub captured_at: DateTime<Utc>,
}

impl TransitInfo {
    pub fn estimate(&self, mode: TravelMode) -> Option<&ModeEstimate> {
        match mode {
            TravelMode::Walking => self.walking.as_ref(),
            TravelMode::Bicycling => self.bicycling.as_ref(),
            TravelMode::Driving => self.driving.as_ref(),
            TravelMode::Transit => self.transit.as_ref(),
        }
    }

    pub fn set_estimate(&mut self, mode: TravelMode, estimate: Option<ModeEstimate>) {
        match mode {
            TravelMode::Walking => self.walking = estimate,
            TravelMode::Bicycling => self.bicycling = estimate,
            TravelMode::Driving => self.driving = estimate,
            TravelMode::Transit => self.transit = estimate,
        }
    }

    /// Estimate for the selected mode; `None` means the caller should render
    /// a placeholder.
    pub fn selected(&self) -> Option<&ModeEstimate> {
        self.estimate(self.selected_mode)
    }
}
