// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place records returned by the place resolver.

use super::{Category, Position};
use serde::{Deserialize, Serialize};

/// A geocoded place, as returned by search (summary fields) or details
/// lookup (all fields).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Place {
    /// Provider's stable identifier
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub position: Option<Position>,
    /// Provider type tags
    pub types: Vec<String>,
    pub rating: Option<f32>,
    /// 0 (free) .. 4 (very expensive)
    pub price_level: Option<u8>,
    /// Weekday opening-hours lines
    #[serde(default)]
    pub opening_hours: Vec<String>,
    pub photo_url: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
}

impl Place {
    pub fn category(&self) -> Category {
        Category::from_place_types(&self.types)
    }
}
