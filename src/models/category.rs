// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity categories and the place-type precedence table.
//!
//! Providers tag places with open-ended type strings. They are folded into a
//! closed set of categories by walking [`PRECEDENCE`] top to bottom and taking
//! the first rule that matches any tag; anything unmatched is
//! [`Category::ThingsToDo`].

use serde::{Deserialize, Serialize};

/// Closed set of activity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Restaurant,
    Hotel,
    Museum,
    Transit,
    #[default]
    #[serde(rename = "Things to do")]
    ThingsToDo,
}

/// Ordered rules: earlier rows win.
pub const PRECEDENCE: &[(Category, &[&str])] = &[
    (
        Category::Restaurant,
        &[
            "restaurant",
            "food",
            "cafe",
            "bar",
            "bakery",
            "meal_takeaway",
            "meal_delivery",
        ],
    ),
    (Category::Hotel, &["lodging", "hotel"]),
    (Category::Museum, &["museum"]),
    (
        Category::Transit,
        &[
            "airport",
            "train_station",
            "bus_station",
            "subway_station",
            "light_rail_station",
            "ferry_terminal",
            "transit_station",
        ],
    ),
];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Restaurant,
        Category::Hotel,
        Category::Museum,
        Category::Transit,
        Category::ThingsToDo,
    ];

    /// Derive a category from a provider's place type tags.
    pub fn from_place_types<S: AsRef<str>>(types: &[S]) -> Category {
        PRECEDENCE
            .iter()
            .find(|(_, tags)| {
                types
                    .iter()
                    .any(|t| tags.contains(&t.as_ref().trim().to_ascii_lowercase().as_str()))
            })
            .map(|(category, _)| *category)
            .unwrap_or_default()
    }

    /// Display name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurant => "Restaurant",
            Category::Hotel => "Hotel",
            Category::Museum => "Museum",
            Category::Transit => "Transit",
            Category::ThingsToDo => "Things to do",
        }
    }

    /// Parse a client-supplied display name; unknown names fall back to
    /// [`Category::ThingsToDo`].
    pub fn from_display(name: &str) -> Category {
        let name = name.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
