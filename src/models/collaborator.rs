// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collaborator model: a person attached to a trip, not necessarily a user.

use serde::{Deserialize, Serialize};

/// Collaborator row stored in the `collaborators` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    /// UI color tag (e.g. "bg-green-500")
    pub color: String,
    /// Normalized email; a viewer whose email matches gains read access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Trip ↔ collaborator join record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripCollaborator {
    pub trip_id: String,
    pub collaborator_id: String,
}

impl TripCollaborator {
    /// Document ID for the join record.
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.trip_id, self.collaborator_id)
    }
}
