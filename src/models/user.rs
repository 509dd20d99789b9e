// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Registered account stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address, normalized (unique)
    pub email: String,
    /// PBKDF2 credential hash, see `services::users`
    pub password_hash: String,
    /// When the account was registered (RFC3339)
    pub created_at: String,
}

/// Minimal user record returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Normalize an email for storage and comparison.
///
/// Applied at every site that stores or matches an email (registration,
/// login, collaborator creation and lookup, viewer matching).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
