// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip access rules.
//!
//! - Reads (trip, days, activities, transit, events): owner or a
//!   collaborator whose email equals the viewer's.
//! - Itinerary edits (activities and their order): same set of participants.
//! - Trip fields, sharing and deletion: owner only.

use crate::middleware::auth::AuthUser;
use crate::models::{normalize_email, Collaborator, Trip};

/// A viewer's relationship to a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Collaborator,
    None,
}

impl Access {
    pub fn can_read(self) -> bool {
        matches!(self, Access::Owner | Access::Collaborator)
    }

    pub fn can_edit_itinerary(self) -> bool {
        self.can_read()
    }

    pub fn can_manage_trip(self) -> bool {
        self == Access::Owner
    }
}

/// Work out the viewer's access to a trip given its collaborators.
pub fn access_for(trip: &Trip, collaborators: &[Collaborator], viewer: &AuthUser) -> Access {
    if trip.owner_id == viewer.user_id {
        return Access::Owner;
    }

    let viewer_email = normalize_email(&viewer.email);
    if viewer_email.is_empty() {
        return Access::None;
    }

    let matched = collaborators
        .iter()
        .filter_map(|c| c.email.as_deref())
        .any(|email| normalize_email(email) == viewer_email);

    if matched {
        Access::Collaborator
    } else {
        Access::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripDates;

    fn trip() -> Trip {
        Trip {
            id: "t1".to_string(),
            title: "NYC".to_string(),
            dates: TripDates::Flexible { days: 2 },
            location: "NYC".to_string(),
            image: None,
            owner_id: "owner".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn viewer(id: &str, email: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            email: email.to_string(),
            name: id.to_string(),
        }
    }

    fn collaborator(email: Option<&str>) -> Collaborator {
        Collaborator {
            id: "c1".to_string(),
            name: "Alex".to_string(),
            color: "bg-green-500".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_owner_access() {
        let access = access_for(&trip(), &[], &viewer("owner", "o@example.com"));
        assert_eq!(access, Access::Owner);
        assert!(access.can_manage_trip());
    }

    #[test]
    fn test_collaborator_by_email() {
        let collaborators = [collaborator(Some("a@example.com"))];
        let access = access_for(&trip(), &collaborators, &viewer("u2", "a@example.com"));
        assert_eq!(access, Access::Collaborator);
        assert!(access.can_read());
        assert!(access.can_edit_itinerary());
        assert!(!access.can_manage_trip());
    }

    #[test]
    fn test_email_normalized_on_both_sides() {
        let collaborators = [collaborator(Some("A@Example.com"))];
        let access = access_for(&trip(), &collaborators, &viewer("u2", " a@example.COM"));
        assert_eq!(access, Access::Collaborator);
    }

    #[test]
    fn test_unrelated_viewer() {
        let collaborators = [collaborator(Some("a@example.com")), collaborator(None)];
        let access = access_for(&trip(), &collaborators, &viewer("u3", "b@example.com"));
        assert_eq!(access, Access::None);
        assert!(!access.can_read());

        // A collaborator without an email never matches an email-less viewer.
        let access = access_for(&trip(), &collaborators, &viewer("u4", ""));
        assert_eq!(access, Access::None);
    }
}
