// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod category;
pub mod collaborator;
pub mod place;
pub mod transit;
pub mod trip;
pub mod user;

pub use activity::{Activity, Position, NO_LOCATION};
pub use category::Category;
pub use collaborator::{Collaborator, TripCollaborator};
pub use place::Place;
pub use transit::{ModeEstimate, TransitInfo, TravelMode};
pub use trip::{Day, Trip, TripDates, PLACEHOLDER_IMAGE};
pub use user::{normalize_email, User, UserSummary};
