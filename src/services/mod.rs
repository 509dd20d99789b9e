// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod changes;
pub mod maps;
pub mod transit;
pub mod trips;
pub mod uploads;
pub mod users;

pub use access::{access_for, Access};
pub use changes::{ChangeKind, ChangeNotifier, TripChange};
pub use maps::{GoogleMapsClient, PlaceResolver, RouteEstimator};
pub use transit::TransitCache;
pub use trips::TripService;
pub use uploads::UploadStore;
pub use users::UserService;
