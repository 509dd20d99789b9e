// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip Planner: collaborative multi-day itineraries
//!
//! This crate provides the backend API for planning trips: trips with days
//! and ordered activities, place lookup, cached transit estimates between
//! consecutive stops, and file uploads.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::TripStore;
use services::{
    ChangeNotifier, PlaceResolver, RouteEstimator, TransitCache, TripService, UploadStore,
    UserService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TripStore>,
    pub users: UserService,
    pub trips: TripService,
    pub places: Arc<dyn PlaceResolver>,
    pub transit: TransitCache,
    pub changes: ChangeNotifier,
    pub uploads: UploadStore,
}

impl AppState {
    /// Wire services over a store and the maps collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn TripStore>,
        places: Arc<dyn PlaceResolver>,
        estimator: Arc<dyn RouteEstimator>,
    ) -> Self {
        let changes = ChangeNotifier::new();
        Self {
            users: UserService::new(store.clone()),
            trips: TripService::new(store.clone(), changes.clone()),
            transit: TransitCache::new(estimator, config.transit_freshness_secs),
            uploads: UploadStore::new(config.upload_dir.clone()),
            places,
            changes,
            store,
            config,
        }
    }
}
