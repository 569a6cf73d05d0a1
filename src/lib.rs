// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Vitalsync: personal health-tracking backend
//!
//! This crate provides the backend API for importing Whoop wearable data
//! and folding each day's journal (meals, supplements, workouts, cardio)
//! into a single summary document.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{AggregationService, SyncService, WhoopService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub whoop: WhoopService,
    pub sync: SyncService,
    pub aggregator: AggregationService,
}
