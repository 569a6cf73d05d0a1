// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod sync;
pub mod whoop;

pub use aggregate::AggregationService;
pub use sync::{BatchSyncReport, SyncService, UserSyncReport, UserSyncResult};
pub use whoop::{RefreshLocks, TokenCache, WhoopClient, WhoopService};
