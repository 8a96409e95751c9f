// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue tracking server implementation for Beacon.
//!
//! This crate provides the server-side half of issue tracking:
//!
//! - Repository layer: dedup upsert, lifecycle writes, filtered queries and stats
//! - Admin settings and the notification outbox
//! - Role-gated service actions
//! - Outbox relay with log and email dispatchers

pub mod error;
pub mod notify;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{IssueServerError, Result};
pub use notify::{
	EmailDispatcher, NotificationDispatcher, NotifyError, OutboxRelay, RelayReport,
	TracingDispatcher, DEFAULT_MAX_ATTEMPTS,
};
pub use pool::{create_pool, run_migrations};
pub use repository::{IssueRepository, LoggedIssue, SqliteIssueRepository, MAX_STATUS_RETRIES};
pub use service::{IssuePage, IssueService, LogErrorRequest, PageLimits};
