// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Beacon error tracking system.
//!
//! This crate provides the pieces of issue tracking that do not touch storage:
//! issue and event types, the fingerprinting scheme that collapses recurring
//! errors into one issue, and the lifecycle state machine. It is used by
//! `beacon-server-issues` and the HTTP server.
//!
//! # Overview
//!
//! - Raw error reports arrive as [`NewOccurrence`] values
//! - [`compute_fingerprint`] derives the dedup key from title, message and stack shape
//! - [`apply_event`] folds a new occurrence or an admin transition into an [`Issue`]
//! - Issues move between `open`, `resolved` and `closed`, reopening when the error recurs

pub mod error;
pub mod event;
pub mod fingerprint;
pub mod issue;
pub mod lifecycle;
pub mod notification;
pub mod principal;
pub mod settings;

pub use error::{IssueError, Result};
pub use event::{IssueEvent, IssueEventId, NewOccurrence};
pub use fingerprint::compute_fingerprint;
pub use issue::{
	Issue, IssueFilter, IssueId, IssueLevel, IssueStats, IssueStatus, LevelCounts,
	DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use lifecycle::{apply_event, IngestOutcome, LifecycleEvent, Transition, TransitionOutcome};
pub use notification::{Notification, NotificationKind};
pub use principal::{Principal, Role};
pub use settings::AdminSettings;
