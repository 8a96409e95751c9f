// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue types for error tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::IssueError;
use crate::event::NewOccurrence;

/// Page size used when a query does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on the page size of a single query.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Unique identifier for an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId(pub Uuid);

impl IssueId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for IssueId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for IssueId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for IssueId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// A deduplicated group of error events sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
	pub id: IssueId,
	/// SHA256 hex digest, unique per issue
	pub fingerprint: String,

	pub level: IssueLevel,
	pub status: IssueStatus,

	/// First-observed values; recurrences never overwrite them
	pub title: String,
	pub message: String,
	pub stack: Option<String>,

	pub occurrence_count: u64,
	pub first_seen_at: DateTime<Utc>,
	pub last_seen_at: DateTime<Utc>,

	/// Resolution tracking
	pub resolved_by: Option<String>,
	pub resolved_at: Option<DateTime<Utc>>,

	/// User attached to the request that first raised the error
	pub user_id: Option<String>,

	/// Bumped on every write, used for optimistic updates
	pub revision: u64,

	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Issue {
	/// Build the issue row for the first sighting of a fingerprint.
	pub fn first_occurrence(fingerprint: String, occurrence: &NewOccurrence) -> Self {
		let now = Utc::now();
		Self {
			id: IssueId::new(),
			fingerprint,
			level: occurrence.level,
			status: IssueStatus::Open,
			title: occurrence.title.trim().to_string(),
			message: occurrence.message.trim().to_string(),
			stack: occurrence.stack.clone(),
			occurrence_count: 1,
			first_seen_at: occurrence.occurred_at,
			last_seen_at: occurrence.occurred_at,
			resolved_by: None,
			resolved_at: None,
			user_id: occurrence.user_id.clone(),
			revision: 0,
			created_at: now,
			updated_at: now,
		}
	}
}

/// Issue status representing its lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
	Open,
	Resolved,
	Closed,
}

impl IssueStatus {
	pub const ALL: [IssueStatus; 3] = [Self::Open, Self::Resolved, Self::Closed];

	/// Resolved and closed issues carry a resolution stamp and reopen on recurrence.
	pub fn is_settled(&self) -> bool {
		matches!(self, Self::Resolved | Self::Closed)
	}
}

impl fmt::Display for IssueStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Open => write!(f, "open"),
			Self::Resolved => write!(f, "resolved"),
			Self::Closed => write!(f, "closed"),
		}
	}
}

impl FromStr for IssueStatus {
	type Err = IssueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"open" => Ok(Self::Open),
			"resolved" => Ok(Self::Resolved),
			"closed" => Ok(Self::Closed),
			_ => Err(IssueError::InvalidIssueStatus(s.to_string())),
		}
	}
}

/// Issue severity level, ordered from least to most severe.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
	Debug,
	Info,
	Warning,
	#[default]
	Error,
}

impl IssueLevel {
	pub const ALL: [IssueLevel; 4] = [Self::Error, Self::Warning, Self::Info, Self::Debug];

	/// Whether this level is at least as severe as `threshold`.
	pub fn meets(&self, threshold: IssueLevel) -> bool {
		*self >= threshold
	}
}

impl fmt::Display for IssueLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warning => write!(f, "warning"),
			Self::Info => write!(f, "info"),
			Self::Debug => write!(f, "debug"),
		}
	}
}

impl FromStr for IssueLevel {
	type Err = IssueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(Self::Error),
			"warning" => Ok(Self::Warning),
			"info" => Ok(Self::Info),
			"debug" => Ok(Self::Debug),
			_ => Err(IssueError::InvalidIssueLevel(s.to_string())),
		}
	}
}

/// Filters for listing issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
	pub status: Option<IssueStatus>,
	pub level: Option<IssueLevel>,
	/// Case-insensitive substring of title or message
	pub search: Option<String>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

impl IssueFilter {
	pub fn limit_clamped(&self, default: u32, max: u32) -> u32 {
		self.limit.unwrap_or(default).min(max).max(1)
	}

	pub fn offset_or_default(&self) -> u32 {
		self.offset.unwrap_or(0)
	}

	/// The search term, if it contains anything besides whitespace.
	pub fn search_term(&self) -> Option<&str> {
		self
			.search
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
	}
}

/// Issue counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
	pub error: u64,
	pub warning: u64,
	pub info: u64,
	pub debug: u64,
}

impl LevelCounts {
	pub fn sum(&self) -> u64 {
		self.error + self.warning + self.info + self.debug
	}
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStats {
	pub total: u64,
	pub open: u64,
	pub resolved: u64,
	pub closed: u64,
	pub by_level: LevelCounts,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn issue_ids_are_v7() {
		let first = IssueId::new();
		assert_eq!(first.0.get_version_num(), 7);
		assert_ne!(first, IssueId::new());
	}

	#[test]
	fn level_ordering_follows_severity() {
		assert!(IssueLevel::Error.meets(IssueLevel::Warning));
		assert!(IssueLevel::Warning.meets(IssueLevel::Warning));
		assert!(!IssueLevel::Info.meets(IssueLevel::Warning));
		assert!(IssueLevel::Debug.meets(IssueLevel::Debug));
	}

	#[test]
	fn settled_statuses() {
		assert!(!IssueStatus::Open.is_settled());
		assert!(IssueStatus::Resolved.is_settled());
		assert!(IssueStatus::Closed.is_settled());
	}

	#[test]
	fn unknown_status_is_rejected() {
		let err = "ignored".parse::<IssueStatus>().unwrap_err();
		assert_eq!(err, IssueError::InvalidIssueStatus("ignored".to_string()));
	}

	#[test]
	fn filter_clamps_limit() {
		let filter = IssueFilter {
			limit: Some(500),
			..Default::default()
		};
		assert_eq!(filter.limit_clamped(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 100);

		let filter = IssueFilter {
			limit: Some(0),
			..Default::default()
		};
		assert_eq!(filter.limit_clamped(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 1);

		let filter = IssueFilter::default();
		assert_eq!(filter.limit_clamped(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 20);
		assert_eq!(filter.offset_or_default(), 0);
	}

	#[test]
	fn blank_search_is_ignored() {
		let filter = IssueFilter {
			search: Some("   ".to_string()),
			..Default::default()
		};
		assert_eq!(filter.search_term(), None);

		let filter = IssueFilter {
			search: Some("  null ".to_string()),
			..Default::default()
		};
		assert_eq!(filter.search_term(), Some("null"));
	}

	#[test]
	fn first_occurrence_starts_open_with_one_hit() {
		let occurrence = NewOccurrence::new("NullPointerException", "obj is null");
		let issue = Issue::first_occurrence("abc".to_string(), &occurrence);

		assert_eq!(issue.status, IssueStatus::Open);
		assert_eq!(issue.occurrence_count, 1);
		assert_eq!(issue.first_seen_at, issue.last_seen_at);
		assert!(issue.resolved_at.is_none());
	}

	proptest! {
		#[test]
		fn issue_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let uuid = Uuid::from_bytes(uuid_bytes);
			let id = IssueId(uuid);
			let s = id.to_string();
			let parsed: IssueId = s.parse().unwrap();
			prop_assert_eq!(id, parsed);
		}

		#[test]
		fn issue_status_roundtrip(status in prop_oneof![
			Just(IssueStatus::Open),
			Just(IssueStatus::Resolved),
			Just(IssueStatus::Closed),
		]) {
			let s = status.to_string();
			let parsed: IssueStatus = s.parse().unwrap();
			prop_assert_eq!(status, parsed);
		}

		#[test]
		fn issue_level_roundtrip(level in prop_oneof![
			Just(IssueLevel::Error),
			Just(IssueLevel::Warning),
			Just(IssueLevel::Info),
			Just(IssueLevel::Debug),
		]) {
			let s = level.to_string();
			let parsed: IssueLevel = s.parse().unwrap();
			prop_assert_eq!(level, parsed);
		}
	}
}
