// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifications queued in the outbox for admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IssueError;
use crate::fingerprint::truncate;
use crate::issue::{IssueId, IssueLevel};
use crate::lifecycle::IngestOutcome;

const BODY_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
	NewIssue,
	IssueReopened,
}

impl NotificationKind {
	/// The notification an ingest outcome calls for, if any.
	pub fn for_outcome(outcome: IngestOutcome) -> Option<Self> {
		match outcome {
			IngestOutcome::Created => Some(Self::NewIssue),
			IngestOutcome::Reopened => Some(Self::IssueReopened),
			IngestOutcome::Recurred => None,
		}
	}
}

impl fmt::Display for NotificationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NewIssue => write!(f, "new_issue"),
			Self::IssueReopened => write!(f, "issue_reopened"),
		}
	}
}

impl FromStr for NotificationKind {
	type Err = IssueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"new_issue" => Ok(Self::NewIssue),
			"issue_reopened" => Ok(Self::IssueReopened),
			_ => Err(IssueError::InvalidNotificationKind(s.to_string())),
		}
	}
}

/// A pending outbox row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
	pub id: i64,
	pub issue_id: IssueId,
	pub kind: NotificationKind,
	pub level: IssueLevel,
	pub title: String,
	pub message: String,
	pub occurrence_count: u64,
	pub created_at: DateTime<Utc>,
	/// Failed delivery attempts so far
	pub attempts: u32,
}

impl Notification {
	pub fn subject(&self) -> String {
		let prefix = match self.kind {
			NotificationKind::NewIssue => "New issue",
			NotificationKind::IssueReopened => "Issue reopened",
		};
		format!("[{}] {}: {}", self.level, prefix, truncate(&self.title, 120))
	}

	pub fn body(&self) -> String {
		format!(
			"{}\n\n{}\n\nLevel: {}\nOccurrences: {}\nIssue: {}\n",
			self.title,
			truncate(&self.message, BODY_MESSAGE_CHARS),
			self.level,
			self.occurrence_count,
			self.issue_id,
		)
	}
}
