// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Incoming error reports and the raw event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::issue::{IssueId, IssueLevel};

/// Unique identifier for a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueEventId(pub Uuid);

impl IssueEventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for IssueEventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for IssueEventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for IssueEventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// A single error report, as handed to the issue store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOccurrence {
	pub title: String,
	pub message: String,
	pub stack: Option<String>,
	#[serde(default)]
	pub level: IssueLevel,
	pub user_id: Option<String>,
	pub request_path: Option<String>,
	#[serde(default)]
	pub metadata: serde_json::Value,
	pub occurred_at: DateTime<Utc>,
}

impl NewOccurrence {
	pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			message: message.into(),
			stack: None,
			level: IssueLevel::Error,
			user_id: None,
			request_path: None,
			metadata: serde_json::Value::Null,
			occurred_at: Utc::now(),
		}
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	pub fn with_level(mut self, level: IssueLevel) -> Self {
		self.level = level;
		self
	}

	pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
		self.request_path = Some(path.into());
		self
	}

	pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = metadata;
		self
	}

	pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
		self.occurred_at = occurred_at;
		self
	}
}

/// One logged instance of an error. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueEvent {
	pub id: IssueEventId,
	pub issue_id: IssueId,
	pub fingerprint: String,
	pub level: IssueLevel,
	pub message: String,
	pub user_id: Option<String>,
	pub request_path: Option<String>,
	pub metadata: serde_json::Value,
	pub occurred_at: DateTime<Utc>,
}

impl IssueEvent {
	pub fn from_occurrence(issue_id: IssueId, fingerprint: &str, occurrence: &NewOccurrence) -> Self {
		Self {
			id: IssueEventId::new(),
			issue_id,
			fingerprint: fingerprint.to_string(),
			level: occurrence.level,
			message: occurrence.message.clone(),
			user_id: occurrence.user_id.clone(),
			request_path: occurrence.request_path.clone(),
			metadata: occurrence.metadata.clone(),
			occurred_at: occurrence.occurred_at,
		}
	}
}
