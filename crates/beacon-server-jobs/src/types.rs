// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Running,
	Succeeded,
	Failed,
	Cancelled,
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			JobStatus::Running => write!(f, "running"),
			JobStatus::Succeeded => write!(f, "succeeded"),
			JobStatus::Failed => write!(f, "failed"),
			JobStatus::Cancelled => write!(f, "cancelled"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	Schedule,
	Manual,
	Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
	pub id: String,
	pub job_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<i64>,
	pub error_message: Option<String>,
	pub retry_count: u32,
	pub triggered_by: TriggerSource,
	pub metadata: Option<serde_json::Value>,
}
