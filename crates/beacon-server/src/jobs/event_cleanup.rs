// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use beacon_server_issues::{IssueRepository, SqliteIssueRepository};
use beacon_server_jobs::{Job, JobContext, JobError, JobOutput};
use chrono::{Duration, Utc};
use tracing::instrument;

/// Deletes occurrence events past the retention window. Issues and their
/// counters are kept.
pub struct EventCleanupJob {
	repo: Arc<SqliteIssueRepository>,
	retention_days: u32,
}

impl EventCleanupJob {
	pub fn new(repo: Arc<SqliteIssueRepository>, retention_days: u32) -> Self {
		Self {
			repo,
			retention_days,
		}
	}
}

#[async_trait]
impl Job for EventCleanupJob {
	fn id(&self) -> &str {
		"event-cleanup"
	}

	fn name(&self) -> &str {
		"Issue Event Cleanup"
	}

	fn description(&self) -> &str {
		"Delete issue events older than the retention period"
	}

	#[instrument(skip(self, ctx), fields(job_id = "event-cleanup"))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.check_cancelled()?;

		let cutoff = Duration::try_days(i64::from(self.retention_days))
			.and_then(|window| Utc::now().checked_sub_signed(window))
			.ok_or_else(|| {
				JobError::fatal(format!(
					"retention of {} days is outside the representable date range",
					self.retention_days
				))
			})?;
		let deleted = self
			.repo
			.delete_old_events(cutoff)
			.await
			.map_err(|e| JobError::retryable(e.to_string()))?;

		tracing::info!(
			deleted,
			retention_days = self.retention_days,
			"Issue event cleanup completed"
		);

		Ok(JobOutput {
			message: format!("Deleted {deleted} issue events"),
			metadata: Some(serde_json::json!({
				"deleted": deleted,
				"retention_days": self.retention_days,
			})),
		})
	}
}
