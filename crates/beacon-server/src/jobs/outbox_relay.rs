// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use beacon_server_config::NotificationEmailConfig;
use beacon_server_issues::{
	EmailDispatcher, NotificationDispatcher, NotifyError, OutboxRelay, SqliteIssueRepository,
	TracingDispatcher,
};
use beacon_server_jobs::{Job, JobContext, JobError, JobOutput};
use beacon_server_smtp::SmtpClient;
use tracing::instrument;

/// Email when SMTP is configured, otherwise log notifications.
pub fn build_dispatcher(
	email: Option<&NotificationEmailConfig>,
) -> Result<Arc<dyn NotificationDispatcher>, NotifyError> {
	match email {
		Some(email) => {
			let client = SmtpClient::new(email.smtp.clone())?;
			tracing::info!(
				host = %email.smtp.host,
				recipients = email.recipients.len(),
				"Issue notifications will be emailed"
			);
			Ok(Arc::new(EmailDispatcher::new(client, email.recipients.clone())?))
		}
		None => {
			tracing::info!("SMTP not configured, issue notifications will be logged");
			Ok(Arc::new(TracingDispatcher))
		}
	}
}

pub struct OutboxRelayJob {
	relay: OutboxRelay<SqliteIssueRepository>,
	batch_size: u32,
}

impl OutboxRelayJob {
	pub fn new(relay: OutboxRelay<SqliteIssueRepository>, batch_size: u32) -> Self {
		Self { relay, batch_size }
	}
}

#[async_trait]
impl Job for OutboxRelayJob {
	fn id(&self) -> &str {
		"outbox-relay"
	}

	fn name(&self) -> &str {
		"Notification Outbox Relay"
	}

	fn description(&self) -> &str {
		"Deliver queued new-issue and reopened-issue notifications"
	}

	#[instrument(skip(self, ctx), fields(job_id = "outbox-relay"))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.check_cancelled()?;

		let report = self
			.relay
			.run_once(self.batch_size)
			.await
			.map_err(|e| JobError::retryable(e.to_string()))?;

		Ok(JobOutput {
			message: format!(
				"Delivered {} notifications, {} failed",
				report.delivered, report.failed
			),
			metadata: Some(serde_json::json!({
				"delivered": report.delivered,
				"failed": report.failed,
			})),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beacon_server_issues::IssueRepository;
	use beacon_issues_core::NewOccurrence;
	use beacon_server_jobs::{CancellationToken, TriggerSource};

	fn ctx() -> JobContext {
		JobContext::new("run-1", TriggerSource::Manual, CancellationToken::new())
	}

	#[tokio::test]
	async fn test_relay_job_delivers_pending() {
		let pool = sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect(":memory:")
			.await
			.unwrap();
		beacon_server_issues::run_migrations(&pool).await.unwrap();
		let repo = Arc::new(SqliteIssueRepository::new(pool));
		repo
			.log_error(&NewOccurrence::new("NullPointerException", "obj is null"))
			.await
			.unwrap();

		let job = OutboxRelayJob::new(
			OutboxRelay::new(Arc::clone(&repo), Arc::new(TracingDispatcher)),
			10,
		);
		let output = job.run(&ctx()).await.unwrap();
		assert_eq!(output.metadata.unwrap()["delivered"], 1);

		let output = job.run(&ctx()).await.unwrap();
		assert_eq!(output.metadata.unwrap()["delivered"], 0);
	}

	#[test]
	fn test_dispatcher_without_smtp_is_tracing() {
		assert!(build_dispatcher(None).is_ok());
	}
}
