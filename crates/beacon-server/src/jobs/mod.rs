// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background jobs for the issue store.

mod event_cleanup;
mod outbox_relay;

pub use event_cleanup::EventCleanupJob;
pub use outbox_relay::{build_dispatcher, OutboxRelayJob};

use std::sync::Arc;
use std::time::Duration;

use beacon_server_config::IssuesConfig;
use beacon_server_issues::{NotificationDispatcher, OutboxRelay, SqliteIssueRepository};
use beacon_server_jobs::JobScheduler;

/// Register the outbox relay and, unless retention is disabled, event cleanup.
pub fn register_issue_jobs(
	scheduler: &mut JobScheduler,
	repo: Arc<SqliteIssueRepository>,
	dispatcher: Arc<dyn NotificationDispatcher>,
	config: &IssuesConfig,
) {
	let relay =
		OutboxRelay::new(Arc::clone(&repo), dispatcher).with_max_attempts(config.outbox_max_attempts);
	scheduler.register_periodic(
		Arc::new(OutboxRelayJob::new(relay, config.outbox_batch_size)),
		Duration::from_secs(config.outbox_poll_interval_secs),
	);

	if config.event_retention_days > 0 {
		scheduler.register_periodic(
			Arc::new(EventCleanupJob::new(repo, config.event_retention_days)),
			Duration::from_secs(config.cleanup_interval_secs),
		);
	} else {
		tracing::info!("Event retention disabled, keeping all issue events");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beacon_server_issues::TracingDispatcher;

	async fn repo() -> Arc<SqliteIssueRepository> {
		let pool = sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect(":memory:")
			.await
			.unwrap();
		beacon_server_issues::run_migrations(&pool).await.unwrap();
		Arc::new(SqliteIssueRepository::new(pool))
	}

	#[tokio::test]
	async fn test_registers_both_jobs() {
		let mut scheduler = JobScheduler::new();
		register_issue_jobs(
			&mut scheduler,
			repo().await,
			Arc::new(TracingDispatcher),
			&IssuesConfig::default(),
		);
		assert_eq!(scheduler.job_ids(), vec!["event-cleanup", "outbox-relay"]);
	}

	#[tokio::test]
	async fn test_zero_retention_skips_cleanup() {
		let mut scheduler = JobScheduler::new();
		let config = IssuesConfig {
			event_retention_days: 0,
			..Default::default()
		};
		register_issue_jobs(&mut scheduler, repo().await, Arc::new(TracingDispatcher), &config);
		assert_eq!(scheduler.job_ids(), vec!["outbox-relay"]);
	}
}
