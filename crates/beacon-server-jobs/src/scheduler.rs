// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{HealthState, JobHealthStatus, JobsHealthStatus};
use crate::history::RunHistory;
use crate::job::Job;
use crate::types::{JobRun, JobStatus, TriggerSource};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;
const MAX_RETRIES: u32 = 3;

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
	cancellation_token: CancellationToken,
}

/// Runs each registered job on its own interval until shutdown.
///
/// Retryable failures are retried with exponential backoff before the run
/// is recorded as failed. The first tick is one full interval after
/// [`JobScheduler::start`].
pub struct JobScheduler {
	jobs: BTreeMap<String, RegisteredJob>,
	history: Arc<RunHistory>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl JobScheduler {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: BTreeMap::new(),
			history: Arc::new(RunHistory::new()),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	/// Registering the same id twice replaces the earlier job.
	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		let id = job.id().to_string();
		info!(job_id = %id, interval_secs = interval.as_secs(), "Registered periodic job");
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				interval,
				cancellation_token: CancellationToken::new(),
			},
		);
	}

	#[instrument(skip(self))]
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let job = Arc::clone(&registered.job);
			let history = Arc::clone(&self.history);
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let cancellation_token = registered.cancellation_token.clone();
			let period = registered.interval;
			let job_id = job_id.clone();

			handles.push(tokio::spawn(async move {
				let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
				ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

				loop {
					tokio::select! {
						_ = ticker.tick() => {
							if cancellation_token.is_cancelled() {
								break;
							}
							// Failures are already recorded and logged.
							let _ = run_job_with_retry(
								&job,
								&history,
								TriggerSource::Schedule,
								&cancellation_token,
							).await;
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "Shutting down periodic job");
							break;
						}
					}
				}
			}));
		}

		info!(job_count = handles.len(), "Job scheduler started");
	}

	/// Run a job immediately, outside its schedule. Returns the run id.
	#[instrument(skip(self))]
	pub async fn trigger_job(&self, job_id: &str, triggered_by: TriggerSource) -> Result<String> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		run_job_with_retry(
			&registered.job,
			&self.history,
			triggered_by,
			&registered.cancellation_token,
		)
		.await
	}

	/// Cancel in-flight runs and wait for every job task to exit.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		for registered in self.jobs.values() {
			registered.cancellation_token.cancel();
		}
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			if let Err(e) = handle.await {
				warn!(error = %e, "Job task ended abnormally");
			}
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.keys().cloned().collect()
	}

	pub fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;

		let last_run = self.history.last_run(job_id);
		let consecutive_failures = self.history.consecutive_failures(job_id);

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			interval_secs: registered.interval.as_secs(),
			status: HealthState::from_last_run(last_run.as_ref(), consecutive_failures),
			last_run: last_run.map(Into::into),
			consecutive_failures,
		})
	}

	pub fn health_status(&self) -> JobsHealthStatus {
		JobsHealthStatus::from_jobs(
			self
				.jobs
				.keys()
				.filter_map(|id| self.job_status(id))
				.collect(),
		)
	}
}

async fn run_job_with_retry(
	job: &Arc<dyn Job>,
	history: &RunHistory,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> Result<String> {
	let run_id = uuid::Uuid::now_v7().to_string();
	history.record_run_start(&JobRun {
		id: run_id.clone(),
		job_id: job.id().to_string(),
		status: JobStatus::Running,
		started_at: Utc::now(),
		completed_at: None,
		duration_ms: None,
		error_message: None,
		retry_count: 0,
		triggered_by,
		metadata: None,
	});

	let mut retry_count = 0u32;
	loop {
		let source = if retry_count > 0 {
			TriggerSource::Retry
		} else {
			triggered_by
		};
		let ctx = JobContext::new(run_id.clone(), source, cancellation_token.clone());

		let err = match job.run(&ctx).await {
			Ok(output) => {
				history.record_run_complete(
					job.id(),
					&run_id,
					JobStatus::Succeeded,
					None,
					output.metadata,
				);
				info!(job_id = %job.id(), run_id = %run_id, message = %output.message, "Job completed successfully");
				return Ok(run_id);
			}
			Err(e) => e,
		};

		match err {
			JobError::Failed { ref message, retryable: true } if retry_count < MAX_RETRIES => {
				retry_count += 1;
				let delay_secs = calculate_backoff_delay(retry_count);
				warn!(
					job_id = %job.id(),
					run_id = %run_id,
					retry_count,
					delay_secs,
					error = %message,
					"Job failed, retrying"
				);

				tokio::select! {
					_ = tokio::time::sleep(Duration::from_secs(delay_secs)) => {}
					_ = cancellation_token.cancelled() => {
						history.record_run_complete(job.id(), &run_id, JobStatus::Cancelled, None, None);
						info!(job_id = %job.id(), run_id = %run_id, "Job cancelled during backoff");
						return Err(JobError::Cancelled);
					}
				}
			}
			JobError::Cancelled => {
				history.record_run_complete(job.id(), &run_id, JobStatus::Cancelled, None, None);
				info!(job_id = %job.id(), run_id = %run_id, "Job cancelled");
				return Err(JobError::Cancelled);
			}
			err => {
				let message = err.to_string();
				history.record_run_complete(job.id(), &run_id, JobStatus::Failed, Some(message.clone()), None);
				warn!(job_id = %job.id(), run_id = %run_id, retry_count, error = %message, "Job failed");
				return Err(err);
			}
		}
	}
}

pub(crate) fn calculate_backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}
