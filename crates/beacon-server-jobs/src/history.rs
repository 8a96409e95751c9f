// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory record of job runs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::types::{JobRun, JobStatus};

#[derive(Debug, Default)]
struct JobRecord {
	last_run: Option<JobRun>,
	consecutive_failures: u32,
}

/// Latest run and failure streak per job.
#[derive(Debug, Default)]
pub struct RunHistory {
	records: Mutex<HashMap<String, JobRecord>>,
}

impl RunHistory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_run_start(&self, run: &JobRun) {
		let mut records = self.lock();
		records.entry(run.job_id.clone()).or_default().last_run = Some(run.clone());
	}

	pub fn record_run_complete(
		&self,
		job_id: &str,
		run_id: &str,
		status: JobStatus,
		error_message: Option<String>,
		metadata: Option<serde_json::Value>,
	) {
		let mut records = self.lock();
		let record = records.entry(job_id.to_string()).or_default();

		match status {
			JobStatus::Failed => record.consecutive_failures += 1,
			JobStatus::Succeeded => record.consecutive_failures = 0,
			JobStatus::Running | JobStatus::Cancelled => {}
		}

		if let Some(run) = record.last_run.as_mut().filter(|r| r.id == run_id) {
			let now = Utc::now();
			run.status = status;
			run.completed_at = Some(now);
			run.duration_ms = Some((now - run.started_at).num_milliseconds());
			run.error_message = error_message;
			run.metadata = metadata;
		}
	}

	pub fn last_run(&self, job_id: &str) -> Option<JobRun> {
		self.lock().get(job_id).and_then(|r| r.last_run.clone())
	}

	pub fn consecutive_failures(&self, job_id: &str) -> u32 {
		self
			.lock()
			.get(job_id)
			.map(|r| r.consecutive_failures)
			.unwrap_or(0)
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, JobRecord>> {
		// Counters stay valid after a poisoning panic.
		self.records.lock().unwrap_or_else(|e| e.into_inner())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::TriggerSource;

	fn run(id: &str) -> JobRun {
		JobRun {
			id: id.to_string(),
			job_id: "job-1".to_string(),
			status: JobStatus::Running,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			error_message: None,
			retry_count: 0,
			triggered_by: TriggerSource::Schedule,
			metadata: None,
		}
	}

	#[test]
	fn test_unknown_job_has_no_history() {
		let history = RunHistory::new();
		assert!(history.last_run("job-1").is_none());
		assert_eq!(history.consecutive_failures("job-1"), 0);
	}

	#[test]
	fn test_completion_updates_last_run() {
		let history = RunHistory::new();
		history.record_run_start(&run("run-1"));
		history.record_run_complete("job-1", "run-1", JobStatus::Succeeded, None, None);

		let last = history.last_run("job-1").unwrap();
		assert_eq!(last.status, JobStatus::Succeeded);
		assert!(last.completed_at.is_some());
		assert!(last.duration_ms.is_some());
	}

	#[test]
	fn test_failure_streak_resets_on_success() {
		let history = RunHistory::new();
		for id in ["run-1", "run-2"] {
			history.record_run_start(&run(id));
			history.record_run_complete("job-1", id, JobStatus::Failed, Some("boom".to_string()), None);
		}
		assert_eq!(history.consecutive_failures("job-1"), 2);
		assert_eq!(
			history.last_run("job-1").unwrap().error_message.as_deref(),
			Some("boom")
		);

		history.record_run_start(&run("run-3"));
		history.record_run_complete("job-1", "run-3", JobStatus::Succeeded, None, None);
		assert_eq!(history.consecutive_failures("job-1"), 0);
	}

	#[test]
	fn test_cancelled_does_not_change_streak() {
		let history = RunHistory::new();
		history.record_run_start(&run("run-1"));
		history.record_run_complete("job-1", "run-1", JobStatus::Failed, None, None);
		history.record_run_start(&run("run-2"));
		history.record_run_complete("job-1", "run-2", JobStatus::Cancelled, None, None);
		assert_eq!(history.consecutive_failures("job-1"), 1);
	}
}
