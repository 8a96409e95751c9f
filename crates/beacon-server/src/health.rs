// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Component health checks.

use std::time::Instant;

use beacon_server_jobs::{HealthState, JobScheduler, JobsHealthStatus};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

impl From<HealthState> for HealthStatus {
	fn from(state: HealthState) -> Self {
		match state {
			HealthState::Healthy => HealthStatus::Healthy,
			HealthState::Degraded => HealthStatus::Degraded,
			HealthState::Unhealthy => HealthStatus::Unhealthy,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
	pub status: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthComponents {
	pub database: DatabaseHealth,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub jobs: Option<JobsHealthStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub version: &'static str,
	pub components: HealthComponents,
}

pub async fn check_database(pool: &SqlitePool) -> DatabaseHealth {
	let start = Instant::now();
	let result = sqlx::query_scalar::<_, i64>("SELECT 1")
		.fetch_one(pool)
		.await;
	let latency_ms = start.elapsed().as_millis() as u64;

	match result {
		Ok(_) => DatabaseHealth {
			status: HealthStatus::Healthy,
			latency_ms,
			error: None,
		},
		Err(e) => {
			tracing::error!(error = %e, "database health check failed");
			DatabaseHealth {
				status: HealthStatus::Unhealthy,
				latency_ms,
				error: Some(e.to_string()),
			}
		}
	}
}

pub fn check_jobs(scheduler: Option<&JobScheduler>) -> Option<JobsHealthStatus> {
	scheduler.map(JobScheduler::health_status)
}

/// The database decides availability. Failing jobs only degrade.
pub fn aggregate_status(components: &HealthComponents) -> HealthStatus {
	if components.database.status == HealthStatus::Unhealthy {
		return HealthStatus::Unhealthy;
	}
	match components.jobs.as_ref().map(|j| j.status) {
		Some(HealthState::Degraded | HealthState::Unhealthy) => HealthStatus::Degraded,
		_ => HealthStatus::Healthy,
	}
}
