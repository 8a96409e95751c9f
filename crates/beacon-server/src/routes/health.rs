// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
	api::AppState,
	health::{self, HealthComponents, HealthResponse, HealthStatus},
	version,
};

/// GET /health - Database and background job health.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let components = HealthComponents {
		database: health::check_database(&state.pool).await,
		jobs: health::check_jobs(state.job_scheduler.as_deref()),
	};

	let status = health::aggregate_status(&components);
	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		version: version::VERSION,
		components,
	};

	let http_status = match status {
		HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}
