// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use beacon_issues_core::IssueError;
use beacon_server_config::ServerConfig;
use beacon_server_issues::{IssueService, PageLimits, SqliteIssueRepository};
use beacon_server_jobs::JobScheduler;
use sqlx::SqlitePool;

use crate::auth_middleware::TokenRegistry;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub issues: IssueService<SqliteIssueRepository>,
	pub tokens: Arc<TokenRegistry>,
	pub job_scheduler: Option<Arc<JobScheduler>>,
}

impl AppState {
	pub fn repository(&self) -> Arc<SqliteIssueRepository> {
		Arc::clone(self.issues.repository())
	}
}

/// Build the state shared by all handlers. Fails when a configured token
/// names an unknown role.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> Result<AppState, IssueError> {
	let limits = PageLimits {
		default_page_size: config.issues.default_page_size,
		max_page_size: config.issues.max_page_size,
	};
	let repo = Arc::new(
		SqliteIssueRepository::new(pool.clone())
			.with_page_sizes(limits.default_page_size, limits.max_page_size),
	);
	let tokens = TokenRegistry::from_config(&config.auth)?;

	Ok(AppState {
		pool,
		issues: IssueService::new(repo).with_page_limits(limits),
		tokens: Arc::new(tokens),
		job_scheduler: None,
	})
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/issues", post(routes::issues::log_error))
		.route("/api/admin/issues", get(routes::issues::list_issues))
		.route("/api/admin/issues/stats", get(routes::issues::get_issue_stats))
		.route(
			"/api/admin/issues/{id}",
			get(routes::issues::get_issue).delete(routes::issues::delete_issue),
		)
		.route(
			"/api/admin/issues/{id}/events",
			get(routes::issues::list_issue_events),
		)
		.route(
			"/api/admin/issues/{id}/status",
			post(routes::issues::update_issue_status),
		)
		.route(
			"/api/admin/settings",
			get(routes::settings::get_settings).put(routes::settings::update_settings),
		)
		.with_state(state)
}
