// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue ingestion and admin issue handlers.

use axum::{
	extract::{
		rejection::{JsonRejection, QueryRejection},
		Path, Query, State,
	},
	http::StatusCode,
	Json,
};
use beacon_issues_core::{Issue, IssueEvent, IssueFilter, IssueId, IssueLevel, IssueStats, IssueStatus};
use beacon_server_issues::{IssuePage, LogErrorRequest};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::AppState;
use crate::auth_middleware::RequireAuth;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct LogErrorResponse {
	pub issue_id: IssueId,
}

/// Query parameters for listing issues. Status and level are parsed by hand
/// so unknown values get the usual JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListIssuesParams {
	pub status: Option<String>,
	pub level: Option<String>,
	pub search: Option<String>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

impl ListIssuesParams {
	fn into_filter(self) -> Result<IssueFilter, ApiError> {
		let status = non_empty(self.status)
			.map(|s| s.parse::<IssueStatus>())
			.transpose()
			.map_err(|e| ApiError::BadRequest(e.to_string()))?;
		let level = non_empty(self.level)
			.map(|s| s.parse::<IssueLevel>())
			.transpose()
			.map_err(|e| ApiError::BadRequest(e.to_string()))?;

		Ok(IssueFilter {
			status,
			level,
			search: non_empty(self.search),
			limit: self.limit,
			offset: self.offset,
		})
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsParams {
	pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: IssueStatus,
	#[serde(default)]
	pub resolved_by: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

fn parse_issue_id(raw: &str) -> Result<IssueId, ApiError> {
	raw
		.parse()
		.map_err(|_| ApiError::BadRequest(format!("invalid issue id '{raw}'")))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
	payload
		.map(|Json(body)| body)
		.map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
	params
		.map(|Query(params)| params)
		.map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /api/issues - Record an error occurrence.
#[instrument(skip(state, principal, payload), fields(principal = %principal.id))]
pub async fn log_error(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	payload: Result<Json<LogErrorRequest>, JsonRejection>,
) -> Result<Json<LogErrorResponse>, ApiError> {
	let request = json_body(payload)?;
	let issue_id = state.issues.log_error(&principal, request).await?;
	Ok(Json(LogErrorResponse { issue_id }))
}

/// GET /api/admin/issues - Filtered, paginated issue list.
#[instrument(skip(state, principal, params), fields(principal = %principal.id))]
pub async fn list_issues(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	params: Result<Query<ListIssuesParams>, QueryRejection>,
) -> Result<Json<IssuePage>, ApiError> {
	let filter = query_params(params)?.into_filter()?;
	let page = state.issues.get_issues(&principal, filter).await?;
	Ok(Json(page))
}

/// GET /api/admin/issues/stats
#[instrument(skip(state, principal), fields(principal = %principal.id))]
pub async fn get_issue_stats(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
) -> Result<Json<IssueStats>, ApiError> {
	Ok(Json(state.issues.get_issue_stats(&principal).await?))
}

/// GET /api/admin/issues/{id}
#[instrument(skip(state, principal), fields(principal = %principal.id))]
pub async fn get_issue(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
	let id = parse_issue_id(&id)?;
	state
		.issues
		.get_issue_by_id(&principal, id)
		.await?
		.map(Json)
		.ok_or_else(ApiError::issue_not_found)
}

/// GET /api/admin/issues/{id}/events - Newest occurrences first.
#[instrument(skip(state, principal, params), fields(principal = %principal.id))]
pub async fn list_issue_events(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	Path(id): Path<String>,
	params: Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<Json<Vec<IssueEvent>>, ApiError> {
	let id = parse_issue_id(&id)?;
	let params = query_params(params)?;
	state
		.issues
		.list_issue_events(&principal, id, params.limit)
		.await?
		.map(Json)
		.ok_or_else(ApiError::issue_not_found)
}

/// POST /api/admin/issues/{id}/status - Resolve, close or reopen an issue.
#[instrument(skip(state, principal, payload), fields(principal = %principal.id))]
pub async fn update_issue_status(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	Path(id): Path<String>,
	payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Issue>, ApiError> {
	let id = parse_issue_id(&id)?;
	let request = json_body(payload)?;

	let updated = state
		.issues
		.update_issue_status(&principal, id, request.status, request.resolved_by)
		.await?;
	if !updated {
		return Err(ApiError::issue_not_found());
	}

	state
		.issues
		.get_issue_by_id(&principal, id)
		.await?
		.map(Json)
		.ok_or_else(ApiError::issue_not_found)
}

/// DELETE /api/admin/issues/{id} - Remove an issue and its events.
#[instrument(skip(state, principal), fields(principal = %principal.id))]
pub async fn delete_issue(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let id = parse_issue_id(&id)?;
	if state.issues.delete_issue(&principal, id).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ApiError::issue_not_found())
	}
}
