// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin notification settings handlers.

use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};
use beacon_issues_core::{AdminSettings, IssueLevel};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::AppState;
use crate::auth_middleware::RequireAuth;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
	pub notifications_enabled: bool,
	pub notification_min_level: IssueLevel,
}

/// GET /api/admin/settings
#[instrument(skip(state, principal), fields(principal = %principal.id))]
pub async fn get_settings(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
) -> Result<Json<AdminSettings>, ApiError> {
	Ok(Json(state.issues.get_admin_settings(&principal).await?))
}

/// PUT /api/admin/settings
#[instrument(skip(state, principal, payload), fields(principal = %principal.id))]
pub async fn update_settings(
	State(state): State<AppState>,
	RequireAuth(principal): RequireAuth,
	payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<AdminSettings>, ApiError> {
	let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
	let settings = state
		.issues
		.update_admin_settings(
			&principal,
			request.notifications_enabled,
			request.notification_min_level,
		)
		.await?;
	Ok(Json(settings))
}
