// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue actions gated by the caller's role.
//!
//! Error reports may come from any authenticated principal. Everything else
//! is an admin action and fails with [`IssueServerError::Forbidden`] for
//! other roles.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use beacon_issues_core::{
	AdminSettings, Issue, IssueEvent, IssueFilter, IssueId, IssueLevel, IssueStats, IssueStatus,
	NewOccurrence, Principal,
};

use crate::error::{IssueServerError, Result};
use crate::repository::IssueRepository;

/// Events returned per issue when the caller does not ask for a limit.
pub const DEFAULT_EVENT_LIMIT: u32 = 50;
pub const MAX_EVENT_LIMIT: u32 = 500;

/// An error report as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogErrorRequest {
	pub title: String,
	pub message: String,
	#[serde(default)]
	pub stack: Option<String>,
	#[serde(default)]
	pub level: Option<IssueLevel>,
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub request_path: Option<String>,
	#[serde(default)]
	pub metadata: Option<serde_json::Value>,
}

impl LogErrorRequest {
	pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			message: message.into(),
			stack: None,
			level: None,
			user_id: None,
			request_path: None,
			metadata: None,
		}
	}

	/// The occurrence to store, attributed to `principal` unless the report
	/// names a user itself.
	pub fn into_occurrence(self, principal: &Principal) -> NewOccurrence {
		NewOccurrence {
			title: self.title,
			message: self.message,
			stack: self.stack.filter(|s| !s.trim().is_empty()),
			level: self.level.unwrap_or_default(),
			user_id: self.user_id.or_else(|| Some(principal.id.clone())),
			request_path: self.request_path,
			metadata: self.metadata.unwrap_or(serde_json::Value::Null),
			occurred_at: Utc::now(),
		}
	}
}

/// One page of issues plus the total matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePage {
	pub issues: Vec<Issue>,
	pub total: u64,
	pub limit: u32,
	pub offset: u32,
}

/// Page size bounds applied to listing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
	pub default_page_size: u32,
	pub max_page_size: u32,
}

impl Default for PageLimits {
	fn default() -> Self {
		Self {
			default_page_size: beacon_issues_core::DEFAULT_PAGE_SIZE,
			max_page_size: beacon_issues_core::MAX_PAGE_SIZE,
		}
	}
}

pub struct IssueService<R: IssueRepository + ?Sized> {
	repo: Arc<R>,
	limits: PageLimits,
}

impl<R: IssueRepository + ?Sized> Clone for IssueService<R> {
	fn clone(&self) -> Self {
		Self {
			repo: Arc::clone(&self.repo),
			limits: self.limits,
		}
	}
}

impl<R: IssueRepository + ?Sized> IssueService<R> {
	pub fn new(repo: Arc<R>) -> Self {
		Self {
			repo,
			limits: PageLimits::default(),
		}
	}

	pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
		self.limits = limits;
		self
	}

	pub fn repository(&self) -> &Arc<R> {
		&self.repo
	}

	#[instrument(skip(self, principal, request), fields(principal = %principal.id))]
	pub async fn log_error(&self, principal: &Principal, request: LogErrorRequest) -> Result<IssueId> {
		let occurrence = request.into_occurrence(principal);
		let logged = self.repo.log_error(&occurrence).await?;
		Ok(logged.issue_id)
	}

	/// Returns `false` when the issue does not exist.
	#[instrument(skip(self, principal, resolved_by), fields(principal = %principal.id, issue_id = %id, status = %status))]
	pub async fn update_issue_status(
		&self,
		principal: &Principal,
		id: IssueId,
		status: IssueStatus,
		resolved_by: Option<String>,
	) -> Result<bool> {
		require_admin(principal)?;
		let resolved_by = resolved_by.or_else(|| Some(principal.id.clone()));
		self.repo.update_issue_status(id, status, resolved_by).await
	}

	#[instrument(skip(self, principal, filter), fields(principal = %principal.id))]
	pub async fn get_issues(&self, principal: &Principal, filter: IssueFilter) -> Result<IssuePage> {
		require_admin(principal)?;

		let limit = filter.limit_clamped(self.limits.default_page_size, self.limits.max_page_size);
		let offset = filter.offset_or_default();
		let filter = IssueFilter {
			limit: Some(limit),
			offset: Some(offset),
			..filter
		};

		let (issues, total) = self.repo.list_issues_with_total(&filter).await?;

		Ok(IssuePage {
			issues,
			total,
			limit,
			offset,
		})
	}

	#[instrument(skip(self, principal), fields(principal = %principal.id, issue_id = %id))]
	pub async fn get_issue_by_id(&self, principal: &Principal, id: IssueId) -> Result<Option<Issue>> {
		require_admin(principal)?;
		self.repo.get_issue_by_id(id).await
	}

	#[instrument(skip(self, principal), fields(principal = %principal.id))]
	pub async fn get_issue_stats(&self, principal: &Principal) -> Result<IssueStats> {
		require_admin(principal)?;
		self.repo.get_issue_stats().await
	}

	/// Events for an issue, newest first. `None` when the issue does not exist.
	#[instrument(skip(self, principal), fields(principal = %principal.id, issue_id = %id))]
	pub async fn list_issue_events(
		&self,
		principal: &Principal,
		id: IssueId,
		limit: Option<u32>,
	) -> Result<Option<Vec<IssueEvent>>> {
		require_admin(principal)?;

		if self.repo.get_issue_by_id(id).await?.is_none() {
			return Ok(None);
		}

		let limit = limit.unwrap_or(DEFAULT_EVENT_LIMIT).clamp(1, MAX_EVENT_LIMIT);
		self.repo.list_events_for_issue(id, limit).await.map(Some)
	}

	#[instrument(skip(self, principal), fields(principal = %principal.id, issue_id = %id))]
	pub async fn delete_issue(&self, principal: &Principal, id: IssueId) -> Result<bool> {
		require_admin(principal)?;
		self.repo.delete_issue(id).await
	}

	#[instrument(skip(self, principal), fields(principal = %principal.id))]
	pub async fn get_admin_settings(&self, principal: &Principal) -> Result<AdminSettings> {
		require_admin(principal)?;
		self.repo.get_admin_settings().await
	}

	#[instrument(skip(self, principal), fields(principal = %principal.id))]
	pub async fn update_admin_settings(
		&self,
		principal: &Principal,
		notifications_enabled: bool,
		notification_min_level: IssueLevel,
	) -> Result<AdminSettings> {
		require_admin(principal)?;
		self
			.repo
			.update_admin_settings(
				notifications_enabled,
				notification_min_level,
				Some(principal.id.clone()),
			)
			.await
	}
}

fn require_admin(principal: &Principal) -> Result<()> {
	if principal.is_admin() {
		Ok(())
	} else {
		tracing::warn!(principal = %principal.id, role = %principal.role, "admin action denied");
		Err(IssueServerError::Forbidden)
	}
}
