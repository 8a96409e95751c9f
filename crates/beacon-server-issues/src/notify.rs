// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of queued issue notifications.
//!
//! `log_error` only appends rows to the outbox. The [`OutboxRelay`] drains it
//! in the background and hands each row to a [`NotificationDispatcher`].

use std::sync::Arc;

use async_trait::async_trait;
use beacon_issues_core::Notification;
use beacon_server_smtp::{escape_html, OutgoingEmail, SmtpClient, SmtpError};
use thiserror::Error;
use tracing::instrument;

use crate::error::Result;
use crate::repository::IssueRepository;

/// Rows that failed this many times are left in the outbox undelivered.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("smtp error: {0}")]
	Smtp(#[from] SmtpError),

	#[error("no notification recipients configured")]
	NoRecipients,

	#[error("dispatch failed: {0}")]
	Dispatch(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
	async fn dispatch(&self, notification: &Notification) -> std::result::Result<(), NotifyError>;
}

/// Writes notifications to the log. Used when no SMTP server is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDispatcher;

#[async_trait]
impl NotificationDispatcher for TracingDispatcher {
	async fn dispatch(&self, notification: &Notification) -> std::result::Result<(), NotifyError> {
		tracing::info!(
			issue_id = %notification.issue_id,
			kind = %notification.kind,
			level = %notification.level,
			occurrence_count = notification.occurrence_count,
			subject = %notification.subject(),
			"issue notification"
		);
		Ok(())
	}
}

/// Emails each notification to all configured recipients in one message.
pub struct EmailDispatcher {
	client: SmtpClient,
	recipients: Vec<String>,
}

impl EmailDispatcher {
	pub fn new(client: SmtpClient, recipients: Vec<String>) -> std::result::Result<Self, NotifyError> {
		if recipients.is_empty() {
			return Err(NotifyError::NoRecipients);
		}
		Ok(Self { client, recipients })
	}
}

#[async_trait]
impl NotificationDispatcher for EmailDispatcher {
	#[instrument(skip(self, notification), fields(issue_id = %notification.issue_id, kind = %notification.kind))]
	async fn dispatch(&self, notification: &Notification) -> std::result::Result<(), NotifyError> {
		let body_text = notification.body();
		let email = OutgoingEmail {
			to: self.recipients.clone(),
			subject: notification.subject(),
			body_html: format!("<pre>{}</pre>", escape_html(&body_text)),
			body_text,
		};
		self.client.send(&email).await?;
		Ok(())
	}
}

/// Counts from one pass over the outbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
	pub delivered: usize,
	pub failed: usize,
}

pub struct OutboxRelay<R: IssueRepository + ?Sized> {
	repo: Arc<R>,
	dispatcher: Arc<dyn NotificationDispatcher>,
	max_attempts: u32,
}

impl<R: IssueRepository + ?Sized> OutboxRelay<R> {
	pub fn new(repo: Arc<R>, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
		Self {
			repo,
			dispatcher,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
		}
	}

	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts.max(1);
		self
	}

	/// Deliver up to `batch` pending notifications in outbox order.
	///
	/// Dispatch failures are recorded on the row and logged. Only store
	/// errors are returned.
	#[instrument(skip(self))]
	pub async fn run_once(&self, batch: u32) -> Result<RelayReport> {
		let pending = self
			.repo
			.list_pending_notifications(batch, self.max_attempts)
			.await?;

		let mut report = RelayReport::default();
		for notification in &pending {
			match self.dispatcher.dispatch(notification).await {
				Ok(()) => {
					self.repo.mark_notification_delivered(notification.id).await?;
					report.delivered += 1;
				}
				Err(e) => {
					let attempts = notification.attempts + 1;
					tracing::warn!(
						notification_id = notification.id,
						issue_id = %notification.issue_id,
						attempts,
						max_attempts = self.max_attempts,
						error = %e,
						"notification delivery failed"
					);
					self
						.repo
						.record_notification_failure(notification.id, &e.to_string())
						.await?;
					report.failed += 1;
				}
			}
		}

		if report.delivered + report.failed > 0 {
			tracing::debug!(
				delivered = report.delivered,
				failed = report.failed,
				"outbox relay pass complete"
			);
		}
		Ok(report)
	}
}
