// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue lifecycle state machine.
//!
//! Both kinds of status change go through [`apply_event`]: a recurrence of the
//! error (which reopens settled issues) and an explicit admin transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::issue::{Issue, IssueStatus};

/// Something that happened to an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
	/// The same fingerprint was logged again.
	NewOccurrence { seen_at: DateTime<Utc> },
	/// An admin moved the issue to `to`.
	AdminTransition {
		to: IssueStatus,
		resolved_by: Option<String>,
	},
}

/// What [`apply_event`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
	/// Recurrence of an open issue.
	Recurred,
	/// Recurrence of a resolved or closed issue, now open again.
	Reopened,
	/// Admin transition into `to`, restamping resolution when `from == to`.
	StatusChanged { from: IssueStatus, to: IssueStatus },
	/// Admin reopened an issue that was already open.
	Unchanged,
}

/// How a logged error landed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
	Created,
	Recurred,
	Reopened,
}

impl IngestOutcome {
	/// Outcomes that are worth telling an admin about.
	pub fn is_notable(&self) -> bool {
		matches!(self, Self::Created | Self::Reopened)
	}
}

impl fmt::Display for IngestOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Created => write!(f, "created"),
			Self::Recurred => write!(f, "recurred"),
			Self::Reopened => write!(f, "reopened"),
		}
	}
}

/// The issue after an event, plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
	pub issue: Issue,
	pub outcome: TransitionOutcome,
}

impl Transition {
	/// The ingest outcome for recurrence transitions, `None` for admin ones.
	pub fn ingest_outcome(&self) -> Option<IngestOutcome> {
		match self.outcome {
			TransitionOutcome::Recurred => Some(IngestOutcome::Recurred),
			TransitionOutcome::Reopened => Some(IngestOutcome::Reopened),
			TransitionOutcome::StatusChanged { .. } | TransitionOutcome::Unchanged => None,
		}
	}
}

/// Fold `event` into `issue`.
///
/// Every event is valid in every state. The returned issue has its revision
/// bumped and `updated_at` set to `now`, except for [`TransitionOutcome::Unchanged`].
pub fn apply_event(issue: &Issue, event: LifecycleEvent, now: DateTime<Utc>) -> Transition {
	let mut next = issue.clone();

	let outcome = match event {
		LifecycleEvent::NewOccurrence { seen_at } => {
			next.occurrence_count += 1;
			next.last_seen_at = next.last_seen_at.max(seen_at);

			if issue.status.is_settled() {
				next.status = IssueStatus::Open;
				next.resolved_by = None;
				next.resolved_at = None;
				TransitionOutcome::Reopened
			} else {
				TransitionOutcome::Recurred
			}
		}
		LifecycleEvent::AdminTransition { to, resolved_by } => {
			let from = issue.status;
			if to.is_settled() {
				next.status = to;
				next.resolved_at = Some(now);
				next.resolved_by = resolved_by.or_else(|| issue.resolved_by.clone());
				TransitionOutcome::StatusChanged { from, to }
			} else if from == IssueStatus::Open {
				return Transition {
					issue: next,
					outcome: TransitionOutcome::Unchanged,
				};
			} else {
				next.status = IssueStatus::Open;
				next.resolved_by = None;
				next.resolved_at = None;
				TransitionOutcome::StatusChanged { from, to }
			}
		}
	};

	next.revision += 1;
	next.updated_at = now;

	Transition {
		issue: next,
		outcome,
	}
}
