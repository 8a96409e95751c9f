// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for issue tracking.

use thiserror::Error;

/// Errors that can occur in the issue tracking core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("invalid issue status: {0}")]
	InvalidIssueStatus(String),

	#[error("invalid issue level: {0}")]
	InvalidIssueLevel(String),

	#[error("invalid notification kind: {0}")]
	InvalidNotificationKind(String),

	#[error("invalid role: {0}")]
	InvalidRole(String),
}

/// Result type for issue tracking operations.
pub type Result<T> = std::result::Result<T, IssueError>;
