// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for issue server operations.

use beacon_issues_core::IssueError;
use thiserror::Error;

/// Errors that can occur in issue server operations.
#[derive(Debug, Error)]
pub enum IssueServerError {
	#[error("invalid input: {0}")]
	InvalidInput(#[from] IssueError),

	#[error("admin role required")]
	Forbidden,

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid UUID: {0}")]
	InvalidUuid(#[from] uuid::Error),

	#[error("invalid datetime: {0}")]
	InvalidDateTime(String),

	#[error("parse error: {0}")]
	Parse(String),
}

/// Result type for issue server operations.
pub type Result<T> = std::result::Result<T, IssueServerError>;
