// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
	#[error("job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("job cancelled")]
	Cancelled,

	#[error("job not found: {0}")]
	NotFound(String),
}

impl JobError {
	/// A failure worth retrying, e.g. a busy database.
	pub fn retryable(message: impl Into<String>) -> Self {
		Self::Failed {
			message: message.into(),
			retryable: true,
		}
	}

	pub fn fatal(message: impl Into<String>) -> Self {
		Self::Failed {
			message: message.into(),
			retryable: false,
		}
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
