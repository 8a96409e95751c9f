// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::JobError;
use crate::types::TriggerSource;

/// What a job run knows about itself.
pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	pub cancellation_token: CancellationToken,
}

impl JobContext {
	pub fn new(run_id: impl Into<String>, triggered_by: TriggerSource, cancellation_token: CancellationToken) -> Self {
		Self {
			run_id: run_id.into(),
			triggered_by,
			cancellation_token,
		}
	}

	/// `Err(JobError::Cancelled)` once the scheduler is shutting down.
	pub fn check_cancelled(&self) -> Result<(), JobError> {
		if self.cancellation_token.is_cancelled() {
			Err(JobError::Cancelled)
		} else {
			Ok(())
		}
	}
}

/// Shared cancel flag. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct CancellationToken {
	state: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
	pub fn new() -> Self {
		let (state, _) = watch::channel(false);
		Self {
			state: Arc::new(state),
		}
	}

	pub fn cancel(&self) {
		self.state.send_replace(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.state.borrow()
	}

	/// Resolves once [`CancellationToken::cancel`] has been called.
	pub async fn cancelled(&self) {
		let mut rx = self.state.subscribe();
		// The sender lives as long as `self`, so this only returns on cancel.
		let _ = rx.wait_for(|cancelled| *cancelled).await;
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}
