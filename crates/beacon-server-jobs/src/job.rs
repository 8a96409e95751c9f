// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::JobError;
use crate::types::JobOutput;

#[async_trait]
pub trait Job: Send + Sync {
	/// Stable identifier, e.g. `outbox-relay`.
	fn id(&self) -> &str;
	fn name(&self) -> &str;
	fn description(&self) -> &str;
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError>;
}
