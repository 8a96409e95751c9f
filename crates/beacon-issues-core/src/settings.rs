// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::issue::IssueLevel;
use crate::lifecycle::IngestOutcome;

/// Singleton notification settings for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
	pub notifications_enabled: bool,
	/// Least severe level that still notifies
	pub notification_min_level: IssueLevel,
	pub updated_at: DateTime<Utc>,
	pub updated_by: Option<String>,
}

impl Default for AdminSettings {
	fn default() -> Self {
		Self {
			notifications_enabled: true,
			notification_min_level: IssueLevel::Error,
			updated_at: Utc::now(),
			updated_by: None,
		}
	}
}

impl AdminSettings {
	pub fn should_notify(&self, level: IssueLevel, outcome: IngestOutcome) -> bool {
		self.notifications_enabled && outcome.is_notable() && level.meets(self.notification_min_level)
	}
}
