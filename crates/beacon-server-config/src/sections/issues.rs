// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Issue store, retention and notification relay configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Upper bound for `event_retention_days` (one hundred years).
pub const MAX_EVENT_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuesConfig {
	pub default_page_size: u32,
	pub max_page_size: u32,
	/// Occurrence events older than this are deleted. `0` keeps them forever.
	pub event_retention_days: u32,
	pub cleanup_interval_secs: u64,
	pub outbox_poll_interval_secs: u64,
	pub outbox_batch_size: u32,
	pub outbox_max_attempts: u32,
}

impl Default for IssuesConfig {
	fn default() -> Self {
		Self {
			default_page_size: 20,
			max_page_size: 100,
			event_retention_days: 30,
			cleanup_interval_secs: 3600,
			outbox_poll_interval_secs: 5,
			outbox_batch_size: 50,
			outbox_max_attempts: 5,
		}
	}
}

impl IssuesConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.default_page_size == 0 {
			return Err(ConfigError::Validation(
				"issues.default_page_size must be greater than 0".to_string(),
			));
		}
		if self.max_page_size < self.default_page_size {
			return Err(ConfigError::Validation(format!(
				"issues.max_page_size ({}) must be at least issues.default_page_size ({})",
				self.max_page_size, self.default_page_size
			)));
		}
		if self.event_retention_days > MAX_EVENT_RETENTION_DAYS {
			return Err(ConfigError::Validation(format!(
				"issues.event_retention_days ({}) must be at most {MAX_EVENT_RETENTION_DAYS}",
				self.event_retention_days
			)));
		}
		if self.cleanup_interval_secs == 0 || self.outbox_poll_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"issues job intervals must be greater than 0".to_string(),
			));
		}
		if self.outbox_batch_size == 0 || self.outbox_max_attempts == 0 {
			return Err(ConfigError::Validation(
				"issues.outbox_batch_size and issues.outbox_max_attempts must be greater than 0"
					.to_string(),
			));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuesConfigLayer {
	#[serde(default)]
	pub default_page_size: Option<u32>,
	#[serde(default)]
	pub max_page_size: Option<u32>,
	#[serde(default)]
	pub event_retention_days: Option<u32>,
	#[serde(default)]
	pub cleanup_interval_secs: Option<u64>,
	#[serde(default)]
	pub outbox_poll_interval_secs: Option<u64>,
	#[serde(default)]
	pub outbox_batch_size: Option<u32>,
	#[serde(default)]
	pub outbox_max_attempts: Option<u32>,
}

impl IssuesConfigLayer {
	pub fn merge(&mut self, other: IssuesConfigLayer) {
		if other.default_page_size.is_some() {
			self.default_page_size = other.default_page_size;
		}
		if other.max_page_size.is_some() {
			self.max_page_size = other.max_page_size;
		}
		if other.event_retention_days.is_some() {
			self.event_retention_days = other.event_retention_days;
		}
		if other.cleanup_interval_secs.is_some() {
			self.cleanup_interval_secs = other.cleanup_interval_secs;
		}
		if other.outbox_poll_interval_secs.is_some() {
			self.outbox_poll_interval_secs = other.outbox_poll_interval_secs;
		}
		if other.outbox_batch_size.is_some() {
			self.outbox_batch_size = other.outbox_batch_size;
		}
		if other.outbox_max_attempts.is_some() {
			self.outbox_max_attempts = other.outbox_max_attempts;
		}
	}

	pub fn finalize(self) -> IssuesConfig {
		let defaults = IssuesConfig::default();
		IssuesConfig {
			default_page_size: self.default_page_size.unwrap_or(defaults.default_page_size),
			max_page_size: self.max_page_size.unwrap_or(defaults.max_page_size),
			event_retention_days: self
				.event_retention_days
				.unwrap_or(defaults.event_retention_days),
			cleanup_interval_secs: self
				.cleanup_interval_secs
				.unwrap_or(defaults.cleanup_interval_secs),
			outbox_poll_interval_secs: self
				.outbox_poll_interval_secs
				.unwrap_or(defaults.outbox_poll_interval_secs),
			outbox_batch_size: self.outbox_batch_size.unwrap_or(defaults.outbox_batch_size),
			outbox_max_attempts: self
				.outbox_max_attempts
				.unwrap_or(defaults.outbox_max_attempts),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_defaults() {
		let config = IssuesConfigLayer::default().finalize();
		assert_eq!(config, IssuesConfig::default());
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_from_toml() {
		let layer: IssuesConfigLayer = toml::from_str(
			r#"
			default_page_size = 10
			max_page_size = 40
			event_retention_days = 7
			"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.default_page_size, 10);
		assert_eq!(config.max_page_size, 40);
		assert_eq!(config.event_retention_days, 7);
		assert_eq!(config.outbox_max_attempts, 5);
	}

	#[test]
	fn test_merge_overrides_only_set_fields() {
		let mut base = IssuesConfigLayer {
			default_page_size: Some(10),
			outbox_batch_size: Some(5),
			..Default::default()
		};
		base.merge(IssuesConfigLayer {
			outbox_batch_size: Some(25),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.default_page_size, 10);
		assert_eq!(config.outbox_batch_size, 25);
	}

	#[test]
	fn test_rejects_zero_page_size() {
		let config = IssuesConfig {
			default_page_size: 0,
			..Default::default()
		};
		assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_rejects_default_above_max() {
		let config = IssuesConfig {
			default_page_size: 200,
			max_page_size: 100,
			..Default::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_rejects_zero_intervals() {
		let config = IssuesConfig {
			outbox_poll_interval_secs: 0,
			..Default::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_rejects_retention_beyond_bound() {
		let config = IssuesConfig {
			event_retention_days: MAX_EVENT_RETENTION_DAYS + 1,
			..Default::default()
		};
		assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

		let config = IssuesConfig {
			event_retention_days: MAX_EVENT_RETENTION_DAYS,
			..Default::default()
		};
		assert!(config.validate().is_ok());
	}

	proptest! {
		#[test]
		fn page_sizes_validate_iff_ordered(default in 0u32..500, max in 0u32..500) {
			let config = IssuesConfig {
				default_page_size: default,
				max_page_size: max,
				..Default::default()
			};
			prop_assert_eq!(config.validate().is_ok(), default > 0 && max >= default);
		}
	}
}
