// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LogFormat::Pretty => write!(f, "pretty"),
			LogFormat::Json => write!(f, "json"),
		}
	}
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(ConfigError::InvalidValue {
				key: "logging.format".to_string(),
				message: format!("expected 'pretty' or 'json', got '{other}'"),
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	/// Default `EnvFilter` directive, overridden by `RUST_LOG`.
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfigLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<LogFormat>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: LoggingConfigLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		let defaults = LoggingConfig::default();
		LoggingConfig {
			level: self.level.unwrap_or(defaults.level),
			format: self.format.unwrap_or(defaults.format),
		}
	}
}
