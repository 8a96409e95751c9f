// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite:./beacon.db";

/// The issue store is SQLite-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if let Some(url) = other.url {
			self.url = Some(url);
		}
	}

	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let url = match self.url.as_deref().map(str::trim) {
			None | Some("") => return Ok(DatabaseConfig::default()),
			Some(url) => url,
		};

		if !url.starts_with("sqlite:") {
			return Err(ConfigError::InvalidValue {
				key: "database.url".to_string(),
				message: format!("expected a sqlite: URL, got {url:?}"),
			});
		}

		Ok(DatabaseConfig { url: url.to_string() })
	}
}
