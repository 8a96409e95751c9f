// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Beacon server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`BEACON_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use beacon_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub auth: AuthConfig,
	pub issues: IssuesConfig,
	/// `None` when email notifications are not configured.
	pub smtp: Option<NotificationEmailConfig>,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`BEACON_SERVER_*`)
/// 2. Config file (`/etc/beacon/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize()?;
	let issues = layer.issues.unwrap_or_default().finalize();
	let smtp = match layer.smtp {
		Some(smtp) => smtp.finalize()?,
		None => None,
	};

	issues.validate()?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		log_format = %logging.format,
		api_tokens = auth.tokens.len(),
		event_retention_days = issues.event_retention_days,
		smtp_configured = smtp.is_some(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		auth,
		issues,
		smtp,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn test_finalize_empty_layer_uses_defaults() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config.socket_addr(), "0.0.0.0:8080");
		assert_eq!(config.database.url, "sqlite:./beacon.db");
		assert_eq!(config.issues, IssuesConfig::default());
		assert!(config.auth.tokens.is_empty());
		assert!(config.smtp.is_none());
	}

	#[test]
	fn test_finalize_full_file() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 3000

			[logging]
			format = "json"

			[auth]
			tokens = ["alice:admin:admin-token", "ci:user:ci-token"]

			[issues]
			default_page_size = 25

			[smtp]
			host = "smtp.example.com"
			from_address = "alerts@example.com"
			recipients = ["oncall@example.com"]
			"#,
		)
		.unwrap();

		let config = finalize(layer).unwrap();
		assert_eq!(config.http.port, 3000);
		assert_eq!(config.logging.format, LogFormat::Json);
		assert_eq!(config.auth.tokens.len(), 2);
		assert_eq!(config.issues.default_page_size, 25);
		assert_eq!(
			config.smtp.map(|s| s.smtp.host),
			Some("smtp.example.com".to_string())
		);
	}

	#[test]
	fn test_finalize_rejects_invalid_issue_limits() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[issues]
			default_page_size = 500
			max_page_size = 100
			"#,
		)
		.unwrap();
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_finalize_rejects_bad_token() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[auth]
			tokens = ["alice:superuser:t"]
			"#,
		)
		.unwrap();
		assert!(matches!(
			finalize(layer),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_load_config_with_file_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			[issues]
			event_retention_days = 0
			"#
		)
		.unwrap();

		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.issues.event_retention_days, 0);
	}
}
