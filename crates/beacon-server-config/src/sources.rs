// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use beacon_server_smtp::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, IssuesConfigLayer, LogFormat,
	LoggingConfigLayer, SmtpConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/beacon/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: BEACON_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			auth: Some(load_auth_from_env()),
			issues: Some(load_issues_from_env()?),
			smtp: Some(load_smtp_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	let Some(v) = env_var(name) else {
		return Ok(None);
	};
	match v.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(Some(true)),
		"0" | "false" | "no" | "off" => Ok(Some(false)),
		_ => Err(ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("expected a boolean, got '{v}'"),
		}),
	}
}

/// Parse a numeric variable, naming the target type in the error.
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
	env_var(name)
		.map(|v| {
			v.parse().map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {} value '{v}'", std::any::type_name::<T>()),
			})
		})
		.transpose()
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| split_list(&s))
}

fn split_list(s: &str) -> Vec<String> {
	s.split(',')
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
		.collect()
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("BEACON_SERVER_HOST"),
		port: env_parse("BEACON_SERVER_PORT")?,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("BEACON_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format: Option<LogFormat> = env_var("BEACON_SERVER_LOG_FORMAT")
		.map(|v| v.parse())
		.transpose()?;
	Ok(LoggingConfigLayer {
		level: env_var("BEACON_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_auth_from_env() -> AuthConfigLayer {
	AuthConfigLayer {
		tokens: env_list("BEACON_SERVER_AUTH_TOKENS"),
	}
}

fn load_issues_from_env() -> Result<IssuesConfigLayer, ConfigError> {
	Ok(IssuesConfigLayer {
		default_page_size: env_parse("BEACON_SERVER_ISSUES_DEFAULT_PAGE_SIZE")?,
		max_page_size: env_parse("BEACON_SERVER_ISSUES_MAX_PAGE_SIZE")?,
		event_retention_days: env_parse("BEACON_SERVER_ISSUES_EVENT_RETENTION_DAYS")?,
		cleanup_interval_secs: env_parse("BEACON_SERVER_ISSUES_CLEANUP_INTERVAL_SECS")?,
		outbox_poll_interval_secs: env_parse("BEACON_SERVER_ISSUES_OUTBOX_POLL_INTERVAL_SECS")?,
		outbox_batch_size: env_parse("BEACON_SERVER_ISSUES_OUTBOX_BATCH_SIZE")?,
		outbox_max_attempts: env_parse("BEACON_SERVER_ISSUES_OUTBOX_MAX_ATTEMPTS")?,
	})
}

fn load_smtp_from_env() -> Result<SmtpConfigLayer, ConfigError> {
	Ok(SmtpConfigLayer {
		host: env_var("BEACON_SERVER_SMTP_HOST"),
		port: env_parse("BEACON_SERVER_SMTP_PORT")?,
		username: env_var("BEACON_SERVER_SMTP_USERNAME"),
		password: env_var("BEACON_SERVER_SMTP_PASSWORD").map(SecretString::new),
		from_address: env_var("BEACON_SERVER_SMTP_FROM_ADDRESS"),
		from_name: env_var("BEACON_SERVER_SMTP_FROM_NAME"),
		use_tls: env_bool("BEACON_SERVER_SMTP_USE_TLS")?,
		recipients: env_list("BEACON_SERVER_SMTP_RECIPIENTS"),
	})
}
