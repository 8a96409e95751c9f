// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP configuration for issue notification emails.
//!
//! Email delivery is optional. Without a host and from address the server
//! logs notifications instead of sending them.

use beacon_server_smtp::{is_valid_email, SecretString, SmtpConfig};
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 587;
const DEFAULT_FROM_NAME: &str = "Beacon";

/// SMTP client settings plus the addresses that receive notifications.
#[derive(Debug, Clone)]
pub struct NotificationEmailConfig {
	pub smtp: SmtpConfig,
	pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
	#[serde(default)]
	pub from_address: Option<String>,
	#[serde(default)]
	pub from_name: Option<String>,
	#[serde(default)]
	pub use_tls: Option<bool>,
	#[serde(default)]
	pub recipients: Option<Vec<String>>,
}

impl SmtpConfigLayer {
	pub fn merge(&mut self, other: SmtpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.from_address.is_some() {
			self.from_address = other.from_address;
		}
		if other.from_name.is_some() {
			self.from_name = other.from_name;
		}
		if other.use_tls.is_some() {
			self.use_tls = other.use_tls;
		}
		if other.recipients.is_some() {
			self.recipients = other.recipients;
		}
	}

	/// Returns `None` when no SMTP host is configured.
	pub fn finalize(self) -> Result<Option<NotificationEmailConfig>, ConfigError> {
		let Some(host) = self.host.filter(|h| !h.trim().is_empty()) else {
			return Ok(None);
		};

		let from_address = self
			.from_address
			.filter(|a| !a.trim().is_empty())
			.ok_or_else(|| {
				ConfigError::Validation("smtp.from_address is required when smtp.host is set".to_string())
			})?;
		if !is_valid_email(&from_address) {
			return Err(ConfigError::InvalidValue {
				key: "smtp.from_address".to_string(),
				message: format!("'{from_address}' is not a valid email address"),
			});
		}

		let recipients: Vec<String> = self
			.recipients
			.unwrap_or_default()
			.into_iter()
			.map(|r| r.trim().to_string())
			.filter(|r| !r.is_empty())
			.collect();
		if recipients.is_empty() {
			return Err(ConfigError::Validation(
				"smtp.recipients must list at least one address when smtp.host is set".to_string(),
			));
		}
		if let Some(bad) = recipients.iter().find(|r| !is_valid_email(r)) {
			return Err(ConfigError::InvalidValue {
				key: "smtp.recipients".to_string(),
				message: format!("'{bad}' is not a valid email address"),
			});
		}

		Ok(Some(NotificationEmailConfig {
			smtp: SmtpConfig {
				host,
				port: self.port.unwrap_or(DEFAULT_PORT),
				username: self.username,
				password: self.password,
				from_address,
				from_name: self
					.from_name
					.unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
				use_tls: self.use_tls.unwrap_or(true),
			},
			recipients,
		}))
	}
}
