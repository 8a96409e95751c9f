// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP email client for Beacon.
//!
//! Sends the multipart (HTML + plain text) emails used for issue
//! notifications. Passwords are held in a [`SecretString`] so they never
//! reach logs.
//!
//! # Example
//!
//! ```no_run
//! use beacon_server_smtp::{OutgoingEmail, SecretString, SmtpClient, SmtpConfig};
//!
//! # async fn example() -> Result<(), beacon_server_smtp::SmtpError> {
//! let config = SmtpConfig {
//!     host: "smtp.example.com".to_string(),
//!     port: 587,
//!     username: Some("user@example.com".to_string()),
//!     password: Some(SecretString::new("password".to_string())),
//!     from_address: "noreply@example.com".to_string(),
//!     from_name: "Beacon".to_string(),
//!     use_tls: true,
//! };
//!
//! let client = SmtpClient::new(config)?;
//! client
//!     .send(&OutgoingEmail {
//!         to: vec!["oncall@example.com".to_string()],
//!         subject: "New issue".to_string(),
//!         body_html: "<p>NullPointerException</p>".to_string(),
//!         body_text: "NullPointerException".to_string(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod secret;

use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};

pub use secret::SecretString;

/// Errors that can occur during SMTP operations.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	/// Failed to connect to the SMTP server.
	#[error("connection failed: {0}")]
	Connection(String),

	/// Failed to send an email message.
	#[error("send failed: {0}")]
	Send(String),

	/// Invalid configuration (missing required fields, invalid values).
	#[error("invalid configuration: {0}")]
	Config(String),

	/// Invalid email address format.
	#[error("invalid email address: {0}")]
	Address(String),
}

/// Configuration for the SMTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
	/// SMTP server hostname (e.g., "smtp.gmail.com").
	pub host: String,

	/// SMTP server port. Common values: 25 (unencrypted), 465 (TLS), 587 (STARTTLS).
	pub port: u16,

	pub username: Option<String>,
	pub password: Option<SecretString>,

	/// Email address to send from (e.g., "noreply@example.com").
	pub from_address: String,

	/// Display name for the sender (e.g., "Beacon Alerts").
	pub from_name: String,

	/// Whether to use STARTTLS for the connection. Defaults to `true`.
	#[serde(default = "default_use_tls")]
	pub use_tls: bool,
}

fn default_use_tls() -> bool {
	true
}

/// One notification email, addressed to every recipient at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
	pub to: Vec<String>,
	pub subject: String,
	pub body_html: String,
	pub body_text: String,
}

impl OutgoingEmail {
	/// Build a multipart/alternative message from `from`.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Address`] for an unparseable recipient and
	/// [`SmtpError::Config`] when there are no recipients.
	pub fn to_message(&self, from: &Mailbox) -> Result<Message, SmtpError> {
		if self.to.is_empty() {
			return Err(SmtpError::Config("email has no recipients".into()));
		}

		let mut builder = Message::builder().from(from.clone()).subject(&self.subject);
		for recipient in &self.to {
			let mailbox: Mailbox = recipient
				.parse()
				.map_err(|e| SmtpError::Address(format!("{recipient}: {e}")))?;
			builder = builder.to(mailbox);
		}

		builder
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(self.body_text.clone()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(self.body_html.clone()),
					),
			)
			.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))
	}
}

/// Async SMTP client. Connections are opened lazily on send.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	/// # Errors
	///
	/// Returns [`SmtpError::Config`] for an empty host,
	/// [`SmtpError::Address`] if the from address is invalid and
	/// [`SmtpError::Connection`] if the TLS transport cannot be built.
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, use_tls = %config.use_tls)
	)]
	pub fn new(config: SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox = config.from_mailbox()?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let mut builder = builder.port(config.port);
		if let (Some(username), Some(password)) = (config.username, config.password) {
			builder = builder.credentials(Credentials::new(username, password.into_inner()));
		}

		tracing::debug!("SMTP client initialized");

		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	#[tracing::instrument(
		name = "smtp_send",
		skip(self, email),
		fields(recipients = email.to.len(), subject = %email.subject)
	)]
	pub async fn send(&self, email: &OutgoingEmail) -> Result<(), SmtpError> {
		let message = email.to_message(&self.from_mailbox)?;

		self
			.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::info!("email sent");
		Ok(())
	}
}

impl SmtpConfig {
	/// The `From:` mailbox built from `from_name` and `from_address`.
	pub fn from_mailbox(&self) -> Result<Mailbox, SmtpError> {
		if self.host.trim().is_empty() {
			return Err(SmtpError::Config("host must not be empty".into()));
		}
		format!("{} <{}>", self.from_name, self.from_address)
			.parse()
			.map_err(|e| SmtpError::Address(format!("{e}")))
	}
}

/// Validate an email address format.
///
/// ```
/// use beacon_server_smtp::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("User Name <user@example.com>"));
/// assert!(!is_valid_email("not-an-email"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}

/// Escape text for inclusion in an HTML email body.
pub fn escape_html(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(password: &str) -> SmtpConfig {
		SmtpConfig {
			host: "smtp.example.com".to_string(),
			port: 587,
			username: Some("user".to_string()),
			password: Some(SecretString::new(password.to_string())),
			from_address: "alerts@example.com".to_string(),
			from_name: "Beacon".to_string(),
			use_tls: true,
		}
	}

	mod email_validation {
		use super::*;

		#[test]
		fn valid_simple_email() {
			assert!(is_valid_email("user@example.com"));
		}

		#[test]
		fn valid_email_with_plus() {
			assert!(is_valid_email("user+tag@example.com"));
		}

		#[test]
		fn invalid_empty_string() {
			assert!(!is_valid_email(""));
		}

		#[test]
		fn invalid_no_domain() {
			assert!(!is_valid_email("user@"));
		}

		#[test]
		fn invalid_multiple_at_symbols() {
			assert!(!is_valid_email("user@@example.com"));
		}
	}

	mod client {
		use super::*;

		#[test]
		fn config_debug_does_not_leak_password() {
			let debug = format!("{:?}", config("super-secret-password"));
			assert!(!debug.contains("super-secret-password"));
			assert!(debug.contains("[REDACTED]"));
		}

		#[test]
		fn default_use_tls_is_true() {
			assert!(default_use_tls());
		}

		fn email(to: &[&str]) -> OutgoingEmail {
			OutgoingEmail {
				to: to.iter().map(|s| s.to_string()).collect(),
				subject: "[Beacon] New issue: TypeError".to_string(),
				body_html: "<pre>TypeError</pre>".to_string(),
				body_text: "TypeError".to_string(),
			}
		}

		#[test]
		fn message_addresses_every_recipient() {
			let from = config("pw").from_mailbox().unwrap();
			let message = email(&["a@example.com", "b@example.com"])
				.to_message(&from)
				.unwrap();

			let to: Vec<String> = message
				.envelope()
				.to()
				.iter()
				.map(|a| a.to_string())
				.collect();
			assert_eq!(to, vec!["a@example.com", "b@example.com"]);

			let raw = String::from_utf8(message.formatted()).unwrap();
			assert!(raw.contains("multipart/alternative"));
			assert!(raw.contains("Subject: [Beacon] New issue: TypeError"));
		}

		#[test]
		fn message_needs_recipients() {
			let from = config("pw").from_mailbox().unwrap();
			assert!(matches!(email(&[]).to_message(&from), Err(SmtpError::Config(_))));
		}

		#[test]
		fn message_rejects_bad_recipient() {
			let from = config("pw").from_mailbox().unwrap();
			assert!(matches!(
				email(&["a@example.com", "nope"]).to_message(&from),
				Err(SmtpError::Address(_))
			));
		}

		#[test]
		fn rejects_invalid_from_address() {
			let mut config = config("pw");
			config.from_address = "not an address".to_string();
			config.use_tls = false;
			assert!(matches!(SmtpClient::new(config), Err(SmtpError::Address(_))));
		}

		#[test]
		fn rejects_empty_host() {
			let mut config = config("pw");
			config.host = " ".to_string();
			assert!(matches!(SmtpClient::new(config), Err(SmtpError::Config(_))));
		}
	}

	#[test]
	fn escape_html_escapes_markup() {
		assert_eq!(
			escape_html("<script>alert('x') & \"y\"</script>"),
			"&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
		);
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn valid_emails_are_accepted(
				local in "[a-zA-Z][a-zA-Z0-9]{0,30}",
				domain in "[a-zA-Z][a-zA-Z0-9]{0,20}",
				tld in "(com|org|net|io|dev)"
			) {
				let email = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_email(&email), "Expected valid: {}", email);
			}

			#[test]
			fn password_never_in_config_debug(password in "[a-zA-Z0-9!@#$%^&*]{8,32}") {
				prop_assume!(!password.contains("REDACTED"));

				let debug = format!("{:?}", config(&password));
				prop_assert!(!debug.contains(&password), "Password leaked in debug output");
			}

			#[test]
			fn escaped_html_has_no_tags(s in ".{0,64}") {
				let escaped = escape_html(&s);
				prop_assert!(!escaped.contains('<'));
				prop_assert!(!escaped.contains('>'));
			}
		}
	}
}
