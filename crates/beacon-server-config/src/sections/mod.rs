// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod auth;
mod database;
mod http;
mod issues;
mod logging;
mod smtp;

pub use auth::{ApiToken, AuthConfig, AuthConfigLayer, ROLES};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use issues::{IssuesConfig, IssuesConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use smtp::{NotificationEmailConfig, SmtpConfigLayer};
