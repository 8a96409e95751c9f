// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{IssueServerError, Result};

/// How long a writer waits for the database lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./beacon.db")
///
/// # Errors
/// Returns `IssueServerError::Parse` if the URL is invalid, or
/// `IssueServerError::Database` if the connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| IssueServerError::Parse(format!("invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Run the issue tracking migrations.
///
/// Every statement is `CREATE ... IF NOT EXISTS`, so this is safe to run on
/// every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	let migrations = [
		include_str!("../migrations/001_create_issues.sql"),
		include_str!("../migrations/002_create_issue_events.sql"),
		include_str!("../migrations/003_create_admin_settings.sql"),
		include_str!("../migrations/004_create_issue_outbox.sql"),
	];

	for migration in migrations {
		for stmt in migration.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
	}

	tracing::debug!(count = migrations.len(), "migrations applied");
	Ok(())
}
