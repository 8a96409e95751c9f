// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository layer for issue database operations.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use beacon_issues_core::{
	apply_event, compute_fingerprint, AdminSettings, IngestOutcome, Issue, IssueEvent, IssueEventId,
	IssueFilter, IssueId, IssueLevel, IssueStats, IssueStatus, LevelCounts, LifecycleEvent,
	NewOccurrence, Notification, NotificationKind, TransitionOutcome, DEFAULT_PAGE_SIZE,
	MAX_PAGE_SIZE,
};

use crate::error::{IssueServerError, Result};

/// Attempts of an optimistic status update before reporting a conflict.
pub const MAX_STATUS_RETRIES: usize = 5;

const ISSUE_COLUMNS: &str = r#"
	id, fingerprint, level, status, title, message, stack,
	occurrence_count, first_seen_at, last_seen_at,
	resolved_by, resolved_at, user_id, revision,
	created_at, updated_at
"#;

/// Where a logged error ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedIssue {
	pub issue_id: IssueId,
	pub outcome: IngestOutcome,
	pub occurrence_count: u64,
}

/// Repository trait for issue operations.
#[async_trait]
pub trait IssueRepository: Send + Sync {
	// Ingestion
	async fn log_error(&self, occurrence: &NewOccurrence) -> Result<LoggedIssue>;

	// Issue reads
	async fn get_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>>;
	async fn get_issue_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Issue>>;
	async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;
	async fn count_issues(&self, filter: &IssueFilter) -> Result<u64>;
	/// A page and the total matching `filter`, read from one snapshot.
	async fn list_issues_with_total(&self, filter: &IssueFilter) -> Result<(Vec<Issue>, u64)>;
	async fn get_issue_stats(&self) -> Result<IssueStats>;

	// Issue writes
	async fn update_issue_status(
		&self,
		id: IssueId,
		status: IssueStatus,
		resolved_by: Option<String>,
	) -> Result<bool>;
	async fn delete_issue(&self, id: IssueId) -> Result<bool>;

	// Event operations
	async fn list_events_for_issue(&self, issue_id: IssueId, limit: u32) -> Result<Vec<IssueEvent>>;
	async fn delete_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64>;

	// Admin settings
	async fn get_admin_settings(&self) -> Result<AdminSettings>;
	async fn update_admin_settings(
		&self,
		notifications_enabled: bool,
		notification_min_level: IssueLevel,
		updated_by: Option<String>,
	) -> Result<AdminSettings>;

	// Outbox
	async fn list_pending_notifications(
		&self,
		limit: u32,
		max_attempts: u32,
	) -> Result<Vec<Notification>>;
	async fn mark_notification_delivered(&self, id: i64) -> Result<()>;
	async fn record_notification_failure(&self, id: i64, error: &str) -> Result<()>;
}

/// SQLite implementation of the issue repository.
#[derive(Clone)]
pub struct SqliteIssueRepository {
	pool: SqlitePool,
	default_page_size: u32,
	max_page_size: u32,
}

impl SqliteIssueRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			default_page_size: DEFAULT_PAGE_SIZE,
			max_page_size: MAX_PAGE_SIZE,
		}
	}

	/// Override the page size used when a filter has no limit, and its cap.
	pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
		self.max_page_size = max_page_size.max(1);
		self.default_page_size = default_page_size.clamp(1, self.max_page_size);
		self
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub fn page_limit(&self, filter: &IssueFilter) -> u32 {
		filter.limit_clamped(self.default_page_size, self.max_page_size)
	}
}

#[async_trait]
impl IssueRepository for SqliteIssueRepository {
	/// Record one occurrence of an error.
	///
	/// The transaction opens with the INSERT so the write lock is held before
	/// anything is read. A unique violation on `fingerprint` means the issue
	/// already exists (possibly created by a concurrent writer) and routes to
	/// the recurrence update instead of failing.
	#[instrument(skip(self, occurrence), fields(level = %occurrence.level))]
	async fn log_error(&self, occurrence: &NewOccurrence) -> Result<LoggedIssue> {
		let fingerprint = compute_fingerprint(
			&occurrence.title,
			&occurrence.message,
			occurrence.stack.as_deref(),
		)?;

		let mut tx = self.pool.begin().await?;

		let candidate = Issue::first_occurrence(fingerprint.clone(), occurrence);
		let (issue, outcome) = match insert_issue(&mut *tx, &candidate).await {
			Ok(()) => (candidate, IngestOutcome::Created),
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
				let existing = fetch_issue_by_fingerprint(&mut *tx, &fingerprint)
					.await?
					.ok_or_else(|| {
						IssueServerError::Conflict(format!("issue for fingerprint {fingerprint} vanished"))
					})?;

				let transition = apply_event(
					&existing,
					LifecycleEvent::NewOccurrence {
						seen_at: occurrence.occurred_at,
					},
					Utc::now(),
				);
				record_recurrence(&mut *tx, &transition.issue, occurrence.occurred_at).await?;

				let outcome = transition
					.ingest_outcome()
					.unwrap_or(IngestOutcome::Recurred);
				(transition.issue, outcome)
			}
			Err(e) => return Err(e.into()),
		};

		let event = IssueEvent::from_occurrence(issue.id, &fingerprint, occurrence);
		insert_event(&mut *tx, &event).await?;

		let settings = fetch_or_create_settings(&mut *tx).await?;
		if settings.should_notify(issue.level, outcome) {
			if let Some(kind) = NotificationKind::for_outcome(outcome) {
				enqueue_notification(&mut *tx, &issue, kind).await?;
			}
		}

		tx.commit().await?;

		match outcome {
			IngestOutcome::Created => {
				tracing::info!(issue_id = %issue.id, fingerprint = %fingerprint, "issue created")
			}
			IngestOutcome::Reopened => tracing::info!(
				issue_id = %issue.id,
				occurrence_count = issue.occurrence_count,
				"issue reopened by recurrence"
			),
			IngestOutcome::Recurred => tracing::debug!(
				issue_id = %issue.id,
				occurrence_count = issue.occurrence_count,
				"issue recurred"
			),
		}

		Ok(LoggedIssue {
			issue_id: issue.id,
			outcome,
			occurrence_count: issue.occurrence_count,
		})
	}

	#[instrument(skip(self), fields(issue_id = %id))]
	async fn get_issue_by_id(&self, id: IssueId) -> Result<Option<Issue>> {
		let row = sqlx::query_as::<_, IssueRow>(&format!(
			"SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?"
		))
		.bind(id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn get_issue_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Issue>> {
		let mut conn = self.pool.acquire().await?;
		fetch_issue_by_fingerprint(&mut *conn, fingerprint).await
	}

	#[instrument(skip(self, filter), fields(status = ?filter.status, level = ?filter.level))]
	async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
		let mut conn = self.pool.acquire().await?;
		fetch_issue_page(&mut *conn, filter, self.page_limit(filter)).await
	}

	#[instrument(skip(self, filter), fields(status = ?filter.status, level = ?filter.level))]
	async fn count_issues(&self, filter: &IssueFilter) -> Result<u64> {
		let mut conn = self.pool.acquire().await?;
		count_matching(&mut *conn, filter).await
	}

	/// In WAL mode a read transaction sees one snapshot from its first
	/// SELECT until it ends, so concurrent ingest cannot split page and total.
	#[instrument(skip(self, filter), fields(status = ?filter.status, level = ?filter.level))]
	async fn list_issues_with_total(&self, filter: &IssueFilter) -> Result<(Vec<Issue>, u64)> {
		let mut tx = self.pool.begin().await?;
		let issues = fetch_issue_page(&mut *tx, filter, self.page_limit(filter)).await?;
		let total = count_matching(&mut *tx, filter).await?;
		tx.commit().await?;
		Ok((issues, total))
	}

	#[instrument(skip(self))]
	async fn get_issue_stats(&self) -> Result<IssueStats> {
		let row = sqlx::query_as::<_, StatsRow>(
			r#"
			SELECT
				COUNT(*) AS total,
				COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0) AS open,
				COALESCE(SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved,
				COALESCE(SUM(CASE WHEN status = 'closed' THEN 1 ELSE 0 END), 0) AS closed,
				COALESCE(SUM(CASE WHEN level = 'error' THEN 1 ELSE 0 END), 0) AS error,
				COALESCE(SUM(CASE WHEN level = 'warning' THEN 1 ELSE 0 END), 0) AS warning,
				COALESCE(SUM(CASE WHEN level = 'info' THEN 1 ELSE 0 END), 0) AS info,
				COALESCE(SUM(CASE WHEN level = 'debug' THEN 1 ELSE 0 END), 0) AS debug
			FROM issues
			"#,
		)
		.fetch_one(&self.pool)
		.await?;

		Ok(row.into())
	}

	/// Apply an admin transition with an optimistic revision check.
	///
	/// Returns `false` when the issue does not exist.
	#[instrument(skip(self, resolved_by), fields(issue_id = %id, status = %status))]
	async fn update_issue_status(
		&self,
		id: IssueId,
		status: IssueStatus,
		resolved_by: Option<String>,
	) -> Result<bool> {
		for attempt in 1..=MAX_STATUS_RETRIES {
			let Some(existing) = self.get_issue_by_id(id).await? else {
				return Ok(false);
			};

			let transition = apply_event(
				&existing,
				LifecycleEvent::AdminTransition {
					to: status,
					resolved_by: resolved_by.clone(),
				},
				Utc::now(),
			);
			if transition.outcome == TransitionOutcome::Unchanged {
				return Ok(true);
			}
			let issue = &transition.issue;

			let result = sqlx::query(
				r#"
				UPDATE issues SET
					status = ?,
					resolved_by = ?,
					resolved_at = ?,
					revision = revision + 1,
					updated_at = ?
				WHERE id = ? AND revision = ?
				"#,
			)
			.bind(issue.status.to_string())
			.bind(&issue.resolved_by)
			.bind(issue.resolved_at.as_ref().map(format_datetime))
			.bind(format_datetime(&issue.updated_at))
			.bind(id.0.to_string())
			.bind(existing.revision as i64)
			.execute(&self.pool)
			.await?;

			if result.rows_affected() == 1 {
				tracing::info!(
					issue_id = %id,
					from = %existing.status,
					to = %issue.status,
					"issue status changed"
				);
				return Ok(true);
			}

			tracing::debug!(issue_id = %id, attempt, "concurrent issue update, retrying");
		}

		Err(IssueServerError::Conflict(format!(
			"issue {id} kept changing during status update"
		)))
	}

	#[instrument(skip(self), fields(issue_id = %id))]
	async fn delete_issue(&self, id: IssueId) -> Result<bool> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("DELETE FROM issue_events WHERE issue_id = ?")
			.bind(id.0.to_string())
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM issue_outbox WHERE issue_id = ?")
			.bind(id.0.to_string())
			.execute(&mut *tx)
			.await?;
		let result = sqlx::query("DELETE FROM issues WHERE id = ?")
			.bind(id.0.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::info!(issue_id = %id, "issue deleted");
		}
		Ok(deleted)
	}

	#[instrument(skip(self), fields(issue_id = %issue_id))]
	async fn list_events_for_issue(&self, issue_id: IssueId, limit: u32) -> Result<Vec<IssueEvent>> {
		let rows = sqlx::query_as::<_, EventRow>(
			r#"
			SELECT id, issue_id, fingerprint, level, message,
				   user_id, request_path, metadata, occurred_at
			FROM issue_events
			WHERE issue_id = ?
			ORDER BY occurred_at DESC, id DESC
			LIMIT ?
			"#,
		)
		.bind(issue_id.0.to_string())
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self), fields(cutoff = %cutoff))]
	async fn delete_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		let result = sqlx::query("DELETE FROM issue_events WHERE occurred_at < ?")
			.bind(format_datetime(&cutoff))
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	#[instrument(skip(self))]
	async fn get_admin_settings(&self) -> Result<AdminSettings> {
		let mut conn = self.pool.acquire().await?;
		fetch_or_create_settings(&mut *conn).await
	}

	#[instrument(skip(self))]
	async fn update_admin_settings(
		&self,
		notifications_enabled: bool,
		notification_min_level: IssueLevel,
		updated_by: Option<String>,
	) -> Result<AdminSettings> {
		sqlx::query(
			r#"
			INSERT INTO admin_settings (id, notifications_enabled, notification_min_level, updated_at, updated_by)
			VALUES (1, ?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				notifications_enabled = excluded.notifications_enabled,
				notification_min_level = excluded.notification_min_level,
				updated_at = excluded.updated_at,
				updated_by = excluded.updated_by
			"#,
		)
		.bind(notifications_enabled)
		.bind(notification_min_level.to_string())
		.bind(format_datetime(&Utc::now()))
		.bind(&updated_by)
		.execute(&self.pool)
		.await?;

		tracing::info!(
			notifications_enabled,
			min_level = %notification_min_level,
			"admin settings updated"
		);

		self.get_admin_settings().await
	}

	#[instrument(skip(self))]
	async fn list_pending_notifications(
		&self,
		limit: u32,
		max_attempts: u32,
	) -> Result<Vec<Notification>> {
		let rows = sqlx::query_as::<_, OutboxRow>(
			r#"
			SELECT id, issue_id, kind, level, title, message,
				   occurrence_count, created_at, attempts
			FROM issue_outbox
			WHERE delivered_at IS NULL AND attempts < ?
			ORDER BY id
			LIMIT ?
			"#,
		)
		.bind(i64::from(max_attempts))
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn mark_notification_delivered(&self, id: i64) -> Result<()> {
		sqlx::query("UPDATE issue_outbox SET delivered_at = ?, last_error = NULL WHERE id = ?")
			.bind(format_datetime(&Utc::now()))
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	#[instrument(skip(self, error))]
	async fn record_notification_failure(&self, id: i64, error: &str) -> Result<()> {
		sqlx::query("UPDATE issue_outbox SET attempts = attempts + 1, last_error = ? WHERE id = ?")
			.bind(error)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}
}

async fn fetch_issue_page(
	conn: &mut SqliteConnection,
	filter: &IssueFilter,
	limit: u32,
) -> Result<Vec<Issue>> {
	let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ISSUE_COLUMNS} FROM issues"));
	push_filters(&mut qb, filter);
	qb.push(" ORDER BY last_seen_at DESC, id DESC LIMIT ")
		.push_bind(i64::from(limit))
		.push(" OFFSET ")
		.push_bind(i64::from(filter.offset_or_default()));

	let rows = qb.build_query_as::<IssueRow>().fetch_all(conn).await?;
	rows.into_iter().map(TryInto::try_into).collect()
}

async fn count_matching(conn: &mut SqliteConnection, filter: &IssueFilter) -> Result<u64> {
	let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM issues");
	push_filters(&mut qb, filter);

	let (count,) = qb.build_query_as::<(i64,)>().fetch_one(conn).await?;
	Ok(count as u64)
}

async fn insert_issue(conn: &mut SqliteConnection, issue: &Issue) -> sqlx::Result<()> {
	sqlx::query(
		r#"
		INSERT INTO issues (
			id, fingerprint, level, status, title, message, stack, search_text,
			occurrence_count, first_seen_at, last_seen_at,
			resolved_by, resolved_at, user_id, revision,
			created_at, updated_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(issue.id.0.to_string())
	.bind(&issue.fingerprint)
	.bind(issue.level.to_string())
	.bind(issue.status.to_string())
	.bind(&issue.title)
	.bind(&issue.message)
	.bind(&issue.stack)
	.bind(search_text(&issue.title, &issue.message))
	.bind(issue.occurrence_count as i64)
	.bind(format_datetime(&issue.first_seen_at))
	.bind(format_datetime(&issue.last_seen_at))
	.bind(&issue.resolved_by)
	.bind(issue.resolved_at.as_ref().map(format_datetime))
	.bind(&issue.user_id)
	.bind(issue.revision as i64)
	.bind(format_datetime(&issue.created_at))
	.bind(format_datetime(&issue.updated_at))
	.execute(conn)
	.await?;

	Ok(())
}

// The counter and last-seen are computed in SQL; only the status fields come
// from the lifecycle transition.
/// Title, message and level stay as first seen.
async fn record_recurrence(
	conn: &mut SqliteConnection,
	issue: &Issue,
	seen_at: DateTime<Utc>,
) -> Result<()> {
	sqlx::query(
		r#"
		UPDATE issues SET
			occurrence_count = occurrence_count + 1,
			last_seen_at = MAX(last_seen_at, ?),
			status = ?,
			resolved_by = ?,
			resolved_at = ?,
			revision = revision + 1,
			updated_at = ?
		WHERE id = ?
		"#,
	)
	.bind(format_datetime(&seen_at))
	.bind(issue.status.to_string())
	.bind(&issue.resolved_by)
	.bind(issue.resolved_at.as_ref().map(format_datetime))
	.bind(format_datetime(&issue.updated_at))
	.bind(issue.id.0.to_string())
	.execute(conn)
	.await?;

	Ok(())
}

async fn fetch_issue_by_fingerprint(
	conn: &mut SqliteConnection,
	fingerprint: &str,
) -> Result<Option<Issue>> {
	let row = sqlx::query_as::<_, IssueRow>(&format!(
		"SELECT {ISSUE_COLUMNS} FROM issues WHERE fingerprint = ?"
	))
	.bind(fingerprint)
	.fetch_optional(conn)
	.await?;

	row.map(TryInto::try_into).transpose()
}

async fn insert_event(conn: &mut SqliteConnection, event: &IssueEvent) -> Result<()> {
	let metadata_json = serde_json::to_string(&event.metadata)?;

	sqlx::query(
		r#"
		INSERT INTO issue_events (
			id, issue_id, fingerprint, level, message,
			user_id, request_path, metadata, occurred_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(event.id.0.to_string())
	.bind(event.issue_id.0.to_string())
	.bind(&event.fingerprint)
	.bind(event.level.to_string())
	.bind(&event.message)
	.bind(&event.user_id)
	.bind(&event.request_path)
	.bind(metadata_json)
	.bind(format_datetime(&event.occurred_at))
	.execute(conn)
	.await?;

	Ok(())
}

async fn fetch_or_create_settings(conn: &mut SqliteConnection) -> Result<AdminSettings> {
	let defaults = AdminSettings::default();

	sqlx::query(
		r#"
		INSERT OR IGNORE INTO admin_settings (id, notifications_enabled, notification_min_level, updated_at, updated_by)
		VALUES (1, ?, ?, ?, NULL)
		"#,
	)
	.bind(defaults.notifications_enabled)
	.bind(defaults.notification_min_level.to_string())
	.bind(format_datetime(&defaults.updated_at))
	.execute(&mut *conn)
	.await?;

	let row = sqlx::query_as::<_, SettingsRow>(
		r#"
		SELECT notifications_enabled, notification_min_level, updated_at, updated_by
		FROM admin_settings
		WHERE id = 1
		"#,
	)
	.fetch_one(&mut *conn)
	.await?;

	row.try_into()
}

async fn enqueue_notification(
	conn: &mut SqliteConnection,
	issue: &Issue,
	kind: NotificationKind,
) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO issue_outbox (issue_id, kind, level, title, message, occurrence_count, created_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(issue.id.0.to_string())
	.bind(kind.to_string())
	.bind(issue.level.to_string())
	.bind(&issue.title)
	.bind(&issue.message)
	.bind(issue.occurrence_count as i64)
	.bind(format_datetime(&Utc::now()))
	.execute(conn)
	.await?;

	tracing::debug!(issue_id = %issue.id, kind = %kind, "notification queued");
	Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &IssueFilter) {
	qb.push(" WHERE 1 = 1");

	if let Some(status) = filter.status {
		qb.push(" AND status = ").push_bind(status.to_string());
	}
	if let Some(level) = filter.level {
		qb.push(" AND level = ").push_bind(level.to_string());
	}
	if let Some(term) = filter.search_term() {
		let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
		qb.push(" AND search_text LIKE ")
			.push_bind(pattern)
			.push(" ESCAPE '\\'");
	}
}

/// Lowercased title and message, matched by `search`.
///
/// SQLite's `LOWER` only folds ASCII, so folding happens here. Title and
/// message never change after insert, so the column never goes stale.
fn search_text(title: &str, message: &str) -> String {
	format!("{title}\n{message}").to_lowercase()
}

fn escape_like(term: &str) -> String {
	let mut escaped = String::with_capacity(term.len());
	for c in term.chars() {
		if matches!(c, '%' | '_' | '\\') {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

// Fixed-width UTC timestamps so that string comparison in SQL is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|_| IssueServerError::InvalidDateTime(s.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
struct IssueRow {
	id: String,
	fingerprint: String,
	level: String,
	status: String,
	title: String,
	message: String,
	stack: Option<String>,
	occurrence_count: i64,
	first_seen_at: String,
	last_seen_at: String,
	resolved_by: Option<String>,
	resolved_at: Option<String>,
	user_id: Option<String>,
	revision: i64,
	created_at: String,
	updated_at: String,
}

impl TryFrom<IssueRow> for Issue {
	type Error = IssueServerError;

	fn try_from(row: IssueRow) -> Result<Self> {
		Ok(Issue {
			id: IssueId(row.id.parse()?),
			fingerprint: row.fingerprint,
			level: row
				.level
				.parse()
				.map_err(|_| IssueServerError::Parse(format!("invalid level: {}", row.level)))?,
			status: row
				.status
				.parse()
				.map_err(|_| IssueServerError::Parse(format!("invalid status: {}", row.status)))?,
			title: row.title,
			message: row.message,
			stack: row.stack,
			occurrence_count: row.occurrence_count as u64,
			first_seen_at: parse_datetime(&row.first_seen_at)?,
			last_seen_at: parse_datetime(&row.last_seen_at)?,
			resolved_by: row.resolved_by,
			resolved_at: row.resolved_at.map(|s| parse_datetime(&s)).transpose()?,
			user_id: row.user_id,
			revision: row.revision as u64,
			created_at: parse_datetime(&row.created_at)?,
			updated_at: parse_datetime(&row.updated_at)?,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
	id: String,
	issue_id: String,
	fingerprint: String,
	level: String,
	message: String,
	user_id: Option<String>,
	request_path: Option<String>,
	metadata: String,
	occurred_at: String,
}

impl TryFrom<EventRow> for IssueEvent {
	type Error = IssueServerError;

	fn try_from(row: EventRow) -> Result<Self> {
		Ok(IssueEvent {
			id: IssueEventId(row.id.parse()?),
			issue_id: IssueId(row.issue_id.parse()?),
			fingerprint: row.fingerprint,
			level: row
				.level
				.parse()
				.map_err(|_| IssueServerError::Parse(format!("invalid level: {}", row.level)))?,
			message: row.message,
			user_id: row.user_id,
			request_path: row.request_path,
			metadata: serde_json::from_str(&row.metadata)?,
			occurred_at: parse_datetime(&row.occurred_at)?,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
	total: i64,
	open: i64,
	resolved: i64,
	closed: i64,
	error: i64,
	warning: i64,
	info: i64,
	debug: i64,
}

impl From<StatsRow> for IssueStats {
	fn from(row: StatsRow) -> Self {
		IssueStats {
			total: row.total as u64,
			open: row.open as u64,
			resolved: row.resolved as u64,
			closed: row.closed as u64,
			by_level: LevelCounts {
				error: row.error as u64,
				warning: row.warning as u64,
				info: row.info as u64,
				debug: row.debug as u64,
			},
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
	notifications_enabled: bool,
	notification_min_level: String,
	updated_at: String,
	updated_by: Option<String>,
}

impl TryFrom<SettingsRow> for AdminSettings {
	type Error = IssueServerError;

	fn try_from(row: SettingsRow) -> Result<Self> {
		Ok(AdminSettings {
			notifications_enabled: row.notifications_enabled,
			notification_min_level: row.notification_min_level.parse().map_err(|_| {
				IssueServerError::Parse(format!("invalid level: {}", row.notification_min_level))
			})?,
			updated_at: parse_datetime(&row.updated_at)?,
			updated_by: row.updated_by,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
	id: i64,
	issue_id: String,
	kind: String,
	level: String,
	title: String,
	message: String,
	occurrence_count: i64,
	created_at: String,
	attempts: i64,
}

impl TryFrom<OutboxRow> for Notification {
	type Error = IssueServerError;

	fn try_from(row: OutboxRow) -> Result<Self> {
		Ok(Notification {
			id: row.id,
			issue_id: IssueId(row.issue_id.parse()?),
			kind: row
				.kind
				.parse()
				.map_err(|_| IssueServerError::Parse(format!("invalid kind: {}", row.kind)))?,
			level: row
				.level
				.parse()
				.map_err(|_| IssueServerError::Parse(format!("invalid level: {}", row.level)))?,
			title: row.title,
			message: row.message,
			occurrence_count: row.occurrence_count as u64,
			created_at: parse_datetime(&row.created_at)?,
			attempts: row.attempts as u32,
		})
	}
}
