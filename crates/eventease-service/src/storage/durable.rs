//! PostgreSQL storage variant.
//!
//! # Security
//!
//! - All queries use parameterized statements
//! - Backend error detail is logged server-side only
//! - `(user_id, event_id)` uniqueness is enforced by the
//!   `attendances_user_event_unique` constraint, so concurrent joins cannot
//!   both succeed
//!
//! Text ids are ordered with `COLLATE "C"` so listings sort bytewise, the
//! same order the transient store produces.

use super::{EventFilter, StorageAdapter, StorageBackend, StorageError};
use crate::models::{Attendance, Event, Role, User, Visibility};
use crate::observability::metrics::record_db_query;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::instrument;

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Per-statement timeout applied through the connection options.
const STATEMENT_TIMEOUT_SECS: u32 = 5;

const USER_COLUMNS: &str = "id, email, display_name, password_hash, role, created_at";

const EVENT_COLUMNS: &str = "id, title, description, date, location, capacity, visibility, \
                             creator_id, created_at, updated_at";

/// Durable store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DurableStore {
    pool: PgPool,
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Map an insert failure, turning a unique violation into `Duplicate`.
fn map_insert_error(err: sqlx::Error, what: &'static str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StorageError::Duplicate(what);
        }
    }
    StorageError::from(err)
}

/// Run a query, recording its duration and outcome.
async fn timed<T, F>(operation: &'static str, query: F) -> Result<T, sqlx::Error>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;
    let status = if result.is_ok() { "success" } else { "error" };
    record_db_query(operation, status, start.elapsed());
    result
}

/// Adds statement_timeout to the database URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

impl DurableStore {
    /// Connect, probe with `SELECT 1` and apply migrations.
    ///
    /// # Errors
    ///
    /// `StorageError::Backend` when any step fails or the connection does not
    /// complete within `connect_timeout`.
    #[instrument(skip_all, name = "ee.storage.connect")]
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, StorageError> {
        let url = add_query_timeout(url, STATEMENT_TIMEOUT_SECS);
        let connecting = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(1)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&url);

        let pool = tokio::time::timeout(connect_timeout, connecting)
            .await
            .map_err(|_| StorageError::Backend("Timed out connecting to database".to_string()))??;

        let store = Self::from_pool(pool);
        store.ping().await?;

        sqlx::migrate!("../../migrations")
            .run(&store.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Migration failed: {e}")))?;

        Ok(store)
    }

    /// Wrap an existing pool. Migrations must already be applied.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageAdapter for DurableStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Durable
    }

    async fn ping(&self) -> Result<(), StorageError> {
        timed("ping", sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }

    #[instrument(skip_all, name = "ee.storage.put_user")]
    async fn put_user(&self, user: User) -> Result<(), StorageError> {
        timed(
            "put_user",
            sqlx::query(
                r#"
                INSERT INTO users (id, email, display_name, password_hash, role, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.display_name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| map_insert_error(e, "user"))?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = timed(
            "get_user",
            sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let row: Option<UserRow> = timed(
            "find_user_by_email",
            sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool),
        )
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let sql =
            format!(r#"SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id COLLATE "C""#);
        let rows: Vec<UserRow> =
            timed("list_users", sqlx::query_as(&sql).fetch_all(&self.pool)).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip_all, name = "ee.storage.put_event")]
    async fn put_event(&self, event: Event) -> Result<(), StorageError> {
        timed(
            "put_event",
            sqlx::query(
                r#"
                INSERT INTO events (
                    id, title, description, date, location, capacity, visibility,
                    creator_id, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    date = EXCLUDED.date,
                    location = EXCLUDED.location,
                    capacity = EXCLUDED.capacity,
                    visibility = EXCLUDED.visibility,
                    creator_id = EXCLUDED.creator_id,
                    created_at = EXCLUDED.created_at,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(&event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.capacity)
            .bind(event.visibility.as_str())
            .bind(&event.creator_id)
            .bind(event.created_at)
            .bind(event.updated_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, StorageError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row: Option<EventRow> = timed(
            "get_event",
            sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await?;
        row.map(Event::try_from).transpose()
    }

    #[instrument(skip_all, name = "ee.storage.find_events")]
    async fn find_events(&self, filter: EventFilter) -> Result<Vec<Event>, StorageError> {
        let rows: Vec<EventRow> = match filter {
            EventFilter::All => {
                let sql =
                    format!(r#"SELECT {EVENT_COLUMNS} FROM events ORDER BY date, id COLLATE "C""#);
                timed("find_events", sqlx::query_as(&sql).fetch_all(&self.pool)).await?
            }
            EventFilter::Public => {
                let sql = format!(
                    r#"SELECT {EVENT_COLUMNS} FROM events
                       WHERE visibility = $1 ORDER BY date, id COLLATE "C""#
                );
                timed(
                    "find_events",
                    sqlx::query_as(&sql)
                        .bind(Visibility::Public.as_str())
                        .fetch_all(&self.pool),
                )
                .await?
            }
            EventFilter::CreatedBy(creator_id) => {
                let sql = format!(
                    r#"SELECT {EVENT_COLUMNS} FROM events
                       WHERE creator_id = $1 ORDER BY date, id COLLATE "C""#
                );
                timed(
                    "find_events",
                    sqlx::query_as(&sql).bind(creator_id).fetch_all(&self.pool),
                )
                .await?
            }
            EventFilter::Ids(ids) => {
                let sql = format!(
                    r#"SELECT {EVENT_COLUMNS} FROM events
                       WHERE id = ANY($1) ORDER BY date, id COLLATE "C""#
                );
                timed(
                    "find_events",
                    sqlx::query_as(&sql).bind(ids).fetch_all(&self.pool),
                )
                .await?
            }
        };
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn delete_event(&self, id: &str) -> Result<bool, StorageError> {
        let result = timed(
            "delete_event",
            sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, name = "ee.storage.put_attendance")]
    async fn put_attendance(&self, attendance: Attendance) -> Result<(), StorageError> {
        timed(
            "put_attendance",
            sqlx::query(
                r#"
                INSERT INTO attendances (user_id, event_id, joined_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&attendance.user_id)
            .bind(&attendance.event_id)
            .bind(attendance.joined_at)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| map_insert_error(e, "attendance"))?;
        Ok(())
    }

    async fn get_attendance(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Attendance>, StorageError> {
        let row: Option<AttendanceRow> = timed(
            "get_attendance",
            sqlx::query_as(
                r#"
                SELECT user_id, event_id, joined_at
                FROM attendances
                WHERE user_id = $1 AND event_id = $2
                "#,
            )
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(Attendance::from))
    }

    async fn find_attendances_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Attendance>, StorageError> {
        let rows: Vec<AttendanceRow> = timed(
            "find_attendances_for_user",
            sqlx::query_as(
                r#"
                SELECT user_id, event_id, joined_at
                FROM attendances
                WHERE user_id = $1
                ORDER BY joined_at, event_id COLLATE "C"
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(Attendance::from).collect())
    }

    async fn count_attendees(&self, event_id: &str) -> Result<u64, StorageError> {
        let (count,): (i64,) = timed(
            "count_attendees",
            sqlx::query_as("SELECT COUNT(*) FROM attendances WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool),
        )
        .await?;
        u64::try_from(count).map_err(|e| StorageError::Backend(e.to_string()))
    }

    #[instrument(skip_all, name = "ee.storage.delete_attendance")]
    async fn delete_attendance(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<bool, StorageError> {
        let result = timed(
            "delete_attendance",
            sqlx::query("DELETE FROM attendances WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Database row for users.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StorageError::Backend(format!("Unknown role in users row: {}", row.role)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

/// Database row for events.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    capacity: Option<i32>,
    visibility: String,
    creator_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StorageError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let visibility = Visibility::parse(&row.visibility).ok_or_else(|| {
            StorageError::Backend(format!(
                "Unknown visibility in events row: {}",
                row.visibility
            ))
        })?;
        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            capacity: row.capacity,
            visibility,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for attendances.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    user_id: String,
    event_id: String,
    joined_at: DateTime<Utc>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            user_id: row.user_id,
            event_id: row.event_id,
            joined_at: row.joined_at,
        }
    }
}
