use std::str::FromStr;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use logtrail_application::{LogRecordQuery, LogRecordRepository};
use logtrail_core::{AppError, AppResult};
use logtrail_domain::{LogRecord, LogRecordId, NewLogRecord};

mod rows;

use rows::{LOG_ENTRY_COLUMNS, LogEntryRow};

/// Embedded schema migrations for the record store.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

// Keeps every statement well under SQLite's bound-parameter limit.
const IN_LIST_CHUNK: usize = 500;

/// Opens a SQLite pool for `database_url` and applies pending migrations.
pub async fn connect_sqlite(database_url: &str, max_connections: u32) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|error| AppError::Validation(format!("invalid DATABASE_URL: {error}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|error| {
            AppError::StoreUnavailable(format!("failed to connect to database: {error}"))
        })?;

    MIGRATOR.run(&pool).await.map_err(|error| {
        AppError::StoreUnavailable(format!("failed to run database migrations: {error}"))
    })?;

    Ok(pool)
}

/// SQLite-backed record store.
#[derive(Clone)]
pub struct SqliteLogRecordRepository {
    pool: SqlitePool,
}

impl SqliteLogRecordRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn unavailable(action: &str, error: sqlx::Error) -> AppError {
    AppError::StoreUnavailable(format!("failed to {action}: {error}"))
}

fn to_i64(value: u64, field: &str) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::Validation(format!("{field} {value} exceeds the supported range")))
}

#[async_trait]
impl LogRecordRepository for SqliteLogRecordRepository {
    async fn insert(&self, record: NewLogRecord) -> AppResult<LogRecord> {
        let args = rows::encode_json(record.args(), "args")?;
        let metadata = rows::encode_json(record.metadata(), "extra_metadata")?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO log_entries (
                timestamp, name, level, pathname, lineno, msg, args, exc_info, func, extra_metadata
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(record.timestamp())
        .bind(record.name())
        .bind(record.level().as_str())
        .bind(record.pathname())
        .bind(record.lineno())
        .bind(record.message())
        .bind(args)
        .bind(record.exc_info())
        .bind(record.function())
        .bind(metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| unavailable("insert log record", error))?;

        Ok(record.into_record(LogRecordId::new(id)))
    }

    async fn count(&self) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM log_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| unavailable("count log records", error))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn select_ids_older_than(&self, cutoff: f64) -> AppResult<Vec<LogRecordId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM log_entries WHERE timestamp < ? ORDER BY id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| unavailable("select expired log records", error))?;

        Ok(ids.into_iter().map(LogRecordId::new).collect())
    }

    async fn select_oldest_ids(&self, limit: u64) -> AppResult<Vec<LogRecordId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM log_entries ORDER BY timestamp ASC, id ASC LIMIT ?",
        )
        .bind(to_i64(limit, "limit")?)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| unavailable("select oldest log records", error))?;

        Ok(ids.into_iter().map(LogRecordId::new).collect())
    }

    async fn select_by_ids(&self, ids: &[LogRecordId]) -> AppResult<Vec<LogRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(IN_LIST_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {LOG_ENTRY_COLUMNS} FROM log_entries WHERE id IN ("
            ));
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.as_i64());
            }
            separated.push_unseparated(")");

            let rows = builder
                .build_query_as::<LogEntryRow>()
                .fetch_all(&self.pool)
                .await
                .map_err(|error| unavailable("load log records", error))?;

            for row in rows {
                records.push(LogRecord::try_from(row)?);
            }
        }

        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn delete_by_ids(&self, ids: &[LogRecordId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| unavailable("begin delete transaction", error))?;

        let mut deleted = 0_u64;
        for chunk in ids.chunks(IN_LIST_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM log_entries WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.as_i64());
            }
            separated.push_unseparated(")");

            let result = builder
                .build()
                .execute(&mut *transaction)
                .await
                .map_err(|error| unavailable("delete log records", error))?;
            deleted += result.rows_affected();
        }

        transaction
            .commit()
            .await
            .map_err(|error| unavailable("commit delete transaction", error))?;

        Ok(deleted)
    }

    async fn min_timestamp(&self) -> AppResult<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>("SELECT MIN(timestamp) FROM log_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| unavailable("read oldest timestamp", error))
    }

    async fn max_timestamp(&self) -> AppResult<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>("SELECT MAX(timestamp) FROM log_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| unavailable("read newest timestamp", error))
    }

    async fn list_recent(&self, query: LogRecordQuery) -> AppResult<Vec<LogRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LOG_ENTRY_COLUMNS} FROM log_entries WHERE 1 = 1"
        ));
        if let Some(level) = query.level {
            builder.push(" AND level = ").push_bind(level.as_str());
        }
        if let Some(name) = query.name {
            builder.push(" AND name = ").push_bind(name);
        }
        if let Some(since) = query.since {
            builder.push(" AND timestamp >= ").push_bind(since);
        }
        builder
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(to_i64(query.limit as u64, "limit")?);

        let rows = builder
            .build_query_as::<LogEntryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| unavailable("list recent log records", error))?;

        let mut records = rows
            .into_iter()
            .map(LogRecord::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        records.reverse();
        Ok(records)
    }
}
