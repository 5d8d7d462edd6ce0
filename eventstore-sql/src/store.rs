//! Pool handle and deadline-bound sessions.

use std::{future::Future, time::Duration};

use sea_query_binder::{SqlxBinder, SqlxValues};
use sqlx::{Database, Pool};
use tokio::time::Instant;

use crate::{backend::RowsAffected, Backend, Error, Result};

/// Budget applied by [`Store::default_session`], used by event writes.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(20);

/// Budget of each per-table delete during a retention sweep.
pub const CLEANUP_SESSION_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Shared handle to the event database.
///
/// Constructed once at startup, either by [`initialize`](crate::initialize) or
/// from an existing pool, and cloned into every component that writes or
/// sweeps. Cloning is cheap: pooling is handled by sqlx.
///
/// ```rust,ignore
/// let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await?;
/// let store: Store<sqlx::Sqlite> = pool.into();
///
/// let session = store.default_session();
/// ```
pub struct Store<DB: Database>(Pool<DB>);

impl<DB: Database> Clone for Store<DB> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<DB: Database> Store<DB> {
    pub fn pool(&self) -> &Pool<DB> {
        &self.0
    }

    /// Opens a unit of work that fails with [`Error::Timeout`] once `timeout`
    /// has elapsed.
    pub fn session(&self, timeout: Duration) -> Session<DB> {
        Session {
            pool: self.0.clone(),
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn default_session(&self) -> Session<DB> {
        self.session(DEFAULT_SESSION_TIMEOUT)
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.0.close().await;
    }
}

impl<DB: Database> From<Pool<DB>> for Store<DB> {
    fn from(value: Pool<DB>) -> Self {
        Self(value)
    }
}

/// A time-bounded unit of work against the backend.
///
/// The deadline is fixed when the session is opened and shared by every
/// statement run through it. Dropping the session, or the future of one of its
/// statements, releases it; the connection goes back to the pool either way.
pub struct Session<DB: Database> {
    pool: Pool<DB>,
    timeout: Duration,
    deadline: Instant,
}

impl<DB: Database> Session<DB> {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Runs `fut` unless the deadline passes first.
    pub async fn with_deadline<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout_at(self.deadline, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }
}

impl<DB> Session<DB>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    /// Executes a DML statement and returns the number of affected rows.
    pub async fn execute<S: SqlxBinder>(&self, statement: &S) -> Result<u64> {
        let (sql, values) = Backend::of::<DB>().build_sqlx(statement);
        let res = self
            .with_deadline(sqlx::query_with::<DB, _>(&sql, values).execute(&self.pool))
            .await?;

        Ok(res.rows_affected())
    }
}
