//! Applies and reverts registered migrations, recording progress in the
//! bookkeeping table.
//!
//! Run migrations from a single instance: concurrent runs against the same
//! database are not coordinated.

use std::{collections::HashSet, fmt, time::Duration};

use eventstore_sql::{Backend, Migrations};
use sea_query::{Alias, ColumnDef, Expr, Query, SelectStatement, Table};
use sea_query_binder::SqlxValues;
use sqlx::{Database, Pool};

/// Budget of a whole `migrate`, `rollback_to` or `reset` call.
pub const DEFAULT_MIGRATION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// One schema change, rendered for a given dialect.
///
/// Returning no statement makes the step a no-op on that dialect.
pub trait Operation: Send + Sync {
    fn up(&self, backend: Backend) -> Vec<String>;

    fn down(&self, backend: Backend) -> Vec<String>;
}

/// A schema version: an identifier and the operations moving to it.
pub trait Migration: Send + Sync {
    fn id(&self) -> &str;

    fn operations(&self) -> Vec<Box<dyn Operation>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Revert,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => f.write_str("apply"),
            Self::Revert => f.write_str("revert"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("migration `{0}` is registered twice")]
    DuplicateVersion(String),

    #[error("applied migration `{0}` is unknown to this release")]
    UnknownVersion(String),

    #[error("migration `{0}` is not registered")]
    UnknownTarget(String),

    #[error("unable to {direction} migration `{id}`: {source}")]
    Step {
        id: String,
        direction: Direction,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("sea_query `{0}`")]
    Query(#[from] sea_query::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Ordered registry of migrations and the runner applying them.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
    timeout: Duration,
}

impl Default for Migrator {
    fn default() -> Self {
        Self {
            migrations: Vec::new(),
            timeout: DEFAULT_MIGRATION_TIMEOUT,
        }
    }
}

impl Migrator {
    /// Appends `migration` as the newest version.
    pub fn add_migration(&mut self, migration: Box<dyn Migration>) -> Result<()> {
        if self.migrations.iter().any(|m| m.id() == migration.id()) {
            return Err(Error::DuplicateVersion(migration.id().to_owned()));
        }

        self.migrations.push(migration);

        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registered identifiers, oldest first.
    pub fn ids(&self) -> Vec<&str> {
        self.migrations.iter().map(|m| m.id()).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.migrations.iter().position(|m| m.id() == id)
    }

    async fn deadline<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}

impl Migrator {
    /// Applies every registered migration that is not recorded yet, oldest
    /// first, and returns the identifiers applied.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. The run stops at the first failure, leaving the schema
    /// at the last migration that succeeded. Nothing is applied when the
    /// bookkeeping table records an identifier this registry does not know.
    pub async fn migrate<DB>(&self, pool: &Pool<DB>) -> Result<Vec<String>>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        self.deadline(async {
            create_bookkeeping_table(pool).await?;

            let applied = self.validated_applied(pool).await?;
            let mut done = Vec::new();

            for migration in self.migrations.iter().filter(|m| !applied.contains(m.id())) {
                self.apply(pool, migration.as_ref()).await?;
                done.push(migration.id().to_owned());
            }

            if done.is_empty() {
                tracing::debug!("database schema is up to date");
            }

            Ok(done)
        })
        .await
    }

    /// Reverts applied migrations newest first, stopping before `id`, and
    /// returns the identifiers reverted.
    pub async fn rollback_to<DB>(&self, pool: &Pool<DB>, id: &str) -> Result<Vec<String>>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        self.deadline(self.revert_after(pool, id)).await
    }

    /// Reverts every migration, then drops the bookkeeping table.
    ///
    /// Returns `false` without touching anything when the bookkeeping table
    /// does not exist. All event data is lost.
    pub async fn reset<DB>(&self, pool: &Pool<DB>) -> Result<bool>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        self.deadline(async {
            if !has_bookkeeping_table(pool).await? {
                tracing::info!("no migration was applied, nothing to do");
                return Ok(false);
            }

            if let Some(first) = self.migrations.first() {
                self.revert_after(pool, first.id()).await?;

                if self.validated_applied(pool).await?.contains(first.id()) {
                    self.revert(pool, first.as_ref()).await?;
                }
            }

            let statement = Table::drop()
                .table(Migrations::Table)
                .if_exists()
                .to_owned();
            let sql = Backend::of::<DB>().build_schema(&statement);
            sqlx::raw_sql(&sql).execute(pool).await?;

            tracing::info!("database schema removed");

            Ok(true)
        })
        .await
    }

    /// Recorded identifiers, or an empty list before the first migration.
    pub async fn applied<DB>(&self, pool: &Pool<DB>) -> Result<Vec<String>>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        if !has_bookkeeping_table(pool).await? {
            return Ok(Vec::new());
        }

        let mut ids = fetch_applied(pool).await?;
        ids.sort_by_key(|id| self.position(id).unwrap_or(usize::MAX));

        Ok(ids)
    }

    async fn revert_after<DB>(&self, pool: &Pool<DB>, id: &str) -> Result<Vec<String>>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        let Some(target) = self.position(id) else {
            return Err(Error::UnknownTarget(id.to_owned()));
        };

        if !has_bookkeeping_table(pool).await? {
            return Ok(Vec::new());
        }

        let applied = self.validated_applied(pool).await?;
        let mut done = Vec::new();

        for migration in self.migrations[target + 1..].iter().rev() {
            if applied.contains(migration.id()) {
                self.revert(pool, migration.as_ref()).await?;
                done.push(migration.id().to_owned());
            }
        }

        Ok(done)
    }

    async fn validated_applied<DB>(&self, pool: &Pool<DB>) -> Result<HashSet<String>>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
        usize: sqlx::ColumnIndex<DB::Row>,
    {
        let mut applied = fetch_applied(pool).await?;
        applied.sort();

        if let Some(unknown) = applied.iter().find(|id| self.position(id).is_none()) {
            return Err(Error::UnknownVersion(unknown.to_owned()));
        }

        Ok(applied.into_iter().collect())
    }

    async fn apply<DB>(&self, pool: &Pool<DB>, migration: &dyn Migration) -> Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    {
        let backend = Backend::of::<DB>();
        let id = migration.id();
        let step = |source: sqlx::Error| Error::Step {
            id: id.to_owned(),
            direction: Direction::Apply,
            source,
        };

        let mut tx = pool.begin().await?;

        for operation in migration.operations() {
            for sql in operation.up(backend) {
                sqlx::raw_sql(&sql)
                    .execute(&mut *tx)
                    .await
                    .map_err(step)?;
            }
        }

        let statement = Query::insert()
            .into_table(Migrations::Table)
            .columns([Migrations::Id])
            .values([id.into()])?
            .to_owned();
        let (sql, values) = backend.build_sqlx(&statement);
        sqlx::query_with::<DB, _>(&sql, values)
            .execute(&mut *tx)
            .await
            .map_err(step)?;

        tx.commit().await.map_err(step)?;

        tracing::info!(id, "migration applied");

        Ok(())
    }

    async fn revert<DB>(&self, pool: &Pool<DB>, migration: &dyn Migration) -> Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    {
        let backend = Backend::of::<DB>();
        let id = migration.id();
        let step = |source: sqlx::Error| Error::Step {
            id: id.to_owned(),
            direction: Direction::Revert,
            source,
        };

        let mut tx = pool.begin().await?;

        for operation in migration.operations().iter().rev() {
            for sql in operation.down(backend) {
                sqlx::raw_sql(&sql)
                    .execute(&mut *tx)
                    .await
                    .map_err(step)?;
            }
        }

        let statement = Query::delete()
            .from_table(Migrations::Table)
            .and_where(Expr::col(Migrations::Id).eq(id))
            .to_owned();
        let (sql, values) = backend.build_sqlx(&statement);
        sqlx::query_with::<DB, _>(&sql, values)
            .execute(&mut *tx)
            .await
            .map_err(step)?;

        tx.commit().await.map_err(step)?;

        tracing::info!(id, "migration reverted");

        Ok(())
    }
}

async fn create_bookkeeping_table<DB>(pool: &Pool<DB>) -> Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
{
    let statement = Table::create()
        .table(Migrations::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Migrations::Id)
                .string_len(255)
                .not_null()
                .primary_key(),
        )
        .to_owned();

    let sql = Backend::of::<DB>().build_schema(&statement);
    sqlx::raw_sql(&sql).execute(pool).await?;

    Ok(())
}

async fn fetch_applied<DB>(pool: &Pool<DB>) -> Result<Vec<String>>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let statement = Query::select()
        .column(Migrations::Id)
        .from(Migrations::Table)
        .to_owned();

    let (sql, values) = Backend::of::<DB>().build_sqlx(&statement);
    let rows = sqlx::query_as_with::<DB, (String,), _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Whether the bookkeeping table exists in the current schema.
pub async fn has_bookkeeping_table<DB>(pool: &Pool<DB>) -> Result<bool>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    has_table(pool, "migrations").await
}

/// Whether `table` exists in the current schema.
pub async fn has_table<DB>(pool: &Pool<DB>, table: &str) -> Result<bool>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let backend = Backend::of::<DB>();
    let (sql, values) = backend.build_sqlx(&table_exists_statement(backend, table));
    let (count,) = sqlx::query_as_with::<DB, (i64,), _>(&sql, values)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

fn table_exists_statement(backend: Backend, table: &str) -> SelectStatement {
    let mut statement = Query::select();
    statement.expr(Expr::cust("COUNT(*)"));

    match backend {
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => statement
            .from(Alias::new("sqlite_master"))
            .and_where(Expr::col(Alias::new("type")).eq("table"))
            .and_where(Expr::col(Alias::new("name")).eq(table)),
        #[cfg(feature = "mysql")]
        Backend::MySql => statement
            .from((Alias::new("information_schema"), Alias::new("tables")))
            .and_where(Expr::col(Alias::new("table_schema")).eq(Expr::cust("DATABASE()")))
            .and_where(Expr::col(Alias::new("table_name")).eq(table)),
        #[cfg(feature = "postgres")]
        Backend::Postgres => statement
            .from((Alias::new("information_schema"), Alias::new("tables")))
            .and_where(Expr::col(Alias::new("table_schema")).eq(Expr::cust("current_schema()")))
            .and_where(Expr::col(Alias::new("table_name")).eq(table)),
    };

    statement
}
