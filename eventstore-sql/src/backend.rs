//! Runtime view of which SQL dialect a pool speaks.

#[cfg(feature = "mysql")]
use sea_query::MysqlQueryBuilder;
#[cfg(feature = "postgres")]
use sea_query::PostgresQueryBuilder;
#[cfg(feature = "sqlite")]
use sea_query::SqliteQueryBuilder;
use sea_query::SchemaStatementBuilder;
use sea_query_binder::{SqlxBinder, SqlxValues};

/// SQL dialect of a [`sqlx::Database`].
///
/// Every statement in this workspace is built once with sea-query and rendered
/// for the dialect returned by [`Backend::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    #[cfg(feature = "sqlite")]
    Sqlite,
    #[cfg(feature = "mysql")]
    MySql,
    #[cfg(feature = "postgres")]
    Postgres,
}

impl Backend {
    /// Resolves the dialect from `DB::NAME`.
    ///
    /// # Panics
    ///
    /// Panics for a database whose feature is not enabled.
    pub fn of<DB: sqlx::Database>() -> Self {
        match DB::NAME {
            #[cfg(feature = "sqlite")]
            "SQLite" => Self::Sqlite,
            #[cfg(feature = "mysql")]
            "MySQL" => Self::MySql,
            #[cfg(feature = "postgres")]
            "PostgreSQL" => Self::Postgres,
            name => panic!("'{name}' not supported, consider using PostgreSQL or MySQL"),
        }
    }

    /// Renders a parameterized DML statement and its bound values.
    pub fn build_sqlx<S: SqlxBinder>(self, statement: &S) -> (String, SqlxValues) {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite => statement.build_sqlx(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            Self::MySql => statement.build_sqlx(MysqlQueryBuilder),
            #[cfg(feature = "postgres")]
            Self::Postgres => statement.build_sqlx(PostgresQueryBuilder),
        }
    }

    /// Renders a DDL statement.
    pub fn build_schema<S: SchemaStatementBuilder>(self, statement: &S) -> String {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite => statement.build(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            Self::MySql => statement.build(MysqlQueryBuilder),
            #[cfg(feature = "postgres")]
            Self::Postgres => statement.build(PostgresQueryBuilder),
        }
    }

    /// Whether the dialect can change the declared type of an existing column.
    pub fn supports_modify_column(self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite => false,
            #[cfg(feature = "mysql")]
            Self::MySql => true,
            #[cfg(feature = "postgres")]
            Self::Postgres => true,
        }
    }
}

/// Uniform access to the affected row count of a backend's query result.
pub trait RowsAffected {
    fn rows_affected(&self) -> u64;
}

#[cfg(feature = "sqlite")]
impl RowsAffected for sqlx::sqlite::SqliteQueryResult {
    fn rows_affected(&self) -> u64 {
        sqlx::sqlite::SqliteQueryResult::rows_affected(self)
    }
}

#[cfg(feature = "mysql")]
impl RowsAffected for sqlx::mysql::MySqlQueryResult {
    fn rows_affected(&self) -> u64 {
        sqlx::mysql::MySqlQueryResult::rows_affected(self)
    }
}

#[cfg(feature = "postgres")]
impl RowsAffected for sqlx::postgres::PgQueryResult {
    fn rows_affected(&self) -> u64 {
        sqlx::postgres::PgQueryResult::rows_affected(self)
    }
}
