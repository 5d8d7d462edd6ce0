//! The three persisted event kinds.
//!
//! Rows are append-only: a record is inserted once by `create` and only ever
//! removed by the retention sweep or a schema reset.

use chrono::{DateTime, Utc};
use sea_query::{Expr, Iden, Query};
use sea_query_binder::SqlxValues;
use serde::{Deserialize, Serialize};
use sqlx::Database;
use ulid::Ulid;

use crate::{backend::RowsAffected, FsEvents, LogEvents, ProviderEvents, Result, Session};

/// Returns a new time-sortable identifier.
pub fn generate_id() -> String {
    Ulid::new().to_string()
}

/// Nanoseconds since the Unix epoch, saturating outside the representable range.
pub fn unix_nanos(value: DateTime<Utc>) -> i64 {
    value.timestamp_nanos_opt().unwrap_or(if value.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// A filesystem operation performed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FsEvent {
    #[serde(skip_deserializing)]
    pub id: String,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    pub action: String,
    pub username: String,
    pub fs_path: String,
    #[serde(default)]
    pub fs_target_path: Option<String>,
    pub virtual_path: String,
    #[serde(default)]
    pub virtual_target_path: Option<String>,
    #[serde(default)]
    pub ssh_cmd: Option<String>,
    #[serde(default)]
    pub file_size: i64,
    /// Milliseconds
    #[serde(default)]
    pub elapsed: i64,
    pub status: i32,
    pub protocol: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub fs_provider: Option<i32>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub open_flags: Option<i32>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(skip_deserializing)]
    pub instance_id: String,
}

/// An administrative change to a configuration object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProviderEvent {
    #[serde(skip_deserializing)]
    pub id: String,
    pub timestamp: i64,
    pub action: String,
    pub username: String,
    #[serde(default)]
    pub ip: Option<String>,
    pub object_type: String,
    pub object_name: String,
    #[serde(default, with = "base64_bytes")]
    pub object_data: Vec<u8>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(skip_deserializing)]
    pub instance_id: String,
}

/// A protocol-level log line, such as a failed login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEvent {
    #[serde(skip_deserializing)]
    pub id: String,
    pub timestamp: i64,
    pub event: i32,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(skip_deserializing)]
    pub instance_id: String,
}

impl FsEvent {
    /// Assigns a fresh identifier and inserts the row.
    pub async fn create<DB>(&mut self, session: &Session<DB>) -> Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        self.id = generate_id();

        let statement = Query::insert()
            .into_table(FsEvents::Table)
            .columns([
                FsEvents::Id,
                FsEvents::Timestamp,
                FsEvents::Action,
                FsEvents::Username,
                FsEvents::FsPath,
                FsEvents::FsTargetPath,
                FsEvents::VirtualPath,
                FsEvents::VirtualTargetPath,
                FsEvents::SshCmd,
                FsEvents::FileSize,
                FsEvents::Elapsed,
                FsEvents::Status,
                FsEvents::Protocol,
                FsEvents::SessionId,
                FsEvents::Ip,
                FsEvents::FsProvider,
                FsEvents::Bucket,
                FsEvents::Endpoint,
                FsEvents::OpenFlags,
                FsEvents::Role,
                FsEvents::InstanceId,
            ])
            .values([
                self.id.clone().into(),
                self.timestamp.into(),
                self.action.clone().into(),
                self.username.clone().into(),
                self.fs_path.clone().into(),
                self.fs_target_path.clone().into(),
                self.virtual_path.clone().into(),
                self.virtual_target_path.clone().into(),
                self.ssh_cmd.clone().into(),
                self.file_size.into(),
                self.elapsed.into(),
                self.status.into(),
                self.protocol.clone().into(),
                self.session_id.clone().into(),
                self.ip.clone().into(),
                self.fs_provider.into(),
                self.bucket.clone().into(),
                self.endpoint.clone().into(),
                self.open_flags.into(),
                self.role.clone().into(),
                self.instance_id.clone().into(),
            ])?
            .to_owned();

        session.execute(&statement).await?;

        Ok(())
    }

    pub async fn cleanup<DB>(session: &Session<DB>, timestamp: DateTime<Utc>) -> Result<u64>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        tracing::debug!(%timestamp, "removing fs events");
        let deleted =
            delete_older_than(session, FsEvents::Table, FsEvents::Timestamp, timestamp).await?;
        tracing::debug!(num = deleted, "fs events deleted");

        Ok(deleted)
    }
}

impl ProviderEvent {
    /// Assigns a fresh identifier and inserts the row.
    pub async fn create<DB>(&mut self, session: &Session<DB>) -> Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        self.id = generate_id();

        let statement = Query::insert()
            .into_table(ProviderEvents::Table)
            .columns([
                ProviderEvents::Id,
                ProviderEvents::Timestamp,
                ProviderEvents::Action,
                ProviderEvents::Username,
                ProviderEvents::Ip,
                ProviderEvents::ObjectType,
                ProviderEvents::ObjectName,
                ProviderEvents::ObjectData,
                ProviderEvents::Role,
                ProviderEvents::InstanceId,
            ])
            .values([
                self.id.clone().into(),
                self.timestamp.into(),
                self.action.clone().into(),
                self.username.clone().into(),
                self.ip.clone().into(),
                self.object_type.clone().into(),
                self.object_name.clone().into(),
                self.object_data.clone().into(),
                self.role.clone().into(),
                self.instance_id.clone().into(),
            ])?
            .to_owned();

        session.execute(&statement).await?;

        Ok(())
    }

    pub async fn cleanup<DB>(session: &Session<DB>, timestamp: DateTime<Utc>) -> Result<u64>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        tracing::debug!(%timestamp, "removing provider events");
        let deleted = delete_older_than(
            session,
            ProviderEvents::Table,
            ProviderEvents::Timestamp,
            timestamp,
        )
        .await?;
        tracing::debug!(num = deleted, "provider events deleted");

        Ok(deleted)
    }
}

impl LogEvent {
    /// Assigns a fresh identifier and inserts the row.
    pub async fn create<DB>(&mut self, session: &Session<DB>) -> Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        self.id = generate_id();

        let statement = Query::insert()
            .into_table(LogEvents::Table)
            .columns([
                LogEvents::Id,
                LogEvents::Timestamp,
                LogEvents::Event,
                LogEvents::Protocol,
                LogEvents::Username,
                LogEvents::Ip,
                LogEvents::Message,
                LogEvents::Role,
                LogEvents::InstanceId,
            ])
            .values([
                self.id.clone().into(),
                self.timestamp.into(),
                self.event.into(),
                self.protocol.clone().into(),
                self.username.clone().into(),
                self.ip.clone().into(),
                self.message.clone().into(),
                self.role.clone().into(),
                self.instance_id.clone().into(),
            ])?
            .to_owned();

        session.execute(&statement).await?;

        Ok(())
    }

    pub async fn cleanup<DB>(session: &Session<DB>, timestamp: DateTime<Utc>) -> Result<u64>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        tracing::debug!(%timestamp, "removing log events");
        let deleted =
            delete_older_than(session, LogEvents::Table, LogEvents::Timestamp, timestamp).await?;
        tracing::debug!(num = deleted, "log events deleted");

        Ok(deleted)
    }
}

async fn delete_older_than<DB, T, C>(
    session: &Session<DB>,
    table: T,
    column: C,
    timestamp: DateTime<Utc>,
) -> Result<u64>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    T: Iden + 'static,
    C: Iden + 'static,
{
    let statement = Query::delete()
        .from_table(table)
        .and_where(Expr::col(column).lt(unix_nanos(timestamp)))
        .to_owned();

    session.execute(&statement).await
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = String::deserialize(deserializer)?;
        STANDARD.decode(value).map_err(serde::de::Error::custom)
    }
}
