//! Versioned schema migrations for the eventstore tables.
//!
//! # Features
//!
//! - **`sqlite`** - Enables SQLite database support
//! - **`mysql`** - Enables MySQL database support
//! - **`postgres`** - Enables PostgreSQL database support
//!
//! All features are enabled by default.
//!
//! # Usage
//!
//! ```rust,ignore
//! let migrator = eventstore_sql_migrator::new()?;
//!
//! // Apply every pending version
//! migrator.migrate(&pool).await?;
//!
//! // Drop every table, including the bookkeeping one
//! migrator.reset(&pool).await?;
//! ```
//!
//! Progress is recorded in the `migrations` table, one row per applied
//! version identifier.
//!
//! # Migrations
//!
//! - [`InitMigration`] - Creates the filesystem and provider event tables
//! - [`M0002`] - Adds `session_id` to filesystem events
//! - [`M0003`] - Widens path columns, adds storage backend columns, indexes
//!   `session_id`
//! - [`M0004`] - Adds `role` to filesystem and provider events
//! - [`M0005`] - Adds `elapsed` to filesystem events
//! - [`M0006`] - Creates the log event table
//! - [`M0007`] - Widens `session_id`
//!
//! # Database Schema
//!
//! ## Filesystem Event Table
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | `id` | VARCHAR(36) | Event ID (ULID format) |
//! | `timestamp` | BIGINT | Nanoseconds since the Unix epoch |
//! | `action` | VARCHAR(60) | Operation, e.g. `upload` |
//! | `username` | VARCHAR(255) | Acting user |
//! | `fs_path`, `fs_target_path` | TEXT | Filesystem paths |
//! | `virtual_path`, `virtual_target_path` | TEXT | Paths as seen by the user |
//! | `ssh_cmd` | VARCHAR(60) | SSH command, if any |
//! | `file_size` | BIGINT | Bytes transferred |
//! | `elapsed` | BIGINT | Duration in milliseconds |
//! | `status` | INTEGER | Outcome code |
//! | `protocol` | VARCHAR(30) | Access protocol |
//! | `session_id` | VARCHAR(512) | Protocol session |
//! | `ip` | VARCHAR(50) | Client address |
//! | `fs_provider` | INTEGER | Storage backend kind |
//! | `bucket`, `endpoint` | VARCHAR(512) | Object storage location |
//! | `open_flags` | INTEGER | File open flags |
//! | `role` | VARCHAR(255) | Role of the user |
//! | `instance_id` | VARCHAR(60) | Producing instance |
//!
//! ## Provider Event Table
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | `id` | VARCHAR(36) | Event ID (ULID format) |
//! | `timestamp` | BIGINT | Nanoseconds since the Unix epoch |
//! | `action` | VARCHAR(60) | `add`, `update`, `delete`... |
//! | `username` | VARCHAR(255) | Administrator |
//! | `ip` | VARCHAR(50) | Client address |
//! | `object_type` | VARCHAR(50) | Kind of the changed object |
//! | `object_name` | VARCHAR(255) | Name of the changed object |
//! | `object_data` | BLOB | Serialized object (LONGBLOB on MySQL) |
//! | `role` | VARCHAR(255) | Role of the administrator |
//! | `instance_id` | VARCHAR(60) | Producing instance |
//!
//! ## Log Event Table
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | `id` | VARCHAR(36) | Event ID (ULID format) |
//! | `timestamp` | BIGINT | Nanoseconds since the Unix epoch |
//! | `event` | INTEGER | Log event kind |
//! | `protocol` | VARCHAR(30) | Access protocol |
//! | `username` | VARCHAR(255) | User, if known |
//! | `ip` | VARCHAR(50) | Client address |
//! | `message` | TEXT | Log line |
//! | `role` | VARCHAR(255) | Role of the user |
//! | `instance_id` | VARCHAR(60) | Producing instance |

mod m0001;
mod m0002;
mod m0003;
mod m0004;
mod m0005;
mod m0006;
mod m0007;
mod migrator;

pub use m0001::InitMigration;
pub use m0002::M0002;
pub use m0003::M0003;
pub use m0004::M0004;
pub use m0005::M0005;
pub use m0006::M0006;
pub use m0007::M0007;
pub use migrator::*;

/// Creates a new [`Migrator`] with every eventstore migration registered,
/// oldest first.
///
/// # Errors
///
/// Returns an error if migration registration fails.
pub fn new() -> Result<Migrator> {
    let mut migrator = Migrator::default();
    migrator.add_migration(Box::new(InitMigration))?;
    migrator.add_migration(Box::new(M0002))?;
    migrator.add_migration(Box::new(M0003))?;
    migrator.add_migration(Box::new(M0004))?;
    migrator.add_migration(Box::new(M0005))?;
    migrator.add_migration(Box::new(M0006))?;
    migrator.add_migration(Box::new(M0007))?;

    Ok(migrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_ordered() {
        let migrator = new().unwrap();

        assert_eq!(migrator.ids(), vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[test]
    fn duplicate_version_is_rejected() {
        let mut migrator = new().unwrap();
        let err = migrator.add_migration(Box::new(M0004)).unwrap_err();

        assert!(matches!(err, Error::DuplicateVersion(id) if id == "4"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn widening_renders_alter_column_on_postgres() {
        let statements = M0007
            .operations()
            .iter()
            .flat_map(|o| o.up(eventstore_sql::Backend::Postgres))
            .collect::<Vec<_>>();

        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with(r#"ALTER TABLE "eventstore_fs_events" ALTER COLUMN "session_id""#));
        assert!(statements[0].contains("varchar(512)"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn widening_is_skipped_on_sqlite() {
        let up = M0003
            .operations()
            .iter()
            .flat_map(|o| o.up(eventstore_sql::Backend::Sqlite))
            .collect::<Vec<_>>();

        assert!(up.iter().all(|sql| !sql.contains("text")));
        assert_eq!(up.len(), 8);
        assert!(M0007
            .operations()
            .iter()
            .all(|o| o.up(eventstore_sql::Backend::Sqlite).is_empty()));
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn object_data_is_longblob_on_mysql() {
        let up = InitMigration
            .operations()
            .iter()
            .flat_map(|o| o.up(eventstore_sql::Backend::MySql))
            .collect::<Vec<_>>();

        assert!(up
            .iter()
            .any(|sql| sql.contains("`object_data` longblob")));
    }
}
