#![cfg(feature = "sqlite")]

use eventstore_sql::Backend;
use eventstore_sql_migrator::{has_table, Error, Migration, Migrator, Operation};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

async fn create_pool() -> anyhow::Result<SqlitePool> {
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?)
}

async fn columns(pool: &SqlitePool, table: &str) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

async fn indexes(pool: &SqlitePool, table: &str) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_index_list(?)")
        .bind(table)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

async fn record(pool: &SqlitePool, id: &str) -> anyhow::Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS migrations (id VARCHAR(255) NOT NULL PRIMARY KEY)")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO migrations (id) VALUES (?)")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

struct Sql(&'static str, &'static str);

impl Operation for Sql {
    fn up(&self, _backend: Backend) -> Vec<String> {
        vec![self.0.to_owned()]
    }

    fn down(&self, _backend: Backend) -> Vec<String> {
        vec![self.1.to_owned()]
    }
}

struct Step(&'static str, &'static str, &'static str);

impl Migration for Step {
    fn id(&self) -> &str {
        self.0
    }

    fn operations(&self) -> Vec<Box<dyn Operation>> {
        vec![Box::new(Sql(self.1, self.2))]
    }
}

#[tokio::test]
async fn migrate_fresh_database() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;

    let applied = migrator.migrate(&pool).await?;

    assert_eq!(applied, vec!["1", "2", "3", "4", "5", "6", "7"]);
    assert_eq!(migrator.applied(&pool).await?, applied);
    assert!(has_table(&pool, "eventstore_fs_events").await?);
    assert!(has_table(&pool, "eventstore_provider_events").await?);
    assert!(has_table(&pool, "eventstore_log_events").await?);

    let fs = columns(&pool, "eventstore_fs_events").await?;
    for column in [
        "session_id",
        "fs_provider",
        "bucket",
        "endpoint",
        "open_flags",
        "role",
        "elapsed",
    ] {
        assert!(fs.iter().any(|c| c == column), "missing {column}");
    }

    let provider = columns(&pool, "eventstore_provider_events").await?;
    assert!(provider.iter().any(|c| c == "role"));

    Ok(())
}

#[tokio::test]
async fn migrate_is_idempotent() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;

    migrator.migrate(&pool).await?;
    let before = columns(&pool, "eventstore_fs_events").await?;

    assert!(migrator.migrate(&pool).await?.is_empty());
    assert_eq!(columns(&pool, "eventstore_fs_events").await?, before);
    assert_eq!(migrator.applied(&pool).await?.len(), 7);

    Ok(())
}

#[tokio::test]
async fn migrate_applies_only_pending_versions() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let mut migrator = Migrator::default();
    migrator.add_migration(Box::new(Step(
        "1",
        "CREATE TABLE t (a INTEGER)",
        "DROP TABLE t",
    )))?;
    migrator.add_migration(Box::new(Step(
        "2",
        "ALTER TABLE t ADD COLUMN b INTEGER",
        "ALTER TABLE t DROP COLUMN b",
    )))?;
    migrator.add_migration(Box::new(Step(
        "3",
        "CREATE INDEX idx_t_b ON t (b)",
        "DROP INDEX idx_t_b",
    )))?;

    sqlx::query("CREATE TABLE t (a INTEGER)")
        .execute(&pool)
        .await?;
    record(&pool, "1").await?;

    assert_eq!(migrator.migrate(&pool).await?, vec!["2", "3"]);
    assert_eq!(columns(&pool, "t").await?, vec!["a", "b"]);
    assert_eq!(migrator.applied(&pool).await?, vec!["1", "2", "3"]);

    Ok(())
}

#[tokio::test]
async fn unknown_recorded_version_aborts() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;
    record(&pool, "99").await?;

    let err = migrator.migrate(&pool).await.unwrap_err();

    assert!(matches!(err, Error::UnknownVersion(id) if id == "99"));
    assert!(!has_table(&pool, "eventstore_fs_events").await?);

    Ok(())
}

#[tokio::test]
async fn failing_version_keeps_earlier_ones() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let mut migrator = Migrator::default();
    migrator.add_migration(Box::new(Step(
        "1",
        "CREATE TABLE t (a INTEGER)",
        "DROP TABLE t",
    )))?;
    migrator.add_migration(Box::new(Step(
        "2",
        "ALTER TABLE missing ADD COLUMN b INTEGER",
        "SELECT 1",
    )))?;
    migrator.add_migration(Box::new(Step(
        "3",
        "CREATE TABLE u (a INTEGER)",
        "DROP TABLE u",
    )))?;

    let err = migrator.migrate(&pool).await.unwrap_err();

    assert!(matches!(err, Error::Step { ref id, .. } if id == "2"));
    assert_eq!(migrator.applied(&pool).await?, vec!["1"]);
    assert!(has_table(&pool, "t").await?);
    assert!(!has_table(&pool, "u").await?);

    Ok(())
}

#[tokio::test]
async fn rollback_to_reverts_newer_versions() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;
    migrator.migrate(&pool).await?;

    let reverted = migrator.rollback_to(&pool, "4").await?;

    assert_eq!(reverted, vec!["7", "6", "5"]);
    assert_eq!(migrator.applied(&pool).await?, vec!["1", "2", "3", "4"]);
    assert!(!has_table(&pool, "eventstore_log_events").await?);
    assert!(!columns(&pool, "eventstore_fs_events")
        .await?
        .iter()
        .any(|c| c == "elapsed"));

    let err = migrator.rollback_to(&pool, "42").await.unwrap_err();
    assert!(matches!(err, Error::UnknownTarget(id) if id == "42"));

    Ok(())
}

#[tokio::test]
async fn session_id_index_follows_its_version() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;
    migrator.migrate(&pool).await?;

    assert!(indexes(&pool, "eventstore_fs_events")
        .await?
        .iter()
        .any(|name| name == "idx_fs_events_session_id"));

    migrator.rollback_to(&pool, "2").await?;
    assert!(!indexes(&pool, "eventstore_fs_events")
        .await?
        .iter()
        .any(|name| name == "idx_fs_events_session_id"));

    migrator.rollback_to(&pool, "1").await?;
    assert!(!columns(&pool, "eventstore_fs_events")
        .await?
        .iter()
        .any(|c| c == "session_id"));

    Ok(())
}

#[tokio::test]
async fn reset_then_migrate_restores_schema() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;
    migrator.migrate(&pool).await?;
    let fs = columns(&pool, "eventstore_fs_events").await?;
    let provider = columns(&pool, "eventstore_provider_events").await?;
    let log = columns(&pool, "eventstore_log_events").await?;

    assert!(migrator.reset(&pool).await?);
    assert!(!has_table(&pool, "eventstore_fs_events").await?);
    assert!(!has_table(&pool, "eventstore_provider_events").await?);
    assert!(!has_table(&pool, "eventstore_log_events").await?);
    assert!(!has_table(&pool, "migrations").await?);

    migrator.migrate(&pool).await?;
    assert_eq!(columns(&pool, "eventstore_fs_events").await?, fs);
    assert_eq!(columns(&pool, "eventstore_provider_events").await?, provider);
    assert_eq!(columns(&pool, "eventstore_log_events").await?, log);

    Ok(())
}

#[tokio::test]
async fn reset_without_migrations_is_noop() -> anyhow::Result<()> {
    let pool = create_pool().await?;
    let migrator = eventstore_sql_migrator::new()?;

    assert!(!migrator.reset(&pool).await?);
    assert!(migrator.applied(&pool).await?.is_empty());

    migrator.migrate(&pool).await?;
    assert!(migrator.reset(&pool).await?);
    assert!(!migrator.reset(&pool).await?);

    Ok(())
}
