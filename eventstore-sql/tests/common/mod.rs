#![allow(dead_code)]

use chrono::{Duration, Utc};
use eventstore_sql::{
    spawn_retention, unix_nanos, Backend, Error, FsEvent, FsEvents, LogEvent, LogEvents,
    Notifier, ProviderEvent, ProviderEvents, RowsAffected, Store,
};
use sea_query::{Asterisk, Expr, Iden, Order, Query};
use sea_query_binder::SqlxValues;
use sqlx::{Database, Pool};

pub async fn create_store<DB>(pool: Pool<DB>) -> anyhow::Result<Store<DB>>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    eventstore_sql_migrator::new()?.migrate(&pool).await?;

    Ok(pool.into())
}

pub fn fs_event(timestamp: i64) -> FsEvent {
    FsEvent {
        timestamp,
        action: "upload".to_owned(),
        username: "alice".to_owned(),
        fs_path: "/srv/alice/a.txt".to_owned(),
        virtual_path: "/a.txt".to_owned(),
        file_size: 1024,
        elapsed: 35,
        status: 1,
        protocol: "SFTP".to_owned(),
        session_id: Some("SFTP_3f2a".to_owned()),
        ip: Some("127.0.0.1".to_owned()),
        fs_provider: Some(0),
        open_flags: Some(577),
        role: Some("admins".to_owned()),
        ..Default::default()
    }
}

pub fn provider_event(timestamp: i64) -> ProviderEvent {
    ProviderEvent {
        timestamp,
        action: "update".to_owned(),
        username: "admin".to_owned(),
        ip: Some("10.0.0.2".to_owned()),
        object_type: "user".to_owned(),
        object_name: "alice".to_owned(),
        object_data: br#"{"username":"alice","status":1}"#.to_vec(),
        ..Default::default()
    }
}

pub fn log_event(timestamp: i64) -> LogEvent {
    LogEvent {
        timestamp,
        event: 2,
        protocol: Some("FTP".to_owned()),
        username: Some("bob".to_owned()),
        ip: Some("192.168.1.9".to_owned()),
        message: Some("login failed".to_owned()),
        ..Default::default()
    }
}

async fn fetch_all<DB, T, E>(store: &Store<DB>, table: T, timestamp: impl Iden + 'static) -> anyhow::Result<Vec<E>>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    T: Iden + 'static,
    E: for<'r> sqlx::FromRow<'r, DB::Row> + Send + Unpin,
{
    let statement = Query::select()
        .column(Asterisk)
        .from(table)
        .order_by(timestamp, Order::Asc)
        .to_owned();
    let (sql, values) = Backend::of::<DB>().build_sqlx(&statement);

    Ok(sqlx::query_as_with::<DB, E, _>(&sql, values)
        .fetch_all(store.pool())
        .await?)
}

async fn count<DB, T>(store: &Store<DB>, table: T) -> anyhow::Result<i64>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
    T: Iden + 'static,
{
    let statement = Query::select()
        .expr(Expr::cust("COUNT(*)"))
        .from(table)
        .to_owned();
    let (sql, values) = Backend::of::<DB>().build_sqlx(&statement);
    let (count,) = sqlx::query_as_with::<DB, (i64,), _>(&sql, values)
        .fetch_one(store.pool())
        .await?;

    Ok(count)
}

pub async fn notify_round_trip<DB>(store: &Store<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    FsEvent: for<'r> sqlx::FromRow<'r, DB::Row>,
    ProviderEvent: for<'r> sqlx::FromRow<'r, DB::Row>,
    LogEvent: for<'r> sqlx::FromRow<'r, DB::Row>,
{
    let notifier = Notifier::new(store.clone(), "node-1");
    let now = unix_nanos(Utc::now());

    let fs = notifier.notify_fs_event(fs_event(now)).await?;
    let provider = notifier.notify_provider_event(provider_event(now)).await?;
    let log = notifier.notify_log_event(log_event(now)).await?;

    assert!(!fs.id.is_empty());
    assert_eq!(fs.instance_id, "node-1");
    assert_eq!(provider.instance_id, "node-1");
    assert_eq!(log.instance_id, "node-1");

    let rows: Vec<FsEvent> = fetch_all(store, FsEvents::Table, FsEvents::Timestamp).await?;
    assert_eq!(rows, vec![fs]);

    let rows: Vec<ProviderEvent> =
        fetch_all(store, ProviderEvents::Table, ProviderEvents::Timestamp).await?;
    assert_eq!(rows, vec![provider]);

    let rows: Vec<LogEvent> = fetch_all(store, LogEvents::Table, LogEvents::Timestamp).await?;
    assert_eq!(rows, vec![log]);

    Ok(())
}

pub async fn identifiers_are_distinct<DB>(store: &Store<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let notifier = Notifier::new(store.clone(), "node-1");
    let now = unix_nanos(Utc::now());

    let first = notifier.notify_log_event(log_event(now)).await?;
    let second = notifier.notify_log_event(log_event(now)).await?;

    assert_ne!(first.id, second.id);
    assert_eq!(count(store, LogEvents::Table).await?, 2);

    Ok(())
}

pub async fn cleanup_deletes_older_events<DB>(store: &Store<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let notifier = Notifier::new(store.clone(), "node-1");
    let now = Utc::now();
    let old = unix_nanos(now - Duration::hours(48));
    let recent = unix_nanos(now);

    for timestamp in [old, recent] {
        notifier.notify_fs_event(fs_event(timestamp)).await?;
        notifier.notify_provider_event(provider_event(timestamp)).await?;
        notifier.notify_log_event(log_event(timestamp)).await?;
    }

    let report = store.cleanup(now - Duration::hours(24)).await;
    assert!(report.is_ok());
    assert_eq!(report.deleted(), 3);
    assert_eq!(count(store, FsEvents::Table).await?, 1);
    assert_eq!(count(store, ProviderEvents::Table).await?, 1);
    assert_eq!(count(store, LogEvents::Table).await?, 1);

    let report = store.cleanup(now + Duration::hours(1)).await;
    assert_eq!(report.deleted(), 3);
    assert_eq!(count(store, FsEvents::Table).await?, 0);
    assert_eq!(count(store, ProviderEvents::Table).await?, 0);
    assert_eq!(count(store, LogEvents::Table).await?, 0);

    Ok(())
}

pub async fn cleanup_keeps_watermark<DB>(store: &Store<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let notifier = Notifier::new(store.clone(), "node-1");
    let watermark = Utc::now() - Duration::hours(1);

    notifier
        .notify_fs_event(fs_event(unix_nanos(watermark)))
        .await?;
    notifier
        .notify_fs_event(fs_event(unix_nanos(watermark) - 1))
        .await?;

    let report = store.cleanup(watermark).await;
    assert_eq!(report.fs_events.as_ref().ok(), Some(&1));
    assert_eq!(count(store, FsEvents::Table).await?, 1);

    Ok(())
}

pub async fn cleanup_reports_each_table<DB>(pool: Pool<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    let migrator = eventstore_sql_migrator::new()?;
    migrator.migrate(&pool).await?;
    migrator.rollback_to(&pool, "5").await?;

    let store = Store::from(pool);
    let notifier = Notifier::new(store.clone(), "node-1");
    notifier.notify_fs_event(fs_event(0)).await?;

    let report = store.cleanup(Utc::now()).await;

    assert_eq!(report.fs_events.as_ref().ok(), Some(&1));
    assert_eq!(report.provider_events.as_ref().ok(), Some(&0));
    assert!(report.log_events.is_err());
    assert!(!report.is_ok());
    assert_eq!(report.deleted(), 1);

    Ok(())
}

pub async fn write_before_migration_fails<DB>(pool: Pool<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    let notifier = Notifier::new(Store::from(pool), "node-1");

    let err = notifier
        .notify_fs_event(fs_event(unix_nanos(Utc::now())))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Sqlx(_)));

    Ok(())
}

pub async fn retention_disabled<DB>(store: &Store<DB>) -> anyhow::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    assert!(spawn_retention(store.clone(), 0).is_none());

    let handle = spawn_retention(store.clone(), 24);
    assert!(handle.as_ref().is_some_and(|h| !h.is_finished()));
    if let Some(handle) = handle {
        handle.abort();
    }

    Ok(())
}
