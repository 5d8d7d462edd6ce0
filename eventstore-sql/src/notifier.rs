use std::sync::Arc;

use sea_query_binder::SqlxValues;
use sqlx::Database;

use crate::{backend::RowsAffected, FsEvent, LogEvent, ProviderEvent, Result, Store};

/// Entry point for delivered events.
///
/// Stamps each event with the configured instance identifier and persists it
/// in a default session. Failed writes are logged and returned to the caller;
/// nothing is retried or queued.
pub struct Notifier<DB: Database> {
    store: Store<DB>,
    instance_id: Arc<str>,
}

impl<DB: Database> Clone for Notifier<DB> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            instance_id: self.instance_id.clone(),
        }
    }
}

impl<DB: Database> Notifier<DB> {
    pub fn new(store: Store<DB>, instance_id: impl Into<String>) -> Self {
        Self {
            store,
            instance_id: Arc::from(instance_id.into()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn store(&self) -> &Store<DB> {
        &self.store
    }
}

impl<DB> Notifier<DB>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    /// Persists `event` and returns the stored record.
    pub async fn notify_fs_event(&self, mut event: FsEvent) -> Result<FsEvent> {
        event.instance_id = self.instance_id.to_string();

        if let Err(e) = event.create(&self.store.default_session()).await {
            tracing::warn!(
                action = %event.action,
                username = %event.username,
                virtual_path = %event.virtual_path,
                error = %e,
                "unable to save fs event"
            );

            return Err(e);
        }

        Ok(event)
    }

    pub async fn notify_provider_event(&self, mut event: ProviderEvent) -> Result<ProviderEvent> {
        event.instance_id = self.instance_id.to_string();

        if let Err(e) = event.create(&self.store.default_session()).await {
            tracing::warn!(action = %event.action, error = %e, "unable to save provider event");

            return Err(e);
        }

        Ok(event)
    }

    pub async fn notify_log_event(&self, mut event: LogEvent) -> Result<LogEvent> {
        event.instance_id = self.instance_id.to_string();

        if let Err(e) = event.create(&self.store.default_session()).await {
            tracing::warn!(event = event.event, error = %e, "unable to save log event");

            return Err(e);
        }

        Ok(event)
    }
}
