//! Retention sweep and its hourly schedule.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_query_binder::SqlxValues;
use sqlx::Database;
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    backend::RowsAffected, FsEvent, LogEvent, ProviderEvent, Result, Store,
    CLEANUP_SESSION_TIMEOUT,
};

/// Cadence of the retention sweep.
pub const RETENTION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Outcome of one sweep, one entry per event table.
///
/// Each table is swept in its own session, so a failure in one does not
/// prevent the others from being cleaned.
#[derive(Debug)]
pub struct CleanupReport {
    pub fs_events: Result<u64>,
    pub provider_events: Result<u64>,
    pub log_events: Result<u64>,
}

impl CleanupReport {
    pub fn is_ok(&self) -> bool {
        self.fs_events.is_ok() && self.provider_events.is_ok() && self.log_events.is_ok()
    }

    /// Rows deleted across the tables that were swept successfully.
    pub fn deleted(&self) -> u64 {
        [&self.fs_events, &self.provider_events, &self.log_events]
            .into_iter()
            .filter_map(|res| res.as_ref().ok())
            .sum()
    }
}

impl<DB> Store<DB>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    /// Deletes every event whose timestamp is strictly before `timestamp`.
    pub async fn cleanup(&self, timestamp: DateTime<Utc>) -> CleanupReport {
        let fs_events =
            FsEvent::cleanup(&self.session(CLEANUP_SESSION_TIMEOUT), timestamp).await;
        if let Err(e) = &fs_events {
            tracing::error!(error = %e, "unable to delete fs events");
        }

        let provider_events =
            ProviderEvent::cleanup(&self.session(CLEANUP_SESSION_TIMEOUT), timestamp).await;
        if let Err(e) = &provider_events {
            tracing::error!(error = %e, "unable to delete provider events");
        }

        let log_events =
            LogEvent::cleanup(&self.session(CLEANUP_SESSION_TIMEOUT), timestamp).await;
        if let Err(e) = &log_events {
            tracing::error!(error = %e, "unable to delete log events");
        }

        CleanupReport {
            fs_events,
            provider_events,
            log_events,
        }
    }
}

/// How long events are kept. A window of zero hours disables expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    hours: u32,
}

impl Retention {
    pub fn from_hours(hours: u32) -> Option<Self> {
        (hours > 0).then_some(Self { hours })
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// The cutoff for a sweep starting at `now`, saturating at the earliest
    /// representable instant.
    pub fn watermark(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::try_hours(i64::from(self.hours))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Starts the hourly sweep, or returns `None` when retention is disabled.
///
/// The first sweep runs one [`RETENTION_INTERVAL`] after this call.
pub fn spawn_retention<DB>(store: Store<DB>, hours: u32) -> Option<JoinHandle<()>>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
{
    let Some(retention) = Retention::from_hours(hours) else {
        tracing::debug!("retention not set, no event will be deleted");
        return None;
    };

    tracing::debug!(
        retention_hours = retention.hours(),
        "start event retention check, old events will be checked every hour"
    );

    Some(tokio::spawn(async move {
        let mut interval =
            tokio::time::interval_at(Instant::now() + RETENTION_INTERVAL, RETENTION_INTERVAL);

        loop {
            interval.tick().await;

            let report = store.cleanup(retention.watermark(Utc::now())).await;
            tracing::debug!(deleted = report.deleted(), ok = report.is_ok(), "retention sweep done");
        }
    }))
}
