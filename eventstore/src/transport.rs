//! Newline-delimited JSON deliveries read from a byte stream.
//!
//! Each line carries one event, tagged by `kind`:
//!
//! ```text
//! {"kind":"fs","timestamp":1700000000000000000,"action":"upload",...}
//! {"kind":"provider","action":"update","object_data":"eyJ1c2VybmFtZSI6ImFsaWNlIn0=",...}
//! {"kind":"log","event":2,"message":"login failed",...}
//! ```

use eventstore_sql::{FsEvent, LogEvent, Notifier, ProviderEvent, RowsAffected};
use sea_query_binder::SqlxValues;
use serde::Deserialize;
use sqlx::Database;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    task::JoinSet,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    Fs(FsEvent),
    Provider(ProviderEvent),
    Log(LogEvent),
}

impl Delivery {
    pub async fn deliver<DB>(self, notifier: &Notifier<DB>) -> eventstore_sql::Result<()>
    where
        DB: Database,
        for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
        SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
        DB::QueryResult: RowsAffected,
    {
        match self {
            Self::Fs(event) => notifier.notify_fs_event(event).await.map(|_| ()),
            Self::Provider(event) => notifier.notify_provider_event(event).await.map(|_| ()),
            Self::Log(event) => notifier.notify_log_event(event).await.map(|_| ()),
        }
    }
}

/// Reads deliveries until end of input, persisting each one in its own task.
///
/// Malformed lines are logged and skipped. Returns once the input is exhausted
/// and every in-flight delivery has finished.
pub async fn listen<DB, R>(notifier: Notifier<DB>, reader: R) -> std::io::Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let delivery = match serde_json::from_str::<Delivery>(line) {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed delivery");
                continue;
            }
        };

        let notifier = notifier.clone();
        tasks.spawn(async move {
            // failures are already logged by the notifier
            let _ = delivery.deliver(&notifier).await;
        });

        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}

    Ok(())
}
