mod transport;

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use eventstore_sql::{
    initialize, spawn_retention, Connection, ConnectionConfig, Notifier, RowsAffected, Store,
};
use eventstore_sql_migrator::Migrator;
use sea_query_binder::SqlxValues;
use sqlx::Database;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Parser)]
#[command(name = "eventstore", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Migrates the database, then stores deliveries read from stdin
    Serve(ServeArgs),
    /// Applies pending schema migrations and exits
    Migrate(DbArgs),
    /// Drops every eventstore table, events included
    Reset(DbArgs),
}

#[derive(Args)]
struct DbArgs {
    /// Database driver, `postgres` or `mysql`
    #[arg(long, env = "EVENTSTORE_DRIVER")]
    driver: String,

    /// Connection string
    #[arg(long, env = "EVENTSTORE_DSN", hide_env_values = true)]
    dsn: String,

    /// URL-encoded TLS parameters: root_cert, client_cert, client_key, tls_mode
    #[arg(long, env = "EVENTSTORE_CUSTOM_TLS")]
    custom_tls: Option<String>,

    /// Maximum pooled connections, 0 for the default
    #[arg(long, env = "EVENTSTORE_POOL_SIZE", default_value_t = 0)]
    pool_size: u32,
}

impl DbArgs {
    fn config(&self, debug: bool) -> ConnectionConfig {
        ConnectionConfig {
            driver: self.driver.to_owned(),
            dsn: self.dsn.to_owned(),
            custom_tls: self.custom_tls.to_owned(),
            pool_size: self.pool_size,
            debug,
        }
    }
}

impl Command {
    /// Maintenance commands log every SQL statement they run.
    fn connection_config(&self) -> ConnectionConfig {
        match self {
            Self::Serve(args) => args.db.config(false),
            Self::Migrate(args) | Self::Reset(args) => args.config(true),
        }
    }
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    db: DbArgs,

    /// Identifier stamped on every stored event
    #[arg(long, env = "EVENTSTORE_INSTANCE_ID", default_value = "")]
    instance_id: String,

    /// Hours to keep events, 0 keeps them forever
    #[arg(long, env = "EVENTSTORE_RETENTION", default_value_t = 0)]
    retention: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = cli.command.connection_config();
    let default_directive = if config.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let res = match cli.command {
        Command::Serve(args) => serve(args, config).await,
        Command::Migrate(_) => migrate(config).await,
        Command::Reset(_) => reset(config).await,
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: ServeArgs, config: ConnectionConfig) -> Result<()> {
    let connection = initialize(&config).await?;
    let migrator = eventstore_sql_migrator::new()?;

    match connection {
        Connection::Postgres(store) => {
            run(store, &migrator, args.instance_id, args.retention).await
        }
        Connection::MySql(store) => run(store, &migrator, args.instance_id, args.retention).await,
    }
}

async fn run<DB>(
    store: Store<DB>,
    migrator: &Migrator,
    instance_id: String,
    retention: u32,
) -> Result<()>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    migrator.migrate(store.pool()).await?;

    let retention = spawn_retention(store.clone(), retention);
    let notifier = Notifier::new(store.clone(), instance_id);

    tracing::info!(instance_id = notifier.instance_id(), "eventstore ready");

    tokio::select! {
        res = transport::listen(notifier, tokio::io::stdin()) => {
            res?;
            bail!("the event source exited unexpectedly");
        }
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("shutting down");

            if let Some(retention) = retention {
                retention.abort();
            }
            store.close().await;

            Ok(())
        }
    }
}

async fn migrate(config: ConnectionConfig) -> Result<()> {
    let connection = initialize(&config).await?;
    let migrator = eventstore_sql_migrator::new()?;

    let applied = match &connection {
        Connection::Postgres(store) => migrator.migrate(store.pool()).await?,
        Connection::MySql(store) => migrator.migrate(store.pool()).await?,
    };

    tracing::info!(applied = ?applied, "database schema is up to date");

    Ok(())
}

async fn reset(config: ConnectionConfig) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"You are about to delete all the eventstore tables and events. Are you sure? (Y/n) ")
        .await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;

    if !confirmed(&answer) {
        stdout.write_all(b"Aborted!\n").await?;
        bail!("reset not confirmed");
    }

    let connection = initialize(&config).await?;
    let migrator = eventstore_sql_migrator::new()?;

    let removed = match &connection {
        Connection::Postgres(store) => migrator.reset(store.pool()).await?,
        Connection::MySql(store) => migrator.reset(store.pool()).await?,
    };

    if removed {
        tracing::info!("eventstore tables removed");
    }

    Ok(())
}

/// Only an explicit `Y`, in any case, confirms a reset.
fn confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
