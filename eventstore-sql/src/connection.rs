//! Backend selection, pool configuration and the startup liveness probe.

use std::{str::FromStr, time::Duration};

use sqlx::{pool::PoolOptions, ConnectOptions, Connection as _, Database, Pool};

use crate::{Error, Result, Store, TlsConfig};

/// Maximum open connections when no pool size is configured.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Idle connections are closed after this long.
pub const MAX_IDLE_TIME: Duration = Duration::from_secs(4 * 60);

/// Connections are recycled after this long, idle or not, so that proxies
/// between the store and the database never see stale sockets.
pub const MAX_LIFETIME: Duration = Duration::from_secs(2 * 60);

/// How long the liveness probe waits for a connection.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// The relational engines an event store can be initialized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    MySql,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            other => Err(Error::UnsupportedBackend(other.to_owned())),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::MySql => f.write_str("mysql"),
        }
    }
}

/// Everything needed to open the shared pool.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub driver: String,
    pub dsn: String,
    /// Url-query encoded [`TlsConfig`], MySQL only.
    pub custom_tls: Option<String>,
    /// Maximum open connections, `0` for [`DEFAULT_POOL_SIZE`].
    pub pool_size: u32,
    /// Log every statement.
    pub debug: bool,
}

/// An initialized store for whichever backend was configured.
#[derive(Clone)]
pub enum Connection {
    #[cfg(feature = "postgres")]
    Postgres(Store<sqlx::Postgres>),
    #[cfg(feature = "mysql")]
    MySql(Store<sqlx::MySql>),
}

impl Connection {
    pub fn kind(&self) -> BackendKind {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => BackendKind::Postgres,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => BackendKind::MySql,
        }
    }
}

/// Opens and probes the pool described by `config`.
///
/// Configuration problems are reported before any connection is attempted;
/// a failed probe is [`Error::ConnectionUnreachable`].
pub async fn initialize(config: &ConnectionConfig) -> Result<Connection> {
    let kind = config.driver.parse::<BackendKind>()?;
    let custom_tls = config.custom_tls.as_deref().unwrap_or_default();

    match kind {
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => {
            if !custom_tls.trim().is_empty() {
                tracing::warn!("custom tls config is only used by the mysql driver, ignoring it");
            }

            let options = sqlx::postgres::PgConnectOptions::from_str(&config.dsn)
                .map_err(Error::InvalidConnectionString)?;
            let pool = connect(with_logging(options, config.debug), config.pool_size).await?;

            Ok(Connection::Postgres(pool.into()))
        }
        #[cfg(feature = "mysql")]
        BackendKind::MySql => {
            let tls = TlsConfig::parse(custom_tls)?;
            let mut options = sqlx::mysql::MySqlConnectOptions::from_str(&config.dsn)
                .map_err(Error::InvalidConnectionString)?;
            if let Some(tls) = tls {
                options = tls.apply(options);
            }
            let pool = connect(with_logging(options, config.debug), config.pool_size).await?;

            Ok(Connection::MySql(pool.into()))
        }
        #[allow(unreachable_patterns)]
        other => Err(Error::UnsupportedBackend(other.to_string())),
    }
}

fn with_logging<O: ConnectOptions>(options: O, debug: bool) -> O {
    if debug {
        options
            .log_statements(log::LevelFilter::Info)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(1))
    } else {
        options.disable_statement_logging()
    }
}

/// Builds the pool lazily, then proves reachability with a ping.
pub async fn connect<DB: Database>(
    options: <DB::Connection as sqlx::Connection>::Options,
    pool_size: u32,
) -> Result<Pool<DB>> {
    let pool_size = if pool_size == 0 {
        DEFAULT_POOL_SIZE
    } else {
        pool_size
    };

    let pool = PoolOptions::<DB>::new()
        .max_connections(pool_size)
        .idle_timeout(MAX_IDLE_TIME)
        .max_lifetime(MAX_LIFETIME)
        .acquire_timeout(PROBE_TIMEOUT)
        .connect_lazy_with(options);

    probe(&pool).await?;

    Ok(pool)
}

/// Acquires a pooled connection and pings it.
pub async fn probe<DB: Database>(pool: &Pool<DB>) -> Result<()> {
    let mut conn = pool.acquire().await.map_err(Error::ConnectionUnreachable)?;
    conn.ping().await.map_err(Error::ConnectionUnreachable)?;

    Ok(())
}
