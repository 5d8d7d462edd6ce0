use std::time::Duration;

/// Errors raised while connecting to, writing to or sweeping the event store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported database driver `{0}`, expected `postgres` or `mysql`")]
    UnsupportedBackend(String),

    #[error("invalid custom tls config: {0}")]
    InvalidTlsConfig(String),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[source] sqlx::Error),

    #[error("database unreachable: {0}")]
    ConnectionUnreachable(#[source] sqlx::Error),

    #[error("session deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("sea_query `{0}`")]
    Query(#[from] sea_query::error::Error),
}

impl Error {
    /// Configuration problems detected before any connection attempt.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnsupportedBackend(_) | Self::InvalidTlsConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
