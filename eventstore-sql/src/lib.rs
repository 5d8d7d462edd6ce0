//! SQL persistence for audit events.
//!
//! This crate stores three kinds of append-only records, filesystem
//! operations ([`FsEvent`]), administrative changes ([`ProviderEvent`]) and
//! protocol log lines ([`LogEvent`]), and expires them on a retention window.
//!
//! # Features
//!
//! - **`postgres`** - Enables PostgreSQL support
//! - **`mysql`** - Enables MySQL support, including custom TLS parameters
//! - **`sqlite`** - Enables SQLite pools, used to run the store embedded or in tests
//!
//! All features are enabled by default. [`initialize`] only accepts the
//! `postgres` and `mysql` drivers; any other pool can be wrapped directly with
//! `Store::from(pool)`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventstore_sql::{initialize, Connection, ConnectionConfig, Notifier};
//!
//! let connection = initialize(&ConnectionConfig {
//!     driver: "postgres".to_owned(),
//!     dsn: "postgres://localhost/events".to_owned(),
//!     custom_tls: None,
//!     pool_size: 10,
//!     debug: false,
//! })
//! .await?;
//!
//! let Connection::Postgres(store) = connection else { unreachable!() };
//! let notifier = Notifier::new(store.clone(), "sftp-1");
//! notifier.notify_log_event(event).await?;
//!
//! store.cleanup(Utc::now() - Duration::hours(24)).await;
//! ```
//!
//! The schema itself is owned by the `eventstore-sql-migrator` crate and must
//! be migrated before the first write.

mod backend;
mod cleanup;
mod connection;
mod error;
mod event;
mod notifier;
mod sql;
mod store;
mod tls;

pub use backend::{Backend, RowsAffected};
pub use cleanup::*;
pub use connection::*;
pub use error::*;
pub use event::*;
pub use notifier::*;
pub use sql::*;
pub use store::*;
pub use tls::*;
