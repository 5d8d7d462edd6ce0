//! Column identifiers for the event tables.
//!
//! Table and column names are the durable contract shared with existing
//! databases and with any external tooling reading them.

use sea_query::Iden;

/// Column identifiers for the `eventstore_fs_events` table.
///
/// # Columns
///
/// - `Id` - Event identifier (ULID, VARCHAR(36))
/// - `Timestamp` - Event time in nanoseconds since the Unix epoch (BIGINT)
/// - `FsPath` / `FsTargetPath` - Actual filesystem paths (TEXT)
/// - `VirtualPath` / `VirtualTargetPath` - Paths as seen by the user (TEXT)
/// - `SessionId` - Protocol session identifier (VARCHAR(512))
/// - `FsProvider`, `Bucket`, `Endpoint` - Storage backend classification
/// - `InstanceId` - Host process that produced the event
#[derive(Iden, Clone, Copy)]
pub enum FsEvents {
    #[iden = "eventstore_fs_events"]
    Table,
    Id,
    Timestamp,
    Action,
    Username,
    FsPath,
    FsTargetPath,
    VirtualPath,
    VirtualTargetPath,
    SshCmd,
    FileSize,
    Elapsed,
    Status,
    Protocol,
    SessionId,
    Ip,
    FsProvider,
    Bucket,
    Endpoint,
    OpenFlags,
    Role,
    InstanceId,
}

/// Column identifiers for the `eventstore_provider_events` table.
#[derive(Iden, Clone, Copy)]
pub enum ProviderEvents {
    #[iden = "eventstore_provider_events"]
    Table,
    Id,
    Timestamp,
    Action,
    Username,
    Ip,
    ObjectType,
    ObjectName,
    /// Serialized snapshot of the changed object
    ObjectData,
    Role,
    InstanceId,
}

/// Column identifiers for the `eventstore_log_events` table.
#[derive(Iden, Clone, Copy)]
pub enum LogEvents {
    #[iden = "eventstore_log_events"]
    Table,
    Id,
    Timestamp,
    /// Integer event-kind code
    Event,
    Protocol,
    Username,
    Ip,
    Message,
    Role,
    InstanceId,
}

/// Bookkeeping table recording applied schema versions.
#[derive(Iden, Clone, Copy)]
pub enum Migrations {
    #[iden = "migrations"]
    Table,
    Id,
}
