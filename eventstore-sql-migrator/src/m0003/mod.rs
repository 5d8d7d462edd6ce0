//! Migration widening paths and classifying the storage backend of
//! filesystem events.

mod fs_event;

/// Schema changes on `eventstore_fs_events`.
///
/// ## Changes
///
/// 1. Widens `fs_path`, `fs_target_path`, `virtual_path` and
///    `virtual_target_path` from VARCHAR(512) to TEXT.
/// 2. Adds `fs_provider`, `bucket`, `endpoint` (indexed) and `open_flags`.
/// 3. Indexes `session_id`.
///
/// ## Database-Specific Notes
///
/// - **SQLite**: The widening is a no-op, SQLite does not enforce the
///   declared length.
/// - **All**: Reverting keeps the widened columns. The `session_id` index is
///   dropped so that reverting version 2 can drop the column.
pub struct M0003;

impl crate::Migration for M0003 {
    fn id(&self) -> &str {
        "3"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![
            Box::new(fs_event::alter_path_columns::Operation),
            Box::new(fs_event::add_storage_columns::Operation),
            Box::new(fs_event::create_session_id_idx::Operation),
        ]
    }
}
