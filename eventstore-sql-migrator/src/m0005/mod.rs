//! Migration recording how long a filesystem operation took.

mod fs_event;

/// Adds `elapsed` (BIGINT, milliseconds) to `eventstore_fs_events`.
pub struct M0005;

impl crate::Migration for M0005 {
    fn id(&self) -> &str {
        "5"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![Box::new(fs_event::add_elapsed_column::Operation)]
    }
}
