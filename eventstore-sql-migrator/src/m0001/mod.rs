//! Initial schema: the filesystem and provider event tables.

mod fs_event;
mod provider_event;

/// Creates `eventstore_fs_events` and `eventstore_provider_events` with their
/// lookup indexes.
///
/// Path columns start as VARCHAR(512) and are widened by [`M0003`](crate::M0003).
pub struct InitMigration;

impl crate::Migration for InitMigration {
    fn id(&self) -> &str {
        "1"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![
            Box::new(fs_event::create_table::Operation),
            Box::new(provider_event::create_table::Operation),
        ]
    }
}
