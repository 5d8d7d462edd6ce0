//! Migration tagging filesystem and provider events with the user's role.

mod fs_event;
mod provider_event;

/// Adds an indexed `role` (VARCHAR(255), nullable) to `eventstore_fs_events`
/// and `eventstore_provider_events`.
pub struct M0004;

impl crate::Migration for M0004 {
    fn id(&self) -> &str {
        "4"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![
            Box::new(fs_event::add_role_column::Operation),
            Box::new(provider_event::add_role_column::Operation),
        ]
    }
}
