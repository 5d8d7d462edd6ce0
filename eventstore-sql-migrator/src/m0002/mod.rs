//! Migration adding the protocol session to filesystem events.

mod fs_event;

/// Adds `session_id` (VARCHAR(100), nullable) to `eventstore_fs_events`.
pub struct M0002;

impl crate::Migration for M0002 {
    fn id(&self) -> &str {
        "2"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![Box::new(fs_event::add_session_id_column::Operation)]
    }
}
