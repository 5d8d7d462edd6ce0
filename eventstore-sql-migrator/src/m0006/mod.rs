//! Migration introducing protocol log events.

mod log_event;

/// Creates `eventstore_log_events`.
pub struct M0006;

impl crate::Migration for M0006 {
    fn id(&self) -> &str {
        "6"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![Box::new(log_event::create_table::Operation)]
    }
}
