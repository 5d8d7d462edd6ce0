//! Migration widening session identifiers.

mod fs_event;

/// Widens `eventstore_fs_events.session_id` to VARCHAR(512).
///
/// Reverting keeps the wider column so existing identifiers are not truncated.
pub struct M0007;

impl crate::Migration for M0007 {
    fn id(&self) -> &str {
        "7"
    }

    fn operations(&self) -> Vec<Box<dyn crate::Operation>> {
        vec![Box::new(fs_event::alter_session_id_column::Operation)]
    }
}
