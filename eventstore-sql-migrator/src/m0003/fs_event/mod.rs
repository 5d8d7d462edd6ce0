pub mod add_storage_columns;
pub mod alter_path_columns;
pub mod create_session_id_idx;
