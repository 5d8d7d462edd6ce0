pub mod add_session_id_column;
