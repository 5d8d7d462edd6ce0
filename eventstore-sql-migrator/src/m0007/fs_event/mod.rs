pub mod alter_session_id_column;
