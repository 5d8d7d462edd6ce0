pub mod add_role_column;
