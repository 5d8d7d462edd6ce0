pub mod add_elapsed_column;
