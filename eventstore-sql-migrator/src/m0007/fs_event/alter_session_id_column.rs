use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Table, TableAlterStatement};

pub struct Operation;

fn up_statement() -> TableAlterStatement {
    Table::alter()
        .table(FsEvents::Table)
        .modify_column(ColumnDef::new(FsEvents::SessionId).string_len(512))
        .to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        // SQLite does not enforce VARCHAR lengths
        if !backend.supports_modify_column() {
            return Vec::new();
        }

        vec![backend.build_schema(&up_statement())]
    }

    fn down(&self, _backend: Backend) -> Vec<String> {
        Vec::new()
    }
}
