use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Table, TableAlterStatement};

pub struct Operation;

fn up_statement() -> TableAlterStatement {
    Table::alter()
        .table(FsEvents::Table)
        .add_column(ColumnDef::new(FsEvents::SessionId).string_len(100))
        .to_owned()
}

fn down_statement() -> TableAlterStatement {
    Table::alter()
        .table(FsEvents::Table)
        .drop_column(FsEvents::SessionId)
        .to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        vec![backend.build_schema(&up_statement())]
    }

    fn down(&self, backend: Backend) -> Vec<String> {
        vec![backend.build_schema(&down_statement())]
    }
}
