use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Table, TableAlterStatement};

pub struct Operation;

const COLUMNS: [FsEvents; 4] = [
    FsEvents::FsPath,
    FsEvents::FsTargetPath,
    FsEvents::VirtualPath,
    FsEvents::VirtualTargetPath,
];

fn up_statement(column: FsEvents) -> TableAlterStatement {
    Table::alter()
        .table(FsEvents::Table)
        .modify_column(ColumnDef::new(column).text())
        .to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        // SQLite does not enforce VARCHAR lengths
        if !backend.supports_modify_column() {
            return Vec::new();
        }

        COLUMNS
            .into_iter()
            .map(|column| backend.build_schema(&up_statement(column)))
            .collect()
    }

    fn down(&self, _backend: Backend) -> Vec<String> {
        // Narrowing back could truncate stored paths
        Vec::new()
    }
}
