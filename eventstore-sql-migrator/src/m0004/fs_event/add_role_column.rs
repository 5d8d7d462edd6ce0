use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Index, Table};

pub struct Operation;

const INDEX: &str = "idx_fs_events_role";

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let column = Table::alter()
            .table(FsEvents::Table)
            .add_column(ColumnDef::new(FsEvents::Role).string_len(255))
            .to_owned();
        let index = Index::create()
            .name(INDEX)
            .table(FsEvents::Table)
            .col(FsEvents::Role)
            .to_owned();

        vec![backend.build_schema(&column), backend.build_schema(&index)]
    }

    fn down(&self, backend: Backend) -> Vec<String> {
        let index = Index::drop().name(INDEX).table(FsEvents::Table).to_owned();
        let column = Table::alter()
            .table(FsEvents::Table)
            .drop_column(FsEvents::Role)
            .to_owned();

        vec![backend.build_schema(&index), backend.build_schema(&column)]
    }
}
