use eventstore_sql::{Backend, FsEvents};
use sea_query::{Index, IndexCreateStatement, IndexDropStatement};

pub struct Operation;

const NAME: &str = "idx_fs_events_session_id";

fn up_statement() -> IndexCreateStatement {
    Index::create()
        .name(NAME)
        .table(FsEvents::Table)
        .col(FsEvents::SessionId)
        .to_owned()
}

fn down_statement() -> IndexDropStatement {
    Index::drop().name(NAME).table(FsEvents::Table).to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        vec![backend.build_schema(&up_statement())]
    }

    fn down(&self, backend: Backend) -> Vec<String> {
        vec![backend.build_schema(&down_statement())]
    }
}
