use eventstore_sql::{Backend, ProviderEvents};
use sea_query::{ColumnDef, Index, Table};

pub struct Operation;

const INDEX: &str = "idx_provider_events_role";

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let column = Table::alter()
            .table(ProviderEvents::Table)
            .add_column(ColumnDef::new(ProviderEvents::Role).string_len(255))
            .to_owned();
        let index = Index::create()
            .name(INDEX)
            .table(ProviderEvents::Table)
            .col(ProviderEvents::Role)
            .to_owned();

        vec![backend.build_schema(&column), backend.build_schema(&index)]
    }

    fn down(&self, backend: Backend) -> Vec<String> {
        let index = Index::drop().name(INDEX).table(ProviderEvents::Table).to_owned();
        let column = Table::alter()
            .table(ProviderEvents::Table)
            .drop_column(ProviderEvents::Role)
            .to_owned();

        vec![backend.build_schema(&index), backend.build_schema(&column)]
    }
}
