use eventstore_sql::{Backend, ProviderEvents};
use sea_query::{Alias, ColumnDef, Index, Table, TableCreateStatement, TableDropStatement};

pub struct Operation;

const INDEXES: [(&str, ProviderEvents); 7] = [
    ("idx_provider_events__timestamp", ProviderEvents::Timestamp),
    ("idx_provider_events_action", ProviderEvents::Action),
    ("idx_provider_events_username", ProviderEvents::Username),
    ("idx_provider_events_ip", ProviderEvents::Ip),
    ("idx_provider_events_object_type", ProviderEvents::ObjectType),
    ("idx_provider_events_object_name", ProviderEvents::ObjectName),
    ("idx_provider_events_instance_id", ProviderEvents::InstanceId),
];

fn up_statement(backend: Backend) -> TableCreateStatement {
    let mut object_data = ColumnDef::new(ProviderEvents::ObjectData);
    match backend {
        // BLOB caps at 64KiB on MySQL
        #[cfg(feature = "mysql")]
        Backend::MySql => object_data.custom(Alias::new("longblob")),
        _ => object_data.blob(),
    };

    Table::create()
        .table(ProviderEvents::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(ProviderEvents::Id)
                .string_len(36)
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(ProviderEvents::Timestamp)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(ProviderEvents::Action).string_len(60).not_null())
        .col(
            ColumnDef::new(ProviderEvents::Username)
                .string_len(255)
                .not_null(),
        )
        .col(ColumnDef::new(ProviderEvents::Ip).string_len(50))
        .col(ColumnDef::new(ProviderEvents::ObjectType).string_len(50))
        .col(ColumnDef::new(ProviderEvents::ObjectName).string_len(255))
        .col(&mut object_data)
        .col(ColumnDef::new(ProviderEvents::InstanceId).string_len(60))
        .to_owned()
}

fn down_statement() -> TableDropStatement {
    Table::drop().table(ProviderEvents::Table).to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let mut statements = vec![backend.build_schema(&up_statement(backend))];

        for (name, column) in INDEXES {
            let index = Index::create()
                .name(name)
                .table(ProviderEvents::Table)
                .col(column)
                .to_owned();
            statements.push(backend.build_schema(&index));
        }

        statements
    }

    fn down(&self, backend: Backend) -> Vec<String> {
        vec![backend.build_schema(&down_statement())]
    }
}
