use eventstore_sql::{Backend, LogEvents};
use sea_query::{ColumnDef, Index, Table, TableCreateStatement, TableDropStatement};

pub struct Operation;

const INDEXES: [(&str, LogEvents); 7] = [
    ("idx_log_events_timestamp", LogEvents::Timestamp),
    ("idx_log_events_event", LogEvents::Event),
    ("idx_log_events_protocol", LogEvents::Protocol),
    ("idx_log_events_username", LogEvents::Username),
    ("idx_log_events_ip", LogEvents::Ip),
    ("idx_log_events_role", LogEvents::Role),
    ("idx_log_events_instance_id", LogEvents::InstanceId),
];

fn up_statement() -> TableCreateStatement {
    Table::create()
        .table(LogEvents::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(LogEvents::Id)
                .string_len(36)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(LogEvents::Timestamp).big_integer().not_null())
        .col(ColumnDef::new(LogEvents::Event).integer().not_null())
        .col(ColumnDef::new(LogEvents::Protocol).string_len(30))
        .col(ColumnDef::new(LogEvents::Username).string_len(255))
        .col(ColumnDef::new(LogEvents::Ip).string_len(50))
        .col(ColumnDef::new(LogEvents::Message).text())
        .col(ColumnDef::new(LogEvents::Role).string_len(255))
        .col(ColumnDef::new(LogEvents::InstanceId).string_len(60))
        .to_owned()
}

fn down_statement() -> TableDropStatement {
    Table::drop().table(LogEvents::Table).to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let mut statements = vec![backend.build_schema(&up_statement())];

        for (name, column) in INDEXES {
            let index = Index::create()
                .name(name)
                .table(LogEvents::Table)
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
