use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Index, Table, TableCreateStatement, TableDropStatement};

pub struct Operation;

const INDEXES: [(&str, FsEvents); 8] = [
    ("idx_fs_events_timestamp", FsEvents::Timestamp),
    ("idx_fs_events_action", FsEvents::Action),
    ("idx_fs_events_username", FsEvents::Username),
    ("idx_fs_events_ssh_cmd", FsEvents::SshCmd),
    ("idx_fs_events_status", FsEvents::Status),
    ("idx_fs_events_protocol", FsEvents::Protocol),
    ("idx_fs_events_ip", FsEvents::Ip),
    ("idx_fs_events_instance_id", FsEvents::InstanceId),
];

fn up_statement() -> TableCreateStatement {
    Table::create()
        .table(FsEvents::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(FsEvents::Id)
                .string_len(36)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(FsEvents::Timestamp).big_integer().not_null())
        .col(ColumnDef::new(FsEvents::Action).string_len(60).not_null())
        .col(ColumnDef::new(FsEvents::Username).string_len(255).not_null())
        .col(ColumnDef::new(FsEvents::FsPath).string_len(512))
        .col(ColumnDef::new(FsEvents::FsTargetPath).string_len(512))
        .col(ColumnDef::new(FsEvents::VirtualPath).string_len(512))
        .col(ColumnDef::new(FsEvents::VirtualTargetPath).string_len(512))
        .col(ColumnDef::new(FsEvents::SshCmd).string_len(60))
        .col(ColumnDef::new(FsEvents::FileSize).big_integer())
        .col(ColumnDef::new(FsEvents::Status).integer())
        .col(ColumnDef::new(FsEvents::Protocol).string_len(30).not_null())
        .col(ColumnDef::new(FsEvents::Ip).string_len(50))
        .col(ColumnDef::new(FsEvents::InstanceId).string_len(60))
        .to_owned()
}

fn down_statement() -> TableDropStatement {
    Table::drop().table(FsEvents::Table).to_owned()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let mut statements = vec![backend.build_schema(&up_statement())];

        for (name, column) in INDEXES {
            let index = Index::create()
                .name(name)
                .table(FsEvents::Table)
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
