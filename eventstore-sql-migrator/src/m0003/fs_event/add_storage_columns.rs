use eventstore_sql::{Backend, FsEvents};
use sea_query::{ColumnDef, Index, Table, TableAlterStatement};

pub struct Operation;

const INDEXES: [(&str, FsEvents); 3] = [
    ("idx_fs_events_provider", FsEvents::FsProvider),
    ("idx_fs_events_bucket", FsEvents::Bucket),
    ("idx_fs_events_endpoint", FsEvents::Endpoint),
];

fn up_statements() -> Vec<TableAlterStatement> {
    let columns = [
        ColumnDef::new(FsEvents::FsProvider).integer().to_owned(),
        ColumnDef::new(FsEvents::Bucket).string_len(512).to_owned(),
        ColumnDef::new(FsEvents::Endpoint).string_len(512).to_owned(),
        ColumnDef::new(FsEvents::OpenFlags).integer().to_owned(),
    ];

    columns
        .into_iter()
        .map(|mut column| {
            Table::alter()
                .table(FsEvents::Table)
                .add_column(&mut column)
                .to_owned()
        })
        .collect()
}

fn down_statements() -> Vec<TableAlterStatement> {
    [
        FsEvents::FsProvider,
        FsEvents::Bucket,
        FsEvents::Endpoint,
        FsEvents::OpenFlags,
    ]
    .into_iter()
    .map(|column| {
        Table::alter()
            .table(FsEvents::Table)
            .drop_column(column)
            .to_owned()
    })
    .collect()
}

impl crate::Operation for Operation {
    fn up(&self, backend: Backend) -> Vec<String> {
        let mut statements: Vec<String> = up_statements()
            .iter()
            .map(|statement| backend.build_schema(statement))
            .collect();

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
        let mut statements = Vec::new();

        // SQLite refuses to drop an indexed column
        for (name, _) in INDEXES {
            let index = Index::drop().name(name).table(FsEvents::Table).to_owned();
            statements.push(backend.build_schema(&index));
        }

        statements.extend(
            down_statements()
                .iter()
                .map(|statement| backend.build_schema(statement)),
        );

        statements
    }
}
