use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create results table. Rows are written once per terminal transition
        // and never updated afterwards.
        manager
            .create_table(
                Table::create()
                    .table(Results::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Results::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Results::JobId).uuid().not_null())
                    .col(ColumnDef::new(Results::A).integer().not_null())
                    .col(ColumnDef::new(Results::B).integer().not_null())
                    .col(ColumnDef::new(Results::Operation).string().not_null())
                    .col(ColumnDef::new(Results::Result).big_integer())
                    .col(ColumnDef::new(Results::ProcessedBy).string().not_null())
                    .col(
                        ColumnDef::new(Results::ProcessedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Results::DurationMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(Results::Status)
                            .string()
                            .not_null()
                            .check(Expr::col(Results::Status).is_in(["succeeded", "failed"])),
                    )
                    .col(ColumnDef::new(Results::Error).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_results_job")
                            .from(Results::Table, Results::JobId)
                            .to(Jobs::Table, Jobs::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Results::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Results {
    Table,
    Id,
    JobId,
    A,
    B,
    Operation,
    Result,
    ProcessedBy,
    ProcessedAt,
    DurationMs,
    Status,
    Error,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
}
