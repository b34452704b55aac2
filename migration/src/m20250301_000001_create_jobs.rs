use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create jobs table
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jobs::A).integer().not_null())
                    .col(ColumnDef::new(Jobs::B).integer().not_null())
                    .col(ColumnDef::new(Jobs::Operation).string().not_null())
                    .col(
                        ColumnDef::new(Jobs::Status)
                            .string()
                            .not_null()
                            .check(Expr::col(Jobs::Status).is_in([
                                "pending",
                                "claimed",
                                "processing",
                                "succeeded",
                                "failed",
                            ])),
                    )
                    .col(ColumnDef::new(Jobs::ClaimedBy).string())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Jobs::ClaimedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Jobs::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Jobs::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Jobs::Attempts).integer().not_null().default(0))
                    .col(ColumnDef::new(Jobs::Error).text())
                    .col(ColumnDef::new(Jobs::Version).integer().not_null().default(1))
                    .to_owned(),
            )
            .await?;

        // pending 状态与 claimed_by 必须同生同灭，由数据库而非应用代码保证
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE jobs ADD CONSTRAINT job_state_consistency \
                 CHECK ((status = 'pending') = (claimed_by IS NULL))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    A,
    B,
    Operation,
    Status,
    ClaimedBy,
    CreatedAt,
    ClaimedAt,
    StartedAt,
    FinishedAt,
    Attempts,
    Error,
    Version,
}
