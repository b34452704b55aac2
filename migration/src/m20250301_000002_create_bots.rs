use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create bots table
        manager
            .create_table(
                Table::create()
                    .table(Bots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bots::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Bots::Status)
                            .string()
                            .not_null()
                            .check(Expr::col(Bots::Status).is_in(["idle", "busy", "down"])),
                    )
                    .col(ColumnDef::new(Bots::CurrentJobId).uuid())
                    .col(ColumnDef::new(Bots::AssignedOperation).string())
                    .col(
                        ColumnDef::new(Bots::LastHeartbeatAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Bots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Bots::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bots::HealthStatus)
                            .string()
                            .not_null()
                            .default("normal")
                            .check(Expr::col(Bots::HealthStatus).is_in([
                                "normal",
                                "potentially_stuck",
                                "unhealthy",
                            ])),
                    )
                    .col(ColumnDef::new(Bots::StuckJobId).uuid())
                    .col(ColumnDef::new(Bots::HealthCheckedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bots_current_job")
                            .from(Bots::Table, Bots::CurrentJobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个任务同一时刻至多绑定到一个机器人
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_bots_current_job \
                 ON bots (current_job_id) WHERE current_job_id IS NOT NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Bots {
    Table,
    Id,
    Status,
    CurrentJobId,
    AssignedOperation,
    LastHeartbeatAt,
    CreatedAt,
    DeletedAt,
    HealthStatus,
    StuckJobId,
    HealthCheckedAt,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
}
