use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_status")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_claimed_by")
                    .table(Jobs::Table)
                    .col(Jobs::ClaimedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bots_last_heartbeat_at")
                    .table(Bots::Table)
                    .col(Bots::LastHeartbeatAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_job_id")
                    .table(Results::Table)
                    .col(Results::JobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_processed_by")
                    .table(Results::Table)
                    .col(Results::ProcessedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_processed_at")
                    .table(Results::Table)
                    .col(Results::ProcessedAt)
                    .to_owned(),
            )
            .await?;

        // 部分索引：认领扫描与处理超时扫描的热路径
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_jobs_pending_operation_created \
             ON jobs (operation, created_at) WHERE status = 'pending'",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_jobs_processing_started \
             ON jobs (started_at) WHERE status = 'processing'",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_jobs_status",
            "idx_jobs_claimed_by",
            "idx_bots_last_heartbeat_at",
            "idx_results_job_id",
            "idx_results_processed_by",
            "idx_results_processed_at",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        let conn = manager.get_connection();
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_jobs_pending_operation_created")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_jobs_processing_started")
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Status,
    ClaimedBy,
}

#[derive(DeriveIden)]
enum Bots {
    Table,
    LastHeartbeatAt,
}

#[derive(DeriveIden)]
enum Results {
    Table,
    JobId,
    ProcessedBy,
    ProcessedAt,
}
