use sea_orm_migration::prelude::*;

use crate::CONSTRAINED_OPERATIONS;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 将 `jobs.operation` 约束到注册表当前的操作名集合
    ///
    /// 新操作上线前必须先有一条迁移替换此约束，否则引用它的任务无法入库。
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names = CONSTRAINED_OPERATIONS
            .iter()
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ");

        manager
            .get_connection()
            .execute_unprepared(&format!(
                "ALTER TABLE jobs ADD CONSTRAINT job_operation_known \
                 CHECK (operation IN ({names}))"
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("ALTER TABLE jobs DROP CONSTRAINT job_operation_known")
            .await?;

        Ok(())
    }
}
