// Copyright 2025 jobrs contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::bot::{Bot, BotStatus, HealthStatus};
use crate::domain::models::job::JobStatus;
use crate::domain::models::job_result::{JobResult, ResultStatus};
use crate::domain::repositories::bot_repository::{BotRepository, SoftDeleteOutcome};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    bot as bot_entity, job as job_entity, job_result as result_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockType, OnConflict},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 机器人仓库实现
#[derive(Clone)]
pub struct BotRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl BotRepositoryImpl {
    /// 创建新的机器人仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<bot_entity::Model> for Bot {
    fn from(model: bot_entity::Model) -> Self {
        Self {
            id: model.id,
            status: model.status.parse().unwrap_or_default(),
            current_job_id: model.current_job_id,
            assigned_operation: model.assigned_operation,
            last_heartbeat_at: model.last_heartbeat_at,
            created_at: model.created_at,
            deleted_at: model.deleted_at,
            health_status: model.health_status.parse().unwrap_or_default(),
            stuck_job_id: model.stuck_job_id,
            health_checked_at: model.health_checked_at,
        }
    }
}

#[async_trait]
impl BotRepository for BotRepositoryImpl {
    async fn register(
        &self,
        id: &str,
        assigned_operation: Option<&str>,
    ) -> Result<Bot, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let model = bot_entity::ActiveModel {
            id: Set(id.to_string()),
            status: Set(BotStatus::Idle.to_string()),
            current_job_id: Set(None),
            assigned_operation: Set(assigned_operation.map(str::to_string)),
            last_heartbeat_at: Set(now),
            created_at: Set(now),
            deleted_at: Set(None),
            health_status: Set(HealthStatus::Normal.to_string()),
            stuck_job_id: Set(None),
            health_checked_at: Set(None),
        };

        // 同ID重复注册即复活：清 deleted_at、刷新心跳。未显式给出
        // assigned_operation 时保留原有钉定。
        let mut on_conflict = OnConflict::column(bot_entity::Column::Id);
        on_conflict.update_columns([
            bot_entity::Column::Status,
            bot_entity::Column::LastHeartbeatAt,
            bot_entity::Column::DeletedAt,
        ]);
        if assigned_operation.is_some() {
            on_conflict.update_column(bot_entity::Column::AssignedOperation);
        }

        bot_entity::Entity::insert(model)
            .on_conflict(on_conflict.to_owned())
            .exec(self.db.as_ref())
            .await?;

        let registered = bot_entity::Entity::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(registered.into())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Bot>, RepositoryError> {
        let model = bot_entity::Entity::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn heartbeat(&self, id: &str) -> Result<bool, RepositoryError> {
        let updated = bot_entity::Entity::update_many()
            .col_expr(
                bot_entity::Column::LastHeartbeatAt,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(Utc::now().into())),
            )
            .filter(bot_entity::Column::Id.eq(id))
            .filter(bot_entity::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(updated.rows_affected > 0)
    }

    async fn list(&self, include_deleted: bool) -> Result<Vec<Bot>, RepositoryError> {
        let mut query = bot_entity::Entity::find();
        if !include_deleted {
            query = query.filter(bot_entity::Column::DeletedAt.is_null());
        }

        let models = query
            .order_by_desc(bot_entity::Column::LastHeartbeatAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Bot::from).collect())
    }

    async fn assign_operation(
        &self,
        id: &str,
        operation: Option<&str>,
    ) -> Result<Option<Bot>, RepositoryError> {
        let model = bot_entity::Entity::find_by_id(id.to_string())
            .filter(bot_entity::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await?;

        let Some(model) = model else {
            return Ok(None);
        };

        let mut active: bot_entity::ActiveModel = model.into();
        active.assigned_operation = Set(operation.map(str::to_string));
        let updated = active.update(self.db.as_ref()).await?;

        Ok(Some(updated.into()))
    }

    async fn soft_delete(&self, id: &str) -> Result<Option<SoftDeleteOutcome>, RepositoryError> {
        let txn = self.db.begin().await?;

        let bot = bot_entity::Entity::find_by_id(id.to_string())
            .filter(bot_entity::Column::DeletedAt.is_null())
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(bot) = bot else {
            txn.rollback().await?;
            return Ok(None);
        };

        let mut released_job_id = None;
        let mut failed_result: Option<JobResult> = None;

        // 先处置持有的任务：claimed 回到队列，processing 记失败终态
        if let Some(job_id) = bot.current_job_id {
            let job = job_entity::Entity::find_by_id(job_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?;

            if let Some(job) = job {
                match job.status.parse().unwrap_or_default() {
                    JobStatus::Claimed => {
                        let next_version = job.version + 1;
                        let next_attempts = job.attempts + 1;
                        let mut active: job_entity::ActiveModel = job.into();
                        active.status = Set(JobStatus::Pending.to_string());
                        active.claimed_by = Set(None);
                        active.claimed_at = Set(None);
                        active.attempts = Set(next_attempts);
                        active.error = Set(Some("bot-terminated".to_string()));
                        active.version = Set(next_version);
                        active.update(&txn).await?;
                        released_job_id = Some(job_id);
                    }
                    JobStatus::Processing => {
                        let now = Utc::now();
                        let duration_ms = job
                            .started_at
                            .map(|started| now.signed_duration_since(started).num_milliseconds())
                            .unwrap_or(0);
                        let next_version = job.version + 1;
                        let next_attempts = job.attempts + 1;
                        let mut active: job_entity::ActiveModel = job.clone().into();
                        active.status = Set(JobStatus::Failed.to_string());
                        active.finished_at = Set(Some(now.into()));
                        active.attempts = Set(next_attempts);
                        active.error = Set(Some("bot-terminated".to_string()));
                        active.version = Set(next_version);
                        active.update(&txn).await?;

                        let row = result_entity::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            job_id: Set(job.id),
                            a: Set(job.a),
                            b: Set(job.b),
                            operation: Set(job.operation.clone()),
                            result: Set(None),
                            processed_by: Set(bot.id.clone()),
                            processed_at: Set(now.into()),
                            duration_ms: Set(duration_ms),
                            status: Set(ResultStatus::Failed.to_string()),
                            error: Set(Some("bot-terminated".to_string())),
                        };
                        failed_result = Some(row.insert(&txn).await?.into());
                    }
                    _ => {}
                }
            }
        }

        let mut active: bot_entity::ActiveModel = bot.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.current_job_id = Set(None);
        active.status = Set(BotStatus::Down.to_string());
        let deleted = active.update(&txn).await?;

        txn.commit().await?;
        Ok(Some(SoftDeleteOutcome {
            bot: deleted.into(),
            released_job_id,
            failed_result,
        }))
    }

    async fn reset(&self, id: &str) -> Result<Option<Bot>, RepositoryError> {
        let txn = self.db.begin().await?;

        let bot = bot_entity::Entity::find_by_id(id.to_string())
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(bot) = bot else {
            txn.rollback().await?;
            return Ok(None);
        };

        // 该机器人名下所有未终结的任务回到队列
        job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Pending.to_string()),
            )
            .col_expr(
                job_entity::Column::ClaimedBy,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                job_entity::Column::ClaimedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(
                job_entity::Column::StartedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(
                job_entity::Column::Attempts,
                Expr::col(job_entity::Column::Attempts).add(1),
            )
            .col_expr(job_entity::Column::Error, Expr::value(Some("bot-reset")))
            .col_expr(
                job_entity::Column::Version,
                Expr::col(job_entity::Column::Version).add(1),
            )
            .filter(job_entity::Column::ClaimedBy.eq(bot.id.clone()))
            .filter(job_entity::Column::Status.is_in([
                JobStatus::Claimed.to_string(),
                JobStatus::Processing.to_string(),
            ]))
            .exec(&txn)
            .await?;

        let mut active: bot_entity::ActiveModel = bot.into();
        active.current_job_id = Set(None);
        active.status = Set(BotStatus::Idle.to_string());
        active.health_status = Set(HealthStatus::Normal.to_string());
        active.stuck_job_id = Set(None);
        active.health_checked_at = Set(Some(Utc::now().into()));
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(Some(updated.into()))
    }

    async fn count_retired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let count = bot_entity::Entity::find()
            .filter(bot_entity::Column::DeletedAt.is_not_null())
            .filter(bot_entity::Column::DeletedAt.lte(cutoff))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn delete_retired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let deleted = bot_entity::Entity::delete_many()
            .filter(bot_entity::Column::DeletedAt.is_not_null())
            .filter(bot_entity::Column::DeletedAt.lte(cutoff))
            .exec(self.db.as_ref())
            .await?;
        Ok(deleted.rows_affected)
    }

    async fn mark_potentially_stuck(
        &self,
        processing_cutoff: DateTime<Utc>,
        heartbeat_cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;

        let stuck_jobs = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
            .filter(job_entity::Column::StartedAt.lte(processing_cutoff))
            .all(&txn)
            .await?;

        let mut marked = 0;
        for job in stuck_jobs {
            let Some(bot_id) = job.claimed_by else {
                continue;
            };
            // 心跳仍新鲜却迟迟不交任务的机器人才算疑似卡住；
            // 彻底断联的机器人由认领/处理超时监控接管
            let updated = bot_entity::Entity::update_many()
                .col_expr(
                    bot_entity::Column::HealthStatus,
                    Expr::value(HealthStatus::PotentiallyStuck.to_string()),
                )
                .col_expr(
                    bot_entity::Column::StuckJobId,
                    Expr::value(Some(job.id)),
                )
                .col_expr(
                    bot_entity::Column::HealthCheckedAt,
                    Expr::value::<Option<DateTime<FixedOffset>>>(Some(Utc::now().into())),
                )
                .filter(bot_entity::Column::Id.eq(bot_id))
                .filter(bot_entity::Column::LastHeartbeatAt.gt(heartbeat_cutoff))
                .filter(
                    bot_entity::Column::HealthStatus
                        .ne(HealthStatus::PotentiallyStuck.to_string()),
                )
                .exec(&txn)
                .await?;
            marked += updated.rows_affected;
        }

        txn.commit().await?;
        Ok(marked)
    }

    async fn clear_recovered_health(&self) -> Result<u64, RepositoryError> {
        // 卡住的任务一旦终结或被释放，绑定随之清空，据此判定恢复
        let updated = bot_entity::Entity::update_many()
            .col_expr(
                bot_entity::Column::HealthStatus,
                Expr::value(HealthStatus::Normal.to_string()),
            )
            .col_expr(
                bot_entity::Column::StuckJobId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                bot_entity::Column::HealthCheckedAt,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(Utc::now().into())),
            )
            .filter(
                bot_entity::Column::HealthStatus.eq(HealthStatus::PotentiallyStuck.to_string()),
            )
            .filter(bot_entity::Column::CurrentJobId.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(updated.rows_affected)
    }
}
