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

use crate::domain::models::bot::BotStatus;
use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::job_result::{JobResult, ResultStatus};
use crate::domain::repositories::job_repository::{
    ClaimError, JobRepository, ReleaseError, RepositoryError, TransitionError,
};
use crate::infrastructure::database::entities::{
    bot as bot_entity, job as job_entity, job_result as result_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType, SimpleExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层。认领与终态转换都是单事务操作。
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 在终态事务内写入结果行
    async fn insert_result(
        txn: &DatabaseTransaction,
        job: &job_entity::Model,
        result: Option<i64>,
        processed_by: &str,
        duration_ms: i64,
        status: ResultStatus,
        error: Option<&str>,
    ) -> Result<result_entity::Model, sea_orm::DbErr> {
        let row = result_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(job.id),
            a: Set(job.a),
            b: Set(job.b),
            operation: Set(job.operation.clone()),
            result: Set(result),
            processed_by: Set(processed_by.to_string()),
            processed_at: Set(Utc::now().into()),
            duration_ms: Set(duration_ms),
            status: Set(status.to_string()),
            error: Set(error.map(str::to_string)),
        };
        row.insert(txn).await
    }

    /// 在终态事务内清除机器人的任务绑定
    async fn unbind_bot(
        txn: &DatabaseTransaction,
        bot_id: &str,
        job_id: Uuid,
    ) -> Result<(), sea_orm::DbErr> {
        bot_entity::Entity::update_many()
            .col_expr(
                bot_entity::Column::CurrentJobId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                bot_entity::Column::Status,
                Expr::value(BotStatus::Idle.to_string()),
            )
            .filter(bot_entity::Column::Id.eq(bot_id))
            .filter(bot_entity::Column::CurrentJobId.eq(job_id))
            .exec(txn)
            .await?;
        Ok(())
    }
}

impl From<job_entity::Model> for Job {
    fn from(model: job_entity::Model) -> Self {
        Self {
            id: model.id,
            a: model.a,
            b: model.b,
            operation: model.operation,
            status: model.status.parse().unwrap_or_default(),
            claimed_by: model.claimed_by,
            created_at: model.created_at,
            claimed_at: model.claimed_at,
            started_at: model.started_at,
            finished_at: model.finished_at,
            attempts: model.attempts,
            error: model.error,
            version: model.version,
        }
    }
}

impl From<result_entity::Model> for JobResult {
    fn from(model: result_entity::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            a: model.a,
            b: model.b,
            operation: model.operation,
            result: model.result,
            processed_by: model.processed_by,
            processed_at: model.processed_at,
            duration_ms: model.duration_ms,
            status: model.status.parse().unwrap_or(ResultStatus::Failed),
            error: model.error,
        }
    }
}

/// 列表排序用的状态优先级表达式
///
/// pending < claimed < processing < succeeded < failed，与
/// `JobStatus::priority` 保持一致。排序是查询的契约，消费方不得重排。
fn status_priority_expr() -> SimpleExpr {
    Expr::case(
        Expr::col(job_entity::Column::Status).eq(JobStatus::Pending.to_string()),
        1,
    )
    .case(
        Expr::col(job_entity::Column::Status).eq(JobStatus::Claimed.to_string()),
        2,
    )
    .case(
        Expr::col(job_entity::Column::Status).eq(JobStatus::Processing.to_string()),
        3,
    )
    .case(
        Expr::col(job_entity::Column::Status).eq(JobStatus::Succeeded.to_string()),
        4,
    )
    .finally(5)
    .into()
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model = job_entity::ActiveModel {
            id: Set(job.id),
            a: Set(job.a),
            b: Set(job.b),
            operation: Set(job.operation.clone()),
            status: Set(job.status.to_string()),
            claimed_by: Set(job.claimed_by.clone()),
            created_at: Set(job.created_at),
            claimed_at: Set(job.claimed_at),
            started_at: Set(job.started_at),
            finished_at: Set(job.finished_at),
            attempts: Set(job.attempts),
            error: Set(job.error.clone()),
            version: Set(job.version),
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Job>, RepositoryError> {
        let mut query = job_entity::Entity::find();

        match status {
            Some(status) => {
                query = query
                    .filter(job_entity::Column::Status.eq(status.to_string()))
                    .order_by_desc(job_entity::Column::CreatedAt);
            }
            None => {
                query = query
                    .order_by(status_priority_expr(), Order::Asc)
                    .order_by_desc(job_entity::Column::CreatedAt);
            }
        }

        let models = query
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Job::from).collect())
    }

    async fn count_pending(&self) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Pending.to_string()))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self) -> Result<Vec<(JobStatus, u64)>, RepositoryError> {
        let mut counts = Vec::with_capacity(5);
        for status in [
            JobStatus::Pending,
            JobStatus::Claimed,
            JobStatus::Processing,
            JobStatus::Succeeded,
            JobStatus::Failed,
        ] {
            let count = job_entity::Entity::find()
                .filter(job_entity::Column::Status.eq(status.to_string()))
                .count(self.db.as_ref())
                .await?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    async fn claim_for_bot(&self, bot_id: &str) -> Result<Option<Job>, ClaimError> {
        let txn = self.db.begin().await?;

        // 先锁机器人行，串行化同一机器人的并发认领
        let bot = bot_entity::Entity::find_by_id(bot_id.to_string())
            .filter(bot_entity::Column::DeletedAt.is_null())
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(bot) = bot else {
            txn.rollback().await?;
            return Err(ClaimError::UnknownBot);
        };

        if bot.current_job_id.is_some() {
            txn.rollback().await?;
            return Err(ClaimError::BusyBot);
        }

        // 最老的匹配 pending 任务；被并发事务锁住的行直接跳过，
        // 单条卡住的行不会让整个认领队列排队
        let mut candidates = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Pending.to_string()));
        if let Some(operation) = &bot.assigned_operation {
            candidates = candidates.filter(job_entity::Column::Operation.eq(operation.clone()));
        }
        let candidate = candidates
            .order_by_asc(job_entity::Column::CreatedAt)
            .order_by_asc(job_entity::Column::Id)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let Some(candidate) = candidate else {
            txn.commit().await?;
            return Ok(None);
        };

        let now: DateTime<FixedOffset> = Utc::now().into();
        let next_version = candidate.version + 1;
        let operation = candidate.operation.clone();

        let mut active: job_entity::ActiveModel = candidate.into();
        active.status = Set(JobStatus::Claimed.to_string());
        active.claimed_by = Set(Some(bot.id.clone()));
        active.claimed_at = Set(Some(now));
        active.version = Set(next_version);
        let claimed = active.update(&txn).await?;

        let was_unassigned = bot.assigned_operation.is_none();
        let mut bot_active: bot_entity::ActiveModel = bot.into();
        bot_active.current_job_id = Set(Some(claimed.id));
        bot_active.status = Set(BotStatus::Busy.to_string());
        if was_unassigned {
            // 动态钉定：未指派操作的机器人在首次认领的同一事务内被钉定
            bot_active.assigned_operation = Set(Some(operation));
        }
        bot_active.update(&txn).await?;

        txn.commit().await?;
        Ok(Some(claimed.into()))
    }

    async fn start(&self, job_id: Uuid, bot_id: &str) -> Result<Job, TransitionError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.rollback().await?;
            return Err(TransitionError::JobNotFound);
        };

        let status: JobStatus = job.status.parse().unwrap_or_default();
        if job.claimed_by.as_deref() != Some(bot_id) {
            txn.rollback().await?;
            return Err(TransitionError::NotClaimHolder);
        }

        match status {
            // 重放幂等：已经在执行中且调用方就是认领者
            JobStatus::Processing => {
                txn.commit().await?;
                Ok(job.into())
            }
            JobStatus::Claimed => {
                let next_version = job.version + 1;
                let mut active: job_entity::ActiveModel = job.into();
                active.status = Set(JobStatus::Processing.to_string());
                active.started_at = Set(Some(Utc::now().into()));
                active.version = Set(next_version);
                let updated = active.update(&txn).await?;
                txn.commit().await?;
                Ok(updated.into())
            }
            other => {
                txn.rollback().await?;
                Err(TransitionError::InvalidState(other))
            }
        }
    }

    async fn complete(
        &self,
        job_id: Uuid,
        bot_id: &str,
        result: i64,
        duration_ms: i64,
    ) -> Result<JobResult, TransitionError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.rollback().await?;
            return Err(TransitionError::JobNotFound);
        };

        let status: JobStatus = job.status.parse().unwrap_or_default();

        // 重放同样参数的 complete 返回既有结果；参数不一致或先前已失败
        // 则视为冲突
        if status.is_terminal() {
            let existing = result_entity::Entity::find()
                .filter(result_entity::Column::JobId.eq(job_id))
                .one(&txn)
                .await?;
            txn.commit().await?;
            return match existing {
                Some(row)
                    if status == JobStatus::Succeeded
                        && row.processed_by == bot_id
                        && row.result == Some(result) =>
                {
                    Ok(row.into())
                }
                _ => Err(TransitionError::AlreadyTerminal),
            };
        }

        if job.claimed_by.as_deref() != Some(bot_id) {
            txn.rollback().await?;
            return Err(TransitionError::NotClaimHolder);
        }

        if status != JobStatus::Processing {
            txn.rollback().await?;
            return Err(TransitionError::InvalidState(status));
        }

        let next_version = job.version + 1;
        let mut active: job_entity::ActiveModel = job.clone().into();
        active.status = Set(JobStatus::Succeeded.to_string());
        active.finished_at = Set(Some(Utc::now().into()));
        active.version = Set(next_version);
        active.update(&txn).await?;

        let row = Self::insert_result(
            &txn,
            &job,
            Some(result),
            bot_id,
            duration_ms,
            ResultStatus::Succeeded,
            None,
        )
        .await?;

        Self::unbind_bot(&txn, bot_id, job_id).await?;

        txn.commit().await?;
        Ok(row.into())
    }

    async fn fail(
        &self,
        job_id: Uuid,
        bot_id: &str,
        error: &str,
        duration_ms: i64,
    ) -> Result<JobResult, TransitionError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.rollback().await?;
            return Err(TransitionError::JobNotFound);
        };

        let status: JobStatus = job.status.parse().unwrap_or_default();

        if status.is_terminal() {
            let existing = result_entity::Entity::find()
                .filter(result_entity::Column::JobId.eq(job_id))
                .one(&txn)
                .await?;
            txn.commit().await?;
            return match existing {
                Some(row)
                    if status == JobStatus::Failed
                        && row.processed_by == bot_id
                        && row.error.as_deref() == Some(error) =>
                {
                    Ok(row.into())
                }
                _ => Err(TransitionError::AlreadyTerminal),
            };
        }

        if job.claimed_by.as_deref() != Some(bot_id) {
            txn.rollback().await?;
            return Err(TransitionError::NotClaimHolder);
        }

        if status != JobStatus::Processing {
            txn.rollback().await?;
            return Err(TransitionError::InvalidState(status));
        }

        let next_version = job.version + 1;
        let next_attempts = job.attempts + 1;
        let mut active: job_entity::ActiveModel = job.clone().into();
        active.status = Set(JobStatus::Failed.to_string());
        active.finished_at = Set(Some(Utc::now().into()));
        active.attempts = Set(next_attempts);
        active.error = Set(Some(error.to_string()));
        active.version = Set(next_version);
        active.update(&txn).await?;

        let row = Self::insert_result(
            &txn,
            &job,
            None,
            bot_id,
            duration_ms,
            ResultStatus::Failed,
            Some(error),
        )
        .await?;

        Self::unbind_bot(&txn, bot_id, job_id).await?;

        txn.commit().await?;
        Ok(row.into())
    }

    async fn fail_unattended(
        &self,
        job_id: Uuid,
        error: &str,
    ) -> Result<Option<JobResult>, RepositoryError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        // 状态在检测与恢复之间变了：别处已经处理，放手
        let Some(job) = job else {
            txn.commit().await?;
            return Ok(None);
        };

        let Some(holder) = job.claimed_by.clone() else {
            txn.commit().await?;
            return Ok(None);
        };

        let now = Utc::now();
        let duration_ms = job
            .started_at
            .map(|started| (now.signed_duration_since(started)).num_milliseconds())
            .unwrap_or(0);

        let next_version = job.version + 1;
        let next_attempts = job.attempts + 1;
        let mut active: job_entity::ActiveModel = job.clone().into();
        active.status = Set(JobStatus::Failed.to_string());
        active.finished_at = Set(Some(now.into()));
        active.attempts = Set(next_attempts);
        active.error = Set(Some(error.to_string()));
        active.version = Set(next_version);
        active.update(&txn).await?;

        let row = Self::insert_result(
            &txn,
            &job,
            None,
            &holder,
            duration_ms,
            ResultStatus::Failed,
            Some(error),
        )
        .await?;

        Self::unbind_bot(&txn, &holder, job_id).await?;

        txn.commit().await?;
        Ok(Some(row.into()))
    }

    async fn release(
        &self,
        job_id: Uuid,
        reason: &str,
        allowed: &[JobStatus],
    ) -> Result<Job, ReleaseError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.rollback().await?;
            return Err(ReleaseError::JobNotFound);
        };

        let status: JobStatus = job.status.parse().unwrap_or_default();
        if !allowed.contains(&status) {
            txn.rollback().await?;
            return Err(ReleaseError::NotReleasable(status));
        }

        let holder = job.claimed_by.clone();
        let next_version = job.version + 1;
        let next_attempts = job.attempts + 1;
        let mut active: job_entity::ActiveModel = job.into();
        active.status = Set(JobStatus::Pending.to_string());
        active.claimed_by = Set(None);
        active.claimed_at = Set(None);
        active.started_at = Set(None);
        active.attempts = Set(next_attempts);
        active.error = Set(Some(reason.to_string()));
        active.version = Set(next_version);
        let released = active.update(&txn).await?;

        if let Some(bot_id) = holder {
            Self::unbind_bot(&txn, &bot_id, job_id).await?;
        }

        txn.commit().await?;
        Ok(released.into())
    }

    async fn find_stuck_claimed(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Claimed.to_string()))
            .filter(job_entity::Column::ClaimedAt.lte(cutoff))
            .order_by_asc(job_entity::Column::ClaimedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Job::from).collect())
    }

    async fn find_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
            .filter(job_entity::Column::StartedAt.lte(cutoff))
            .order_by_asc(job_entity::Column::StartedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Job::from).collect())
    }
}
