// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::job_result::JobResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 认领失败的原因
#[derive(Error, Debug)]
pub enum ClaimError {
    /// 机器人不存在或已删除
    #[error("Bot is unknown or deleted")]
    UnknownBot,
    /// 机器人已持有任务
    #[error("Bot already holds an active job")]
    BusyBot,
    /// 仓库错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DbErr> for ClaimError {
    fn from(err: DbErr) -> Self {
        ClaimError::Repository(err.into())
    }
}

/// 状态转换失败的原因
#[derive(Error, Debug)]
pub enum TransitionError {
    /// 任务不存在
    #[error("Job not found")]
    JobNotFound,
    /// 调用方不是该任务的认领者
    #[error("Caller does not hold the claim on this job")]
    NotClaimHolder,
    /// 当前状态不允许此转换
    #[error("Job is in {0} state")]
    InvalidState(JobStatus),
    /// 任务已处于终态，且重放参数不一致
    #[error("Job already reached a terminal state")]
    AlreadyTerminal,
    /// 仓库错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DbErr> for TransitionError {
    fn from(err: DbErr) -> Self {
        TransitionError::Repository(err.into())
    }
}

/// 释放失败的原因
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// 任务不存在
    #[error("Job not found")]
    JobNotFound,
    /// 当前状态不允许释放
    #[error("Job is in {0} state and cannot be released")]
    NotReleasable(JobStatus),
    /// 仓库错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DbErr> for ReleaseError {
    fn from(err: DbErr) -> Self {
        ReleaseError::Repository(err.into())
    }
}

/// 任务仓库特质
///
/// 每个多语句状态转换都是一个方法，实现方必须在单个事务内完成，
/// 服务层永远看不到中间状态
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 列出任务；无状态过滤时按状态优先级键排序
    async fn list(
        &self,
        status: Option<JobStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Job>, RepositoryError>;
    /// 统计 pending 任务数量
    async fn count_pending(&self) -> Result<u64, RepositoryError>;
    /// 按状态统计任务数量
    async fn count_by_status(&self) -> Result<Vec<(JobStatus, u64)>, RepositoryError>;
    /// 为机器人原子认领最老的匹配任务
    ///
    /// 锁定机器人行后用 skip-locked 扫描挑选候选任务，任务与机器人
    /// 在同一事务内更新；未钉定操作的机器人在认领瞬间被钉定。
    /// 没有匹配任务时返回 `Ok(None)`。
    async fn claim_for_bot(&self, bot_id: &str) -> Result<Option<Job>, ClaimError>;
    /// 将任务从 claimed 推进到 processing；重放时幂等
    async fn start(&self, job_id: Uuid, bot_id: &str) -> Result<Job, TransitionError>;
    /// 记录成功终态：任务、结果行、机器人解绑在同一事务内完成
    async fn complete(
        &self,
        job_id: Uuid,
        bot_id: &str,
        result: i64,
        duration_ms: i64,
    ) -> Result<JobResult, TransitionError>;
    /// 记录失败终态
    async fn fail(
        &self,
        job_id: Uuid,
        bot_id: &str,
        error: &str,
        duration_ms: i64,
    ) -> Result<JobResult, TransitionError>;
    /// 监控路径：对仍在 processing 的任务记失败终态，认领者取自任务行
    ///
    /// 任务状态已经变化时返回 `Ok(None)`，调用方视为已被别处恢复。
    async fn fail_unattended(
        &self,
        job_id: Uuid,
        error: &str,
    ) -> Result<Option<JobResult>, RepositoryError>;
    /// 将任务释放回 pending，递增 attempts 并记录原因
    ///
    /// `allowed` 限定可释放的起始状态：管理员传 claimed 与 processing，
    /// 认领超时监控只传 claimed。
    async fn release(
        &self,
        job_id: Uuid,
        reason: &str,
        allowed: &[JobStatus],
    ) -> Result<Job, ReleaseError>;
    /// 查找认领超时的任务
    async fn find_stuck_claimed(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Job>, RepositoryError>;
    /// 查找执行超时的任务
    async fn find_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Job>, RepositoryError>;
}
