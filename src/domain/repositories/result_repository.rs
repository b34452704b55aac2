// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_result::JobResult;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 结果仓库特质
///
/// 结果行由任务仓库在终态事务内写入；这里只提供读取与保留期清理
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 查找任务对应的结果
    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Option<JobResult>, RepositoryError>;
    /// 统计某时刻之后写入的结果数量
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 统计引用了已不存在机器人的孤儿结果数量
    async fn count_orphaned(&self) -> Result<u64, RepositoryError>;
    /// 清除孤儿结果
    async fn purge_orphaned(&self) -> Result<u64, RepositoryError>;
}
