// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::bot::Bot;
use crate::domain::models::job_result::JobResult;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 软删除的结果
///
/// 软删除会同时处理机器人持有的任务：claimed 任务释放回 pending，
/// processing 任务记失败终态并产生结果行（需要镜像到数据湖）
#[derive(Debug)]
pub struct SoftDeleteOutcome {
    /// 删除后的机器人
    pub bot: Bot,
    /// 被释放回 pending 的任务ID
    pub released_job_id: Option<Uuid>,
    /// 被记为失败的任务产生的结果
    pub failed_result: Option<JobResult>,
}

/// 机器人仓库特质
#[async_trait]
pub trait BotRepository: Send + Sync {
    /// 注册机器人；同ID重复注册幂等，软删除过的记录被复活
    async fn register(
        &self,
        id: &str,
        assigned_operation: Option<&str>,
    ) -> Result<Bot, RepositoryError>;
    /// 根据ID查找机器人（包含已软删除的）
    async fn find_by_id(&self, id: &str) -> Result<Option<Bot>, RepositoryError>;
    /// 更新心跳；机器人不存在或已删除时返回 false
    async fn heartbeat(&self, id: &str) -> Result<bool, RepositoryError>;
    /// 列出机器人
    async fn list(&self, include_deleted: bool) -> Result<Vec<Bot>, RepositoryError>;
    /// 设置或清除钉定的操作；清除后下次认领重新动态钉定
    async fn assign_operation(
        &self,
        id: &str,
        operation: Option<&str>,
    ) -> Result<Option<Bot>, RepositoryError>;
    /// 软删除机器人并在同一事务内处置其持有的任务
    async fn soft_delete(&self, id: &str) -> Result<Option<SoftDeleteOutcome>, RepositoryError>;
    /// 管理员复位：清除任务绑定与健康标记，释放其认领的任务
    async fn reset(&self, id: &str) -> Result<Option<Bot>, RepositoryError>;
    /// 统计可物理清除的机器人数量（软删除早于 cutoff）
    async fn count_retired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 物理删除软删除早于 cutoff 的机器人行
    async fn delete_retired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 标记疑似卡住的机器人：任务 processing 超时但心跳仍新鲜
    async fn mark_potentially_stuck(
        &self,
        processing_cutoff: DateTime<Utc>,
        heartbeat_cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
    /// 清除已恢复机器人的疑似卡住标记
    async fn clear_recovered_health(&self) -> Result<u64, RepositoryError>;
}
