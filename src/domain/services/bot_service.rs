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

use crate::domain::models::bot::Bot;
use crate::domain::repositories::bot_repository::BotRepository;
use crate::domain::services::CoordinatorError;
use crate::infrastructure::datalake::DatalakeSink;
use crate::infrastructure::metrics::DATALAKE_APPEND_FAILURES;
use crate::operations::registry::OperationRegistry;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info};

/// 机器人服务
///
/// 管理机器人的身份、存活与操作指派
pub struct BotService {
    bots: Arc<dyn BotRepository>,
    registry: Arc<OperationRegistry>,
    datalake: Arc<DatalakeSink>,
}

impl BotService {
    /// 创建机器人服务
    pub fn new(
        bots: Arc<dyn BotRepository>,
        registry: Arc<OperationRegistry>,
        datalake: Arc<DatalakeSink>,
    ) -> Self {
        Self {
            bots,
            registry,
            datalake,
        }
    }

    /// 注册机器人
    ///
    /// 同ID重复注册幂等；软删除过的记录被复活。未显式给出
    /// `assigned_operation` 时保留既有钉定。
    pub async fn register(
        &self,
        id: &str,
        assigned_operation: Option<&str>,
    ) -> Result<Bot, CoordinatorError> {
        if let Some(op) = assigned_operation {
            if !self.registry.contains(op) {
                return Err(CoordinatorError::UnknownOperation(op.to_string()));
            }
        }

        let bot = self.bots.register(id, assigned_operation).await?;
        info!(bot_id = id, assigned_operation = ?assigned_operation, "Bot registered");
        Ok(bot)
    }

    /// 更新心跳
    pub async fn heartbeat(&self, id: &str) -> Result<(), CoordinatorError> {
        if !self.bots.heartbeat(id).await? {
            return Err(CoordinatorError::NotFound("Bot"));
        }
        Ok(())
    }

    /// 管理员设置或清除钉定的操作
    ///
    /// 清除后机器人恢复动态钉定：下次成功认领时钉到该任务的操作
    pub async fn assign_operation(
        &self,
        id: &str,
        operation: Option<&str>,
    ) -> Result<Bot, CoordinatorError> {
        if let Some(op) = operation {
            if !self.registry.contains(op) {
                return Err(CoordinatorError::UnknownOperation(op.to_string()));
            }
        }

        let bot = self
            .bots
            .assign_operation(id, operation)
            .await?
            .ok_or(CoordinatorError::NotFound("Bot"))?;

        info!(bot_id = id, operation = ?operation, "Bot operation assignment updated");
        Ok(bot)
    }

    /// 软删除机器人
    ///
    /// 其持有的 claimed 任务回到队列，processing 任务记失败终态并
    /// 镜像到数据湖。行保留到保留期结束再物理清除。
    pub async fn soft_delete(&self, id: &str) -> Result<(), CoordinatorError> {
        let outcome = self
            .bots
            .soft_delete(id)
            .await?
            .ok_or(CoordinatorError::NotFound("Bot"))?;

        if let Some(job_id) = outcome.released_job_id {
            info!(bot_id = id, job_id = %job_id, "Released claimed job of deleted bot");
        }
        if let Some(row) = outcome.failed_result {
            info!(bot_id = id, job_id = %row.job_id, "Failed processing job of deleted bot");
            if let Err(e) = self.datalake.append(&row).await {
                counter!(DATALAKE_APPEND_FAILURES).increment(1);
                error!(job_id = %row.job_id, error = %e, "Failed to append result to datalake");
            }
        }

        info!(bot_id = id, "Bot deleted");
        Ok(())
    }

    /// 管理员复位：清除任务绑定与健康标记，释放名下任务
    pub async fn reset(&self, id: &str) -> Result<Bot, CoordinatorError> {
        let bot = self
            .bots
            .reset(id)
            .await?
            .ok_or(CoordinatorError::NotFound("Bot"))?;

        info!(bot_id = id, "Bot state reset");
        Ok(bot)
    }

    /// 列出机器人
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<Bot>, CoordinatorError> {
        Ok(self.bots.list(include_deleted).await?)
    }
}
