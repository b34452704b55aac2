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

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::job_result::JobResult;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::CoordinatorError;
use crate::infrastructure::datalake::DatalakeSink;
use crate::infrastructure::metrics::{DATALAKE_APPEND_FAILURES, INVARIANT_VIOLATIONS};
use crate::operations::registry::OperationRegistry;
use metrics::counter;
use rand::Rng;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 单页列表的上限
const MAX_LIST_LIMIT: u64 = 1000;

/// 一次生成的结果
#[derive(Debug)]
pub struct PopulateOutcome {
    /// 新建任务的ID
    pub created: Vec<Uuid>,
    /// 指定的操作名；为空表示随机混合
    pub operation: Option<String>,
}

/// 任务详情：任务行加上结果行的产出
#[derive(Debug)]
pub struct JobDetails {
    pub job: Job,
    pub result: Option<i64>,
    pub duration_ms: Option<i64>,
}

/// 任务服务
///
/// 实现任务的全部状态转换。监控循环与管理接口走的都是这里的方法，
/// 恢复路径和正常路径共用同一套代码。
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    registry: Arc<OperationRegistry>,
    datalake: Arc<DatalakeSink>,
    max_pending_jobs: u64,
}

impl JobService {
    /// 创建任务服务
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        registry: Arc<OperationRegistry>,
        datalake: Arc<DatalakeSink>,
        max_pending_jobs: u64,
    ) -> Self {
        Self {
            jobs,
            results,
            registry,
            datalake,
            max_pending_jobs,
        }
    }

    /// 生成一批新任务
    ///
    /// # 参数
    ///
    /// * `batch_size` - 期望生成的数量
    /// * `operation` - 指定操作名；为空时每个任务随机挑选
    ///
    /// # 返回值
    ///
    /// 实际生成的任务ID。pending 总量达到上限时批次被截断，
    /// 调用方从返回值得知实际创建数。
    pub async fn populate(
        &self,
        batch_size: u32,
        operation: Option<&str>,
    ) -> Result<PopulateOutcome, CoordinatorError> {
        if let Some(op) = operation {
            if !self.registry.contains(op) {
                return Err(CoordinatorError::UnknownOperation(op.to_string()));
            }
        }

        let pending = self.jobs.count_pending().await?;
        let headroom = self.max_pending_jobs.saturating_sub(pending);
        let count = u64::from(batch_size).min(headroom);
        if count < u64::from(batch_size) {
            warn!(
                pending,
                ceiling = self.max_pending_jobs,
                requested = batch_size,
                creating = count,
                "Pending ceiling reached, truncating populate batch"
            );
        }

        let names = self.registry.names();
        let mut created = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let op = match operation {
                Some(op) => op.to_string(),
                None => {
                    let idx = rand::thread_rng().gen_range(0..names.len());
                    names[idx].to_string()
                }
            };
            let a = rand::thread_rng().gen_range(0..=999);
            // 除法任务不生成零除数
            let b = if op == "divide" {
                rand::thread_rng().gen_range(1..=999)
            } else {
                rand::thread_rng().gen_range(0..=999)
            };

            let job = self.jobs.create(&Job::new(a, b, op)).await?;
            created.push(job.id);
        }

        info!(count = created.len(), operation = ?operation, "Created new jobs");
        Ok(PopulateOutcome {
            created,
            operation: operation.map(str::to_string),
        })
    }

    /// 列出任务
    ///
    /// 无状态过滤时按状态优先级键排序，翻页的运维先看完全部
    /// 可操作任务再看到终态任务
    pub async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Job>, CoordinatorError> {
        let limit = limit.min(MAX_LIST_LIMIT);
        Ok(self.jobs.list(status, limit, offset).await?)
    }

    /// 查询单个任务及其产出
    pub async fn get_job(&self, id: Uuid) -> Result<JobDetails, CoordinatorError> {
        let job = self
            .jobs
            .find_by_id(id)
            .await?
            .ok_or(CoordinatorError::NotFound("Job"))?;

        let result_row = self.results.find_by_job_id(id).await?;
        let (result, duration_ms) = match result_row {
            Some(row) => (row.result, Some(row.duration_ms)),
            None => (None, None),
        };

        Ok(JobDetails {
            job,
            result,
            duration_ms,
        })
    }

    /// 为机器人认领一个任务
    ///
    /// 没有匹配任务时返回 `Ok(None)`，由调用方按自己的节奏轮询
    pub async fn claim(&self, bot_id: &str) -> Result<Option<Job>, CoordinatorError> {
        let claimed = self.jobs.claim_for_bot(bot_id).await?;

        if let Some(job) = &claimed {
            // 模式约束下不可能出现未注册操作；出现即是缺陷
            if !self.registry.contains(&job.operation) {
                counter!(INVARIANT_VIOLATIONS).increment(1);
                error!(
                    job_id = %job.id,
                    operation = %job.operation,
                    "Claimed job references an operation missing from the registry"
                );
                return Err(CoordinatorError::UnknownOperation(job.operation.clone()));
            }
            info!(job_id = %job.id, bot_id, operation = %job.operation, "Job claimed");
        }

        Ok(claimed)
    }

    /// 标记任务开始执行；重放幂等
    pub async fn start(&self, job_id: Uuid, bot_id: &str) -> Result<(), CoordinatorError> {
        self.jobs.start(job_id, bot_id).await?;
        Ok(())
    }

    /// 记录成功终态并镜像到数据湖
    pub async fn complete(
        &self,
        job_id: Uuid,
        bot_id: &str,
        result: i64,
        duration_ms: i64,
    ) -> Result<(), CoordinatorError> {
        let row = self.jobs.complete(job_id, bot_id, result, duration_ms).await?;
        info!(job_id = %job_id, bot_id, result, "Job completed");
        self.mirror_to_datalake(&row).await;
        Ok(())
    }

    /// 记录失败终态并镜像到数据湖
    pub async fn fail(
        &self,
        job_id: Uuid,
        bot_id: &str,
        error_message: &str,
        duration_ms: i64,
    ) -> Result<(), CoordinatorError> {
        let row = self
            .jobs
            .fail(job_id, bot_id, error_message, duration_ms)
            .await?;
        info!(job_id = %job_id, bot_id, error = error_message, "Job failed");
        self.mirror_to_datalake(&row).await;
        Ok(())
    }

    /// 管理员把卡住的任务释放回队列
    pub async fn release(
        &self,
        job_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Job, CoordinatorError> {
        let reason = reason.unwrap_or("manual-release");
        let released = self
            .jobs
            .release(
                job_id,
                reason,
                &[JobStatus::Claimed, JobStatus::Processing],
            )
            .await?;

        info!(job_id = %job_id, reason, "Job released back to pending");
        Ok(released)
    }

    /// 数据湖追加是尽力而为：失败只记日志和计数，权威记录在数据库里
    pub async fn mirror_to_datalake(&self, row: &JobResult) {
        if let Err(e) = self.datalake.append(row).await {
            counter!(DATALAKE_APPEND_FAILURES).increment(1);
            error!(job_id = %row.job_id, error = %e, "Failed to append result to datalake");
        }
    }
}
