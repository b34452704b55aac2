// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::domain::services::job_service::JobDetails;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 批量生成任务请求
#[derive(Debug, Deserialize, Validate)]
pub struct PopulateRequest {
    /// 生成数量，缺省用配置值
    #[validate(range(min = 1, max = 100))]
    pub batch_size: Option<u32>,
    /// 指定操作名；缺省随机
    pub operation: Option<String>,
}

/// 批量生成任务响应
#[derive(Debug, Serialize)]
pub struct PopulateResponse {
    pub created: Vec<Uuid>,
}

/// 任务列表查询参数
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 认领请求
#[derive(Debug, Deserialize, Validate)]
pub struct ClaimRequest {
    #[validate(length(min = 1))]
    pub bot_id: String,
}

/// 开始执行请求
#[derive(Debug, Deserialize, Validate)]
pub struct StartRequest {
    #[validate(length(min = 1))]
    pub bot_id: String,
}

/// 完成请求
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteRequest {
    #[validate(length(min = 1))]
    pub bot_id: String,
    pub result: i64,
    #[validate(range(min = 0))]
    pub duration_ms: i64,
}

/// 失败请求
#[derive(Debug, Deserialize, Validate)]
pub struct FailRequest {
    #[validate(length(min = 1))]
    pub bot_id: String,
    #[validate(length(min = 1))]
    pub error: String,
    #[validate(range(min = 0))]
    pub duration_ms: i64,
}

/// 释放请求
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub reason: Option<String>,
}

/// 任务响应
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub a: i32,
    pub b: i32,
    pub operation: String,
    pub status: String,
    pub claimed_by: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub claimed_at: Option<DateTime<FixedOffset>>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    pub attempts: i32,
    pub error: Option<String>,
    pub version: i32,
    /// 结果行的产出；未终结时为空
    pub result: Option<i64>,
    pub duration_ms: Option<i64>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            a: job.a,
            b: job.b,
            operation: job.operation,
            status: job.status.to_string(),
            claimed_by: job.claimed_by,
            created_at: job.created_at,
            claimed_at: job.claimed_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            attempts: job.attempts,
            error: job.error,
            version: job.version,
            result: None,
            duration_ms: None,
        }
    }
}

impl From<JobDetails> for JobResponse {
    fn from(details: JobDetails) -> Self {
        let mut response = JobResponse::from(details.job);
        response.result = details.result;
        response.duration_ms = details.duration_ms;
        response
    }
}
