// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::bot::Bot;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub id: String,
    pub assigned_operation: Option<String>,
}

/// 心跳请求
#[derive(Debug, Deserialize, Validate)]
pub struct HeartbeatRequest {
    #[validate(length(min = 1))]
    pub id: String,
}

/// 操作指派请求；operation 为空即清除钉定
#[derive(Debug, Deserialize)]
pub struct AssignOperationRequest {
    pub operation: Option<String>,
}

/// 机器人列表查询参数
#[derive(Debug, Deserialize)]
pub struct BotListQuery {
    pub include_deleted: Option<bool>,
}

/// 机器人响应
#[derive(Debug, Serialize)]
pub struct BotResponse {
    pub id: String,
    pub status: String,
    /// 叠加软删除与心跳超时之后的派生状态
    pub computed_status: String,
    pub current_job_id: Option<Uuid>,
    pub assigned_operation: Option<String>,
    pub last_heartbeat_at: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
    pub health_status: String,
    pub stuck_job_id: Option<Uuid>,
    pub health_checked_at: Option<DateTime<FixedOffset>>,
}

impl BotResponse {
    /// 从领域模型构造响应
    ///
    /// # 参数
    ///
    /// * `bot` - 机器人
    /// * `now` - 当前时间
    /// * `down_threshold` - 心跳超时阈值
    pub fn from_bot(bot: Bot, now: DateTime<Utc>, down_threshold: Duration) -> Self {
        let computed_status = bot.computed_status(now, down_threshold).to_string();
        Self {
            id: bot.id,
            status: bot.status.to_string(),
            computed_status,
            current_job_id: bot.current_job_id,
            assigned_operation: bot.assigned_operation,
            last_heartbeat_at: bot.last_heartbeat_at,
            created_at: bot.created_at,
            deleted_at: bot.deleted_at,
            health_status: bot.health_status.to_string(),
            stuck_job_id: bot.stuck_job_id,
            health_checked_at: bot.health_checked_at,
        }
    }
}
