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

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 机器人实体
///
/// 表示一个已注册的工作进程。机器人无状态，权威状态全部在协调器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    /// 机器人标识符，由调用方在注册时提供
    pub id: String,
    /// 运行状态
    pub status: BotStatus,
    /// 当前绑定的任务ID
    pub current_job_id: Option<Uuid>,
    /// 固定的操作名；为空时首次认领后自动钉定
    pub assigned_operation: Option<String>,
    /// 最近一次心跳时间
    pub last_heartbeat_at: DateTime<FixedOffset>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 软删除时间
    pub deleted_at: Option<DateTime<FixedOffset>>,
    /// 健康状态
    pub health_status: HealthStatus,
    /// 疑似卡住的任务ID
    pub stuck_job_id: Option<Uuid>,
    /// 最近一次健康检查时间
    pub health_checked_at: Option<DateTime<FixedOffset>>,
}

/// 机器人运行状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    /// 空闲
    #[default]
    Idle,
    /// 执行任务中
    Busy,
    /// 已离线
    Down,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BotStatus::Idle => write!(f, "idle"),
            BotStatus::Busy => write!(f, "busy"),
            BotStatus::Down => write!(f, "down"),
        }
    }
}

impl FromStr for BotStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(BotStatus::Idle),
            "busy" => Ok(BotStatus::Busy),
            "down" => Ok(BotStatus::Down),
            _ => Err(()),
        }
    }
}

/// 机器人健康状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// 正常
    #[default]
    Normal,
    /// 疑似卡住
    PotentiallyStuck,
    /// 不健康
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HealthStatus::Normal => write!(f, "normal"),
            HealthStatus::PotentiallyStuck => write!(f, "potentially_stuck"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

impl FromStr for HealthStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(HealthStatus::Normal),
            "potentially_stuck" => Ok(HealthStatus::PotentiallyStuck),
            "unhealthy" => Ok(HealthStatus::Unhealthy),
            _ => Err(()),
        }
    }
}

/// 对外展示的派生状态
///
/// 软删除与心跳超时盖过存储的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputedStatus {
    Deleted,
    Down,
    Idle,
    Busy,
}

impl fmt::Display for ComputedStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComputedStatus::Deleted => write!(f, "deleted"),
            ComputedStatus::Down => write!(f, "down"),
            ComputedStatus::Idle => write!(f, "idle"),
            ComputedStatus::Busy => write!(f, "busy"),
        }
    }
}

impl Bot {
    /// 计算对外展示状态
    ///
    /// # 参数
    ///
    /// * `now` - 当前时间
    /// * `down_threshold` - 心跳超时阈值
    ///
    /// # 返回值
    ///
    /// 已删除返回 `deleted`，心跳过期返回 `down`，否则返回存储状态
    pub fn computed_status(&self, now: DateTime<Utc>, down_threshold: Duration) -> ComputedStatus {
        if self.deleted_at.is_some() {
            return ComputedStatus::Deleted;
        }
        if now.signed_duration_since(self.last_heartbeat_at) > down_threshold {
            return ComputedStatus::Down;
        }
        match self.status {
            BotStatus::Idle => ComputedStatus::Idle,
            BotStatus::Busy => ComputedStatus::Busy,
            BotStatus::Down => ComputedStatus::Down,
        }
    }
}

#[cfg(test)]
#[path = "bot_test.rs"]
mod tests;
