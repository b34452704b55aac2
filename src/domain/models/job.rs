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

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 任务实体
///
/// 表示系统中一个待分派的计算单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 第一个操作数
    pub a: i32,
    /// 第二个操作数
    pub b: i32,
    /// 操作名，引用操作注册表
    pub operation: String,
    /// 任务状态
    pub status: JobStatus,
    /// 认领该任务的机器人ID
    pub claimed_by: Option<String>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 认领时间
    pub claimed_at: Option<DateTime<FixedOffset>>,
    /// 开始执行时间
    pub started_at: Option<DateTime<FixedOffset>>,
    /// 结束时间
    pub finished_at: Option<DateTime<FixedOffset>>,
    /// 已尝试次数
    pub attempts: i32,
    /// 错误信息
    pub error: Option<String>,
    /// 每次状态变更递增的版本号
    pub version: i32,
}

/// 任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 等待认领
    #[default]
    Pending,
    /// 已认领
    Claimed,
    /// 执行中
    Processing,
    /// 已成功
    Succeeded,
    /// 已失败
    Failed,
}

impl JobStatus {
    /// 列表排序用的状态优先级键
    ///
    /// 可操作的状态排在终态之前，翻页时运维先看到全部 pending 任务
    pub fn priority(self) -> u8 {
        match self {
            JobStatus::Pending => 1,
            JobStatus::Claimed => 2,
            JobStatus::Processing => 3,
            JobStatus::Succeeded => 4,
            JobStatus::Failed => 5,
        }
    }

    /// 判断是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Claimed => write!(f, "claimed"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "claimed" => Ok(JobStatus::Claimed),
            "processing" => Ok(JobStatus::Processing),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

impl Job {
    /// 创建一个新的待认领任务
    ///
    /// # 参数
    ///
    /// * `a` - 第一个操作数
    /// * `b` - 第二个操作数
    /// * `operation` - 操作名
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例
    pub fn new(a: i32, b: i32, operation: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            a,
            b,
            operation,
            status: JobStatus::Pending,
            claimed_by: None,
            created_at: Utc::now().into(),
            claimed_at: None,
            started_at: None,
            finished_at: None,
            attempts: 0,
            error: None,
            version: 1,
        }
    }
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
