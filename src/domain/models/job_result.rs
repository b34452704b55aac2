// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 一次终态执行的不可变记录
///
/// 每个终态转换写入一行，此后不再更新，同时镜像到数据湖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub a: i32,
    pub b: i32,
    pub operation: String,
    /// 计算结果；失败且未产出时为空
    pub result: Option<i64>,
    pub processed_by: String,
    pub processed_at: DateTime<FixedOffset>,
    pub duration_ms: i64,
    pub status: ResultStatus,
    pub error: Option<String>,
}

/// 结果状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResultStatus::Succeeded => write!(f, "succeeded"),
            ResultStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ResultStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(ResultStatus::Succeeded),
            "failed" => Ok(ResultStatus::Failed),
            _ => Err(()),
        }
    }
}
