// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;

/// 周期性任务生成器
pub mod populator;

/// claimed 超时监控
pub mod claimed_job_monitor;

/// processing 超时监控
pub mod processing_job_monitor;

/// 机器人健康标记
pub mod bot_health_monitor;

/// 保留期清理
pub mod retention_cleaner;

/// 一次监控周期的结果
#[derive(Debug, Default, Clone, Serialize)]
pub struct MonitorReport {
    /// 检出的候选数量
    pub checked: u64,
    /// 成功恢复的数量
    pub recovered: u64,
    /// 恢复失败的数量
    pub errors: u64,
}
