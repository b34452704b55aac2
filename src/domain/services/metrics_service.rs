// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::bot_repository::BotRepository;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::CoordinatorError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 指标汇总
#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub timestamp: DateTime<Utc>,
    /// 任务按状态计数
    pub jobs: BTreeMap<String, u64>,
    /// 机器人按派生状态计数
    pub bots: BTreeMap<String, u64>,
    /// 吞吐量
    pub throughput: Throughput,
}

#[derive(Debug, Serialize)]
pub struct Throughput {
    /// 最近一小时写入的结果数
    pub completed_last_hour: u64,
}

/// 指标汇总服务
pub struct MetricsService {
    jobs: Arc<dyn JobRepository>,
    bots: Arc<dyn BotRepository>,
    results: Arc<dyn ResultRepository>,
    down_threshold: Duration,
}

impl MetricsService {
    /// 创建指标汇总服务
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        bots: Arc<dyn BotRepository>,
        results: Arc<dyn ResultRepository>,
        down_threshold: Duration,
    ) -> Self {
        Self {
            jobs,
            bots,
            results,
            down_threshold,
        }
    }

    /// 汇总任务、机器人与吞吐量指标
    pub async fn summary(&self) -> Result<MetricsSummary, CoordinatorError> {
        let now = Utc::now();

        let mut jobs = BTreeMap::new();
        for (status, count) in self.jobs.count_by_status().await? {
            jobs.insert(status.to_string(), count);
        }

        let mut bots = BTreeMap::new();
        for bot in self.bots.list(true).await? {
            let status = bot.computed_status(now, self.down_threshold).to_string();
            *bots.entry(status).or_insert(0) += 1;
        }

        let completed_last_hour = self.results.count_since(now - Duration::hours(1)).await?;

        Ok(MetricsSummary {
            timestamp: now,
            jobs,
            bots,
            throughput: Throughput { completed_last_hour },
        })
    }
}
