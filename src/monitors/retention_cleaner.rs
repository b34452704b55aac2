use crate::domain::repositories::bot_repository::BotRepository;
use crate::domain::repositories::result_repository::ResultRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 保留的历史运行报告条数
const MAX_HISTORY: usize = 10;

/// 一次清理运行的报告
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
    /// 物理删除（或待删除）的机器人行数
    pub deleted_bots: u64,
    /// 清除（或待清除）的孤儿结果行数
    pub purged_results: u64,
    pub errors: Vec<String>,
}

/// 保留期清理
///
/// 物理删除软删除超过保留期的机器人行，并清除引用了已消失机器人
/// 的孤儿结果。dry_run 只返回计数不动数据。最近十次运行的报告留在
/// 内存里供管理接口查询。
pub struct RetentionCleaner {
    bots: Arc<dyn BotRepository>,
    results: Arc<dyn ResultRepository>,
    interval: Duration,
    retention: chrono::Duration,
    history: Mutex<VecDeque<CleanupReport>>,
    next_run_at: Mutex<Option<DateTime<Utc>>>,
}

impl RetentionCleaner {
    pub fn new(
        bots: Arc<dyn BotRepository>,
        results: Arc<dyn ResultRepository>,
        interval: Duration,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            bots,
            results,
            interval,
            retention,
            history: Mutex::new(VecDeque::new()),
            next_run_at: Mutex::new(None),
        }
    }

    /// 执行一次清理
    ///
    /// # 参数
    ///
    /// * `dry_run` - 为真时只统计将要删除的行数
    pub async fn run_cleanup(&self, dry_run: bool) -> CleanupReport {
        let cutoff = Utc::now() - self.retention;
        let mut report = CleanupReport {
            timestamp: Utc::now(),
            dry_run,
            deleted_bots: 0,
            purged_results: 0,
            errors: Vec::new(),
        };

        if dry_run {
            match self.bots.count_retired(cutoff).await {
                Ok(count) => report.deleted_bots = count,
                Err(e) => report.errors.push(format!("count retired bots: {e}")),
            }
            match self.results.count_orphaned().await {
                Ok(count) => report.purged_results = count,
                Err(e) => report.errors.push(format!("count orphaned results: {e}")),
            }
        } else {
            match self.bots.delete_retired(cutoff).await {
                Ok(count) => report.deleted_bots = count,
                Err(e) => report.errors.push(format!("delete retired bots: {e}")),
            }
            // 机器人行删掉之后才会出现新的孤儿结果，顺序固定
            match self.results.purge_orphaned().await {
                Ok(count) => report.purged_results = count,
                Err(e) => report.errors.push(format!("purge orphaned results: {e}")),
            }
        }

        info!(
            dry_run,
            deleted_bots = report.deleted_bots,
            purged_results = report.purged_results,
            errors = report.errors.len(),
            "Cleanup run completed"
        );

        let mut history = self.history.lock().unwrap();
        history.push_back(report.clone());
        while history.len() > MAX_HISTORY {
            history.pop_front();
        }

        report
    }

    /// 最近的运行报告，新的在前
    pub fn history(&self) -> Vec<CleanupReport> {
        self.history.lock().unwrap().iter().rev().cloned().collect()
    }

    /// 下一次计划运行的时间
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        *self.next_run_at.lock().unwrap()
    }

    /// 运行清理循环
    pub async fn run(&self) {
        info!(
            interval_hours = self.interval.as_secs() / 3600,
            retention_days = self.retention.num_days(),
            "RetentionCleaner started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // 启动时不立即清理

        loop {
            *self.next_run_at.lock().unwrap() =
                Some(Utc::now() + chrono::Duration::seconds(self.interval.as_secs() as i64));
            interval.tick().await;
            let report = self.run_cleanup(false).await;
            if !report.errors.is_empty() {
                error!(errors = ?report.errors, "Cleanup run had errors");
            }
        }
    }

    /// 启动后台运行
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
