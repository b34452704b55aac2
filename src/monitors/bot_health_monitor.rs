use crate::domain::repositories::bot_repository::BotRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 机器人健康标记
///
/// 纯诊断：任务执行超时而心跳仍新鲜的机器人标记为疑似卡住，
/// 供运维排查；实际恢复由任务监控完成。绑定一旦清空标记随之解除。
pub struct BotHealthMonitor {
    bots: Arc<dyn BotRepository>,
    interval: Duration,
    processing_timeout: chrono::Duration,
    heartbeat_threshold: chrono::Duration,
}

impl BotHealthMonitor {
    pub fn new(
        bots: Arc<dyn BotRepository>,
        interval: Duration,
        processing_timeout: chrono::Duration,
        heartbeat_threshold: chrono::Duration,
    ) -> Self {
        Self {
            bots,
            interval,
            processing_timeout,
            heartbeat_threshold,
        }
    }

    /// 执行一次标记与清理
    pub async fn run_cycle(&self) -> (u64, u64) {
        let now = Utc::now();
        let processing_cutoff = now - self.processing_timeout;
        let heartbeat_cutoff = now - self.heartbeat_threshold;

        let marked = match self
            .bots
            .mark_potentially_stuck(processing_cutoff, heartbeat_cutoff)
            .await
        {
            Ok(marked) => marked,
            Err(e) => {
                error!(error = %e, "Failed to mark potentially stuck bots");
                0
            }
        };

        let cleared = match self.bots.clear_recovered_health().await {
            Ok(cleared) => cleared,
            Err(e) => {
                error!(error = %e, "Failed to clear recovered bot health");
                0
            }
        };

        (marked, cleared)
    }

    /// 运行监控循环
    pub async fn run(&self) {
        info!("BotHealthMonitor started");

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            let (marked, cleared) = self.run_cycle().await;
            if marked > 0 || cleared > 0 {
                info!(marked, cleared, "BotHealthMonitor cycle completed");
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
