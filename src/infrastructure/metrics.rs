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

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

/// 数据湖追加失败计数器名
pub const DATALAKE_APPEND_FAILURES: &str = "datalake_append_failures_total";

/// 运行期不变量被破坏的计数器名，非零即为缺陷
pub const INVARIANT_VIOLATIONS: &str = "invariant_violations_total";

/// 监控循环恢复任务的计数器名
pub const MONITOR_RECOVERIES: &str = "monitor_recoveries_total";

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册各计数器的描述
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    // 端口被占时只告警不退出，便于开发环境多实例并跑
    if let Err(e) = builder.install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe_counter!(
        DATALAKE_APPEND_FAILURES,
        "Datalake NDJSON appends that failed and were dropped"
    );
    describe_counter!(
        INVARIANT_VIOLATIONS,
        "Runtime detections of broken job/bot state invariants"
    );
    describe_counter!(
        MONITOR_RECOVERIES,
        "Jobs recovered by the background monitors"
    );

    info!("Metrics exporter installed");
}
