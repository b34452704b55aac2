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

use crate::domain::models::job_result::JobResult;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// 数据湖记录的模式版本
const SCHEMA_VERSION: u32 = 1;

/// 数据湖错误类型
#[derive(Error, Debug)]
pub enum DatalakeError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 按日统计
#[derive(Debug, Default, Clone, Serialize)]
pub struct DailyStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// 数据湖统计信息
#[derive(Debug, Default, Serialize)]
pub struct DatalakeStats {
    pub total_files: u64,
    pub total_records: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub daily: BTreeMap<String, DailyStats>,
}

/// 追加写入的结果归档
///
/// 每个UTC日期一个NDJSON文件。写入失败不影响任务状态转换——
/// 数据库中的结果行才是权威记录，这里只服务分析场景。
pub struct DatalakeSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DatalakeSink {
    /// 创建数据湖写入器，目录不存在时自动创建
    ///
    /// # 参数
    ///
    /// * `dir` - NDJSON文件目录
    ///
    /// # 返回值
    ///
    /// * `Ok(DatalakeSink)` - 写入器
    /// * `Err(DatalakeError)` - 目录创建失败
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DatalakeError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn file_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("results-{}.ndjson", date.format("%Y-%m-%d")))
    }

    /// 追加一条结果记录
    ///
    /// # 参数
    ///
    /// * `result` - 要归档的结果
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 已写入当日文件
    /// * `Err(DatalakeError)` - 写入失败
    pub async fn append(&self, result: &JobResult) -> Result<(), DatalakeError> {
        let _guard = self.write_lock.lock().await;

        let mut record = serde_json::to_value(result)?;
        if let serde_json::Value::Object(map) = &mut record {
            map.insert("schema_version".to_string(), json!(SCHEMA_VERSION));
        }
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let path = self.file_path(Utc::now().date_naive());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        Ok(())
    }

    /// 汇总归档文件的统计信息
    ///
    /// 逐个读取 `results-*.ndjson`，坏行跳过不报错
    pub async fn stats(&self) -> Result<DatalakeStats, DatalakeError> {
        let mut stats = DatalakeStats::default();

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(date) = Self::date_of(&path) else {
                continue;
            };

            stats.total_files += 1;
            let mut daily = DailyStats::default();

            let content = tokio::fs::read_to_string(&path).await?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                let Ok(record) = serde_json::from_str::<serde_json::Value>(line) else {
                    continue;
                };
                daily.total += 1;
                match record.get("status").and_then(|s| s.as_str()) {
                    Some("succeeded") => daily.succeeded += 1,
                    Some("failed") => daily.failed += 1,
                    _ => {}
                }
            }

            stats.total_records += daily.total;
            stats.succeeded += daily.succeeded;
            stats.failed += daily.failed;
            stats.daily.insert(date, daily);
        }

        Ok(stats)
    }

    fn date_of(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        let date = name.strip_prefix("results-")?.strip_suffix(".ndjson")?;
        Some(date.to_string())
    }
}

#[cfg(test)]
#[path = "datalake_test.rs"]
mod tests;
