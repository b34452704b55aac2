// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::DatalakeSink;
use crate::domain::models::job_result::{JobResult, ResultStatus};
use chrono::Utc;
use uuid::Uuid;

fn result(status: ResultStatus) -> JobResult {
    JobResult {
        id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        a: 2,
        b: 3,
        operation: "sum".to_string(),
        result: match status {
            ResultStatus::Succeeded => Some(5),
            ResultStatus::Failed => None,
        },
        processed_by: "bot-1".to_string(),
        processed_at: Utc::now().into(),
        duration_ms: 100,
        status,
        error: match status {
            ResultStatus::Succeeded => None,
            ResultStatus::Failed => Some("boom".to_string()),
        },
    }
}

#[tokio::test]
async fn test_append_writes_one_json_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DatalakeSink::new(dir.path()).unwrap();

    sink.append(&result(ResultStatus::Succeeded)).await.unwrap();
    sink.append(&result(ResultStatus::Failed)).await.unwrap();

    let expected = dir.path().join(format!(
        "results-{}.ndjson",
        Utc::now().date_naive().format("%Y-%m-%d")
    ));
    let content = std::fs::read_to_string(&expected).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    for line in &lines {
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["schema_version"], 1);
        assert_eq!(record["operation"], "sum");
    }

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["status"], "succeeded");
    assert_eq!(first["result"], 5);

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["status"], "failed");
    assert!(second["result"].is_null());
    assert_eq!(second["error"], "boom");
}

#[tokio::test]
async fn test_stats_counts_per_day_and_skips_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DatalakeSink::new(dir.path()).unwrap();

    sink.append(&result(ResultStatus::Succeeded)).await.unwrap();
    sink.append(&result(ResultStatus::Succeeded)).await.unwrap();
    sink.append(&result(ResultStatus::Failed)).await.unwrap();

    // 坏行与无关文件都应被忽略
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let file = dir.path().join(format!("results-{today}.ndjson"));
    let mut content = std::fs::read_to_string(&file).unwrap();
    content.push_str("not-json\n");
    std::fs::write(&file, content).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let stats = sink.stats().await.unwrap();
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.daily.get(&today).unwrap().total, 3);
}
