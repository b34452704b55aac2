// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::Settings;

// 默认值与环境变量覆盖放在同一个测试里，避免并行用例之间的环境变量串扰
#[test]
fn test_defaults_and_env_aliases() {
    let settings = Settings::new().unwrap();

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.populator.interval_ms, 600_000);
    assert_eq!(settings.populator.batch_size, 5);
    assert_eq!(settings.populator.max_pending_jobs, 10_000);
    assert_eq!(settings.monitoring.check_interval_seconds, 60);
    assert_eq!(settings.monitoring.claimed_job_timeout_seconds, 300);
    assert_eq!(settings.monitoring.processing_job_timeout_seconds, 600);
    assert_eq!(settings.monitoring.max_recoveries_per_cycle, 100);
    assert_eq!(settings.monitoring.recovery_batch_size, 10);
    assert_eq!(settings.server.request_timeout_seconds, 30);
    assert_eq!(settings.bots.down_threshold_seconds, 120);
    assert_eq!(settings.bots.retention_days, 7);
    assert_eq!(settings.cleanup.interval_hours, 6);
    assert_eq!(settings.datalake.dir, "./datalake");

    std::env::set_var("HTTP_PORT", "9090");
    std::env::set_var("CLAIMED_JOB_TIMEOUT_SECONDS", "120");
    std::env::set_var("BOT_RETENTION_DAYS", "14");

    let overridden = Settings::new().unwrap();
    assert_eq!(overridden.server.port, 9090);
    assert_eq!(overridden.monitoring.claimed_job_timeout_seconds, 120);
    assert_eq!(overridden.bots.retention_days, 14);

    std::env::remove_var("HTTP_PORT");
    std::env::remove_var("CLAIMED_JOB_TIMEOUT_SECONDS");
    std::env::remove_var("BOT_RETENTION_DAYS");
}

#[test]
fn test_validate_rejects_zero_batch() {
    let mut settings = Settings::new().unwrap();
    settings.populator.batch_size = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_admin_token() {
    let mut settings = Settings::new().unwrap();
    settings.admin.token.clear();
    assert!(settings.validate().is_err());
}
