// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库连接与实体
pub mod database;

/// 仓库实现
pub mod repositories;

/// 数据湖追加写入
pub mod datalake;

/// Prometheus 指标
pub mod metrics;
