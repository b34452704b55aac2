// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 日志与追踪初始化
pub mod telemetry;
