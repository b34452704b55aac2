// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求与响应数据传输对象
pub mod dto;
