// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 操作执行错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OperationError {
    /// 除数为零
    #[error("Division by zero")]
    DivisionByZero,
    /// 结果溢出
    #[error("Arithmetic overflow")]
    Overflow,
}

/// 操作特质
///
/// 每个操作提供一个稳定的名字和对两个整数的计算。协调器只用名字
/// 校验任务合法性，计算由工作进程执行。
pub trait Operation: Send + Sync {
    /// 操作名，与任务行中的 `operation` 字段对应
    fn name(&self) -> &'static str;

    /// 对两个操作数执行计算
    fn apply(&self, a: i64, b: i64) -> Result<i64, OperationError>;
}
