// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobStatus;
use crate::domain::repositories::job_repository::{
    ClaimError, ReleaseError, RepositoryError, TransitionError,
};
use thiserror::Error;

/// 任务服务
pub mod job_service;

/// 机器人服务
pub mod bot_service;

/// 指标汇总服务
pub mod metrics_service;

/// 协调器错误类型
///
/// 服务层的统一错误分类；稳定的 `code` 字符串是对外契约的一部分，
/// HTTP 状态码映射在表示层完成
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// 实体未找到
    #[error("{0} not found")]
    NotFound(&'static str),
    /// 机器人不存在或已删除
    #[error("Bot is unknown or deleted")]
    UnknownBot,
    /// 机器人已持有任务
    #[error("Bot already holds an active job")]
    BusyBot,
    /// 操作名未注册
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    /// 任务已终结且重放参数不一致
    #[error("Job already reached a terminal state")]
    AlreadyTerminal,
    /// 调用方不是任务的认领者
    #[error("Caller does not hold the claim on this job")]
    NotClaimHolder,
    /// 当前状态不允许此转换
    #[error("Job is in {0} state")]
    InvalidState(JobStatus),
    /// 请求不合法
    #[error("{0}")]
    BadRequest(String),
    /// 管理令牌缺失或错误
    #[error("Invalid authentication credentials")]
    Unauthorized,
    /// 其它内部错误
    #[error("Internal error: {0}")]
    Internal(String),
    /// 存储层错误
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl CoordinatorError {
    /// 对外契约的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::NotFound(_) => "not_found",
            CoordinatorError::UnknownBot => "unknown_bot",
            CoordinatorError::BusyBot => "busy_bot",
            CoordinatorError::UnknownOperation(_) => "unknown_operation",
            CoordinatorError::AlreadyTerminal => "already_terminal",
            CoordinatorError::NotClaimHolder => "not_claim_holder",
            CoordinatorError::InvalidState(_) => "invalid_state",
            CoordinatorError::BadRequest(_) => "bad_request",
            CoordinatorError::Unauthorized => "unauthorized",
            CoordinatorError::Internal(_) => "internal",
            CoordinatorError::Storage(_) => "internal",
        }
    }
}

impl From<ClaimError> for CoordinatorError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::UnknownBot => CoordinatorError::UnknownBot,
            ClaimError::BusyBot => CoordinatorError::BusyBot,
            ClaimError::Repository(e) => CoordinatorError::Storage(e),
        }
    }
}

impl From<TransitionError> for CoordinatorError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::JobNotFound => CoordinatorError::NotFound("Job"),
            TransitionError::NotClaimHolder => CoordinatorError::NotClaimHolder,
            TransitionError::InvalidState(status) => CoordinatorError::InvalidState(status),
            TransitionError::AlreadyTerminal => CoordinatorError::AlreadyTerminal,
            TransitionError::Repository(e) => CoordinatorError::Storage(e),
        }
    }
}

impl From<ReleaseError> for CoordinatorError {
    fn from(err: ReleaseError) -> Self {
        match err {
            ReleaseError::JobNotFound => CoordinatorError::NotFound("Job"),
            ReleaseError::NotReleasable(status) => CoordinatorError::BadRequest(format!(
                "Job is in {status} state and cannot be released"
            )),
            ReleaseError::Repository(e) => CoordinatorError::Storage(e),
        }
    }
}
