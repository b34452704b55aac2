// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::operations::traits::{Operation, OperationError};

/// 加法操作
pub struct Sum;

impl Operation for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn apply(&self, a: i64, b: i64) -> Result<i64, OperationError> {
        a.checked_add(b).ok_or(OperationError::Overflow)
    }
}
