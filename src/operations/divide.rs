// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::operations::traits::{Operation, OperationError};

/// 除法操作（整数除法）
pub struct Divide;

impl Operation for Divide {
    fn name(&self) -> &'static str {
        "divide"
    }

    fn apply(&self, a: i64, b: i64) -> Result<i64, OperationError> {
        if b == 0 {
            return Err(OperationError::DivisionByZero);
        }
        a.checked_div(b).ok_or(OperationError::Overflow)
    }
}
