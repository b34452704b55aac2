// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::operations::traits::{Operation, OperationError};

/// 乘法操作
pub struct Multiply;

impl Operation for Multiply {
    fn name(&self) -> &'static str {
        "multiply"
    }

    fn apply(&self, a: i64, b: i64) -> Result<i64, OperationError> {
        a.checked_mul(b).ok_or(OperationError::Overflow)
    }
}
