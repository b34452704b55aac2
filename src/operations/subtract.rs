// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::operations::traits::{Operation, OperationError};

/// 减法操作
pub struct Subtract;

impl Operation for Subtract {
    fn name(&self) -> &'static str {
        "subtract"
    }

    fn apply(&self, a: i64, b: i64) -> Result<i64, OperationError> {
        a.checked_sub(b).ok_or(OperationError::Overflow)
    }
}
