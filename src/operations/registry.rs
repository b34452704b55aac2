// Copyright 2025 jobrs contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::operations::divide::Divide;
use crate::operations::multiply::Multiply;
use crate::operations::subtract::Subtract;
use crate::operations::sum::Sum;
use crate::operations::traits::Operation;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// 操作注册表
///
/// 进程启动时装配一次，此后只读。新增操作需要同时追加模块和
/// 重新发布 `jobs.operation` 检查约束的迁移。
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Arc<dyn Operation>>,
}

impl OperationRegistry {
    /// 装配内置操作集合
    ///
    /// # 返回值
    ///
    /// 返回包含全部内置操作的注册表
    pub fn load() -> Self {
        let mut operations: BTreeMap<&'static str, Arc<dyn Operation>> = BTreeMap::new();
        for op in [
            Arc::new(Sum) as Arc<dyn Operation>,
            Arc::new(Subtract),
            Arc::new(Multiply),
            Arc::new(Divide),
        ] {
            operations.insert(op.name(), op);
        }

        info!(
            count = operations.len(),
            names = ?operations.keys().collect::<Vec<_>>(),
            "Loaded operations"
        );
        Self { operations }
    }

    /// 已注册的操作名集合，按名字排序
    pub fn names(&self) -> Vec<&'static str> {
        self.operations.keys().copied().collect()
    }

    /// 判断操作名是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// 根据名字获取操作
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).cloned()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
