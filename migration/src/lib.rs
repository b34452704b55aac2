// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_jobs;
mod m20250301_000002_create_bots;
mod m20250301_000003_create_results;
mod m20250301_000004_create_indexes;
mod m20250301_000005_operation_check;

/// 当前 `jobs.operation` 检查约束允许的操作名集合
///
/// 新增操作时必须追加一条重新发布该约束的迁移，并同步更新此列表。
/// 服务启动时会用它与已加载的操作注册表比对。
pub const CONSTRAINED_OPERATIONS: &[&str] = &["divide", "multiply", "subtract", "sum"];

/// 数据库迁移器
///
/// 管理数据库模式迁移，负责数据库结构的版本控制
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_jobs::Migration),
            Box::new(m20250301_000002_create_bots::Migration),
            Box::new(m20250301_000003_create_results::Migration),
            Box::new(m20250301_000004_create_indexes::Migration),
            Box::new(m20250301_000005_operation_check::Migration),
        ]
    }
}
