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

use crate::domain::models::job_result::JobResult;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::infrastructure::database::entities::{bot as bot_entity, job_result as result_entity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Query, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use std::sync::Arc;
use uuid::Uuid;

/// 结果仓库实现
#[derive(Clone)]
pub struct ResultRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ResultRepositoryImpl {
    /// 创建新的结果仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 孤儿结果条件：processed_by 指向的机器人行已被物理清除
    fn orphaned_condition() -> Condition {
        Condition::all().add(
            result_entity::Column::ProcessedBy.not_in_subquery(
                Query::select()
                    .column(bot_entity::Column::Id)
                    .from(bot_entity::Entity)
                    .to_owned(),
            ),
        )
    }
}

#[async_trait]
impl ResultRepository for ResultRepositoryImpl {
    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Option<JobResult>, RepositoryError> {
        let model = result_entity::Entity::find()
            .filter(result_entity::Column::JobId.eq(job_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let count = result_entity::Entity::find()
            .filter(result_entity::Column::ProcessedAt.gte(since))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_orphaned(&self) -> Result<u64, RepositoryError> {
        let count = result_entity::Entity::find()
            .filter(Self::orphaned_condition())
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn purge_orphaned(&self) -> Result<u64, RepositoryError> {
        let deleted = result_entity::Entity::delete_many()
            .filter(Self::orphaned_condition())
            .exec(self.db.as_ref())
            .await?;
        Ok(deleted.rows_affected)
    }
}
