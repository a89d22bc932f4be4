//! Repository for the `behavior_types` lookup table.

use sqlx::PgPool;

use crate::models::behavior_type::BehaviorTypeRow;

/// Provides read access to behavior types.
pub struct BehaviorTypeRepo;

impl BehaviorTypeRepo {
    /// List every named behavior type ordered by id.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<BehaviorTypeRow>, sqlx::Error> {
        sqlx::query_as::<_, BehaviorTypeRow>(
            "SELECT id, type FROM behavior_types WHERE type <> '' ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<BehaviorTypeRow>, sqlx::Error> {
        sqlx::query_as::<_, BehaviorTypeRow>("SELECT id, type FROM behavior_types WHERE type = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
