//! PostgreSQL adapter for handler lookups and behavior persistence.
//!
//! [`PgBackend`] implements [`EventHandlerLookup`] and [`BehaviorPersistence`]
//! over the `behavior-db` repositories. Rows that cannot be decoded (unknown
//! status strings, override rows naming no subject) are logged and skipped so
//! one bad row never hides the rest of the configuration.

use async_trait::async_trait;
use behavior_core::behavior::{EventBehavior, EventHandler, HandlerRef};
use behavior_core::behavior_type::BehaviorType;
use behavior_core::subject::StatusOverride;
use behavior_core::types::DbId;
use behavior_db::repositories::{
    BehaviorStatusRepo, BehaviorTypeRepo, EventBehaviorRepo, EventHandlerRepo,
};
use behavior_db::DbPool;

use crate::collaborators::{BehaviorPersistence, EventHandlerLookup};
use crate::error::BehaviorResult;

/// Database-backed collaborator.
#[derive(Clone)]
pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl EventHandlerLookup for PgBackend {
    async fn get(&self, handler: &HandlerRef) -> BehaviorResult<Option<EventHandler>> {
        let row = match handler {
            HandlerRef::Id(id) => EventHandlerRepo::find_by_id(&self.pool, *id).await?,
            HandlerRef::Name(name) => EventHandlerRepo::find_by_name(&self.pool, name).await?,
        };
        Ok(row.map(EventHandler::from))
    }
}

#[async_trait]
impl BehaviorPersistence for PgBackend {
    async fn load_behavior_types(&self) -> BehaviorResult<Vec<BehaviorType>> {
        let rows = BehaviorTypeRepo::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(BehaviorType::from).collect())
    }

    async fn load_behaviors(&self) -> BehaviorResult<Vec<EventBehavior>> {
        let rows = EventBehaviorRepo::list_all(&self.pool).await?;
        let mut behaviors = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_behavior() {
                Ok(behavior) => behaviors.push(behavior),
                Err(e) => {
                    tracing::warn!(behavior_id = id, error = %e, "Skipping undecodable behavior row");
                }
            }
        }
        Ok(behaviors)
    }

    async fn overrides_for(&self, behavior_id: DbId) -> BehaviorResult<Vec<StatusOverride>> {
        let rows = BehaviorStatusRepo::list_for_behavior(&self.pool, behavior_id).await?;
        let mut overrides = Vec::with_capacity(rows.len());
        for row in rows {
            let (user_id, passtag_id) = (row.user_id, row.user_passtag_id);
            match row.into_override() {
                Ok(Some(o)) => overrides.push(o),
                Ok(None) => {
                    tracing::debug!(behavior_id, user_id, passtag_id, "Ignoring unscoped override row");
                }
                Err(e) => {
                    tracing::warn!(behavior_id, user_id, passtag_id, error = %e, "Skipping undecodable override row");
                }
            }
        }
        Ok(overrides)
    }

    async fn upsert_override(&self, row: &StatusOverride) -> BehaviorResult<()> {
        let (user_id, passtag_id) = row.subject.to_columns();
        BehaviorStatusRepo::upsert(
            &self.pool,
            row.event_behavior_id,
            user_id,
            passtag_id,
            row.status.as_str(),
            row.time,
        )
        .await?;
        Ok(())
    }
}
