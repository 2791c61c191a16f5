//! Entity↔document link repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use entigraph_core::{EntityDocumentLink, EntityLinkRepository, Error, Result};

/// PostgreSQL implementation of EntityLinkRepository.
///
/// The only writer of link rows outside the merge transaction.
#[derive(Clone)]
pub struct PgEntityLinkRepository {
    pool: Pool<Postgres>,
}

impl PgEntityLinkRepository {
    /// Create a new PgEntityLinkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityLinkRepository for PgEntityLinkRepository {
    async fn link(&self, user_id: Uuid, entity_id: Uuid, document_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO entity_document_links (user_id, entity_id, document_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (entity_id, document_id)
             DO UPDATE SET updated_at = NOW()",
        )
        .bind(user_id)
        .bind(entity_id)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Persistence(format!("link failed: {}", e)))?;
        Ok(())
    }

    async fn documents_for_entity(&self, user_id: Uuid, entity_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT document_id
             FROM entity_document_links
             WHERE user_id = $1 AND entity_id = $2
             ORDER BY document_id",
        )
        .bind(user_id)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|r| r.get("document_id")).collect())
    }
}

impl PgEntityLinkRepository {
    /// Full link rows for an entity, newest touch first.
    pub async fn links_for_entity(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
    ) -> Result<Vec<EntityDocumentLink>> {
        let rows = sqlx::query(
            "SELECT user_id, entity_id, document_id, updated_at
             FROM entity_document_links
             WHERE user_id = $1 AND entity_id = $2
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| EntityDocumentLink {
                user_id: row.get("user_id"),
                entity_id: row.get("entity_id"),
                document_id: row.get("document_id"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}
