//! Entity repository implementation.
//!
//! Together with the merge transaction this module is the only writer of
//! entity rows. Candidate matching runs in-database with the pgvector `<=>`
//! cosine distance operator; the name-keyed upsert is a single atomic
//! statement backed by the `(user_id, name)` uniqueness constraint.

use std::time::Instant;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use entigraph_core::{
    defaults, new_v7, Candidate, DraftEntity, Entity, EntityRepository, EntityWithDocumentCount,
    Error, Result,
};

/// PostgreSQL implementation of EntityRepository.
#[derive(Clone)]
pub struct PgEntityRepository {
    pool: Pool<Postgres>,
    threshold: f64,
    candidate_limit: i64,
}

impl PgEntityRepository {
    /// Create a new PgEntityRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            threshold: defaults::SIMILARITY_THRESHOLD,
            candidate_limit: defaults::CANDIDATE_LIMIT,
        }
    }

    /// Override the candidate distance threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the maximum number of candidates per match.
    pub fn with_candidate_limit(mut self, limit: i64) -> Self {
        self.candidate_limit = limit;
        self
    }

    fn entity_from_row(row: &sqlx::postgres::PgRow) -> Entity {
        Entity {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            description: row.get("description"),
            entity_type: row.get("entity_type"),
            embedding: row.get("embedding"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    #[instrument(skip(self, embedding), fields(subsystem = "db", component = "matcher", op = "find_candidates", user_id = %user_id))]
    async fn find_candidates(&self, user_id: Uuid, embedding: &Vector) -> Result<Vec<Candidate>> {
        let start = Instant::now();

        let rows = sqlx::query(
            "SELECT id, name, description, entity_type,
                    (embedding <=> $2) AS distance
             FROM entities
             WHERE user_id = $1 AND (embedding <=> $2) < $3
             ORDER BY embedding <=> $2
             LIMIT $4",
        )
        .bind(user_id)
        .bind(embedding)
        .bind(self.threshold)
        .bind(self.candidate_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Retrieval(format!("candidate query failed: {}", e)))?;

        let candidates: Vec<Candidate> = rows
            .into_iter()
            .map(|row| Candidate {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                entity_type: row.get("entity_type"),
                distance: row.get("distance"),
            })
            .collect();

        debug!(
            candidate_count = candidates.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Candidate match complete"
        );
        Ok(candidates)
    }

    async fn upsert_by_name(&self, user_id: Uuid, draft: &DraftEntity) -> Result<Uuid> {
        // Single conflict-aware statement: concurrent calls for the same
        // (user, name) cannot both insert. The existing row keeps its id and
        // embedding; only description, type, and updated_at move.
        let row = sqlx::query(
            "INSERT INTO entities (id, user_id, name, description, entity_type, embedding)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, name) DO UPDATE
             SET description = EXCLUDED.description,
                 entity_type = EXCLUDED.entity_type,
                 updated_at = NOW()
             RETURNING id",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.entity_type)
        .bind(&draft.embedding)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn update_resolved(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        description: &str,
        entity_type: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE entities
             SET description = $3, entity_type = $4, updated_at = NOW()
             WHERE id = $2 AND user_id = $1",
        )
        .bind(user_id)
        .bind(entity_id)
        .bind(description)
        .bind(entity_type)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::EntityNotOwned(entity_id));
        }
        Ok(())
    }

    async fn fetch(&self, user_id: Uuid, entity_id: Uuid) -> Result<Entity> {
        let row = sqlx::query(
            "SELECT id, user_id, name, description, entity_type, embedding,
                    created_at, updated_at
             FROM entities
             WHERE id = $2 AND user_id = $1",
        )
        .bind(user_id)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::entity_from_row(&r))
            .ok_or(Error::EntityNotOwned(entity_id))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<EntityWithDocumentCount>> {
        let rows = sqlx::query(
            "SELECT e.id, e.user_id, e.name, e.description, e.entity_type,
                    e.created_at, e.updated_at,
                    COUNT(DISTINCT l.document_id) AS document_count
             FROM entities e
             LEFT JOIN entity_document_links l ON l.entity_id = e.id
             WHERE e.user_id = $1
             GROUP BY e.id, e.user_id, e.name, e.description, e.entity_type,
                      e.created_at, e.updated_at
             ORDER BY e.name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| EntityWithDocumentCount {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                description: row.get("description"),
                entity_type: row.get("entity_type"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
                document_count: row.get("document_count"),
            })
            .collect())
    }

    async fn for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<Entity>> {
        let rows = sqlx::query(
            "SELECT e.id, e.user_id, e.name, e.description, e.entity_type,
                    e.embedding, e.created_at, e.updated_at
             FROM entities e
             JOIN entity_document_links l ON l.entity_id = e.id
             WHERE l.document_id = $2 AND e.user_id = $1
             ORDER BY e.name ASC",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::entity_from_row).collect())
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "merge", op = "merge", user_id = %user_id, target_id = %target_id, source_id = %source_id))]
    async fn merge(&self, user_id: Uuid, target_id: Uuid, source_id: Uuid) -> Result<()> {
        if target_id == source_id {
            return Err(Error::InvalidInput(
                "cannot merge an entity with itself".to_string(),
            ));
        }

        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Verify ownership of both entities before any mutation. FOR UPDATE
        // keeps concurrent upserts/links off these rows until commit; locks
        // are taken in id order so two merges with swapped arguments queue
        // instead of deadlocking.
        let mut lock_order = [target_id, source_id];
        lock_order.sort();
        for id in lock_order {
            let row = sqlx::query(
                "SELECT id FROM entities WHERE id = $1 AND user_id = $2 FOR UPDATE",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

            if row.is_none() {
                return Err(Error::EntityNotOwned(id));
            }
        }

        // Re-point source links at the target, skipping any pair the target
        // already holds so link uniqueness survives the merge.
        sqlx::query(
            "INSERT INTO entity_document_links (user_id, entity_id, document_id)
             SELECT user_id, $1, document_id
             FROM entity_document_links
             WHERE entity_id = $2
             ON CONFLICT (entity_id, document_id) DO NOTHING",
        )
        .bind(target_id)
        .bind(source_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Drop whatever still points at the source (the duplicate pairs).
        sqlx::query("DELETE FROM entity_document_links WHERE entity_id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("DELETE FROM entities WHERE id = $1 AND user_id = $2")
            .bind(source_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Merge committed"
        );
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM entities WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("count"))
    }
}

impl PgEntityRepository {
    /// Warn-level visibility for matches that sit just outside the
    /// threshold. Diagnostic helper for threshold tuning; reads only.
    pub async fn nearest_distance(&self, user_id: Uuid, embedding: &Vector) -> Result<Option<f64>> {
        let row = sqlx::query(
            "SELECT (embedding <=> $2) AS distance
             FROM entities
             WHERE user_id = $1
             ORDER BY embedding <=> $2
             LIMIT 1",
        )
        .bind(user_id)
        .bind(embedding)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let nearest = row.map(|r| r.get::<f64, _>("distance"));
        if let Some(d) = nearest {
            if d >= self.threshold {
                warn!(
                    subsystem = "db",
                    component = "matcher",
                    nearest_distance = d,
                    threshold = self.threshold,
                    "Nearest entity outside candidate threshold"
                );
            }
        }
        Ok(nearest)
    }
}
