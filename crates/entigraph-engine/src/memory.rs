//! In-memory storage doubles for engine tests.
//!
//! [`InMemoryStore`] implements both repository traits over a mutex-guarded
//! map, computing candidate distances with the same cosine metric the
//! Postgres matcher uses. Failure injection lets tests exercise the
//! partial-progress and atomicity policies without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use entigraph_core::defaults::{CANDIDATE_LIMIT, SIMILARITY_THRESHOLD};
use entigraph_core::{
    new_v7, Candidate, ChunkSource, CosineDistance, DistanceMetric, DraftEntity, Entity,
    EntityLinkRepository, EntityRepository, EntityWithDocumentCount, Error, Result, Vector,
};

#[derive(Default)]
struct StoreState {
    entities: HashMap<Uuid, Entity>,
    // (entity_id, document_id)
    links: HashSet<(Uuid, Uuid)>,
    fail_upsert_for: HashSet<String>,
    fail_links: bool,
    fail_merge_cleanup: bool,
}

/// Map-backed entity and link store with scripted failure points.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    metric: CosineDistance,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `upsert_by_name` fail for drafts with this name.
    pub fn fail_upsert_for(self, name: impl Into<String>) -> Self {
        self.state.lock().unwrap().fail_upsert_for.insert(name.into());
        self
    }

    /// Make every link call fail.
    pub fn with_failing_links(self) -> Self {
        self.state.lock().unwrap().fail_links = true;
        self
    }

    /// Make merge fail after migrating links but before deleting the
    /// source. The store must roll back as if nothing happened.
    pub fn with_failing_merge_cleanup(self) -> Self {
        self.state.lock().unwrap().fail_merge_cleanup = true;
        self
    }

    /// Seed an entity directly, returning its id.
    pub fn seed_entity(&self, user_id: Uuid, name: &str, embedding: Vec<f32>) -> Uuid {
        let id = new_v7();
        let now = Utc::now();
        self.state.lock().unwrap().entities.insert(
            id,
            Entity {
                id,
                user_id,
                name: name.to_string(),
                description: String::new(),
                entity_type: String::new(),
                embedding: Vector::from(embedding),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Seed a link directly.
    pub fn seed_link(&self, entity_id: Uuid, document_id: Uuid) {
        self.state.lock().unwrap().links.insert((entity_id, document_id));
    }

    /// Snapshot of one entity, if present.
    pub fn entity(&self, entity_id: Uuid) -> Option<Entity> {
        self.state.lock().unwrap().entities.get(&entity_id).cloned()
    }

    /// Documents currently linked to an entity.
    pub fn linked_documents(&self, entity_id: Uuid) -> Vec<Uuid> {
        let state = self.state.lock().unwrap();
        let mut docs: Vec<Uuid> = state
            .links
            .iter()
            .filter(|(e, _)| *e == entity_id)
            .map(|(_, d)| *d)
            .collect();
        docs.sort();
        docs
    }
}

#[async_trait]
impl EntityRepository for InMemoryStore {
    async fn find_candidates(&self, user_id: Uuid, embedding: &Vector) -> Result<Vec<Candidate>> {
        let state = self.state.lock().unwrap();
        let mut candidates: Vec<Candidate> = state
            .entities
            .values()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                let distance = self.metric.distance(e.embedding.as_slice(), embedding.as_slice());
                (distance < SIMILARITY_THRESHOLD).then(|| Candidate {
                    id: e.id,
                    name: e.name.clone(),
                    description: e.description.clone(),
                    entity_type: e.entity_type.clone(),
                    distance,
                })
            })
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(CANDIDATE_LIMIT as usize);
        Ok(candidates)
    }

    async fn upsert_by_name(&self, user_id: Uuid, draft: &DraftEntity) -> Result<Uuid> {
        let mut state = self.state.lock().unwrap();
        if state.fail_upsert_for.contains(&draft.name) {
            return Err(Error::Persistence(format!(
                "injected upsert failure for {}",
                draft.name
            )));
        }

        let existing = state
            .entities
            .values()
            .find(|e| e.user_id == user_id && e.name == draft.name)
            .map(|e| e.id);

        if let Some(id) = existing {
            let entity = state.entities.get_mut(&id).unwrap();
            entity.description = draft.description.clone();
            entity.entity_type = draft.entity_type.clone();
            entity.updated_at = Utc::now();
            return Ok(id);
        }

        let id = new_v7();
        let now = Utc::now();
        state.entities.insert(
            id,
            Entity {
                id,
                user_id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                entity_type: draft.entity_type.clone(),
                embedding: draft.embedding.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_resolved(
        &self,
        user_id: Uuid,
        entity_id: Uuid,
        description: &str,
        entity_type: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.entities.get_mut(&entity_id) {
            Some(entity) if entity.user_id == user_id => {
                entity.description = description.to_string();
                entity.entity_type = entity_type.to_string();
                entity.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(Error::EntityNotOwned(entity_id)),
        }
    }

    async fn fetch(&self, user_id: Uuid, entity_id: Uuid) -> Result<Entity> {
        let state = self.state.lock().unwrap();
        state
            .entities
            .get(&entity_id)
            .filter(|e| e.user_id == user_id)
            .cloned()
            .ok_or(Error::EntityNotOwned(entity_id))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<EntityWithDocumentCount>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<EntityWithDocumentCount> = state
            .entities
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| {
                let document_count = state.links.iter().filter(|(id, _)| *id == e.id).count() as i64;
                EntityWithDocumentCount {
                    id: e.id,
                    user_id: e.user_id,
                    name: e.name.clone(),
                    description: e.description.clone(),
                    entity_type: e.entity_type.clone(),
                    created_at: e.created_at,
                    updated_at: e.updated_at,
                    document_count,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<Entity>> {
        let state = self.state.lock().unwrap();
        let mut entities: Vec<Entity> = state
            .links
            .iter()
            .filter(|(_, d)| *d == document_id)
            .filter_map(|(e, _)| state.entities.get(e))
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entities)
    }

    async fn merge(&self, user_id: Uuid, target_id: Uuid, source_id: Uuid) -> Result<()> {
        if target_id == source_id {
            return Err(Error::InvalidInput(
                "cannot merge an entity into itself".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        for id in [target_id, source_id] {
            match state.entities.get(&id) {
                Some(e) if e.user_id == user_id => {}
                _ => return Err(Error::EntityNotOwned(id)),
            }
        }

        // Stage the whole merge on a copy so an injected failure leaves
        // the committed state untouched.
        let mut staged = state.links.clone();
        let source_links: Vec<Uuid> = staged
            .iter()
            .filter(|(e, _)| *e == source_id)
            .map(|(_, d)| *d)
            .collect();
        for document_id in source_links {
            staged.insert((target_id, document_id));
            staged.remove(&(source_id, document_id));
        }

        if state.fail_merge_cleanup {
            return Err(Error::Internal("injected merge failure".to_string()));
        }

        state.links = staged;
        state.entities.remove(&source_id);
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entities
            .values()
            .filter(|e| e.user_id == user_id)
            .count() as i64)
    }
}

#[async_trait]
impl EntityLinkRepository for InMemoryStore {
    async fn link(&self, user_id: Uuid, entity_id: Uuid, document_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_links {
            return Err(Error::Persistence("injected link failure".to_string()));
        }
        match state.entities.get(&entity_id) {
            Some(e) if e.user_id == user_id => {}
            _ => {
                return Err(Error::Persistence(format!(
                    "no entity {} to link",
                    entity_id
                )))
            }
        }
        state.links.insert((entity_id, document_id));
        Ok(())
    }

    async fn documents_for_entity(&self, user_id: Uuid, entity_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        match state.entities.get(&entity_id) {
            Some(e) if e.user_id == user_id => {}
            _ => return Err(Error::EntityNotOwned(entity_id)),
        }
        let mut docs: Vec<Uuid> = state
            .links
            .iter()
            .filter(|(e, _)| *e == entity_id)
            .map(|(_, d)| *d)
            .collect();
        docs.sort();
        Ok(docs)
    }
}

/// Fixed chunk source keyed by document id.
#[derive(Clone, Default)]
pub struct StaticChunkSource {
    documents: Arc<Mutex<HashMap<Uuid, Vec<String>>>>,
}

impl StaticChunkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document_id: Uuid, chunks: Vec<&str>) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(document_id, chunks.into_iter().map(String::from).collect());
        self
    }
}

#[async_trait]
impl ChunkSource for StaticChunkSource {
    async fn chunks(&self, _user_id: Uuid, document_id: Uuid) -> Result<Vec<String>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }
}
