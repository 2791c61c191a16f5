//! End-to-end engine tests over the in-memory store and mock semantic
//! backend: resolution outcomes, failure policies, and merge behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use entigraph_core::{
    DraftEntity, EntityExtractor, EntityRepository, Error, Resolution, Result, Vector,
};
use entigraph_engine::{
    ArbitrationPolicy, ExtractionOrchestrator, InMemoryStore, MergeRequest, MergeService,
    ResolutionConfig, ResolutionPipeline, StaticChunkSource, client_message,
};
use entigraph_semantic::MockSemanticBackend;

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 4];
    v[i] = 1.0;
    v
}

/// A vector at a small cosine distance from axis 0.
fn near_axis_0() -> Vec<f32> {
    vec![1.0, 0.1, 0.0, 0.0]
}

fn draft(name: &str, embedding: Vec<f32>) -> DraftEntity {
    DraftEntity {
        name: name.to_string(),
        description: format!("{} description", name),
        entity_type: "person".to_string(),
        embedding: Vector::from(embedding),
    }
}

fn pipeline(
    store: &InMemoryStore,
    arbiter: &MockSemanticBackend,
    policy: ArbitrationPolicy,
) -> ResolutionPipeline {
    ResolutionPipeline::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(arbiter.clone()),
    )
    .with_config(ResolutionConfig {
        arbitration_policy: policy,
    })
}

#[tokio::test]
async fn test_resolved_draft_updates_existing_entity() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let einstein = store.seed_entity(user, "Einstein", axis(0));

    let arbiter = MockSemanticBackend::new().with_resolution(
        "A. Einstein",
        Resolution::Existing {
            entity_id: einstein,
            description: "Physicist, author of relativity".to_string(),
            entity_type: "person".to_string(),
        },
    );
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    let doc_a = Uuid::new_v4();
    let doc_b = Uuid::new_v4();
    pipeline
        .upsert(user, doc_a, vec![draft("A. Einstein", near_axis_0())])
        .await
        .unwrap();
    pipeline
        .upsert(user, doc_b, vec![draft("A. Einstein", near_axis_0())])
        .await
        .unwrap();

    // No new entity; the existing row was reconciled and linked twice.
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
    let entity = store.entity(einstein).unwrap();
    assert_eq!(entity.description, "Physicist, author of relativity");
    assert_eq!(entity.embedding.as_slice(), axis(0).as_slice());

    let mut expected = vec![doc_a, doc_b];
    expected.sort();
    assert_eq!(store.linked_documents(einstein), expected);
}

#[tokio::test]
async fn test_no_candidates_inserts_without_arbitration() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    store.seed_entity(user, "Einstein", axis(0));

    let arbiter = MockSemanticBackend::new();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    let doc = Uuid::new_v4();
    // Orthogonal to everything stored: no candidates within threshold.
    pipeline
        .upsert(user, doc, vec![draft("Marie Curie", axis(1))])
        .await
        .unwrap();

    assert_eq!(store.count_for_user(user).await.unwrap(), 2);
    assert_eq!(arbiter.arbitration_call_count(), 0);

    let listing = store.list(user).await.unwrap();
    let curie = listing.iter().find(|e| e.name == "Marie Curie").unwrap();
    assert_eq!(curie.document_count, 1);
}

#[tokio::test]
async fn test_candidates_are_user_scoped() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    store.seed_entity(other, "Einstein", axis(0));

    let arbiter = MockSemanticBackend::new();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    pipeline
        .upsert(user, Uuid::new_v4(), vec![draft("Einstein", near_axis_0())])
        .await
        .unwrap();

    // The other user's identical entity is invisible, so no arbitration
    // happened and each user now owns their own Einstein.
    assert_eq!(arbiter.arbitration_call_count(), 0);
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
    assert_eq!(store.count_for_user(other).await.unwrap(), 1);
}

#[tokio::test]
async fn test_arbitration_failure_treated_as_new() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    store.seed_entity(user, "Einstein", axis(0));

    let arbiter = MockSemanticBackend::new().with_failing_arbitration();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    let doc = Uuid::new_v4();
    pipeline
        .upsert(user, doc, vec![draft("A. Einstein", near_axis_0())])
        .await
        .unwrap();

    // The draft survived as a (possibly duplicate) new entity.
    assert_eq!(store.count_for_user(user).await.unwrap(), 2);
    let listing = store.list(user).await.unwrap();
    assert!(listing.iter().any(|e| e.name == "A. Einstein"));
}

#[tokio::test]
async fn test_arbitration_failure_propagates_when_configured() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    store.seed_entity(user, "Einstein", axis(0));

    let arbiter = MockSemanticBackend::new().with_failing_arbitration();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::Propagate);

    let err = pipeline
        .upsert(user, Uuid::new_v4(), vec![draft("A. Einstein", near_axis_0())])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Arbitration(_)));
    // Nothing was persisted for the failed draft.
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_one_failed_draft_does_not_sink_siblings() {
    let store = InMemoryStore::new().fail_upsert_for("Broken");
    let user = Uuid::new_v4();

    let arbiter = MockSemanticBackend::new();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    let doc = Uuid::new_v4();
    pipeline
        .upsert(
            user,
            doc,
            vec![draft("Broken", axis(0)), draft("Healthy", axis(1))],
        )
        .await
        .unwrap();

    let listing = store.list(user).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "Healthy");
    assert_eq!(listing[0].document_count, 1);
}

#[tokio::test]
async fn test_link_failure_keeps_entity_and_continues() {
    let store = InMemoryStore::new().with_failing_links();
    let user = Uuid::new_v4();

    let arbiter = MockSemanticBackend::new();
    let pipeline = pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew);

    pipeline
        .upsert(user, Uuid::new_v4(), vec![draft("Einstein", axis(0))])
        .await
        .unwrap();

    // The entity row committed even though the association did not.
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
    let listing = store.list(user).await.unwrap();
    assert_eq!(listing[0].document_count, 0);
}

/// Extractor that succeeds for a fixed number of calls, then fails.
struct FlakyExtractor {
    drafts: Vec<DraftEntity>,
    successes: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl EntityExtractor for FlakyExtractor {
    async fn find_entities(&self, _chunk: &str) -> Result<Vec<DraftEntity>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.successes {
            Ok(self.drafts.clone())
        } else {
            Err(Error::Extraction("service crashed".to_string()))
        }
    }
}

#[tokio::test]
async fn test_extraction_failure_aborts_later_chunks_but_keeps_earlier_work() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let doc = Uuid::new_v4();

    let chunks = StaticChunkSource::new().with_document(doc, vec!["one", "two", "three"]);
    let extractor = FlakyExtractor {
        drafts: vec![draft("Einstein", axis(0))],
        successes: 1,
        calls: AtomicUsize::new(0),
    };
    let arbiter = MockSemanticBackend::new();
    let orchestrator = ExtractionOrchestrator::new(
        Arc::new(chunks),
        Arc::new(extractor),
        pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew),
    );

    let err = orchestrator.extract_and_save(user, doc).await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));

    // The first chunk's entity committed and stays committed.
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
    let listing = store.list(user).await.unwrap();
    assert_eq!(listing[0].name, "Einstein");
}

#[tokio::test]
async fn test_full_document_extraction() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let doc = Uuid::new_v4();

    let chunks = StaticChunkSource::new().with_document(doc, vec!["chunk a", "chunk b"]);
    let extractor = MockSemanticBackend::new()
        .with_extraction("chunk a", vec![draft("Einstein", axis(0))])
        .with_extraction(
            "chunk b",
            vec![draft("Einstein", axis(0)), draft("Zurich", axis(1))],
        )
        .with_resolution("Einstein", Resolution::New);
    let arbiter = extractor.clone();
    let orchestrator = ExtractionOrchestrator::new(
        Arc::new(chunks),
        Arc::new(extractor),
        pipeline(&store, &arbiter, ArbitrationPolicy::TreatAsNew),
    );

    let report = orchestrator.extract_and_save(user, doc).await.unwrap();
    assert_eq!(report.chunks_processed, 2);
    assert_eq!(report.drafts_extracted, 3);

    // Chunk b's Einstein re-resolved onto chunk a's row by name.
    assert_eq!(store.count_for_user(user).await.unwrap(), 2);
    let entities = store.for_document(user, doc).await.unwrap();
    let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Einstein", "Zurich"]);
}

#[tokio::test]
async fn test_merge_service_absorbs_source() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let target = store.seed_entity(user, "Einstein", axis(0));
    let source = store.seed_entity(user, "A. Einstein", axis(1));

    let shared = Uuid::new_v4();
    let only_source = Uuid::new_v4();
    store.seed_link(target, shared);
    store.seed_link(source, shared);
    store.seed_link(source, only_source);

    let service = MergeService::new(Arc::new(store.clone()));
    let response = service
        .merge(
            user,
            &MergeRequest {
                target_id: Some(target),
                source_id: Some(source),
            },
        )
        .await
        .unwrap();
    assert_eq!(response.target_id, target);
    assert_eq!(response.absorbed_id, source);

    // Target holds the union of links; the source entity is gone.
    let mut expected = vec![shared, only_source];
    expected.sort();
    assert_eq!(store.linked_documents(target), expected);
    assert!(store.entity(source).is_none());
    assert_eq!(store.count_for_user(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_merge_failure_leaves_both_entities_untouched() {
    let store = InMemoryStore::new().with_failing_merge_cleanup();
    let user = Uuid::new_v4();
    let target = store.seed_entity(user, "Einstein", axis(0));
    let source = store.seed_entity(user, "A. Einstein", axis(1));
    let doc = Uuid::new_v4();
    store.seed_link(source, doc);

    let service = MergeService::new(Arc::new(store.clone()));
    let err = service
        .merge(
            user,
            &MergeRequest {
                target_id: Some(target),
                source_id: Some(source),
            },
        )
        .await
        .unwrap_err();

    // Internal failure: generic client message, state fully intact.
    assert_eq!(client_message(&err), "Failed to merge entities");
    assert!(store.entity(source).is_some());
    assert_eq!(store.linked_documents(source), vec![doc]);
    assert!(store.linked_documents(target).is_empty());
}

#[tokio::test]
async fn test_merge_service_rejects_foreign_entities() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let target = store.seed_entity(owner, "Einstein", axis(0));
    let source = store.seed_entity(owner, "A. Einstein", axis(1));

    let service = MergeService::new(Arc::new(store.clone()));
    let err = service
        .merge(
            intruder,
            &MergeRequest {
                target_id: Some(target),
                source_id: Some(source),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EntityNotOwned(_)));
    assert_eq!(store.count_for_user(owner).await.unwrap(), 2);
}
