use std::sync::Arc;

use marg_store::{StoreError, StoreObject, Transaction, VersionedStore};
use marg_types::{timestamp, CommitId, Identity, ObjectId};
use tracing::{debug, info, warn};

use crate::annotation::{Annotation, Fields};
use crate::codec::{self, ANNOTATION_CLASS, JSON_PROPERTY};
use crate::error::{AnnotationError, AnnotationResult};
use crate::transaction::{create_message, delete_message, update_message, TransactionBuilder};

/// CRUD over annotations stored in a versioned object repository.
///
/// Every read resolves the branch head once and sees exactly that snapshot.
/// Every write is one transaction based on the head it read; if another
/// writer got there first the write fails with
/// [`AnnotationError::Conflict`] and nothing is retried.
pub struct AnnotationRepository {
    store: Arc<dyn VersionedStore>,
    branch: String,
    author: Identity,
    committer: Identity,
}

impl AnnotationRepository {
    /// A repository on the store's default branch, writing as the default identity.
    pub fn new(store: Arc<dyn VersionedStore>) -> Self {
        let branch = store.meta().default_branch.clone();
        Self {
            store,
            branch,
            author: Identity::default(),
            committer: Identity::default(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Record writes under `identity` as both author and committer.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.author = identity.clone();
        self.committer = identity;
        self
    }

    pub fn store(&self) -> &Arc<dyn VersionedStore> {
        &self.store
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// All annotations at the branch head, ordered by store object id.
    ///
    /// A branch with no head or no annotation class yet reads as empty.
    pub fn fetch_all(&self) -> AnnotationResult<Vec<(ObjectId, Annotation)>> {
        let Some(head) = self.store.head(&self.branch)? else {
            debug!(branch = %self.branch, "no head, nothing to fetch");
            return Ok(Vec::new());
        };
        let rows = self
            .objects_at(&head)?
            .iter()
            .map(|object| codec::decode(object).map(|a| (object.id, a)))
            .collect::<AnnotationResult<Vec<_>>>()?;
        debug!(head = %head.short_hex(), count = rows.len(), "fetched annotations");
        Ok(rows)
    }

    /// The first annotation whose `id` equals `id`.
    pub fn fetch_by_id(&self, id: &str) -> AnnotationResult<Option<(ObjectId, Annotation)>> {
        match self.store.head(&self.branch)? {
            Some(head) => self.find_at(&head, id),
            None => Ok(None),
        }
    }

    /// Store a new annotation built from `fields` and return it.
    pub fn create(&self, fields: Fields) -> AnnotationResult<Annotation> {
        let head = self
            .store
            .head(&self.branch)?
            .ok_or_else(|| StoreError::RefNotFound(self.branch.clone()))?;
        let now = timestamp::now();
        let annotation = Annotation::create(fields, now);

        let tx = TransactionBuilder::begin(&self.branch, head)
            .create(ANNOTATION_CLASS, codec::encode(&annotation)?)
            .commit(self.author.at(now), self.committer.at(now), create_message(&annotation.id));
        let commit = self.apply(&tx)?;
        info!(id = %annotation.id, commit = %commit.short_hex(), "created annotation");
        Ok(annotation)
    }

    /// Merge `patch` into the annotation `id`. `None` if it does not exist.
    pub fn update(&self, id: &str, patch: Fields) -> AnnotationResult<Option<Annotation>> {
        let Some(head) = self.store.head(&self.branch)? else {
            return Ok(None);
        };
        let Some((object, mut annotation)) = self.find_at(&head, id)? else {
            debug!(id, "update target not found");
            return Ok(None);
        };
        let now = timestamp::now();
        annotation.apply_patch(patch, now);

        let tx = TransactionBuilder::begin(&self.branch, head)
            .update(object, vec![JSON_PROPERTY.to_string()], codec::encode(&annotation)?)
            .commit(self.author.at(now), self.committer.at(now), update_message(id));
        let commit = self.apply(&tx)?;
        info!(id, commit = %commit.short_hex(), "updated annotation");
        Ok(Some(annotation))
    }

    /// Remove the annotation `id`. `false` if it does not exist.
    pub fn delete(&self, id: &str) -> AnnotationResult<bool> {
        let Some(head) = self.store.head(&self.branch)? else {
            return Ok(false);
        };
        let Some((object, _)) = self.find_at(&head, id)? else {
            debug!(id, "delete target not found");
            return Ok(false);
        };
        let now = timestamp::now();
        let tx = TransactionBuilder::begin(&self.branch, head)
            .delete(object)
            .commit(self.author.at(now), self.committer.at(now), delete_message(id));
        let commit = self.apply(&tx)?;
        info!(id, commit = %commit.short_hex(), "deleted annotation");
        Ok(true)
    }

    fn objects_at(&self, head: &CommitId) -> AnnotationResult<Vec<StoreObject>> {
        match self.store.objects_of_class(head, ANNOTATION_CLASS) {
            Ok(objects) => Ok(objects),
            Err(e) if e.is_absent() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Decode objects in order until one carries `id`.
    fn find_at(&self, head: &CommitId, id: &str) -> AnnotationResult<Option<(ObjectId, Annotation)>> {
        for object in self.objects_at(head)? {
            let annotation = codec::decode(&object)?;
            if annotation.id == id {
                return Ok(Some((object.id, annotation)));
            }
        }
        Ok(None)
    }

    fn apply(&self, tx: &Transaction) -> AnnotationResult<CommitId> {
        self.store.apply_transaction(tx).map_err(|e| {
            let err = AnnotationError::from(e);
            if let AnnotationError::Conflict { expected, actual, .. } = &err {
                warn!(
                    branch = %self.branch,
                    expected = %expected.short_hex(),
                    actual = %actual.short_hex(),
                    "write lost a race"
                );
            }
            err
        })
    }
}

impl std::fmt::Debug for AnnotationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationRepository")
            .field("store", &self.store.meta().name)
            .field("branch", &self.branch)
            .field("committer", &self.committer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::thread;

    use marg_store::{Commit, InMemoryVersionedStore, RepositoryMeta, StoreResult};
    use serde_json::{json, Value};

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn memory_store() -> Arc<InMemoryVersionedStore> {
        Arc::new(InMemoryVersionedStore::initialized(RepositoryMeta::annotations("test")).unwrap())
    }

    fn repo() -> AnnotationRepository {
        AnnotationRepository::new(memory_store())
    }

    fn head(repo: &AnnotationRepository) -> Option<CommitId> {
        repo.store().head(repo.branch()).unwrap()
    }

    #[test]
    fn empty_repository_reads_empty() {
        let repo = repo();
        assert!(repo.fetch_all().unwrap().is_empty());
        assert!(repo.fetch_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn uninitialized_store_reads_empty_but_cannot_create() {
        let store = Arc::new(InMemoryVersionedStore::new(RepositoryMeta::annotations("bare")));
        let repo = AnnotationRepository::new(store);
        assert!(repo.fetch_all().unwrap().is_empty());
        assert_eq!(repo.update("x", Fields::new()).unwrap(), None);
        assert!(!repo.delete("x").unwrap());
        let err = repo.create(Fields::new()).unwrap_err();
        assert!(matches!(err, AnnotationError::Store(StoreError::RefNotFound(_))));
    }

    #[test]
    fn create_then_fetch() {
        let repo = repo();
        let created = repo
            .create(fields(json!({"uri": "http://a", "text": "hello", "extra": {"k": 1}})))
            .unwrap();
        let (_, fetched) = repo.fetch_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.fields["extra"], json!({"k": 1}));
        assert_eq!(repo.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn create_discards_supplied_identity() {
        let repo = repo();
        let created = repo
            .create(fields(json!({"id": "forged", "created": "1999-01-01T00:00:00Z"})))
            .unwrap();
        assert_ne!(created.id, "forged");
        assert!(repo.fetch_by_id("forged").unwrap().is_none());
        assert_eq!(created.created, created.updated);
    }

    #[test]
    fn update_merges_and_keeps_identity() {
        let repo = repo();
        let created = repo.create(fields(json!({"text": "a", "uri": "u"}))).unwrap();
        let (object_before, _) = repo.fetch_by_id(&created.id).unwrap().unwrap();

        let updated = repo
            .update(&created.id, fields(json!({"id": "x", "created": "y", "text": "b"})))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert!(updated.updated >= created.updated);
        assert_eq!(updated.text(), Some("b"));
        assert_eq!(updated.uri(), Some("u"));

        let (object_after, stored) = repo.fetch_by_id(&created.id).unwrap().unwrap();
        assert_eq!(object_after, object_before);
        assert_eq!(stored, updated);
        assert_eq!(repo.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn update_missing_does_not_commit() {
        let repo = repo();
        let before = head(&repo);
        assert_eq!(repo.update("missing", Fields::new()).unwrap(), None);
        assert_eq!(head(&repo), before);
    }

    #[test]
    fn delete_removes_once() {
        let repo = repo();
        let created = repo.create(Fields::new()).unwrap();
        let survivor = repo.create(Fields::new()).unwrap();
        assert!(repo.delete(&created.id).unwrap());
        assert!(repo.fetch_by_id(&created.id).unwrap().is_none());
        let remaining: Vec<_> = repo.fetch_all().unwrap().into_iter().map(|(_, a)| a).collect();
        assert_eq!(remaining, vec![survivor]);

        let before = head(&repo);
        assert!(!repo.delete(&created.id).unwrap());
        assert_eq!(head(&repo), before);
    }

    #[test]
    fn every_write_records_a_commit_message() {
        let repo = repo();
        let a = repo.create(Fields::new()).unwrap();
        repo.update(&a.id, Fields::new()).unwrap();
        repo.delete(&a.id).unwrap();
        let messages: Vec<_> = repo
            .store()
            .history("main", 10)
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                format!("Delete annotation {}", a.id),
                format!("Update annotation {}", a.id),
                format!("Create annotation {}", a.id),
                "Initialize repository".to_string(),
            ]
        );
    }

    #[test]
    fn writes_use_configured_identity() {
        let repo = repo().with_identity(Identity::new("alice", "alice@example.com"));
        repo.create(Fields::new()).unwrap();
        let latest = &repo.store().history("main", 1).unwrap()[0];
        assert_eq!(latest.author.identity.name, "alice");
        assert_eq!(latest.committer.identity.email, "alice@example.com");
    }

    #[test]
    fn corrupt_record_is_propagated() {
        let store = memory_store();
        let base = store.head("main").unwrap().unwrap();
        let sig = Identity::default().now();
        let tx = TransactionBuilder::begin("main", base)
            .create(ANNOTATION_CLASS, [(JSON_PROPERTY.to_string(), "{oops".to_string())].into())
            .commit(sig.clone(), sig, "inject");
        store.apply_transaction(&tx).unwrap();

        let repo = AnnotationRepository::new(store);
        assert!(matches!(repo.fetch_all(), Err(AnnotationError::CorruptRecord { .. })));
        assert!(matches!(repo.fetch_by_id("x"), Err(AnnotationError::CorruptRecord { .. })));
    }

    /// Holds writers at a barrier so both read the same head before either applies.
    struct Rendezvous {
        inner: Arc<InMemoryVersionedStore>,
        barrier: Barrier,
    }

    impl VersionedStore for Rendezvous {
        fn meta(&self) -> &RepositoryMeta {
            self.inner.meta()
        }
        fn head(&self, branch: &str) -> StoreResult<Option<CommitId>> {
            self.inner.head(branch)
        }
        fn objects_of_class(&self, commit: &CommitId, class: &str) -> StoreResult<Vec<StoreObject>> {
            self.inner.objects_of_class(commit, class)
        }
        fn apply_transaction(&self, tx: &Transaction) -> StoreResult<CommitId> {
            self.barrier.wait();
            self.inner.apply_transaction(tx)
        }
        fn history(&self, branch: &str, limit: usize) -> StoreResult<Vec<Commit>> {
            self.inner.history(branch, limit)
        }
    }

    #[test]
    fn concurrent_updates_yield_one_winner_and_one_conflict() {
        let inner = memory_store();
        let seeded = AnnotationRepository::new(inner.clone())
            .create(fields(json!({"text": "0"})))
            .unwrap();
        let repo = Arc::new(AnnotationRepository::new(Arc::new(Rendezvous {
            inner,
            barrier: Barrier::new(2),
        })));

        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|text| {
                let repo = Arc::clone(&repo);
                let id = seeded.id.clone();
                thread::spawn(move || repo.update(&id, fields(json!({ "text": text }))))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results.iter().filter_map(|r| r.as_ref().err()).all(AnnotationError::is_conflict));

        let winner = winners[0].as_ref().unwrap();
        let (_, stored) = repo.fetch_by_id(&seeded.id).unwrap().unwrap();
        assert_eq!(stored.text(), winner.text());
    }

    #[test]
    fn concurrent_creates_with_retry_all_land() {
        let repo = Arc::new(repo());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || loop {
                    match repo.create(fields(json!({ "n": i }))) {
                        Ok(a) => return a.id,
                        Err(e) if e.is_conflict() => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                })
            })
            .collect();
        let ids: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 8);

        let stored: HashSet<_> = repo.fetch_all().unwrap().into_iter().map(|(_, a)| a.id).collect();
        assert_eq!(stored, ids);
    }
}
