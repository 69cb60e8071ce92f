//! Directory-backed versioned store.
//!
//! On-disk layout:
//!
//! ```text
//! <root>/
//!   repository.toml        RepositoryMeta
//!   refs/heads/<branch>    hex commit id + newline
//!   commits/<hex>.json     Commit (parent, signatures, message, changes)
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place. A
//! transaction writes its commit file before moving the ref, so a crash
//! between the two leaves an unreferenced commit and the previous head.
//! Opening a repository loads every commit, verifies its hash, and replays
//! each branch from its root to materialize the head snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use marg_types::{CommitId, Identity};

use crate::commit::Commit;
use crate::error::{StoreError, StoreResult};
use crate::graph::{CommitGraph, StagedCommit};
use crate::meta::RepositoryMeta;
use crate::object::StoreObject;
use crate::traits::VersionedStore;
use crate::transaction::Transaction;

const META_FILE: &str = "repository.toml";
const COMMITS_DIR: &str = "commits";
const HEADS_DIR: &str = "refs/heads";

/// A versioned store persisted as files under one directory.
pub struct DirectoryStore {
    root: PathBuf,
    meta: RepositoryMeta,
    graph: RwLock<CommitGraph>,
}

impl DirectoryStore {
    /// Create a new repository at `root` with an empty root commit on the
    /// default branch.
    ///
    /// Fails with `AlreadyInitialized` if `root` already holds a repository.
    pub fn init(root: &Path, meta: RepositoryMeta, committer: &Identity) -> StoreResult<Self> {
        if root.join(META_FILE).exists() {
            return Err(StoreError::AlreadyInitialized(root.to_path_buf()));
        }
        fs::create_dir_all(root.join(COMMITS_DIR))?;
        fs::create_dir_all(root.join(HEADS_DIR))?;
        write_atomic(&root.join(META_FILE), meta.to_toml()?.as_bytes())?;

        let store = Self {
            root: root.to_path_buf(),
            meta,
            graph: RwLock::new(CommitGraph::new()),
        };
        {
            let mut graph = store.write()?;
            let staged = graph.stage_root(
                &store.meta.default_branch,
                committer.now(),
                "Initialize repository",
            )?;
            store.persist(&staged)?;
            graph.record(staged);
        }
        tracing::info!(root = %root.display(), name = %store.meta.name, "initialized repository");
        Ok(store)
    }

    /// Open an existing repository at `root`.
    pub fn open(root: &Path) -> StoreResult<Self> {
        let meta_path = root.join(META_FILE);
        if !meta_path.exists() {
            return Err(StoreError::NotInitialized(root.to_path_buf()));
        }
        let meta = RepositoryMeta::from_toml(&fs::read_to_string(&meta_path)?)?;

        let mut graph = CommitGraph::new();
        let mut loaded = 0usize;
        let commits_dir = root.join(COMMITS_DIR);
        if commits_dir.exists() {
            for entry in fs::read_dir(&commits_dir)? {
                let path = entry?.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    graph.insert_commit(read_commit(&path)?);
                    loaded += 1;
                }
            }
        }

        let heads_dir = root.join(HEADS_DIR);
        if heads_dir.exists() {
            for entry in fs::read_dir(&heads_dir)? {
                let entry = entry?;
                let branch = entry.file_name().to_string_lossy().into_owned();
                if branch.starts_with('.') {
                    // Leftover temporary file from an interrupted write.
                    continue;
                }
                let text = fs::read_to_string(entry.path())?;
                let head = CommitId::from_hex(&text).map_err(|e| StoreError::CorruptCommit {
                    id: text.trim().to_string(),
                    reason: format!("ref {branch}: {e}"),
                })?;
                graph.set_ref(&branch, head)?;
            }
        }
        graph.warm_heads()?;

        tracing::info!(
            root = %root.display(),
            name = %meta.name,
            commits = loaded,
            branches = graph.branches().len(),
            "opened repository"
        );
        Ok(Self {
            root: root.to_path_buf(),
            meta,
            graph: RwLock::new(graph),
        })
    }

    fn persist(&self, staged: &StagedCommit) -> StoreResult<()> {
        let commit_path = self
            .root
            .join(COMMITS_DIR)
            .join(format!("{}.json", staged.commit.id.to_hex()));
        let data = serde_json::to_vec_pretty(&staged.commit)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&commit_path, &data)?;

        let ref_path = self.root.join(HEADS_DIR).join(&staged.branch);
        write_atomic(&ref_path, format!("{}\n", staged.commit.id.to_hex()).as_bytes())?;
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, CommitGraph>> {
        self.graph.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, CommitGraph>> {
        self.graph.write().map_err(|_| StoreError::Poisoned)
    }
}

impl VersionedStore for DirectoryStore {
    fn meta(&self) -> &RepositoryMeta {
        &self.meta
    }

    fn head(&self, branch: &str) -> StoreResult<Option<CommitId>> {
        Ok(self.read()?.head(branch))
    }

    fn objects_of_class(&self, commit: &CommitId, class: &str) -> StoreResult<Vec<StoreObject>> {
        let snapshot = self.read()?.snapshot_at(commit)?;
        snapshot
            .objects_of_class(class)
            .ok_or_else(|| StoreError::UnknownClass(class.to_string()))
    }

    fn apply_transaction(&self, tx: &Transaction) -> StoreResult<CommitId> {
        let mut graph = self.write()?;
        let staged = graph.stage(tx)?;
        self.persist(&staged)?;
        let id = graph.record(staged);
        tracing::debug!(commit = %id.short_hex(), "persisted transaction");
        Ok(id)
    }

    fn history(&self, branch: &str, limit: usize) -> StoreResult<Vec<Commit>> {
        self.read()?.history(branch, limit)
    }
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStore")
            .field("root", &self.root)
            .field("name", &self.meta.name)
            .finish()
    }
}

fn read_commit(path: &Path) -> StoreResult<Commit> {
    let data = fs::read(path)?;
    let commit: Commit = serde_json::from_slice(&data).map_err(|e| StoreError::CorruptCommit {
        id: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        reason: e.to_string(),
    })?;
    commit.verify()?;
    Ok(commit)
}

/// Write `data` to a hidden temporary file next to `path`, then rename it over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::Builder::new().prefix(".tmp").tempfile_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
