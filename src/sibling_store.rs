use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use lru::LruCache;
use serde::Serialize;
use tracing::info;

use crate::shared::{Error, Result, SnapshotId, ASN};
use crate::sibling_graph::{SiblingEdge, SnapshotGraph};

const DIFF_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => panic!("diff cache capacity must be non-zero"),
};

/// Edges gained and lost between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub added: BTreeSet<SiblingEdge>,
    pub removed: BTreeSet<SiblingEdge>,
}

impl SnapshotDiff {
    pub fn between(old: &SnapshotGraph, new: &SnapshotGraph) -> Self {
        let added = new
            .edges()
            .filter(|edge| !old.are_siblings(edge.low, edge.high))
            .collect();
        let removed = old
            .edges()
            .filter(|edge| !new.are_siblings(edge.low, edge.high))
            .collect();
        SnapshotDiff { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub snapshot: SnapshotId,
    pub nodes: usize,
    pub edges: usize,
    pub organizations: usize,
    /// Organizations with two or more ASes
    pub sibling_organizations: usize,
    pub largest_organization: Option<(String, usize)>,
}

impl SnapshotStats {
    pub fn of(snapshot: SnapshotId, graph: &SnapshotGraph) -> Self {
        SnapshotStats {
            snapshot,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            organizations: graph.organization_count(),
            sibling_organizations: graph
                .organizations()
                .filter(|(_, members)| members.len() > 1)
                .count(),
            largest_organization: graph
                .largest_organization()
                .map(|(org_id, size)| (org_id.to_string(), size)),
        }
    }
}

/// Sealed snapshot graphs keyed by snapshot id.
///
/// Writers are serialized by the map lock; readers clone the snapshot's
/// `Arc` and query it without holding any lock.
pub struct SiblingGraphStore {
    snapshots: RwLock<BTreeMap<SnapshotId, Arc<SnapshotGraph>>>,
    diff_cache: Mutex<LruCache<(SnapshotId, SnapshotId), Arc<SnapshotDiff>>>,
}

impl SiblingGraphStore {
    pub fn new() -> Self {
        Self::with_diff_cache_capacity(DIFF_CACHE_CAPACITY)
    }

    pub fn with_diff_cache_capacity(capacity: NonZeroUsize) -> Self {
        SiblingGraphStore {
            snapshots: RwLock::new(BTreeMap::new()),
            diff_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Store a sealed graph. A snapshot id is stored at most once.
    pub fn put(&self, snapshot: SnapshotId, graph: SnapshotGraph) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshots.contains_key(&snapshot) {
            return Err(Error::DuplicateSnapshot(snapshot));
        }

        info!(
            %snapshot,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "stored snapshot"
        );
        snapshots.insert(snapshot, Arc::new(graph));
        Ok(())
    }

    pub fn get(&self, snapshot: &SnapshotId) -> Result<Arc<SnapshotGraph>> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(snapshot)
            .cloned()
            .ok_or_else(|| Error::UnknownSnapshot(snapshot.clone()))
    }

    pub fn contains(&self, snapshot: &SnapshotId) -> bool {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(snapshot)
    }

    /// Stored snapshot ids, ascending.
    pub fn snapshot_ids(&self) -> Vec<SnapshotId> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// The snapshot with the greatest id.
    pub fn latest(&self) -> Option<(SnapshotId, Arc<SnapshotGraph>)> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_key_value()
            .map(|(snapshot, graph)| (snapshot.clone(), Arc::clone(graph)))
    }

    pub fn len(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct siblings of `asn`; empty when the ASN is unknown or isolated.
    pub fn siblings_of(&self, snapshot: &SnapshotId, asn: ASN) -> Result<BTreeSet<ASN>> {
        Ok(self.get(snapshot)?.siblings_of(asn))
    }

    pub fn are_siblings(&self, snapshot: &SnapshotId, a: ASN, b: ASN) -> Result<bool> {
        Ok(self.get(snapshot)?.are_siblings(a, b))
    }

    pub fn organization_of(&self, snapshot: &SnapshotId, asn: ASN) -> Result<Option<String>> {
        Ok(self.get(snapshot)?.organization_of(asn).map(str::to_string))
    }

    pub fn members(&self, snapshot: &SnapshotId, org_id: &str) -> Result<BTreeSet<ASN>> {
        Ok(self
            .get(snapshot)?
            .members(org_id)
            .cloned()
            .unwrap_or_default())
    }

    pub fn stats(&self, snapshot: &SnapshotId) -> Result<SnapshotStats> {
        let graph = self.get(snapshot)?;
        Ok(SnapshotStats::of(snapshot.clone(), &graph))
    }

    /// Edge set difference from `old` to `new`.
    pub fn diff(&self, old: &SnapshotId, new: &SnapshotId) -> Result<Arc<SnapshotDiff>> {
        let old_graph = self.get(old)?;
        let new_graph = self.get(new)?;

        let key = (old.clone(), new.clone());
        if let Some(cached) = self
            .diff_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(cached));
        }

        let diff = Arc::new(SnapshotDiff::between(&old_graph, &new_graph));
        self.diff_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, Arc::clone(&diff));
        Ok(diff)
    }
}

impl Default for SiblingGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SiblingGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiblingGraphStore")
            .field("snapshots", &self.snapshot_ids())
            .finish()
    }
}
