use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::thread;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record_sources::{AsOrgRecord, RecordBatch};
use crate::shared::{Error, Reference, Result, SnapshotId, ASN};

/// An autonomous system as observed in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AS {
    pub asn: ASN,
    pub org_id: String,
    pub name: Option<String>,
    pub changed: Option<NaiveDate>,
}

impl AS {
    pub fn from_record(record: AsOrgRecord) -> Self {
        AS {
            asn: record.asn,
            org_id: record.org_id,
            name: record.name,
            changed: record.changed,
        }
    }
}

/// Organization metadata, when the source publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub org_id: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub source: Option<String>,
    pub changed: Option<NaiveDate>,
}

impl Organization {
    pub fn new(org_id: impl Into<String>) -> Self {
        Organization {
            org_id: org_id.into(),
            name: None,
            country: None,
            source: None,
            changed: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// Undirected SIBLING_OF edge, stored as a normalized pair with `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiblingEdge {
    pub low: ASN,
    pub high: ASN,
}

impl SiblingEdge {
    /// Returns `None` for a self pair.
    pub fn new(a: ASN, b: ASN) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(SiblingEdge { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(SiblingEdge { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, asn: ASN) -> bool {
        self.low == asn || self.high == asn
    }

    pub fn other(&self, asn: ASN) -> Option<ASN> {
        if asn == self.low {
            Some(self.high)
        } else if asn == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for SiblingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{} <-> AS{}", self.low, self.high)
    }
}

/// Sealed sibling graph of one snapshot.
///
/// Every AS observed in the snapshot is a node. Adjacency is kept only for
/// ASes that have at least one sibling, so `siblings_of` is O(degree) and
/// `are_siblings` is a single hash lookup.
#[derive(Debug, Clone, Default)]
pub struct SnapshotGraph {
    as_dict: HashMap<ASN, AS>,
    adjacency: HashMap<ASN, HashSet<ASN>>,
    org_members: BTreeMap<String, BTreeSet<ASN>>,
    organizations: HashMap<String, Organization>,
    reference: Option<Reference>,
    edge_count: usize,
}

impl SnapshotGraph {
    pub fn get(&self, asn: &ASN) -> Option<&AS> {
        self.as_dict.get(asn)
    }

    pub fn contains(&self, asn: &ASN) -> bool {
        self.as_dict.contains_key(asn)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AS> {
        self.as_dict.values()
    }

    /// All ASNs, ascending.
    pub fn asns(&self) -> BTreeSet<ASN> {
        self.as_dict.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.as_dict.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn organization_count(&self) -> usize {
        self.org_members.len()
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn siblings_of(&self, asn: ASN) -> BTreeSet<ASN> {
        self.adjacency
            .get(&asn)
            .map(|siblings| siblings.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn are_siblings(&self, a: ASN, b: ASN) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|siblings| siblings.contains(&b))
    }

    /// Each undirected edge exactly once.
    pub fn edges(&self) -> impl Iterator<Item = SiblingEdge> + '_ {
        self.adjacency.iter().flat_map(|(&asn, siblings)| {
            siblings
                .iter()
                .filter(move |&&sibling| asn < sibling)
                .map(move |&sibling| SiblingEdge { low: asn, high: sibling })
        })
    }

    pub fn edge_set(&self) -> BTreeSet<SiblingEdge> {
        self.edges().collect()
    }

    pub fn organization_of(&self, asn: ASN) -> Option<&str> {
        self.as_dict.get(&asn).map(|as_obj| as_obj.org_id.as_str())
    }

    pub fn members(&self, org_id: &str) -> Option<&BTreeSet<ASN>> {
        self.org_members.get(org_id)
    }

    pub fn organization(&self, org_id: &str) -> Option<&Organization> {
        self.organizations.get(org_id)
    }

    /// Organization ids with their member ASNs, ordered by id.
    pub fn organizations(&self) -> impl Iterator<Item = (&str, &BTreeSet<ASN>)> {
        self.org_members
            .iter()
            .map(|(org_id, members)| (org_id.as_str(), members))
    }

    /// The organization with the most ASes; ties go to the smallest id.
    pub fn largest_organization(&self) -> Option<(&str, usize)> {
        self.org_members
            .iter()
            .map(|(org_id, members)| (org_id.as_str(), members.len()))
            .fold(None, |best, candidate| match best {
                Some((_, size)) if size >= candidate.1 => best,
                _ => Some(candidate),
            })
    }
}

/// Mutable state of a snapshot graph under construction.
///
/// Only `seal` produces a `SnapshotGraph`; nothing observes the graph
/// before that.
#[derive(Debug, Default)]
pub struct SiblingGraphBuilder {
    as_dict: HashMap<ASN, AS>,
    org_members: BTreeMap<String, BTreeSet<ASN>>,
    organizations: HashMap<String, Organization>,
    reference: Option<Reference>,
}

impl SiblingGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_organizations(mut self, organizations: Vec<Organization>) -> Self {
        self.organizations = organizations
            .into_iter()
            .map(|org| (org.org_id.clone(), org))
            .collect();
        self
    }

    pub fn add_record(&mut self, record: impl Into<AsOrgRecord>) -> Result<()> {
        let mut record: AsOrgRecord = record.into();
        let org_id = record.org_id.trim();
        if org_id.is_empty() {
            return Err(Error::EmptyOrganization { asn: record.asn });
        }
        if org_id.len() != record.org_id.len() {
            record.org_id = org_id.to_string();
        }

        if let Some(existing) = self.as_dict.get(&record.asn) {
            return Err(Error::DuplicateAsn {
                asn: record.asn,
                first: existing.org_id.clone(),
                second: record.org_id,
            });
        }

        self.org_members
            .entry(record.org_id.clone())
            .or_default()
            .insert(record.asn);
        self.as_dict.insert(record.asn, AS::from_record(record));
        Ok(())
    }

    pub fn add_records<I, R>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<AsOrgRecord>,
    {
        for record in records {
            self.add_record(record)?;
        }
        Ok(())
    }

    /// Materialize the complete pairwise edge set of every organization.
    pub fn seal(self) -> SnapshotGraph {
        let mut adjacency: HashMap<ASN, HashSet<ASN>> = HashMap::new();
        let mut edge_count = 0;

        for members in self.org_members.values() {
            let k = members.len();
            if k < 2 {
                continue;
            }
            for &asn in members {
                let siblings = members.iter().copied().filter(|&other| other != asn);
                adjacency.entry(asn).or_default().extend(siblings);
            }
            edge_count += k * (k - 1) / 2;
        }

        debug!(
            nodes = self.as_dict.len(),
            edges = edge_count,
            organizations = self.org_members.len(),
            "sealed sibling graph"
        );

        SnapshotGraph {
            as_dict: self.as_dict,
            adjacency,
            org_members: self.org_members,
            organizations: self.organizations,
            reference: self.reference,
            edge_count,
        }
    }

    /// Build the sealed sibling graph of one snapshot's records.
    pub fn build<I, R>(records: I) -> Result<SnapshotGraph>
    where
        I: IntoIterator<Item = R>,
        R: Into<AsOrgRecord>,
    {
        let mut builder = SiblingGraphBuilder::new();
        builder.add_records(records)?;
        Ok(builder.seal())
    }
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Number of worker threads used by `build_many`
    pub workers: usize,
}

impl BuildConfig {
    pub fn new() -> Self {
        BuildConfig {
            workers: num_cpus::get().max(1),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Build independent snapshots in parallel.
///
/// Results come back in input order; a failing snapshot does not affect
/// the others.
pub fn build_many(
    inputs: Vec<(SnapshotId, RecordBatch)>,
    config: &BuildConfig,
) -> Vec<(SnapshotId, Result<SnapshotGraph>)> {
    if inputs.is_empty() {
        return Vec::new();
    }

    let workers = config.workers.clamp(1, inputs.len());
    let chunk_size = inputs.len().div_ceil(workers);

    let mut chunks: Vec<Vec<(SnapshotId, RecordBatch)>> = Vec::with_capacity(workers);
    let mut remaining = inputs.into_iter().peekable();
    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(chunk_size).collect());
    }

    thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .into_iter()
                        .map(|(snapshot, batch)| (snapshot, batch.into_graph()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
