use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ASN = u32;

/// Node label used for autonomous systems in exported graphs.
pub const AS_LABEL: &str = "AS";

/// Relationship type linking two ASes run by the same organization.
pub const SIBLING_OF: &str = "SIBLING_OF";

pub const CAIDA_ORG: &str = "CAIDA";
pub const AS2ORG_URL: &str = "https://publicdata.caida.org/datasets/as-organizations/";

/// Label of one version of the AS-to-organization mapping.
///
/// Snapshots sort by label, so date labels such as `20240101` order
/// chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn new(label: impl Into<String>) -> Self {
        SnapshotId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The date encoded in a `YYYYMMDD` label, if the label is one.
    pub fn date(&self) -> Option<NaiveDate> {
        if self.0.len() != 8 {
            return None;
        }
        NaiveDate::parse_from_str(&self.0, "%Y%m%d").ok()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(label: &str) -> Self {
        SnapshotId::new(label)
    }
}

impl From<String> for SnapshotId {
    fn from(label: String) -> Self {
        SnapshotId(label)
    }
}

/// Provenance attached to every relationship of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub org: String,
    pub url: String,
    pub time: DateTime<Utc>,
}

impl Reference {
    pub fn new(org: impl Into<String>, url: impl Into<String>, time: DateTime<Utc>) -> Self {
        Reference {
            org: org.into(),
            url: url.into(),
            time,
        }
    }

    /// Reference stamped at midnight UTC of `date`.
    pub fn for_date(org: impl Into<String>, url: impl Into<String>, date: NaiveDate) -> Self {
        let time = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        Reference::new(org, url, time)
    }
}

/// Parse an ASN written either bare (`2497`) or prefixed (`AS2497`).
pub fn parse_asn(raw: &str) -> Option<ASN> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("AS")
        .or_else(|| raw.strip_prefix("as"))
        .or_else(|| raw.strip_prefix("As"))
        .unwrap_or(raw);
    // `u32::from_str` also takes a leading `+`
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<ASN>().ok()
}

#[derive(Debug, Error)]
pub enum Error {
    /// The same ASN was mapped twice within one snapshot
    #[error("AS{asn} appears twice in one snapshot (organizations {first:?} and {second:?})")]
    DuplicateAsn {
        asn: ASN,
        first: String,
        second: String,
    },

    #[error("AS{asn} has an empty organization id")]
    EmptyOrganization { asn: ASN },

    /// Snapshots are stored once and never replaced
    #[error("snapshot {0} is already stored")]
    DuplicateSnapshot(SnapshotId),

    #[error("unknown snapshot {0}")]
    UnknownSnapshot(SnapshotId),

    /// Malformed input line (1-based line number)
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
