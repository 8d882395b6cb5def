pub mod caida;
pub mod pairs;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{Reference, Result, SnapshotId, AS2ORG_URL, ASN, CAIDA_ORG};
use crate::sibling_graph::{Organization, SiblingGraphBuilder, SnapshotGraph};

/// One raw AS-to-organization observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsOrgRecord {
    pub asn: ASN,
    pub org_id: String,
    pub name: Option<String>,
    pub changed: Option<NaiveDate>,
}

impl AsOrgRecord {
    pub fn new(asn: ASN, org_id: impl Into<String>) -> Self {
        AsOrgRecord {
            asn,
            org_id: org_id.into(),
            name: None,
            changed: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_changed(mut self, changed: NaiveDate) -> Self {
        self.changed = Some(changed);
        self
    }
}

impl<S: Into<String>> From<(ASN, S)> for AsOrgRecord {
    fn from((asn, org_id): (ASN, S)) -> Self {
        AsOrgRecord::new(asn, org_id)
    }
}

/// Everything a source yields for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<AsOrgRecord>,
    pub organizations: Vec<Organization>,
    pub reference: Option<Reference>,
}

impl RecordBatch {
    pub fn new(records: Vec<AsOrgRecord>) -> Self {
        RecordBatch {
            records,
            organizations: Vec::new(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn into_graph(self) -> Result<SnapshotGraph> {
        let mut builder = SiblingGraphBuilder::new().with_organizations(self.organizations);
        if let Some(reference) = self.reference {
            builder = builder.with_reference(reference);
        }
        builder.add_records(self.records)?;
        Ok(builder.seal())
    }
}

/// Anything that can produce the records of one snapshot.
pub trait RecordSource {
    fn load(&self) -> Result<RecordBatch>;
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct VecRecordSource {
    pub records: Vec<AsOrgRecord>,
    pub reference: Option<Reference>,
}

impl VecRecordSource {
    pub fn new<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<AsOrgRecord>,
    {
        VecRecordSource {
            records: records.into_iter().map(Into::into).collect(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl RecordSource for VecRecordSource {
    fn load(&self) -> Result<RecordBatch> {
        Ok(RecordBatch {
            records: self.records.clone(),
            organizations: Vec::new(),
            reference: self.reference.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// CAIDA `as-org2info` sections introduced by `# format:` headers
    As2Org,
    /// `asn|org_id` or `asn,org_id` lines
    Pairs,
}

impl InputFormat {
    pub fn detect(content: &str) -> Self {
        if content
            .lines()
            .any(|line| line.starts_with(caida::FORMAT_HEADER))
        {
            InputFormat::As2Org
        } else {
            InputFormat::Pairs
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Forced input format; detected from content when unset
    pub format: Option<InputFormat>,
    pub reference_org: String,
    /// Base URL the file name is appended to for the snapshot reference
    pub reference_url: String,
}

impl LoadConfig {
    pub fn new() -> Self {
        LoadConfig {
            format: None,
            reference_org: CAIDA_ORG.to_string(),
            reference_url: AS2ORG_URL.to_string(),
        }
    }

    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_reference_org(mut self, org: String) -> Self {
        self.reference_org = org;
        self
    }

    pub fn with_reference_url(mut self, url: String) -> Self {
        self.reference_url = url;
        self
    }

    /// Reference for a snapshot loaded from `path`. The reference time is
    /// midnight UTC of the snapshot date, taken from the label or else the
    /// file name; undated snapshots are stamped with today's date.
    pub fn reference_for(&self, path: &Path, snapshot: &SnapshotId) -> Reference {
        let date = snapshot
            .date()
            .or_else(|| snapshot_id_from_path(path).date())
            .unwrap_or_else(|| Utc::now().date_naive());
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = format!("{}{}", self.reference_url, file_name);
        Reference::for_date(self.reference_org.clone(), url, date)
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A dataset file on disk, in whichever supported format it holds.
#[derive(Debug, Clone)]
pub struct DatasetFile {
    pub path: PathBuf,
    pub config: LoadConfig,
    /// Overrides the label derived from the file name
    pub label: Option<SnapshotId>,
}

impl DatasetFile {
    pub fn new(path: impl Into<PathBuf>, config: LoadConfig) -> Self {
        DatasetFile {
            path: path.into(),
            config,
            label: None,
        }
    }

    pub fn with_label(mut self, label: SnapshotId) -> Self {
        self.label = Some(label);
        self
    }

    pub fn snapshot_id(&self) -> SnapshotId {
        match &self.label {
            Some(label) => label.clone(),
            None => snapshot_id_from_path(&self.path),
        }
    }
}

impl RecordSource for DatasetFile {
    fn load(&self) -> Result<RecordBatch> {
        let content = read_input(&self.path)?;
        let format = self
            .config
            .format
            .unwrap_or_else(|| InputFormat::detect(&content));

        let mut batch = match format {
            InputFormat::As2Org => caida::parse_as2org(&content)?,
            InputFormat::Pairs => RecordBatch::new(pairs::parse_pairs(&content)?),
        };
        batch.reference = Some(self.config.reference_for(&self.path, &self.snapshot_id()));
        Ok(batch)
    }
}

/// Read a dataset file, decompressing `.bz2` files.
pub fn read_input(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut content = String::new();
    if path.extension().is_some_and(|ext| ext == "bz2") {
        BzDecoder::new(file).read_to_string(&mut content)?;
    } else {
        BufReader::new(file).read_to_string(&mut content)?;
    }
    Ok(content)
}

/// Snapshot label of a dataset file: its leading `YYYYMMDD` date when the
/// name starts with one (`20240101.as-org2info.txt`), else the name up to
/// the first dot.
pub fn snapshot_id_from_path(path: &Path) -> SnapshotId {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let date_prefix: String = file_name.chars().take_while(char::is_ascii_digit).collect();
    if date_prefix.len() == 8 && SnapshotId::from(date_prefix.as_str()).date().is_some() {
        return SnapshotId::from(date_prefix);
    }

    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        SnapshotId::from(file_name)
    } else {
        SnapshotId::from(stem)
    }
}
