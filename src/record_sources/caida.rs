//! Reader for CAIDA's AS Organizations dataset (`YYYYMMDD.as-org2info.txt`).
//!
//! The file is split into sections, each introduced by a header line:
//!
//! ```text
//! # format:org_id|changed|org_name|country|source
//! LVLT-ARIN|20120130|Level 3 Communications, Inc.|US|ARIN
//! # format:aut|changed|aut_name|org_id|opaque_id|source
//! 1|20120224|LVLT-1|LVLT-ARIN|e5e3b9c13678dfc483fb1f819d70883c_ARIN|ARIN
//! ```

use chrono::NaiveDate;
use tracing::warn;

use super::{AsOrgRecord, RecordBatch};
use crate::shared::{parse_asn, Error, Result};
use crate::sibling_graph::Organization;

pub const FORMAT_HEADER: &str = "# format:";

const ORG_FIELDS: usize = 5;
const AS_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Organizations,
    Autonomous,
    Unknown,
}

impl Section {
    fn from_header(format: &str) -> Self {
        match format.trim().split('|').next() {
            Some("org_id") => Section::Organizations,
            Some("aut") => Section::Autonomous,
            _ => Section::Unknown,
        }
    }
}

pub fn parse_as2org(content: &str) -> Result<RecordBatch> {
    let mut section = Section::Preamble;
    let mut batch = RecordBatch::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');

        if let Some(format) = line.strip_prefix(FORMAT_HEADER) {
            section = Section::from_header(format);
            if section == Section::Unknown {
                warn!(line = line_no, format, "skipping unknown as-org2info section");
            }
            continue;
        }
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        match section {
            Section::Organizations => batch.organizations.push(parse_org_line(line, line_no)?),
            Section::Autonomous => batch.records.push(parse_as_line(line, line_no)?),
            Section::Unknown => {}
            Section::Preamble => {
                return Err(Error::Parse {
                    line: line_no,
                    message: "data line before any '# format:' header".to_string(),
                })
            }
        }
    }

    Ok(batch)
}

fn split_fields(line: &str, expected: usize, line_no: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < expected {
        return Err(Error::Parse {
            line: line_no,
            message: format!("expected {} fields, found {}", expected, fields.len()),
        });
    }
    Ok(fields)
}

fn parse_changed(raw: &str, line_no: usize) -> Result<Option<NaiveDate>> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(Some)
        .map_err(|err| Error::Parse {
            line: line_no,
            message: format!("invalid changed date {:?}: {}", raw, err),
        })
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn parse_org_line(line: &str, line_no: usize) -> Result<Organization> {
    let fields = split_fields(line, ORG_FIELDS, line_no)?;
    Ok(Organization {
        org_id: fields[0].to_string(),
        changed: parse_changed(fields[1], line_no)?,
        name: non_empty(fields[2]),
        country: non_empty(fields[3]),
        source: non_empty(fields[4]),
    })
}

fn parse_as_line(line: &str, line_no: usize) -> Result<AsOrgRecord> {
    let fields = split_fields(line, AS_FIELDS, line_no)?;
    let asn = parse_asn(fields[0]).ok_or_else(|| Error::Parse {
        line: line_no,
        message: format!("invalid ASN {:?}", fields[0]),
    })?;

    Ok(AsOrgRecord {
        asn,
        org_id: fields[3].to_string(),
        name: non_empty(fields[2]),
        changed: parse_changed(fields[1], line_no)?,
    })
}
