use super::AsOrgRecord;
use crate::shared::{parse_asn, Error, Result};

/// Parse `asn|org_id` lines (a comma works as separator too).
///
/// A line splits at its first separator only, so `1,Level 3, Inc` maps
/// AS1 to `Level 3, Inc`. Blank lines and `#` comments are skipped, as is a leading `asn,...`
/// header line.
pub fn parse_pairs(content: &str) -> Result<Vec<AsOrgRecord>> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((raw_asn, org_id)) = line.split_once(['|', ',']) else {
            return Err(Error::Parse {
                line: line_no,
                message: "expected <asn>|<org_id>".to_string(),
            });
        };
        let (raw_asn, org_id) = (raw_asn.trim(), org_id.trim());
        // Organization ids may hold commas, never a second `|` field
        if org_id.contains('|') {
            return Err(Error::Parse {
                line: line_no,
                message: format!("too many fields, expected <asn>|<org_id>: {:?}", line),
            });
        }

        let asn = match parse_asn(raw_asn) {
            Some(asn) => asn,
            None if records.is_empty() && raw_asn.eq_ignore_ascii_case("asn") => continue,
            None => {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("invalid ASN {:?}", raw_asn),
                })
            }
        };

        records.push(AsOrgRecord::new(asn, org_id));
    }

    Ok(records)
}
