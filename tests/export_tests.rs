use chrono::NaiveDate;

use as_siblings::export::{siblings_to_json, to_cypher, to_json};
use as_siblings::record_sources::{RecordSource, VecRecordSource};
use as_siblings::{Reference, SiblingGraphBuilder, SnapshotGraph, SnapshotId};

fn create_referenced_graph() -> SnapshotGraph {
    let reference = Reference::for_date(
        "CAIDA",
        "https://example.org/20240101.as-org2info.txt",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    VecRecordSource::new(vec![(2497, "IIJ-AP"), (2510, "IIJ-AP"), (3356, "LVLT-ARIN")])
        .with_reference(reference)
        .load()
        .unwrap()
        .into_graph()
        .unwrap()
}

#[test]
fn test_to_json_nodes_and_edges() {
    let graph = create_referenced_graph();
    let value = to_json(&SnapshotId::from("20240101"), &graph);

    assert_eq!(value["snapshot"], "20240101");
    assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(value["nodes"][0]["asn"], 2497);
    assert_eq!(value["nodes"][0]["org_id"], "IIJ-AP");

    let edges = value["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["src"], 2497);
    assert_eq!(edges[0]["dst"], 2510);
    assert_eq!(edges[0]["type"], "SIBLING_OF");
    assert_eq!(edges[0]["reference_org"], "CAIDA");
    assert_eq!(edges[0]["reference_time"], "2024-01-01T00:00:00+00:00");
}

#[test]
fn test_to_json_without_reference() {
    let graph = SiblingGraphBuilder::build(vec![(1, "A"), (2, "A")]).unwrap();
    let value = to_json(&SnapshotId::from("manual"), &graph);

    assert!(value["reference"].is_null());
    assert!(value["edges"][0].get("reference_org").is_none());
}

#[test]
fn test_siblings_to_json_points_away_from_asn() {
    let graph = create_referenced_graph();
    let value = siblings_to_json(&SnapshotId::from("20240101"), &graph, 2510);

    assert_eq!(value["organization"], "IIJ-AP");
    assert_eq!(value["nodes"][0]["asn"], 2510);
    assert_eq!(value["edges"][0]["src"], 2510);
    assert_eq!(value["edges"][0]["dst"], 2497);

    let unknown = siblings_to_json(&SnapshotId::from("20240101"), &graph, 64512);
    assert!(unknown["organization"].is_null());
    assert!(unknown["nodes"][0]["org_id"].is_null());
    assert_eq!(unknown["edges"].as_array().unwrap().len(), 0);
}

#[test]
fn test_to_cypher() {
    let graph = create_referenced_graph();
    let cypher = to_cypher(&graph);
    let lines: Vec<&str> = cypher.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "MERGE (:AS {asn: 2497});");
    assert_eq!(lines[2], "MERGE (:AS {asn: 3356});");
    assert_eq!(
        lines[3],
        "MATCH (a:AS {asn: 2497}), (b:AS {asn: 2510}) MERGE (a)-[:SIBLING_OF {reference_org: \"CAIDA\",reference_url: \"https://example.org/20240101.as-org2info.txt\",reference_time: \"2024-01-01T00:00:00+00:00\"}]->(b);"
    );
}

#[test]
fn test_to_cypher_without_reference() {
    let graph = SiblingGraphBuilder::build(vec![(1, "A"), (2, "A")]).unwrap();
    let cypher = to_cypher(&graph);
    assert!(cypher.ends_with("MERGE (a)-[:SIBLING_OF]->(b);\n"));
}
