//! Rendering of snapshot graphs as `(a:AS {asn})-[:SIBLING_OF]->(b:AS)`
//! node/edge data, either as JSON or as Cypher `MERGE` statements.

use serde::Serialize;
use serde_json::{json, Value};

use crate::shared::{Reference, SnapshotId, AS_LABEL, ASN, SIBLING_OF};
use crate::sibling_graph::{SiblingEdge, SnapshotGraph};

#[derive(Debug, Serialize)]
struct NodeView<'a> {
    asn: ASN,
    org_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EdgeView<'a> {
    src: ASN,
    dst: ASN,
    #[serde(rename = "type")]
    rel_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_org: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_time: Option<String>,
}

fn node_view(graph: &SnapshotGraph, asn: ASN) -> NodeView<'_> {
    let as_obj = graph.get(&asn);
    NodeView {
        asn,
        org_id: as_obj.map(|as_obj| as_obj.org_id.as_str()),
        name: as_obj.and_then(|as_obj| as_obj.name.as_deref()),
    }
}

fn edge_view(edge: SiblingEdge, reference: Option<&Reference>) -> EdgeView<'_> {
    EdgeView {
        src: edge.low,
        dst: edge.high,
        rel_type: SIBLING_OF,
        reference_org: reference.map(|r| r.org.as_str()),
        reference_url: reference.map(|r| r.url.as_str()),
        reference_time: reference.map(|r| r.time.to_rfc3339()),
    }
}

/// The whole snapshot: every AS node and every sibling edge, sorted.
pub fn to_json(snapshot: &SnapshotId, graph: &SnapshotGraph) -> Value {
    let nodes: Vec<NodeView> = graph
        .asns()
        .into_iter()
        .map(|asn| node_view(graph, asn))
        .collect();
    let edges: Vec<EdgeView> = graph
        .edge_set()
        .into_iter()
        .map(|edge| edge_view(edge, graph.reference()))
        .collect();

    json!({
        "snapshot": snapshot,
        "reference": graph.reference(),
        "nodes": nodes,
        "edges": edges,
    })
}

/// One AS and its siblings as node/edge pairs. Edges point away from `asn`.
pub fn siblings_to_json(snapshot: &SnapshotId, graph: &SnapshotGraph, asn: ASN) -> Value {
    let siblings = graph.siblings_of(asn);
    let nodes: Vec<NodeView> = std::iter::once(asn)
        .chain(siblings.iter().copied())
        .map(|node| node_view(graph, node))
        .collect();
    let edges: Vec<EdgeView> = siblings
        .iter()
        .filter_map(|&sibling| SiblingEdge::new(asn, sibling))
        .map(|edge| {
            let mut view = edge_view(edge, graph.reference());
            view.src = asn;
            view.dst = edge.other(asn).unwrap_or(edge.high);
            view
        })
        .collect();

    json!({
        "snapshot": snapshot,
        "asn": asn,
        "organization": graph.organization_of(asn),
        "nodes": nodes,
        "edges": edges,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Int(i64),
    Str(String),
}

/// Render properties as a Cypher map.
///
/// Strings are double-quoted unless they contain a double quote, in which
/// case they are single-quoted with `'` escaped.
pub fn property_map(props: &[(&str, PropValue)], eq: &str, prefix: &str) -> String {
    let entries: Vec<String> = props
        .iter()
        .map(|(key, value)| match value {
            PropValue::Str(s) if s.contains('"') => {
                format!("{}{}{} '{}'", prefix, key, eq, s.replace('\'', "\\'"))
            }
            PropValue::Str(s) => format!("{}{}{} \"{}\"", prefix, key, eq, s),
            PropValue::Int(n) => format!("{}{}{} {}", prefix, key, eq, n),
        })
        .collect();
    format!("{{{}}}", entries.join(","))
}

fn reference_props(reference: Option<&Reference>) -> Vec<(&'static str, PropValue)> {
    match reference {
        Some(reference) => vec![
            ("reference_org", PropValue::Str(reference.org.clone())),
            ("reference_url", PropValue::Str(reference.url.clone())),
            ("reference_time", PropValue::Str(reference.time.to_rfc3339())),
        ],
        None => Vec::new(),
    }
}

/// Cypher statements that merge the snapshot's nodes and sibling edges.
pub fn to_cypher(graph: &SnapshotGraph) -> String {
    let mut out = String::new();

    for asn in graph.asns() {
        let props = property_map(&[("asn", PropValue::Int(i64::from(asn)))], ":", "");
        out.push_str(&format!("MERGE (:{} {});\n", AS_LABEL, props));
    }

    let edge_props = reference_props(graph.reference());
    let rel_props = if edge_props.is_empty() {
        String::new()
    } else {
        format!(" {}", property_map(&edge_props, ":", ""))
    };

    for edge in graph.edge_set() {
        out.push_str(&format!(
            "MATCH (a:{label} {{asn: {low}}}), (b:{label} {{asn: {high}}}) MERGE (a)-[:{rel}{props}]->(b);\n",
            label = AS_LABEL,
            low = edge.low,
            high = edge.high,
            rel = SIBLING_OF,
            props = rel_props,
        ));
    }

    out
}
