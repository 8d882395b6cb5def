// Re-export all public modules
pub mod shared;
pub mod sibling_graph;
pub mod sibling_store;
pub mod record_sources;
pub mod export;
pub mod ingest;
pub mod cli;

// Re-export commonly used types at the crate root
pub use ingest::Ingest;
pub use record_sources::{AsOrgRecord, DatasetFile, LoadConfig, RecordBatch, RecordSource};
pub use shared::{Error, Reference, Result, SnapshotId, ASN};
pub use sibling_graph::{build_many, BuildConfig, SiblingEdge, SiblingGraphBuilder, SnapshotGraph, AS};
pub use sibling_store::{SiblingGraphStore, SnapshotDiff, SnapshotStats};
