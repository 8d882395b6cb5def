//! Command-line interface of the `as-siblings` binary.
//!
//! Every command loads its dataset files through [`Ingest`], so snapshot
//! labels come from the file names (`20240101.as-org2info.txt` becomes
//! `20240101`) unless `diff` is given explicit labels.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::export;
use crate::ingest::Ingest;
use crate::record_sources::{snapshot_id_from_path, InputFormat, LoadConfig};
use crate::shared::{parse_asn, SnapshotId, ASN};
use crate::sibling_graph::BuildConfig;
use crate::sibling_store::SiblingGraphStore;

#[derive(Debug, Parser)]
#[command(name = "as-siblings", version, about = "Sibling relationships between ASes of the same organization")]
pub struct Cli {
    /// Input format of dataset files (detected from content by default)
    #[arg(long, value_enum, global = true)]
    input_format: Option<FormatArg>,

    /// Worker threads used to build snapshot graphs
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Base URL recorded as the reference of each snapshot
    #[arg(long, global = true)]
    reference_url: Option<String>,

    /// Draw a progress bar while loading files
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    As2org,
    Pairs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Cypher,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print node, edge and organization counts for each snapshot
    Stats {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the siblings of an AS
    Siblings {
        file: PathBuf,
        #[arg(value_parser = asn_arg)]
        asn: ASN,
        #[arg(long)]
        json: bool,
    },
    /// Tell whether two ASes are siblings
    Check {
        file: PathBuf,
        #[arg(value_parser = asn_arg)]
        a: ASN,
        #[arg(value_parser = asn_arg)]
        b: ASN,
    },
    /// Print sibling edges added and removed between two snapshots
    Diff {
        old: PathBuf,
        new: PathBuf,
        /// Snapshot label of OLD (derived from its file name by default)
        #[arg(long)]
        old_label: Option<String>,
        /// Snapshot label of NEW (derived from its file name by default)
        #[arg(long)]
        new_label: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Export a snapshot as node/edge JSON or Cypher statements
    Export {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Snapshot labels for the two sides of a diff. Explicit labels win;
/// otherwise each label is derived from its file name, and when the two
/// derived labels collide the unlabeled sides become `old` and `new`.
pub fn diff_labels(
    old: &Path,
    new: &Path,
    old_label: Option<&str>,
    new_label: Option<&str>,
) -> (SnapshotId, SnapshotId) {
    let old_id = old_label.map_or_else(|| snapshot_id_from_path(old), SnapshotId::from);
    let new_id = new_label.map_or_else(|| snapshot_id_from_path(new), SnapshotId::from);
    if old_id != new_id {
        return (old_id, new_id);
    }
    match (old_label, new_label) {
        (None, None) => (SnapshotId::from("old"), SnapshotId::from("new")),
        (Some(_), None) => (old_id, SnapshotId::from("new")),
        (None, Some(_)) => (SnapshotId::from("old"), new_id),
        // Same label given twice; the store rejects it
        (Some(_), Some(_)) => (old_id, new_id),
    }
}

fn asn_arg(raw: &str) -> std::result::Result<ASN, String> {
    parse_asn(raw).ok_or_else(|| format!("invalid ASN: {}", raw))
}

impl Cli {
    fn ingest(&self) -> Ingest {
        let mut load_config = LoadConfig::new();
        if let Some(format) = self.input_format {
            load_config = load_config.with_format(match format {
                FormatArg::As2org => InputFormat::As2Org,
                FormatArg::Pairs => InputFormat::Pairs,
            });
        }
        if let Some(url) = &self.reference_url {
            load_config = load_config.with_reference_url(url.clone());
        }

        let mut build_config = BuildConfig::new();
        if let Some(threads) = self.threads {
            build_config = build_config.with_workers(threads);
        }

        Ingest::new()
            .with_load_config(load_config)
            .with_build_config(build_config)
            .with_progress(self.progress)
    }

    fn load(&self, paths: &[&Path]) -> Result<(SiblingGraphStore, Vec<SnapshotId>)> {
        self.ingest()
            .run(paths)
            .with_context(|| format!("failed to load {:?}", paths))
    }

    /// Run the parsed command, printing results to stdout.
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Command::Stats { files } => {
                let paths: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
                let (store, snapshots) = self.load(&paths)?;
                for snapshot in &snapshots {
                    let stats = store.stats(snapshot)?;
                    println!(
                        "{}: {} ASes, {} organizations ({} with siblings), {} sibling edges",
                        stats.snapshot,
                        stats.nodes,
                        stats.organizations,
                        stats.sibling_organizations,
                        stats.edges
                    );
                    if let Some((org_id, size)) = &stats.largest_organization {
                        println!("  largest organization: {} ({} ASes)", org_id, size);
                    }
                }
            }
            Command::Siblings { file, asn, json } => {
                let (store, snapshots) = self.load(&[file.as_path()])?;
                let snapshot = &snapshots[0];
                if *json {
                    let graph = store.get(snapshot)?;
                    let value = export::siblings_to_json(snapshot, &graph, *asn);
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    let siblings = store.siblings_of(snapshot, *asn)?;
                    match store.organization_of(snapshot, *asn)? {
                        Some(org_id) => println!("AS{} ({}): {} siblings", asn, org_id, siblings.len()),
                        None => println!("AS{} not present in snapshot {}", asn, snapshot),
                    }
                    for sibling in siblings {
                        println!("  AS{}", sibling);
                    }
                }
            }
            Command::Check { file, a, b } => {
                let (store, snapshots) = self.load(&[file.as_path()])?;
                let siblings = store.are_siblings(&snapshots[0], *a, *b)?;
                println!(
                    "AS{} and AS{} are {}siblings in {}",
                    a,
                    b,
                    if siblings { "" } else { "not " },
                    snapshots[0]
                );
            }
            Command::Diff {
                old,
                new,
                old_label,
                new_label,
                json,
            } => {
                let (old_id, new_id) =
                    diff_labels(old, new, old_label.as_deref(), new_label.as_deref());
                let inputs = [(old_id, old.as_path()), (new_id, new.as_path())];
                let (store, snapshots) = self
                    .ingest()
                    .run_labeled(&inputs)
                    .with_context(|| format!("failed to load {:?} and {:?}", old, new))?;
                let diff = store.diff(&snapshots[0], &snapshots[1])?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(diff.as_ref())?);
                } else {
                    println!(
                        "{} -> {}: {} added, {} removed",
                        snapshots[0],
                        snapshots[1],
                        diff.added.len(),
                        diff.removed.len()
                    );
                    for edge in &diff.added {
                        println!("+ {}", edge);
                    }
                    for edge in &diff.removed {
                        println!("- {}", edge);
                    }
                }
            }
            Command::Export {
                file,
                format,
                output,
            } => {
                let (store, snapshots) = self.load(&[file.as_path()])?;
                let graph = store.get(&snapshots[0])?;
                let rendered = match format {
                    ExportFormat::Json => {
                        serde_json::to_string_pretty(&export::to_json(&snapshots[0], &graph))?
                    }
                    ExportFormat::Cypher => export::to_cypher(&graph),
                };
                match output {
                    Some(path) => fs::write(path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?,
                    None => println!("{}", rendered),
                }
            }
        }
        Ok(())
    }
}
