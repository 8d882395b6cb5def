use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::record_sources::{DatasetFile, LoadConfig, RecordSource};
use crate::shared::{Result, SnapshotId};
use crate::sibling_graph::{build_many, BuildConfig};
use crate::sibling_store::SiblingGraphStore;

/// Loads dataset files, builds their snapshot graphs and stores them.
pub struct Ingest {
    pub load_config: LoadConfig,
    pub build_config: BuildConfig,
    /// Whether to draw a progress bar while reading files
    pub show_progress: bool,
}

impl Ingest {
    pub fn new() -> Self {
        Ingest {
            load_config: LoadConfig::new(),
            build_config: BuildConfig::new(),
            show_progress: false,
        }
    }

    pub fn with_load_config(mut self, config: LoadConfig) -> Self {
        self.load_config = config;
        self
    }

    pub fn with_build_config(mut self, config: BuildConfig) -> Self {
        self.build_config = config;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    }

    fn dataset_file(&self, path: &Path) -> DatasetFile {
        DatasetFile::new(PathBuf::from(path), self.load_config.clone())
    }

    /// Ingest `paths` into `store`, returning the new snapshot ids in
    /// input order. Stops at the first file that fails to load or build.
    pub fn run_into<P: AsRef<Path>>(
        &self,
        store: &SiblingGraphStore,
        paths: &[P],
    ) -> Result<Vec<SnapshotId>> {
        let files = paths
            .iter()
            .map(|path| self.dataset_file(path.as_ref()))
            .collect();
        self.ingest_files(store, files)
    }

    /// Like [`Ingest::run_into`], but each file is stored under the given
    /// label instead of the one derived from its name.
    pub fn run_labeled_into<P: AsRef<Path>>(
        &self,
        store: &SiblingGraphStore,
        inputs: &[(SnapshotId, P)],
    ) -> Result<Vec<SnapshotId>> {
        let files = inputs
            .iter()
            .map(|(label, path)| self.dataset_file(path.as_ref()).with_label(label.clone()))
            .collect();
        self.ingest_files(store, files)
    }

    fn ingest_files(&self, store: &SiblingGraphStore, files: Vec<DatasetFile>) -> Result<Vec<SnapshotId>> {
        let start_time = Instant::now();
        let pb = self.progress_bar(files.len());

        let mut batches = Vec::with_capacity(files.len());
        for file in &files {
            pb.set_message(file.path.display().to_string());
            let batch = file.load()?;
            info!(
                path = %file.path.display(),
                records = batch.records.len(),
                organizations = batch.organizations.len(),
                "loaded dataset file"
            );
            batches.push((file.snapshot_id(), batch));
            pb.inc(1);
        }
        pb.finish_and_clear();

        let mut snapshot_ids = Vec::with_capacity(batches.len());
        for (snapshot, graph) in build_many(batches, &self.build_config) {
            store.put(snapshot.clone(), graph?)?;
            snapshot_ids.push(snapshot);
        }

        info!(
            snapshots = snapshot_ids.len(),
            elapsed_secs = start_time.elapsed().as_secs_f64(),
            "ingest complete"
        );
        Ok(snapshot_ids)
    }

    /// Ingest `paths` into a fresh store.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(SiblingGraphStore, Vec<SnapshotId>)> {
        let store = SiblingGraphStore::new();
        let snapshot_ids = self.run_into(&store, paths)?;
        Ok((store, snapshot_ids))
    }

    /// Ingest labeled files into a fresh store.
    pub fn run_labeled<P: AsRef<Path>>(
        &self,
        inputs: &[(SnapshotId, P)],
    ) -> Result<(SiblingGraphStore, Vec<SnapshotId>)> {
        let store = SiblingGraphStore::new();
        let snapshot_ids = self.run_labeled_into(&store, inputs)?;
        Ok((store, snapshot_ids))
    }
}

impl Default for Ingest {
    fn default() -> Self {
        Self::new()
    }
}
