//! Reload of metadata snapshots from a previous pipeline run.
//!
//! Each sample's snapshot lives at `{path}/{name}/{name}_metadata.json`. When
//! a readable snapshot exists, the reloaded record replaces the freshly
//! computed one, while the fresh record's dump is written to the reloaded
//! record's output directory. Every failure falls back to the fresh record.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::config::ReaderConfig;
use crate::metadata::{HierarchicalRecord, MetadataError, SENTINEL};
use crate::utils::{log_elapsed, make_path, ordered_map, ParallelConfig};

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Snapshot {0} is not a JSON object")]
    NotAnObject(PathBuf),

    #[error("Metadata error: {0}")]
    MetadataError(#[from] MetadataError),
}

/// A sample entering reconciliation with its freshly computed metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub metadata: HierarchicalRecord,
}

impl Sample {
    /// Pairs a sample name with its freshly built record.
    pub fn new(name: impl Into<String>, metadata: HierarchicalRecord) -> Self {
        Sample {
            name: name.into(),
            metadata,
        }
    }
}

/// Why the fresh record was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshReason {
    NoSnapshot,
    EmptySnapshot,
    Malformed,
    PersistFailed,
}

/// Which version of a sample's metadata became authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Reloaded,
    Fresh(FreshReason),
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::Reloaded => write!(f, "reloaded"),
            RecordSource::Fresh(FreshReason::NoSnapshot) => write!(f, "fresh (no snapshot)"),
            RecordSource::Fresh(FreshReason::EmptySnapshot) => write!(f, "fresh (empty snapshot)"),
            RecordSource::Fresh(FreshReason::Malformed) => write!(f, "fresh (malformed snapshot)"),
            RecordSource::Fresh(FreshReason::PersistFailed) => write!(f, "fresh (write failed)"),
        }
    }
}

/// The authoritative record for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub name: String,
    pub metadata: HierarchicalRecord,
    pub source: RecordSource,
}

impl Reconciled {
    /// Whether the persisted snapshot won over the fresh record.
    pub fn is_reloaded(&self) -> bool {
        self.source == RecordSource::Reloaded
    }

    /// Consumes the result and returns the authoritative record.
    pub fn into_metadata(self) -> HierarchicalRecord {
        self.metadata
    }
}

/// Reconciles fresh records against the snapshots under a base path.
#[derive(Debug, Clone)]
pub struct MetadataReader {
    path: PathBuf,
    parallel: ParallelConfig,
    strict_dump: bool,
}

impl MetadataReader {
    /// Single-threaded reconciler rooted at `path`, with forgiving dumps.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MetadataReader {
            path: path.into(),
            parallel: ParallelConfig { threads: 1 },
            strict_dump: false,
        }
    }

    /// Builds a reconciler from a loaded [`ReaderConfig`].
    pub fn from_config(config: &ReaderConfig) -> Self {
        MetadataReader {
            path: config.path.clone(),
            parallel: config.parallel(),
            strict_dump: config.strict_dump,
        }
    }

    /// Number of worker threads; one or fewer runs sequentially.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.parallel.threads = threads;
        self
    }

    /// Refuse to persist records whose categories cannot be serialized.
    pub fn with_strict_dump(mut self, strict_dump: bool) -> Self {
        self.strict_dump = strict_dump;
        self
    }

    /// Base directory holding the per-sample snapshots.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `{path}/{name}/{name}_metadata.json`
    ///
    /// The base path is a directory, so a trailing separator is optional.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.path.join(name).join(snapshot_file_name(name))
    }

    /// Reconciles every sample; the output has one entry per input, in order.
    pub fn reconcile(&self, samples: Vec<Sample>) -> Vec<Reconciled> {
        let start = Instant::now();
        let total = samples.len();
        info!("Reading metadata snapshots for {} samples", total);

        let results = ordered_map(samples, |sample| self.reconcile_sample(sample), &self.parallel);

        let reloaded = results.iter().filter(|r| r.is_reloaded()).count();
        log_elapsed(
            &format!(
                "Reloaded metadata for {} of {} samples",
                reloaded, total
            ),
            start,
        );
        results
    }

    /// Reconciles a single sample.
    pub fn reconcile_sample(&self, sample: Sample) -> Reconciled {
        let path = self.snapshot_path(&sample.name);

        if !path.is_file() {
            debug!("No metadata snapshot for {} at {}", sample.name, path.display());
            return self.keep_fresh(sample, &path, FreshReason::NoSnapshot);
        }

        match fs::metadata(&path) {
            Ok(meta) if meta.len() == 0 => {
                debug!("Metadata snapshot {} is empty", path.display());
                return self.keep_fresh(sample, &path, FreshReason::EmptySnapshot);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Cannot stat metadata snapshot {}: {}", path.display(), e);
                return self.keep_fresh(sample, &path, FreshReason::Malformed);
            }
        }

        let snapshot = match read_snapshot(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Ignoring unreadable metadata snapshot {}: {}",
                    path.display(),
                    e
                );
                return self.keep_fresh(sample, &path, FreshReason::Malformed);
            }
        };

        let mut reloaded = HierarchicalRecord::from_snapshot(snapshot);
        let output_directory = match reloaded.attrs("general") {
            Ok(general) => general.get_string("outputdirectory"),
            Err(_) => SENTINEL.to_string(),
        };
        let target = Path::new(&output_directory).join(snapshot_file_name(&sample.name));

        // The fresh record is persisted even though the reload wins.
        match self.persist(&sample.metadata, &target) {
            Ok(()) => {
                debug!(
                    "Reloaded metadata for {}; fresh dump written to {}",
                    sample.name,
                    target.display()
                );
                reloaded.set("name", sample.name.clone());
                Reconciled {
                    name: sample.name,
                    metadata: reloaded,
                    source: RecordSource::Reloaded,
                }
            }
            Err(e) => {
                warn!(
                    "Cannot write metadata for {} to {}: {}",
                    sample.name,
                    target.display(),
                    e
                );
                fresh(sample, FreshReason::PersistFailed)
            }
        }
    }

    /// Keeps the fresh record and refreshes the canonical snapshot with its dump.
    fn keep_fresh(&self, sample: Sample, path: &Path, reason: FreshReason) -> Reconciled {
        let written = match path.parent() {
            Some(parent) => make_path(parent)
                .map_err(ReaderError::from)
                .and_then(|()| self.persist(&sample.metadata, path)),
            None => self.persist(&sample.metadata, path),
        };
        if let Err(e) = written {
            warn!(
                "Cannot write metadata snapshot for {} to {}: {}",
                sample.name,
                path.display(),
                e
            );
        }
        fresh(sample, reason)
    }

    fn persist(&self, record: &HierarchicalRecord, path: &Path) -> Result<(), ReaderError> {
        let dump = if self.strict_dump {
            record.try_serialize()?
        } else {
            record.serialize()
        };
        write_snapshot(path, &dump)
    }
}

fn fresh(sample: Sample, reason: FreshReason) -> Reconciled {
    Reconciled {
        name: sample.name,
        metadata: sample.metadata,
        source: RecordSource::Fresh(reason),
    }
}

/// `{name}_metadata.json`
pub fn snapshot_file_name(name: &str) -> String {
    format!("{}_metadata.json", name)
}

/// Reads a snapshot file; the top level must be a JSON object.
pub fn read_snapshot(path: &Path) -> Result<Map<String, Value>, ReaderError> {
    let file = File::open(path)?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ReaderError::NotAnObject(path.to_path_buf())),
    }
}

/// Writes a snapshot with sorted keys and four-space indentation.
pub fn write_snapshot(path: &Path, dump: &Map<String, Value>) -> Result<(), ReaderError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    dump.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}
