//! Compression of large intermediate files and removal of assembler scratch
//! directories once a run has finished.

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::metadata::{HierarchicalRecord, SENTINEL};
use crate::utils::{log_elapsed, ordered_map, ParallelConfig};

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error compressing {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counts of what a cleanup pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionSummary {
    pub compressed: usize,
    pub removed_originals: usize,
    pub removed_directories: usize,
}

/// Gzips the fastq files listed in each record's `general` category and
/// clears the assembler's temporary directories.
#[derive(Debug, Clone)]
pub struct Compressor {
    parallel: ParallelConfig,
}

impl Compressor {
    pub fn new(parallel: ParallelConfig) -> Self {
        Compressor { parallel }
    }

    pub fn run(&self, records: &mut [HierarchicalRecord]) -> CompressionSummary {
        let start = Instant::now();
        info!("Compressing large files");

        let mut files = fastq_files(records);
        files.sort();
        files.dedup();

        let outcomes = ordered_map(files.clone(), |path| compress_file(&path), &self.parallel);
        let mut summary = CompressionSummary::default();
        for outcome in outcomes {
            match outcome {
                Ok(true) => summary.compressed += 1,
                Ok(false) => {}
                Err(e) => warn!("{}", e),
            }
        }

        for path in &files {
            if gz_path(path).is_file() && fs::remove_file(path).is_ok() {
                summary.removed_originals += 1;
            }
        }

        log_elapsed("Removing temporary files", start);
        summary.removed_directories = remove_temporary(records);
        summary
    }
}

/// Fastq files (not symlinks) listed in the `general` category of each record.
pub fn fastq_files(records: &mut [HierarchicalRecord]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for record in records.iter_mut() {
        let general = match record.attrs("general") {
            Ok(general) => general,
            Err(_) => continue,
        };
        for (_, value) in general.iter() {
            if let Value::Array(items) = value {
                for item in items {
                    if let Value::String(file) = item {
                        let path = Path::new(file);
                        if file.ends_with(".fastq") && !path.is_symlink() {
                            files.push(path.to_path_buf());
                        }
                    }
                }
            }
        }
    }
    files
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzips `path` to `{path}.gz`. Returns `false` if there was nothing to do.
pub fn compress_file(path: &Path) -> Result<bool, CompressError> {
    let target = gz_path(path);
    if path.to_string_lossy().contains(".gz") || target.is_file() {
        return Ok(false);
    }
    let io_error = |source| CompressError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let mut input = BufReader::new(File::open(path).map_err(io_error)?);
    let output = BufWriter::new(File::create(&target).map_err(io_error)?);
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder).map_err(io_error)?;
    encoder.finish().map_err(io_error)?.flush().map_err(io_error)?;
    debug!("Compressed {}", path.display());
    Ok(true)
}

/// Removes `K*/`, `misc/` and `tmp/` under the assembler output of every
/// record with a best assembly. Removal errors are ignored.
pub fn remove_temporary(records: &mut [HierarchicalRecord]) -> usize {
    let mut folders = Vec::new();
    for record in records.iter_mut() {
        let general = match record.attrs("general") {
            Ok(general) => general,
            Err(_) => continue,
        };
        if general.get_string("bestassemblyfile") == SENTINEL {
            continue;
        }
        let spades_output = PathBuf::from(general.get_string("spadesoutput"));
        if let Ok(entries) = fs::read_dir(&spades_output) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() && entry.file_name().to_string_lossy().starts_with('K') {
                    folders.push(path);
                }
            }
        }
        folders.push(spades_output.join("misc"));
        folders.push(spades_output.join("tmp"));
    }

    folders
        .into_iter()
        .filter(|folder| fs::remove_dir_all(folder).is_ok())
        .count()
}
