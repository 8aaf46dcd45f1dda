use anyhow::{Context, Result};
use assembly_metadata::pipeline::{Compressor, MetadataReader, Reconciled, Sample};
use assembly_metadata::utils::{make_path, ProgressDots, SampleNamer};
use assembly_metadata::{HierarchicalRecord, ReaderConfig};
use clap::{Parser, Subcommand};
use log::info;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding one sub-directory per sample
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Number of threads to use
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Refuse to write metadata with categories that cannot be serialized
    #[arg(long)]
    pub strict: bool,

    /// Print a progress dot per sample on stderr
    #[arg(long)]
    pub progress: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile fresh sample metadata with snapshots from a previous run
    Reconcile {
        /// Directory containing the sequence files
        #[arg(short, long)]
        sequences: PathBuf,

        /// Extension of the sequence files
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Reconcile, then compress fastq files and remove temporary assembler output
    Compress {
        /// Directory containing the sequence files
        #[arg(short, long)]
        sequences: PathBuf,

        /// Extension of the sequence files
        #[arg(short, long)]
        extension: Option<String>,
    },
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ReaderConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ReaderConfig::default(),
    };
    if let Some(path) = cli.path {
        config.path = path;
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    config.strict_dump |= cli.strict;

    let (sequences, extension, compress) = match cli.command {
        Commands::Reconcile {
            sequences,
            extension,
        } => (sequences, extension, false),
        Commands::Compress {
            sequences,
            extension,
        } => (sequences, extension, true),
    };
    if let Some(extension) = extension {
        config.extension = extension;
    }
    config.validate()?;
    info!("Configuration: {:?}", config);

    let samples = build_samples(&config, &sequences)?;
    println!("Found {} samples in {}", samples.len(), sequences.display());

    let reader = MetadataReader::from_config(&config);
    let results = reader.reconcile(samples);
    report(&results, cli.progress)?;

    if compress {
        let mut records: Vec<HierarchicalRecord> =
            results.into_iter().map(Reconciled::into_metadata).collect();
        let summary = Compressor::new(config.parallel()).run(&mut records);
        println!(
            "Compressed {} files, removed {} originals and {} temporary directories",
            summary.compressed, summary.removed_originals, summary.removed_directories
        );
    }

    Ok(())
}

/// Groups the sequence files by sample name and builds a fresh record for each.
fn build_samples(config: &ReaderConfig, sequences: &Path) -> Result<Vec<Sample>> {
    let namer = SampleNamer::new(&config.extension)?;
    let mut files: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for entry in std::fs::read_dir(sequences)
        .with_context(|| format!("Failed to read {}", sequences.display()))?
    {
        let path = entry?.path();
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if !path.is_file() || !file_name.contains(config.extension.as_str()) {
            continue;
        }
        files
            .entry(namer.name(&file_name))
            .or_default()
            .push(path.to_string_lossy().into_owned());
    }

    let mut samples = Vec::with_capacity(files.len());
    for (name, mut fastq_files) in files {
        fastq_files.sort();
        let output_directory = config.path.join(&name);
        make_path(&output_directory)?;

        let mut metadata = HierarchicalRecord::new();
        metadata.set("name", name.as_str());
        let general = metadata.attrs("general")?;
        general.set(
            "outputdirectory",
            output_directory.to_string_lossy().into_owned(),
        );
        general.set("fastqfiles", fastq_files);
        general.set("sequencedirectory", sequences.to_string_lossy().into_owned());
        samples.push(Sample::new(name, metadata));
    }
    Ok(samples)
}

fn report(results: &[Reconciled], progress: bool) -> Result<()> {
    let mut dots = ProgressDots::new();
    let mut stderr = io::stderr();
    for result in results {
        if progress {
            dots.tick(&mut stderr)?;
        }
        println!("{}\t{}", result.name, result.source);
    }
    if progress {
        eprintln!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_samples_groups_reads() {
        let reads = tempdir().unwrap();
        let base = tempdir().unwrap();
        for file in [
            "2015-SEQ-001_S1_L001_R1_001.fastq",
            "2015-SEQ-001_S1_L001_R2_001.fastq",
            "2015-SEQ-002_R1.fastq",
            "SampleSheet.csv",
        ] {
            fs::write(reads.path().join(file), "").unwrap();
        }
        let config = ReaderConfig {
            path: base.path().to_path_buf(),
            ..ReaderConfig::default()
        };

        let mut samples = build_samples(&config, reads.path()).unwrap();
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["2015-SEQ-001", "2015-SEQ-002"]);

        let general = samples[0].metadata.attrs("general").unwrap();
        match general.get("fastqfiles") {
            serde_json::Value::Array(files) => assert_eq!(files.len(), 2),
            other => panic!("unexpected fastqfiles {:?}", other),
        }
        assert!(base.path().join("2015-SEQ-002").is_dir());
    }
}
