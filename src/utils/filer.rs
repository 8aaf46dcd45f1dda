//! Sample names from sequencing file names.
//!
//! Illumina and pipeline outputs use several naming conventions for the same
//! strain; all of the following resolve to `2015-SEQ-001`:
//! `2015-SEQ-001_S1_L001_R1_001.fastq.gz`, `2015-SEQ-001_R1_001.fastq.gz`,
//! `2015-SEQ-001_R1.fastq.gz`, `2015-SEQ-001_1.fastq.gz`, `2015-SEQ-001.fastq`.

use regex::Regex;
use std::collections::BTreeSet;

/// Strips naming-convention suffixes from sequence file names.
#[derive(Debug, Clone)]
pub struct SampleNamer {
    illumina: Regex,
    pipeline: Regex,
    paired_search: Regex,
    paired_split: Regex,
    numbered: Regex,
    plain: Regex,
}

impl SampleNamer {
    pub fn new(extension: &str) -> Result<Self, regex::Error> {
        let ext = regex::escape(extension);
        Ok(SampleNamer {
            illumina: Regex::new(r"_S\d+_L001")?,
            pipeline: Regex::new(r"_R\d_001")?,
            paired_search: Regex::new(&format!(r"R\d\.{}", ext))?,
            paired_split: Regex::new(&format!(r"_R\d\.{}", ext))?,
            numbered: Regex::new(&format!(r"[-_]\d\.{}", ext))?,
            plain: Regex::new(&format!(r"\.{}", ext))?,
        })
    }

    /// The sample name for one file name.
    pub fn name(&self, file_name: &str) -> String {
        let splitter = if self.illumina.is_match(file_name) {
            &self.illumina
        } else if self.pipeline.is_match(file_name) {
            &self.pipeline
        } else if self.paired_search.is_match(file_name) {
            &self.paired_split
        } else if self.numbered.is_match(file_name) {
            &self.numbered
        } else {
            &self.plain
        };
        prefix_before(splitter, file_name).to_string()
    }
}

fn prefix_before<'a>(pattern: &Regex, text: &'a str) -> &'a str {
    match pattern.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// Distinct sample names for a set of file names, sorted.
pub fn sample_names<I, S>(files: I, extension: &str) -> Result<BTreeSet<String>, regex::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let namer = SampleNamer::new(extension)?;
    Ok(files
        .into_iter()
        .map(|file| namer.name(file.as_ref()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        let namer = SampleNamer::new("fastq").unwrap();
        assert_eq!(namer.name("2015-SEQ-001_S1_L001_R1_001.fastq.gz"), "2015-SEQ-001");
        assert_eq!(namer.name("2015-SEQ-001_R1_001.fastq.gz"), "2015-SEQ-001");
        assert_eq!(namer.name("2015-SEQ-001_R2.fastq.gz"), "2015-SEQ-001");
        assert_eq!(namer.name("2015-SEQ-001_1.fastq.gz"), "2015-SEQ-001");
        assert_eq!(namer.name("2015-SEQ-001-2.fastq"), "2015-SEQ-001");
        assert_eq!(namer.name("2015-SEQ-001.fastq"), "2015-SEQ-001");
    }

    #[test]
    fn test_unmatched_name_is_kept() {
        let namer = SampleNamer::new("fastq").unwrap();
        assert_eq!(namer.name("reads.fa"), "reads.fa");
    }

    #[test]
    fn test_sample_names_deduplicates() {
        let files = vec![
            "B_S2_L001_R1_001.fastq.gz",
            "B_S2_L001_R2_001.fastq.gz",
            "A_R1.fastq",
            "A_R2.fastq",
        ];
        let names = sample_names(files, "fastq").unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_other_extension() {
        let names = sample_names(["x_R1.fq.gz", "y.fq"], "fq").unwrap();
        assert!(names.contains("x"));
        assert!(names.contains("y"));
    }
}
