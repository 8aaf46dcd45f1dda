//! Small helpers shared by the pipeline stages.

pub mod filer;
pub mod parallel;
pub mod progress;

pub use filer::{sample_names, SampleNamer};
pub use parallel::{ordered_map, ParallelConfig, ParallelError};
pub use progress::ProgressDots;

use log::info;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// Create a directory and its parents; an existing directory is not an error.
pub fn make_path(path: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Log a message together with the time elapsed since `start`.
pub fn log_elapsed(message: &str, start: Instant) {
    info!(
        "[Elapsed Time: {:.2} seconds] {}",
        start.elapsed().as_secs_f64(),
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_make_path_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        make_path(&nested).unwrap();
        make_path(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
