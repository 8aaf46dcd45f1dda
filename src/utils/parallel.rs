use log::{debug, warn};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallelError {
    #[error("Thread error: {0}")]
    ThreadError(String),

    #[error("Invalid thread count: {0}")]
    InvalidThreadCount(usize),
}

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig {
            threads: rayon::current_num_threads(),
        }
    }
}

/// Build a dedicated rayon pool for the configured thread count
pub fn build_pool(config: &ParallelConfig) -> Result<rayon::ThreadPool, ParallelError> {
    if config.threads == 0 {
        return Err(ParallelError::InvalidThreadCount(0));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| ParallelError::ThreadError(format!("Failed to build thread pool: {}", e)))
}

/// Map `processor` over `items`, returning results in input order.
///
/// Runs sequentially for a single thread, or when a pool cannot be built.
pub fn ordered_map<T, U, F>(items: Vec<T>, processor: F, config: &ParallelConfig) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(T) -> U + Send + Sync,
{
    if config.threads <= 1 || items.len() <= 1 {
        return items.into_iter().map(processor).collect();
    }

    match build_pool(config) {
        Ok(pool) => {
            debug!(
                "Processing {} items on {} threads",
                items.len(),
                config.threads
            );
            pool.install(|| items.into_par_iter().map(processor).collect())
        }
        Err(e) => {
            warn!("{}; processing sequentially", e);
            items.into_iter().map(processor).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_map_preserves_order() {
        let items: Vec<usize> = (0..200).collect();
        let config = ParallelConfig { threads: 4 };
        let results = ordered_map(items, |i| i * 2, &config);
        assert_eq!(results, (0..200).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_ordered_map_single_thread() {
        let config = ParallelConfig { threads: 1 };
        let results = ordered_map(vec!["a", "b"], |s| s.to_uppercase(), &config);
        assert_eq!(results, vec!["A", "B"]);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = ParallelConfig { threads: 0 };
        assert!(matches!(
            build_pool(&config),
            Err(ParallelError::InvalidThreadCount(0))
        ));
        // A single-item batch never needs a pool.
        assert_eq!(ordered_map(vec![1], |i| i + 1, &config), vec![2]);
    }
}
