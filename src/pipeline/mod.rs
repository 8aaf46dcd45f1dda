pub mod compress;
pub mod reader;

pub use compress::{CompressionSummary, Compressor};
pub use reader::{FreshReason, MetadataReader, Reconciled, RecordSource, Sample};
