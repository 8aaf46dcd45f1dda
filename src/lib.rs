//! Per-sample metadata bookkeeping for an assembly pipeline.
//!
//! Pipeline stages record facts about each sample in a
//! [`HierarchicalRecord`](metadata::HierarchicalRecord). Between runs the
//! records are persisted as JSON snapshots, and
//! [`MetadataReader`](pipeline::MetadataReader) reconciles a fresh run with
//! what an earlier run left on disk.

pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod utils;

pub use config::ReaderConfig;
pub use metadata::{AttributeStore, AutoVivifyingMap, HierarchicalRecord, MetadataError};
pub use pipeline::{MetadataReader, Reconciled, RecordSource, Sample};
