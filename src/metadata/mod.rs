//! Per-sample metadata containers.
//!
//! A sample's metadata is a [`HierarchicalRecord`]: named categories, each
//! usually an [`AttributeStore`] of lazily-defaulting attributes. Records
//! serialize to plain JSON objects for the snapshot files handled by
//! [`crate::pipeline::reader`].

pub mod autoviv;
pub mod error;
pub mod record;
pub mod store;

pub use autoviv::{AutoVivifyingMap, Node};
pub use error::MetadataError;
pub use record::{Category, HierarchicalRecord, RESERVED_PREFIX};
pub use store::{is_meaningful, is_truthy, AttributeStore, PLACEHOLDER, SENTINEL};
