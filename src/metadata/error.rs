use thiserror::Error;

/// Errors raised by the metadata containers.
///
/// Most accessors never fail (they default or auto-vivify instead); these
/// cover the few operations that have a hard failure mode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("Attribute '{0}' is not present")]
    MissingKey(String),

    #[error("Category '{0}' does not hold an attribute store")]
    NotAStore(String),

    #[error("Category '{category}' cannot be serialized: {reason}")]
    Unserializable { category: String, reason: String },

    #[error("Key '{0}' holds a leaf value, not a nested map")]
    NotABranch(String),
}
