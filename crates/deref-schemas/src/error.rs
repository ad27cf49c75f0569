//! Error types for dereferencing operations
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Result type for dereferencing operations
pub type DerefResult<T> = Result<T, DerefError>;

/// Fatal outcomes of a dereferencing call.
///
/// Loader failures never show up here: a document that cannot be read or
/// parsed degrades to a missing reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerefError {
    /// The input could not be converted into a JSON tree or fingerprinted
    #[error("Failed to serialize input document: {message}")]
    Serialization { message: String },

    /// A reference chain revisits a destination that is still being resolved
    #[error("{message}")]
    CircularReference { message: String, refs: Vec<String> },

    /// A reference could not be resolved and `fail_on_missing` is set
    #[error("Missing $ref: {reference}")]
    MissingReference { reference: String },
}

impl DerefError {
    /// Create a serialization error
    pub fn serialization(error: impl std::fmt::Display) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }

    /// Create a circular reference error reported by the static pre-check
    pub fn self_reference(from: Option<(&str, &str)>) -> Self {
        let message = match from {
            Some((from, to)) => format!("Circular self reference from {} to {}", from, to),
            None => "Circular self reference".to_string(),
        };
        Self::CircularReference {
            message,
            refs: Vec::new(),
        }
    }

    /// Create a circular reference error from the values collected during traversal
    pub fn circular(refs: Vec<String>) -> Self {
        Self::CircularReference {
            message: format!("circular references found: {}", refs.join(",")),
            refs,
        }
    }

    /// Create a missing reference error
    pub fn missing(reference: impl Into<String>) -> Self {
        Self::MissingReference {
            reference: reference.into(),
        }
    }

    /// Check if this is a circular reference error
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularReference { .. })
    }

    /// Check if this is a missing reference error
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingReference { .. })
    }

    /// The reference values involved in this error, if any
    pub fn references(&self) -> &[String] {
        match self {
            Self::CircularReference { refs, .. } => refs,
            Self::MissingReference { reference } => std::slice::from_ref(reference),
            Self::Serialization { .. } => &[],
        }
    }
}
