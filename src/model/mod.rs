//! Core data model for annotation extraction.
//!
//! This module contains:
//! - The normalized [`Annotation`] record and its kind
//! - Library entries ([`Document`]) and their pairing with annotations

mod annotation;
mod document;

// Re-export annotation types
pub use annotation::{Annotation, AnnotationBuilder, AnnotationKind};

// Re-export document types
pub use document::{AnnotatedDocument, Document, INFO_FILE_NAME};
