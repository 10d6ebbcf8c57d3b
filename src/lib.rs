//! # marginalia
//!
//! Extracts highlights and notes from annotated documents of a
//! reference library and turns them into Markdown, CSV or count summaries,
//! either printed or merged into each entry's notes file.
//!
//! ## Features
//!
//! - Read annotations from PDF files and PocketBook bookmark exports
//! - Separate the selected text from the reader's own note
//! - Tag annotations by highlight color
//! - Merge new annotations into notes files without repeating old ones
//!
//! ## Quick Start
//!
//! ```no_run
//! use marginalia::{ExtractConfig, ExtractorRegistry, Library, extract_documents};
//! use marginalia::format::FormatterKind;
//!
//! let library = Library::open("/home/me/papers")?;
//! let registry = ExtractorRegistry::default();
//! let config = ExtractConfig::default();
//!
//! let docs = extract_documents(&library.query("author:shannon"), &registry.all(), &config);
//! println!("{}", FormatterKind::Markdown.build().format(&docs));
//! # Ok::<(), marginalia::Error>(())
//! ```
//!
//! ## Working with Annotations
//!
//! [`Annotation`] values are immutable. The tag is derived from the color
//! when the annotation is built:
//!
//! ```
//! use marginalia::{Annotation, ExtractConfig, Rgb};
//!
//! let config = ExtractConfig::default().with_tag("red", "important");
//! let annotation = Annotation::builder("paper.pdf")
//!     .quote("Entropy always increases")
//!     .page(3)
//!     .color(Rgb::new(0.95, 0.05, 0.0))
//!     .build(&config);
//! assert_eq!(annotation.tag(), "important");
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod extraction;
pub mod format;
pub mod library;
pub mod model;
pub mod similarity;
pub mod template;
pub(crate) mod util;

pub use color::Rgb;
pub use config::{Config, ExtractConfig};
pub use error::{Error, Result};
pub use extract::{Extractor, ExtractorRegistry};
pub use extraction::{extract_document, extract_documents};
pub use library::Library;
pub use model::{AnnotatedDocument, Annotation, AnnotationKind, Document};
