//! Export module for delivering formatted annotations.
//!
//! Provides the [`Exporter`] trait and its implementations:
//!
//! - [`ConsoleExporter`] writes the formatted batch to any writer (stdout by
//!   default)
//! - [`NotesExporter`] merges new annotations into each document's notes file
//!
//! # Example
//!
//! ```
//! use marginalia::export::{ConsoleExporter, Exporter};
//! use marginalia::format::FormatterKind;
//!
//! let mut out = Vec::new();
//! ConsoleExporter::with_writer(FormatterKind::Csv.build(), &mut out).export(&[])?;
//! assert_eq!(String::from_utf8(out).unwrap(), "type,tag,page,quote,note,author,title,ref,file\n");
//! # Ok::<(), marginalia::Error>(())
//! ```

mod command;
mod console;
mod dedup;
mod notes;

pub use command::{commit_files, editor_command, open_in_editor};
pub use console::ConsoleExporter;
pub use dedup::{append_blocks, drop_existing, split_blocks};
pub use notes::NotesExporter;

use crate::error::Result;
use crate::model::AnnotatedDocument;

/// Delivers a batch of annotated documents somewhere.
pub trait Exporter {
    fn export(&mut self, docs: &[AnnotatedDocument]) -> Result<()>;
}
