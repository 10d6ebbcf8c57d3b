//! Output formatters.
//!
//! A [`Formatter`] renders one [`AnnotatedDocument`] at a time; [`Formatter::format`]
//! stitches a whole batch together. Formatters are chosen by name through
//! [`FormatterKind`].
//!
//! # Example
//!
//! ```
//! use marginalia::format::FormatterKind;
//! use marginalia::model::{AnnotatedDocument, Document};
//!
//! let formatter = "count".parse::<FormatterKind>()?.build();
//! let docs = [AnnotatedDocument::new(Document::new(), Vec::new())];
//! assert_eq!(formatter.format(&docs), "");
//! # Ok::<(), marginalia::Error>(())
//! ```

mod count;
mod csv;
mod markdown;

pub use count::CountFormatter;
pub use csv::{CSV_HEADER, CsvFormatter};
pub use markdown::{HeadingStyle, MarkdownFormatter};

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::AnnotatedDocument;

/// Renders annotated documents as text.
pub trait Formatter {
    /// Text for a single document; empty when it has no annotations.
    fn format_document(&self, doc: &AnnotatedDocument) -> String;

    /// Line emitted once before the whole batch.
    fn header(&self) -> Option<String> {
        None
    }

    /// Text placed between two non-empty documents.
    fn separator(&self) -> &str;

    /// Render a batch: header, then non-empty documents joined by the separator.
    fn format(&self, docs: &[AnnotatedDocument]) -> String {
        let body = docs
            .iter()
            .map(|doc| self.format_document(doc))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(self.separator());
        match self.header() {
            Some(header) if body.is_empty() => header,
            Some(header) => format!("{header}\n{body}"),
            None => body,
        }
    }
}

/// Selectable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatterKind {
    /// Markdown with Setext headings.
    #[default]
    Markdown,
    MarkdownAtx,
    MarkdownSetext,
    Count,
    Csv,
}

impl FormatterKind {
    pub const ALL: [FormatterKind; 5] = [
        FormatterKind::Markdown,
        FormatterKind::MarkdownAtx,
        FormatterKind::MarkdownSetext,
        FormatterKind::Count,
        FormatterKind::Csv,
    ];

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            FormatterKind::Markdown => "markdown",
            FormatterKind::MarkdownAtx => "markdown-atx",
            FormatterKind::MarkdownSetext => "markdown-setext",
            FormatterKind::Count => "count",
            FormatterKind::Csv => "csv",
        }
    }

    pub fn build(self) -> Box<dyn Formatter> {
        match self {
            FormatterKind::Markdown | FormatterKind::MarkdownSetext => {
                Box::new(MarkdownFormatter::new(HeadingStyle::Setext))
            }
            FormatterKind::MarkdownAtx => Box::new(MarkdownFormatter::new(HeadingStyle::Atx)),
            FormatterKind::Count => Box::new(CountFormatter),
            FormatterKind::Csv => Box::new(CsvFormatter::new()),
        }
    }
}

impl FromStr for FormatterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::model::{Annotation, Document};

    #[test]
    fn test_parse_names() {
        for kind in FormatterKind::ALL {
            assert_eq!(kind.name().parse::<FormatterKind>().unwrap(), kind);
        }
        let err = "html".parse::<FormatterKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(name) if name == "html"));
    }

    #[test]
    fn test_batch_skips_empty_documents() {
        let config = ExtractConfig::default();
        let doc = |title: &str, n: usize| {
            let annotations = (0..n)
                .map(|i| Annotation::builder("f").quote(format!("q{i}")).build(&config))
                .collect();
            AnnotatedDocument::new(Document::new().with_field("title", title), annotations)
        };
        let docs = [doc("a", 1), doc("empty", 0), doc("b", 2)];
        assert_eq!(FormatterKind::Count.build().format(&docs), "a: 1\nb: 2");
    }
}
