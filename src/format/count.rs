use crate::model::AnnotatedDocument;

use super::Formatter;

/// One summary line per document: `author - title: count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountFormatter;

impl Formatter for CountFormatter {
    fn format_document(&self, doc: &AnnotatedDocument) -> String {
        if doc.annotations.is_empty() {
            return String::new();
        }
        let document = &doc.document;
        let label = match (document.get("author"), document.get("title")) {
            (Some(author), Some(title)) => format!("{author} - {title}"),
            (Some(author), None) => author,
            (None, Some(title)) => title,
            (None, None) => document.describe(),
        };
        format!("{label}: {}", doc.annotations.len())
    }

    fn separator(&self) -> &str {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::model::{Annotation, Document};

    fn annotations(n: usize) -> Vec<Annotation> {
        let config = ExtractConfig::default();
        (0..n)
            .map(|_| Annotation::builder("myfile.pdf").quote("text").build(&config))
            .collect()
    }

    #[test]
    fn test_count() {
        let doc = AnnotatedDocument::new(
            Document::new()
                .with_field("author", "document-author")
                .with_field("title", "document-title"),
            annotations(2),
        );
        assert_eq!(CountFormatter.format(&[doc]), "document-author - document-title: 2");
    }

    #[test]
    fn test_count_without_author() {
        let doc = AnnotatedDocument::new(Document::new().with_field("title", "T"), annotations(3));
        assert_eq!(CountFormatter.format_document(&doc), "T: 3");
    }

    #[test]
    fn test_count_no_annotations() {
        let doc = AnnotatedDocument::new(Document::new(), Vec::new());
        assert_eq!(CountFormatter.format(&[doc]), "");
    }
}
