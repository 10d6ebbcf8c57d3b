use std::borrow::Cow;

use crate::model::AnnotatedDocument;
use crate::template::Template;

use super::Formatter;

/// Column names, in row order.
pub const CSV_HEADER: &str = "type,tag,page,quote,note,author,title,ref,file";

const ROW_TEMPLATE: &str = "{{type}},{{tag}},{{page}},\"{{quote}}\",\"{{note}}\",\
    \"{{doc.author}}\",\"{{doc.title}}\",\"{{doc.ref}}\",\"{{file}}\"";

/// One CSV row per annotation, text fields quoted.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    template: Template,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self {
            template: Template::new(ROW_TEMPLATE),
        }
    }
}

/// Double embedded quotes so quoted fields stay intact.
fn escape_quotes(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "\"\""))
    } else {
        Cow::Borrowed(value)
    }
}

impl Formatter for CsvFormatter {
    fn format_document(&self, doc: &AnnotatedDocument) -> String {
        doc.annotations
            .iter()
            .map(|a| a.render_with(&self.template, &doc.document, escape_quotes))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(&self) -> Option<String> {
        Some(CSV_HEADER.to_string())
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

    #[test]
    fn test_csv() {
        let config = ExtractConfig::default();
        let doc = AnnotatedDocument::new(
            Document::new()
                .with_field("author", "document-author")
                .with_field("title", "document-title"),
            vec![
                Annotation::builder("myfile.pdf")
                    .quote("my lovely text")
                    .build(&config),
                Annotation::builder("myfile.pdf")
                    .quote("my second text")
                    .note("with note")
                    .build(&config),
            ],
        );
        let expected = "type,tag,page,quote,note,author,title,ref,file\n\
            Highlight,,0,\"my lovely text\",\"\",\"document-author\",\
            \"document-title\",\"\",\"myfile.pdf\"\n\
            Highlight,,0,\"my second text\",\"with note\",\"document-author\",\
            \"document-title\",\"\",\"myfile.pdf\"";
        assert_eq!(CsvFormatter::new().format(&[doc]), expected);
    }

    #[test]
    fn test_header_only_without_rows() {
        let doc = AnnotatedDocument::new(Document::new(), Vec::new());
        assert_eq!(CsvFormatter::new().format(&[doc.clone()]), CSV_HEADER);
        assert_eq!(CsvFormatter::new().format_document(&doc), "");
        assert_eq!(CsvFormatter::new().format(&[]), CSV_HEADER);
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        let config = ExtractConfig::default();
        let doc = AnnotatedDocument::new(
            Document::new(),
            vec![Annotation::builder("f").quote("say \"hi\"").build(&config)],
        );
        assert_eq!(
            CsvFormatter::new().format_document(&doc),
            "Highlight,,0,\"say \"\"hi\"\"\",\"\",\"\",\"\",\"\",\"f\""
        );
    }
}
