use crate::model::{AnnotatedDocument, Document};
use crate::template::Template;

use super::Formatter;

const ANNOTATION_TEMPLATE: &str = "{{#tag}}#{{tag}}\n{{/tag}}\
    {{#quote}}> {{quote}}{{/quote}}{{#page}} [p. {{page}}]{{/page}}\
    {{#note}}\n  NOTE: {{note}}{{/note}}";

/// How document headings are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// `# Title - Author`
    Atx,
    /// Title line framed by `===   ---` rules.
    #[default]
    Setext,
}

/// Markdown: a heading per document, then one quote block per annotation.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    style: HeadingStyle,
    template: Template,
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new(HeadingStyle::default())
    }
}

impl MarkdownFormatter {
    pub fn new(style: HeadingStyle) -> Self {
        Self {
            style,
            template: Template::new(ANNOTATION_TEMPLATE),
        }
    }

    fn heading(&self, document: &Document) -> String {
        let (title, author) = match (document.get("title"), document.get("author")) {
            (None, None) => (document.describe(), String::new()),
            (title, author) => (title.unwrap_or_default(), author.unwrap_or_default()),
        };
        let text = [title.as_str(), author.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ");

        match self.style {
            HeadingStyle::Atx => format!("# {text}"),
            HeadingStyle::Setext => {
                let mut rule = "=".repeat(title.chars().count());
                if !author.is_empty() {
                    if !rule.is_empty() {
                        rule.push_str("   ");
                    }
                    rule.push_str(&"-".repeat(author.chars().count()));
                }
                format!("{rule}\n{text}\n{rule}")
            }
        }
    }
}

impl Formatter for MarkdownFormatter {
    fn format_document(&self, doc: &AnnotatedDocument) -> String {
        if doc.annotations.is_empty() {
            return String::new();
        }

        let blocks: Vec<String> = doc
            .annotations
            .iter()
            .map(|a| a.render(&self.template, &doc.document))
            .collect();

        let mut output = self.heading(&doc.document);
        output.push_str("\n\n");
        output.push_str(&blocks.join("\n\n"));
        output.truncate(output.trim_end().len());
        output
    }

    fn separator(&self) -> &str {
        "\n\n"
    }
}
