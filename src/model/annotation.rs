use std::borrow::Cow;
use std::fmt;

use crate::color::{Rgb, resolve_tag};
use crate::config::ExtractConfig;
use crate::template::{Context, Template, Value};

use super::Document;

/// Kind of annotation, as named by the source format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AnnotationKind {
    #[default]
    Highlight,
    /// Sticky note / free-floating comment.
    Text,
    /// Any other source subtype, kept verbatim (`Underline`, `Squiggly`, ...).
    Other(String),
}

impl AnnotationKind {
    /// Map a source subtype name onto a kind.
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype {
            "Highlight" => Self::Highlight,
            "Text" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Highlight => "Highlight",
            Self::Text => "Text",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized highlight or note.
///
/// Built once by an extractor and read-only afterwards. The tag is resolved
/// from the color when the annotation is built; use [`Annotation::with_color`]
/// to get a copy with a different color and a freshly resolved tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    file: String,
    kind: AnnotationKind,
    quote: String,
    note: String,
    page: u32,
    color: Rgb,
    tag: String,
}

impl Annotation {
    /// Start building an annotation found in `file`.
    pub fn builder(file: impl Into<String>) -> AnnotationBuilder {
        AnnotationBuilder::new(file)
    }

    /// Path of the file the annotation was extracted from.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    /// Text selected on the page.
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Text typed by the reader.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// 1-based page number, or 0 when unknown.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// True when there is neither a quote nor a note.
    pub fn is_empty(&self) -> bool {
        self.quote.is_empty() && self.note.is_empty()
    }

    /// Copy of this annotation with another color; the tag is re-derived.
    pub fn with_color(&self, color: Rgb, config: &ExtractConfig) -> Self {
        Self {
            color,
            tag: resolve_tag(&color, config),
            ..self.clone()
        }
    }

    /// Render through `template`, with `doc.*` fields taken from `document`.
    pub fn render(&self, template: &Template, document: &Document) -> String {
        template.render(&RenderContext {
            annotation: self,
            document,
        })
    }

    /// Like [`Annotation::render`], passing every substituted value through `escape`.
    pub fn render_with(
        &self,
        template: &Template,
        document: &Document,
        escape: fn(&str) -> Cow<'_, str>,
    ) -> String {
        template.render_with(
            &RenderContext {
                annotation: self,
                document,
            },
            escape,
        )
    }
}

struct RenderContext<'a> {
    annotation: &'a Annotation,
    document: &'a Document,
}

impl Context for RenderContext<'_> {
    fn lookup(&self, name: &str) -> Option<Value<'_>> {
        let a = self.annotation;
        match name {
            "file" => Some(Value::from(a.file.as_str())),
            "quote" => Some(Value::from(a.quote.as_str())),
            "note" => Some(Value::from(a.note.as_str())),
            "page" => Some(Value::Number(a.page)),
            "tag" => Some(Value::from(a.tag.as_str())),
            "type" => Some(Value::from(a.kind.as_str())),
            _ => name
                .strip_prefix("doc.")
                .and_then(|field| self.document.get(field))
                .map(Value::from),
        }
    }
}

/// Builder for [`Annotation`].
#[derive(Debug, Clone)]
pub struct AnnotationBuilder {
    file: String,
    kind: AnnotationKind,
    quote: String,
    note: String,
    page: u32,
    color: Rgb,
    tag: Option<String>,
}

impl AnnotationBuilder {
    fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: AnnotationKind::Highlight,
            quote: String::new(),
            note: String::new(),
            page: 0,
            color: Rgb::BLACK,
            tag: None,
        }
    }

    pub fn kind(mut self, kind: AnnotationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = quote.into();
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Use this tag instead of the one derived from the color.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn build(self, config: &ExtractConfig) -> Annotation {
        let tag = match self.tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => resolve_tag(&self.color, config),
        };
        Annotation {
            file: self.file,
            kind: self.kind,
            quote: self.quote,
            note: self.note,
            page: self.page,
            color: self.color,
            tag,
        }
    }
}
