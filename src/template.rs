//! Minimal conditional-section templates.
//!
//! Supports just what annotation rendering needs:
//!
//! - `{{name}}` substitutes a field (missing fields render as nothing)
//! - `{{#name}}...{{/name}}` keeps its content only when the field is truthy
//! - `{{^name}}...{{/name}}` keeps its content only when the field is falsy
//!
//! A field is truthy when it is a non-empty string or a non-zero number.
//! Dotted names such as `doc.title` are passed to the context unchanged.
//!
//! # Examples
//!
//! ```
//! use marginalia::template::{Template, Value};
//!
//! let template = Template::new("{{#note}}Note: {{note}}{{/note}}{{#page}} p. {{page}}{{/page}}");
//! let rendered = template.render(&|name: &str| match name {
//!     "note" => Some(Value::from("hello")),
//!     "page" => Some(Value::Number(0)),
//!     _ => None,
//! });
//! assert_eq!(rendered, "Note: hello");
//! ```

use std::borrow::Cow;

/// A field value as seen by a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Text(Cow<'a, str>),
    Number(u32),
}

impl Value<'_> {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(text) => !text.is_empty(),
            Value::Number(n) => *n != 0,
        }
    }

    fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(text) => Cow::Borrowed(text.as_ref()),
            Value::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(text: &'a str) -> Self {
        Value::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::Text(Cow::Owned(text))
    }
}

/// Field lookup for template rendering.
pub trait Context {
    fn lookup(&self, name: &str) -> Option<Value<'_>>;
}

impl<F> Context for F
where
    F: for<'n> Fn(&'n str) -> Option<Value<'static>>,
{
    fn lookup(&self, name: &str) -> Option<Value<'_>> {
        self(name)
    }
}

/// A parsed-on-demand template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with field values inserted verbatim.
    pub fn render(&self, ctx: &dyn Context) -> String {
        self.render_with(ctx, verbatim)
    }

    /// Render, passing every substituted value through `escape`.
    ///
    /// Literal template text is never escaped.
    pub fn render_with(&self, ctx: &dyn Context, escape: fn(&str) -> Cow<'_, str>) -> String {
        let mut out = String::with_capacity(self.source.len());
        render_into(&self.source, ctx, escape, &mut out);
        out
    }
}

fn verbatim(text: &str) -> Cow<'_, str> {
    Cow::Borrowed(text)
}

fn render_into(src: &str, ctx: &dyn Context, escape: fn(&str) -> Cow<'_, str>, out: &mut String) {
    let mut rest = src;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            // Unterminated tag: keep it as literal text.
            out.push_str(&rest[open..]);
            return;
        };
        let tag = after_open[..close].trim();
        rest = &after_open[close + 2..];

        if let Some(name) = tag.strip_prefix('#').or_else(|| tag.strip_prefix('^')) {
            let name = name.trim();
            let inverted = tag.starts_with('^');
            let (inner, remainder) = split_section(rest, name);
            let truthy = ctx.lookup(name).is_some_and(|v| v.is_truthy());
            if truthy != inverted {
                render_into(inner, ctx, escape, out);
            }
            rest = remainder;
        } else if tag.starts_with('/') {
            // Stray closing tag without an opener.
        } else if let Some(value) = ctx.lookup(tag) {
            out.push_str(&escape(&value.to_text()));
        }
    }

    out.push_str(rest);
}

/// Split `src` at the `{{/name}}` closing the section that was just opened.
///
/// Returns the section body and the text after the closing tag. Nested
/// sections with the same name are skipped over. An unclosed section runs to
/// the end of the input.
fn split_section<'s>(src: &'s str, name: &str) -> (&'s str, &'s str) {
    let mut depth = 0usize;
    let mut pos = 0;

    while let Some(offset) = src[pos..].find("{{") {
        let start = pos + offset;
        let Some(len) = src[start + 2..].find("}}") else {
            break;
        };
        let tag = src[start + 2..start + 2 + len].trim();
        let end = start + 2 + len + 2;

        if let Some(closing) = tag.strip_prefix('/') {
            if closing.trim() == name {
                if depth == 0 {
                    return (&src[..start], &src[end..]);
                }
                depth -= 1;
            }
        } else if let Some(opening) = tag.strip_prefix('#').or_else(|| tag.strip_prefix('^'))
            && opening.trim() == name
        {
            depth += 1;
        }
        pos = end;
    }

    (src, "")
}
