//! PocketBook bookmark export extractor.
//!
//! PocketBook readers export highlights as an XHTML document marked with a
//! `<meta name="generator" content="PocketBook Bookmarks Export">` tag. Each
//! highlight is a bookmark block:
//!
//! ```html
//! <div class="bookmark bm-color-yellow">
//!   <p class="bm-page">12</p>
//!   <div class="bm-text"><p>highlighted passage</p></div>
//!   <div class="bm-note"><p>reader's note</p></div>
//! </div>
//! ```
//!
//! Quote and note are already separated by the format, so no content
//! resolution is needed.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::color::{Rgb, palette_color};
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::model::{Annotation, AnnotationKind};
use crate::util::{decode_text, readable_head, resolve_entity, sniff_mime, xml_declared_encoding};

use super::{Extractor, normalize_whitespace};

/// Generator signature written by the PocketBook export.
pub const GENERATOR_MARKER: &str = "PocketBook Bookmarks Export";

/// Extractor for PocketBook bookmark exports.
#[derive(Debug, Clone, Default)]
pub struct PocketBookExtractor;

impl PocketBookExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PocketBookExtractor {
    fn name(&self) -> &'static str {
        "pocketbook"
    }

    fn can_process(&self, path: &Path) -> bool {
        let Some(head) = readable_head(path) else {
            return false;
        };
        is_markup(&head) && has_generator_marker(&head)
    }

    fn run(&self, path: &Path, config: &ExtractConfig) -> Result<Vec<Annotation>> {
        let bytes = fs::read(path)?;
        let hint = xml_declared_encoding(&bytes);
        let content = decode_text(&bytes, hint.as_deref());
        let file = path.to_string_lossy();

        let annotations: Vec<Annotation> = parse_bookmarks(&content)
            .map_err(|e| Error::extraction(path, e))?
            .into_iter()
            .map(|bm| bm.into_annotation(&file, config))
            .filter(|a| !a.is_empty())
            .collect();

        log::debug!(
            "Found {} {} for {}.",
            annotations.len(),
            if annotations.len() == 1 { "annotation" } else { "annotations" },
            path.display()
        );
        Ok(annotations)
    }
}

fn is_markup(head: &[u8]) -> bool {
    match sniff_mime(head) {
        Some("text/xml") | Some("text/html") => true,
        Some(_) => false,
        None => head
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'<'),
    }
}

/// Whether the generator meta tag names the PocketBook export.
fn has_generator_marker(head: &[u8]) -> bool {
    let Some(pos) = memchr::memmem::find(head, GENERATOR_MARKER.as_bytes()) else {
        return false;
    };
    // The marker must sit inside a <meta ... name="generator"> tag.
    let tag_start = head[..pos].iter().rposition(|&b| b == b'<');
    let tag_end = head[pos..].iter().position(|&b| b == b'>').map(|e| pos + e);
    match (tag_start, tag_end) {
        (Some(start), Some(end)) => {
            let tag = String::from_utf8_lossy(&head[start..end]).to_ascii_lowercase();
            tag.starts_with("<meta") && tag.contains("generator")
        }
        _ => false,
    }
}

/// One exported bookmark, before conversion.
#[derive(Debug, Default, PartialEq)]
struct Bookmark {
    text: String,
    note: String,
    page: String,
    color: Option<String>,
}

impl Bookmark {
    fn into_annotation(self, file: &str, config: &ExtractConfig) -> Annotation {
        let color = self
            .color
            .as_deref()
            .and_then(palette_color)
            .unwrap_or(Rgb::BLACK);
        Annotation::builder(file)
            .kind(AnnotationKind::Highlight)
            .quote(normalize_whitespace(&self.text))
            .note(normalize_whitespace(&self.note))
            .page(self.page.trim().parse().unwrap_or(0))
            .color(color)
            .build(config)
    }
}

/// Where text currently being read belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Other,
    Bookmark,
    TextBox,
    NoteBox,
    Page,
    TextParagraph,
    NoteParagraph,
}

struct Frame {
    name: Vec<u8>,
    region: Region,
    opens_bookmark: bool,
}

/// Meaning of a start tag.
enum Element {
    /// A `div.bookmark`, with the name from its `bm-color-*` class.
    Bookmark(Option<String>),
    /// Any other element, and the region its text belongs to.
    Within(Region),
}

fn parse_bookmarks(content: &str) -> std::result::Result<Vec<Bookmark>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<Frame> = Vec::new();
    let mut current: Option<Bookmark> = None;
    let mut bookmarks = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let parent = stack.last().map_or(Region::Other, |f| f.region);
                let (region, opens_bookmark) = match classify(&e, parent) {
                    Element::Bookmark(color) => {
                        current = Some(Bookmark {
                            color,
                            ..Bookmark::default()
                        });
                        (Region::Bookmark, true)
                    }
                    Element::Within(region) => (region, false),
                };
                if matches!(region, Region::TextParagraph | Region::NoteParagraph)
                    && region != parent
                    && let Some(bm) = current.as_mut()
                {
                    let field = if region == Region::TextParagraph {
                        &mut bm.text
                    } else {
                        &mut bm.note
                    };
                    if !field.is_empty() {
                        field.push(' ');
                    }
                }
                stack.push(Frame {
                    name: e.local_name().as_ref().to_vec(),
                    region,
                    opens_bookmark,
                });
            }
            Event::End(e) => {
                let name = e.local_name();
                let Some(depth) = stack.iter().rposition(|f| f.name == name.as_ref()) else {
                    continue;
                };
                // Unclosed children (e.g. a bare <br>) are closed with their parent.
                for frame in stack.drain(depth..).rev() {
                    if frame.opens_bookmark
                        && let Some(bm) = current.take()
                    {
                        bookmarks.push(bm);
                    }
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"br" {
                    push_text(&stack, &mut current, " ");
                }
            }
            Event::Text(e) => {
                push_text(&stack, &mut current, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) => {
                push_text(&stack, &mut current, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    push_text(&stack, &mut current, &resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(bm) = current.take() {
        bookmarks.push(bm);
    }
    Ok(bookmarks)
}

/// Classify a start tag given its parent's region.
fn classify(e: &BytesStart<'_>, parent: Region) -> Element {
    let mut classes = String::new();
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"class" {
            classes = String::from_utf8_lossy(&attr.value).into_owned();
        }
    }
    let has_class = |name: &str| classes.split_whitespace().any(|c| c == name);
    let local = e.local_name();

    if local.as_ref() == b"div" && has_class("bookmark") {
        let color = classes
            .split_whitespace()
            .find_map(|c| c.strip_prefix("bm-color-"))
            .map(str::to_string);
        return Element::Bookmark(color);
    }

    let region = match (local.as_ref(), parent) {
        (b"div", Region::Bookmark) if has_class("bm-text") => Region::TextBox,
        (b"div", Region::Bookmark) if has_class("bm-note") => Region::NoteBox,
        (b"p", Region::Bookmark) if has_class("bm-page") => Region::Page,
        (b"p", Region::TextBox) => Region::TextParagraph,
        (b"p", Region::NoteBox) => Region::NoteParagraph,
        // Wrappers and inline markup keep their parent's region.
        _ => parent,
    };
    Element::Within(region)
}

fn push_text(stack: &[Frame], current: &mut Option<Bookmark>, text: &str) {
    let (Some(frame), Some(bm)) = (stack.last(), current.as_mut()) else {
        return;
    };
    match frame.region {
        Region::TextParagraph => bm.text.push_str(text),
        Region::NoteParagraph => bm.note.push_str(text),
        Region::Page => bm.page.push_str(text),
        _ => {}
    }
}
