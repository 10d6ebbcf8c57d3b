//! PDF annotation extractor.
//!
//! Reads the `/Annots` of every page with lopdf. The quote of a highlight is
//! the page text under its quad points (or its rectangle); the typed
//! `/Contents` is resolved against it to split quote from note.

mod font;
mod text;

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::color::Rgb;
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::model::{Annotation, AnnotationKind};
use crate::util::{readable_head, sniff_mime};

use super::{Extractor, resolve_content};

use text::{PageText, Rect};

/// Annotation subtypes that never carry reader content.
const SKIPPED_SUBTYPES: &[&[u8]] = &[b"Link", b"Widget", b"Popup"];

/// Extractor for annotated PDF files.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_process(&self, path: &Path) -> bool {
        readable_head(path).is_some_and(|head| sniff_mime(&head) == Some("application/pdf"))
    }

    fn run(&self, path: &Path, config: &ExtractConfig) -> Result<Vec<Annotation>> {
        let doc = Document::load(path).map_err(|e| Error::extraction(path, e))?;
        let file = path.to_string_lossy();
        let mut annotations = Vec::new();

        for (page_number, page_id) in doc.get_pages() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| Error::extraction(path, e))?;
            let annots = page_annotations(&doc, page);
            if annots.is_empty() {
                continue;
            }

            let text = PageText::read(&doc, page_id).unwrap_or_else(|e| {
                log::warn!(
                    "Could not read text of page {page_number} in {}: {e}",
                    path.display()
                );
                PageText::default()
            });

            for annot in annots {
                let typed = annot
                    .get(b"Contents")
                    .ok()
                    .and_then(|o| string(&doc, o))
                    .unwrap_or_default();
                let written = text.text_in(&regions(&doc, annot));
                let (quote, note) =
                    resolve_content(&typed, &written, config.minimum_similarity_content);
                if quote.is_empty() && note.is_empty() {
                    continue;
                }

                let kind = annot
                    .get(b"Subtype")
                    .ok()
                    .and_then(|o| name(&doc, o))
                    .map(|n| AnnotationKind::from_subtype(&n))
                    .unwrap_or_default();

                annotations.push(
                    Annotation::builder(&*file)
                        .kind(kind)
                        .quote(quote)
                        .note(note)
                        .page(page_number)
                        .color(color(&doc, annot))
                        .build(config),
                );
            }
        }

        log::debug!(
            "Found {} {} for {}.",
            annotations.len(),
            if annotations.len() == 1 { "annotation" } else { "annotations" },
            path.display()
        );
        Ok(annotations)
    }
}

/// Follow indirect references to the object they point at.
fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    // Bounded so that reference cycles cannot hang the walk.
    for _ in 0..16 {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => return obj,
            },
            _ => return obj,
        }
    }
    obj
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn name(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj) {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

fn string(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj) {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn numbers(doc: &Document, obj: &Object) -> Vec<f32> {
    match resolve(doc, obj) {
        Object::Array(items) => items
            .iter()
            .filter_map(|o| number(resolve(doc, o)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else PDFDocEncoding.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (text, _, _) = encoding_rs::UTF_16BE.decode(bytes);
        return text.into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    // PDFDocEncoding agrees with Windows-1252 on everything printable that
    // shows up in practice.
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Markup annotations on a page, skipping links and form widgets.
fn page_annotations<'a>(doc: &'a Document, page: &'a Dictionary) -> Vec<&'a Dictionary> {
    let Ok(Object::Array(annots)) = page.get(b"Annots").map(|o| resolve(doc, o)) else {
        return Vec::new();
    };
    annots
        .iter()
        .filter_map(|o| resolve(doc, o).as_dict().ok())
        .filter(|annot| {
            !matches!(
                annot.get(b"Subtype").map(|o| resolve(doc, o)),
                Ok(Object::Name(n)) if SKIPPED_SUBTYPES.iter().any(|s| *s == n.as_slice())
            )
        })
        .collect()
}

/// Areas whose text belongs to the annotation.
fn regions(doc: &Document, annot: &Dictionary) -> Vec<Rect> {
    let quads: Vec<Rect> = annot
        .get(b"QuadPoints")
        .map(|o| numbers(doc, o))
        .unwrap_or_default()
        .chunks_exact(8)
        .filter_map(Rect::bounding)
        .collect();
    if !quads.is_empty() {
        return quads;
    }
    match annot.get(b"Rect").map(|o| numbers(doc, o)).as_deref() {
        Ok([x0, y0, x1, y1, ..]) => vec![Rect::from_corners(*x0, *y0, *x1, *y1)],
        _ => Vec::new(),
    }
}

/// Interior color, then border color, then black.
fn color(doc: &Document, annot: &Dictionary) -> Rgb {
    [b"IC".as_slice(), b"C".as_slice()]
        .iter()
        .filter_map(|key| annot.get(key).ok())
        .find_map(|o| Rgb::from_components(&numbers(doc, o)))
        .unwrap_or(Rgb::BLACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"plain"), "plain");
        assert_eq!(decode_text_string(b"\xFE\xFF\x00H\x00\xE9"), "H\u{e9}");
        assert_eq!(decode_text_string(b"\xEF\xBB\xBFcaf\xC3\xA9"), "caf\u{e9}");
        assert_eq!(decode_text_string(b"caf\xE9"), "caf\u{e9}");
    }

    #[test]
    fn test_color_prefers_interior() {
        let doc = Document::with_version("1.5");
        let mut annot = Dictionary::new();
        annot.set("C", vec![Object::Real(0.0), Object::Real(0.0), Object::Real(1.0)]);
        assert_eq!(color(&doc, &annot), Rgb::new(0.0, 0.0, 1.0));

        annot.set("IC", vec![Object::Integer(1), Object::Integer(0), Object::Integer(0)]);
        assert_eq!(color(&doc, &annot), Rgb::new(1.0, 0.0, 0.0));

        annot.set("IC", Vec::<Object>::new());
        assert_eq!(color(&doc, &annot), Rgb::new(0.0, 0.0, 1.0));

        assert_eq!(color(&doc, &Dictionary::new()), Rgb::BLACK);
    }

    #[test]
    fn test_regions_prefer_quad_points() {
        let doc = Document::with_version("1.5");
        let mut annot = Dictionary::new();
        annot.set(
            "Rect",
            vec![Object::Integer(200), Object::Integer(100), Object::Integer(0), Object::Integer(0)],
        );
        let rect = regions(&doc, &annot);
        assert_eq!(rect, vec![Rect::from_corners(0.0, 0.0, 200.0, 100.0)]);

        let quad: Vec<Object> = [10, 50, 90, 50, 10, 40, 90, 40, 10, 30, 60, 30, 10, 20, 60, 20]
            .into_iter()
            .map(Object::Integer)
            .collect();
        annot.set("QuadPoints", quad);
        assert_eq!(regions(&doc, &annot).len(), 2);
    }

    #[test]
    fn test_skipped_subtypes() {
        let mut doc = Document::with_version("1.5");
        let mut link = Dictionary::new();
        link.set("Subtype", Object::Name(b"Link".to_vec()));
        let mut highlight = Dictionary::new();
        highlight.set("Subtype", Object::Name(b"Highlight".to_vec()));
        let link_id = doc.add_object(link);
        let highlight_id = doc.add_object(highlight);

        let mut page = Dictionary::new();
        page.set(
            "Annots",
            vec![Object::Reference(link_id), Object::Reference(highlight_id)],
        );
        let found = page_annotations(&doc, &page);
        assert_eq!(found.len(), 1);
        assert_eq!(name(&doc, found[0].get(b"Subtype").unwrap()).as_deref(), Some("Highlight"));
    }
}
