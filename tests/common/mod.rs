//! Shared fixtures for integration tests.
//!
//! Documents are generated on the fly instead of being checked in, so the
//! expected quotes can be read next to the content that produces them.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Text shown on the first page, at 12pt from (72, 700).
pub const FIRST_LINE: &str = "Entropy always increases";

/// Text shown on the second page, at 12pt from (72, 500).
pub const SECOND_LINE: &str = "Second page";

/// A PocketBook export with two bookmarks, one of them carrying a note.
pub const POCKETBOOK_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<meta name="generator" content="PocketBook Bookmarks Export"/>
<title>A Mathematical Theory of Communication</title>
</head>
<body>
<div class="bookmark bm-color-cyan" id="bm1">
  <p class="bm-page">7</p>
  <div class="bm-text"><p>The fundamental problem of communication</p></div>
</div>
<div class="bookmark bm-color-green" id="bm2">
  <p class="bm-page">11</p>
  <div class="bm-text"><p>information is a measure of one&#8217;s freedom of choice</p></div>
  <div class="bm-note"><p>key idea</p></div>
</div>
</body>
</html>
"#;

fn rect(values: [f32; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real((*v).into())).collect())
}

fn rgb(r: f32, g: f32, b: f32) -> Object {
    Object::Array(vec![
        Object::Real(r.into()),
        Object::Real(g.into()),
        Object::Real(b.into()),
    ])
}

fn annotation(subtype: &str, area: [f32; 4]) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => subtype,
        "Rect" => rect(area),
    }
}

/// Build a two-page PDF with a mix of annotations and write it to `path`.
///
/// Page 1 carries, in order:
/// 1. a yellow highlight over [`FIRST_LINE`] without typed text
/// 2. a highlight over the same line with the comment `why?`
/// 3. a blue sticky note `remember this` away from any text
/// 4. a link, which is not an annotation worth extracting
/// 5. a highlight over blank space, which yields nothing
/// 6. a highlight whose typed text repeats the line
///
/// Page 2 carries a single highlight over [`SECOND_LINE`].
pub fn write_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let line_area = [70.0, 695.0, 220.0, 715.0];

    let mut plain = annotation("Highlight", line_area);
    plain.set("IC", rgb(1.0, 1.0, 0.0));

    let mut commented = annotation("Highlight", line_area);
    commented.set("Contents", Object::string_literal("why?"));

    let mut sticky = annotation("Text", [300.0, 300.0, 320.0, 320.0]);
    sticky.set("Contents", Object::string_literal("remember this"));
    sticky.set("C", rgb(0.0, 0.0, 1.0));

    let link = annotation("Link", line_area);
    let blank = annotation("Highlight", [400.0, 100.0, 450.0, 120.0]);

    let mut repeated = annotation("Highlight", line_area);
    repeated.set("Contents", Object::string_literal(FIRST_LINE));

    let first_annots: Vec<Object> = [plain, commented, sticky, link, blank, repeated]
        .into_iter()
        .map(|a| Object::Reference(doc.add_object(a)))
        .collect();
    let first = add_page(
        &mut doc,
        pages_id,
        format!("BT /F1 12 Tf 72 700 Td ({FIRST_LINE}) Tj ET"),
        first_annots,
    );

    let second_highlight = doc.add_object(annotation("Highlight", [70.0, 495.0, 160.0, 515.0]));
    let second = add_page(
        &mut doc,
        pages_id,
        format!("BT /F1 12 Tf 72 500 Td ({SECOND_LINE}) Tj ET"),
        vec![Object::Reference(second_highlight)],
    );

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(first), Object::Reference(second)],
        "Count" => Object::Integer(2),
        "Resources" => resources_id,
        "MediaBox" => rect([0.0, 0.0, 595.0, 842.0]),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).unwrap();
}

fn add_page(
    doc: &mut Document,
    parent: lopdf::ObjectId,
    content: String,
    annots: Vec<Object>,
) -> lopdf::ObjectId {
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
        "Annots" => annots,
    })
}

/// Create a library entry folder with an `info.yaml`.
pub fn write_entry(root: &Path, name: &str, info: &str) -> std::path::PathBuf {
    let folder = root.join(name);
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("info.yaml"), info).unwrap();
    folder
}
