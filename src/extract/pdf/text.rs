//! Positioned page text.
//!
//! Runs the text operators of a page content stream and records where every
//! glyph ends up in default user space, which is the space annotation
//! rectangles are given in. Only the state needed for placement is tracked.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::font::{Font, load_fonts};
use super::{number, resolve};

/// Form XObjects nested deeper than this are not followed.
const MAX_FORM_DEPTH: u8 = 8;

/// A `TJ` adjustment beyond this many thousandths of an em reads as a space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Affine transformation `[a b c d e f]`.
///
/// Row-vector convention: `m1.multiply(&m2)` applies `m1`, then `m2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let n: Vec<f32> = operands.iter().filter_map(number).collect();
        (n.len() == 6).then(|| Self {
            a: n[0],
            b: n[1],
            c: n[2],
            d: n[3],
            e: n[4],
            f: n[5],
        })
    }

    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// Axis-aligned rectangle in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Rect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Rect {
    /// Rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Bounding box of a list of points `x0 y0 x1 y1 ...`.
    pub fn bounding(points: &[f32]) -> Option<Self> {
        if points.len() < 4 {
            return None;
        }
        let xs = points.iter().step_by(2);
        let ys = points.iter().skip(1).step_by(2);
        let (x0, x1) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), &x| (lo.min(x), hi.max(x)));
        let (y0, y1) = ys.fold((f32::MAX, f32::MIN), |(lo, hi), &y| (lo.min(y), hi.max(y)));
        Some(Self { x0, y0, x1, y1 })
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// One shown glyph in user space.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Glyph {
    pub text: String,
    /// Left and right edge of the advance box.
    pub x0: f32,
    pub x1: f32,
    pub baseline: f32,
    /// Height of one em.
    pub size: f32,
}

impl Glyph {
    /// Reference point used to decide whether the glyph lies in a region.
    fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, self.baseline + 0.3 * self.size)
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// All glyphs on a page, in content stream order.
#[derive(Debug, Clone, Default)]
pub(super) struct PageText {
    glyphs: Vec<Glyph>,
}

impl PageText {
    /// Lay out the text of a page.
    pub fn read(doc: &Document, page_id: ObjectId) -> lopdf::Result<Self> {
        let content = doc.get_page_content(page_id)?;
        let resources = page_resources(doc, page_id);
        let mut layout = Layout::new(doc);
        layout.run(&content, resources, Matrix::IDENTITY, 0)?;
        Ok(Self {
            glyphs: layout.glyphs,
        })
    }

    #[cfg(test)]
    fn from_glyphs(glyphs: Vec<Glyph>) -> Self {
        Self { glyphs }
    }

    /// Text of the glyphs whose center lies in any of `regions`.
    ///
    /// Glyphs on different baselines are joined with a line break, visible
    /// gaps on the same line with a space.
    pub fn text_in(&self, regions: &[Rect]) -> String {
        let mut text = String::new();
        let mut previous: Option<&Glyph> = None;
        for glyph in &self.glyphs {
            let (cx, cy) = glyph.center();
            if !regions.iter().any(|r| r.contains(cx, cy)) {
                continue;
            }
            if let Some(prev) = previous {
                let em = prev.size.max(glyph.size);
                if (glyph.baseline - prev.baseline).abs() > em / 2.0 {
                    text.push('\n');
                } else if !prev.is_blank()
                    && !glyph.is_blank()
                    && glyph.x0 - prev.x1 > 0.15 * em
                {
                    text.push(' ');
                }
            }
            text.push_str(&glyph.text);
            previous = Some(glyph);
        }
        text
    }
}

/// The page's resource dictionary, inherited through `/Parent` if needed.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(obj) = node.get(b"Resources") {
            return resolve(doc, obj).as_dict().ok();
        }
        node = resolve(doc, node.get(b"Parent").ok()?).as_dict().ok()?;
    }
    None
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
    leading: f32,
    rise: f32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

fn current_font<'f>(
    fonts: &'f HashMap<Vec<u8>, Font>,
    fallback: &'f Font,
    state: &GraphicsState,
) -> &'f Font {
    state
        .font
        .as_ref()
        .and_then(|name| fonts.get(name))
        .unwrap_or(fallback)
}

struct Layout<'a> {
    doc: &'a Document,
    glyphs: Vec<Glyph>,
}

impl<'a> Layout<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            glyphs: Vec::new(),
        }
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: u8,
    ) -> lopdf::Result<()> {
        let content = Content::decode(content)?;
        let fonts = resources
            .map(|r| load_fonts(self.doc, r))
            .unwrap_or_default();
        let fallback = Font::fallback();

        let mut state = GraphicsState::new(ctm);
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);
            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    state.font = match operands.first() {
                        Some(Object::Name(name)) => Some(name.clone()),
                        _ => None,
                    };
                    state.font_size = num(1);
                }
                "Tc" => state.char_spacing = num(0),
                "Tw" => state.word_spacing = num(0),
                "Tz" => state.horizontal_scaling = num(0) / 100.0,
                "TL" => state.leading = num(0),
                "Ts" => state.rise = num(0),
                "Td" => {
                    tlm = Matrix::translation(num(0), num(1)).multiply(&tlm);
                    tm = tlm;
                }
                "TD" => {
                    state.leading = -num(1);
                    tlm = Matrix::translation(num(0), num(1)).multiply(&tlm);
                    tm = tlm;
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -state.leading).multiply(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let font = current_font(&fonts, &fallback, &state);
                        self.show(bytes, font, &state, &mut tm);
                    }
                }
                "'" => {
                    tlm = Matrix::translation(0.0, -state.leading).multiply(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let font = current_font(&fonts, &fallback, &state);
                        self.show(bytes, font, &state, &mut tm);
                    }
                }
                "\"" => {
                    state.word_spacing = num(0);
                    state.char_spacing = num(1);
                    tlm = Matrix::translation(0.0, -state.leading).multiply(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        let font = current_font(&fonts, &fallback, &state);
                        self.show(bytes, font, &state, &mut tm);
                    }
                }
                "TJ" => {
                    let Some(Object::Array(items)) = operands.first() else {
                        continue;
                    };
                    let font = current_font(&fonts, &fallback, &state);
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes, font, &state, &mut tm),
                            other => {
                                let Some(adjust) = number(other) else {
                                    continue;
                                };
                                if adjust < -TJ_SPACE_THRESHOLD {
                                    self.push_space(&state, &tm);
                                }
                                let tx = -adjust / 1000.0 * state.font_size * state.horizontal_scaling;
                                tm = Matrix::translation(tx, 0.0).multiply(&tm);
                            }
                        }
                    }
                }
                "Do" if depth < MAX_FORM_DEPTH => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.run_form(name, resources, &state, depth)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Rendering matrix for the current text position.
    fn rendering_matrix(state: &GraphicsState, tm: &Matrix) -> Matrix {
        let font_matrix = Matrix {
            a: state.font_size * state.horizontal_scaling,
            b: 0.0,
            c: 0.0,
            d: state.font_size,
            e: 0.0,
            f: state.rise,
        };
        font_matrix.multiply(tm).multiply(&state.ctm)
    }

    fn show(&mut self, bytes: &[u8], font: &Font, state: &GraphicsState, tm: &mut Matrix) {
        for code in font.decode(bytes) {
            let trm = Self::rendering_matrix(state, tm);
            let (x0, baseline) = trm.transform_point(0.0, 0.0);
            let (x1, _) = trm.transform_point(code.width, 0.0);
            let (_, top) = trm.transform_point(0.0, 1.0);

            if !code.text.chars().all(char::is_control) {
                self.glyphs.push(Glyph {
                    text: code.text.clone(),
                    x0: x0.min(x1),
                    x1: x0.max(x1),
                    baseline,
                    size: (top - baseline).abs(),
                });
            }

            let mut advance = code.width * state.font_size + state.char_spacing;
            if font.is_word_space(code.code) {
                advance += state.word_spacing;
            }
            *tm = Matrix::translation(advance * state.horizontal_scaling, 0.0).multiply(tm);
        }
    }

    fn push_space(&mut self, state: &GraphicsState, tm: &Matrix) {
        let trm = Self::rendering_matrix(state, tm);
        let (x, baseline) = trm.transform_point(0.0, 0.0);
        let (_, top) = trm.transform_point(0.0, 1.0);
        self.glyphs.push(Glyph {
            text: " ".to_string(),
            x0: x,
            x1: x,
            baseline,
            size: (top - baseline).abs(),
        });
    }

    fn run_form(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        state: &GraphicsState,
        depth: u8,
    ) -> lopdf::Result<()> {
        let doc = self.doc;
        let Some(xobjects) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|o| resolve(doc, o).as_dict().ok())
        else {
            return Ok(());
        };
        let Some(Object::Stream(stream)) = xobjects.get(name).ok().map(|o| resolve(doc, o)) else {
            return Ok(());
        };
        let is_form = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Form");
        if !is_form {
            return Ok(());
        }

        let matrix = match stream.dict.get(b"Matrix").map(|o| resolve(doc, o)) {
            Ok(Object::Array(items)) => Matrix::from_operands(items).unwrap_or(Matrix::IDENTITY),
            _ => Matrix::IDENTITY,
        };
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .or(resources);
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        self.run(&data, form_resources, matrix.multiply(&state.ctm), depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(content: &[u8]) -> PageText {
        let doc = Document::with_version("1.5");
        let mut layout = Layout::new(&doc);
        layout.run(content, None, Matrix::IDENTITY, 0).unwrap();
        PageText::from_glyphs(layout.glyphs)
    }

    #[test]
    fn test_matrix_order() {
        let scale = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        let m = Matrix::translation(10.0, 0.0).multiply(&scale);
        assert_eq!(m.transform_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_glyph_positions() {
        let page = layout(b"BT /F1 10 Tf 100 700 Td (Hi) Tj ET");
        assert_eq!(page.glyphs.len(), 2);
        assert_eq!(page.glyphs[0].x0, 100.0);
        assert_eq!(page.glyphs[0].x1, 105.0);
        assert_eq!(page.glyphs[1].x0, 105.0);
        assert_eq!(page.glyphs[1].baseline, 700.0);
        assert_eq!(page.glyphs[1].size, 10.0);
    }

    #[test]
    fn test_text_in_region() {
        let page = layout(b"BT /F1 10 Tf 100 700 Td (Hello) Tj 0 -20 Td (World) Tj ET");
        let first_line = Rect::from_corners(95.0, 695.0, 130.0, 712.0);
        assert_eq!(page.text_in(&[first_line]), "Hello");

        let both = Rect::from_corners(130.0, 712.0, 95.0, 675.0);
        assert_eq!(page.text_in(&[both]), "Hello\nWorld");

        let nowhere = Rect::from_corners(0.0, 0.0, 10.0, 10.0);
        assert_eq!(page.text_in(&[nowhere]), "");
    }

    #[test]
    fn test_tj_kerning_inserts_space() {
        let page = layout(b"BT /F1 10 Tf 0 0 Td [(ab) -50 (c) -400 (de)] TJ ET");
        let all = Rect::from_corners(-10.0, -10.0, 200.0, 20.0);
        assert_eq!(page.text_in(&[all]), "abc de");
    }

    #[test]
    fn test_cm_and_state_restore() {
        let page = layout(b"q 1 0 0 1 50 0 cm BT /F1 10 Tf 0 0 Td (a) Tj ET Q BT /F1 10 Tf 0 0 Td (b) Tj ET");
        assert_eq!(page.glyphs[0].x0, 50.0);
        assert_eq!(page.glyphs[1].x0, 0.0);
    }

    #[test]
    fn test_leading_operators() {
        let page = layout(b"BT /F1 10 Tf 12 TL 0 100 Td (a) Tj T* (b) Tj (c) ' ET");
        let baselines: Vec<f32> = page.glyphs.iter().map(|g| g.baseline).collect();
        assert_eq!(baselines, vec![100.0, 88.0, 76.0]);
    }

    #[test]
    fn test_quad_point_bounds() {
        let r = Rect::bounding(&[10.0, 20.0, 50.0, 20.0, 10.0, 5.0, 50.0, 5.0]).unwrap();
        assert!(r.contains(30.0, 10.0));
        assert!(!r.contains(30.0, 25.0));
        assert_eq!(Rect::bounding(&[1.0, 2.0]), None);
    }
}
