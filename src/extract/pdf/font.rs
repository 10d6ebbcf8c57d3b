//! Font decoding for page text.
//!
//! Only what is needed to place glyphs roughly and to turn string bytes into
//! Unicode: glyph widths, code width (one or two bytes) and the `/ToUnicode`
//! CMap. Fonts without a CMap fall back to Windows-1252 (simple fonts) or
//! UTF-16BE (composite fonts).

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use super::{number, resolve};

/// Glyph width used when a font carries no width table, in text space units.
const FALLBACK_WIDTH: f32 = 0.5;

/// A decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Code {
    pub code: u32,
    pub text: String,
    /// Advance in text space units (1/1000 of the glyph space width).
    pub width: f32,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Font {
    composite: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    to_unicode: HashMap<u32, String>,
}

impl Font {
    /// Font used when the named resource is missing.
    pub fn fallback() -> Self {
        Self {
            default_width: FALLBACK_WIDTH,
            ..Self::default()
        }
    }

    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict.get(b"Subtype").ok().and_then(|o| name(doc, o));
        let mut font = if subtype.as_deref() == Some(b"Type0".as_slice()) {
            Self::load_composite(doc, dict)
        } else {
            Self::load_simple(doc, dict)
        };

        if let Ok(obj) = dict.get(b"ToUnicode")
            && let Object::Stream(stream) = resolve(doc, obj)
        {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            font.to_unicode = parse_cmap(&data);
        }
        font
    }

    fn load_simple(doc: &Document, dict: &Dictionary) -> Self {
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .map_or(0, |n| n.max(0.0) as u32);
        let widths = match dict.get(b"Widths").map(|o| resolve(doc, o)) {
            Ok(Object::Array(items)) => items
                .iter()
                .map(|w| number(resolve(doc, w)).unwrap_or(0.0) / 1000.0)
                .collect(),
            _ => Vec::new(),
        };
        let missing = dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| number(resolve(doc, o)))
            .map(|w| w / 1000.0);
        let default_width = match missing {
            Some(w) if w > 0.0 => w,
            _ => FALLBACK_WIDTH,
        };
        Self {
            composite: false,
            first_char,
            widths,
            default_width,
            ..Self::default()
        }
    }

    fn load_composite(doc: &Document, dict: &Dictionary) -> Self {
        let descendant = match dict.get(b"DescendantFonts").map(|o| resolve(doc, o)) {
            Ok(Object::Array(items)) => items.first().and_then(|o| resolve(doc, o).as_dict().ok()),
            _ => None,
        };
        let mut font = Self {
            composite: true,
            default_width: 1.0,
            ..Self::default()
        };
        let Some(descendant) = descendant else {
            return font;
        };
        if let Some(dw) = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
        {
            font.default_width = dw / 1000.0;
        }
        if let Ok(Object::Array(w)) = descendant.get(b"W").map(|o| resolve(doc, o)) {
            font.cid_widths = parse_cid_widths(doc, w);
        }
        font
    }

    /// Split string bytes into character codes.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Code> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    let text = self
                        .to_unicode
                        .get(&code)
                        .cloned()
                        .unwrap_or_else(|| utf16_text(pair));
                    let width = self.cid_widths.get(&code).copied().unwrap_or(self.default_width);
                    Code { code, text, width }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| {
                    let code = u32::from(b);
                    let text = self.to_unicode.get(&code).cloned().unwrap_or_else(|| {
                        let (text, _) = encoding_rs::WINDOWS_1252
                            .decode_without_bom_handling(std::slice::from_ref(&b));
                        text.into_owned()
                    });
                    Code {
                        code,
                        text,
                        width: self.simple_width(code),
                    }
                })
                .collect()
        }
    }

    /// Whether `code` is the single-byte space that word spacing applies to.
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.composite && code == 32
    }

    fn simple_width(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

/// Fonts named in a resource dictionary, keyed by resource name.
pub(super) fn load_fonts(doc: &Document, resources: &Dictionary) -> HashMap<Vec<u8>, Font> {
    let Ok(Object::Dictionary(fonts)) = resources.get(b"Font").map(|o| resolve(doc, o)) else {
        return HashMap::new();
    };
    fonts
        .iter()
        .filter_map(|(key, value)| {
            let dict = resolve(doc, value).as_dict().ok()?;
            Some((key.clone(), Font::load(doc, dict)))
        })
        .collect()
}

fn name(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    match resolve(doc, obj) {
        Object::Name(n) => Some(n.clone()),
        _ => None,
    }
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| c.iter().fold(0u16, |acc, b| (acc << 8) | u16::from(*b)))
        .collect();
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Largest CID a `/W` entry may name.
const MAX_CID: u32 = 0xFFFF;

/// Parse a `/W` array: `c [w1 w2 ...]` or `cfirst clast w` entries.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve(doc, &items[i])) else {
            break;
        };
        let first = first.max(0.0) as u32;
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let code = u32::try_from(offset).ok().and_then(|o| first.checked_add(o));
                    if let (Some(code), Some(w)) = (code, number(resolve(doc, w))) {
                        widths.insert(code, w / 1000.0);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    items.get(i + 2).and_then(|o| number(resolve(doc, o))),
                ) else {
                    break;
                };
                let last = (last.max(0.0) as u32).min(MAX_CID);
                for code in first..=last {
                    widths.insert(code, w / 1000.0);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

#[derive(Debug, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) == Some(&b'<') => {
                tokens.push(Token::Word("<<".to_string()));
                i += 2;
            }
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                tokens.push(Token::Hex(hex_bytes(&digits)));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0);
            let lo = pair.get(1).and_then(|b| (*b as char).to_digit(16)).unwrap_or(0);
            (hi * 16 + lo) as u8
        })
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
fn parse_cmap(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize(data);
    let mut map = HashMap::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(w) if w == "beginbfchar" => {
                i += 1;
                while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_value(src), utf16_text(dst));
                    i += 2;
                }
            }
            Token::Word(w) if w == "beginbfrange" => {
                i += 1;
                while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    // a range never crosses its last byte
                    let (lo, hi) = (code_value(lo), code_value(hi));
                    let hi = hi.min(lo | 0xFF);
                    match tokens.get(i + 2) {
                        Some(Token::Hex(dst)) => {
                            let base = dst.clone();
                            for (n, code) in (lo..=hi).enumerate() {
                                map.insert(code, utf16_text(&increment(&base, n as u32)));
                            }
                            i += 3;
                        }
                        Some(Token::ArrayStart) => {
                            let mut j = i + 3;
                            let mut codes = lo..=hi;
                            while let Some(Token::Hex(dst)) = tokens.get(j) {
                                if let Some(code) = codes.next() {
                                    map.insert(code, utf16_text(dst));
                                }
                                j += 1;
                            }
                            // skip the closing bracket
                            i = j + 1;
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }
    map
}

/// Add `n` to the last UTF-16 unit of a big-endian destination string.
fn increment(base: &[u8], n: u32) -> Vec<u8> {
    let mut out = base.to_vec();
    if out.len() >= 2 {
        let last = out.len() - 2;
        let value = u32::from(u16::from_be_bytes([out[last], out[last + 1]])) + n;
        let [hi, lo] = (value as u16).to_be_bytes();
        out[last] = hi;
        out[last + 1] = lo;
    } else if let Some(byte) = out.last_mut() {
        *byte = byte.wrapping_add(n as u8);
    }
    out
}
