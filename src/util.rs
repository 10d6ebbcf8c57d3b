//! Utility functions shared by the extractors.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the start of a file for content sniffing.
const SNIFF_LEN: usize = 8192;

/// Read up to the first 8 KiB of a file.
pub fn read_head(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

/// Detect a MIME type from magic bytes.
pub fn sniff_mime(head: &[u8]) -> Option<&'static str> {
    infer::get(head).map(|kind| kind.mime_type())
}

/// Read the head of `path` for sniffing, logging when it cannot be read.
///
/// Missing and unreadable files are reported as errors and treated as
/// unusable by every extractor.
pub fn readable_head(path: &Path) -> Option<Vec<u8>> {
    if !path.is_file() {
        log::error!("File {} not readable.", path.display());
        return None;
    }
    match read_head(path) {
        Ok(head) => Some(head),
        Err(e) => {
            log::error!("File {} not readable: {e}", path.display());
            None
        }
    }
}

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Read the `encoding="..."` value of an XML declaration, if any.
pub fn xml_declared_encoding(head: &[u8]) -> Option<String> {
    let end = memchr::memmem::find(head, b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    if !decl.trim_start_matches('\u{feff}').starts_with("<?xml") {
        return None;
    }
    let start = decl.find("encoding=")? + "encoding=".len();
    let rest = &decl[start..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| value[..end].to_string())
}

/// Resolve an XML entity reference body (without `&` and `;`).
pub fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok())
    };
    code.and_then(char::from_u32).map(|c| c.to_string())
}
