//! Deciding what is quote and what is note.
//!
//! A PDF annotation carries two pieces of text: what the reader typed into
//! it, and what is printed on the page under its rectangle. Sometimes the
//! viewer copies the selection into the typed note, sometimes the reader
//! adds a comment, sometimes there is only one of the two.

use crate::similarity::ratio;

/// Collapse line breaks and runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split raw annotation text into `(quote, note)`.
///
/// `typed` is the annotation's own content, `written` the page text under
/// it. Rules, first match wins:
///
/// 1. both present and `ratio > threshold`: the typed text is the quote
/// 2. both present: written is the quote, typed is the note
/// 3. only typed: a free-floating note
/// 4. only written: a plain highlight
/// 5. neither: both empty, the caller drops the record
///
/// # Examples
///
/// ```
/// use marginalia::extract::resolve_content;
///
/// let (quote, note) = resolve_content("a remark", "the printed line", 0.9);
/// assert_eq!(quote, "the printed line");
/// assert_eq!(note, "a remark");
/// ```
pub fn resolve_content(typed: &str, written: &str, threshold: f64) -> (String, String) {
    let typed = normalize_whitespace(typed);
    let written = normalize_whitespace(written);

    match (typed.is_empty(), written.is_empty()) {
        (false, false) if ratio(&typed, &written) > threshold => (typed, String::new()),
        (false, false) => (written, typed),
        (false, true) => (String::new(), typed),
        (true, false) => (written, String::new()),
        (true, true) => (String::new(), String::new()),
    }
}
