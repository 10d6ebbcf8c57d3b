//! Keeping notes files free of repeated annotations.
//!
//! Formatted output is cut into blocks at blank lines. A block is considered
//! already recorded when its key line closely matches any line of the notes
//! file, so edits made to the rest of a block do not cause it to be re-added.
//! The key line is the first line that is not a `#tag` line.

use crate::similarity::matches_any;

/// Split formatted text into blocks separated by blank lines.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// `#tag` line as written by the annotation templates. ATX headings (`# x`,
/// `## x`) are not tag lines.
fn is_tag_line(line: &str) -> bool {
    line.strip_prefix('#')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace() && c != '#')
}

/// Line a block is recognized by: its first line that is not a tag line, or
/// the first line when the block holds nothing else.
fn key_line(block: &str) -> Option<&str> {
    block
        .lines()
        .find(|line| !is_tag_line(line))
        .or_else(|| block.lines().next())
}

/// Blocks whose key line is not yet present in `existing_lines`.
///
/// A line counts as present when its similarity ratio exceeds `threshold`.
/// Empty blocks are dropped as well.
pub fn drop_existing<S: AsRef<str>>(
    blocks: Vec<String>,
    existing_lines: &[S],
    threshold: f64,
) -> Vec<String> {
    blocks
        .into_iter()
        .filter(|block| match key_line(block) {
            Some(key) => !matches_any(key, existing_lines, threshold),
            None => false,
        })
        .collect()
}

/// Text to append to a notes file currently holding `existing`.
///
/// Leaves a blank line between the file's last text and the first block,
/// separates blocks with a blank line and ends with a newline.
pub fn append_blocks(existing: &str, blocks: &[String]) -> String {
    let terminated = existing.is_empty() || existing.ends_with('\n');
    let last_blank = existing
        .lines()
        .last()
        .is_none_or(|line| line.trim().is_empty());
    let mut out = String::new();
    match (terminated, last_blank) {
        (true, true) => {}
        (true, false) | (false, true) => out.push('\n'),
        (false, false) => out.push_str("\n\n"),
    }
    out.push_str(&blocks.join("\n\n"));
    out.push('\n');
    out
}
