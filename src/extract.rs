use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{PipelineError, Result};

static ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})|\\x([0-9a-fA-F]{2})").unwrap());
static CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F\u{A0}]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Reads a PDF from disk and returns its text in reading order.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|err| PipelineError::Extraction {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Splits extracted text into blocks: runs of non-blank lines.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Cleans one raw block into a fragment. Returns `None` when nothing
/// printable is left.
pub fn normalize(raw: &str) -> Option<String> {
    let decoded = decode_escapes(raw);
    let repaired = repair_mojibake(&decoded);
    let printable = CONTROL.replace_all(&repaired, " ");
    let collapsed = WHITESPACE.replace_all(&printable, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Full text to ordered fragment list.
pub fn fragments(text: &str) -> Vec<String> {
    split_blocks(text)
        .iter()
        .filter_map(|block| normalize(block))
        .collect()
}

fn decode_escapes(raw: &str) -> Cow<'_, str> {
    ESCAPE.replace_all(raw, |caps: &Captures| {
        let hex = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        hex.and_then(|h| u32::from_str_radix(h, 16).ok())
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    })
}

// Text whose UTF-8 bytes were read back as Latin-1 ("CafÃ©") fits entirely in
// U+0000..U+00FF and decodes cleanly once turned back into bytes.
fn repair_mojibake(text: &str) -> Cow<'_, str> {
    let mut has_high = false;
    for c in text.chars() {
        let code = c as u32;
        if code > 0xFF {
            return Cow::Borrowed(text);
        }
        has_high |= code >= 0x80;
    }
    if !has_high {
        return Cow::Borrowed(text);
    }
    let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
    match String::from_utf8(bytes) {
        Ok(fixed) => Cow::Owned(fixed),
        Err(_) => Cow::Borrowed(text),
    }
}
