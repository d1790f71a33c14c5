//! Width-aware line wrapping.
//!
//! Widths are terminal columns (unicode-width), not bytes or chars. Prose is
//! wrapped at whitespace, raw text (tool output, JSON) at exact column
//! boundaries. Either way a row is a piece of the input: wrapping drops the
//! whitespace it breaks at and never adds text.

use std::borrow::Cow;
use std::{iter, mem};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wraps prose to `width` columns. Words longer than a row are split.
///
/// Whitespace between words on the same row is kept as written. Always
/// returns at least one (possibly empty) row.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let mut rows: Vec<String> = Vec::new();
    let mut row = String::new();
    let mut used = 0;

    for (gap, word) in words(text) {
        let word_width = word.width();
        let gap_width = gap.width();
        let fits = if row.is_empty() {
            word_width <= width
        } else {
            used + gap_width + word_width <= width
        };
        if fits {
            if !row.is_empty() {
                row.push_str(gap);
                used += gap_width;
            }
            row.push_str(word);
            used += word_width;
            continue;
        }

        if !row.is_empty() {
            rows.push(mem::take(&mut row));
        }
        if word_width <= width {
            row.push_str(word);
            used = word_width;
        } else {
            let mut pieces = wrap_columns(word, width);
            row = pieces.pop().unwrap_or_default();
            used = row.width();
            rows.extend(pieces);
        }
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }
    rows
}

/// Words of `text`, each with the whitespace before it.
fn words(text: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = text;
    iter::from_fn(move || {
        let start = rest.find(|ch: char| !ch.is_whitespace())?;
        let len = rest[start..]
            .find(char::is_whitespace)
            .unwrap_or(rest.len() - start);
        let (gap, word) = (&rest[..start], &rest[start..start + len]);
        rest = &rest[start + len..];
        Some((gap, word))
    })
}

/// Breaks `text` into rows of at most `width` columns, keeping whitespace.
///
/// Zero-width characters stay attached to the preceding character. Always
/// returns at least one (possibly empty) row.
pub fn wrap_columns(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut used = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width > 0 && used + ch_width > width && !row.is_empty() {
            rows.push(mem::take(&mut row));
            used = 0;
        }
        row.push(ch);
        used += ch_width;
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }
    rows
}

/// Strips escape bytes and expands tabs so column widths are predictable.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.contains(['\x1b', '\t', '\r']) {
        Cow::Owned(
            text.replace('\x1b', "")
                .replace('\t', "    ")
                .replace('\r', ""),
        )
    } else {
        Cow::Borrowed(text)
    }
}

/// The longest prefix of `text` that fits in `max_width` columns.
pub fn clip(text: &str, max_width: usize) -> &str {
    let mut used = 0;
    for (at, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > max_width {
            return &text[..at];
        }
        used += ch_width;
    }
    text
}
