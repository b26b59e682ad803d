//! Display width helpers.
//!
//! Labels mix CJK text (two cells per glyph) with ASCII, so padding and
//! truncation work in terminal cells rather than chars or bytes.

use unicode_width::UnicodeWidthChar;

/// Cells occupied by `text` once ANSI escapes are stripped.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Cut `text` so it fits in `max_width` cells. A wide glyph that would
/// straddle the edge is dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Truncate then right-pad with spaces to exactly `width` cells.
pub fn fit_to_width(text: &str, width: usize) -> String {
    let mut line = truncate_to_width(text, width);
    let mut used = display_width(&line);
    while used < width {
        line.push(' ');
        used += 1;
    }
    line
}
