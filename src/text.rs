//! Display-column arithmetic: width measurement, ANSI stripping,
//! wrapping and padding. All renderers measure text through here so
//! that wide (CJK) characters count two columns and styling counts
//! zero.

use std::sync::OnceLock;

use regex::Regex;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of a value inside its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
    Center,
}

fn sgr_pattern() -> &'static Regex {
    static SGR: OnceLock<Regex> = OnceLock::new();
    SGR.get_or_init(|| Regex::new("\x1b\\[[0-9;]*m").unwrap())
}

/// Removes ANSI SGR styling sequences, leaving the visible text.
pub fn strip_ansi(s: &str) -> String {
    if !s.contains('\x1b') {
        return s.to_string();
    }
    sgr_pattern().replace_all(s, "").into_owned()
}

/// Number of terminal columns `s` occupies: wide characters count two,
/// ANSI styling counts zero.
pub fn display_width(s: &str) -> usize {
    if s.contains('\x1b') {
        strip_ansi(s).width()
    } else {
        s.width()
    }
}

/// Splits `s` into lines of at most `width` display columns, never
/// splitting a character. A character wider than `width` (or a zero
/// `width`) falls back to overflowing rather than being dropped.
pub(crate) fn wrap_to_width(s: &str, width: usize) -> Vec<String> {
    if width == 0 || display_width(s) <= width {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && used > 0 {
            lines.push(std::mem::take(&mut line));
            used = 0;
        }
        line.push(ch);
        used += w;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Pads `s` with spaces to `width` display columns. Values already at
/// or over the width are returned unchanged (overflow is the caller's
/// fallback, truncation is never silent). Styled text pads correctly
/// because padding is computed on the stripped width.
pub(crate) fn pad(s: &str, width: usize, align: Align) -> String {
    let w = display_width(s);
    if w >= width {
        return s.to_string();
    }
    let missing = width - w;
    match align {
        Align::Left => format!("{s}{}", " ".repeat(missing)),
        Align::Right => format!("{}{s}", " ".repeat(missing)),
        Align::Center => {
            let left = missing / 2;
            format!("{}{s}{}", " ".repeat(left), " ".repeat(missing - left))
        }
    }
}
