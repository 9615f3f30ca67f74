use once_cell::sync::Lazy;
use regex::Regex;

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Characters dropped outright: replacement char, zero-width and BOM
/// characters, and every control character except newline and tab.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{FFFD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    ) || (c.is_control() && c != '\n' && c != '\t')
}

pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Collapse runs of horizontal whitespace to one space and trim every line.
pub fn collapse_line_whitespace(text: &str) -> String {
    static HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
    text.split('\n')
        .map(|line| HSPACE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Share of characters that look like ordinary prose: ASCII letters and
/// digits, whitespace and basic punctuation. Returns 1.0 for empty input.
pub fn clean_char_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut clean = 0usize;
    for c in text.chars() {
        total += 1;
        if c.is_ascii_alphanumeric()
            || c.is_whitespace()
            || matches!(
                c,
                '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '-' | '(' | ')' | '/' | '&'
            )
        {
            clean += 1;
        }
    }
    if total == 0 {
        return 1.0;
    }
    clean as f64 / total as f64
}

/// Decode bytes as Latin-1, mapping each byte to the code point of the same value.
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Resolve backslash escapes inside a PDF string literal body.
///
/// Handles `\(`, `\)`, `\\`, the whitespace escapes (mapped to a space) and
/// up to three octal digits. Unknown escapes keep the escaped character.
pub fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'r' | 't' | 'f' | 'b') => out.push(' '),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(v) => {
                            value = value * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if let Some(ch) = char::from_u32(value & 0xFF) {
                    out.push(ch);
                }
            }
            // line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Whether an extracted literal is worth keeping: more than two characters
/// and at least one ASCII letter.
pub fn is_meaningful_literal(text: &str) -> bool {
    text.chars().count() > 2 && text.chars().any(|c| c.is_ascii_alphabetic())
}
