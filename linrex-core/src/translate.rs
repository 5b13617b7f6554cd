//! Translator from host pattern syntax to engine syntax
//!
//! Host patterns use JavaScript `RegExp` syntax; the engine understands a
//! different dialect. This module rewrites the handful of constructs that
//! differ, and separately produces the display source a host regex literal
//! would show.

use std::borrow::Cow;

use crate::offsets::char_byte_len;

const EMPTY_PATTERN: &str = "(?:)";

/// Host `[]`: a class that matches nothing
const EMPTY_CLASS: &str = r"[^\x{0}-\x{10FFFF}]";

/// Host `[^]`: a class that matches any character, line breaks included
const ANY_CLASS: &str = r"[\x{0}-\x{10FFFF}]";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Engine text for a host shorthand class. The host keeps `\d` and `\w`
/// ASCII-only even in Unicode mode; inside a bracket the ASCII class names
/// are used so the result can be unioned with the other items.
fn ascii_shorthand(kind: u8, in_class: bool) -> &'static str {
    match (kind, in_class) {
        (b'd', false) => "[0-9]",
        (b'D', false) => "[^0-9]",
        (b'w', false) => "[0-9A-Za-z_]",
        (b'W', false) => "[^0-9A-Za-z_]",
        (b'd', true) => "[:digit:]",
        (b'D', true) => "[:^digit:]",
        (b'w', true) => "[:word:]",
        _ => "[:^word:]",
    }
}

/// Translate a host pattern into engine syntax.
///
/// Returns the source unchanged (borrowed) when no rewrite rule fired, so
/// callers can skip re-allocating.
///
/// # Example
/// ```
/// use linrex_core::translate;
///
/// assert_eq!(translate(r"(?<year>\d{4})"), r"(?P<year>[0-9]{4})");
/// assert_eq!(translate(r"\u{1F603}"), r"\x{1F603}");
/// ```
pub fn translate(source: &str) -> Cow<'_, str> {
    if source.is_empty() {
        return Cow::Owned(EMPTY_PATTERN.to_string());
    }

    let data = source.as_bytes();
    let size = data.len();
    let mut result = String::with_capacity(size + 8);
    let mut changed = false;
    let mut in_class = false;
    let mut i = 0;

    while i < size {
        let ch = data[i];
        if ch == b'\\' && i + 1 < size {
            let next = data[i + 1];
            match next {
                b'\\' => {
                    result.push_str("\\\\");
                    i += 2;
                }
                b'c' => {
                    match data.get(i + 2) {
                        Some(&letter) if letter.is_ascii_uppercase() => {
                            let code = letter - b'@';
                            result.push_str("\\x");
                            result.push(HEX[(code >> 4) as usize] as char);
                            result.push(HEX[(code & 15) as usize] as char);
                            i += 3;
                            changed = true;
                        }
                        _ => {
                            result.push_str("\\c");
                            i += 2;
                        }
                    }
                }
                b'u' => match data.get(i + 2) {
                    Some(&digit) if digit.is_ascii_hexdigit() => {
                        let digits = data[i + 2..]
                            .iter()
                            .take(4)
                            .take_while(|b| b.is_ascii_hexdigit())
                            .count();
                        result.push_str("\\x{");
                        result.push_str(&source[i + 2..i + 2 + digits]);
                        result.push('}');
                        i += 2 + digits;
                        changed = true;
                    }
                    Some(b'{') => {
                        result.push_str("\\x");
                        i += 2;
                        changed = true;
                    }
                    _ => {
                        result.push_str("\\u");
                        i += 2;
                    }
                },
                b'd' | b'D' | b'w' | b'W' => {
                    result.push_str(ascii_shorthand(next, in_class));
                    i += 2;
                    changed = true;
                }
                // `\b` is a backspace inside a class
                b'b' if in_class => {
                    result.push_str("\\x08");
                    i += 2;
                    changed = true;
                }
                b'b' | b'B' if !in_class => {
                    result.push_str(if next == b'b' { "(?-u:\\b)" } else { "(?-u:\\B)" });
                    i += 2;
                    changed = true;
                }
                _ => {
                    let end = (i + 1 + char_byte_len(next)).min(size);
                    result.push_str(&source[i..end]);
                    i = end;
                }
            }
            continue;
        }

        if ch == b'/' {
            result.push_str("\\/");
            i += 1;
            changed = true;
            continue;
        }

        if in_class {
            match ch {
                b']' => {
                    in_class = false;
                    result.push(']');
                    i += 1;
                }
                // Literal for the host; nesting or set operators for the engine
                b'[' => {
                    result.push_str("\\[");
                    i += 1;
                    changed = true;
                }
                b'&' | b'-' | b'~' if data.get(i + 1) == Some(&ch) => {
                    result.push(ch as char);
                    result.push('\\');
                    result.push(ch as char);
                    i += 2;
                    changed = true;
                }
                _ => {
                    let end = (i + char_byte_len(ch)).min(size);
                    result.push_str(&source[i..end]);
                    i = end;
                }
            }
            continue;
        }

        if ch == b'[' {
            let rest = &data[i + 1..];
            if rest.starts_with(b"]") {
                result.push_str(EMPTY_CLASS);
                i += 2;
                changed = true;
            } else if rest.starts_with(b"^]") {
                result.push_str(ANY_CLASS);
                i += 3;
                changed = true;
            } else {
                in_class = true;
                result.push('[');
                i += 1;
                if data.get(i) == Some(&b'^') {
                    result.push('^');
                    i += 1;
                }
            }
            continue;
        }

        if ch == b'(' && data[i..].starts_with(b"(?<") && !matches!(data.get(i + 3), Some(b'=' | b'!')) {
            result.push_str("(?P<");
            i += 3;
            changed = true;
            continue;
        }

        let end = (i + char_byte_len(ch)).min(size);
        result.push_str(&source[i..end]);
        i = end;
    }

    if changed {
        Cow::Owned(result)
    } else {
        Cow::Borrowed(source)
    }
}

/// Produce the display source for a raw pattern text.
///
/// Only unescaped `/` is rewritten (to `\/`); a `/` preceded by an odd run of
/// backslashes is already escaped. Empty input displays as `(?:)`.
pub fn escape_literal(text: &str) -> String {
    if text.is_empty() {
        return EMPTY_PATTERN.to_string();
    }

    let mut result = String::with_capacity(text.len() + 2);
    let mut backslashes = 0usize;
    for ch in text.chars() {
        match ch {
            '\\' => backslashes += 1,
            '/' if backslashes % 2 == 0 => {
                result.push('\\');
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
        result.push(ch);
    }
    result
}

/// Translate with verbose output for debugging
pub fn translate_debug(source: &str) -> TranslateReport {
    let engine = translate(source);
    TranslateReport {
        input: source.to_string(),
        display: escape_literal(source),
        changed: matches!(engine, Cow::Owned(_)),
        engine: engine.into_owned(),
    }
}

/// Result of a translation with debug information
#[derive(Debug, Clone)]
pub struct TranslateReport {
    /// The original input pattern
    pub input: String,
    /// The source a host regex literal would display
    pub display: String,
    /// The engine-syntax text
    pub engine: String,
    /// Whether any rewrite rule fired
    pub changed: bool,
}

impl TranslateReport {
    /// Print a formatted report of the translation
    pub fn report(&self) {
        println!("Translation Report");
        println!("==================");
        println!("Input:   {}", self.input);
        println!("Display: {}", self.display);
        println!("Engine:  {}", self.engine);
        println!("Changed: {}", self.changed);
    }
}
