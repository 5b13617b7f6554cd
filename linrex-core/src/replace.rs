//! Replacement handling
//!
//! This module handles replacement templates that can contain `$` tokens
//! like `$1`, `$<name>` or `$&`, replacement callbacks, and the replace loop
//! that splices either into the subject. A set takes one replacer per member.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use crate::error::{CallbackError, RegexError, Result};
use crate::exec::{Capture, MatchResult};
use crate::groups::GroupRegistry;
use crate::offsets::{Cursor, next_char_boundary};
use crate::regex::Regex;
use crate::subject::{Subject, Value};

/// A part of a replacement template
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementPart {
    /// Literal text
    Literal(String),
    /// Capture group by number (`$1`, `$12`, or `$<name>` resolved)
    Group(usize),
    /// Entire match (`$&`)
    EntireMatch,
    /// Subject text before the match (`` $` ``)
    Before,
    /// Subject text after the match (`$'`)
    After,
}

/// A parsed replacement template
///
/// Parsing depends on the pattern: `$12` only means group 12 if the pattern
/// has that many groups, and `$<name>` is only special if it has named
/// groups.
#[derive(Debug, Clone)]
pub struct Replacement {
    parts: Vec<ReplacementPart>,
    max_group: usize,
}

impl Replacement {
    /// Parse a replacement template against a pattern's groups
    pub fn parse(input: &str, groups: &GroupRegistry) -> Self {
        let count = groups.group_count();
        let data = input.as_bytes();
        let mut parts = Vec::new();
        let mut current_literal = String::new();
        let mut i = 0;

        let flush = |literal: &mut String, parts: &mut Vec<ReplacementPart>| {
            if !literal.is_empty() {
                parts.push(ReplacementPart::Literal(std::mem::take(literal)));
            }
        };

        while i < data.len() {
            if data[i] != b'$' {
                let end = input[i..].find('$').map_or(data.len(), |n| i + n);
                current_literal.push_str(&input[i..end]);
                i = end;
                continue;
            }

            let Some(&next) = data.get(i + 1) else {
                current_literal.push('$');
                i += 1;
                continue;
            };

            match next {
                b'$' => {
                    current_literal.push('$');
                    i += 2;
                }
                b'&' | b'`' | b'\'' => {
                    flush(&mut current_literal, &mut parts);
                    parts.push(match next {
                        b'&' => ReplacementPart::EntireMatch,
                        b'`' => ReplacementPart::Before,
                        _ => ReplacementPart::After,
                    });
                    i += 2;
                }
                b'0'..=b'9' => {
                    let first = (next - b'0') as usize;
                    let two_digit = data
                        .get(i + 2)
                        .filter(|d| d.is_ascii_digit())
                        .map(|d| first * 10 + (d - b'0') as usize);

                    if let Some(index) = two_digit.filter(|&n| n != 0 && n <= count) {
                        flush(&mut current_literal, &mut parts);
                        parts.push(ReplacementPart::Group(index));
                        i += 3;
                    } else if first != 0 && first <= count {
                        flush(&mut current_literal, &mut parts);
                        parts.push(ReplacementPart::Group(first));
                        i += 2;
                    } else {
                        current_literal.push('$');
                        current_literal.push(next as char);
                        i += 2;
                    }
                }
                b'<' if groups.has_names() => match input[i + 2..].find('>') {
                    Some(len) => {
                        let name = &input[i + 2..i + 2 + len];
                        if let Some(index) = groups.get_by_name(name) {
                            flush(&mut current_literal, &mut parts);
                            parts.push(ReplacementPart::Group(index));
                        }
                        i += 3 + len;
                    }
                    None => {
                        current_literal.push_str("$<");
                        i += 2;
                    }
                },
                b'<' => {
                    current_literal.push_str("$<");
                    i += 2;
                }
                _ => {
                    current_literal.push('$');
                    i += 1;
                }
            }
        }

        flush(&mut current_literal, &mut parts);

        let max_group = parts
            .iter()
            .filter_map(|part| match part {
                ReplacementPart::Group(index) => Some(*index),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Replacement { parts, max_group }
    }

    /// Highest group index the template refers to
    pub fn max_group(&self) -> usize {
        self.max_group
    }

    /// Get the parts of the replacement
    pub fn parts(&self) -> &[ReplacementPart] {
        &self.parts
    }

    /// Append the expansion for one match to `out`
    pub(crate) fn apply(&self, subject: &Subject<'_>, groups: &[Option<Range<usize>>], out: &mut Value) {
        let haystack = subject.as_bytes();
        let Some(Some(whole)) = groups.first() else {
            return;
        };

        for part in &self.parts {
            match part {
                ReplacementPart::Literal(text) => out.push_bytes(text.as_bytes()),
                ReplacementPart::Group(n) => {
                    if let Some(Some(range)) = groups.get(*n) {
                        out.push_bytes(&haystack[range.clone()]);
                    }
                }
                ReplacementPart::EntireMatch => out.push_bytes(&haystack[whole.clone()]),
                ReplacementPart::Before => out.push_bytes(&haystack[..whole.start]),
                ReplacementPart::After => out.push_bytes(&haystack[whole.end..]),
            }
        }
    }
}

/// Signature of a replacement callback.
///
/// The callback receives the match: groups, `index()` as the offset and
/// `input()` as the subject, plus named groups when the pattern has them.
pub type ReplaceFn<'r> = dyn FnMut(&MatchResult<'_>) -> std::result::Result<Value, CallbackError> + 'r;

/// What to replace each match with
pub enum Replacer<'r> {
    /// A `$` template
    Template(Cow<'r, str>),
    /// A callback invoked once per match
    Callback {
        /// The callback
        func: Box<ReplaceFn<'r>>,
        /// Pass raw byte fragments and byte offsets even for text subjects
        use_buffers: bool,
    },
}

impl<'r> Replacer<'r> {
    /// A template replacer
    pub fn template(text: impl Into<Cow<'r, str>>) -> Self {
        Replacer::Template(text.into())
    }

    /// A callback replacer
    pub fn callback<F>(func: F) -> Self
    where
        F: FnMut(&MatchResult<'_>) -> std::result::Result<Value, CallbackError> + 'r,
    {
        Replacer::Callback {
            func: Box::new(func),
            use_buffers: false,
        }
    }

    /// A callback replacer that receives raw bytes and byte offsets
    pub fn callback_with_buffers<F>(func: F) -> Self
    where
        F: FnMut(&MatchResult<'_>) -> std::result::Result<Value, CallbackError> + 'r,
    {
        Replacer::Callback {
            func: Box::new(func),
            use_buffers: true,
        }
    }

    /// Replaces every match with itself
    pub fn identity() -> Self {
        Replacer::Template(Cow::Borrowed("$&"))
    }
}

impl fmt::Debug for Replacer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacer::Template(text) => f.debug_tuple("Template").field(text).finish(),
            Replacer::Callback { use_buffers, .. } => f
                .debug_struct("Callback")
                .field("use_buffers", use_buffers)
                .finish_non_exhaustive(),
        }
    }
}

impl<'r> From<&'r str> for Replacer<'r> {
    fn from(text: &'r str) -> Self {
        Replacer::template(text)
    }
}

impl From<String> for Replacer<'_> {
    fn from(text: String) -> Self {
        Replacer::template(text)
    }
}

/// How one member's matches are expanded
enum Action {
    Template(Replacement),
    Callback { slot: usize, raw: bool },
}

impl Regex {
    /// Replace the first match, or every match of a global pattern.
    ///
    /// A sticky non-global pattern starts at `lastIndex` and moves it like
    /// `exec`; a global pattern resets it to 0. On a set the replacer applies
    /// to every member.
    ///
    /// # Errors
    /// [`RegexError::Callback`] if the callback fails; nothing is returned
    /// and the rest of the subject is not scanned.
    pub fn replace<'h, 'r>(
        &mut self,
        subject: impl Into<Subject<'h>>,
        replacer: impl Into<Replacer<'r>>,
    ) -> Result<Value> {
        let mut replacers = [replacer.into()];
        self.replace_with(subject.into(), &mut replacers, true)
    }

    /// Replace matches of a set with one replacer per member.
    ///
    /// Members without a replacer keep their matches (`$&`).
    ///
    /// # Errors
    /// [`RegexError::Argument`] if this is not a set
    pub fn replace_set<'h, 'r>(
        &mut self,
        subject: impl Into<Subject<'h>>,
        mut replacers: Vec<Replacer<'r>>,
    ) -> Result<Value> {
        if !self.is_set() {
            return Err(RegexError::Argument(
                "per-member replacers need a pattern set".to_string(),
            ));
        }
        self.replace_with(subject.into(), &mut replacers, false)
    }

    fn replace_with(
        &mut self,
        subject: Subject<'_>,
        replacers: &mut [Replacer<'_>],
        shared: bool,
    ) -> Result<Value> {
        let compiled = self.shared();
        let registries = compiled.registries();

        let actions: Vec<Action> = registries
            .iter()
            .enumerate()
            .map(|(member, groups)| {
                let slot = if shared { 0 } else { member };
                match replacers.get(slot) {
                    Some(Replacer::Template(text)) => Action::Template(Replacement::parse(text, groups)),
                    Some(Replacer::Callback { use_buffers, .. }) => Action::Callback {
                        slot,
                        raw: *use_buffers,
                    },
                    None => Action::Template(Replacement::parse("$&", groups)),
                }
            })
            .collect();
        let limits: Vec<usize> = actions
            .iter()
            .map(|action| match action {
                Action::Template(template) => template.max_group() + 1,
                Action::Callback { .. } => usize::MAX,
            })
            .collect();

        let global = self.global();
        let sticky = self.sticky();
        let haystack = subject.as_bytes();
        let anchor = self.anchor();

        let start = if sticky && !global {
            match subject.cursor(self.last_index()) {
                Some(cursor) => cursor,
                None => {
                    self.set_last_index(0);
                    let mut out = subject.empty_value();
                    out.push_bytes(haystack);
                    return Ok(out);
                }
            }
        } else {
            Cursor::ZERO
        };

        let mut out = subject.empty_value();
        out.push_bytes(&haystack[..start.byte]);
        let mut copied = start.byte;
        let mut at = start.byte;
        let mut offset = start;
        let mut matched = false;

        while let Some(found) =
            compiled.locate(haystack, at, anchor, Capture::Limit(&limits), "replace")?
        {
            matched = true;
            let span = found.span.clone();
            if sticky && !global {
                self.set_last_index(start.unit + subject.units_between(start.byte, span.end));
            }

            out.push_bytes(&haystack[copied..span.start]);
            let member = found.member.unwrap_or(0);
            match actions.get(member) {
                Some(Action::Template(template)) => template.apply(&subject, &found.groups, &mut out),
                Some(&Action::Callback { slot, raw }) => {
                    let index = if raw {
                        span.start
                    } else {
                        offset = Cursor {
                            unit: offset.unit + subject.units_between(offset.byte, span.start),
                            byte: span.start,
                        };
                        offset.unit
                    };
                    let registry = compiled.registry(found.member);
                    let args = MatchResult::build(subject, &found, index, registry, raw);
                    if let Some(Replacer::Callback { func, .. }) = replacers.get_mut(slot) {
                        let value = func(&args).map_err(RegexError::Callback)?;
                        out.push_bytes(value.as_bytes());
                    }
                }
                None => out.push_bytes(&haystack[span.clone()]),
            }

            if span.is_empty() {
                let next = next_char_boundary(haystack, span.end);
                copied = next.min(haystack.len());
                out.push_bytes(&haystack[span.end..copied]);
                at = next;
            } else {
                copied = span.end;
                at = span.end;
            }

            if !global {
                break;
            }
        }

        out.push_bytes(&haystack[copied..]);

        if global || (sticky && !matched) {
            self.set_last_index(0);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(names: &[Option<&str>]) -> GroupRegistry {
        let mut registry = GroupRegistry::new();
        for name in names {
            registry.register_group(*name).unwrap();
        }
        registry
    }

    #[test]
    fn test_parse_literal() {
        let repl = Replacement::parse("hello", &GroupRegistry::new());
        assert_eq!(repl.parts(), &[ReplacementPart::Literal("hello".to_string())]);
        assert_eq!(repl.max_group(), 0);
    }

    #[test]
    fn test_parse_special_tokens() {
        let repl = Replacement::parse("$$-$&-$`-$'", &GroupRegistry::new());
        assert_eq!(
            repl.parts(),
            &[
                ReplacementPart::Literal("$-".to_string()),
                ReplacementPart::EntireMatch,
                ReplacementPart::Literal("-".to_string()),
                ReplacementPart::Before,
                ReplacementPart::Literal("-".to_string()),
                ReplacementPart::After,
            ]
        );
    }

    #[test]
    fn test_parse_two_digit_groups_are_greedy() {
        let twelve = registry(&[None; 12]);
        let repl = Replacement::parse("$12", &twelve);
        assert_eq!(repl.parts(), &[ReplacementPart::Group(12)]);
        assert_eq!(repl.max_group(), 12);

        let two = registry(&[None, None]);
        let repl = Replacement::parse("$12", &two);
        assert_eq!(
            repl.parts(),
            &[
                ReplacementPart::Group(1),
                ReplacementPart::Literal("2".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_missing_groups_stay_literal() {
        let one = registry(&[None]);
        let repl = Replacement::parse("$0 $5 $00 $x $", &one);
        assert_eq!(
            repl.parts(),
            &[ReplacementPart::Literal("$0 $5 $00 $x $".to_string())]
        );
        let repl = Replacement::parse("$01", &one);
        assert_eq!(repl.parts(), &[ReplacementPart::Group(1)]);
    }

    #[test]
    fn test_parse_named_groups() {
        let groups = registry(&[Some("year"), None, Some("day")]);
        let repl = Replacement::parse("$<day>/$<year>$<nope>!", &groups);
        assert_eq!(
            repl.parts(),
            &[
                ReplacementPart::Group(3),
                ReplacementPart::Literal("/".to_string()),
                ReplacementPart::Group(1),
                ReplacementPart::Literal("!".to_string()),
            ]
        );
        assert_eq!(repl.max_group(), 3);
    }

    #[test]
    fn test_parse_unterminated_name_is_literal() {
        let groups = registry(&[Some("a")]);
        let repl = Replacement::parse("$<a", &groups);
        assert_eq!(repl.parts(), &[ReplacementPart::Literal("$<a".to_string())]);
    }

    #[test]
    fn test_parse_names_without_named_groups_are_literal() {
        let groups = registry(&[None]);
        let repl = Replacement::parse("$<a$1>", &groups);
        assert_eq!(
            repl.parts(),
            &[
                ReplacementPart::Literal("$<a".to_string()),
                ReplacementPart::Group(1),
                ReplacementPart::Literal(">".to_string()),
            ]
        );
    }

    #[test]
    fn test_apply_groups_and_context() {
        let groups = registry(&[None, None]);
        let repl = Replacement::parse("[$2-$1|$`|$']", &groups);
        let subject = Subject::text("xaby");
        let mut out = subject.empty_value();
        repl.apply(&subject, &[Some(1..3), Some(1..2), Some(2..3)], &mut out);
        assert_eq!(out, "[b-a|x|y]");
    }

    #[test]
    fn test_replace_first_and_global() {
        let mut re = Regex::new("a").unwrap();
        assert_eq!(re.replace("banana", "o").unwrap(), "bonana");
        let mut re = Regex::with_flags("a", "g").unwrap();
        re.set_last_index(3);
        assert_eq!(re.replace("banana", "o").unwrap(), "bonono");
        assert_eq!(re.last_index(), 0);
    }

    #[test]
    fn test_replace_empty_matches_keep_text() {
        let mut re = Regex::with_flags("x*", "g").unwrap();
        assert_eq!(re.replace("abc", "-").unwrap(), "-a-b-c-");
        let mut re = Regex::with_flags("$", "g").unwrap();
        assert_eq!(re.replace("abc", "!").unwrap(), "abc!");
    }

    #[test]
    fn test_replace_sticky_non_global_moves_cursor() {
        let mut re = Regex::with_flags("a", "y").unwrap();
        assert_eq!(re.replace("aab", "x").unwrap(), "xab");
        assert_eq!(re.last_index(), 1);
        assert_eq!(re.replace("aab", "x").unwrap(), "axb");
        assert_eq!(re.last_index(), 2);
        assert_eq!(re.replace("aab", "x").unwrap(), "aab");
        assert_eq!(re.last_index(), 0);
    }

    #[test]
    fn test_replace_callback_arguments() {
        let mut re = Regex::with_flags(r"(?<d>\d)", "g").unwrap();
        let mut seen = Vec::new();
        let result = re
            .replace(
                "😃1x2",
                Replacer::callback(|m: &MatchResult<'_>| {
                    seen.push((m.index(), m.name("d").map(|f| f.to_string())));
                    Ok(Value::from(format!("<{}>", m.get(1).unwrap())))
                }),
            )
            .unwrap();
        assert_eq!(result, "😃<1>x<2>");
        assert_eq!(
            seen,
            vec![(2, Some("1".to_string())), (4, Some("2".to_string()))]
        );
    }

    #[test]
    fn test_replace_callback_with_buffers() {
        let mut re = Regex::new("b").unwrap();
        let mut offset = None;
        let result = re
            .replace(
                "жb",
                Replacer::callback_with_buffers(|m: &MatchResult<'_>| {
                    offset = Some(m.index());
                    assert!(m.get(0).unwrap().as_str().is_none());
                    Ok(Value::Bytes(b"B".to_vec()))
                }),
            )
            .unwrap();
        assert_eq!(result, "жB");
        assert_eq!(offset, Some(2));
    }

    #[test]
    fn test_replace_callback_error_aborts() {
        let mut re = Regex::with_flags("a", "g").unwrap();
        let mut calls = 0;
        let err = re
            .replace(
                "aaa",
                Replacer::callback(|_: &MatchResult<'_>| {
                    calls += 1;
                    Err("stop".into())
                }),
            )
            .unwrap_err();
        assert!(matches!(err, RegexError::Callback(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_replace_bytes_subject_produces_bytes() {
        let mut re = Regex::with_flags("b", "g").unwrap();
        let result = re.replace(&b"abcb"[..], "$&$&").unwrap();
        assert_eq!(result, Value::Bytes(b"abbcbb".to_vec()));
    }

    #[test]
    fn test_replace_set_per_member() {
        let mut re = Regex::set([r"\d+", "[a-z]+"], "g").unwrap();
        let result = re
            .replace_set("ab 12 cd", vec![Replacer::from("#"), Replacer::from("<$&>")])
            .unwrap();
        assert_eq!(result, "<ab> # <cd>");
    }

    #[test]
    fn test_replace_set_missing_replacers_keep_matches() {
        let mut re = Regex::set([r"\d+", "[a-z]+"], "g").unwrap();
        let result = re.replace_set("ab 12", vec![Replacer::from("#")]).unwrap();
        assert_eq!(result, "ab #");
    }

    #[test]
    fn test_replace_set_requires_set() {
        let mut re = Regex::new("a").unwrap();
        assert!(matches!(
            re.replace_set("a", vec![]),
            Err(RegexError::Argument(_))
        ));
    }
}
