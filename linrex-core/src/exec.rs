//! Matching operations
//!
//! `exec`, `test`, `match_`, `search` and `split` share one locate step: find
//! the next match from a byte offset with the right anchor, and for a set
//! attribute the match to a member and collect that member's captures. The
//! `lastIndex` lifecycle is applied on top when the pattern is global or
//! sticky.

use std::ops::Range;
use std::sync::Arc;

use crate::compile::Compiled;
use crate::engine::Anchor;
use crate::error::Result;
use crate::groups::GroupRegistry;
use crate::offsets::{Cursor, next_char_boundary};
use crate::regex::Regex;
use crate::subject::{Fragment, Subject};

/// Which capture spans a locate step should report
#[derive(Debug, Clone, Copy)]
pub(crate) enum Capture<'a> {
    /// The whole-match span only; sets are not attributed to a member
    Span,
    /// Every group
    All,
    /// At most `limits[member]` groups, whole match included
    Limit(&'a [usize]),
}

impl Capture<'_> {
    fn groups(&self, member: usize) -> usize {
        match self {
            Capture::Span => 1,
            Capture::All => usize::MAX,
            Capture::Limit(limits) => limits.get(member).copied().unwrap_or(usize::MAX),
        }
    }
}

/// A located match, in byte offsets
#[derive(Debug, Clone)]
pub(crate) struct Found {
    pub(crate) span: Range<usize>,
    pub(crate) groups: Vec<Option<Range<usize>>>,
    pub(crate) member: Option<usize>,
}

impl Compiled {
    /// Find the next match at or after `start`
    pub(crate) fn locate(
        &self,
        haystack: &[u8],
        start: usize,
        anchor: Anchor,
        capture: Capture<'_>,
        operation: &'static str,
    ) -> Result<Option<Found>> {
        if start > haystack.len() {
            return Ok(None);
        }

        match (self, capture) {
            (_, Capture::Span) => Ok(self.program().find(haystack, start, anchor).map(|span| Found {
                groups: vec![Some(span.clone())],
                span,
                member: None,
            })),
            (Compiled::Single(pattern), _) => {
                let groups = pattern.groups().group_count() + 1;
                let Some(spans) = self.program().captures(
                    haystack,
                    start..haystack.len(),
                    anchor,
                    capture.groups(0).min(groups),
                ) else {
                    return Ok(None);
                };
                Ok(spans[0].clone().map(|span| Found {
                    span,
                    groups: spans,
                    member: None,
                }))
            }
            (Compiled::Set(set), _) => {
                let Some(span) = self.program().find(haystack, start, anchor) else {
                    return Ok(None);
                };
                let (member, groups) = set.attribute(
                    haystack,
                    span.clone(),
                    |member| capture.groups(member),
                    operation,
                )?;
                Ok(Some(Found {
                    span,
                    groups,
                    member: Some(member),
                }))
            }
        }
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'h> {
    groups: Vec<Option<Fragment<'h>>>,
    index: usize,
    input: Subject<'h>,
    named: Option<Vec<(Arc<str>, Option<Fragment<'h>>)>>,
    pattern_index: Option<usize>,
}

impl<'h> MatchResult<'h> {
    pub(crate) fn build(
        subject: Subject<'h>,
        found: &Found,
        index: usize,
        registry: Option<&GroupRegistry>,
        raw: bool,
    ) -> Self {
        let cut = |range: &Option<Range<usize>>| {
            range.clone().map(|r| {
                if raw {
                    subject.raw_fragment(r)
                } else {
                    subject.fragment(r)
                }
            })
        };
        let groups: Vec<Option<Fragment<'h>>> = found.groups.iter().map(cut).collect();
        let named = registry.filter(|r| r.has_names()).map(|r| {
            r.named()
                .map(|(name, index)| (Arc::clone(name), groups.get(index).copied().flatten()))
                .collect()
        });
        MatchResult {
            groups,
            index,
            input: subject,
            named,
            pattern_index: found.member,
        }
    }

    /// Group `i`; group 0 is the whole match. `None` if the group did not
    /// participate or does not exist.
    pub fn get(&self, i: usize) -> Option<Fragment<'h>> {
        self.groups.get(i).copied().flatten()
    }

    /// The whole match
    pub fn as_fragment(&self) -> Fragment<'h> {
        self.get(0).unwrap_or(Fragment::Bytes(&[]))
    }

    /// Number of groups, whole match included
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always `false`: a match has at least the whole-match group
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in order, whole match first
    pub fn iter(&self) -> impl Iterator<Item = Option<Fragment<'h>>> + '_ {
        self.groups.iter().copied()
    }

    /// Start of the match in the caller's units
    pub fn index(&self) -> usize {
        self.index
    }

    /// The subject that was matched
    pub fn input(&self) -> Subject<'h> {
        self.input
    }

    /// Named group values in group order; `None` when the pattern has no
    /// named groups
    pub fn groups(&self) -> Option<&[(Arc<str>, Option<Fragment<'h>>)]> {
        self.named.as_deref()
    }

    /// Value of a named group
    pub fn name(&self, name: &str) -> Option<Fragment<'h>> {
        self.named
            .as_ref()?
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .and_then(|(_, value)| *value)
    }

    /// Which set member matched; `None` for a single pattern
    pub fn pattern_index(&self) -> Option<usize> {
        self.pattern_index
    }
}

/// Result of [`Regex::match_`]
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'h> {
    /// Every whole match of a global pattern
    All(Vec<Fragment<'h>>),
    /// The single match of a non-global pattern
    One(MatchResult<'h>),
}

impl Regex {
    pub(crate) fn anchor(&self) -> Anchor {
        if self.sticky() {
            Anchor::Start
        } else {
            Anchor::Unanchored
        }
    }

    /// One step of the cursor lifecycle shared by `exec` and `test`.
    fn step(
        &mut self,
        subject: &Subject<'_>,
        capture: Capture<'_>,
        operation: &'static str,
    ) -> Result<Option<(Cursor, Found)>> {
        let stateful = self.flags().stateful();
        let cursor = if stateful && self.last_index() != 0 {
            match subject.cursor(self.last_index()) {
                Some(cursor) => cursor,
                None => {
                    self.set_last_index(0);
                    return Ok(None);
                }
            }
        } else {
            Cursor::ZERO
        };

        let compiled = self.shared();
        let found = compiled.locate(subject.as_bytes(), cursor.byte, self.anchor(), capture, operation)?;
        let Some(found) = found else {
            if stateful {
                self.set_last_index(0);
            }
            return Ok(None);
        };

        if stateful {
            self.set_last_index(cursor.unit + subject.units_between(cursor.byte, found.span.end));
        }
        Ok(Some((cursor, found)))
    }

    /// Run the pattern once from the cursor.
    ///
    /// For global or sticky patterns, a match moves `lastIndex` to the end of
    /// the match and a failure resets it to 0.
    pub fn exec<'h>(&mut self, subject: impl Into<Subject<'h>>) -> Result<Option<MatchResult<'h>>> {
        let subject = subject.into();
        let Some((cursor, found)) = self.step(&subject, Capture::All, "exec")? else {
            return Ok(None);
        };
        let index = cursor.unit + subject.units_between(cursor.byte, found.span.start);
        let registry = self.compiled().registry(found.member);
        Ok(Some(MatchResult::build(subject, &found, index, registry, false)))
    }

    /// Whether the pattern matches from the cursor; moves the cursor like `exec`
    pub fn test<'h>(&mut self, subject: impl Into<Subject<'h>>) -> Result<bool> {
        let subject = subject.into();
        Ok(self.step(&subject, Capture::Span, "test")?.is_some())
    }

    /// Host `String.prototype.match` semantics.
    ///
    /// A global pattern collects every whole match from the start of the
    /// subject and resets `lastIndex` to 0; otherwise this is `exec`.
    pub fn match_<'h>(&mut self, subject: impl Into<Subject<'h>>) -> Result<Option<MatchOutcome<'h>>> {
        let subject = subject.into();
        if !self.global() {
            return Ok(self.exec(subject)?.map(MatchOutcome::One));
        }

        let compiled = self.shared();
        let haystack = subject.as_bytes();
        let anchor = self.anchor();
        let mut pieces = Vec::new();
        let mut at = 0;
        while let Some(found) = compiled.locate(haystack, at, anchor, Capture::Span, "match")? {
            let span = found.span;
            at = if span.is_empty() {
                next_char_boundary(haystack, span.end)
            } else {
                span.end
            };
            pieces.push(subject.fragment(span));
        }
        self.set_last_index(0);

        Ok(if pieces.is_empty() {
            None
        } else {
            Some(MatchOutcome::All(pieces))
        })
    }

    /// Index of the first match in the caller's units.
    ///
    /// Ignores `lastIndex`; a sticky pattern only matches at 0.
    pub fn search<'h>(&self, subject: impl Into<Subject<'h>>) -> Result<Option<usize>> {
        let subject = subject.into();
        let found = self
            .compiled()
            .locate(subject.as_bytes(), 0, self.anchor(), Capture::Span, "search")?;
        Ok(found.map(|f| subject.units_between(0, f.span.start)))
    }

    /// Split the subject around matches, interleaving captured groups.
    ///
    /// Follows host `String.prototype.split`: an empty match at the start of
    /// a piece does not split, a non-participating group yields `None`, and
    /// at most `limit` entries are returned.
    pub fn split<'h>(
        &self,
        subject: impl Into<Subject<'h>>,
        limit: Option<usize>,
    ) -> Result<Vec<Option<Fragment<'h>>>> {
        let subject = subject.into();
        let limit = limit.unwrap_or(usize::MAX);
        let mut pieces = Vec::new();
        if limit == 0 {
            return Ok(pieces);
        }

        let compiled = self.compiled();
        let haystack = subject.as_bytes();
        let size = haystack.len();

        if size == 0 {
            if compiled
                .locate(haystack, 0, Anchor::Start, Capture::Span, "split")?
                .is_none()
            {
                pieces.push(Some(subject.fragment(0..0)));
            }
            return Ok(pieces);
        }

        let mut piece_start = 0;
        let mut at = 0;
        while at < size {
            let Some(found) = compiled.locate(haystack, at, Anchor::Unanchored, Capture::All, "split")? else {
                break;
            };
            let span = found.span.clone();
            if span.start >= size {
                break;
            }
            if span.end == piece_start {
                at = next_char_boundary(haystack, span.start);
                continue;
            }

            pieces.push(Some(subject.fragment(piece_start..span.start)));
            if pieces.len() == limit {
                return Ok(pieces);
            }
            for group in found.groups.iter().skip(1) {
                pieces.push(group.clone().map(|r| subject.fragment(r)));
                if pieces.len() == limit {
                    return Ok(pieces);
                }
            }
            piece_start = span.end;
            at = if span.is_empty() {
                next_char_boundary(haystack, span.end)
            } else {
                span.end
            };
        }

        pieces.push(Some(subject.fragment(piece_start..size)));
        Ok(pieces)
    }
}
