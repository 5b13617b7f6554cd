//! Linear-time matching engine boundary
//!
//! Everything the adapter needs from the engine goes through this module:
//! compiling a program, matching with an anchor mode and a bounded number of
//! capture slots, and the multi-pattern acceptor used to attribute a match to
//! a set member. The backing implementation is the `regex-automata` meta
//! regex, which never backtracks.

use std::ops::Range;
use std::sync::Arc;

use regex_automata::meta::{self, BuildError};
use regex_automata::nfa::thompson::WhichCaptures;
use regex_automata::util::primitives::NonMaxUsize;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchKind, PatternID, PatternSet};

/// Where a match is allowed to start and end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Search forward from the start offset
    Unanchored,
    /// The match must start exactly at the start offset
    Start,
    /// The match must span exactly the given range
    Both,
}

/// Compile options derived from pattern flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// `false` when the `i` flag is set
    pub case_sensitive: bool,
    /// `false` when the `m` flag is set; `^`/`$` then match at line breaks
    pub one_line: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            case_sensitive: true,
            one_line: true,
        }
    }
}

impl Options {
    fn syntax(&self) -> syntax::Config {
        syntax::Config::new()
            .case_insensitive(!self.case_sensitive)
            .multi_line(!self.one_line)
            .utf8(true)
    }
}

/// A compiled program
#[derive(Debug, Clone)]
pub struct Program {
    meta: meta::Regex,
    source: Arc<str>,
}

impl Program {
    /// Compile a single engine-syntax pattern
    pub fn compile(source: &str, options: &Options) -> Result<Program, BuildError> {
        let config = meta::Config::new()
            .match_kind(MatchKind::LeftmostFirst)
            .utf8_empty(true);
        let meta = meta::Builder::new()
            .configure(config)
            .syntax(options.syntax())
            .build(source)?;
        Ok(Program {
            meta,
            source: Arc::from(source),
        })
    }

    /// Compile several patterns into one program with alternation semantics:
    /// at a given position the earliest listed pattern that matches wins.
    pub fn compile_alternation<S: AsRef<str>>(
        sources: &[S],
        options: &Options,
    ) -> Result<Program, BuildError> {
        let config = meta::Config::new()
            .match_kind(MatchKind::LeftmostFirst)
            .utf8_empty(true)
            .which_captures(WhichCaptures::Implicit);
        let meta = meta::Builder::new()
            .configure(config)
            .syntax(options.syntax())
            .build_many(sources)?;
        let joined: Vec<&str> = sources.iter().map(AsRef::as_ref).collect();
        Ok(Program {
            meta,
            source: Arc::from(joined.join("|")),
        })
    }

    /// The engine-syntax text this program was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of capturing groups, not counting the whole match
    pub fn group_count(&self) -> usize {
        self.meta
            .group_info()
            .group_len(PatternID::ZERO)
            .saturating_sub(1)
    }

    /// Group names by group index; index 0 (the whole match) is always `None`
    pub fn group_names(&self) -> Vec<Option<String>> {
        self.meta
            .group_info()
            .pattern_names(PatternID::ZERO)
            .map(|name| name.map(str::to_string))
            .collect()
    }

    /// Find the whole-match span at or after `start`
    pub fn find(&self, haystack: &[u8], start: usize, anchor: Anchor) -> Option<Range<usize>> {
        let input = Self::input(haystack, start..haystack.len(), anchor);
        self.meta.search(&input).map(|m| m.range())
    }

    /// Match within `span` and report up to `groups` capture spans
    /// (group 0 included). Non-participating groups are `None`.
    pub fn captures(
        &self,
        haystack: &[u8],
        span: Range<usize>,
        anchor: Anchor,
        groups: usize,
    ) -> Option<Vec<Option<Range<usize>>>> {
        let groups = groups.clamp(1, self.group_count() + 1);
        let end = span.end;
        let input = Self::input(haystack, span, anchor);
        let mut slots: Vec<Option<NonMaxUsize>> = vec![None; groups * 2];
        self.meta.search_slots(&input, &mut slots)?;

        let spans: Vec<Option<Range<usize>>> = slots
            .chunks_exact(2)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(s), Some(e)) => Some(s.get()..e.get()),
                _ => None,
            })
            .collect();

        if anchor == Anchor::Both && spans[0].as_ref().map(|m| m.end) != Some(end) {
            return None;
        }
        Some(spans)
    }

    fn input(haystack: &[u8], span: Range<usize>, anchor: Anchor) -> Input<'_> {
        let anchored = match anchor {
            Anchor::Unanchored => Anchored::No,
            Anchor::Start | Anchor::Both => Anchored::Yes,
        };
        Input::new(haystack).range(span).anchored(anchored)
    }
}

/// Collects member sources for an [`Acceptor`]
#[derive(Debug, Default)]
pub struct AcceptorBuilder {
    sources: Vec<String>,
}

impl AcceptorBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        AcceptorBuilder::default()
    }

    /// Register a member; returns its index
    pub fn register(&mut self, source: &str) -> usize {
        self.sources.push(source.to_string());
        self.sources.len() - 1
    }

    /// Compile every registered member into one acceptor
    pub fn compile(self, options: &Options) -> Result<Acceptor, BuildError> {
        let config = meta::Config::new()
            .match_kind(MatchKind::All)
            .utf8_empty(true)
            .which_captures(WhichCaptures::None);
        let meta = meta::Builder::new()
            .configure(config)
            .syntax(options.syntax())
            .build_many(&self.sources)?;
        Ok(Acceptor { meta })
    }
}

/// Multi-pattern acceptor: reports which members match a span
#[derive(Debug, Clone)]
pub struct Acceptor {
    meta: meta::Regex,
}

impl Acceptor {
    /// Indices of every member with a match starting at `span.start` and
    /// ending within `span`, ascending.
    ///
    /// The rest of the haystack stays visible to look-around assertions, so
    /// `\b` at the edges of the span sees the same neighbours the combined
    /// program saw.
    pub fn query(&self, haystack: &[u8], span: Range<usize>) -> Vec<usize> {
        let input = Input::new(haystack).range(span).anchored(Anchored::Yes);
        let mut matched = PatternSet::new(self.meta.pattern_len());
        self.meta.which_overlapping_matches(&input, &mut matched);
        matched.iter().map(|id| id.as_usize()).collect()
    }

    /// Number of registered members
    pub fn len(&self) -> usize {
        self.meta.pattern_len()
    }

    /// Whether no member was registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(source: &str) -> Program {
        Program::compile(source, &Options::default()).unwrap()
    }

    #[test]
    fn test_compile_error() {
        assert!(Program::compile("(abc", &Options::default()).is_err());
    }

    #[test]
    fn test_group_count_and_names() {
        let p = program(r"(?P<year>\d{4})-(\d{2})");
        assert_eq!(p.group_count(), 2);
        assert_eq!(
            p.group_names(),
            vec![None, Some("year".to_string()), None]
        );
    }

    #[test]
    fn test_find_unanchored_and_start() {
        let p = program("a");
        assert_eq!(p.find(b"ba", 0, Anchor::Unanchored), Some(1..2));
        assert_eq!(p.find(b"ba", 0, Anchor::Start), None);
        assert_eq!(p.find(b"ba", 1, Anchor::Start), Some(1..2));
    }

    #[test]
    fn test_captures_limited_slots() {
        let p = program("(a)(b)(c)");
        let all = p.captures(b"xabc", 0..4, Anchor::Unanchored, 4).unwrap();
        assert_eq!(all, vec![Some(1..4), Some(1..2), Some(2..3), Some(3..4)]);
        let whole = p.captures(b"xabc", 0..4, Anchor::Unanchored, 1).unwrap();
        assert_eq!(whole, vec![Some(1..4)]);
    }

    #[test]
    fn test_captures_non_participating_group() {
        let p = program("(a+)?(b+)?");
        let caps = p.captures(b"aaacbb", 0..6, Anchor::Unanchored, 3).unwrap();
        assert_eq!(caps, vec![Some(0..3), Some(0..3), None]);
    }

    #[test]
    fn test_captures_anchor_both() {
        let p = program("ab?");
        assert_eq!(
            p.captures(b"xab", 1..3, Anchor::Both, 1),
            Some(vec![Some(1..3)])
        );
        assert_eq!(p.captures(b"xab", 1..2, Anchor::Both, 1), Some(vec![Some(1..2)]));
        assert_eq!(p.captures(b"xxb", 1..3, Anchor::Both, 1), None);
    }

    #[test]
    fn test_case_insensitive_and_multiline_options() {
        let options = Options {
            case_sensitive: false,
            one_line: false,
        };
        let p = Program::compile("^abc$", &options).unwrap();
        assert_eq!(p.find(b"x\nABC\ny", 0, Anchor::Unanchored), Some(2..5));
    }

    #[test]
    fn test_alternation_priority() {
        let p = Program::compile_alternation(&["/blog/?", "/"], &Options::default()).unwrap();
        assert_eq!(p.source(), "/blog/?|/");
        assert_eq!(p.find(b"/blog", 0, Anchor::Start), Some(0..5));
    }

    #[test]
    fn test_alternation_allows_repeated_names() {
        let p = Program::compile_alternation(&["(?P<x>a)", "(?P<x>b)"], &Options::default());
        assert!(p.is_ok());
    }

    #[test]
    fn test_acceptor_reports_members_matching_at_span_start() {
        let mut builder = AcceptorBuilder::new();
        assert_eq!(builder.register("abc"), 0);
        assert_eq!(builder.register("x.z"), 1);
        assert_eq!(builder.register("[a-z]+"), 2);
        let acceptor = builder.compile(&Options::default()).unwrap();
        assert_eq!(acceptor.len(), 3);
        assert_eq!(acceptor.query(b"xyz", 0..3), vec![1, 2]);
        assert_eq!(acceptor.query(b"-abc", 1..4), vec![0, 2]);
        assert_eq!(acceptor.query(b"abc", 0..2), vec![2]);
        assert!(acceptor.query(b"123", 0..3).is_empty());
    }

    #[test]
    fn test_acceptor_sees_context_for_word_boundaries() {
        let mut builder = AcceptorBuilder::new();
        builder.register(r"\Bbar");
        builder.register(r"\bbar");
        let acceptor = builder.compile(&Options::default()).unwrap();
        assert_eq!(acceptor.query(b"foobar", 3..6), vec![0]);
        assert_eq!(acceptor.query(b"foo bar", 4..7), vec![1]);
    }
}
