//! Pattern and set compilation
//!
//! Turns a [`PatternInput`] into an immutable compiled artifact: a single
//! [`Pattern`], or a [`PatternSet`] made of the combined alternation, one
//! program per member and the acceptor used to attribute matches to members.
//! The [`Compiler`] is the caller-owned context carrying the non-Unicode
//! warning policy.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::{Acceptor, AcceptorBuilder, Anchor, Options, Program};
use crate::error::{RegexError, Result};
use crate::flags::{Flags, UnicodePolicy};
use crate::groups::GroupRegistry;
use crate::regex::Regex;
use crate::translate::{escape_literal, translate};

const UNICODE_WARNING: &str = "patterns without the \"u\" flag are not supported; an implicit \"u\" flag is assumed. \
Pass the \"u\" flag explicitly, as a future version may reject such patterns or treat them differently.";

const EXPECTED_INPUT: &str = "expected text, bytes, a literal, a pattern, or a non-empty sequence thereof";

/// What a pattern can be built from
#[derive(Debug, Clone)]
pub enum PatternInput<'a> {
    /// Pattern text in host syntax
    Text(&'a str),
    /// Pattern text as raw bytes; must be valid UTF-8
    Bytes(&'a [u8]),
    /// A host regex literal: its source and its own flags
    Literal {
        /// The literal's source, without delimiters
        source: &'a str,
        /// The literal's flags
        flags: &'a str,
    },
    /// An existing pattern or set; recompiled, not shared
    Pattern(&'a Regex),
    /// An ordered sequence of members to compile as a set
    Set(Vec<PatternInput<'a>>),
}

impl<'a> From<&'a str> for PatternInput<'a> {
    fn from(text: &'a str) -> Self {
        PatternInput::Text(text)
    }
}

impl<'a> From<&'a String> for PatternInput<'a> {
    fn from(text: &'a String) -> Self {
        PatternInput::Text(text)
    }
}

impl<'a> From<&'a [u8]> for PatternInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        PatternInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Regex> for PatternInput<'a> {
    fn from(regex: &'a Regex) -> Self {
        PatternInput::Pattern(regex)
    }
}

impl<'a, T: Into<PatternInput<'a>>> FromIterator<T> for PatternInput<'a> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        PatternInput::Set(iter.into_iter().map(Into::into).collect())
    }
}

/// A single compiled pattern
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    display_source: String,
    program: Program,
    groups: GroupRegistry,
}

impl Pattern {
    fn compile(display_source: String, engine_source: &str, options: &Options) -> Result<Pattern> {
        let program = Program::compile(engine_source, options)
            .map_err(|e| RegexError::Syntax(e.to_string()))?;
        let groups = GroupRegistry::from_names(program.group_names())?;
        Ok(Pattern {
            display_source,
            program,
            groups,
        })
    }

    pub(crate) fn display_source(&self) -> &str {
        &self.display_source
    }

    pub(crate) fn engine_source(&self) -> &str {
        self.program.source()
    }

    pub(crate) fn groups(&self) -> &GroupRegistry {
        &self.groups
    }
}

/// Several patterns compiled together
#[derive(Debug, Clone)]
pub(crate) struct PatternSet {
    display_source: String,
    combined: Program,
    members: Vec<Pattern>,
    acceptor: Acceptor,
}

impl PatternSet {
    fn compile(sources: Vec<(String, String)>, options: &Options) -> Result<PatternSet> {
        let mut members = Vec::with_capacity(sources.len());
        let mut acceptor = AcceptorBuilder::new();

        for (index, (display, engine)) in sources.into_iter().enumerate() {
            if !is_safe_for_set(&engine) {
                return Err(RegexError::UnsafeSetMember { index });
            }
            let member = Pattern::compile(display, &engine, options).map_err(|err| match err {
                RegexError::Syntax(msg) => RegexError::Syntax(format!("[{}] {}", index, msg)),
                other => other,
            })?;
            acceptor.register(member.engine_source());
            members.push(member);
        }

        let engine_sources: Vec<&str> = members.iter().map(Pattern::engine_source).collect();
        let combined = Program::compile_alternation(&engine_sources, options).map_err(|e| {
            RegexError::inconsistency(
                "set construction",
                format!("members compile individually but their alternation does not: {}", e),
            )
        })?;
        let acceptor = acceptor.compile(options).map_err(|e| {
            RegexError::inconsistency(
                "set construction",
                format!("members compile individually but the acceptor rejects them: {}", e),
            )
        })?;
        if acceptor.len() != members.len() {
            return Err(RegexError::inconsistency(
                "set construction",
                format!(
                    "acceptor holds {} members, expected {}",
                    acceptor.len(),
                    members.len()
                ),
            ));
        }

        let display_source = members
            .iter()
            .map(Pattern::display_source)
            .collect::<Vec<_>>()
            .join("|");

        Ok(PatternSet {
            display_source,
            combined,
            members,
            acceptor,
        })
    }

    pub(crate) fn members(&self) -> &[Pattern] {
        &self.members
    }

    /// Attribute a span matched by the combined program to a member and
    /// collect that member's own captures.
    pub(crate) fn attribute(
        &self,
        haystack: &[u8],
        span: Range<usize>,
        groups: impl Fn(usize) -> usize,
        operation: &'static str,
    ) -> Result<(usize, Vec<Option<Range<usize>>>)> {
        let candidates = self.acceptor.query(haystack, span.clone());
        let Some(&member) = candidates.first() else {
            return Err(RegexError::inconsistency(
                operation,
                format!(
                    "the alternation matched {}..{} but the acceptor reports no member",
                    span.start, span.end
                ),
            ));
        };
        log::trace!(
            "{}: span {}..{} attributed to member {} of candidates {:?}",
            operation,
            span.start,
            span.end,
            member,
            candidates
        );

        let pattern = self.members.get(member).ok_or_else(|| {
            RegexError::inconsistency(operation, format!("acceptor reported unknown member {}", member))
        })?;
        let captures = pattern
            .program
            .captures(haystack, span.clone(), Anchor::Both, groups(member))
            .ok_or_else(|| {
                RegexError::inconsistency(
                    operation,
                    format!(
                        "member {} rejects the span {}..{} the acceptor accepted",
                        member, span.start, span.end
                    ),
                )
            })?;
        Ok((member, captures))
    }
}

/// A compiled pattern or set, shared by every handle cloned from it
#[derive(Debug, Clone)]
pub(crate) enum Compiled {
    Single(Pattern),
    Set(PatternSet),
}

impl Compiled {
    pub(crate) fn display_source(&self) -> &str {
        match self {
            Compiled::Single(pattern) => pattern.display_source(),
            Compiled::Set(set) => &set.display_source,
        }
    }

    pub(crate) fn engine_source(&self) -> &str {
        self.program().source()
    }

    /// The program scanned first: the pattern itself, or a set's alternation
    pub(crate) fn program(&self) -> &Program {
        match self {
            Compiled::Single(pattern) => &pattern.program,
            Compiled::Set(set) => &set.combined,
        }
    }

    pub(crate) fn set(&self) -> Option<&PatternSet> {
        match self {
            Compiled::Single(_) => None,
            Compiled::Set(set) => Some(set),
        }
    }

    /// Group registries, one per member; a single pattern has exactly one
    pub(crate) fn registries(&self) -> Vec<&GroupRegistry> {
        match self {
            Compiled::Single(pattern) => vec![pattern.groups()],
            Compiled::Set(set) => set.members.iter().map(Pattern::groups).collect(),
        }
    }

    /// The registry that applies to a match by `member`
    pub(crate) fn registry(&self, member: Option<usize>) -> Option<&GroupRegistry> {
        match (self, member) {
            (Compiled::Single(pattern), _) => Some(pattern.groups()),
            (Compiled::Set(set), Some(index)) => set.members.get(index).map(Pattern::groups),
            (Compiled::Set(_), None) => None,
        }
    }

    /// `(display, engine)` source pairs, used to recompile
    fn source_pairs(&self) -> Vec<(String, String)> {
        match self {
            Compiled::Single(pattern) => vec![(
                pattern.display_source().to_string(),
                pattern.engine_source().to_string(),
            )],
            Compiled::Set(set) => set
                .members
                .iter()
                .map(|m| (m.display_source().to_string(), m.engine_source().to_string()))
                .collect(),
        }
    }
}

/// Whether an engine-syntax member can be merged into a set alternation.
///
/// Anchors lose their meaning once members share one alternation, so a bare
/// `^` or `$` outside a character class is rejected, and so are the `\A`
/// and `\z` escapes.
pub fn is_safe_for_set(source: &str) -> bool {
    let data = source.as_bytes();
    let mut i = 0;
    let mut class_depth = 0usize;

    while i < data.len() {
        match data[i] {
            b'\\' => {
                if class_depth == 0 && matches!(data.get(i + 1), Some(b'A' | b'z')) {
                    return false;
                }
                i += 2;
                continue;
            }
            b'[' => {
                class_depth += 1;
                i += 1;
                // A leading `^` negates and a leading `]` is literal
                if data.get(i) == Some(&b'^') {
                    i += 1;
                }
                if data.get(i) == Some(&b']') {
                    i += 1;
                }
                continue;
            }
            b']' if class_depth > 0 => class_depth -= 1,
            b'^' | b'$' if class_depth == 0 => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

/// Compilation context holding the non-Unicode warning policy
///
/// The "already warned" flag belongs to the context, so independent contexts
/// warn independently and a shared context warns once across threads.
#[derive(Debug, Default)]
pub struct Compiler {
    policy: UnicodePolicy,
    warned: AtomicBool,
}

impl Compiler {
    /// A context with the default policy (`nothing`)
    pub fn new() -> Self {
        Compiler::default()
    }

    /// A context with the given policy
    pub fn with_policy(policy: UnicodePolicy) -> Self {
        Compiler {
            policy,
            warned: AtomicBool::new(false),
        }
    }

    /// The current policy
    pub fn policy(&self) -> UnicodePolicy {
        self.policy
    }

    /// Select a policy. Selecting `warnOnce` re-arms the single warning.
    pub fn set_policy(&mut self, policy: UnicodePolicy) {
        self.policy = policy;
        if policy == UnicodePolicy::WarnOnce {
            *self.warned.get_mut() = false;
        }
    }

    /// Whether a `warnOnce` warning has already been issued
    pub fn has_warned(&self) -> bool {
        self.warned.load(Ordering::Relaxed)
    }

    /// Compile a pattern or set.
    ///
    /// `flags` overrides the flags carried by a literal or an existing
    /// pattern; for text, bytes and sets it is the only source of flags.
    ///
    /// # Errors
    /// - [`RegexError::Argument`] for bytes that are not UTF-8, an empty set,
    ///   or a set nested inside a set
    /// - [`RegexError::Syntax`] when the engine rejects a pattern, a group
    ///   name repeats, or the policy is `throw` and `u` is missing
    /// - [`RegexError::UnsafeSetMember`] for anchors in a set member
    pub fn compile<'a>(&self, input: impl Into<PatternInput<'a>>, flags: Option<&str>) -> Result<Regex> {
        let input = input.into();
        let (sources, parsed, is_set) = match &input {
            PatternInput::Text(_) | PatternInput::Bytes(_) => {
                let pair = member_sources(&input)?;
                (vec![pair], Flags::parse(flags.unwrap_or_default()), false)
            }
            PatternInput::Literal { flags: own, .. } => {
                let pair = member_sources(&input)?;
                (vec![pair], Flags::parse(flags.unwrap_or(*own)), false)
            }
            PatternInput::Pattern(regex) => {
                let mut parsed = flags.map(Flags::parse).unwrap_or_else(|| regex.flags());
                parsed.unicode = true;
                (regex.compiled().source_pairs(), parsed, regex.is_set())
            }
            PatternInput::Set(members) => {
                if members.is_empty() {
                    return Err(RegexError::Argument(EXPECTED_INPUT.to_string()));
                }
                let pairs = members
                    .iter()
                    .map(member_sources)
                    .collect::<Result<Vec<_>>>()?;
                (pairs, Flags::parse(flags.unwrap_or_default()), true)
            }
        };

        if !parsed.unicode {
            self.check_unicode()?;
        }

        let options = parsed.options();
        let compiled = if is_set {
            let set = PatternSet::compile(sources, &options)?;
            log::debug!(
                "compiled set of {} members as /{}/{}",
                set.members().len(),
                set.combined.source(),
                parsed
            );
            Compiled::Set(set)
        } else {
            let (display, engine) = sources.into_iter().next().ok_or_else(|| {
                RegexError::inconsistency("construction", "no source to compile")
            })?;
            let pattern = Pattern::compile(display, &engine, &options)?;
            log::debug!(
                "compiled /{}/{} as {:?}",
                pattern.display_source(),
                parsed,
                pattern.engine_source()
            );
            Compiled::Single(pattern)
        };

        Ok(Regex::from_compiled(compiled, parsed))
    }

    fn check_unicode(&self) -> Result<()> {
        match self.policy {
            UnicodePolicy::Throw => Err(RegexError::Syntax(UNICODE_WARNING.to_string())),
            UnicodePolicy::Warn => {
                log::warn!("{}", UNICODE_WARNING);
                Ok(())
            }
            UnicodePolicy::WarnOnce => {
                if !self.warned.swap(true, Ordering::Relaxed) {
                    log::warn!("{}", UNICODE_WARNING);
                }
                Ok(())
            }
            UnicodePolicy::Nothing => Ok(()),
        }
    }
}

/// Display and engine source of one pattern-like input
fn member_sources(input: &PatternInput<'_>) -> Result<(String, String)> {
    match input {
        PatternInput::Text(text) | PatternInput::Literal { source: text, .. } => {
            Ok((escape_literal(text), translate(text).into_owned()))
        }
        PatternInput::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| RegexError::Argument(format!("pattern is not valid UTF-8: {}", e)))?;
            Ok((escape_literal(text), translate(text).into_owned()))
        }
        PatternInput::Pattern(regex) => Ok((
            regex.source().to_string(),
            regex.engine_source().to_string(),
        )),
        PatternInput::Set(_) => Err(RegexError::Argument(EXPECTED_INPUT.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_for_set() {
        assert!(is_safe_for_set("abc"));
        assert!(is_safe_for_set(r"a\$b\^"));
        assert!(is_safe_for_set("[^abc]"));
        assert!(is_safe_for_set("[$^]x"));
        assert!(is_safe_for_set("[]^]"));
        assert!(!is_safe_for_set("^abc"));
        assert!(!is_safe_for_set("abc$"));
        assert!(!is_safe_for_set("[a]^"));
        assert!(!is_safe_for_set("(a|^b)"));
        assert!(!is_safe_for_set(r"\Aabc"));
        assert!(!is_safe_for_set(r"abc\z"));
        assert!(is_safe_for_set(r"\\A\\z"));
    }

    #[test]
    fn test_compile_single() {
        let regex = Compiler::new().compile("a/b", Some("gu")).unwrap();
        assert_eq!(regex.source(), r"a\/b");
        assert_eq!(regex.engine_source(), r"a\/b");
        assert!(regex.global());
        assert!(!regex.is_set());
    }

    #[test]
    fn test_compile_bytes_requires_utf8() {
        let err = Compiler::new()
            .compile(&[0xFF, b'a'][..], None)
            .unwrap_err();
        assert!(matches!(err, RegexError::Argument(_)));
    }

    #[test]
    fn test_compile_syntax_error() {
        let err = Compiler::new().compile("(abc", None).unwrap_err();
        assert!(matches!(err, RegexError::Syntax(_)));
    }

    #[test]
    fn test_duplicate_group_name_is_syntax_error() {
        let err = Compiler::new()
            .compile("(?<a>x)(?<a>y)", None)
            .unwrap_err();
        assert!(matches!(err, RegexError::Syntax(_)));
    }

    #[test]
    fn test_compile_literal_uses_own_flags() {
        let input = PatternInput::Literal {
            source: "a",
            flags: "gi",
        };
        let regex = Compiler::new().compile(input.clone(), None).unwrap();
        assert_eq!(regex.flags().to_string(), "giu");
        let regex = Compiler::new().compile(input, Some("y")).unwrap();
        assert_eq!(regex.flags().to_string(), "uy");
    }

    #[test]
    fn test_empty_set_is_argument_error() {
        let err = Compiler::new()
            .compile(PatternInput::Set(Vec::new()), None)
            .unwrap_err();
        assert!(matches!(err, RegexError::Argument(_)));
    }

    #[test]
    fn test_nested_set_is_argument_error() {
        let nested = PatternInput::Set(vec![PatternInput::Set(vec!["a".into()])]);
        let err = Compiler::new().compile(nested, None).unwrap_err();
        assert!(matches!(err, RegexError::Argument(_)));
    }

    #[test]
    fn test_set_rejects_anchor_with_index() {
        let input: PatternInput = ["abc", "^def"].into_iter().collect();
        let err = Compiler::new().compile(input, None).unwrap_err();
        assert!(matches!(err, RegexError::UnsafeSetMember { index: 1 }));
    }

    /// A set whose acceptor holds different members than its alternation
    fn mismatched_set() -> Regex {
        let options = Options::default();
        let mut set = PatternSet::compile(
            vec![("a".into(), "a".into()), ("b".into(), "b".into())],
            &options,
        )
        .unwrap();
        let mut acceptor = AcceptorBuilder::new();
        acceptor.register("x");
        acceptor.register("y");
        set.acceptor = acceptor.compile(&options).unwrap();
        Regex::from_compiled(Compiled::Set(set), Flags::parse("gu"))
    }

    #[test]
    fn test_unattributable_set_match_is_inconsistency() {
        let mut regex = mismatched_set();
        let err = regex.exec("a").unwrap_err();
        assert!(err.is_internal(), "{:?}", err);
        assert!(matches!(err, RegexError::Inconsistency { .. }));

        let err = mismatched_set().replace("ab", "-").unwrap_err();
        assert!(err.is_internal(), "{:?}", err);
    }

    #[test]
    fn test_span_only_operations_skip_attribution() {
        let mut regex = mismatched_set();
        assert!(regex.test("a").unwrap());
        assert_eq!(regex.search("zb").unwrap(), Some(1));
    }

    #[test]
    fn test_set_member_syntax_error_is_prefixed() {
        let input: PatternInput = ["abc", "def", "(x"].into_iter().collect();
        match Compiler::new().compile(input, None) {
            Err(RegexError::Syntax(msg)) => assert!(msg.starts_with("[2] "), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_set_members_may_reuse_group_names() {
        let input: PatternInput = ["(?<id>a+)", "(?<id>b+)"].into_iter().collect();
        let regex = Compiler::new().compile(input, None).unwrap();
        assert!(regex.is_set());
        assert_eq!(regex.source(), "(?<id>a+)|(?<id>b+)");
        assert_eq!(regex.engine_source(), "(?P<id>a+)|(?P<id>b+)");
    }

    #[test]
    fn test_policy_throw_rejects_missing_unicode() {
        let compiler = Compiler::with_policy(UnicodePolicy::Throw);
        assert!(matches!(
            compiler.compile("a", None),
            Err(RegexError::Syntax(_))
        ));
        assert!(compiler.compile("a", Some("u")).is_ok());
    }

    #[test]
    fn test_policy_warn_once_warns_once_per_context() {
        let mut compiler = Compiler::with_policy(UnicodePolicy::WarnOnce);
        assert!(!compiler.has_warned());
        compiler.compile("a", None).unwrap();
        assert!(compiler.has_warned());
        compiler.compile("b", None).unwrap();
        assert!(compiler.has_warned());

        compiler.set_policy(UnicodePolicy::WarnOnce);
        assert!(!compiler.has_warned());

        let other = Compiler::with_policy(UnicodePolicy::WarnOnce);
        assert!(!other.has_warned());
    }

    #[test]
    fn test_recompile_from_pattern_keeps_sources() {
        let compiler = Compiler::new();
        let original = compiler.compile("(?<x>a)/", Some("g")).unwrap();
        let copy = compiler.compile(&original, Some("i")).unwrap();
        assert_eq!(copy.source(), original.source());
        assert_eq!(copy.engine_source(), original.engine_source());
        assert_eq!(copy.flags().to_string(), "iu");
        assert!(copy.flags().unicode);
    }
}
