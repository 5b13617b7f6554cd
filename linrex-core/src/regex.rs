//! The pattern handle
//!
//! A [`Regex`] pairs an immutable compiled artifact with the per-handle
//! `lastIndex` cursor. Cloning a handle shares the compiled artifact and
//! copies the cursor, so each clone can be driven independently.

use std::fmt;
use std::sync::Arc;

use crate::compile::{Compiled, Compiler, PatternInput};
use crate::error::Result;
use crate::flags::Flags;

/// A compiled pattern or pattern set with its matching cursor
#[derive(Debug, Clone)]
pub struct Regex {
    compiled: Arc<Compiled>,
    flags: Flags,
    last_index: usize,
}

impl Regex {
    /// Compile a pattern with no flags
    ///
    /// # Example
    /// ```
    /// use linrex_core::Regex;
    ///
    /// let mut re = Regex::new(r"(?<year>\d{4})-(?<month>\d{2})").unwrap();
    /// let m = re.exec("2024-05").unwrap().unwrap();
    /// assert_eq!(m.name("year").unwrap(), "2024");
    /// ```
    pub fn new(pattern: &str) -> Result<Regex> {
        Compiler::new().compile(pattern, None)
    }

    /// Compile a pattern with a flag string such as `"gu"`
    pub fn with_flags(pattern: &str, flags: &str) -> Result<Regex> {
        Compiler::new().compile(pattern, Some(flags))
    }

    /// Compile an ordered sequence of members as a set
    ///
    /// # Example
    /// ```
    /// use linrex_core::Regex;
    ///
    /// let mut re = Regex::set(["abc", "x.z"], "u").unwrap();
    /// let m = re.exec("xyz").unwrap().unwrap();
    /// assert_eq!(m.pattern_index(), Some(1));
    /// ```
    pub fn set<'a, I, T>(members: I, flags: &str) -> Result<Regex>
    where
        I: IntoIterator<Item = T>,
        T: Into<PatternInput<'a>>,
    {
        let input: PatternInput<'a> = members.into_iter().collect();
        Compiler::new().compile(input, Some(flags))
    }

    /// Recompile this pattern, optionally with different flags.
    ///
    /// The copy gets its own engine programs and a fresh cursor.
    pub fn recompile(&self, flags: Option<&str>) -> Result<Regex> {
        Compiler::new().compile(self, flags)
    }

    pub(crate) fn from_compiled(compiled: Compiled, flags: Flags) -> Regex {
        Regex {
            compiled: Arc::new(compiled),
            flags,
            last_index: 0,
        }
    }

    pub(crate) fn compiled(&self) -> &Compiled {
        &self.compiled
    }

    pub(crate) fn shared(&self) -> Arc<Compiled> {
        Arc::clone(&self.compiled)
    }

    /// The source as a host regex literal would show it
    pub fn source(&self) -> &str {
        self.compiled.display_source()
    }

    /// Member sources of a set; `None` for a single pattern
    pub fn sources(&self) -> Option<Vec<&str>> {
        self.compiled
            .set()
            .map(|set| set.members().iter().map(|m| m.display_source()).collect())
    }

    /// The engine-syntax text that was compiled
    pub fn engine_source(&self) -> &str {
        self.compiled.engine_source()
    }

    /// Engine-syntax text of every member of a set; `None` for a single pattern
    pub fn engine_sources(&self) -> Option<Vec<&str>> {
        self.compiled
            .set()
            .map(|set| set.members().iter().map(|m| m.engine_source()).collect())
    }

    /// Whether this is a pattern set
    pub fn is_set(&self) -> bool {
        self.compiled.set().is_some()
    }

    /// The flags
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The `g` flag
    pub fn global(&self) -> bool {
        self.flags.global
    }

    /// The `i` flag
    pub fn ignore_case(&self) -> bool {
        self.flags.ignore_case
    }

    /// The `m` flag
    pub fn multiline(&self) -> bool {
        self.flags.multiline
    }

    /// Always `true`: matching is always done in Unicode mode
    pub fn unicode(&self) -> bool {
        true
    }

    /// The `y` flag
    pub fn sticky(&self) -> bool {
        self.flags.sticky
    }

    /// Number of capture groups, not counting the whole match.
    ///
    /// For a set this is the largest count among the members.
    pub fn group_count(&self) -> usize {
        self.compiled
            .registries()
            .iter()
            .map(|groups| groups.group_count())
            .max()
            .unwrap_or(0)
    }

    /// The cursor, in UTF-16 code units for text subjects and bytes otherwise
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    /// Move the cursor
    pub fn set_last_index(&mut self, index: usize) {
        self.last_index = index;
    }

    /// Move the cursor from a host number: NaN and negatives clamp to 0,
    /// fractions are truncated.
    pub fn assign_last_index(&mut self, value: f64) {
        self.last_index = if value.is_nan() || value <= 0.0 {
            0
        } else {
            value as usize
        };
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source(), self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let re = Regex::with_flags("a/b", "gimy").unwrap();
        assert_eq!(re.source(), r"a\/b");
        assert!(re.global());
        assert!(re.ignore_case());
        assert!(re.multiline());
        assert!(re.unicode());
        assert!(re.sticky());
        assert_eq!(re.sources(), None);
        assert_eq!(re.engine_sources(), None);
        assert_eq!(re.to_string(), r"/a\/b/gimuy");
    }

    #[test]
    fn test_empty_pattern_displays_as_empty_group() {
        let re = Regex::new("").unwrap();
        assert_eq!(re.to_string(), "/(?:)/u");
    }

    #[test]
    fn test_set_accessors() {
        let re = Regex::set(["(?<a>x)", "y/z"], "g").unwrap();
        assert_eq!(re.source(), r"(?<a>x)|y\/z");
        assert_eq!(re.sources(), Some(vec!["(?<a>x)", r"y\/z"]));
        assert_eq!(re.engine_sources(), Some(vec!["(?P<a>x)", r"y\/z"]));
        assert_eq!(re.engine_source(), r"(?P<a>x)|y\/z");
    }

    #[test]
    fn test_assign_last_index() {
        let mut re = Regex::new("a").unwrap();
        re.assign_last_index(3.7);
        assert_eq!(re.last_index(), 3);
        re.assign_last_index(-2.0);
        assert_eq!(re.last_index(), 0);
        re.set_last_index(5);
        re.assign_last_index(f64::NAN);
        assert_eq!(re.last_index(), 0);
    }

    #[test]
    fn test_group_count() {
        let re = Regex::new(r"(a)(?<b>b)(?:c)").unwrap();
        assert_eq!(re.group_count(), 2);
    }

    #[test]
    fn test_clone_has_independent_cursor() {
        let mut re = Regex::with_flags("a", "g").unwrap();
        re.set_last_index(1);
        let mut copy = re.clone();
        copy.set_last_index(0);
        assert_eq!(re.last_index(), 1);
        assert_eq!(copy.last_index(), 0);
    }

    #[test]
    fn test_recompile_with_new_flags() {
        let re = Regex::with_flags("abc", "g").unwrap();
        let copy = re.recompile(Some("iy")).unwrap();
        assert_eq!(copy.source(), "abc");
        assert!(copy.ignore_case());
        assert!(!copy.global());
        let same = re.recompile(None).unwrap();
        assert_eq!(same.flags().to_string(), "gu");
    }
}
