//! Pattern flags and the non-Unicode warning policy
//!
//! Flags are parsed from the host flag string (`"gimuy"`), and rendered back in
//! the fixed order `g i m u y`. The `u` flag is always reported because the
//! engine only ever runs in Unicode mode; whether the caller asked for it is
//! kept separately so the warning policy can react.

use std::fmt;
use std::str::FromStr;

use crate::engine::Options;
use crate::error::RegexError;

/// Flags of a compiled pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Global matching (g)
    pub global: bool,
    /// Case insensitive matching (i)
    pub ignore_case: bool,
    /// `^` and `$` match at line breaks (m)
    pub multiline: bool,
    /// Unicode mode was requested explicitly (u)
    pub unicode: bool,
    /// Matches must start exactly at `lastIndex` (y)
    pub sticky: bool,
}

impl Flags {
    /// Parse flags from a string like "gimuy".
    ///
    /// Unknown characters are ignored.
    pub fn parse(flags: &str) -> Self {
        let mut result = Flags::default();
        for c in flags.chars() {
            match c {
                'g' => result.global = true,
                'i' => result.ignore_case = true,
                'm' => result.multiline = true,
                'u' => result.unicode = true,
                'y' => result.sticky = true,
                _ => {}
            }
        }
        result
    }

    /// Whether `lastIndex` is read and written by matching operations
    pub fn stateful(&self) -> bool {
        self.global || self.sticky
    }

    pub(crate) fn options(&self) -> Options {
        Options {
            case_sensitive: !self.ignore_case,
            one_line: !self.multiline,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            f.write_str("g")?;
        }
        if self.ignore_case {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        f.write_str("u")?;
        if self.sticky {
            f.write_str("y")?;
        }
        Ok(())
    }
}

/// What to do when a pattern is constructed without the `u` flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnicodePolicy {
    /// Reject the construction with a syntax error
    Throw,
    /// Log a warning for every such construction
    Warn,
    /// Log a single warning, then stay silent
    WarnOnce,
    /// Say nothing
    #[default]
    Nothing,
}

impl UnicodePolicy {
    /// The name used on the command line and in the environment
    pub fn as_str(&self) -> &'static str {
        match self {
            UnicodePolicy::Throw => "throw",
            UnicodePolicy::Warn => "warn",
            UnicodePolicy::WarnOnce => "warnOnce",
            UnicodePolicy::Nothing => "nothing",
        }
    }
}

impl fmt::Display for UnicodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnicodePolicy {
    type Err = RegexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throw" => Ok(UnicodePolicy::Throw),
            "warn" => Ok(UnicodePolicy::Warn),
            "warnOnce" => Ok(UnicodePolicy::WarnOnce),
            "nothing" => Ok(UnicodePolicy::Nothing),
            other => Err(RegexError::Argument(format!(
                "unknown unicode warning policy '{}' (expected throw, warn, warnOnce or nothing)",
                other
            ))),
        }
    }
}
