//! Linrex Core Library
//!
//! A linear-time stand-in for JavaScript `RegExp` objects: host pattern
//! syntax is translated for a non-backtracking engine, and `exec`, `match`,
//! `replace`, `search` and `split` reproduce the host's `lastIndex` and
//! offset semantics. Pattern sets match many patterns in one scan and report
//! which one matched.

pub mod compile;
pub mod engine;
pub mod error;
pub mod exec;
pub mod flags;
pub mod groups;
pub mod offsets;
pub mod regex;
pub mod replace;
pub mod subject;
pub mod translate;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use compile::{Compiler, PatternInput, is_safe_for_set};
pub use error::{CallbackError, RegexError, Result};
pub use exec::{MatchOutcome, MatchResult};
pub use flags::{Flags, UnicodePolicy};
pub use groups::{GroupInfo, GroupRegistry, GroupRegistryError};
pub use regex::Regex;
pub use replace::{ReplaceFn, Replacement, ReplacementPart, Replacer};
pub use subject::{Fragment, Subject, Value};
pub use translate::{TranslateReport, escape_literal, translate, translate_debug};
