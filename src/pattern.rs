//! Pluggable pattern matching capability.
//!
//! The engine never evaluates regular expressions directly. It compiles
//! pattern text through a [`PatternMatcherFactory`] and matches through the
//! [`PatternMatcher`] trait, so the backend can be swapped (for example to
//! mirror another engine's dialect) without touching field-resolution logic.
//!
//! The default backend is the `regex` crate, wired up by
//! [`default_pattern_matcher_factory`].

use crate::error::{FingerprintError, Result};
use regex::RegexBuilder;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Pattern compilation flags, independent of any backend's native encoding.
///
/// Fingerprint documents declare flags as text tokens; the parser translates
/// them into these bits and each backend maps the bits onto its own dialect.
///
/// # Examples
///
/// ```rust
/// use fingerprint_engine::PatternFlags;
///
/// let flags = PatternFlags::CASE_INSENSITIVE | PatternFlags::MULTILINE;
/// assert!(flags.contains(PatternFlags::CASE_INSENSITIVE));
/// assert!(!flags.contains(PatternFlags::DOT_MATCHES_NEWLINE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternFlags(u32);

impl PatternFlags {
    pub const NONE: PatternFlags = PatternFlags(0);
    pub const CASE_INSENSITIVE: PatternFlags = PatternFlags(1);
    pub const DOT_MATCHES_NEWLINE: PatternFlags = PatternFlags(1 << 1);
    pub const MULTILINE: PatternFlags = PatternFlags(1 << 2);

    /// Returns `true` if every bit in `other` is set in `self`.
    pub fn contains(self, other: PatternFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw bit representation.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for PatternFlags {
    type Output = PatternFlags;

    fn bitor(self, rhs: PatternFlags) -> PatternFlags {
        PatternFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PatternFlags {
    fn bitor_assign(&mut self, rhs: PatternFlags) {
        self.0 |= rhs.0;
    }
}

/// A compiled pattern ready for repeated matching.
///
/// Implementations must be safe to invoke concurrently; a fully parsed
/// database is shared read-only across matching workloads.
pub trait PatternMatcher: Send + Sync {
    /// The original pattern text this matcher was compiled from.
    fn pattern(&self) -> &str;

    /// Attempts to match `input`, returning the captured group texts.
    ///
    /// Index 0 holds the whole match; field rules only reference groups from
    /// index 1. A group that did not participate in the match is `None`.
    /// Returns `None` when the pattern does not match at all.
    fn captures(&self, input: &str) -> Option<Vec<Option<String>>>;
}

/// Factory producing a [`PatternMatcher`] from pattern text and flags.
///
/// Compilation of syntactically invalid pattern text must fail with
/// [`FingerprintError::InvalidPattern`]; the parser treats that as a
/// definition-level error, not a fatal one.
pub type PatternMatcherFactory =
    Arc<dyn Fn(&str, PatternFlags) -> Result<Box<dyn PatternMatcher>> + Send + Sync>;

/// Default [`PatternMatcher`] backed by the `regex` crate.
#[derive(Debug)]
pub struct RegexPatternMatcher {
    pattern: String,
    regex: regex::Regex,
}

impl RegexPatternMatcher {
    /// Compiles `pattern` with the dialect-independent `flags` translated to
    /// the `regex` crate's builder options.
    pub fn compile(pattern: &str, flags: PatternFlags) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.contains(PatternFlags::CASE_INSENSITIVE))
            .dot_matches_new_line(flags.contains(PatternFlags::DOT_MATCHES_NEWLINE))
            .multi_line(flags.contains(PatternFlags::MULTILINE))
            .build()
            .map_err(|e| FingerprintError::InvalidPattern(format!("{pattern}: {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }
}

impl PatternMatcher for RegexPatternMatcher {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn captures(&self, input: &str) -> Option<Vec<Option<String>>> {
        self.regex.captures(input).map(|caps| {
            (0..caps.len())
                .map(|index| caps.get(index).map(|group| group.as_str().to_string()))
                .collect()
        })
    }
}

/// The factory used when no override is supplied to the parser.
pub fn default_pattern_matcher_factory() -> PatternMatcherFactory {
    Arc::new(|pattern, flags| {
        RegexPatternMatcher::compile(pattern, flags)
            .map(|matcher| Box::new(matcher) as Box<dyn PatternMatcher>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_bitor() {
        let flags = PatternFlags::CASE_INSENSITIVE | PatternFlags::DOT_MATCHES_NEWLINE;
        assert!(flags.contains(PatternFlags::CASE_INSENSITIVE));
        assert!(flags.contains(PatternFlags::DOT_MATCHES_NEWLINE));
        assert!(!flags.contains(PatternFlags::MULTILINE));
    }

    #[test]
    fn test_flags_bitor_assign() {
        let mut flags = PatternFlags::NONE;
        flags |= PatternFlags::MULTILINE;
        assert!(flags.contains(PatternFlags::MULTILINE));
        assert_eq!(flags.bits(), PatternFlags::MULTILINE.bits());
    }

    #[test]
    fn test_flags_default_is_none() {
        assert_eq!(PatternFlags::default(), PatternFlags::NONE);
        assert_eq!(PatternFlags::NONE.bits(), 0);
    }

    #[test]
    fn test_compile_and_capture() {
        let matcher = RegexPatternMatcher::compile(r"Apache/(\d+)\.(\d+)", PatternFlags::NONE)
            .expect("pattern should compile");

        let groups = matcher.captures("Server: Apache/2.4").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].as_deref(), Some("Apache/2.4"));
        assert_eq!(groups[1].as_deref(), Some("2"));
        assert_eq!(groups[2].as_deref(), Some("4"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let matcher = RegexPatternMatcher::compile("^nginx", PatternFlags::NONE).unwrap();
        assert!(matcher.captures("Apache httpd").is_none());
    }

    #[test]
    fn test_unmatched_optional_group_is_none() {
        let matcher =
            RegexPatternMatcher::compile(r"OpenSSH_(\d+\.\d+)(p\d+)?", PatternFlags::NONE).unwrap();

        let groups = matcher.captures("SSH-2.0-OpenSSH_8.9").unwrap();
        assert_eq!(groups[1].as_deref(), Some("8.9"));
        assert_eq!(groups[2], None);
    }

    #[test]
    fn test_case_insensitive_flag() {
        let sensitive = RegexPatternMatcher::compile("^acme$", PatternFlags::NONE).unwrap();
        assert!(sensitive.captures("ACME").is_none());

        let insensitive =
            RegexPatternMatcher::compile("^acme$", PatternFlags::CASE_INSENSITIVE).unwrap();
        assert!(insensitive.captures("ACME").is_some());
    }

    #[test]
    fn test_dot_matches_newline_flag() {
        let plain = RegexPatternMatcher::compile("a.b", PatternFlags::NONE).unwrap();
        assert!(plain.captures("a\nb").is_none());

        let dotall =
            RegexPatternMatcher::compile("a.b", PatternFlags::DOT_MATCHES_NEWLINE).unwrap();
        assert!(dotall.captures("a\nb").is_some());
    }

    #[test]
    fn test_multiline_flag() {
        let plain = RegexPatternMatcher::compile("^two$", PatternFlags::NONE).unwrap();
        assert!(plain.captures("one\ntwo").is_none());

        let multiline = RegexPatternMatcher::compile("^two$", PatternFlags::MULTILINE).unwrap();
        assert!(multiline.captures("one\ntwo").is_some());
    }

    #[test]
    fn test_invalid_pattern_is_definition_error() {
        let result = RegexPatternMatcher::compile("(unclosed", PatternFlags::NONE);
        match result {
            Err(FingerprintError::InvalidPattern(msg)) => assert!(msg.contains("(unclosed")),
            other => panic!("Expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_pattern_text_is_preserved() {
        let matcher = RegexPatternMatcher::compile(r"nginx/(\S+)", PatternFlags::NONE).unwrap();
        assert_eq!(matcher.pattern(), r"nginx/(\S+)");
    }

    #[test]
    fn test_default_factory_produces_working_matcher() {
        let factory = default_pattern_matcher_factory();
        let matcher = factory("ssh", PatternFlags::CASE_INSENSITIVE).unwrap();
        assert!(matcher.captures("SSH-2.0-OpenSSH_8.9").is_some());
    }

    #[test]
    fn test_factory_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternMatcherFactory>();
        assert_send_sync::<Box<dyn PatternMatcher>>();
    }
}
