//! # Fingerprint Engine
//!
//! A Rust library for loading declarative fingerprint databases and matching
//! arbitrary input strings (service banners, headers, version strings)
//! against them to extract structured identification data.
//!
//! Fingerprints pair a regular expression with named output fields resolved
//! from capture groups or constants. Databases are parsed from XML
//! definition documents in strict or lenient mode; regex evaluation sits
//! behind a pluggable [`PatternMatcher`] capability so the backend can be
//! swapped without touching field-resolution semantics.
//!
//! ## Quick Start
//!
//! ```rust
//! use fingerprint_engine::DatabaseParser;
//!
//! let document = r#"
//! <fingerprints matches="ssh.banner" protocol="ssh" preference="0.9">
//!   <fingerprint pattern="OpenSSH_([\d.]+)p(\d+)">
//!     <description>OpenSSH portable</description>
//!     <example service.version="8.9">SSH-2.0-OpenSSH_8.9p1</example>
//!     <param pos="0" name="service.product" value="OpenSSH"/>
//!     <param pos="1" name="service.version"/>
//!     <param pos="2" name="service.patchlevel"/>
//!   </fingerprint>
//! </fingerprints>
//! "#;
//!
//! // Lenient mode: malformed entries are logged and skipped.
//! let parser = DatabaseParser::new(false);
//! let database = parser.parse_str(document, "ssh")?;
//!
//! let result = database.first_match("SSH-2.0-OpenSSH_8.9p1").unwrap();
//! assert_eq!(result.get("service.product"), Some("OpenSSH"));
//! assert_eq!(result.get("service.version"), Some("8.9"));
//! assert_eq!(result.get("service.patchlevel"), Some("1"));
//!
//! // Databases validate against their embedded examples.
//! assert!(database.verify_examples().is_empty());
//! # Ok::<(), fingerprint_engine::FingerprintError>(())
//! ```
//!
//! ## Swapping the regex backend
//!
//! ```rust,ignore
//! use fingerprint_engine::{DatabaseParser, PatternMatcherFactory};
//! use std::sync::Arc;
//!
//! let factory: PatternMatcherFactory = Arc::new(|pattern, flags| {
//!     // compile with an alternate engine that mirrors another dialect
//!     MyPatternMatcher::compile(pattern, flags)
//! });
//! let parser = DatabaseParser::with_factory(true, factory);
//! ```

pub mod database;
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod pattern;

// Database and parsing pipeline
pub use database::FingerprintDatabase;
pub use parser::DatabaseParser;

// Definition model and matching engine
pub use fingerprint::{
    FieldRule, Fingerprint, FingerprintExample, MatchResult, VerificationFailure,
};

// Core errors
pub use error::{FingerprintError, Result};

// Pattern matcher capability
pub use pattern::{
    default_pattern_matcher_factory, PatternFlags, PatternMatcher, PatternMatcherFactory,
    RegexPatternMatcher,
};
