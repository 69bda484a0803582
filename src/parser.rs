//! Fingerprint database parsing.
//!
//! [`DatabaseParser`] converts one XML definition document into one
//! [`FingerprintDatabase`]. The parser supports strict or lenient mode. In
//! lenient mode parsing is tolerant: malformed fingerprint entries are
//! logged and skipped, and as many definitions as possible are produced. In
//! strict mode any definition-level error aborts the whole parse.
//!
//! Per-entry parsing is error-return-based and identical in both modes; the
//! strictness flag is consulted at a single continue-or-abort decision point.

use crate::database::FingerprintDatabase;
use crate::error::{FingerprintError, Result};
use crate::fingerprint::{FieldRule, Fingerprint, FingerprintExample};
use crate::pattern::{default_pattern_matcher_factory, PatternFlags, PatternMatcherFactory};
use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parses fingerprint databases from XML definition documents.
///
/// # Examples
///
/// ```rust
/// use fingerprint_engine::DatabaseParser;
///
/// let document = r#"
/// <fingerprints matches="ssh_banners" protocol="ssh">
///   <fingerprint pattern="OpenSSH_([\d.]+)">
///     <description>OpenSSH version banner</description>
///     <param pos="0" name="service.vendor" value="OpenBSD"/>
///     <param pos="1" name="service.version"/>
///   </fingerprint>
/// </fingerprints>
/// "#;
///
/// let parser = DatabaseParser::new(false);
/// let database = parser.parse_str(document, "ssh")?;
/// assert_eq!(database.key(), "ssh_banners");
///
/// let result = database.first_match("SSH-2.0-OpenSSH_8.9").unwrap();
/// assert_eq!(result.get("service.vendor"), Some("OpenBSD"));
/// assert_eq!(result.get("service.version"), Some("8.9"));
/// # Ok::<(), fingerprint_engine::FingerprintError>(())
/// ```
pub struct DatabaseParser {
    strict: bool,
    factory: PatternMatcherFactory,
}

impl Default for DatabaseParser {
    fn default() -> Self {
        Self::new(false)
    }
}

impl DatabaseParser {
    /// Creates a parser with the given strictness and the default
    /// `regex`-backed pattern matcher.
    pub fn new(strict: bool) -> Self {
        Self::with_factory(strict, default_pattern_matcher_factory())
    }

    /// Creates a parser with the given strictness and a custom pattern
    /// matcher factory.
    pub fn with_factory(strict: bool, factory: PatternMatcherFactory) -> Self {
        Self { strict, factory }
    }

    /// Whether definition-level errors abort the whole parse.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Parses a database from the file at `path`.
    ///
    /// The file stem serves as the default database key and the path is
    /// recorded as provenance.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<FingerprintDatabase> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FingerprintError::DocumentError(format!(
                "failed to read fingerprint database {}: {e}",
                path.display()
            ))
        })?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        self.parse_str_with_path(&content, Some(&path.to_string_lossy()), name)
    }

    /// Parses a database from document text.
    ///
    /// `name` is used as the database key when the document does not declare
    /// one; it must be non-empty for the key to stay non-empty.
    pub fn parse_str(&self, content: &str, name: &str) -> Result<FingerprintDatabase> {
        self.parse_str_with_path(content, None, name)
    }

    /// Parses a database from document text with an optional provenance
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::DocumentError`] when `content` is not a
    /// well-formed document, regardless of mode. Definition-level errors
    /// are returned only in strict mode; lenient mode logs them and skips
    /// the offending entry. A document with zero valid fingerprints still
    /// yields an empty database.
    pub fn parse_str_with_path(
        &self,
        content: &str,
        path: Option<&str>,
        name: &str,
    ) -> Result<FingerprintDatabase> {
        let document = Document::parse(content).map_err(|e| {
            FingerprintError::DocumentError(format!("unable to parse fingerprint document: {e}"))
        })?;
        let root = document.root_element();

        // Malformed preference weights never fail, even in strict mode.
        let preference = root
            .attribute("preference")
            .and_then(|value| value.parse::<f32>().ok())
            .unwrap_or(0.0);

        let key = match root.attribute("matches") {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                debug!(fallback = name, "database key missing from document");
                name.to_string()
            }
        };

        let mut database = FingerprintDatabase::new(
            path.map(str::to_string),
            key,
            non_empty(root.attribute("protocol")),
            non_empty(root.attribute("database_type")),
            preference,
        );

        for node in root
            .descendants()
            .filter(|node| node.has_tag_name("fingerprint"))
        {
            match self.parse_fingerprint(node) {
                Ok(fingerprint) => database.add(fingerprint),
                Err(error) => {
                    warn!(error = %error, "failed to parse fingerprint entry");
                    if self.strict {
                        return Err(error);
                    }
                }
            }
        }

        Ok(database)
    }

    /// Parses a single fingerprint element.
    fn parse_fingerprint(&self, node: Node<'_, '_>) -> Result<Fingerprint> {
        let pattern = required_attribute(node, "pattern")?;
        let flags = parse_flags(node.attribute("flags").unwrap_or_default());
        let matcher = (self.factory)(pattern, flags)?;
        let mut fingerprint = Fingerprint::new(matcher);

        if let Some(description) = node
            .descendants()
            .find(|child| child.has_tag_name("description"))
        {
            fingerprint.set_description(text_content(description));
        }

        for example in node
            .descendants()
            .filter(|child| child.has_tag_name("example"))
        {
            // TODO: decode base64-encoded examples instead of dropping them
            if example.attribute("_encoding") == Some("base64") {
                continue;
            }

            let attributes = example
                .attributes()
                .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
                .collect();
            fingerprint.add_example(FingerprintExample::new(text_content(example), attributes));
        }

        for param in node
            .descendants()
            .filter(|child| child.has_tag_name("param"))
        {
            let raw_position = required_attribute(param, "pos")?;
            let position: i64 = raw_position.parse().map_err(|_| {
                FingerprintError::InvalidPosition(format!("\"{raw_position}\" is not an integer"))
            })?;
            let name = required_attribute(param, "name")?;

            if position == 0 {
                // Zero position declares a constant value.
                let value = required_attribute(param, "value")?;
                fingerprint.add_field(name, FieldRule::Constant(value.to_string()));
            } else if position < 0 {
                return Err(FingerprintError::InvalidPosition(format!(
                    "field \"{name}\" declares negative position {position}"
                )));
            } else {
                // A positive position binds a capture group and must not
                // also carry a literal.
                if let Some(value) = param.attribute("value").filter(|value| !value.is_empty()) {
                    return Err(FingerprintError::AmbiguousFieldRule(format!(
                        "field \"{name}\" has a non-zero position but specifies a value of \"{value}\""
                    )));
                }
                fingerprint.add_field(name, FieldRule::CaptureGroup(position as usize));
            }
        }

        Ok(fingerprint)
    }
}

/// Translates a flags attribute into dialect-independent pattern flags.
///
/// Tokens are delimited by pipe, comma, semicolon, space or tab.
/// Unrecognized tokens are ignored for forward compatibility.
fn parse_flags(flags: &str) -> PatternFlags {
    let mut parsed = PatternFlags::NONE;
    for token in flags
        .split(['|', ',', ';', ' ', '\t'])
        .filter(|token| !token.is_empty())
    {
        match token {
            "REG_ICASE" | "IGNORECASE" => parsed |= PatternFlags::CASE_INSENSITIVE,
            "REG_DOT_NEWLINE" => parsed |= PatternFlags::DOT_MATCHES_NEWLINE,
            "REG_MULTILINE" => parsed |= PatternFlags::MULTILINE,
            _ => {}
        }
    }
    parsed
}

/// An attribute that is absent or empty is treated as missing.
fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    match node.attribute(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(FingerprintError::MissingAttribute(name.to_string())),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

/// Concatenated text content of a node's descendants.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}
