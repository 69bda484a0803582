//! Fingerprint definitions and the field-extraction matching engine.
//!
//! A [`Fingerprint`] pairs one compiled pattern with the rules that turn a
//! raw regex match into named output fields. Rules are either constants
//! (declared at position 0 in the source document) or capture-group
//! bindings (positive positions); the distinction is fixed at parse time as
//! a [`FieldRule`] and never re-derived from raw positions here.

use crate::pattern::PatternMatcher;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Resolution rule for one declared output field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// The field always resolves to this literal value.
    Constant(String),
    /// The field takes the text of the referenced capture group (from 1).
    CaptureGroup(usize),
}

/// One example input attached to a fingerprint for self-validation.
///
/// Attributes are free-form metadata from the source document; by
/// convention, attributes not prefixed with `_` name expected field values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintExample {
    text: String,
    attributes: HashMap<String, String>,
}

impl FingerprintExample {
    pub fn new(text: impl Into<String>, attributes: HashMap<String, String>) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    /// The literal input text the fingerprint is expected to match.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Named-field output of successfully matching one fingerprint.
///
/// Constants are copied verbatim; capture-derived fields hold the text of
/// their group. Fields whose group did not participate in the match are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MatchResult {
    fields: HashMap<String, String>,
}

impl MatchResult {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> HashMap<String, String> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A discrepancy found while checking a fingerprint against its examples.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationFailure {
    /// The example input that produced the discrepancy.
    pub example: String,
    /// Human-readable description of what did not line up.
    pub detail: String,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "example {:?}: {}", self.example, self.detail)
    }
}

/// One named pattern plus its field-extraction rules and examples.
pub struct Fingerprint {
    matcher: Box<dyn PatternMatcher>,
    description: Option<String>,
    examples: Vec<FingerprintExample>,
    constants: HashMap<String, String>,
    capture_fields: BTreeMap<usize, String>,
}

impl Fingerprint {
    pub fn new(matcher: Box<dyn PatternMatcher>) -> Self {
        Self {
            matcher,
            description: None,
            examples: Vec::new(),
            constants: HashMap::new(),
            capture_fields: BTreeMap::new(),
        }
    }

    /// The pattern text this fingerprint was compiled from.
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn examples(&self) -> &[FingerprintExample] {
        &self.examples
    }

    pub fn add_example(&mut self, example: FingerprintExample) {
        self.examples.push(example);
    }

    /// Fields resolved to constant values (declared at position 0).
    pub fn constant_fields(&self) -> &HashMap<String, String> {
        &self.constants
    }

    /// Capture-group index to field name bindings (positive positions).
    pub fn capture_fields(&self) -> &BTreeMap<usize, String> {
        &self.capture_fields
    }

    /// Registers the resolution rule for `name`.
    ///
    /// A field has exactly one rule: registering a name again replaces any
    /// earlier constant or group binding for it.
    pub fn add_field(&mut self, name: impl Into<String>, rule: FieldRule) {
        let name = name.into();
        self.constants.remove(&name);
        self.capture_fields.retain(|_, bound| *bound != name);

        match rule {
            FieldRule::Constant(value) => {
                self.constants.insert(name, value);
            }
            FieldRule::CaptureGroup(position) => {
                self.capture_fields.insert(position, name);
            }
        }
    }

    /// Attempts to match `input` and resolve the declared fields.
    ///
    /// Returns `None` when the pattern does not match. On a match, every
    /// constant is copied and every capture-derived field is resolved from
    /// its group; a group index beyond the pattern's group count, or a group
    /// that did not participate in this particular match, leaves that field
    /// out of the result rather than failing. A successful pattern match
    /// therefore always produces `Some`, even with no resolved fields.
    pub fn attempt_match(&self, input: &str) -> Option<MatchResult> {
        let groups = self.matcher.captures(input)?;

        let mut fields = self.constants.clone();
        for (&position, name) in &self.capture_fields {
            if let Some(Some(text)) = groups.get(position) {
                fields.insert(name.clone(), text.clone());
            }
        }

        Some(MatchResult { fields })
    }

    /// Checks this fingerprint against its embedded examples.
    ///
    /// Every example must match the pattern, and every example attribute not
    /// prefixed with `_` is treated as an expected field value and compared
    /// against the resolved result. Returns one entry per discrepancy; an
    /// empty vector means the definition is self-consistent. This is a
    /// database integrity check, not part of the live matching path.
    pub fn verify_examples(&self) -> Vec<VerificationFailure> {
        let mut failures = Vec::new();

        for example in &self.examples {
            let Some(result) = self.attempt_match(example.text()) else {
                failures.push(VerificationFailure {
                    example: example.text().to_string(),
                    detail: format!("pattern {:?} does not match", self.pattern()),
                });
                continue;
            };

            for (name, expected) in example.attributes() {
                if name.starts_with('_') {
                    continue;
                }
                match result.get(name) {
                    Some(actual) if actual == expected.as_str() => {}
                    Some(actual) => failures.push(VerificationFailure {
                        example: example.text().to_string(),
                        detail: format!(
                            "field \"{name}\" resolved to {actual:?}, expected {expected:?}"
                        ),
                    }),
                    None => failures.push(VerificationFailure {
                        example: example.text().to_string(),
                        detail: format!("field \"{name}\" was not resolved, expected {expected:?}"),
                    }),
                }
            }
        }

        failures
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("pattern", &self.pattern())
            .field("description", &self.description)
            .field("examples", &self.examples.len())
            .field("constants", &self.constants)
            .field("capture_fields", &self.capture_fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternFlags, RegexPatternMatcher};

    fn fingerprint(pattern: &str) -> Fingerprint {
        fingerprint_with_flags(pattern, PatternFlags::NONE)
    }

    fn fingerprint_with_flags(pattern: &str, flags: PatternFlags) -> Fingerprint {
        let matcher = RegexPatternMatcher::compile(pattern, flags).expect("test pattern");
        Fingerprint::new(Box::new(matcher))
    }

    #[test]
    fn test_constant_and_capture_extraction() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("vendor", FieldRule::Constant("Acme".to_string()));
        fp.add_field("version", FieldRule::CaptureGroup(1));

        let result = fp.attempt_match("Acme v3").expect("should match");
        assert_eq!(result.get("vendor"), Some("Acme"));
        assert_eq!(result.get("version"), Some("3"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_no_match_yields_none() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("vendor", FieldRule::Constant("Acme".to_string()));

        assert!(fp.attempt_match("Globex 9000").is_none());
    }

    #[test]
    fn test_match_without_declared_fields_is_empty_result() {
        let fp = fingerprint("nginx");
        let result = fp.attempt_match("nginx/1.25.3").expect("should match");
        assert!(result.is_empty());
    }

    #[test]
    fn test_out_of_range_group_is_omitted() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("version", FieldRule::CaptureGroup(1));
        fp.add_field("build", FieldRule::CaptureGroup(7));

        let result = fp.attempt_match("Acme v3").expect("should match");
        assert_eq!(result.get("version"), Some("3"));
        assert_eq!(result.get("build"), None);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_unmatched_optional_group_is_omitted() {
        let mut fp = fingerprint(r"OpenSSH_(\d+\.\d+)(?:p(\d+))?");
        fp.add_field("version", FieldRule::CaptureGroup(1));
        fp.add_field("patchlevel", FieldRule::CaptureGroup(2));

        let result = fp.attempt_match("SSH-2.0-OpenSSH_8.9").expect("should match");
        assert_eq!(result.get("version"), Some("8.9"));
        assert_eq!(result.get("patchlevel"), None);

        let result = fp.attempt_match("SSH-2.0-OpenSSH_8.9p1").expect("should match");
        assert_eq!(result.get("patchlevel"), Some("1"));
    }

    #[test]
    fn test_field_rule_is_exclusive_per_name() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("version", FieldRule::Constant("unknown".to_string()));
        fp.add_field("version", FieldRule::CaptureGroup(1));

        assert!(fp.constant_fields().is_empty());
        assert_eq!(fp.capture_fields().get(&1).map(String::as_str), Some("version"));

        fp.add_field("version", FieldRule::Constant("fixed".to_string()));
        assert!(fp.capture_fields().is_empty());
        assert_eq!(
            fp.constant_fields().get("version").map(String::as_str),
            Some("fixed")
        );
    }

    #[test]
    fn test_case_insensitive_fingerprint() {
        let fp = fingerprint_with_flags("^acme$", PatternFlags::CASE_INSENSITIVE);
        assert!(fp.attempt_match("ACME").is_some());

        let strict = fingerprint("^acme$");
        assert!(strict.attempt_match("ACME").is_none());
    }

    #[test]
    fn test_verify_examples_pass() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("vendor", FieldRule::Constant("Acme".to_string()));
        fp.add_field("version", FieldRule::CaptureGroup(1));
        fp.add_example(FingerprintExample::new(
            "Acme v3",
            HashMap::from([
                ("vendor".to_string(), "Acme".to_string()),
                ("version".to_string(), "3".to_string()),
            ]),
        ));

        assert!(fp.verify_examples().is_empty());
    }

    #[test]
    fn test_verify_examples_reports_non_matching_example() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_example(FingerprintExample::new("Globex 9000", HashMap::new()));

        let failures = fp.verify_examples();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].detail.contains("does not match"));
        assert_eq!(failures[0].example, "Globex 9000");
    }

    #[test]
    fn test_verify_examples_reports_field_mismatch() {
        let mut fp = fingerprint(r"Acme v(\d+)");
        fp.add_field("version", FieldRule::CaptureGroup(1));
        fp.add_example(FingerprintExample::new(
            "Acme v3",
            HashMap::from([("version".to_string(), "4".to_string())]),
        ));

        let failures = fp.verify_examples();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].detail.contains("\"version\""));
        assert!(failures[0].detail.contains("expected \"4\""));
    }

    #[test]
    fn test_verify_examples_ignores_control_attributes() {
        let mut fp = fingerprint("Acme");
        fp.add_example(FingerprintExample::new(
            "Acme",
            HashMap::from([("_filename".to_string(), "acme.txt".to_string())]),
        ));

        assert!(fp.verify_examples().is_empty());
    }

    #[test]
    fn test_match_result_accessors() {
        let mut fp = fingerprint(r"(\w+)/(\S+)");
        fp.add_field("product", FieldRule::CaptureGroup(1));
        fp.add_field("version", FieldRule::CaptureGroup(2));

        let result = fp.attempt_match("nginx/1.25.3").expect("should match");
        assert!(!result.is_empty());
        assert_eq!(result.fields().len(), 2);

        let fields = result.into_fields();
        assert_eq!(fields.get("product").map(String::as_str), Some("nginx"));
    }

    #[test]
    fn test_fingerprint_debug_shows_pattern() {
        let mut fp = fingerprint("Acme");
        fp.set_description("Acme banner");
        let debug = format!("{fp:?}");
        assert!(debug.contains("Acme"));
    }
}
