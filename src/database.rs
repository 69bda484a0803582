//! Ordered fingerprint collections with shared provenance metadata.

use crate::fingerprint::{Fingerprint, MatchResult, VerificationFailure};

/// An ordered set of fingerprints parsed from one definition document.
///
/// Insertion order is preserved and is the authoritative match-attempt order
/// for first-match semantics. The engine itself is order-agnostic: callers
/// pick [`first_match`](Self::first_match),
/// [`best_match`](Self::best_match) or [`all_matches`](Self::all_matches).
///
/// Once parsing completes the database is read-only and safe to share across
/// concurrent matching workloads.
#[derive(Debug)]
pub struct FingerprintDatabase {
    path: Option<String>,
    key: String,
    protocol: Option<String>,
    database_type: Option<String>,
    preference: f32,
    fingerprints: Vec<Fingerprint>,
}

impl FingerprintDatabase {
    /// Creates an empty database.
    ///
    /// `key` must be non-empty; the parser substitutes its caller-supplied
    /// default name before constructing the database.
    pub fn new(
        path: Option<String>,
        key: impl Into<String>,
        protocol: Option<String>,
        database_type: Option<String>,
        preference: f32,
    ) -> Self {
        Self {
            path,
            key: key.into(),
            protocol,
            database_type,
            preference,
            fingerprints: Vec::new(),
        }
    }

    /// Source file path, when the database was parsed from a file.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Identifying name of the database. Never empty.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn database_type(&self) -> Option<&str> {
        self.database_type.as_deref()
    }

    /// Ranking weight used by callers holding several databases.
    pub fn preference(&self) -> f32 {
        self.preference
    }

    /// Appends a fingerprint, preserving insertion order.
    ///
    /// No uniqueness constraint applies to pattern text or description.
    pub fn add(&mut self, fingerprint: Fingerprint) {
        self.fingerprints.push(fingerprint);
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.fingerprints.iter()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Result of the first fingerprint, in insertion order, that matches.
    pub fn first_match(&self, input: &str) -> Option<MatchResult> {
        self.fingerprints
            .iter()
            .find_map(|fingerprint| fingerprint.attempt_match(input))
    }

    /// Result with the most resolved fields; earlier fingerprints win ties.
    pub fn best_match(&self, input: &str) -> Option<MatchResult> {
        let mut best: Option<MatchResult> = None;
        for fingerprint in &self.fingerprints {
            if let Some(result) = fingerprint.attempt_match(input) {
                let better = best
                    .as_ref()
                    .map_or(true, |current| result.len() > current.len());
                if better {
                    best = Some(result);
                }
            }
        }
        best
    }

    /// Results of every matching fingerprint, in insertion order.
    pub fn all_matches(&self, input: &str) -> Vec<MatchResult> {
        self.fingerprints
            .iter()
            .filter_map(|fingerprint| fingerprint.attempt_match(input))
            .collect()
    }

    /// Checks every fingerprint against its embedded examples.
    ///
    /// Aggregates discrepancies across the whole database; empty means
    /// self-consistent.
    pub fn verify_examples(&self) -> Vec<VerificationFailure> {
        self.fingerprints
            .iter()
            .flat_map(|fingerprint| fingerprint.verify_examples())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FingerprintDatabase {
    type Item = &'a Fingerprint;
    type IntoIter = std::slice::Iter<'a, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.fingerprints.iter()
    }
}
