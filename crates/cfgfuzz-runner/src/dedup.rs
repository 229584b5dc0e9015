use std::collections::HashSet;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Collapses crashes whose diagnostics differ only in positions, hashes or
/// quoted data.
#[derive(Debug)]
pub struct Deduplicator {
    seen: HashSet<String>,
    rules: Vec<(Regex, &'static str)>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        let rules = [
            (r":\d+:\d+", ":*:*"),
            (r"line \d+", "line *"),
            (r"[0-9a-fA-F]{8,}", "*"),
            (r#""[^"]*""#, r#""*""#),
            (r"'[^']*'", "'*'"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Some((Regex::new(pattern).ok()?, replacement)))
        .collect();
        Self {
            seen: HashSet::new(),
            rules,
        }
    }

    /// Normalized form of a crash reason, before hashing.
    pub fn normalize(&self, reason: &str) -> String {
        let stripped = reason
            .strip_prefix("Error: ")
            .or_else(|| reason.strip_prefix("Panic: "))
            .unwrap_or(reason);
        self.rules
            .iter()
            .fold(stripped.to_string(), |text, (regex, replacement)| {
                regex.replace_all(&text, *replacement).into_owned()
            })
    }

    /// SHA-256 hex digest of the normalized reason.
    pub fn fingerprint(&self, reason: &str) -> String {
        hex::encode(Sha256::digest(self.normalize(reason).as_bytes()))
    }

    pub fn is_duplicate(&self, reason: &str) -> bool {
        self.seen.contains(&self.fingerprint(reason))
    }

    /// Record the reason; returns whether its fingerprint was new.
    pub fn mark_seen(&mut self, reason: &str) -> bool {
        let fingerprint = self.fingerprint(reason);
        self.seen.insert(fingerprint)
    }

    pub fn unique_count(&self) -> usize {
        self.seen.len()
    }
}
