//! The four-way result of submitting an identifier.

use std::fmt;

/// Outcome of an ingestion attempt.
///
/// The four variants are a hard contract: a transport layer maps each one to a
/// distinct response class (success, duplicate, invalid-input, internal-error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The identifier is new for the current window
    Accepted,
    /// The identifier was already seen in the current window
    Duplicate,
    /// The identifier token failed validation
    Invalid,
    /// The dedup store could not be reached or returned an error
    StoreError,
}

impl Outcome {
    /// Returns true if the identifier was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    /// Returns true if the identifier was rejected as a duplicate.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Outcome::Duplicate)
    }

    /// Short, stable label suitable for log fields and metric names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Duplicate => "duplicate",
            Outcome::Invalid => "invalid",
            Outcome::StoreError => "store_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(Outcome::Accepted.is_accepted());
        assert!(!Outcome::Duplicate.is_accepted());
        assert!(Outcome::Duplicate.is_duplicate());
        assert!(!Outcome::Invalid.is_duplicate());
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels = [
            Outcome::Accepted.as_str(),
            Outcome::Duplicate.as_str(),
            Outcome::Invalid.as_str(),
            Outcome::StoreError.as_str(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(Outcome::StoreError.to_string(), "store_error");
    }
}
