//! Identifier parsing and validation.
//!
//! An identifier is the integer token a caller submits with each request.
//! Validation happens before anything touches the dedup store, so malformed
//! input never costs a network round trip.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

/// An integer-valued request identifier.
///
/// Identifiers carry no uniqueness guarantee of their own; uniqueness within a
/// window is decided by the dedup store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(i64);

impl Identifier {
    /// Parse and validate an identifier from its textual form.
    ///
    /// Accepts base-10 integers with an optional leading `+` or `-`. Surrounding
    /// whitespace is not trimmed.
    ///
    /// # Example
    /// ```
    /// use request_dedup::Identifier;
    ///
    /// assert_eq!(Identifier::parse("42").unwrap().value(), 42);
    /// assert_eq!(Identifier::parse("-7").unwrap().value(), -7);
    /// assert!(Identifier::parse("abc").is_err());
    /// assert!(Identifier::parse("").is_err());
    /// ```
    ///
    /// # Errors
    /// Returns a `ValidationError` describing why the token was rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        raw.parse::<i64>().map(Identifier).map_err(|e| match e.kind() {
            IntErrorKind::Empty => ValidationError::Empty,
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValidationError::OutOfRange {
                raw: raw.to_string(),
            },
            _ => ValidationError::Malformed {
                raw: raw.to_string(),
            },
        })
    }

    /// Wrap an already-validated integer.
    pub fn new(value: i64) -> Self {
        Identifier(value)
    }

    /// Get the integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Render the store key for this identifier under `prefix`.
    pub fn key(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.0)
    }
}

impl FromStr for Identifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier(value)
    }
}

/// Error returned when an identifier token fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The token was missing or empty
    Empty,
    /// The token is not a base-10 integer
    Malformed { raw: String },
    /// The token is an integer outside the supported width
    OutOfRange { raw: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "identifier is empty"),
            ValidationError::Malformed { raw } => {
                write!(f, "identifier {:?} is not an integer", raw)
            }
            ValidationError::OutOfRange { raw } => {
                write!(f, "identifier {:?} is out of range", raw)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
