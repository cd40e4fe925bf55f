//! Opaque identifiers for albums and photos.
//!
//! Identifiers are 10 characters drawn uniformly from `0-9A-Za-z` using the
//! thread-local CSPRNG. At 62^10 possible values, collisions are unlikely
//! but not impossible; the metadata store primary key rejects duplicates.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Alphabet used for generated identifiers
pub const ID_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of every generated identifier
pub const ID_LENGTH: usize = 10;

/// Returns true iff `candidate` is exactly [`ID_LENGTH`] characters from [`ID_ALPHABET`].
pub fn is_valid_id(candidate: &str) -> bool {
    candidate.len() == ID_LENGTH && candidate.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A validated 10-character identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct OpaqueId(String);

impl OpaqueId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id: String = (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        OpaqueId(id)
    }

    /// Parse an untrusted string, rejecting anything that is not a well-formed identifier
    pub fn parse(candidate: &str) -> Result<Self, AppError> {
        if is_valid_id(candidate) {
            Ok(OpaqueId(candidate.to_string()))
        } else {
            Err(AppError::InvalidInput(format!(
                "Invalid identifier '{}': expected {} characters from [0-9A-Za-z]",
                candidate, ID_LENGTH
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OpaqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for OpaqueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for OpaqueId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpaqueId::parse(s)
    }
}

impl TryFrom<String> for OpaqueId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OpaqueId::parse(&value)
    }
}

impl From<OpaqueId> for String {
    fn from(id: OpaqueId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..500 {
            let id = OpaqueId::generate();
            assert_eq!(id.as_str().len(), ID_LENGTH);
            assert!(is_valid_id(id.as_str()), "{} should be valid", id);
        }
    }

    #[test]
    fn test_generated_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| OpaqueId::generate().into()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generator_covers_alphabet() {
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            seen.extend(OpaqueId::generate().as_str().bytes());
        }
        assert_eq!(seen.len(), ID_ALPHABET.len());
    }

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("abcDEF0123"));
        assert!(is_valid_id("0000000000"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("abcDEF012"));
        assert!(!is_valid_id("abcDEF01234"));
        assert!(!is_valid_id("abcDEF012-"));
        assert!(!is_valid_id("abcDEF012_"));
        assert!(!is_valid_id("abcDEF012 "));
        // multi-byte characters must not slip through on byte length
        assert!(!is_valid_id("abcdéfghi"));
        assert!(!is_valid_id("abcdefghiü"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = OpaqueId::parse("../etc/pw").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(OpaqueId::parse("Zz9Yy8Xx7W").unwrap().as_str(), "Zz9Yy8Xx7W");
    }

    #[test]
    fn test_serde_validates() {
        let ok: OpaqueId = serde_json::from_str("\"Zz9Yy8Xx7W\"").unwrap();
        assert_eq!(ok.to_string(), "Zz9Yy8Xx7W");
        assert!(serde_json::from_str::<OpaqueId>("\"short\"").is_err());
    }
}
