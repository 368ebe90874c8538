//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Object identifier (20-byte hash, 40 lowercase hex characters)
//! - [`RefName`] - Validated reference name
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the commit pipeline never has to re-check
//! an id or a ref name it has already been handed.
//!
//! # Examples
//!
//! ```
//! use commitwork::core::types::{Oid, RefName};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let head = RefName::head();
//!
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(RefName::new("refs/heads/bad..name").is_err());
//! assert_eq!(head.as_str(), "HEAD");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// An object identifier.
///
/// Always exactly 40 lowercase hex characters (a 20-byte hash). Input is
/// normalized to lowercase.
///
/// # Example
///
/// ```
/// use commitwork::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
///
/// let bytes = oid.to_bytes();
/// assert_eq!(Oid::from_bytes(bytes), oid);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Raw hash length in bytes.
    pub const RAW_LEN: usize = 20;

    /// Hex-encoded length in characters.
    pub const HEX_LEN: usize = 40;

    const ZERO: &'static str = "0000000000000000000000000000000000000000";

    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not 40 hex characters.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Build an object id from its raw 20-byte form.
    pub fn from_bytes(bytes: [u8; Self::RAW_LEN]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Decode the id into its raw 20-byte form.
    pub fn to_bytes(&self) -> [u8; Self::RAW_LEN] {
        let mut out = [0u8; Self::RAW_LEN];
        // Length and alphabet were checked at construction.
        if hex::decode_to_slice(&self.0, &mut out).is_err() {
            return [0u8; Self::RAW_LEN];
        }
        out
    }

    /// The all-zero id, used for "no object".
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Check if this is the all-zero id.
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    /// Get an abbreviated form of the id.
    ///
    /// Returns the first `len` characters, or the full id if `len` is larger.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        if oid.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!(
                "object id must be hexadecimal: {oid}"
            )));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated reference name.
///
/// Either `HEAD` or a name conforming to Git's refname rules
/// (see `git check-ref-format`).
///
/// # Example
///
/// ```
/// use commitwork::core::types::RefName;
///
/// assert!(RefName::head().is_head());
///
/// let branch = RefName::for_branch("feature/foo").unwrap();
/// assert_eq!(branch.as_str(), "refs/heads/feature/foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    const HEAD: &'static str = "HEAD";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The symbolic `HEAD` reference.
    pub fn head() -> Self {
        Self(Self::HEAD.to_string())
    }

    /// Create a ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &str) -> Result<Self, TypeError> {
        Self::new(format!("refs/heads/{branch}"))
    }

    /// Check if this is the symbolic `HEAD` reference.
    pub fn is_head(&self) -> bool {
        self.0 == Self::HEAD
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        if name.starts_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start with '/'".into(),
            ));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }

        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{forbidden}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        // A one-level name other than HEAD would be an ambiguous pseudo-ref.
        if !name.contains('/') && name != Self::HEAD {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}' must be HEAD or live under refs/"
            )));
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RefName {
    fn default() -> Self {
        Self::head()
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod oid {
        use super::*;

        #[test]
        fn valid_oid_accepted() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.as_str().len(), 40);
        }

        #[test]
        fn normalized_to_lowercase() {
            let oid = Oid::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
            assert_eq!(oid.as_str(), "abcdef0123456789abcdef0123456789abcdef01");
        }

        #[test]
        fn wrong_length_rejected() {
            assert!(Oid::new("deadbeef").is_err());
            assert!(Oid::new("").is_err());
            // SHA-256 width is not an object id for this store
            assert!(Oid::new("a".repeat(64)).is_err());
        }

        #[test]
        fn non_hex_rejected() {
            assert!(Oid::new("g".repeat(40)).is_err());
            assert!(Oid::new(format!("{}-", "a".repeat(39))).is_err());
        }

        #[test]
        fn bytes_roundtrip() {
            let oid = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();
            let bytes = oid.to_bytes();
            assert_eq!(bytes[0], 0x01);
            assert_eq!(bytes[19], 0x67);
            assert_eq!(Oid::from_bytes(bytes), oid);
        }

        #[test]
        fn zero_oid() {
            assert!(Oid::zero().is_zero());
            assert!(!Oid::new("deadbeef".repeat(5)).unwrap().is_zero());
        }

        #[test]
        fn short_clamps_to_length() {
            let oid = Oid::new("deadbeef".repeat(5)).unwrap();
            assert_eq!(oid.short(8), "deadbeef");
            assert_eq!(oid.short(100).len(), 40);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<Oid, _> = serde_json::from_str("\"xyz\"");
            assert!(result.is_err());
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn head_accepted() {
            assert!(RefName::new("HEAD").unwrap().is_head());
            assert_eq!(RefName::default(), RefName::head());
        }

        #[test]
        fn branch_refs_accepted() {
            assert!(RefName::new("refs/heads/main").is_ok());
            assert!(RefName::new("refs/heads/feature/foo").is_ok());
            assert_eq!(
                RefName::for_branch("main").unwrap().as_str(),
                "refs/heads/main"
            );
        }

        #[test]
        fn bare_names_rejected() {
            assert!(RefName::new("main").is_err());
            assert!(RefName::new("ORIG_HEAD").is_err());
        }

        #[test]
        fn malformed_rejected() {
            assert!(RefName::new("").is_err());
            assert!(RefName::new("/refs/heads/x").is_err());
            assert!(RefName::new("refs/heads/x/").is_err());
            assert!(RefName::new("refs/heads/x.lock").is_err());
            assert!(RefName::new("refs/heads/a..b").is_err());
            assert!(RefName::new("refs/heads/a b").is_err());
            assert!(RefName::new("refs/heads/.hidden").is_err());
            assert!(RefName::for_branch("bad~name").is_err());
        }
    }
}
