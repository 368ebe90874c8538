//! core::signature
//!
//! Identity records attached to a commit as author or committer.
//!
//! # Types
//!
//! - [`SignatureSpec`] - Caller-supplied identity, validated once at the boundary
//! - [`SignatureTime`] - Seconds since the Unix epoch plus a UTC offset in minutes
//! - [`Signature`] - Canonical record as normalized by the object store
//! - [`Identity`] - A name/email pair without a timestamp
//!
//! A `SignatureSpec` only proves the name and email are non-empty. The
//! store decides what a canonical signature looks like (it may reject
//! characters such as `<` or `>`), so the canonical form is always the
//! one the store hands back.

use chrono::{DateTime, FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from signature validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature name cannot be empty")]
    EmptyName,

    #[error("signature email cannot be empty")]
    EmptyEmail,

    #[error("utc offset out of range: {0} minutes")]
    OffsetOutOfRange(i32),
}

/// Point in time of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureTime {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Offset from UTC in minutes.
    pub offset_minutes: i32,
}

impl SignatureTime {
    /// Largest offset accepted, in minutes (±24h, exclusive).
    const MAX_OFFSET_MINUTES: i32 = 24 * 60;

    /// Create a time from raw seconds and offset.
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// The current time in the local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            seconds: now.timestamp(),
            offset_minutes: now.offset().fix().local_minus_utc() / 60,
        }
    }

    /// Convert to a timezone-aware `chrono` value.
    ///
    /// Returns `None` if the offset or timestamp is out of range.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_minutes.checked_mul(60)?)?;
        DateTime::from_timestamp(self.seconds, 0).map(|utc| utc.with_timezone(&offset))
    }
}

impl std::fmt::Display for SignatureTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        write!(f, "{} {}{:02}{:02}", self.seconds, sign, abs / 60, abs % 60)
    }
}

/// A name/email pair, e.g. the store's configured default identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Caller-supplied signature fields.
///
/// # Example
///
/// ```
/// use commitwork::core::signature::{SignatureSpec, SignatureTime};
///
/// let spec = SignatureSpec::new("Alice", "alice@example.com", SignatureTime::new(0, 60)).unwrap();
/// assert_eq!(spec.name(), "Alice");
///
/// assert!(SignatureSpec::new("", "alice@example.com", SignatureTime::new(0, 0)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSignatureSpec", into = "RawSignatureSpec")]
pub struct SignatureSpec {
    name: String,
    email: String,
    when: SignatureTime,
}

impl SignatureSpec {
    /// Create a validated signature spec.
    ///
    /// # Errors
    ///
    /// - [`SignatureError::EmptyName`] / [`SignatureError::EmptyEmail`] for blank fields
    /// - [`SignatureError::OffsetOutOfRange`] if the offset is not within ±24h
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: SignatureTime,
    ) -> Result<Self, SignatureError> {
        let name = name.into();
        let email = email.into();

        if name.trim().is_empty() {
            return Err(SignatureError::EmptyName);
        }
        if email.trim().is_empty() {
            return Err(SignatureError::EmptyEmail);
        }
        if when.offset_minutes.abs() >= SignatureTime::MAX_OFFSET_MINUTES {
            return Err(SignatureError::OffsetOutOfRange(when.offset_minutes));
        }

        Ok(Self { name, email, when })
    }

    /// Build a spec from an identity at the given time.
    pub fn from_identity(identity: &Identity, when: SignatureTime) -> Result<Self, SignatureError> {
        Self::new(identity.name.clone(), identity.email.clone(), when)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn when(&self) -> SignatureTime {
        self.when
    }
}

#[derive(Serialize, Deserialize)]
struct RawSignatureSpec {
    name: String,
    email: String,
    when: SignatureTime,
}

impl TryFrom<RawSignatureSpec> for SignatureSpec {
    type Error = SignatureError;

    fn try_from(raw: RawSignatureSpec) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.email, raw.when)
    }
}

impl From<SignatureSpec> for RawSignatureSpec {
    fn from(spec: SignatureSpec) -> Self {
        Self {
            name: spec.name,
            email: spec.email,
            when: spec.when,
        }
    }
}

/// Canonical signature as recorded in a stored commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: SignatureTime,
}

impl From<&SignatureSpec> for Signature {
    fn from(spec: &SignatureSpec) -> Self {
        Self {
            name: spec.name.clone(),
            email: spec.email.clone(),
            when: spec.when,
        }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when)
    }
}
