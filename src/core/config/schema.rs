//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes share one shape; repo values override global ones key by key.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., `update_ref` must be a
//! valid ref name, identity fields must not be blank).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::signature::Identity;
use crate::core::types::RefName;

/// A configuration file (global or repo scope).
///
/// # Example
///
/// ```toml
/// update_ref = "HEAD"
///
/// [identity]
/// name = "Alice"
/// email = "alice@example.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Reference advanced by commit creation
    pub update_ref: Option<String>,

    /// Default identity for author/committer
    pub identity: Option<IdentityConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(update_ref) = &self.update_ref {
            RefName::new(update_ref.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid update_ref '{}': {}", update_ref, e))
            })?;
        }

        if let Some(identity) = &self.identity {
            identity.validate()?;
        }

        Ok(())
    }
}

/// Identity settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "identity.name cannot be blank".into(),
            ));
        }
        if matches!(&self.email, Some(e) if e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "identity.email cannot be blank".into(),
            ));
        }
        Ok(())
    }

    /// Both fields, if both are set.
    pub fn to_identity(&self) -> Option<Identity> {
        Some(Identity {
            name: self.name.clone()?,
            email: self.email.clone()?,
        })
    }
}
