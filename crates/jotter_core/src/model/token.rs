//! Opaque bearer credential.
//!
//! # Invariants
//! - The wrapped string is never empty or whitespace-only.
//! - `Debug` output never contains the credential.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("bearer token cannot be empty")]
    Empty,
}

/// Credential attached as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token string, trimming surrounding whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, TokenError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TokenError::Empty);
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value for the `Authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BearerToken(<redacted, {} chars>)", self.0.len())
    }
}

impl<'de> Deserialize<'de> for BearerToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
