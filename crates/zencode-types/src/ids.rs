//! Identity identifiers.
//!
//! The identity provider hands out opaque string ids (`user_2x…`). They are
//! never parsed; the kernel only compares them and forwards them to the
//! profile service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an authenticated identity.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Wrap a provider-issued id. Surrounding whitespace is dropped.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the provider gave us nothing usable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityId({})", self.0)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        let id = IdentityId::new("  user_abc \n");
        assert_eq!(id.as_str(), "user_abc");
        assert!(!id.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(IdentityId::new("   ").is_empty());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = IdentityId::from("user_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user_1\"");
    }
}
