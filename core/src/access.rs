//! Access gate for agency-side figures.
//!
//! This is a display/export toggle, not authentication. The engine always
//! computes agency figures; an `Authorizer` only decides whether they are
//! shown. Swap the placeholder for a real credential store without
//! touching the engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Consultant,
    Agency,
}

impl AccessLevel {
    pub fn from_credential(authorizer: &dyn Authorizer, credential: Option<&str>) -> Self {
        match credential {
            Some(c) if authorizer.has_elevated_access(c) => AccessLevel::Agency,
            _ => AccessLevel::Consultant,
        }
    }

    pub fn is_elevated(self) -> bool {
        self == AccessLevel::Agency
    }
}

pub trait Authorizer {
    fn has_elevated_access(&self, credential: &str) -> bool;
}

/// Placeholder: compares against one configured passphrase.
pub struct PassphraseAuthorizer {
    passphrase: String,
}

impl PassphraseAuthorizer {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self { passphrase: passphrase.into() }
    }

    /// Read the passphrase from an environment variable. `None` when unset
    /// or blank.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(Self::new)
    }
}

impl Authorizer for PassphraseAuthorizer {
    fn has_elevated_access(&self, credential: &str) -> bool {
        credential == self.passphrase
    }
}

/// Grants nothing. Used when no passphrase is configured.
pub struct ConsultantOnly;

impl Authorizer for ConsultantOnly {
    fn has_elevated_access(&self, _credential: &str) -> bool {
        false
    }
}
