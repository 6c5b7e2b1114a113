//! Interactive input capability.
//!
//! The pipeline never reads the terminal directly; it asks a [`PromptProvider`]
//! so tests can script answers. Passwords come back as [`Secret`], which
//! refuses to print its contents.

use crate::error::Result;
use std::fmt;

/// A password or passphrase that must never be echoed or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw value, for handing to an external tool.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Source of interactive answers.
pub trait PromptProvider: Send + Sync {
    /// Ask for a line of visible text.
    fn input(&self, label: &str) -> Result<String>;

    /// Ask for a password without echoing it.
    fn password(&self, label: &str) -> Result<Secret>;
}
