//! Collector credential
//!
//! Keys carry a product prefix and a live/test marker. Anything else is
//! rejected before a client is constructed.

use crate::error::{Result, TokenTraError};
use std::fmt;
use std::str::FromStr;

/// Validated TokenTra API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Prefixes accepted at construction (two product namings, live and test)
    pub const RECOGNIZED_PREFIXES: [&'static str; 4] = ["tt_live_", "tt_test_", "tk_live_", "tk_test_"];

    /// Validate and wrap a raw key
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let key = raw.trim();

        if key.is_empty() {
            return Err(TokenTraError::InvalidApiKey(
                "TokenTra API key is required. Set TOKENTRA_API_KEY or pass it to the config builder"
                    .into(),
            ));
        }

        if !Self::RECOGNIZED_PREFIXES
            .iter()
            .any(|prefix| key.starts_with(*prefix))
        {
            return Err(TokenTraError::InvalidApiKey(
                "Invalid API key format. Expected: tt_live_xxx or tt_test_xxx".into(),
            ));
        }

        Ok(Self(key.to_string()))
    }

    /// The raw secret, for the Authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether this is a test-mode key
    pub fn is_test(&self) -> bool {
        self.0.starts_with("tt_test_") || self.0.starts_with("tk_test_")
    }

    fn prefix(&self) -> &str {
        Self::RECOGNIZED_PREFIXES
            .iter()
            .find(|prefix| self.0.starts_with(**prefix))
            .copied()
            .unwrap_or("")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}****)", self.prefix())
    }
}

impl FromStr for ApiKey {
    type Err = TokenTraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
