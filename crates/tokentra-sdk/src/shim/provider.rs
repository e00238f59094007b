//! Supported providers
//!
//! Each provider knows its name, the client method the shim stands in for,
//! and where its responses keep token usage.

use serde_json::Value;
use std::fmt;
use tokentra_common::TokenUsage;

/// AI provider a wrapped client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Anthropic];

    /// Name used in telemetry and pricing lookups
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Client method replaced by the shim
    pub fn method_path(&self) -> &'static str {
        match self {
            Provider::OpenAi => "chat.completions.create",
            Provider::Anthropic => "messages.create",
        }
    }

    /// Type name the provider's official client uses
    fn client_type_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Match a client's type identity against the known providers
    pub fn detect(identity: &ClientIdentity) -> Option<Provider> {
        let module = identity.module_path.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| module.contains(p.as_str()) || identity.type_name == p.client_type_name())
    }

    /// Read token counts from a serialized response. Missing usage reads as zero.
    pub fn extract_usage(&self, response: &Value) -> TokenUsage {
        let Some(usage) = response.get("usage").filter(|u| u.is_object()) else {
            return TokenUsage::default();
        };
        let count = |pointer: &str| usage.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);

        match self {
            Provider::OpenAi => TokenUsage::new(count("/prompt_tokens"), count("/completion_tokens"))
                .with_cached(count("/prompt_tokens_details/cached_tokens")),
            Provider::Anthropic => TokenUsage::new(count("/input_tokens"), count("/output_tokens"))
                .with_cached(count("/cache_read_input_tokens")),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module path and bare type name of a client type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub module_path: String,
    pub type_name: String,
}

impl ClientIdentity {
    /// Identity of `T` from its Rust type path, generic arguments ignored
    pub fn of<T: ?Sized>() -> Self {
        Self::from_path(std::any::type_name::<T>())
    }

    pub fn from_path(path: &str) -> Self {
        let base = path.split('<').next().unwrap_or(path);
        match base.rsplit_once("::") {
            Some((module_path, type_name)) => Self {
                module_path: module_path.to_string(),
                type_name: type_name.to_string(),
            },
            None => Self {
                module_path: String::new(),
                type_name: base.to_string(),
            },
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module_path.is_empty() {
            f.write_str(&self.type_name)
        } else {
            write!(f, "{}::{}", self.module_path, self.type_name)
        }
    }
}

/// Last path segment of a type name, e.g. `ApiError` for `my_crate::errors::ApiError<T>`
pub fn short_type_name(path: &str) -> &str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base)
}
