//! Client interception
//!
//! A provider client implements [`ProviderClient`]; `TokenTra::wrap` returns a
//! [`Tracked`] decorator with the same call interface that meters every call.

pub mod provider;
pub mod tracked;

pub use provider::{short_type_name, ClientIdentity, Provider};
pub use tracked::{prompt_hash, Tracked};

use async_trait::async_trait;
use serde::Serialize;

/// The one creatable call of an AI provider client
///
/// Requests and responses only need to serialize in the provider's wire
/// shape: the shim reads `model`, `stream` and `messages`/`prompt` from the
/// request and the `usage` object from the response.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    type Request: Serialize + Send + 'static;
    type Response: Serialize + Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Type identity used for provider detection
    fn identity(&self) -> ClientIdentity {
        ClientIdentity::of::<Self>()
    }

    /// Declared provider; takes precedence over detection by type path
    fn provider_hint(&self) -> Option<Provider> {
        None
    }

    async fn create(&self, request: Self::Request) -> Result<Self::Response, Self::Error>;
}
