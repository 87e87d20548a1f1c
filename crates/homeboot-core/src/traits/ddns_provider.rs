// # DDNS Provider Trait
//
// Defines the interface for pushing the caller's public IP to a dynamic DNS
// service.
//
// ## Implementations
//
// - DuckDNS: `homeboot-provider-duckdns` crate
//
// ## Usage
//
// ```rust,ignore
// use homeboot_core::DdnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DdnsProvider implementation */;
//
//     let response = provider.update("myfarm", &token).await?;
//     println!("{}", response.body);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::{ProviderConfig, Secret};

/// Raw response of a provider update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ProviderResponse {
    /// Whether the status code is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for DDNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP/HTTPS call to the provider endpoint per `update`
/// - ✅ Return the raw response (the updater persists it)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (the schedule is the retry)
/// - ❌ Write files (the log is owned by `DdnsUpdater`)
/// - ❌ Log the token
///
/// ## Rationale
///
/// Providers are:
/// - **Stateless**: No persistent state between requests
/// - **Single-shot**: Execute one API call per invocation
#[async_trait]
pub trait DdnsProvider: Send + Sync {
    /// Ask the provider to point `domain` at the caller's public IP
    ///
    /// # Parameters
    ///
    /// - `domain`: Normalized subdomain (e.g., "myfarm")
    /// - `token`: Account token
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderResponse)`: The provider answered (any status code)
    /// - `Err(Error::Network)`: The request could not be completed
    async fn update(&self, domain: &str, token: &Secret)
    -> Result<ProviderResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DDNS providers from configuration
pub trait DdnsProviderFactory: Send + Sync {
    /// Create a DdnsProvider instance from configuration
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DdnsProvider>, crate::Error>;
}
