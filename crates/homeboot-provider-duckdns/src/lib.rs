// # DuckDNS Provider
//
// This crate provides the DuckDNS implementation of `DdnsProvider`.
//
// ## Behavior
//
// - ✅ One GET request per `update` call
// - ✅ Empty `ip=` parameter: DuckDNS infers the caller's public address
// - ✅ Raw body returned as-is (`OK` / `KO`); the updater decides what to log
// - ❌ NO retry logic (the schedule is the retry)
// - ❌ NO explicit timeout (the HTTP client defaults apply)
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (DDNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS calls to the configured endpoint only
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Write files (the log is owned by `DdnsUpdater`)
// - ❌ Cache state beyond single request
//
// ## Security Requirements
//
// - The token NEVER appears in logs or error messages
// - Request URLs carry the token, so transport errors are stripped of them
//
// ## API Reference
//
// - https://www.duckdns.org/spec.jsp
// - `GET https://www.duckdns.org/update?domains=<sub>&token=<token>&ip=`

use async_trait::async_trait;
use homeboot_core::config::{ProviderConfig, Secret};
use homeboot_core::traits::{DdnsProvider, DdnsProviderFactory, ProviderResponse};
use homeboot_core::{Error, Result};
use reqwest::Url;

/// Public DuckDNS update endpoint
pub const DUCKDNS_UPDATE_URL: &str = "https://www.duckdns.org/update";

/// DuckDNS provider
///
/// # Security
///
/// The Debug implementation shows the endpoint only; the token is passed per
/// call and never stored.
pub struct DuckDnsProvider {
    /// Update endpoint
    endpoint: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for DuckDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDnsProvider")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl DuckDnsProvider {
    /// Create a provider for the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DUCKDNS_UPDATE_URL)
    }

    /// Create a provider for a custom endpoint
    ///
    /// # Errors
    ///
    /// `Error::Config` when `endpoint` is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::config(format!("Invalid DuckDNS endpoint '{}': {}", endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "DuckDNS endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// Build the update URL for `domain`
    ///
    /// ⚠️ The result contains the token; NEVER log it.
    pub fn update_url(&self, domain: &str, token: &Secret) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("domains", domain)
            .append_pair("token", token.expose())
            .append_pair("ip", "");
        url
    }
}

#[async_trait]
impl DdnsProvider for DuckDnsProvider {
    async fn update(&self, domain: &str, token: &Secret) -> Result<ProviderResponse> {
        tracing::debug!("Sending DuckDNS update for {}", domain);

        let response = self
            .client
            .get(self.update_url(domain, token))
            .send()
            .await
            .map_err(|e| Error::network(format!("DuckDNS request failed: {}", e.without_url())))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            Error::network(format!(
                "Failed to read DuckDNS response: {}",
                e.without_url()
            ))
        })?;

        tracing::debug!("DuckDNS answered {} ({} bytes)", status, body.len());
        Ok(ProviderResponse { status, body })
    }

    fn provider_name(&self) -> &'static str {
        "duckdns"
    }
}

/// Factory for creating DuckDNS providers
pub struct DuckDnsFactory;

impl DdnsProviderFactory for DuckDnsFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DdnsProvider>> {
        match config {
            ProviderConfig::Duckdns { endpoint } => {
                let provider = match endpoint {
                    Some(endpoint) => DuckDnsProvider::with_endpoint(endpoint)?,
                    None => DuckDnsProvider::new()?,
                };
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for DuckDNS provider")),
        }
    }
}

/// Register the DuckDNS provider with a registry
///
/// # Example
///
/// ```rust
/// use homeboot_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// homeboot_provider_duckdns::register(&registry);
/// assert!(registry.has_provider("duckdns"));
/// ```
pub fn register(registry: &homeboot_core::ProviderRegistry) {
    registry.register_provider("duckdns", Box::new(DuckDnsFactory));
}
