//! DDNS updater
//!
//! Performs one provider call per invocation and records the outcome in a
//! log file that is rewritten every time. The schedule is the retry loop:
//! a failed call is logged and left for the next run.
//!
//! ## Flow
//!
//! ```text
//! domain ── normalize/validate ──► DdnsProvider::update ──► HttpResult
//!                                                              │
//!                                            log file ◄────────┘
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::{Secret, normalize_domain, validate_subdomain};
use crate::error::{Error, Result};
use crate::materializer::{self, PUBLIC_FILE_MODE};
use crate::traits::DdnsProvider;

/// Outcome of a single update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpResult {
    /// The provider answered; `body` is its raw response
    Response {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
    /// The request could not be completed
    Failed {
        /// Error description (never contains the token)
        error: String,
    },
}

impl HttpResult {
    /// Text written to the log file
    pub fn log_text(&self) -> String {
        match self {
            HttpResult::Response { body, .. } => body.clone(),
            HttpResult::Failed { error } => format!("ERROR: {}\n", error),
        }
    }

    /// Whether the provider accepted the update
    ///
    /// DuckDNS answers `OK` or `KO` with status 200, so the body decides.
    pub fn is_ok(&self) -> bool {
        matches!(self, HttpResult::Response { status, body }
            if (200..300).contains(status) && body.trim_start().starts_with("OK"))
    }
}

/// Single-shot DDNS updater
pub struct DdnsUpdater {
    provider: Box<dyn DdnsProvider>,
    log_path: PathBuf,
}

impl DdnsUpdater {
    /// Create an updater writing its log to `log_path`
    pub fn new(provider: Box<dyn DdnsProvider>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            log_path: log_path.into(),
        }
    }

    /// Path of the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Point `domain` at the caller's public IP
    ///
    /// # Returns
    ///
    /// - `Ok(HttpResult)`: one request was attempted; network failures are
    ///   reported as `HttpResult::Failed`, not as an error
    /// - `Err(Error::Validation)`: the domain or token is unusable and no
    ///   request was made
    pub async fn update(&self, domain: &str, token: &Secret) -> Result<HttpResult> {
        let domain = normalize_domain(domain);
        validate_subdomain(&domain)?;
        if token.is_blank() {
            return Err(Error::validation("DDNS token must not be empty"));
        }

        let provider = self.provider.provider_name();
        debug!("Updating {} via {}", domain, provider);

        let result = match self.provider.update(&domain, token).await {
            Ok(response) => {
                let body = response.body.trim();
                if response.is_success() {
                    info!("{} answered {}: {}", provider, response.status, body);
                } else {
                    warn!("{} answered {}: {}", provider, response.status, body);
                }
                HttpResult::Response {
                    status: response.status,
                    body: response.body,
                }
            }
            Err(e) => {
                error!("DDNS update for {} failed: {}", domain, e);
                HttpResult::Failed {
                    error: e.to_string(),
                }
            }
        };

        let text = result.log_text();
        if let Err(e) = materializer::write_atomic(&self.log_path, text.as_bytes(), PUBLIC_FILE_MODE)
        {
            warn!("Failed to write {}: {}", self.log_path.display(), e);
        }

        Ok(result)
    }
}
