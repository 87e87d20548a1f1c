//! Configuration types for the bootstrap orchestrator
//!
//! This module defines the settings each entry point builds once per
//! invocation, plus the validation and normalization rules they share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::Error;

/// Suffix stripped from operator-supplied DuckDNS domains
pub const DUCKDNS_SUFFIX: &str = ".duckdns.org";

/// Default schedule for the DDNS update task
pub const DEFAULT_SCHEDULE: &str = "*/5 * * * *";

/// Default game port exposed by the server stack
pub const DEFAULT_GAME_PORT: u16 = 24643;

/// Default port of the web VNC admin console
pub const DEFAULT_VNC_PORT: u16 = 8090;

/// Default install directory, relative to the target user's home
pub const DEFAULT_INSTALL_DIR: &str = "fs25-server";

/// Default container image for the base stack definition
pub const DEFAULT_SERVER_IMAGE: &str = "toetje585/arch-fs25server:latest";

/// A secret string
///
/// The Debug and Display implementations never expose the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value
    ///
    /// ⚠️ NEVER log the returned value
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds no characters after trimming
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Normalize a DuckDNS domain to its bare subdomain
///
/// The input is lowercased, then surrounding whitespace, trailing dots and
/// the `.duckdns.org` suffix are dropped until none is left. Applying this
/// to an already-normalized domain returns it unchanged.
pub fn normalize_domain(domain: &str) -> String {
    let mut current = domain.to_ascii_lowercase();
    loop {
        let trimmed = current.trim().trim_end_matches('.');
        let next = trimmed.strip_suffix(DUCKDNS_SUFFIX).unwrap_or(trimmed);
        if next.len() == current.len() {
            return current;
        }
        current = next.to_string();
    }
}

/// Validate a normalized subdomain label
pub fn validate_subdomain(domain: &str) -> Result<(), Error> {
    if domain.is_empty() {
        return Err(Error::validation("domain is required"));
    }

    if domain.len() > 63 {
        return Err(Error::validation(format!(
            "domain label too long: {} chars (max 63)",
            domain.len()
        )));
    }

    if !domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::validation(format!(
            "domain '{}' contains invalid characters. Valid: alphanumeric and hyphen only.",
            domain
        )));
    }

    if domain.starts_with('-') || domain.ends_with('-') {
        return Err(Error::validation(format!(
            "domain '{}' cannot start or end with a hyphen",
            domain
        )));
    }

    Ok(())
}

/// Validate a cron schedule expression
///
/// Accepts five whitespace-separated fields or one of cron's `@` macros.
/// Field contents are left to cron itself.
pub fn validate_schedule(schedule: &str) -> Result<(), Error> {
    const MACROS: &[&str] = &[
        "@reboot",
        "@yearly",
        "@annually",
        "@monthly",
        "@weekly",
        "@daily",
        "@midnight",
        "@hourly",
    ];

    let schedule = schedule.trim();
    if schedule.starts_with('@') {
        if MACROS.contains(&schedule) {
            return Ok(());
        }
        return Err(Error::validation(format!(
            "unknown schedule macro '{}'",
            schedule
        )));
    }

    let fields = schedule.split_whitespace().count();
    if fields != 5 {
        return Err(Error::validation(format!(
            "schedule '{}' must have 5 fields, got {}",
            schedule, fields
        )));
    }

    if schedule.contains('\n') || schedule.contains('%') {
        return Err(Error::validation(format!(
            "schedule '{}' contains characters cron treats specially",
            schedule
        )));
    }

    Ok(())
}

/// DDNS provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DuckDNS provider
    Duckdns {
        /// Update endpoint override (defaults to the public service)
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
    },
}

impl ProviderConfig {
    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Duckdns { .. } => "duckdns",
            ProviderConfig::Custom { factory } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Duckdns { endpoint: None }
    }
}

/// Settings for the DDNS setup path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsSettings {
    /// Bare subdomain (normalized on construction)
    pub domain: String,

    /// Provider token
    pub token: Secret,

    /// Cron schedule for the update task
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Account whose schedule receives the task
    pub target_user: String,

    /// Whether missing packages are installed
    #[serde(default = "default_true")]
    pub install_dependencies: bool,

    /// Provider selection
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl DdnsSettings {
    /// Create settings, normalizing the domain
    pub fn new(
        domain: &str,
        token: impl Into<Secret>,
        target_user: impl Into<String>,
    ) -> Self {
        Self {
            domain: normalize_domain(domain),
            token: token.into(),
            schedule: default_schedule(),
            target_user: target_user.into(),
            install_dependencies: true,
            provider: ProviderConfig::default(),
        }
    }

    /// Set the schedule
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = schedule.into();
        self
    }

    /// Enable or disable dependency installation
    pub fn with_install_dependencies(mut self, enabled: bool) -> Self {
        self.install_dependencies = enabled;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), Error> {
        validate_subdomain(&self.domain)?;

        if self.token.is_blank() {
            return Err(Error::validation("token is required"));
        }

        if self.target_user.trim().is_empty() {
            return Err(Error::validation("target user is required"));
        }

        validate_schedule(&self.schedule)
    }
}

/// Ports published by the server stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePorts {
    /// Game traffic port
    pub game: u16,
    /// Web VNC admin console port
    pub admin: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            game: DEFAULT_GAME_PORT,
            admin: DEFAULT_VNC_PORT,
        }
    }
}

/// Credentials consumed by the server container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Steam account name
    pub steam_user: Secret,
    /// Steam account password
    pub steam_pass: Secret,
    /// One-time Steam Guard code
    #[serde(default)]
    pub steam_guard_code: Option<Secret>,
    /// Password for the VNC admin console
    pub vnc_password: Secret,
}

/// Settings for the server deploy path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Published ports
    #[serde(default)]
    pub ports: ServicePorts,

    /// Container credentials
    pub credentials: Credentials,

    /// Directory holding the stack definition and env file
    pub install_dir: PathBuf,

    /// Container image used when a base definition must be generated
    #[serde(default = "default_image")]
    pub image: String,

    /// Whether the amd64 emulation layer is set up
    #[serde(default = "default_true")]
    pub setup_emulation: bool,

    /// Whether an existing env file is overwritten
    #[serde(default)]
    pub force: bool,
}

impl DeploySettings {
    /// Create settings with default ports and image
    pub fn new(credentials: Credentials, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            ports: ServicePorts::default(),
            credentials,
            install_dir: install_dir.into(),
            image: default_image(),
            setup_emulation: true,
            force: false,
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), Error> {
        let creds = &self.credentials;
        let mut missing = Vec::new();
        if creds.steam_user.is_blank() {
            missing.push("--steam-user");
        }
        if creds.steam_pass.is_blank() {
            missing.push("--steam-pass");
        }
        if creds.vnc_password.is_blank() {
            missing.push("--vnc-password");
        }
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "missing required credentials: {}",
                missing.join(", ")
            )));
        }

        if self.ports.game == 0 || self.ports.admin == 0 {
            return Err(Error::validation("ports must be between 1 and 65535"));
        }

        if self.ports.game == self.ports.admin {
            return Err(Error::validation(format!(
                "game port and VNC port must differ (both {})",
                self.ports.game
            )));
        }

        if self.install_dir.as_os_str().is_empty() {
            return Err(Error::validation("install directory is required"));
        }

        if self.image.trim().is_empty() {
            return Err(Error::validation("image cannot be empty"));
        }

        Ok(())
    }

    /// Key/value pairs of the generated env file, in file order
    pub fn env_values(&self) -> Vec<(String, String)> {
        let creds = &self.credentials;
        let mut values = vec![
            ("GAME_PORT".to_string(), self.ports.game.to_string()),
            ("VNC_PORT".to_string(), self.ports.admin.to_string()),
            (
                "STEAM_USER".to_string(),
                creds.steam_user.expose().to_string(),
            ),
            (
                "STEAM_PASS".to_string(),
                creds.steam_pass.expose().to_string(),
            ),
        ];
        if let Some(code) = creds.steam_guard_code.as_ref().filter(|c| !c.is_blank()) {
            values.push(("STEAM_GUARD_CODE".to_string(), code.expose().to_string()));
        }
        values.push((
            "VNC_PASSWORD".to_string(),
            creds.vnc_password.expose().to_string(),
        ));
        values
    }
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

fn default_image() -> String {
    DEFAULT_SERVER_IMAGE.to_string()
}

fn default_true() -> bool {
    true
}
