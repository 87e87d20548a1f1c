//! Compose file fragments
//!
//! Serde models for the two files the launcher deals with: the generated
//! override (platform pin and restart policy) and the base definition
//! written for a fresh install directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the base definition
pub const BASE_FILE: &str = "docker-compose.yml";

/// File name of the generated override
pub const OVERRIDE_FILE: &str = "docker-compose.override.yml";

/// Platform the server image is built for
pub const AMD64_PLATFORM: &str = "linux/amd64";

/// Restart policy applied to every service
pub const DEFAULT_RESTART: &str = "unless-stopped";

/// Per-service override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOverride {
    /// Pinned platform (e.g., "linux/amd64")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Restart policy (e.g., "unless-stopped")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
}

/// Override spec applied on top of the base definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSpec {
    /// Overrides keyed by service name
    pub services: BTreeMap<String, ServiceOverride>,
}

impl OverrideSpec {
    /// Create an empty override
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `service` to `platform` with `restart` policy
    pub fn with_service(
        mut self,
        service: impl Into<String>,
        platform: impl Into<String>,
        restart: impl Into<String>,
    ) -> Self {
        self.services.insert(
            service.into(),
            ServiceOverride {
                platform: Some(platform.into()),
                restart: Some(restart.into()),
            },
        );
        self
    }

    /// Override pinning one service to amd64 with the default restart policy
    pub fn amd64(service: impl Into<String>) -> Self {
        Self::new().with_service(service, AMD64_PLATFORM, DEFAULT_RESTART)
    }

    /// Override pinning every listed service to amd64
    pub fn amd64_all<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        services.into_iter().fold(Self::new(), |spec, service| {
            spec.with_service(service, AMD64_PLATFORM, DEFAULT_RESTART)
        })
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String, crate::Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Base service definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseService {
    /// Container image
    pub image: String,
    /// Env files loaded into the container
    pub env_file: Vec<String>,
    /// Published ports
    pub ports: Vec<String>,
    /// Bind mounts
    pub volumes: Vec<String>,
}

/// Base definition of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDefinition {
    /// Services keyed by name
    pub services: BTreeMap<String, BaseService>,
}

impl BaseDefinition {
    /// Definition of the game server stack
    ///
    /// Ports are interpolated by compose from the `.env` file next to it,
    /// so the definition itself holds no values that change per deploy.
    pub fn game_server(service: impl Into<String>, image: impl Into<String>) -> Self {
        let server = BaseService {
            image: image.into(),
            env_file: vec![".env".to_string()],
            ports: vec![
                "${GAME_PORT}:${GAME_PORT}/tcp".to_string(),
                "${GAME_PORT}:${GAME_PORT}/udp".to_string(),
                "${VNC_PORT}:${VNC_PORT}/tcp".to_string(),
            ],
            volumes: vec![
                "./data/config:/opt/fs25/config".to_string(),
                "./data/game:/opt/fs25/game".to_string(),
            ],
        };

        let mut services = BTreeMap::new();
        services.insert(service.into(), server);
        Self { services }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String, crate::Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Only the service keys of a compose file; every other field is ignored
#[derive(Debug, Deserialize)]
struct ServiceKeys {
    #[serde(default)]
    services: Option<BTreeMap<String, serde_yaml::Value>>,
}

/// Names of the services a compose file declares, sorted
pub fn service_names(yaml: &str) -> Result<Vec<String>, serde_yaml::Error> {
    let keys: ServiceKeys = serde_yaml::from_str(yaml)?;
    Ok(keys.services.unwrap_or_default().into_keys().collect())
}
