// # Stack Launcher
//
// Starts the containerized game server from an install directory.
//
// ## Flow
//
// 1. The base definition (`docker-compose.yml`) must already exist
// 2. The override pinning platform and restart policy is (re)generated. It
//    may only name services the base definition declares, otherwise compose
//    would see a service without an image
// 3. `docker compose up -d` runs in the install directory, elevated unless
//    the process already is root
//
// A non-zero exit of the orchestration tool surfaces as `Error::Launch`
// with its exit status and stderr. Nothing is retried.

pub mod compose;

pub use compose::{BaseDefinition, OverrideSpec, ServiceOverride, service_names};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::materializer::{self, MaterializeOutcome, PUBLIC_FILE_MODE};
use crate::traits::{CommandRunner, CommandSpec};

/// Service name of the game server in the base definition
pub const SERVER_SERVICE: &str = "fs25-server";

/// A successfully started stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// Directory the stack was started from
    pub install_dir: PathBuf,
    /// Path of the generated override
    pub override_path: PathBuf,
    /// Services named in the override
    pub services: Vec<String>,
}

/// Launches compose stacks through a `CommandRunner`
pub struct StackLauncher {
    runner: Arc<dyn CommandRunner>,
}

impl StackLauncher {
    /// Create a launcher
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Write the base definition unless one already exists
    ///
    /// An operator-edited definition is never replaced.
    pub fn ensure_base_definition(
        &self,
        install_dir: &Path,
        image: &str,
    ) -> Result<MaterializeOutcome> {
        let yaml = BaseDefinition::game_server(SERVER_SERVICE, image).to_yaml()?;
        materializer::write_generated(
            &install_dir.join(compose::BASE_FILE),
            yaml.as_bytes(),
            PUBLIC_FILE_MODE,
            false,
        )
    }

    /// Services declared by the base definition in `install_dir`
    ///
    /// # Errors
    ///
    /// `Error::Config` when the file is missing, is not valid compose YAML,
    /// or declares no service.
    pub fn base_services(&self, install_dir: &Path) -> Result<Vec<String>> {
        let base_path = install_dir.join(compose::BASE_FILE);
        if !base_path.try_exists()? {
            return Err(Error::config(format!(
                "No stack definition at {}",
                base_path.display()
            )));
        }

        let yaml = std::fs::read_to_string(&base_path)?;
        let services = service_names(&yaml).map_err(|e| {
            Error::config(format!("Invalid stack definition {}: {}", base_path.display(), e))
        })?;
        if services.is_empty() {
            return Err(Error::config(format!(
                "{} declares no services",
                base_path.display()
            )));
        }
        Ok(services)
    }

    /// Apply `overrides` and start the stack in `install_dir`
    ///
    /// # Returns
    ///
    /// - `Ok(Started)`: the orchestration tool exited with status 0
    /// - `Err(Error::Launch)`: it exited non-zero or was killed
    /// - `Err(Error::Config)`: there is no usable base definition, or
    ///   `overrides` names a service it does not declare
    pub async fn launch(&self, install_dir: &Path, overrides: &OverrideSpec) -> Result<Started> {
        let declared = self.base_services(install_dir)?;
        let unknown: Vec<&str> = overrides
            .services
            .keys()
            .filter(|name| !declared.contains(*name))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::config(format!(
                "Override names services missing from {}: {} (declared: {})",
                compose::BASE_FILE,
                unknown.join(", "),
                declared.join(", ")
            )));
        }

        let override_path = install_dir.join(compose::OVERRIDE_FILE);
        let yaml = overrides.to_yaml()?;
        materializer::write_generated(&override_path, yaml.as_bytes(), PUBLIC_FILE_MODE, true)?;
        debug!("Override written to {}", override_path.display());

        let spec = CommandSpec::new("docker")
            .args([
                "compose",
                "-f",
                compose::BASE_FILE,
                "-f",
                compose::OVERRIDE_FILE,
                "up",
                "-d",
            ])
            .current_dir(install_dir)
            .elevated();

        info!("Starting stack in {}", install_dir.display());
        let output = self.runner.run(&spec).await?;

        if !output.success() {
            let message = match output.stderr.trim() {
                "" => output.stdout.trim().to_string(),
                stderr => stderr.to_string(),
            };
            return Err(Error::launch(output.status, message));
        }

        let services: Vec<String> = overrides.services.keys().cloned().collect();
        info!("Stack started: {}", services.join(", "));

        Ok(Started {
            install_dir: install_dir.to_path_buf(),
            override_path,
            services,
        })
    }
}
