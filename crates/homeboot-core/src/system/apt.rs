//! APT package manager

use async_trait::async_trait;
use std::sync::Arc;

use crate::Error;
use crate::traits::{CommandRunner, CommandSpec, PackageManager};

/// `apt-get` driven through a [`CommandRunner`]
pub struct AptPackageManager {
    runner: Arc<dyn CommandRunner>,
}

impl AptPackageManager {
    /// Create an APT manager running commands through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn apt(args: &[&str]) -> CommandSpec {
        CommandSpec::new("apt-get")
            .args(args.iter().copied())
            .env("DEBIAN_FRONTEND", "noninteractive")
            .elevated()
    }
}

#[async_trait]
impl PackageManager for AptPackageManager {
    async fn refresh(&self) -> Result<(), Error> {
        let output = self.runner.run(&Self::apt(&["update"])).await?;
        if !output.success() {
            return Err(Error::install(
                "apt",
                format!("apt-get update failed: {}", output.stderr.trim()),
            ));
        }
        Ok(())
    }

    async fn install(&self, package: &str) -> Result<(), Error> {
        let output = self
            .runner
            .run(&Self::apt(&["install", "-y", package]))
            .await?;
        if !output.success() {
            return Err(Error::install(
                package,
                format!(
                    "apt-get install exited with {:?}: {}",
                    output.status,
                    output.stderr.trim()
                ),
            ));
        }
        Ok(())
    }

    fn can_install(&self) -> bool {
        self.runner.can_elevate()
    }

    fn manager_name(&self) -> &'static str {
        "apt"
    }
}
