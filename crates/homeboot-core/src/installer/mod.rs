//! Dependency installer
//!
//! Makes sure the host tools a bootstrap path needs are usable, installing
//! missing ones through the package manager.
//!
//! ## Flow
//!
//! 1. Probe every requested tool ([`ToolProbe`])
//! 2. If anything must be installed and elevation is unavailable, fail with
//!    `Error::Privilege` before touching the host
//! 3. Refresh package indexes once
//! 4. For each missing tool, try its candidate packages in order
//!
//! Calling [`DependencyInstaller::ensure`] on a present tool is a no-op, so
//! the whole flow is safe to repeat.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::{PackageManager, ProbeStatus, ToolProbe, ToolSpec};

/// Outcome of ensuring one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The tool was missing (or too old) and a package was installed
    Installed {
        /// Package that installed successfully
        package: String,
    },
    /// The tool was already usable
    AlreadyPresent,
}

/// Idempotent, privilege-aware installer for host tools
pub struct DependencyInstaller {
    probe: Arc<dyn ToolProbe>,
    packages: Arc<dyn PackageManager>,
    refreshed: AtomicBool,
}

impl DependencyInstaller {
    /// Create an installer
    pub fn new(probe: Arc<dyn ToolProbe>, packages: Arc<dyn PackageManager>) -> Self {
        Self {
            probe,
            packages,
            refreshed: AtomicBool::new(false),
        }
    }

    /// Ensure a single tool is usable
    ///
    /// # Returns
    ///
    /// - `Ok(InstallOutcome::AlreadyPresent)`: Nothing to do
    /// - `Ok(InstallOutcome::Installed { .. })`: A candidate package installed
    /// - `Err(Error::Privilege)`: Installation needed but elevation unavailable
    /// - `Err(Error::Install)`: Every candidate package failed
    pub async fn ensure(&self, tool: &ToolSpec) -> Result<InstallOutcome> {
        let status = self.probe.probe(tool).await?;
        self.ensure_with_status(tool, status).await
    }

    /// Ensure several tools, checking privileges for all of them first
    ///
    /// No package step runs unless every missing tool could be installed
    /// with the available privileges.
    pub async fn ensure_all(&self, tools: &[ToolSpec]) -> Result<Vec<InstallOutcome>> {
        let mut statuses = Vec::with_capacity(tools.len());
        for tool in tools {
            statuses.push(self.probe.probe(tool).await?);
        }

        let missing: Vec<&str> = tools
            .iter()
            .zip(&statuses)
            .filter(|(_, status)| **status != ProbeStatus::Present)
            .map(|(tool, _)| tool.name)
            .collect();

        if !missing.is_empty() && !self.packages.can_install() {
            return Err(Error::privilege(format!(
                "installing {} requires root (run with sudo, or pass the flag to skip installation)",
                missing.join(", ")
            )));
        }

        let mut outcomes = Vec::with_capacity(tools.len());
        for (tool, status) in tools.iter().zip(statuses) {
            outcomes.push(self.ensure_with_status(tool, status).await?);
        }
        Ok(outcomes)
    }

    async fn ensure_with_status(
        &self,
        tool: &ToolSpec,
        status: ProbeStatus,
    ) -> Result<InstallOutcome> {
        match status {
            ProbeStatus::Present => {
                debug!("{} already present", tool);
                return Ok(InstallOutcome::AlreadyPresent);
            }
            ProbeStatus::Absent => info!("{} not found, installing", tool),
            ProbeStatus::VersionMismatch { found, required } => info!(
                "{} has major version {} (need >= {}), upgrading",
                tool, found, required
            ),
        }

        if !self.packages.can_install() {
            return Err(Error::privilege(format!(
                "installing {} requires root and no elevation is available",
                tool
            )));
        }

        self.refresh_once().await;

        let mut failures = Vec::new();
        for package in tool.packages {
            match self.packages.install(package).await {
                Ok(()) => {
                    info!(
                        "Installed {} via {} package '{}'",
                        tool,
                        self.packages.manager_name(),
                        package
                    );
                    self.verify(tool).await;
                    return Ok(InstallOutcome::Installed {
                        package: package.to_string(),
                    });
                }
                Err(Error::Install { message, .. }) => {
                    warn!("Package '{}' failed for {}: {}", package, tool, message);
                    failures.push(format!("{}: {}", package, message));
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::install(
            tool.name,
            if failures.is_empty() {
                "no candidate packages".to_string()
            } else {
                failures.join("; ")
            },
        ))
    }

    /// Refresh package indexes the first time a package is needed
    ///
    /// A failed refresh is logged and the install is attempted anyway.
    async fn refresh_once(&self) {
        if self.refreshed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.packages.refresh().await {
            warn!("Package index refresh failed, continuing: {}", e);
        }
    }

    async fn verify(&self, tool: &ToolSpec) {
        match self.probe.probe(tool).await {
            Ok(ProbeStatus::Present) => {}
            Ok(status) => warn!("{} still reports {:?} after install", tool, status),
            Err(e) => warn!("Could not re-probe {}: {}", tool, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeProbe {
        statuses: Mutex<HashMap<&'static str, ProbeStatus>>,
    }

    #[async_trait]
    impl ToolProbe for FakeProbe {
        async fn probe(&self, tool: &ToolSpec) -> Result<ProbeStatus> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .get(tool.name)
                .cloned()
                .unwrap_or(ProbeStatus::Absent))
        }
    }

    struct FakeApt {
        broken: Vec<&'static str>,
        installed: Mutex<Vec<String>>,
        refreshes: Mutex<usize>,
        privileged: bool,
    }

    #[async_trait]
    impl PackageManager for FakeApt {
        async fn refresh(&self) -> Result<()> {
            *self.refreshes.lock().unwrap() += 1;
            Ok(())
        }

        async fn install(&self, package: &str) -> Result<()> {
            if self.broken.iter().any(|b| *b == package) {
                return Err(Error::install(package, "E: Unable to locate package"));
            }
            self.installed.lock().unwrap().push(package.to_string());
            Ok(())
        }

        fn can_install(&self) -> bool {
            self.privileged
        }

        fn manager_name(&self) -> &'static str {
            "fake"
        }
    }

    fn installer(
        present: &[&'static str],
        broken: Vec<&'static str>,
        privileged: bool,
    ) -> (DependencyInstaller, Arc<FakeApt>) {
        let probe = Arc::new(FakeProbe {
            statuses: Mutex::new(
                present
                    .iter()
                    .map(|name| (*name, ProbeStatus::Present))
                    .collect(),
            ),
        });
        let apt = Arc::new(FakeApt {
            broken,
            installed: Mutex::new(Vec::new()),
            refreshes: Mutex::new(0),
            privileged,
        });
        (DependencyInstaller::new(probe, apt.clone()), apt)
    }

    #[tokio::test]
    async fn falls_back_to_alternate_package() {
        let (installer, apt) = installer(&[], vec!["docker-compose-plugin"], true);

        let outcome = installer.ensure(&ToolSpec::COMPOSE).await.unwrap();
        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                package: "docker-compose-v2".to_string()
            }
        );
        assert_eq!(*apt.installed.lock().unwrap(), ["docker-compose-v2"]);
    }

    #[tokio::test]
    async fn fails_when_every_candidate_fails() {
        let (installer, _) = installer(&[], vec!["docker.io", "docker-ce"], true);

        let err = installer.ensure(&ToolSpec::DOCKER).await.unwrap_err();
        match err {
            Error::Install { tool, message } => {
                assert_eq!(tool, "docker");
                assert!(message.contains("docker.io"));
                assert!(message.contains("docker-ce"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn refreshes_indexes_once() {
        let (installer, apt) = installer(&[], vec![], true);

        installer
            .ensure_all(&[ToolSpec::CURL, ToolSpec::CRON])
            .await
            .unwrap();
        assert_eq!(*apt.refreshes.lock().unwrap(), 1);
        assert_eq!(*apt.installed.lock().unwrap(), ["curl", "cron"]);
    }

    #[tokio::test]
    async fn present_tools_need_no_privilege() {
        let (installer, apt) = installer(&["curl", "cron"], vec![], false);

        let outcomes = installer
            .ensure_all(&[ToolSpec::CURL, ToolSpec::CRON])
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![InstallOutcome::AlreadyPresent, InstallOutcome::AlreadyPresent]
        );
        assert_eq!(*apt.refreshes.lock().unwrap(), 0);
    }
}
