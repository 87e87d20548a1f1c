//! Package manager trait
//!
//! Installs a single named package. Implementations decide how to elevate;
//! the installer decides which packages to try and in which order.

use async_trait::async_trait;

/// Trait for host package managers
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Refresh package indexes
    async fn refresh(&self) -> Result<(), crate::Error>;

    /// Install one package non-interactively
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The package is installed
    /// - `Err(Error::Install)`: The package step failed
    /// - `Err(Error::Privilege)`: Elevation is unavailable
    async fn install(&self, package: &str) -> Result<(), crate::Error>;

    /// Whether the manager can perform privileged steps
    fn can_install(&self) -> bool;

    /// Manager name (for logging)
    fn manager_name(&self) -> &'static str;
}
