// # homeboot-core
//
// Core library for the homeboot host bootstrap orchestrator.
//
// ## Architecture Overview
//
// Every component is a single-shot, idempotent action behind a trait seam:
// - **DependencyInstaller**: Ensures host tools are present (ToolProbe + PackageManager)
// - **TaskRegistrar**: Keeps exactly one schedule entry per logical task (ScheduleStore)
// - **Materializer**: Writes generated files atomically, never clobbering by default
// - **StackLauncher**: Starts the container stack with a generated override (CommandRunner)
// - **DdnsUpdater**: One provider call per run, response kept in a log file (DdnsProvider)
// - **ProviderRegistry**: Plugin-based registry for DDNS providers
//
// ## Control Flow
//
// ```text
// CLI ─► validate ─► DependencyInstaller ─┬─► TaskRegistrar (DDNS path)
//                                         └─► Materializer ─► StackLauncher (server path)
// ```
//
// ## Design Principles
//
// 1. **Preflight First**: Validation and privilege checks run before any mutation
// 2. **Atomic Replacement**: Shared files are only ever swapped in whole
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The binary is a thin wrapper over this crate

pub mod bootstrap;
pub mod config;
pub mod ddns;
pub mod error;
pub mod installer;
pub mod launcher;
pub mod materializer;
pub mod registry;
pub mod schedule;
pub mod system;
pub mod traits;

// Re-export core types for convenience
pub use bootstrap::{Bootstrap, HostServices};
pub use config::{
    Credentials, DdnsSettings, DeploySettings, ProviderConfig, Secret, ServicePorts,
};
pub use ddns::{DdnsUpdater, HttpResult};
pub use error::{Error, Result};
pub use installer::{DependencyInstaller, InstallOutcome};
pub use launcher::{OverrideSpec, StackLauncher, Started};
pub use materializer::{EnvFile, MaterializeOutcome};
pub use registry::ProviderRegistry;
pub use schedule::{Registered, TaskRegistrar, TaskRegistration};
pub use traits::{CommandRunner, DdnsProvider, PackageManager, ScheduleStore, ToolProbe};
