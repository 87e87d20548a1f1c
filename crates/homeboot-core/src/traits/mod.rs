//! Core traits for the bootstrap orchestrator
//!
//! This module defines the abstract interfaces at every host boundary.
//!
//! - [`CommandRunner`]: Run external host tools
//! - [`ToolProbe`]: Detect whether a host tool is usable
//! - [`PackageManager`]: Install host packages
//! - [`ScheduleStore`]: Read and replace a user's task schedule
//! - [`DdnsProvider`]: Push the public IP to a dynamic DNS service

pub mod command_runner;
pub mod ddns_provider;
pub mod package_manager;
pub mod schedule_store;
pub mod tool_probe;

pub use command_runner::{CommandOutput, CommandRunner, CommandSpec};
pub use ddns_provider::{DdnsProvider, DdnsProviderFactory, ProviderResponse};
pub use package_manager::PackageManager;
pub use schedule_store::ScheduleStore;
pub use tool_probe::{ProbeMethod, ProbeStatus, ToolProbe, ToolSpec};
