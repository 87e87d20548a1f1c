// # Host System Implementations
//
// This module provides the implementations of the host-facing traits for a
// Debian-family Linux host.

pub mod apt;
pub mod probe;
pub mod runner;
pub mod user;

pub use apt::AptPackageManager;
pub use probe::SystemToolProbe;
pub use runner::{Elevation, SystemCommandRunner};
pub use user::{TargetUser, resolve_target_user};
