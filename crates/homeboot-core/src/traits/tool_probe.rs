// # Tool Probe Trait
//
// Defines the capability-probe interface used by the dependency installer to
// decide whether a host tool must be installed.
//
// A probe answers one of three states:
// - `Present`: the tool is usable as-is
// - `Absent`: the tool is missing
// - `VersionMismatch`: the tool exists but is older than required

use async_trait::async_trait;
use std::fmt;

/// How a tool's presence is detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeMethod {
    /// The executable must be found on `PATH`
    Executable {
        /// Executable name
        binary: &'static str,
    },

    /// The executable must be on `PATH` and `binary args...` must succeed.
    /// Its output is scanned for a version number when a minimum is set.
    Subcommand {
        /// Executable name
        binary: &'static str,
        /// Arguments of the version query
        args: &'static [&'static str],
    },

    /// A filesystem path must exist (kernel features, registered handlers)
    Path {
        /// Absolute path
        path: &'static str,
    },

    /// Emulation of a foreign CPU architecture. A host running `arch`
    /// natively needs none; any other host needs the `handler` path.
    Emulation {
        /// Architecture name as in `std::env::consts::ARCH`
        arch: &'static str,
        /// binfmt_misc entry registered for that architecture
        handler: &'static str,
    },
}

/// A host tool the orchestrator may need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Human-readable name used in logs and errors
    pub name: &'static str,
    /// Presence check
    pub probe: ProbeMethod,
    /// Minimum accepted major version (only for `Subcommand` probes)
    pub min_major: Option<u32>,
    /// Candidate packages, tried in order until one installs
    pub packages: &'static [&'static str],
}

impl ToolSpec {
    /// HTTP client used for manual provider checks
    pub const CURL: ToolSpec = ToolSpec {
        name: "curl",
        probe: ProbeMethod::Executable { binary: "curl" },
        min_major: None,
        packages: &["curl"],
    };

    /// Cron daemon and `crontab` utility
    pub const CRON: ToolSpec = ToolSpec {
        name: "cron",
        probe: ProbeMethod::Executable { binary: "crontab" },
        min_major: None,
        packages: &["cron"],
    };

    /// Container runtime
    pub const DOCKER: ToolSpec = ToolSpec {
        name: "docker",
        probe: ProbeMethod::Executable { binary: "docker" },
        min_major: None,
        packages: &["docker.io", "docker-ce"],
    };

    /// Compose v2 plugin (`docker compose`)
    pub const COMPOSE: ToolSpec = ToolSpec {
        name: "docker compose",
        probe: ProbeMethod::Subcommand {
            binary: "docker",
            args: &["compose", "version"],
        },
        min_major: Some(2),
        packages: &["docker-compose-plugin", "docker-compose-v2"],
    };

    /// amd64 user-mode emulation registered with binfmt_misc
    ///
    /// Native x86_64 hosts report it present: qemu never registers the
    /// host's own architecture.
    pub const BINFMT_AMD64: ToolSpec = ToolSpec {
        name: "binfmt (amd64 emulation)",
        probe: ProbeMethod::Emulation {
            arch: "x86_64",
            handler: "/proc/sys/fs/binfmt_misc/qemu-x86_64",
        },
        min_major: None,
        packages: &["qemu-user-static", "binfmt-support"],
    };
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Result of probing a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Tool is usable
    Present,
    /// Tool is missing
    Absent,
    /// Tool exists but its major version is too old
    VersionMismatch {
        /// Major version found
        found: u32,
        /// Minimum major version required
        required: u32,
    },
}

/// Trait for tool probe implementations
///
/// Probes are read-only: they never mutate host state.
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// Probe a tool
    ///
    /// # Returns
    ///
    /// - `Ok(ProbeStatus)`: The tool's state
    /// - `Err(Error)`: The probe itself could not run
    async fn probe(&self, tool: &ToolSpec) -> Result<ProbeStatus, crate::Error>;
}
