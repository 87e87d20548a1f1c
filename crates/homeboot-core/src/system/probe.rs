//! Host tool probe
//!
//! Looks executables up on `PATH` with `which`, runs version queries through
//! a [`CommandRunner`], and checks kernel paths on the filesystem.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::Error;
use crate::traits::{CommandRunner, CommandSpec, ProbeMethod, ProbeStatus, ToolProbe, ToolSpec};

/// Probe for the local host
pub struct SystemToolProbe {
    runner: Arc<dyn CommandRunner>,
}

impl SystemToolProbe {
    /// Create a probe that runs version queries through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ToolProbe for SystemToolProbe {
    async fn probe(&self, tool: &ToolSpec) -> Result<ProbeStatus, Error> {
        match tool.probe {
            ProbeMethod::Executable { binary } => Ok(if which::which(binary).is_ok() {
                ProbeStatus::Present
            } else {
                ProbeStatus::Absent
            }),
            ProbeMethod::Path { path } => Ok(if Path::new(path).exists() {
                ProbeStatus::Present
            } else {
                ProbeStatus::Absent
            }),
            ProbeMethod::Emulation { arch, handler } => Ok(classify_emulation(
                std::env::consts::ARCH,
                arch,
                Path::new(handler),
            )),
            ProbeMethod::Subcommand { binary, args } => {
                if which::which(binary).is_err() {
                    return Ok(ProbeStatus::Absent);
                }

                let output = self
                    .runner
                    .run(&CommandSpec::new(binary).args(args.iter().copied()))
                    .await?;

                if !output.success() {
                    tracing::debug!(
                        "'{} {}' failed, treating {} as absent",
                        binary,
                        args.join(" "),
                        tool
                    );
                    return Ok(ProbeStatus::Absent);
                }

                Ok(classify_version(tool, &output.stdout))
            }
        }
    }
}

/// Whether `host_arch` can run `arch` binaries
///
/// Natively when the architectures match, otherwise only through a
/// registered `handler`.
pub fn classify_emulation(host_arch: &str, arch: &str, handler: &Path) -> ProbeStatus {
    if host_arch == arch {
        tracing::debug!("Host is {}, no emulation needed", host_arch);
        ProbeStatus::Present
    } else if handler.exists() {
        ProbeStatus::Present
    } else {
        ProbeStatus::Absent
    }
}

/// Compare the major version in `version_output` with the tool's minimum
///
/// Unparseable output is accepted as present: the command itself succeeded.
pub fn classify_version(tool: &ToolSpec, version_output: &str) -> ProbeStatus {
    let Some(required) = tool.min_major else {
        return ProbeStatus::Present;
    };

    match parse_major_version(version_output) {
        Some(found) if found < required => ProbeStatus::VersionMismatch { found, required },
        Some(_) => ProbeStatus::Present,
        None => {
            tracing::warn!(
                "Could not parse a version for {} from '{}'",
                tool,
                version_output.trim()
            );
            ProbeStatus::Present
        }
    }
}

/// Extract the major number of the first dotted version in `text`
///
/// `"Docker Compose version v2.24.6"` → `Some(2)`.
pub fn parse_major_version(text: &str) -> Option<u32> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_start_matches('v'))
        .filter(|token| token.contains('.'))
        .find_map(|token| {
            let major: String = token.chars().take_while(char::is_ascii_digit).collect();
            if major.is_empty() || !token[major.len()..].starts_with('.') {
                return None;
            }
            major.parse().ok()
        })
}
