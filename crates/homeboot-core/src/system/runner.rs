// # System Command Runner
//
// `CommandRunner` implementation that spawns real processes.
//
// ## Elevation
//
// Commands marked `elevated` run directly when the process is root, through
// non-interactive `sudo -n` when the caller may use it without a password,
// and fail with `Error::Privilege` otherwise. A sudo that would prompt
// counts as unavailable, so the preflight checks refuse to start.
// Environment variables of elevated commands are passed through `env` so
// that `sudo` does not strip them.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::Error;
use crate::traits::{CommandOutput, CommandRunner, CommandSpec};

/// How privileged commands are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// The process runs as root
    Root,
    /// Privileged commands are prefixed with `sudo -n`
    Sudo,
    /// No way to run privileged commands
    Unavailable,
}

impl Elevation {
    /// Detect the elevation available to this process
    ///
    /// Runs `sudo -n true` once; it succeeds only when sudo will not prompt.
    pub fn detect() -> Self {
        let is_root = nix::unistd::geteuid().is_root();
        let sudo_usable = !is_root
            && which::which("sudo").is_ok()
            && std::process::Command::new("sudo")
                .args(["-n", "true"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success());
        Self::classify(is_root, sudo_usable)
    }

    /// Pick the elevation mode from what the host allows
    pub fn classify(is_root: bool, passwordless_sudo: bool) -> Self {
        if is_root {
            Elevation::Root
        } else if passwordless_sudo {
            Elevation::Sudo
        } else {
            Elevation::Unavailable
        }
    }
}

/// Runner spawning processes with `tokio::process`
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    elevation: Elevation,
}

impl SystemCommandRunner {
    /// Create a runner, detecting elevation from the current process
    pub fn new() -> Self {
        Self::with_elevation(Elevation::detect())
    }

    /// Create a runner with an explicit elevation mode
    pub fn with_elevation(elevation: Elevation) -> Self {
        Self { elevation }
    }

    /// Elevation mode in use
    pub fn elevation(&self) -> Elevation {
        self.elevation
    }

    /// Resolve the argv actually executed for `spec`
    fn argv(&self, spec: &CommandSpec) -> Result<Vec<String>, Error> {
        let mut argv = Vec::with_capacity(spec.args.len() + 4);

        if spec.elevated {
            match self.elevation {
                Elevation::Root => {}
                Elevation::Sudo => {
                    argv.push("sudo".to_string());
                    argv.push("-n".to_string());
                }
                Elevation::Unavailable => {
                    return Err(Error::privilege(format!(
                        "'{}' requires root and neither root nor passwordless sudo is available",
                        spec.display()
                    )));
                }
            }
        }

        if spec.elevated && self.elevation == Elevation::Sudo && !spec.env.is_empty() {
            argv.push("env".to_string());
            argv.extend(spec.env.iter().map(|(k, v)| format!("{}={}", k, v)));
        }

        argv.push(spec.program.clone());
        argv.extend(spec.args.iter().cloned());
        Ok(argv)
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, Error> {
        let argv = self.argv(spec)?;
        tracing::debug!("Running: {}", spec.display());

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !(spec.elevated && self.elevation == Elevation::Sudo) {
            cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::command(format!("Failed to start '{}': {}", argv[0], e)))?;

        if let Some(ref input) = spec.stdin
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(input).await.map_err(|e| {
                Error::command(format!("Failed to write stdin of '{}': {}", argv[0], e))
            })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::command(format!("Failed to wait for '{}': {}", argv[0], e)))?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::trace!("'{}' exited with {:?}", spec.display(), result.status);
        Ok(result)
    }

    fn can_elevate(&self) -> bool {
        self.elevation != Elevation::Unavailable
    }

    fn is_root(&self) -> bool {
        self.elevation == Elevation::Root
    }
}
