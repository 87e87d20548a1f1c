// # Command Runner Trait
//
// Defines the interface for running external host tools (package manager,
// crontab, container runtime).
//
// ## Implementations
//
// - `SystemCommandRunner`: spawns real processes via `tokio::process`
// - Test doubles record invocations instead of spawning anything
//
// ## Usage
//
// ```rust,ignore
// use homeboot_core::traits::{CommandRunner, CommandSpec};
//
// let output = runner
//     .run(&CommandSpec::new("docker").args(["compose", "up", "-d"]).elevated())
//     .await?;
// if !output.success() {
//     // inspect output.status / output.stderr
// }
// ```

use async_trait::async_trait;
use std::path::PathBuf;

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Bytes fed to stdin
    pub stdin: Option<Vec<u8>>,
    /// Whether the command needs root privileges
    pub elevated: bool,
}

impl CommandSpec {
    /// Create a command for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            stdin: None,
            elevated: false,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Feed `input` to stdin
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Mark the command as requiring root privileges
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Program and arguments joined for log lines
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status (`None` when terminated by a signal)
    pub status: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given status and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Trait for running external commands
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Spawn the requested process and wait for it
/// - ✅ Prefix elevation (`sudo`) when the command is marked elevated
///
/// ## Forbidden Capabilities
/// - ❌ Interpret the output (owned by the calling component)
/// - ❌ Retry failed commands (retries are an operator action)
/// - ❌ Run commands through a shell
///
/// # Errors
///
/// `run` only fails when the command could not be started at all, or when
/// it is elevated and no elevation is available (`Error::Privilege`). A
/// non-zero exit status is reported through `CommandOutput::status`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, crate::Error>;

    /// Whether elevated commands can run at all
    fn can_elevate(&self) -> bool;

    /// Whether the runner itself executes as root
    fn is_root(&self) -> bool;
}
