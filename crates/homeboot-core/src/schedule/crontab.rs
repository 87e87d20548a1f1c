// # Crontab Schedule Store
//
// `ScheduleStore` backed by the system `crontab` utility.
//
// ## Atomic Replace
//
// The new table is staged in an owner-only temporary file and installed with
// `crontab <file>`, which swaps the whole table in one step. The temporary
// file is removed once installed.
//
// ## Privileges
//
// Managing another account's table (`crontab -u <owner>`) requires root.
// Without any elevation the store fails with `Error::Permission` before
// running anything.

use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;

use crate::Error;
use crate::traits::{CommandOutput, CommandRunner, CommandSpec, ScheduleStore};

/// Schedule store driving `crontab`
pub struct CrontabStore {
    runner: Arc<dyn CommandRunner>,
    current_user: String,
}

impl CrontabStore {
    /// Create a store
    ///
    /// `current_user` is the account this process runs as; tables of any
    /// other owner are managed with elevation.
    pub fn new(runner: Arc<dyn CommandRunner>, current_user: impl Into<String>) -> Self {
        Self {
            runner,
            current_user: current_user.into(),
        }
    }

    fn base_command(&self, owner: &str) -> Result<CommandSpec, Error> {
        if owner == self.current_user {
            return Ok(CommandSpec::new("crontab"));
        }

        if !self.runner.can_elevate() {
            return Err(Error::permission(format!(
                "cannot manage the schedule of '{}' as '{}' without root",
                owner, self.current_user
            )));
        }

        Ok(CommandSpec::new("crontab").args(["-u", owner]).elevated())
    }

    fn permission_or_command_error(owner: &str, action: &str, output: &CommandOutput) -> Error {
        let stderr = output.stderr.trim();
        let lowered = stderr.to_lowercase();
        if lowered.contains("not allowed")
            || lowered.contains("must be privileged")
            || lowered.contains("permission denied")
        {
            Error::permission(format!("crontab {} for '{}': {}", action, owner, stderr))
        } else {
            Error::command(format!(
                "crontab {} for '{}' exited with {:?}: {}",
                action, owner, output.status, stderr
            ))
        }
    }
}

#[async_trait]
impl ScheduleStore for CrontabStore {
    async fn read(&self, owner: &str) -> Result<Option<String>, Error> {
        let output = self.runner.run(&self.base_command(owner)?.arg("-l")).await?;

        if output.success() {
            return Ok(Some(output.stdout));
        }

        if output.stderr.to_lowercase().contains("no crontab for") {
            tracing::debug!("No crontab for {} yet", owner);
            return Ok(None);
        }

        Err(Self::permission_or_command_error(owner, "-l", &output))
    }

    async fn replace(&self, owner: &str, table: &str) -> Result<(), Error> {
        let base = self.base_command(owner)?;

        let mut staged = tempfile::Builder::new()
            .prefix("homeboot-crontab-")
            .tempfile()?;
        staged.write_all(table.as_bytes())?;
        staged.flush()?;

        let path = staged.path().to_string_lossy().into_owned();
        let output = self.runner.run(&base.arg(path)).await?;

        if !output.success() {
            return Err(Self::permission_or_command_error(owner, "install", &output));
        }

        tracing::trace!("Installed crontab for {}", owner);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "crontab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedRunner {
        elevate: bool,
        reply: CommandOutput,
        seen: Mutex<Vec<CommandSpec>>,
        staged: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, Error> {
            if let Some(last) = spec.args.last()
                && last.contains("homeboot-crontab-")
            {
                self.staged
                    .lock()
                    .unwrap()
                    .push(std::fs::read_to_string(last)?);
            }
            self.seen.lock().unwrap().push(spec.clone());
            Ok(self.reply.clone())
        }

        fn can_elevate(&self) -> bool {
            self.elevate
        }

        fn is_root(&self) -> bool {
            false
        }
    }

    fn runner(elevate: bool, reply: CommandOutput) -> Arc<ScriptedRunner> {
        Arc::new(ScriptedRunner {
            elevate,
            reply,
            seen: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn missing_crontab_reads_as_none() {
        let runner = runner(false, CommandOutput::failed(1, "no crontab for farmer\n"));
        let store = CrontabStore::new(runner.clone(), "farmer");

        assert_eq!(store.read("farmer").await.unwrap(), None);
        assert_eq!(runner.seen.lock().unwrap()[0].args, ["-l"]);
    }

    #[tokio::test]
    async fn other_owner_needs_elevation() {
        let runner = runner(false, CommandOutput::ok(""));
        let store = CrontabStore::new(runner.clone(), "admin");

        let err = store.read("farmer").await.unwrap_err();
        assert!(matches!(err, Error::Permission(_)));
        let err = store.replace("farmer", "").await.unwrap_err();
        assert!(matches!(err, Error::Permission(_)));
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_installs_staged_table() {
        let runner = runner(true, CommandOutput::ok(""));
        let store = CrontabStore::new(runner.clone(), "root");

        store
            .replace("farmer", "*/5 * * * * /bin/true\n")
            .await
            .unwrap();

        let seen = runner.seen.lock().unwrap();
        assert!(seen[0].elevated);
        assert_eq!(&seen[0].args[..2], ["-u", "farmer"]);
        assert_eq!(
            *runner.staged.lock().unwrap(),
            ["*/5 * * * * /bin/true\n"]
        );
    }

    #[tokio::test]
    async fn denied_crontab_is_permission_error() {
        let runner = runner(
            true,
            CommandOutput::failed(1, "You (farmer) are not allowed to use this program (crontab)"),
        );
        let store = CrontabStore::new(runner, "farmer");

        let err = store.read("farmer").await.unwrap_err();
        assert!(matches!(err, Error::Permission(_)));
    }
}
