//! Bootstrap workflows
//!
//! Wires the components into the two operator entry points plus the
//! scheduled job:
//!
//! - [`Bootstrap::setup_ddns`]: install cron, store credentials, register the
//!   update task, run one update right away
//! - [`Bootstrap::deploy`]: install the container stack tooling, write the
//!   env file and base definition, start the stack
//! - [`run_scheduled_update`]: what the cron entry executes
//!
//! Every workflow validates its settings and checks privileges before the
//! first mutation. Later failures do not roll back completed steps; running
//! the workflow again is the recovery path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{DdnsSettings, DeploySettings, Secret, normalize_domain};
use crate::ddns::{DdnsUpdater, HttpResult};
use crate::error::{Error, Result};
use crate::installer::{DependencyInstaller, InstallOutcome};
use crate::launcher::{OverrideSpec, StackLauncher, Started, compose};
use crate::materializer::{self, EnvFile, MaterializeOutcome};
use crate::schedule::{CrontabStore, Registered, TaskRegistrar, TaskRegistration};
use crate::system::{AptPackageManager, SystemCommandRunner, SystemToolProbe, TargetUser};
use crate::traits::{
    CommandRunner, DdnsProvider, PackageManager, ScheduleStore, ToolProbe, ToolSpec,
};

/// Logical id of the DDNS update task
pub const DDNS_TASK_ID: &str = "duckdns-update";

/// Directory under the target home holding DDNS files
pub const DDNS_DIR: &str = "duckdns";

/// Credentials file name
pub const DDNS_CREDENTIALS_FILE: &str = "duckdns.env";

/// Update log file name
pub const DDNS_LOG_FILE: &str = "duck.log";

/// Env file name in the install directory
pub const DEPLOY_ENV_FILE: &str = ".env";

/// Env key holding the DDNS domain in the credentials file
pub const DOMAIN_KEY: &str = "DUCKDNS_DOMAIN";

/// Env key holding the DDNS token in the credentials file
pub const TOKEN_KEY: &str = "DUCKDNS_TOKEN";

/// Files of the DDNS path for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdnsPaths {
    /// Directory holding both files
    pub dir: PathBuf,
    /// Owner-only credentials file read by the scheduled job
    pub credentials: PathBuf,
    /// Log of the last update
    pub log: PathBuf,
}

impl DdnsPaths {
    /// Paths under `home`
    pub fn under(home: &Path) -> Self {
        let dir = home.join(DDNS_DIR);
        Self {
            credentials: dir.join(DDNS_CREDENTIALS_FILE),
            log: dir.join(DDNS_LOG_FILE),
            dir,
        }
    }

    /// Paths next to an existing credentials file
    pub fn beside(credentials: &Path) -> Self {
        let dir = match credentials.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            log: dir.join(DDNS_LOG_FILE),
            credentials: credentials.to_path_buf(),
            dir,
        }
    }
}

/// Host-facing services a bootstrap run needs
pub struct HostServices {
    /// External command runner
    pub runner: Arc<dyn CommandRunner>,
    /// Tool presence probe
    pub probe: Arc<dyn ToolProbe>,
    /// Package manager
    pub packages: Arc<dyn PackageManager>,
    /// Schedule store
    pub schedule: Arc<dyn ScheduleStore>,
}

impl HostServices {
    /// Services backed by the real host (apt, crontab, docker)
    ///
    /// `current_user` is the account this process runs as.
    pub fn system(current_user: impl Into<String>) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
        Self {
            probe: Arc::new(SystemToolProbe::new(runner.clone())),
            packages: Arc::new(AptPackageManager::new(runner.clone())),
            schedule: Arc::new(CrontabStore::new(runner.clone(), current_user)),
            runner,
        }
    }
}

/// Result of [`Bootstrap::setup_ddns`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdnsSetupReport {
    /// Tool outcomes (empty when installation was skipped)
    pub installed: Vec<InstallOutcome>,
    /// Files written for the task
    pub paths: DdnsPaths,
    /// Registration outcome
    pub registered: Registered,
    /// The scheduled command line
    pub command: String,
    /// Outcome of the immediate first update
    pub first_update: HttpResult,
}

/// Result of [`Bootstrap::deploy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Tool outcomes
    pub installed: Vec<InstallOutcome>,
    /// What happened to `<dir>/.env`
    pub env_file: MaterializeOutcome,
    /// What happened to `<dir>/docker-compose.yml`
    pub base_definition: MaterializeOutcome,
    /// Directories created for the install directory, outermost first
    pub created_dirs: Vec<PathBuf>,
    /// The running stack
    pub started: Started,
}

/// Bootstrap orchestrator
pub struct Bootstrap {
    runner: Arc<dyn CommandRunner>,
    installer: DependencyInstaller,
    registrar: TaskRegistrar,
    launcher: StackLauncher,
}

impl Bootstrap {
    /// Create an orchestrator over `host`
    pub fn new(host: HostServices) -> Self {
        Self {
            installer: DependencyInstaller::new(host.probe, host.packages),
            registrar: TaskRegistrar::new(host.schedule),
            launcher: StackLauncher::new(host.runner.clone()),
            runner: host.runner,
        }
    }

    /// Acting for another account (its home, its schedule) requires root
    fn ensure_can_act_for(&self, target: &TargetUser) -> Result<()> {
        if target.is_current() || self.runner.is_root() {
            return Ok(());
        }
        Err(Error::permission(format!(
            "setting up files and tasks for '{}' requires root (run with sudo or drop --user)",
            target.name
        )))
    }

    /// Set up the periodic DDNS update for `target`
    ///
    /// `program` is the binary the schedule entry invokes with
    /// `ddns-update --config <credentials>`.
    pub async fn setup_ddns(
        &self,
        settings: &DdnsSettings,
        target: &TargetUser,
        program: &Path,
        provider: Box<dyn DdnsProvider>,
    ) -> Result<DdnsSetupReport> {
        settings.validate()?;
        self.ensure_can_act_for(target)?;

        let installed = if settings.install_dependencies {
            self.installer
                .ensure_all(&[ToolSpec::CRON, ToolSpec::CURL])
                .await?
        } else {
            info!("Skipping dependency installation");
            Vec::new()
        };

        let paths = DdnsPaths::under(&target.home);
        let created_dirs = materializer::missing_dirs(&paths.dir);
        let credentials = EnvFile::new()
            .with(DOMAIN_KEY, settings.domain.as_str())
            .with(TOKEN_KEY, settings.token.expose());
        materializer::materialize(&paths.credentials, &credentials, true)?;
        take_dir_ownership(target, &paths.dir, &created_dirs)?;
        target.take_ownership(&paths.credentials)?;

        let command = format!(
            "{} ddns-update --config {}",
            shell_word(&program.to_string_lossy()),
            shell_word(&paths.credentials.to_string_lossy())
        );
        let registration =
            TaskRegistration::new(DDNS_TASK_ID, settings.schedule.as_str(), command.as_str());
        let registered = self.registrar.register(&registration, &target.name).await?;

        let updater = DdnsUpdater::new(provider, paths.log.clone());
        let first_update = updater.update(&settings.domain, &settings.token).await?;
        if let Err(e) = target.take_ownership(&paths.log) {
            warn!("{}", e);
        }

        Ok(DdnsSetupReport {
            installed,
            paths,
            registered,
            command,
            first_update,
        })
    }

    /// Deploy and start the game server stack
    pub async fn deploy(
        &self,
        settings: &DeploySettings,
        target: &TargetUser,
    ) -> Result<DeployReport> {
        settings.validate()?;
        self.ensure_can_act_for(target)?;

        let mut tools = vec![ToolSpec::DOCKER, ToolSpec::COMPOSE];
        if settings.setup_emulation {
            tools.push(ToolSpec::BINFMT_AMD64);
        } else {
            info!("Skipping amd64 emulation setup");
        }
        let installed = self.installer.ensure_all(&tools).await?;

        let dir = &settings.install_dir;
        let created_dirs = materializer::missing_dirs(dir);
        let env_path = dir.join(DEPLOY_ENV_FILE);
        let env_file = materializer::materialize(
            &env_path,
            &EnvFile::from(settings.env_values()),
            settings.force,
        )?;
        if env_file == MaterializeOutcome::SkippedExisting {
            info!(
                "Keeping existing {} (pass --force to regenerate)",
                env_path.display()
            );
        }

        let base_definition = self.launcher.ensure_base_definition(dir, &settings.image)?;

        take_dir_ownership(target, dir, &created_dirs)?;
        target.take_ownership(&env_path)?;
        target.take_ownership(&dir.join(compose::BASE_FILE))?;

        // Pin whatever the base declares; an operator-edited file may rename
        // or add services
        let services = self.launcher.base_services(dir)?;
        let started = self
            .launcher
            .launch(dir, &OverrideSpec::amd64_all(services))
            .await?;
        target.take_ownership(&started.override_path)?;

        Ok(DeployReport {
            installed,
            env_file,
            base_definition,
            created_dirs,
            started,
        })
    }
}

/// Run one update from a credentials file
///
/// The log is written next to the credentials file.
///
/// # Errors
///
/// `Error::Config` when the file cannot be read or lacks a key. Network
/// failures are not errors.
pub async fn run_scheduled_update(
    credentials: &Path,
    provider: Box<dyn DdnsProvider>,
) -> Result<HttpResult> {
    let values = materializer::read_env_file(credentials)?;
    let domain = values.get(DOMAIN_KEY).ok_or_else(|| {
        Error::config(format!("{} missing from {}", DOMAIN_KEY, credentials.display()))
    })?;
    let token = values.get(TOKEN_KEY).ok_or_else(|| {
        Error::config(format!("{} missing from {}", TOKEN_KEY, credentials.display()))
    })?;

    let paths = DdnsPaths::beside(credentials);
    let updater = DdnsUpdater::new(provider, paths.log);
    updater
        .update(&normalize_domain(domain), &Secret::from(token))
        .await
}

/// Give `dir` to `target`, together with every directory created for it
fn take_dir_ownership(target: &TargetUser, dir: &Path, created: &[PathBuf]) -> Result<()> {
    if created.is_empty() {
        return target.take_ownership(dir);
    }
    created
        .iter()
        .try_for_each(|path| target.take_ownership(path))
}

/// Quote `word` for the shell cron runs its entries with
fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
