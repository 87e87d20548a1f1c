// # homeboot - Host Bootstrap CLI
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add install, schedule, file or launch logic here
// - All of that lives in homeboot-core
//
// The binary is responsible for:
// 1. Parsing flags and environment fallbacks
// 2. Initializing logging and the runtime
// 3. Registering providers
// 4. Handing validated settings to `homeboot_core::Bootstrap`
//
// ## Subcommands
//
// - `ddns-setup`: register the periodic DuckDNS update for a user
// - `deploy`: install and start the game server stack
// - `ddns-update`: one DuckDNS update from a credentials file (run by cron)
//
// ## Environment
//
// - `DUCKDNS_DOMAIN`, `DUCKDNS_TOKEN`: fallbacks for `ddns-setup`
// - `STEAM_USER`, `STEAM_PASS`, `STEAM_GUARD_CODE`, `VNC_PASSWORD`: fallbacks for `deploy`
// - `SUDO_USER`: default target user when invoked through sudo
// - `HOMEBOOT_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// sudo homeboot ddns-setup --domain myfarm.duckdns.org --token "$TOKEN"
// sudo homeboot deploy --steam-user farmer --steam-pass "$PASS" --vnc-password "$VNC"
// ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use homeboot_core::bootstrap::{Bootstrap, HostServices, run_scheduled_update};
use homeboot_core::config::{
    DEFAULT_GAME_PORT, DEFAULT_INSTALL_DIR, DEFAULT_SCHEDULE, DEFAULT_SERVER_IMAGE,
    DEFAULT_VNC_PORT,
};
use homeboot_core::system::{TargetUser, resolve_target_user};
use homeboot_core::{
    Credentials, DdnsSettings, DeploySettings, Error, HttpResult, MaterializeOutcome,
    ProviderConfig, ProviderRegistry, Secret, ServicePorts,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration, validation, privilege or permission error
/// - 2: Runtime error (install, schedule, launch or I/O failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomebootExitCode {
    /// Everything succeeded
    Success = 0,
    /// Configuration error or failed preflight check
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HomebootExitCode> for ExitCode {
    fn from(code: HomebootExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Host bootstrap orchestrator
#[derive(Parser, Debug)]
#[command(name = "homeboot", version, about, long_about = None)]
struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "HOMEBOOT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a periodic DuckDNS update in a user's crontab
    DdnsSetup(DdnsSetupArgs),
    /// Deploy and start the containerized game server
    Deploy(DeployArgs),
    /// Run one DuckDNS update from a credentials file
    DdnsUpdate(DdnsUpdateArgs),
}

#[derive(Args, Debug)]
struct DdnsSetupArgs {
    /// DuckDNS domain (`myfarm` or `myfarm.duckdns.org`)
    #[arg(long, env = "DUCKDNS_DOMAIN")]
    domain: Option<String>,

    /// DuckDNS account token
    #[arg(long, env = "DUCKDNS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Cron expression for the update
    #[arg(long, default_value = DEFAULT_SCHEDULE)]
    interval: String,

    /// Account whose crontab receives the task
    #[arg(long)]
    user: Option<String>,

    /// Do not install missing packages
    #[arg(long)]
    no_apt: bool,
}

#[derive(Args, Debug)]
struct DeployArgs {
    /// Steam account name
    #[arg(long, env = "STEAM_USER")]
    steam_user: Option<String>,

    /// Steam account password
    #[arg(long, env = "STEAM_PASS", hide_env_values = true)]
    steam_pass: Option<String>,

    /// One-time Steam Guard code
    #[arg(long, env = "STEAM_GUARD_CODE", hide_env_values = true)]
    steam_guard_code: Option<String>,

    /// Password for the VNC admin console
    #[arg(long, env = "VNC_PASSWORD", hide_env_values = true)]
    vnc_password: Option<String>,

    /// Game traffic port
    #[arg(long, default_value_t = DEFAULT_GAME_PORT)]
    game_port: u16,

    /// VNC admin console port
    #[arg(long, default_value_t = DEFAULT_VNC_PORT)]
    vnc_port: u16,

    /// Install directory [default: ~/fs25-server of the target user]
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Container image used when generating docker-compose.yml
    #[arg(long, default_value = DEFAULT_SERVER_IMAGE)]
    image: String,

    /// Skip the amd64 emulation setup
    #[arg(long)]
    no_binfmt: bool,

    /// Regenerate an existing .env file
    #[arg(long)]
    force: bool,

    /// Account owning the install directory
    #[arg(long)]
    user: Option<String>,
}

#[derive(Args, Debug)]
struct DdnsUpdateArgs {
    /// Credentials file written by `ddns-setup`
    #[arg(long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                HomebootExitCode::ConfigError.into()
            } else {
                HomebootExitCode::Success.into()
            };
        }
    };

    let log_level = match parse_log_level(&cli.log_level) {
        Some(level) => level,
        None => {
            eprintln!(
                "Configuration error: log level '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                cli.log_level
            );
            return HomebootExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HomebootExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HomebootExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(cli.command));

    match result {
        Ok(()) => HomebootExitCode::Success.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e).into()
        }
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Map a failure to its exit code
fn exit_code_for(err: &anyhow::Error) -> HomebootExitCode {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_preflight() || matches!(e, Error::Config(_) | Error::Permission(_)) => {
            HomebootExitCode::ConfigError
        }
        _ => HomebootExitCode::RuntimeError,
    }
}

async fn run(command: Command) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "duckdns")]
    homeboot_provider_duckdns::register(&registry);

    match command {
        Command::DdnsSetup(args) => ddns_setup(args, &registry).await,
        Command::Deploy(args) => deploy(args).await,
        Command::DdnsUpdate(args) => ddns_update(args, &registry).await,
    }
}

/// Pick the target account from `--user` or `SUDO_USER`
fn target_user(explicit: Option<&str>) -> Result<TargetUser> {
    let sudo_user = env::var("SUDO_USER").ok();
    Ok(resolve_target_user(explicit, sudo_user.as_deref())?)
}

fn host_services() -> Result<HostServices> {
    let current = TargetUser::current()?;
    Ok(HostServices::system(current.name))
}

async fn ddns_setup(args: DdnsSetupArgs, registry: &ProviderRegistry) -> Result<()> {
    let domain = args
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| Error::validation("--domain (or DUCKDNS_DOMAIN) is required"))?;
    let token = args
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::validation("--token (or DUCKDNS_TOKEN) is required"))?;

    let target = target_user(args.user.as_deref())?;
    let settings = DdnsSettings::new(&domain, token, &target.name)
        .with_schedule(args.interval)
        .with_install_dependencies(!args.no_apt);
    settings.validate()?;

    let provider = registry.create_provider(&settings.provider)?;
    let program = env::current_exe().map_err(Error::from)?;

    info!("Setting up DuckDNS for {} (user {})", settings.domain, target.name);
    let report = Bootstrap::new(host_services()?)
        .setup_ddns(&settings, &target, &program, provider)
        .await?;

    println!("Scheduled '{}' for {}", settings.schedule, target.name);
    println!("Credentials: {}", report.paths.credentials.display());
    let first = &report.first_update;
    match first {
        HttpResult::Response { body, .. } if first.is_ok() => {
            println!("First update: {}", body.trim())
        }
        HttpResult::Response { status, body } => {
            warn!("First update rejected ({}): {}", status, body.trim());
            println!(
                "First update: {} (check the domain and token, see {})",
                body.trim(),
                report.paths.log.display()
            );
        }
        HttpResult::Failed { error } => {
            println!("First update failed: {} (cron will retry)", error);
        }
    }

    Ok(())
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let target = target_user(args.user.as_deref())?;

    let credentials = Credentials {
        steam_user: Secret::from(args.steam_user.unwrap_or_default()),
        steam_pass: Secret::from(args.steam_pass.unwrap_or_default()),
        steam_guard_code: args.steam_guard_code.map(Secret::from),
        vnc_password: Secret::from(args.vnc_password.unwrap_or_default()),
    };
    let install_dir = args
        .dir
        .unwrap_or_else(|| target.home.join(DEFAULT_INSTALL_DIR));

    let mut settings = DeploySettings::new(credentials, install_dir);
    settings.ports = ServicePorts {
        game: args.game_port,
        admin: args.vnc_port,
    };
    settings.image = args.image;
    settings.setup_emulation = !args.no_binfmt;
    settings.force = args.force;
    settings.validate()?;

    info!("Deploying into {}", settings.install_dir.display());
    let report = Bootstrap::new(host_services()?)
        .deploy(&settings, &target)
        .await?;

    let env_note = match report.env_file {
        MaterializeOutcome::Written => "written",
        MaterializeOutcome::SkippedExisting => "kept (use --force to regenerate)",
    };
    println!("Env file: {}", env_note);
    println!(
        "Started {} from {}",
        report.started.services.join(", "),
        report.started.install_dir.display()
    );
    println!(
        "Game port {}, VNC port {}",
        settings.ports.game, settings.ports.admin
    );

    Ok(())
}

async fn ddns_update(args: DdnsUpdateArgs, registry: &ProviderRegistry) -> Result<()> {
    let provider = registry.create_provider(&ProviderConfig::default())?;

    match run_scheduled_update(&args.config, provider).await? {
        HttpResult::Response { status, body } => info!("DuckDNS: {} {}", status, body.trim()),
        HttpResult::Failed { error } => warn!("DuckDNS update failed: {}", error),
    }

    Ok(())
}
