//! Test doubles and common utilities for contract tests
//!
//! Every host boundary (commands, probes, packages, schedules, provider) is
//! replaced by a double that records what the core asked it to do.

#![allow(dead_code)]

use async_trait::async_trait;
use homeboot_core::Error;
use homeboot_core::bootstrap::HostServices;
use homeboot_core::config::{Credentials, Secret};
use homeboot_core::schedule::MemoryScheduleStore;
use homeboot_core::system::TargetUser;
use homeboot_core::traits::{
    CommandOutput, CommandRunner, CommandSpec, DdnsProvider, PackageManager, ProbeStatus,
    ProviderResponse, ToolProbe, ToolSpec,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A CommandRunner that records invocations and answers from a script
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    /// Replies keyed by "program first-arg"
    replies: Mutex<HashMap<String, CommandOutput>>,
    can_elevate: bool,
}

impl RecordingRunner {
    /// Runner that answers every command with status 0
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            can_elevate: true,
        }
    }

    /// Runner without any elevation
    pub fn unprivileged() -> Self {
        Self {
            can_elevate: false,
            ..Self::new()
        }
    }

    /// Answer `program first_arg ...` with `output`
    pub fn reply(self, key: &str, output: CommandOutput) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(key.to_string(), output);
        self
    }

    /// All recorded invocations
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded invocations of `program`
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program == program)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, Error> {
        if spec.elevated && !self.can_elevate {
            return Err(Error::privilege(format!("cannot elevate {}", spec.display())));
        }
        self.calls.lock().unwrap().push(spec.clone());

        let key = match spec.args.first() {
            Some(first) => format!("{} {}", spec.program, first),
            None => spec.program.clone(),
        };
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        Ok(reply.unwrap_or_else(|| CommandOutput::ok("")))
    }

    fn can_elevate(&self) -> bool {
        self.can_elevate
    }

    fn is_root(&self) -> bool {
        false
    }
}

/// A ToolProbe answering from a table; unknown tools are present
pub struct ScriptedProbe {
    statuses: Mutex<HashMap<&'static str, ProbeStatus>>,
    probe_count: AtomicUsize,
}

impl ScriptedProbe {
    /// Probe reporting every tool as present
    pub fn all_present() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            probe_count: AtomicUsize::new(0),
        }
    }

    /// Report `tool` with `status`
    pub fn with(self, tool: &ToolSpec, status: ProbeStatus) -> Self {
        self.statuses.lock().unwrap().insert(tool.name, status);
        self
    }

    /// Mark `tool` present (as after a successful install)
    pub fn mark_present(&self, tool: &ToolSpec) {
        self.statuses
            .lock()
            .unwrap()
            .insert(tool.name, ProbeStatus::Present);
    }

    /// Number of probe calls
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProbe for ScriptedProbe {
    async fn probe(&self, tool: &ToolSpec) -> Result<ProbeStatus, Error> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(tool.name)
            .cloned()
            .unwrap_or(ProbeStatus::Present))
    }
}

/// A PackageManager that records installs
pub struct MockPackageManager {
    can_install: bool,
    broken: Vec<&'static str>,
    installed: Mutex<Vec<String>>,
    refresh_count: AtomicUsize,
}

impl MockPackageManager {
    /// Manager that installs anything
    pub fn new() -> Self {
        Self {
            can_install: true,
            broken: Vec::new(),
            installed: Mutex::new(Vec::new()),
            refresh_count: AtomicUsize::new(0),
        }
    }

    /// Manager without privileges
    pub fn unprivileged() -> Self {
        Self {
            can_install: false,
            ..Self::new()
        }
    }

    /// Make `package` fail to install
    pub fn with_broken(mut self, package: &'static str) -> Self {
        self.broken.push(package);
        self
    }

    /// Packages installed so far, in order
    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().unwrap().clone()
    }

    /// Number of index refreshes
    pub fn refresh_count(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageManager for MockPackageManager {
    async fn refresh(&self) -> Result<(), Error> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn install(&self, package: &str) -> Result<(), Error> {
        if self.broken.iter().any(|b| *b == package) {
            return Err(Error::install(package, "unable to locate package"));
        }
        self.installed.lock().unwrap().push(package.to_string());
        Ok(())
    }

    fn can_install(&self) -> bool {
        self.can_install
    }

    fn manager_name(&self) -> &'static str {
        "mock"
    }
}

/// A DdnsProvider that records calls and replies with a fixed body
#[derive(Clone)]
pub struct MockDdnsProvider {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    body: &'static str,
    offline: bool,
}

impl MockDdnsProvider {
    /// Provider answering `OK`
    pub fn ok() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            body: "OK",
            offline: false,
        }
    }

    /// Provider whose every call fails at the network level
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::ok()
        }
    }

    /// Recorded (domain, token) pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DdnsProvider for MockDdnsProvider {
    async fn update(&self, domain: &str, token: &Secret) -> Result<ProviderResponse, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((domain.to_string(), token.expose().to_string()));
        if self.offline {
            return Err(Error::network("connection refused"));
        }
        Ok(ProviderResponse {
            status: 200,
            body: self.body.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Bundle doubles into HostServices
pub fn host(
    runner: Arc<RecordingRunner>,
    probe: Arc<ScriptedProbe>,
    packages: Arc<MockPackageManager>,
    schedule: Arc<MemoryScheduleStore>,
) -> HostServices {
    HostServices {
        runner,
        probe,
        packages,
        schedule,
    }
}

/// The invoking account with its home redirected to `home`
pub fn target_in(home: &Path) -> TargetUser {
    TargetUser {
        home: home.to_path_buf(),
        ..TargetUser::current().unwrap()
    }
}

/// Complete deploy credentials
pub fn credentials() -> Credentials {
    Credentials {
        steam_user: Secret::from("farmer"),
        steam_pass: Secret::from("hunter2"),
        steam_guard_code: None,
        vnc_password: Secret::from("vnc-pass"),
    }
}

/// File mode bits of `path`
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}
