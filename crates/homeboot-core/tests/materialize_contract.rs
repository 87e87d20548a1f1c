//! Contract Test: Config Materialization
//!
//! Constraints verified:
//! - An existing file is left byte- and mode-identical unless overwriting
//! - Overwriting always leaves an owner-only (0600) file
//! - A first deploy writes ports and credentials as quoted env pairs
//! - Repeated deploys without --force never rewrite the env file
//! - An operator-edited base definition is kept, and the override only pins
//!   services it declares
//!
//! If this test fails, operator edits or secrets are at risk.

mod common;

use common::*;
use homeboot_core::bootstrap::Bootstrap;
use homeboot_core::config::{DeploySettings, Secret};
use homeboot_core::materializer::{self, EnvFile, MaterializeOutcome};
use homeboot_core::schedule::MemoryScheduleStore;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn bootstrap() -> Bootstrap {
    Bootstrap::new(host(
        Arc::new(RecordingRunner::new()),
        Arc::new(ScriptedProbe::all_present()),
        Arc::new(MockPackageManager::new()),
        Arc::new(MemoryScheduleStore::new()),
    ))
}

fn values() -> EnvFile {
    EnvFile::new().with("GAME_PORT", "1").with("VNC_PORT", "2")
}

#[test]
fn existing_file_is_not_touched_without_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, "# hand edited\nGAME_PORT=9999\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let outcome = materializer::materialize(&path, &values(), false).unwrap();

    assert_eq!(outcome, MaterializeOutcome::SkippedExisting);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# hand edited\nGAME_PORT=9999\n"
    );
    assert_eq!(mode_of(&path), 0o644);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn overwrite_always_yields_owner_only_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, "OLD=1\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let outcome = materializer::materialize(&path, &values(), true).unwrap();

    assert_eq!(outcome, MaterializeOutcome::Written);
    assert_eq!(mode_of(&path), 0o600);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "GAME_PORT=\"1\"\nVNC_PORT=\"2\"\n"
    );
}

#[tokio::test]
async fn first_deploy_writes_ports_and_credentials() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("fs25-server");
    let settings = DeploySettings::new(credentials(), &install_dir);

    let report = bootstrap()
        .deploy(&settings, &target_in(home.path()))
        .await
        .unwrap();

    assert_eq!(report.env_file, MaterializeOutcome::Written);
    let env_path = install_dir.join(".env");
    let text = fs::read_to_string(&env_path).unwrap();
    assert!(text.contains("GAME_PORT=\"24643\"\n"));
    assert!(text.contains("VNC_PORT=\"8090\"\n"));
    assert!(text.contains("STEAM_PASS=\"hunter2\"\n"));
    assert!(!text.contains("STEAM_GUARD_CODE"));
    assert_eq!(mode_of(&env_path), 0o600);

    let parsed = materializer::read_env_file(&env_path).unwrap();
    assert_eq!(parsed.get("VNC_PASSWORD"), Some("vnc-pass"));
}

#[tokio::test]
async fn second_deploy_without_force_is_byte_identical() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("fs25-server");
    let target = target_in(home.path());
    let bootstrap = bootstrap();

    let first = DeploySettings::new(credentials(), &install_dir);
    bootstrap.deploy(&first, &target).await.unwrap();
    let env_path = install_dir.join(".env");
    let before = fs::read(&env_path).unwrap();

    let mut second = DeploySettings::new(credentials(), &install_dir);
    second.credentials.steam_pass = Secret::from("changed");
    second.ports.game = 25000;
    let report = bootstrap.deploy(&second, &target).await.unwrap();

    assert_eq!(report.env_file, MaterializeOutcome::SkippedExisting);
    assert_eq!(fs::read(&env_path).unwrap(), before);
    assert_eq!(mode_of(&env_path), 0o600);
}

#[tokio::test]
async fn force_regenerates_env_file() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("fs25-server");
    let target = target_in(home.path());
    let bootstrap = bootstrap();

    bootstrap
        .deploy(&DeploySettings::new(credentials(), &install_dir), &target)
        .await
        .unwrap();

    let mut forced = DeploySettings::new(credentials(), &install_dir);
    forced.credentials.steam_guard_code = Some(Secret::from("AB12C"));
    forced.force = true;
    let report = bootstrap.deploy(&forced, &target).await.unwrap();

    assert_eq!(report.env_file, MaterializeOutcome::Written);
    let text = fs::read_to_string(install_dir.join(".env")).unwrap();
    assert!(text.contains("STEAM_GUARD_CODE=\"AB12C\"\n"));
}

#[tokio::test]
async fn operator_edited_base_definition_survives_deploy() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("fs25-server");
    fs::create_dir_all(&install_dir).unwrap();
    let base = install_dir.join("docker-compose.yml");
    fs::write(&base, "services:\n  custom:\n    image: mine\n").unwrap();

    let report = bootstrap()
        .deploy(&DeploySettings::new(credentials(), &install_dir), &target_in(home.path()))
        .await
        .unwrap();

    assert_eq!(report.base_definition, MaterializeOutcome::SkippedExisting);
    assert_eq!(
        fs::read_to_string(&base).unwrap(),
        "services:\n  custom:\n    image: mine\n"
    );
    assert_eq!(report.started.services, ["custom"]);

    // Every overridden service must exist in the base, or compose would see
    // a service with neither image nor build context
    let override_path = install_dir.join("docker-compose.override.yml");
    assert!(Path::new(&override_path).exists());
    let base_services = service_keys(&fs::read_to_string(&base).unwrap());
    let override_services = service_keys(&fs::read_to_string(&override_path).unwrap());
    assert!(
        override_services.iter().all(|s| base_services.contains(s)),
        "override services {:?} not all in base {:?}",
        override_services,
        base_services
    );
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&override_path).unwrap()).unwrap();
    assert_eq!(
        parsed["services"]["custom"]["platform"].as_str(),
        Some("linux/amd64")
    );
}

#[tokio::test]
async fn every_base_service_is_pinned() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("fs25-server");
    fs::create_dir_all(&install_dir).unwrap();
    fs::write(
        install_dir.join("docker-compose.yml"),
        "services:\n  server:\n    image: mine\n  web-admin:\n    image: admin\n",
    )
    .unwrap();

    let report = bootstrap()
        .deploy(&DeploySettings::new(credentials(), &install_dir), &target_in(home.path()))
        .await
        .unwrap();

    assert_eq!(report.started.services, ["server", "web-admin"]);
    let override_yaml =
        fs::read_to_string(install_dir.join("docker-compose.override.yml")).unwrap();
    assert_eq!(service_keys(&override_yaml), ["server", "web-admin"]);
}

#[tokio::test]
async fn nested_install_dir_reports_every_created_directory() {
    let home = tempdir().unwrap();
    let install_dir = home.path().join("games").join("farming").join("fs25-server");

    let report = bootstrap()
        .deploy(&DeploySettings::new(credentials(), &install_dir), &target_in(home.path()))
        .await
        .unwrap();

    assert_eq!(
        report.created_dirs,
        [
            home.path().join("games"),
            home.path().join("games").join("farming"),
            install_dir.clone(),
        ]
    );

    let again = bootstrap()
        .deploy(&DeploySettings::new(credentials(), &install_dir), &target_in(home.path()))
        .await
        .unwrap();
    assert!(again.created_dirs.is_empty());
}

fn service_keys(yaml: &str) -> Vec<String> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    parsed["services"]
        .as_mapping()
        .unwrap()
        .keys()
        .map(|k| k.as_str().unwrap().to_string())
        .collect()
}
