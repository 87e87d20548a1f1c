use assert_cmd::Command;
use predicates::prelude::*;

const ENV_FALLBACKS: &[&str] = &[
    "DUCKDNS_DOMAIN",
    "DUCKDNS_TOKEN",
    "STEAM_USER",
    "STEAM_PASS",
    "STEAM_GUARD_CODE",
    "VNC_PASSWORD",
    "SUDO_USER",
    "HOMEBOOT_LOG_LEVEL",
];

fn homeboot() -> Command {
    let mut cmd = Command::cargo_bin("homeboot").unwrap();
    for key in ENV_FALLBACKS {
        cmd.env_remove(key);
    }
    cmd
}

/// The help lists every subcommand
#[test]
fn test_cli_help() {
    homeboot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ddns-setup"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("ddns-update"));
}

/// Deploy help shows the documented flags
#[test]
fn test_deploy_help() {
    homeboot()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--steam-guard-code"))
        .stdout(predicate::str::contains("--no-binfmt"))
        .stdout(predicate::str::contains("24643"))
        .stdout(predicate::str::contains("8090"));
}

/// A missing domain is a configuration error
#[test]
fn test_ddns_setup_without_domain() {
    homeboot()
        .args(["ddns-setup", "--token", "abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--domain"));
}

/// A missing token is a configuration error
#[test]
fn test_ddns_setup_without_token() {
    homeboot()
        .args(["ddns-setup", "--domain", "myfarm.duckdns.org"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--token"));
}

/// Environment fallbacks are read, and the token is never echoed
#[test]
fn test_ddns_setup_env_fallback_still_validates_domain() {
    homeboot()
        .arg("ddns-setup")
        .env("DUCKDNS_DOMAIN", "not_a_valid!domain")
        .env("DUCKDNS_TOKEN", "very-secret-token")
        .args(["--no-apt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid characters"))
        .stderr(predicate::str::contains("very-secret-token").not());
}

/// An unknown target user is a configuration error
#[test]
fn test_ddns_setup_unknown_user() {
    homeboot()
        .args([
            "ddns-setup",
            "--domain",
            "myfarm",
            "--token",
            "abc",
            "--user",
            "no-such-user-homeboot-cli",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no-such-user-homeboot-cli"));
}

/// Missing credentials are listed and nothing is deployed
#[test]
fn test_deploy_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let install_dir = dir.path().join("fs25-server");

    homeboot()
        .args(["deploy", "--steam-user", "farmer", "--dir"])
        .arg(&install_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--steam-pass"))
        .stderr(predicate::str::contains("--vnc-password"));

    assert!(!install_dir.exists());
}

/// Clashing ports are rejected before anything happens
#[test]
fn test_deploy_port_clash() {
    homeboot()
        .args([
            "deploy",
            "--steam-user",
            "farmer",
            "--steam-pass",
            "pass",
            "--vnc-password",
            "vnc",
            "--game-port",
            "9000",
            "--vnc-port",
            "9000",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must differ"));
}

/// The scheduled job fails with a configuration error when its file is gone
#[test]
fn test_ddns_update_missing_config() {
    let dir = tempfile::tempdir().unwrap();

    homeboot()
        .args(["ddns-update", "--config"])
        .arg(dir.path().join("duckdns.env"))
        .assert()
        .code(1);
}

/// Invalid log levels are rejected
#[test]
fn test_invalid_log_level() {
    homeboot()
        .args(["--log-level", "loud", "ddns-update", "--config", "/nonexistent"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("log level"));
}

/// Unknown flags exit with the configuration error code
#[test]
fn test_unknown_flag() {
    homeboot()
        .args(["deploy", "--bogus"])
        .assert()
        .code(1);
}
