//! CLI integration tests
//!
//! Run the built binary against the directory server manifest shipped with
//! the manifest crate's fixtures.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn manifest_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("cfgmeta-manifest")
        .join("tests")
        .join("fixtures")
        .join("directory_server.yaml")
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cfgmeta"))
        .arg("--manifest")
        .arg(manifest_path())
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_describe_lists_inherited_properties() {
    // When: `cfgmeta describe ldap-connection-handler --inherited`
    let output = run(&["describe", "ldap-connection-handler", "--inherited"]);

    // Then: Own and inherited properties are shown with their grammar
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = stdout(&output);
    assert!(text.contains("extends: connection-handler"));
    assert!(text.contains("disabled | optional | required"));
    assert!(text.contains("1 <= INTEGER <= 65535"));
    assert!(text.contains("port-when-enabled"));
}

#[test]
fn test_describe_json_output() {
    let output = run(&["describe", "connection-handler", "--json"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("\"abstract\": true"));
    assert!(text.contains("\"user_friendly_name\": \"Connection Handler\""));
    assert!(text.contains("\"admin_action\": \"component-restart\""));
}

#[test]
fn test_describe_unknown_definition_fails() {
    let output = run(&["describe", "snmp-connection-handler"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_check_normalizes_values() {
    // When: A size value is checked
    let output = run(&["check", "backend", "db-cache-size", "2048 kib"]);

    // Then: It is normalized to its best-fit unit
    assert!(output.status.success());
    assert!(stdout(&output).contains("2048 kib -> 2 mib"));
}

#[test]
fn test_check_rejects_out_of_range_port() {
    let output = run(&["check", "ldap-connection-handler", "listen-port", "70000"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("listen-port"));
}

#[test]
fn test_check_rejects_several_values_for_single_valued_property() {
    let output = run(&["check", "connection-handler", "enabled", "true", "false"]);
    assert!(!output.status.success());
}

#[test]
fn test_path_renders_dn() {
    let output = run(&[
        "path",
        "/relation=connection-handler+type=ldap-connection-handler+name=LDAP",
    ]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("definition: ldap-connection-handler"));
    assert!(text.contains("dn: cn=LDAP,cn=connection-handlers,cn=config"));
}

#[test]
fn test_path_uses_configured_ldap_profile() {
    // Given: A configuration overriding the root DN and one relation RDN
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("cfgmeta.toml");
    std::fs::write(
        &config,
        "[logging]\nprofile = \"test\"\n\n[ldap]\nroot_dn = \"cn=admin data\"\n\n[ldap.relation_rdns]\nbackend = \"cn=Backends\"\n",
    )
    .unwrap();

    // When: A backend path is mapped
    let output = run(&[
        "--config",
        config.to_str().unwrap(),
        "path",
        "/relation=backend+name=userRoot",
    ]);

    // Then: The overrides shape the DN
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("dn: cn=userRoot,cn=Backends,cn=admin data"));
}

#[test]
fn test_missing_manifest_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_cfgmeta"))
        .current_dir(temp_dir.path())
        .args(["path", "/"])
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
}
