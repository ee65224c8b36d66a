//! CLI tests for Orasible
//!
//! This test suite covers:
//! - Subcommand parsing and help output
//! - The module command and its JSON envelope
//! - Arguments-file handling (JSON, wrapped JSON, key=value)
//! - The Ansible binary-module calling convention
//! - Environment resolution through config overrides

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Helper to get a command for testing
fn orasible_cmd() -> Command {
    let mut cmd = Command::cargo_bin("orasible").unwrap();
    cmd.env_remove("ORASIBLE_CONFIG")
        .env_remove("ORASIBLE_ORATAB")
        .env_remove("ORASIBLE_ORACLE_BASE")
        .env_remove("RUST_LOG");
    cmd
}

// Helper to create an arguments file
fn args_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// Helper to parse the envelope printed on stdout
fn envelope(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout must be a JSON envelope")
}

#[test]
fn test_help() {
    orasible_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("module"))
        .stdout(predicate::str::contains("list-modules"));
}

#[test]
fn test_version() {
    orasible_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_list_modules() {
    orasible_cmd()
        .arg("list-modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("sqlplus"))
        .stdout(predicate::str::contains("table_list"))
        .stdout(predicate::str::contains("table_dictionary"));
}

#[test]
fn test_unknown_subcommand() {
    orasible_cmd().arg("playbook").assert().failure();
}

#[test]
fn test_module_host_command_rejected() {
    let args = args_file(r#"{"ANSIBLE_MODULE_ARGS": {"sid": "ORCL", "sql": "host id"}}"#);

    let output = orasible_cmd()
        .args(["module", "sqlplus"])
        .arg(args.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let envelope = envelope(&output);
    assert_eq!(envelope["failed"], serde_json::json!(true));
    assert_eq!(envelope["rc"], serde_json::json!(1));
    assert_eq!(
        envelope["stderr"],
        serde_json::json!("Issuing commands to the host is disabled.")
    );
}

#[test]
fn test_module_unknown_database() {
    let dir = tempdir().unwrap();
    let oratab = dir.path().join("oratab");
    fs::write(&oratab, "ORCL:/u01/app/oracle/product/19.0.0/dbhome_1:N\n").unwrap();
    let args = args_file(r#"{"sid": "NOPE", "sql": "SELECT 1 FROM dual;"}"#);

    let output = orasible_cmd()
        .env("ORASIBLE_ORATAB", &oratab)
        .args(["module", "sqlplus"])
        .arg(args.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        envelope(&output)["stderr"],
        serde_json::json!("No oratab entry for NOPE")
    );
}

#[test]
fn test_module_check_mode() {
    let args = args_file("sid=ORCL sql='SHUTDOWN IMMEDIATE'");

    let output = orasible_cmd()
        .args(["module", "sqlplus", "--check"])
        .arg(args.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let envelope = envelope(&output);
    assert_eq!(envelope["skipped"], serde_json::json!(true));
    assert_eq!(envelope["changed"], serde_json::json!(false));
}

#[test]
fn test_module_unreadable_args_file() {
    let output = orasible_cmd()
        .args(["module", "sqlplus", "/nonexistent/args.json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let envelope = envelope(&output);
    assert_eq!(envelope["failed"], serde_json::json!(true));
    assert!(envelope["msg"]
        .as_str()
        .unwrap()
        .contains("Failed to read arguments file"));
}

#[test]
fn test_module_unknown_name() {
    let args = args_file("{}");
    let output = orasible_cmd()
        .args(["module", "rman"])
        .arg(args.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        envelope(&output)["stderr"],
        serde_json::json!("Module not found: rman")
    );
}

#[test]
fn test_logs_stay_off_stdout() {
    let args = args_file(r#"{"sid": "ORCL", "sql": "!id"}"#);

    let output = orasible_cmd()
        .args(["-vvv", "module", "sqlplus"])
        .arg(args.path())
        .output()
        .unwrap();

    // stdout must still be exactly one JSON document
    envelope(&output);
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_env_command() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("dbhome_1");
    fs::create_dir_all(&home).unwrap();
    fs::write(home.join("ORCL.env"), "export TNS_ADMIN=/etc/tns\n").unwrap();
    let oratab = dir.path().join("oratab");
    fs::write(&oratab, format!("ORCL:{}:Y\n", home.display())).unwrap();

    let output = orasible_cmd()
        .env("ORASIBLE_ORATAB", &oratab)
        .env("ORASIBLE_ORACLE_BASE", "/u01/app/oracle")
        .args(["env", "ORCL", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let env: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(env["ORACLE_SID"], serde_json::json!("ORCL"));
    assert_eq!(env["ORACLE_BASE"], serde_json::json!("/u01/app/oracle"));
    assert_eq!(env["TNS_ADMIN"], serde_json::json!("/etc/tns"));
}

#[test]
fn test_env_command_from_config_file() {
    let dir = tempdir().unwrap();
    let oratab = dir.path().join("oratab");
    fs::write(&oratab, "CDB1:/u01/app/oracle/product/21.0.0/dbhome_1:N\n").unwrap();
    let config = dir.path().join("orasible.toml");
    fs::write(
        &config,
        format!(
            "[oracle]\noratab = \"{}\"\noracle_base = \"/u01/app/oracle\"\n",
            oratab.display()
        ),
    )
    .unwrap();

    orasible_cmd()
        .args(["-c"])
        .arg(&config)
        .args(["env", "CDB1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export ORACLE_SID=CDB1"))
        .stdout(predicate::str::contains(
            "export ORACLE_HOME=/u01/app/oracle/product/21.0.0/dbhome_1",
        ));
}

#[test]
fn test_env_command_unknown_sid() {
    let dir = tempdir().unwrap();
    let oratab = dir.path().join("oratab");
    fs::write(&oratab, "ORCL:/u01/home:N\n").unwrap();

    orasible_cmd()
        .env("ORASIBLE_ORATAB", &oratab)
        .args(["env", "PROD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No oratab entry for PROD"));
}

#[test]
fn test_ps_requires_filter() {
    orasible_cmd().arg("ps").assert().failure();
}

#[cfg(unix)]
#[test]
fn test_binary_module_convention() {
    let dir = tempdir().unwrap();
    let link = dir.path().join("sqlplus");
    std::os::unix::fs::symlink(assert_cmd::cargo::cargo_bin("orasible"), &link).unwrap();
    let args = args_file(r#"{"database_name": "ORCL", "sql": "!rm -rf /"}"#);

    let output = std::process::Command::new(&link)
        .arg(args.path())
        .env_remove("ORASIBLE_CONFIG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let envelope = envelope(&output);
    assert_eq!(envelope["msg"], serde_json::json!("An error has occurred"));
    assert_eq!(
        envelope["stderr"],
        serde_json::json!("Issuing commands to the host is disabled.")
    );
}
