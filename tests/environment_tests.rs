//! Environment resolution tests
//!
//! Covers oratab lookups, the derived variables, ORACLE_BASE discovery and
//! per-database override files.

mod common;

use common::*;
use orasible::error::Error;
use orasible::oracle::{EnvironmentResolver, Oratab};
use orasible::runner::CommandResult;
use pretty_assertions::assert_eq;

#[test]
fn test_derived_variables() {
    let fixture = OracleFixture::new(&["ORCL"]);
    let runner = ScriptedRunner::new();

    let env = EnvironmentResolver::new(&fixture.oratab)
        .with_oracle_base("/u01/app/oracle")
        .resolve("ORCL", &runner)
        .unwrap();

    let home = path_str(&fixture.home("ORCL"));
    assert_eq!(env.oracle_home(), Some(home.as_str()));
    assert_eq!(env.oracle_sid(), Some("ORCL"));
    assert_eq!(env.oracle_base(), Some("/u01/app/oracle"));
    assert_eq!(
        env.path().unwrap(),
        format!(
            "{h}/srvm/admin:{h}/perl/bin:{h}/OPatch:{h}/bin:/usr/local/bin:/usr/bin:/bin",
            h = home
        )
    );
    assert_eq!(runner.count("orabase"), 0);
}

#[test]
fn test_oracle_base_discovered_with_orabase() {
    let fixture = OracleFixture::new(&["ORCL"]);
    let runner = ScriptedRunner::new();
    runner.push("orabase", CommandResult::success("/u01/app/oracle\n", ""));

    let env = EnvironmentResolver::new(&fixture.oratab)
        .resolve("ORCL", &runner)
        .unwrap();

    assert_eq!(env.oracle_base(), Some("/u01/app/oracle"));
    let call = &runner.calls("orabase")[0];
    assert_eq!(call.env("ORACLE_SID"), Some("ORCL"));
}

#[test]
fn test_orabase_missing_is_not_fatal() {
    let fixture = OracleFixture::new(&["ORCL"]);
    // Nothing scripted: spawning orabase fails
    let runner = ScriptedRunner::new();

    let env = EnvironmentResolver::new(&fixture.oratab)
        .resolve("ORCL", &runner)
        .unwrap();
    assert_eq!(env.oracle_base(), None);
}

#[test]
fn test_unknown_sid_is_not_found() {
    let fixture = OracleFixture::new(&["ORCL", "CDB2"]);
    let runner = ScriptedRunner::new();

    let err = EnvironmentResolver::new(&fixture.oratab)
        .resolve("orcl", &runner)
        .unwrap_err();
    assert!(matches!(err, Error::DatabaseNotFound { ref sid } if sid == "orcl"));
    assert!(runner.invocations().is_empty());
}

#[test]
fn test_override_file_layers_on_top() {
    let fixture = OracleFixture::new(&["ORCL"]);
    fixture.write_override(
        "ORCL",
        r#"# site settings
export NLS_LANG="AMERICAN_AMERICA.AL32UTF8"
TNS_ADMIN=/etc/tns   # shared
ORACLE_BASE=/u02/base
PATH=/opt/extra/bin:$PATH
EMPTY=
not an assignment
"#,
    );

    let env = EnvironmentResolver::new(&fixture.oratab)
        .with_oracle_base("/u01/app/oracle")
        .resolve("ORCL", &ScriptedRunner::new())
        .unwrap();

    assert_eq!(env.get("NLS_LANG"), Some("AMERICAN_AMERICA.AL32UTF8"));
    assert_eq!(env.get("TNS_ADMIN"), Some("/etc/tns"));
    assert_eq!(env.oracle_base(), Some("/u02/base"));
    assert_eq!(env.get("EMPTY"), None);

    let path = env.path().unwrap();
    assert!(path.ends_with(":/bin:/opt/extra/bin"), "{path}");
    assert!(!path.contains("$PATH"));
}

#[test]
fn test_override_file_for_other_sid_ignored() {
    let fixture = OracleFixture::new(&["ORCL", "CDB2"]);
    fixture.write_override("CDB2", "TNS_ADMIN=/etc/cdb2\n");

    let env = EnvironmentResolver::new(&fixture.oratab)
        .with_oracle_base("/u01/app/oracle")
        .resolve("ORCL", &ScriptedRunner::new())
        .unwrap();
    assert_eq!(env.get("TNS_ADMIN"), None);
}

#[test]
fn test_registry_reread_each_call() {
    let fixture = OracleFixture::new(&["ORCL"]);
    let resolver = EnvironmentResolver::new(&fixture.oratab).with_oracle_base("/b");
    let runner = ScriptedRunner::new();

    assert!(resolver.resolve("NEW", &runner).is_err());

    let mut text = std::fs::read_to_string(&fixture.oratab).unwrap();
    text.push_str("NEW:/u01/new_home:N\n");
    std::fs::write(&fixture.oratab, text).unwrap();

    let env = resolver.resolve("NEW", &runner).unwrap();
    assert_eq!(env.oracle_home(), Some("/u01/new_home"));
}

#[test]
fn test_oratab_duplicate_last_wins() {
    let oratab = Oratab::parse("ORCL:/u01/old:N\nORCL:/u01/new:Y\n");
    assert_eq!(oratab.len(), 1);
    let entry = oratab.get("ORCL").unwrap();
    assert_eq!(entry.oracle_home, std::path::PathBuf::from("/u01/new"));
    assert!(entry.starts_on_boot());
}

#[test]
fn test_missing_oratab_is_io_error() {
    let err = EnvironmentResolver::new("/nonexistent/oratab")
        .resolve("ORCL", &ScriptedRunner::new())
        .unwrap_err();
    assert_eq!(err.kind(), "io");
}
