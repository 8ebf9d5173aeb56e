#![allow(clippy::unwrap_used, clippy::expect_used)]

// Environment overrides live in their own test binary so no other test
// observes the variables set here.

use std::fs;

use erpgw_server::config::load;

#[test]
fn test_environment_overrides_file() {
    // Given a file config and ERPGW_* variables
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("erpgw.yaml");
    fs::write(
        &path,
        "erp: sap\nbearerToken: from-file\ndb:\n  host: file-host\n  port: 1433\n",
    )
    .unwrap();
    std::env::set_var("ERPGW_DB__HOST", "env-host");
    std::env::set_var("ERPGW_DB__PORT", "1500");

    // When the config is loaded
    let cfg = load(&path).unwrap();

    // Then the environment wins
    assert_eq!(cfg.db.host, "env-host");
    assert_eq!(cfg.db.port, 1500);
    assert_eq!(cfg.bearer_token.expose(), "from-file");
}
