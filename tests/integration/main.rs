//! Integration tests for rootcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Command isolated to a temporary state dir and config file
    fn rootcache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("rootcache");
        cmd.env_remove("ROOTCACHE_DIR")
            .env("ROOTCACHE_CONFIG", temp.path().join("config.toml"))
            .arg("--dir")
            .arg(temp.path().join("roots"));
        cmd
    }

    fn server() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "file-locked cache of verified ledger root states",
            ));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rootcache"));
    }

    #[test]
    fn get_before_set_reports_not_found() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["get", &server(), "defaultdb"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No previous state found"));
    }

    #[test]
    fn set_then_get() {
        let temp = TempDir::new().unwrap();
        let srv = server();

        rootcache(&temp)
            .args(["set", &srv, "db1", "--tx-id", "7", "--tx-hash", "c0ffee"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stored db1 at tx 7"));

        rootcache(&temp)
            .args(["get", &srv, "db1", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"tx_id\": 7"))
            .stdout(predicate::str::contains("\"tx_hash\": \"c0ffee\""));

        let state_file = temp.path().join("roots").join(format!(".state-{}", srv));
        let content = fs::read_to_string(state_file).unwrap();
        assert!(content.starts_with("db1:"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn check_rejects_rollback() {
        let temp = TempDir::new().unwrap();
        let srv = server();

        rootcache(&temp)
            .args(["set", &srv, "db", "--tx-id", "10", "--tx-hash", "aa"])
            .assert()
            .success();

        rootcache(&temp)
            .args(["check", &srv, "db", "--tx-id", "9", "--tx-hash", "bb"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Rollback detected"));

        rootcache(&temp)
            .args(["check", &srv, "db", "--tx-id", "11", "--tx-hash", "bb", "--commit"])
            .assert()
            .success()
            .stdout(predicate::str::contains("follows cached tx 10"));

        rootcache(&temp)
            .args(["get", &srv, "db", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"tx_id\": 11"));
    }

    #[test]
    fn check_first_contact_passes() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["check", &server(), "db", "--tx-id", "1", "--tx-hash", "01"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No previous state"));
    }

    #[test]
    fn corrupted_entry_reported_and_forgotten() {
        let temp = TempDir::new().unwrap();
        let srv = server();
        let roots = temp.path().join("roots");
        fs::create_dir_all(&roots).unwrap();
        fs::write(roots.join(format!(".state-{}", srv)), "db:***\n").unwrap();

        rootcache(&temp)
            .args(["get", &srv, "db"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupted"))
            .stderr(predicate::str::contains("rootcache forget"));

        rootcache(&temp)
            .args(["forget", &srv, "db"])
            .assert()
            .success();

        rootcache(&temp)
            .args(["list", &srv])
            .assert()
            .success()
            .stdout(predicate::str::contains("tombstone"));
    }

    #[test]
    fn list_empty() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["list", "srv-empty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached states"));
    }

    #[test]
    fn invalid_digest_rejected() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["set", &server(), "db", "--tx-id", "1", "--tx-hash", "zz"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid hex digest"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_and_show() {
        let temp = TempDir::new().unwrap();
        rootcache(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(temp.path().join("config.toml").exists());

        rootcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }
}
