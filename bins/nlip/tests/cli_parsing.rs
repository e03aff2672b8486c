//! CLI argument parsing tests for nlip.
//!
//! These tests only exercise argument handling; nothing here talks to the
//! kernel.

use assert_cmd::Command;
use predicates::prelude::*;

fn nlip_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nlip"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        nlip_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Address and route query tool"));
    }

    #[test]
    fn test_version() {
        nlip_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nlip"));
    }

    #[test]
    fn test_invalid_subcommand() {
        nlip_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_family_flags_conflict() {
        nlip_cmd()
            .args(["-4", "-6", "route"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }

    #[test]
    fn test_timeout_requires_number() {
        nlip_cmd()
            .args(["--timeout", "soon", "route"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }
}

mod address_command {
    use super::*;

    #[test]
    fn test_address_help() {
        nlip_cmd()
            .args(["address", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Manage IP addresses"));
    }

    #[test]
    fn test_address_aliases() {
        nlip_cmd().args(["addr", "--help"]).assert().success();
        nlip_cmd().args(["a", "show", "--help"]).assert().success();
    }

    #[test]
    fn test_address_add_requires_address() {
        nlip_cmd()
            .args(["address", "add"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("<ADDRESS>"));
    }

    #[test]
    fn test_address_add_help() {
        nlip_cmd()
            .args(["address", "add", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--dev"));
    }
}

mod route_command {
    use super::*;

    #[test]
    fn test_route_help() {
        nlip_cmd()
            .args(["route", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Show the routing table"));
    }

    #[test]
    fn test_route_show_help() {
        nlip_cmd()
            .args(["route", "show", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--strict"))
            .stdout(predicate::str::contains("--table"));
    }

    #[test]
    fn test_route_gateway_help() {
        nlip_cmd().args(["r", "gateway", "--help"]).assert().success();
    }

    #[test]
    fn test_route_table_requires_number() {
        nlip_cmd()
            .args(["route", "show", "--table", "main"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }
}
