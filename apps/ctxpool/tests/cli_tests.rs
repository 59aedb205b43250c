//! Tests for the CLI commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use ctxpool::cli::{
    Cli, Commands, build_audit, cmd_audit, cmd_fingerprint, cmd_topology, execute,
    fingerprint_catalog,
};
use ctxpool::config::{ComputerConfig, InterfaceCatalog};
use ctxpool_core::PoolError;
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn demo_config() -> ComputerConfig {
    ComputerConfig::load(&demo("computer.toml")).unwrap()
}

fn demo_catalog() -> InterfaceCatalog {
    InterfaceCatalog::load(&demo("interfaces.toml")).unwrap()
}

fn visible_names(report: &ctxpool::cli::RequesterReport) -> Vec<&str> {
    report
        .visible
        .iter()
        .map(|context| context.interface.as_str())
        .collect()
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_audit_arguments() {
    let cli = Cli::parse_from([
        "ctxpool",
        "--json-mode",
        "audit",
        "-c",
        "computer.toml",
        "-f",
        "interfaces.toml",
        "--requester",
        "3",
    ]);

    assert!(cli.json_mode);
    match cli.command {
        Some(Commands::Audit {
            config,
            file,
            requester,
        }) => {
            assert_eq!(config, PathBuf::from("computer.toml"));
            assert_eq!(file, PathBuf::from("interfaces.toml"));
            assert_eq!(requester, Some(3));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["ctxpool", "topology", "-c", "x.toml", "--quiet", "-v"]);
    assert!(cli.quiet);
    assert!(cli.verbose);
}

// =============================================================================
// FINGERPRINT COMMAND
// =============================================================================

#[test]
fn test_fingerprint_catalog_reports_invalid_entries() {
    let entries = fingerprint_catalog(&demo_catalog());

    let invalid: Vec<_> = entries
        .iter()
        .filter(|entry| entry.error.is_some())
        .map(|entry| entry.interface.as_str())
        .collect();
    assert_eq!(invalid, vec!["DisplaySettings"]);

    let cpu = entries
        .iter()
        .find(|entry| entry.interface == "CpuContext")
        .unwrap();
    assert_eq!(cpu.fingerprint.as_ref().map(String::len), Some(64));
    assert!(cpu.canonical.starts_with("() clear_interrupt(OwnerId,u32,);"));
}

#[test]
fn test_cmd_fingerprint_fails_on_invalid_interface() {
    let result = cmd_fingerprint(&demo("interfaces.toml"), true, false);
    assert!(matches!(result, Err(PoolError::InvalidContext(msg)) if msg.starts_with("1 of 7")));
}

#[test]
fn test_cmd_topology_on_demo() {
    assert!(cmd_topology(&demo("computer.toml"), false).is_ok());
    assert!(cmd_topology(&demo("computer.toml"), true).is_ok());
}

// =============================================================================
// AUDIT COMMAND
// =============================================================================

#[test]
fn test_audit_follows_wiring() {
    let report = build_audit(&demo_config(), &demo_catalog(), None).unwrap();

    assert_eq!(report.computer, "altair8800");
    assert_eq!(report.registered, 6);
    assert_eq!(report.requesters.len(), 5);

    let cpu = &report.requesters[0];
    assert_eq!(cpu.requester.name, "8080-cpu");
    assert_eq!(visible_names(cpu), vec!["MemoryContext", "SerialBoard"]);

    let memory = &report.requesters[1];
    assert_eq!(visible_names(memory), vec!["CpuContext", "Intel8080Context"]);

    let sio = &report.requesters[2];
    assert_eq!(
        visible_names(sio),
        vec!["CpuContext", "Intel8080Context", "Terminal"]
    );

    let assembler = &report.requesters[4];
    assert_eq!(visible_names(assembler), vec!["MemoryContext"]);
    assert_eq!(assembler.visible[0].providers[0].name, "standard-mem");
}

#[test]
fn test_audit_single_requester() {
    let report = build_audit(&demo_config(), &demo_catalog(), Some(4)).unwrap();

    assert_eq!(report.requesters.len(), 1);
    assert_eq!(report.requesters[0].requester.id, 4);
    assert_eq!(visible_names(&report.requesters[0]), vec!["SerialBoard"]);
}

#[test]
fn test_audit_unknown_requester() {
    let result = build_audit(&demo_config(), &demo_catalog(), Some(42));
    assert!(matches!(result, Err(PoolError::Config(msg)) if msg.contains("42")));
}

#[test]
fn test_audit_unknown_interface() {
    let mut config = demo_config();
    config.plugins[0].provides.push("Missing".to_string());

    let result = build_audit(&config, &demo_catalog(), None);
    assert!(matches!(result, Err(PoolError::Config(msg)) if msg.contains("Missing")));
}

#[test]
fn test_audit_rejects_providing_invalid_interface() {
    let mut config = demo_config();
    config.plugins[3].provides.push("DisplaySettings".to_string());

    let result = build_audit(&config, &demo_catalog(), None);
    assert!(matches!(result, Err(PoolError::InvalidContext(_))));
}

#[test]
fn test_audit_report_serializes() {
    let report = build_audit(&demo_config(), &demo_catalog(), Some(5)).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["computer"], "altair8800");
    assert_eq!(json["requesters"][0]["requester"]["name"], "as-8080");
    assert_eq!(
        json["requesters"][0]["visible"][0]["providers"][0]["id"],
        2
    );
}

#[test]
fn test_cmd_audit_and_execute() {
    assert!(cmd_audit(&demo("computer.toml"), &demo("interfaces.toml"), Some(1), true).is_ok());

    let cli = Cli::parse_from([
        "ctxpool",
        "audit",
        "-c",
        demo("computer.toml").to_str().unwrap(),
        "-f",
        demo("interfaces.toml").to_str().unwrap(),
    ]);
    assert!(execute(cli).is_ok());
}
