//! Unit tests for CLI commands
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::cli::{inspect_table, run, Cli, Commands};
use crate::config::GeneratorConfig;
use crate::contract::parse_contract_yaml;
use crate::introspect::ContractIntrospector;
use crate::resolve::compile_service;
use clap::Parser;

const CONTRACT: &str = r#"
service: ItemService
methods:
  - name: getItem
    method: GET
    path: /items/{itemId}
    returns: String
    params:
      - name: itemId
        type: i64
        directives: [{ kind: path }]
      - name: tags
        type: Vec<String>
        directives: [{ kind: query, name: tag }]
  - name: deleteItem
    method: DELETE
    path: /items/{itemId}
    params:
      - name: itemId
        type: i64
        directives: [{ kind: path }]
"#;

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "endpointgen",
        "generate",
        "--contract",
        "svc.yaml",
        "--output",
        "out.rs",
        "--force",
        "--dry-run",
        "--no-format",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate {
            contract,
            output,
            config,
            force,
            dry_run,
            no_format,
        } => {
            assert_eq!(contract.to_string_lossy(), "svc.yaml");
            assert_eq!(output.unwrap().to_string_lossy(), "out.rs");
            assert!(config.is_none());
            assert!(force);
            assert!(dry_run);
            assert!(no_format);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["endpointgen", "generate", "--contract", "svc.yaml"],
        vec!["endpointgen", "check", "--contract", "svc.yaml"],
        vec!["endpointgen", "inspect", "-c", "svc.yaml", "--config", "x.toml"],
        vec!["endpointgen", "--log-level", "debug", "check", "-c", "svc.yaml"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_contract_is_required() {
    assert!(Cli::try_parse_from(["endpointgen", "check"]).is_err());
}

#[test]
fn test_inspect_table_lists_bindings() {
    let contract = parse_contract_yaml(CONTRACT).unwrap();
    let def = compile_service(
        &contract,
        &ContractIntrospector::new(&contract),
        &GeneratorConfig::default(),
    )
    .unwrap();

    let table = inspect_table(&def);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "ItemService → ItemServiceEndpoints (2 endpoint(s))");
    assert!(lines[1].contains("GET"));
    assert!(lines[1].contains("/items/{itemId}"));
    assert!(lines[1].contains("getItem → value String"));
    assert!(table.contains("response  Json [get_item_response_serializer]"));
    assert!(table.contains("itemId: i64  path [get_item_item_id_decoder]"));
    assert!(table.contains("tags: Vec<String>  query 'tag' [get_item_tags_decoder]"));
    assert!(table.contains("deleteItem → void ()"));
}

#[test]
fn test_check_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(
        &path,
        "service: Bad\nmethods:\n  - name: get\n    method: GET\n    path: /x\n    params:\n      - name: id\n        type: i64\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["endpointgen", "check", "--contract", path.to_str().unwrap()])
        .unwrap();
    let err = run(cli).unwrap_err();
    assert!(err.to_string().contains("1 issue(s)"));
}

#[test]
fn test_generate_writes_next_to_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.yaml");
    std::fs::write(&path, CONTRACT).unwrap();

    let args = [
        "endpointgen",
        "generate",
        "--contract",
        path.to_str().unwrap(),
        "--no-format",
    ];
    run(Cli::try_parse_from(args).unwrap()).unwrap();
    let generated = dir.path().join("item_service.rs");
    let first = std::fs::read_to_string(&generated).unwrap();
    assert!(first.contains("pub trait ItemService"));

    // Second run is a no-op
    run(Cli::try_parse_from(args).unwrap()).unwrap();
    assert_eq!(std::fs::read_to_string(&generated).unwrap(), first);
}
