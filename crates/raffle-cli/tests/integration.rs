#![allow(deprecated)]
use assert_cmd::Command;
use evm_client::abi::{self, Token};
use evm_client::types::encode_hex;
use evm_client::U256;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use raffle_core::workflow::Phase;
use raffle_core::{Config, Role};
use tempfile::TempDir;

fn raffle(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("raffle").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RAFFLE_CONFIG")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_config(dir: &TempDir, config: &Config) {
    config.save(&dir.path().join("raffle.yaml")).unwrap();
}

/// Distinct throwaway keys for the owner and five participants.
fn with_keys(cmd: &mut Command) -> &mut Command {
    for i in 0..6 {
        cmd.env(format!("PRIVATE_KEY_{i:02}"), format!("{:064x}", i + 1));
    }
    cmd
}

// ---------------------------------------------------------------------------
// raffle init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    raffle(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let data = std::fs::read_to_string(dir.path().join("raffle.yaml")).unwrap();
    let config = Config::from_yaml(&data).unwrap();
    assert_eq!(config.raffle.max_participants, 3);
    assert!(config.status.raffle_info);
}

#[test]
fn init_keeps_existing_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("raffle.yaml"), "version: 1\n").unwrap();
    raffle(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
    let data = std::fs::read_to_string(dir.path().join("raffle.yaml")).unwrap();
    assert_eq!(data, "version: 1\n");
}

#[test]
fn config_flag_selects_file() {
    let dir = TempDir::new().unwrap();
    raffle(&dir)
        .args(["--config", "custom.yaml", "init"])
        .assert()
        .success();
    assert!(dir.path().join("custom.yaml").exists());
}

// ---------------------------------------------------------------------------
// raffle plan / validate
// ---------------------------------------------------------------------------

#[test]
fn plan_lists_steps_in_order() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.workflow.approve = true;
    config.workflow.mint_single = true;
    write_config(&dir, &config);

    raffle(&dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("approve"))
        .stdout(predicate::str::contains("participate:participant-5"))
        .stdout(predicate::str::contains("end phase:   minted"));
}

#[test]
fn plan_reports_unmet_precondition() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.workflow.start_raffle = true;
    write_config(&dir, &config);

    raffle(&dir)
        .arg("plan")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("start_raffle"))
        .stderr(predicate::str::contains("minted"));
}

#[test]
fn plan_json_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &Config::default());

    let out = raffle(&dir).args(["plan", "--json"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["valid"], true);
    assert_eq!(v["plan"]["steps"].as_array().unwrap().len(), 11);
}

#[test]
fn validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.raffle.max_participants = 0;
    write_config(&dir, &config);

    raffle(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] raffle.max_participants"));
}

#[test]
fn missing_config_suggests_init() {
    let dir = TempDir::new().unwrap();
    raffle(&dir)
        .arg("run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("raffle init"));
}

// ---------------------------------------------------------------------------
// raffle run
// ---------------------------------------------------------------------------

#[test]
fn invalid_plan_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let rpc = server.mock("POST", "/").expect(0).create();
    let mut config = Config::default();
    config.workflow.assume_phase = Phase::RaffleOpen;
    config.raffle.max_participants = 1;
    config.workflow.participants = vec![Role::Participant(1), Role::Participant(2)];
    write_config(&dir, &config);

    with_keys(&mut raffle(&dir))
        .env("API_URL_AMOY", server.url())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("participate:participant-2"));
    rpc.assert();
}

#[test]
fn missing_rpc_url_is_reported() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &Config::default());

    with_keys(&mut raffle(&dir))
        .env_remove("API_URL_AMOY")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("API_URL_AMOY"));
}

fn eth_call(server: &mut ServerGuard, signature: &str, result: &[Token]) -> Mock {
    let selector = hex_selector(signature);
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(serde_json::json!({"method": "eth_call"})),
            Matcher::Regex(format!("\"data\":\"0x{selector}")),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": encode_hex(&abi::encode(result)),
            })
            .to_string(),
        )
        .expect(1)
        .create()
}

fn hex_selector(signature: &str) -> String {
    abi::selector(signature)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn status_server(metadata_status: usize) -> (ServerGuard, Vec<Mock>) {
    let mut server = Server::new();
    let uri = format!("{}/metadata/token-0000", server.url());
    let mut mocks = vec![
        eth_call(
            &mut server,
            "raffles(uint256)",
            &[Token::Uint(U256::from(0u64)), Token::Uint(U256::from(3u64))],
        ),
        eth_call(
            &mut server,
            "getNumberOfParticipantsInRaffle(uint256)",
            &[Token::Uint(U256::from(2u64))],
        ),
        eth_call(&mut server, "lastRequestId()", &[Token::Uint(U256::from(7u64))]),
        eth_call(
            &mut server,
            "getRequestStatus(uint256)",
            &[
                Token::Bool(true),
                Token::Array(vec![Token::Uint(U256::from(123u64))]),
            ],
        ),
        eth_call(&mut server, "tokenURI(uint256)", &[Token::String(uri)]),
    ];
    mocks.push(
        server
            .mock("GET", "/metadata/token-0000")
            .with_status(metadata_status)
            .with_body(r#"{"name":"Prize"}"#)
            .expect(1)
            .create(),
    );
    // Any transaction submission fails the test through the mock's expectation.
    for method in ["eth_sendRawTransaction", "eth_chainId"] {
        mocks.push(
            server
                .mock("POST", "/")
                .match_body(Matcher::PartialJson(serde_json::json!({"method": method})))
                .expect(0)
                .create(),
        );
    }
    (server, mocks)
}

fn status_only_config() -> Config {
    let mut config = Config::default();
    config.network.chain_id = Some(80002);
    config
}

#[test]
fn status_run_issues_five_reads_and_one_fetch() {
    let dir = TempDir::new().unwrap();
    let (server, mocks) = status_server(200);
    write_config(&dir, &status_only_config());

    with_keys(&mut raffle(&dir))
        .env("API_URL_AMOY", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("=== START ==="))
        .stdout(predicate::str::contains("fulfilled [123]"))
        .stdout(predicate::str::contains(r#"{"name":"Prize"}"#))
        .stdout(predicate::str::contains("=== END ==="));

    for mock in &mocks {
        mock.assert();
    }
}

#[test]
fn metadata_fetch_failure_keeps_exit_zero() {
    let dir = TempDir::new().unwrap();
    let (server, mocks) = status_server(500);
    write_config(&dir, &status_only_config());

    let out = with_keys(&mut raffle(&dir))
        .env("API_URL_AMOY", server.url())
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["status"]["metadata"]["outcome"], "failed");
    assert_eq!(report["status"]["participants"], "2");
    assert_eq!(report["components"][0]["provenance"], "attached");

    for mock in &mocks {
        mock.assert();
    }
}
