//! Integration tests for scenario files

use std::io::Write;
use std::path::PathBuf;

use lendbook_cli::{commands, Scenario, ScenarioError};
use lendbook_core::{Address, Amount};
use lendbook_registry::{LoanEvent, LoanStatus};
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

fn write_scenario(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn bundled_scenario() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios/collateralized_loan.json")
}

#[test]
fn test_bundled_scenario_passes() {
    let scenario = Scenario::from_file(&bundled_scenario()).unwrap();
    let report = scenario.run().unwrap();

    assert!(report.passed(), "unexpected outcomes: {:?}", report.failures().collect::<Vec<_>>());

    let names: Vec<_> = report.events.iter().map(LoanEvent::name).collect();
    assert_eq!(names, vec!["loanRequested", "loanFunded", "loanRepaid"]);

    let loan = report.steps.last().and_then(|step| step.loan.clone()).unwrap();
    assert_eq!(loan.status(), LoanStatus::Repaid);
    assert_eq!(report.held_value, Amount::ZERO);

    let borrower = Address::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
    assert_eq!(report.balances[&borrower], Amount::from_ether(dec!(9980)).unwrap());
}

#[test]
fn test_unexpected_outcome_is_reported() {
    let file = write_scenario(
        r#"{
            "accounts": { "alice": "10", "bob": "10" },
            "steps": [
                { "op": "request", "caller": "alice", "collateral": "1", "interest_rate": 5, "duration_days": 7 },
                { "op": "fund", "caller": "bob", "loan_id": 0, "payment": "2", "expect_error": "AMOUNT_MISMATCH" },
                { "op": "repay", "caller": "alice", "loan_id": 0, "repayment": "2" }
            ]
        }"#,
    );

    let report = Scenario::from_file(file.path())
        .unwrap()
        .run()
        .unwrap();

    assert!(!report.passed());
    let failed: Vec<_> = report.failures().map(|step| step.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert_eq!(report.steps[2].error.as_deref(), Some("AMOUNT_MISMATCH"));
}

#[test]
fn test_rejected_transfer_surfaces_as_step_error() {
    let file = write_scenario(
        r#"{
            "accounts": { "alice": "1" },
            "steps": [
                { "op": "request", "caller": "alice", "collateral": "5", "interest_rate": 5, "duration_days": 7, "expect_error": "TRANSFER_FAILED" }
            ]
        }"#,
    );

    let report = Scenario::from_file(file.path())
        .unwrap()
        .run()
        .unwrap();

    assert!(report.passed());
    assert!(report.events.is_empty());
}

#[test]
fn test_malformed_scenario() {
    let file = write_scenario(r#"{ "steps": [ { "op": "borrow" } ] }"#);
    assert!(matches!(
        Scenario::from_file(file.path()),
        Err(ScenarioError::Parse(_))
    ));
}

#[test]
fn test_run_command_uses_fixed_ratio() {
    let file = write_scenario(
        r#"{
            "accounts": { "alice": "10", "bob": "30" },
            "steps": [
                { "op": "request", "caller": "alice", "collateral": "10", "interest_rate": 0, "duration_days": 40000 },
                { "op": "fund", "caller": "bob", "loan_id": 0, "payment": "30", "expect_error": "AMOUNT_MISMATCH" },
                { "op": "fund", "caller": "bob", "loan_id": 0, "payment": "20" }
            ]
        }"#,
    );

    let passed = commands::run(file.path(), true).unwrap();
    assert!(passed);
}

#[test]
fn test_config_file_cannot_set_loan_terms() {
    let file = write_scenario(r#"{ "collateral_ratio": 3, "default_rate": 5 }"#);

    let config = commands::load_config(Some(file.path())).unwrap();
    assert_eq!(config.default_rate, 5);

    let quote = commands::quote(dec!(10), config.default_rate).unwrap();
    assert_eq!(quote.loan_amount, Amount::from_ether(dec!(20)).unwrap());
    assert_eq!(quote.repayment, Amount::from_ether(dec!(21)).unwrap());
}
