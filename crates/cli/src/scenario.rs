//! Scripted loan scenarios
//!
//! A scenario seeds accounts with ether, then plays a list of calls against a
//! fresh in-memory registry. Each step may declare the error code it expects.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lendbook_core::{Address, Amount, AmountError, LoanId};
use lendbook_registry::{
    FixedClock, InMemoryLedger, Loan, LoanError, LoanEvent, LoanRegistry, RecordingSubscriber,
    TransferError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid amount in {location}: {source}")]
    InvalidAmount {
        location: String,
        #[source]
        source: AmountError,
    },

    #[error("Failed to seed account {address}: {source}")]
    Seed {
        address: Address,
        #[source]
        source: TransferError,
    },

    #[error("Invalid {location}: {reason}")]
    InvalidStep { location: String, reason: String },
}

/// Scenario file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock start; wall clock when absent
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// Opening balances in ether
    #[serde(default)]
    pub accounts: BTreeMap<Address, Decimal>,

    pub steps: Vec<Step>,
}

/// One scripted call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Request {
        caller: Address,
        collateral: Decimal,
        interest_rate: u32,
        duration_days: u32,
        #[serde(default)]
        expect_error: Option<String>,
    },
    Fund {
        caller: Address,
        loan_id: LoanId,
        payment: Decimal,
        #[serde(default)]
        expect_error: Option<String>,
    },
    Repay {
        caller: Address,
        loan_id: LoanId,
        repayment: Decimal,
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Move the scenario clock forward
    Advance { days: i64 },
    /// Print a loan
    Show { loan_id: LoanId },
}

impl Step {
    fn op(&self) -> &'static str {
        match self {
            Step::Request { .. } => "request",
            Step::Fund { .. } => "fund",
            Step::Repay { .. } => "repay",
            Step::Advance { .. } => "advance",
            Step::Show { .. } => "show",
        }
    }

    fn expected_error(&self) -> Option<&str> {
        match self {
            Step::Request { expect_error, .. }
            | Step::Fund { expect_error, .. }
            | Step::Repay { expect_error, .. } => expect_error.as_deref(),
            Step::Advance { .. } | Step::Show { .. } => None,
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    /// Short description of what happened
    pub detail: String,
    /// Error code if the call was rejected
    pub error: Option<String>,
    pub expected_error: Option<String>,
    pub loan: Option<Loan>,
}

impl StepOutcome {
    /// Did the step end the way the scenario said it would
    pub fn as_expected(&self) -> bool {
        self.error == self.expected_error
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<LoanEvent>,
    /// Closing balances in wei
    pub balances: BTreeMap<Address, Amount>,
    pub held_value: Amount,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepOutcome::as_expected)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|step| !step.as_expected())
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Play the scenario against a fresh registry
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        let mut ledger = InMemoryLedger::new();
        for (address, balance) in &self.accounts {
            let amount = ether(*balance, format!("account {address}"))?;
            ledger
                .mint(address, amount)
                .map_err(|source| ScenarioError::Seed {
                    address: address.clone(),
                    source,
                })?;
        }

        let clock = Arc::new(FixedClock::new(self.start.unwrap_or_else(Utc::now)));
        let recorder = Arc::new(RecordingSubscriber::new());
        let mut registry = LoanRegistry::new(ledger).with_clock(clock.clone());
        registry.subscribe(recorder.clone());

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let location = format!("step {index}");
            let (result, loan) = match step {
                Step::Request {
                    caller,
                    collateral,
                    interest_rate,
                    duration_days,
                    ..
                } => {
                    let collateral = ether(*collateral, location)?;
                    let result = registry
                        .request_loan(caller, *interest_rate, *duration_days, collateral)
                        .map(|id| format!("{caller} opened loan {id}"));
                    (result, None)
                }
                Step::Fund {
                    caller,
                    loan_id,
                    payment,
                    ..
                } => {
                    let payment = ether(*payment, location)?;
                    let result = registry
                        .fund_loan(caller, *loan_id, payment)
                        .map(|()| format!("{caller} funded loan {loan_id}"));
                    (result, None)
                }
                Step::Repay {
                    caller,
                    loan_id,
                    repayment,
                    ..
                } => {
                    let repayment = ether(*repayment, location)?;
                    let result = registry
                        .repay_loan(caller, *loan_id, repayment)
                        .map(|()| format!("{caller} repaid loan {loan_id}"));
                    (result, None)
                }
                Step::Advance { days } => {
                    let now = Duration::try_days(*days)
                        .and_then(|by| clock.advance(by))
                        .ok_or_else(|| ScenarioError::InvalidStep {
                            location,
                            reason: format!("cannot advance the clock by {days} days"),
                        })?;
                    (Ok(format!("clock at {now}")), None)
                }
                Step::Show { loan_id } => match registry.get_loan(*loan_id) {
                    Ok(loan) => (
                        Ok(format!("loan {loan_id} is {}", loan.status())),
                        Some(loan.clone()),
                    ),
                    Err(e) => (Err(e), None),
                },
            };

            outcomes.push(outcome(index, step, result, loan));
        }

        let balances = self
            .accounts
            .keys()
            .map(|address| (address.clone(), registry.settlement().balance_of(address)))
            .collect();

        Ok(ScenarioReport {
            steps: outcomes,
            events: recorder.events(),
            balances,
            held_value: registry.held_value(),
        })
    }
}

fn outcome(
    index: usize,
    step: &Step,
    result: Result<String, LoanError>,
    loan: Option<Loan>,
) -> StepOutcome {
    let (detail, error) = match result {
        Ok(detail) => (detail, None),
        Err(e) => (e.to_string(), Some(e.code().to_string())),
    };

    StepOutcome {
        index,
        op: step.op(),
        detail,
        error,
        expected_error: step.expected_error().map(str::to_string),
        loan,
    }
}

fn ether(value: Decimal, location: String) -> Result<Amount, ScenarioError> {
    Amount::from_ether(value).map_err(|source| ScenarioError::InvalidAmount { location, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let json = r#"{
            "accounts": { "alice": "10" },
            "steps": [
                { "op": "request", "caller": "alice", "collateral": "1", "interest_rate": 10, "duration_days": 30 },
                { "op": "fund", "caller": "bob", "loan_id": 0, "payment": "1.5", "expect_error": "AMOUNT_MISMATCH" },
                { "op": "advance", "days": 3 },
                { "op": "show", "loan_id": 0 }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[1].expected_error(), Some("AMOUNT_MISMATCH"));
        assert_eq!(scenario.steps[2].op(), "advance");
    }

    #[test]
    fn test_negative_balance_rejected() {
        let scenario = Scenario {
            start: None,
            accounts: [(Address::new("alice").unwrap(), Decimal::new(-1, 0))]
                .into_iter()
                .collect(),
            steps: Vec::new(),
        };

        let result = scenario.run();
        assert!(matches!(result, Err(ScenarioError::InvalidAmount { .. })));
    }
}
