//! CLI commands

use std::path::Path;

use anyhow::Context;
use lendbook_core::Amount;
use lendbook_registry::loan;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::CliConfig;
use crate::scenario::{Scenario, ScenarioReport};

/// Load CLI config: file if given, then `LENDBOOK_*` overrides
pub fn load_config(path: Option<&Path>) -> anyhow::Result<CliConfig> {
    let config = match path {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => CliConfig::default(),
    };
    config.apply_env().context("applying environment overrides")
}

/// Run a scenario file and print its report
///
/// Returns whether every step ended as the scenario expected.
pub fn run(path: &Path, json: bool) -> anyhow::Result<bool> {
    let scenario = Scenario::from_file(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;

    tracing::info!(
        scenario = %path.display(),
        steps = scenario.steps.len(),
        accounts = scenario.accounts.len(),
        "Running scenario"
    );

    let report = scenario.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report.passed())
}

fn print_report(report: &ScenarioReport) {
    for step in &report.steps {
        let mark = if step.as_expected() { "✅" } else { "❌" };
        match (&step.error, &step.expected_error) {
            (Some(code), Some(_)) => {
                println!("{} [{}] {} rejected as expected: {} ({})", mark, step.index, step.op, step.detail, code)
            }
            (Some(code), None) => {
                println!("{} [{}] {} rejected: {} ({})", mark, step.index, step.op, step.detail, code)
            }
            (None, Some(expected)) => {
                println!("{} [{}] {} succeeded, expected {}: {}", mark, step.index, step.op, expected, step.detail)
            }
            (None, None) => println!("{} [{}] {}: {}", mark, step.index, step.op, step.detail),
        }

        if let Some(loan) = &step.loan {
            println!(
                "      borrower {} | lender {} | collateral {} | principal {} | rate {}% | due {}",
                loan.borrower,
                loan.lender.as_ref().map_or("-".to_string(), |l| l.to_string()),
                ether(loan.collateral_amount),
                ether(loan.loan_amount),
                loan.interest_rate,
                loan.due_date.format("%Y-%m-%d %H:%M:%S UTC"),
            );
        }
    }

    println!();
    println!("Events:");
    for event in &report.events {
        println!("  {} (loan {})", event.name(), event.loan_id());
    }

    println!();
    println!("Balances:");
    for (address, balance) in &report.balances {
        println!("  {}: {} ETH", address, ether(*balance));
    }
    println!("  escrow: {} ETH", ether(report.held_value));
}

/// Terms a registry would set for a given collateral and rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub collateral: Amount,
    pub loan_amount: Amount,
    pub interest: Amount,
    pub repayment: Amount,
}

pub fn quote(collateral: Decimal, interest_rate: u32) -> anyhow::Result<Quote> {
    let collateral = Amount::from_ether(collateral)?;
    if collateral.is_zero() {
        anyhow::bail!("Collateral must be greater than zero.");
    }

    let loan_amount = loan::loan_amount_for(collateral).context("loan amount overflows")?;
    let interest = loan::interest_on(loan_amount, interest_rate).context("interest overflows")?;
    let repayment = loan::repayment_for(loan_amount, interest_rate).context("repayment overflows")?;

    Ok(Quote {
        collateral,
        loan_amount,
        interest,
        repayment,
    })
}

pub fn print_quote(quote: &Quote) {
    println!("Collateral: {} ETH", ether(quote.collateral));
    println!("Loan:       {} ETH", ether(quote.loan_amount));
    println!("Interest:   {} ETH", ether(quote.interest));
    println!("Repayment:  {} ETH", ether(quote.repayment));
}

fn ether(amount: Amount) -> String {
    amount
        .to_ether()
        .map_or_else(|| format!("{} wei", amount), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_default_terms() {
        let quote = quote(dec!(100), 10).unwrap();
        assert_eq!(quote.loan_amount, Amount::from_ether(dec!(200)).unwrap());
        assert_eq!(quote.interest, Amount::from_ether(dec!(20)).unwrap());
        assert_eq!(quote.repayment, Amount::from_ether(dec!(220)).unwrap());
    }

    #[test]
    fn test_quote_zero_collateral() {
        assert!(quote(dec!(0), 10).is_err());
    }

    #[test]
    fn test_ether_formatting() {
        assert_eq!(ether(Amount::from_ether(dec!(1.25)).unwrap()), "1.25");
        assert_eq!(ether(Amount::from_wei(u128::MAX)), format!("{} wei", u128::MAX));
    }
}
