//! Loan records and their lifecycle state

use chrono::{DateTime, Utc};
use lendbook_core::{Address, Amount, LoanId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Principal granted per unit of collateral
pub const COLLATERAL_RATIO: u32 = 2;

/// Lifecycle state of a loan
///
/// `Requested -> Funded -> Repaid`, strictly in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Collateral escrowed, waiting for a lender
    Requested,
    /// Principal disbursed to the borrower
    Funded,
    /// Lender paid back, collateral returned (terminal)
    Repaid,
}

/// A single collateralized loan.
///
/// Records are never removed from the registry; they form the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower: Address,
    /// Set once, by the funding call
    pub lender: Option<Address>,
    pub collateral_amount: Amount,
    pub loan_amount: Amount,
    /// Flat fee in whole percent of `loan_amount`
    pub interest_rate: u32,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub is_funded: bool,
    pub is_repaid: bool,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        match (self.is_funded, self.is_repaid) {
            (_, true) => LoanStatus::Repaid,
            (true, false) => LoanStatus::Funded,
            (false, false) => LoanStatus::Requested,
        }
    }

    /// Interest owed on top of the principal, rounded down.
    pub fn interest(&self) -> Option<Amount> {
        interest_on(self.loan_amount, self.interest_rate)
    }

    /// Exact value the repayment call must carry.
    pub fn repayment_amount(&self) -> Option<Amount> {
        repayment_for(self.loan_amount, self.interest_rate)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_repaid && now > self.due_date
    }
}

/// Principal for a given collateral; None if it does not fit.
pub fn loan_amount_for(collateral: Amount) -> Option<Amount> {
    collateral.checked_mul(COLLATERAL_RATIO)
}

/// `floor(rate * principal / 100)`
pub fn interest_on(principal: Amount, interest_rate: u32) -> Option<Amount> {
    principal.percent(interest_rate)
}

/// Principal plus flat interest; None if it does not fit.
pub fn repayment_for(principal: Amount, interest_rate: u32) -> Option<Amount> {
    let interest = interest_on(principal, interest_rate)?;
    principal.checked_add(&interest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn loan(loan_amount: u128, interest_rate: u32) -> Loan {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Loan {
            id: LoanId::new(0),
            borrower: Address::new("borrower").unwrap(),
            lender: None,
            collateral_amount: Amount::from_wei(loan_amount / 2),
            loan_amount: Amount::from_wei(loan_amount),
            interest_rate,
            created_at,
            due_date: created_at + chrono::Duration::days(30),
            is_funded: false,
            is_repaid: false,
        }
    }

    #[test]
    fn test_status_follows_flags() {
        let mut loan = loan(200, 10);
        assert_eq!(loan.status(), LoanStatus::Requested);
        loan.is_funded = true;
        assert_eq!(loan.status(), LoanStatus::Funded);
        loan.is_repaid = true;
        assert_eq!(loan.status(), LoanStatus::Repaid);
    }

    #[test]
    fn test_repayment_amount() {
        assert_eq!(loan(200, 10).repayment_amount(), Some(Amount::from_wei(220)));
        assert_eq!(loan(200, 0).repayment_amount(), Some(Amount::from_wei(200)));
    }

    #[test]
    fn test_interest_floors() {
        // 15% of 333 = 49.95
        assert_eq!(loan(333, 15).interest(), Some(Amount::from_wei(49)));
        assert_eq!(loan(333, 15).repayment_amount(), Some(Amount::from_wei(382)));
    }

    #[test]
    fn test_repayment_overflow() {
        assert!(repayment_for(Amount::from_wei(u128::MAX), 1).is_none());
        assert!(repayment_for(Amount::from_wei(u128::MAX / 2), 150).is_none());
    }

    #[test]
    fn test_loan_amount_is_twice_collateral() {
        assert_eq!(loan_amount_for(Amount::from_wei(100)), Some(Amount::from_wei(200)));
        assert_eq!(loan_amount_for(Amount::from_wei(1)), Some(Amount::from_wei(2)));
        assert!(loan_amount_for(Amount::from_wei(u128::MAX / 2 + 1)).is_none());
    }

    #[test]
    fn test_overdue() {
        let loan = loan(200, 10);
        assert!(!loan.is_overdue(loan.due_date));
        assert!(loan.is_overdue(loan.due_date + chrono::Duration::seconds(1)));
    }
}
