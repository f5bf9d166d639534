//! Loan registry errors

use lendbook_core::{Amount, LoanId};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::loan::LoanStatus;
use crate::settlement::TransferError;

/// Mutating operations exposed by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    RequestLoan,
    FundLoan,
    RepayLoan,
}

/// Every way a registry call can be rejected.
///
/// A rejected call never changes registry state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    #[error("Collateral must be greater than zero.")]
    InvalidCollateral,

    #[error("Duration must be at least one day, got {days}.")]
    InvalidDuration { days: u32 },

    #[error("Loan does not exist.")]
    LoanNotFound { id: LoanId },

    #[error("Loan {id} is already funded.")]
    AlreadyFunded { id: LoanId },

    #[error("Loan {id} cannot be repaid while {status}.")]
    NotRepayable { id: LoanId, status: LoanStatus },

    #[error("{}", mismatch_message(.operation))]
    AmountMismatch {
        operation: Operation,
        expected: Amount,
        received: Amount,
    },

    #[error("Value transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("Arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Registry lock poisoned")]
    RegistryPoisoned,
}

/// Result type for registry operations
pub type LoanResult<T> = Result<T, LoanError>;

fn mismatch_message(operation: &Operation) -> &'static str {
    match operation {
        Operation::FundLoan => "Amount must be equal to the requested loan amount.",
        Operation::RepayLoan => "Amount must be equal to the loan amount plus interest.",
        Operation::RequestLoan => "Amount does not match the loan terms.",
    }
}

impl LoanError {
    /// Stable code for logs and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            LoanError::InvalidCollateral => "INVALID_COLLATERAL",
            LoanError::InvalidDuration { .. } => "INVALID_DURATION",
            LoanError::LoanNotFound { .. } => "LOAN_NOT_FOUND",
            LoanError::AlreadyFunded { .. } => "ALREADY_FUNDED",
            LoanError::NotRepayable { .. } => "NOT_REPAYABLE",
            LoanError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            LoanError::TransferFailed(_) => "TRANSFER_FAILED",
            LoanError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            LoanError::RegistryPoisoned => "REGISTRY_POISONED",
        }
    }

    /// Check if the loan id did not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoanError::LoanNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fund_mismatch_message() {
        let err = LoanError::AmountMismatch {
            operation: Operation::FundLoan,
            expected: Amount::from_wei(200),
            received: Amount::from_wei(150),
        };
        assert_eq!(
            err.to_string(),
            "Amount must be equal to the requested loan amount."
        );
        assert_eq!(err.code(), "AMOUNT_MISMATCH");
    }

    #[test]
    fn test_not_found_message() {
        let err = LoanError::LoanNotFound { id: LoanId::new(0) };
        assert_eq!(err.to_string(), "Loan does not exist.");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_repayable_mentions_status() {
        let err = LoanError::NotRepayable {
            id: LoanId::new(3),
            status: LoanStatus::Requested,
        };
        assert_eq!(err.to_string(), "Loan 3 cannot be repaid while requested.");
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::RepayLoan.to_string(), "repay_loan");
        assert_eq!("fund_loan".parse::<Operation>().unwrap(), Operation::FundLoan);
    }
}
