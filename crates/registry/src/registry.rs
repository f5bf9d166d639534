//! Loan registry - the collateralized loan state machine
//!
//! Every mutating call runs in three steps:
//! 1. Validate: existence, then state, then amounts. Nothing is touched yet.
//! 2. Settle: the call's value movements go to the settlement layer as one batch.
//! 3. Commit: loan state changes, the event is logged, subscribers are notified.
//!
//! A failure in step 1 or 2 leaves the registry exactly as it was.

use std::sync::Arc;

use chrono::TimeDelta;
use lendbook_core::{Address, Amount, LoanId};

use crate::clock::{Clock, SystemClock};
use crate::error::{LoanError, LoanResult, Operation};
use crate::event::{EventSubscriber, LoanEvent};
use crate::loan::{loan_amount_for, repayment_for, Loan, LoanStatus};
use crate::settlement::{InMemoryLedger, Settlement, Transfer};

/// Append-only directory of loans.
///
/// A loan's id is its position in the registry. Loans are never removed.
pub struct LoanRegistry<S = InMemoryLedger> {
    clock: Arc<dyn Clock>,
    settlement: S,
    loans: Vec<Loan>,
    events: Vec<LoanEvent>,
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl Default for LoanRegistry<InMemoryLedger> {
    fn default() -> Self {
        Self::new(InMemoryLedger::new())
    }
}

impl<S: Settlement> LoanRegistry<S> {
    /// Registry on the wall clock
    pub fn new(settlement: S) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            settlement,
            loans: Vec::new(),
            events: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a subscriber; it only sees events committed from now on
    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Open a loan against `collateral`, escrowed from the caller.
    ///
    /// The principal is [`COLLATERAL_RATIO`](crate::loan::COLLATERAL_RATIO)
    /// times the collateral and the due date is `duration_in_days` days from now.
    pub fn request_loan(
        &mut self,
        caller: &Address,
        interest_rate: u32,
        duration_in_days: u32,
        collateral: Amount,
    ) -> LoanResult<LoanId> {
        let result = self.try_request_loan(caller, interest_rate, duration_in_days, collateral);
        log_rejection(Operation::RequestLoan, None, caller, &result);
        result
    }

    /// Fund a requested loan; `payment` goes straight to the borrower.
    pub fn fund_loan(&mut self, caller: &Address, id: LoanId, payment: Amount) -> LoanResult<()> {
        let result = self.try_fund_loan(caller, id, payment);
        log_rejection(Operation::FundLoan, Some(id), caller, &result);
        result
    }

    /// Repay a funded loan.
    ///
    /// `repayment` must equal principal plus interest. It is paid to the
    /// lender and the collateral is released to the borrower on record,
    /// whoever the caller is.
    pub fn repay_loan(&mut self, caller: &Address, id: LoanId, repayment: Amount) -> LoanResult<()> {
        let result = self.try_repay_loan(caller, id, repayment);
        log_rejection(Operation::RepayLoan, Some(id), caller, &result);
        result
    }

    pub fn get_loan(&self, id: LoanId) -> LoanResult<&Loan> {
        self.position(id).map(|index| &self.loans[index])
    }

    /// Number of loans ever requested; also the next id
    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    /// All loans in id order
    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.iter()
    }

    pub fn loans_by_borrower<'a>(&'a self, borrower: &'a Address) -> impl Iterator<Item = &'a Loan> + 'a {
        self.loans.iter().filter(move |loan| &loan.borrower == borrower)
    }

    /// Collateral still owed back to borrowers
    pub fn outstanding_collateral(&self) -> Option<Amount> {
        self.loans
            .iter()
            .filter(|loan| !loan.is_repaid)
            .try_fold(Amount::ZERO, |acc, loan| acc.checked_add(&loan.collateral_amount))
    }

    /// Value currently held by the registry
    pub fn held_value(&self) -> Amount {
        self.settlement.escrow_balance()
    }

    /// Every event committed so far, oldest first
    pub fn events(&self) -> &[LoanEvent] {
        &self.events
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    /// Mutable access to the settlement layer, for seeding balances
    pub fn settlement_mut(&mut self) -> &mut S {
        &mut self.settlement
    }

    fn try_request_loan(
        &mut self,
        caller: &Address,
        interest_rate: u32,
        duration_in_days: u32,
        collateral: Amount,
    ) -> LoanResult<LoanId> {
        if collateral.is_zero() {
            return Err(LoanError::InvalidCollateral);
        }

        let invalid_duration = LoanError::InvalidDuration {
            days: duration_in_days,
        };
        if duration_in_days == 0 {
            return Err(invalid_duration);
        }

        let loan_amount =
            loan_amount_for(collateral).ok_or(LoanError::ArithmeticOverflow("loan amount"))?;

        // A loan whose repayment cannot be represented could never close
        repayment_for(loan_amount, interest_rate)
            .ok_or(LoanError::ArithmeticOverflow("repayment amount"))?;

        let created_at = self.clock.now();
        let due_date = TimeDelta::try_days(i64::from(duration_in_days))
            .and_then(|duration| created_at.checked_add_signed(duration))
            .ok_or(invalid_duration)?;

        let id = u64::try_from(self.loans.len())
            .map(LoanId::new)
            .map_err(|_| LoanError::ArithmeticOverflow("loan id"))?;

        self.settlement
            .settle(&[Transfer::deposit(caller, collateral)])?;

        self.loans.push(Loan {
            id,
            borrower: caller.clone(),
            lender: None,
            collateral_amount: collateral,
            loan_amount,
            interest_rate,
            created_at,
            due_date,
            is_funded: false,
            is_repaid: false,
        });

        tracing::info!(
            loan_id = %id,
            borrower = %caller,
            collateral = %collateral,
            loan_amount = %loan_amount,
            interest_rate,
            due_date = %due_date,
            "Loan requested"
        );

        self.emit(LoanEvent::Requested {
            id,
            loan_amount,
            borrower: caller.clone(),
            interest_rate,
            due_date,
        });

        Ok(id)
    }

    fn try_fund_loan(&mut self, caller: &Address, id: LoanId, payment: Amount) -> LoanResult<()> {
        let index = self.position(id)?;
        let loan = &self.loans[index];

        if loan.is_funded {
            return Err(LoanError::AlreadyFunded { id });
        }

        if payment != loan.loan_amount {
            return Err(LoanError::AmountMismatch {
                operation: Operation::FundLoan,
                expected: loan.loan_amount,
                received: payment,
            });
        }

        let borrower = loan.borrower.clone();
        let loan_amount = loan.loan_amount;

        self.settlement.settle(&[
            Transfer::deposit(caller, payment),
            Transfer::payout(&borrower, payment),
        ])?;

        let loan = &mut self.loans[index];
        loan.lender = Some(caller.clone());
        loan.is_funded = true;

        tracing::info!(
            loan_id = %id,
            lender = %caller,
            borrower = %borrower,
            loan_amount = %loan_amount,
            "Loan funded"
        );

        self.emit(LoanEvent::Funded {
            id,
            lender: caller.clone(),
            loan_amount,
        });

        Ok(())
    }

    fn try_repay_loan(&mut self, caller: &Address, id: LoanId, repayment: Amount) -> LoanResult<()> {
        let index = self.position(id)?;
        let loan = &self.loans[index];

        let lender = match (&loan.lender, loan.status()) {
            (Some(lender), LoanStatus::Funded) => lender.clone(),
            (_, status) => return Err(LoanError::NotRepayable { id, status }),
        };

        let expected = loan
            .repayment_amount()
            .ok_or(LoanError::ArithmeticOverflow("repayment amount"))?;

        if repayment != expected {
            return Err(LoanError::AmountMismatch {
                operation: Operation::RepayLoan,
                expected,
                received: repayment,
            });
        }

        let borrower = loan.borrower.clone();
        let collateral = loan.collateral_amount;

        self.settlement.settle(&[
            Transfer::deposit(caller, repayment),
            Transfer::payout(&lender, repayment),
            Transfer::payout(&borrower, collateral),
        ])?;

        self.loans[index].is_repaid = true;

        tracing::info!(
            loan_id = %id,
            borrower = %borrower,
            lender = %lender,
            repayment = %repayment,
            collateral = %collateral,
            "Loan repaid"
        );

        self.emit(LoanEvent::Repaid { id, borrower });

        Ok(())
    }

    fn position(&self, id: LoanId) -> LoanResult<usize> {
        id.index()
            .filter(|index| *index < self.loans.len())
            .ok_or(LoanError::LoanNotFound { id })
    }

    fn emit(&mut self, event: LoanEvent) {
        self.events.push(event);
        let Some(event) = self.events.last() else {
            return;
        };

        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.on_event(event) {
                tracing::error!(
                    subscriber = subscriber.name(),
                    event = event.name(),
                    error = %e,
                    "Event subscriber failed"
                );
            }
        }
    }
}

fn log_rejection<T>(operation: Operation, id: Option<LoanId>, caller: &Address, result: &LoanResult<T>) {
    if let Err(e) = result {
        tracing::warn!(
            operation = %operation,
            loan_id = ?id.map(|id| id.value()),
            caller = %caller,
            code = e.code(),
            error = %e,
            "Loan operation rejected"
        );
    }
}
