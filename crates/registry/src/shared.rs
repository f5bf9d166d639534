//! Thread-safe handle to a registry
//!
//! Each call holds the registry lock for the whole operation, so validation,
//! settlement and commit of one call never interleave with another.
//! Subscribers are notified under the same lock, so they must not call back
//! into the handle that notified them.

use std::sync::{Arc, Mutex, MutexGuard};

use lendbook_core::{Address, Amount, LoanId};

use crate::error::{LoanError, LoanResult};
use crate::loan::Loan;
use crate::registry::LoanRegistry;
use crate::settlement::{InMemoryLedger, Settlement};

pub struct SharedRegistry<S = InMemoryLedger> {
    inner: Arc<Mutex<LoanRegistry<S>>>,
}

impl<S> Clone for SharedRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Settlement> SharedRegistry<S> {
    pub fn new(registry: LoanRegistry<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn request_loan(
        &self,
        caller: &Address,
        interest_rate: u32,
        duration_in_days: u32,
        collateral: Amount,
    ) -> LoanResult<LoanId> {
        self.lock()?
            .request_loan(caller, interest_rate, duration_in_days, collateral)
    }

    pub fn fund_loan(&self, caller: &Address, id: LoanId, payment: Amount) -> LoanResult<()> {
        self.lock()?.fund_loan(caller, id, payment)
    }

    pub fn repay_loan(&self, caller: &Address, id: LoanId, repayment: Amount) -> LoanResult<()> {
        self.lock()?.repay_loan(caller, id, repayment)
    }

    /// Snapshot of a loan
    pub fn get_loan(&self, id: LoanId) -> LoanResult<Loan> {
        self.lock()?.get_loan(id).cloned()
    }

    /// Run `f` with exclusive access to the registry
    pub fn with<R>(&self, f: impl FnOnce(&mut LoanRegistry<S>) -> R) -> LoanResult<R> {
        let mut registry = self.lock()?;
        Ok(f(&mut registry))
    }

    fn lock(&self) -> LoanResult<MutexGuard<'_, LoanRegistry<S>>> {
        self.inner.lock().map_err(|_| LoanError::RegistryPoisoned)
    }
}
