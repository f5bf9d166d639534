//! Settlement - value movement between callers and the registry escrow
//!
//! Each registry operation hands the settlement layer one batch of transfers.
//! A batch is applied entirely or not at all; the registry only updates loan
//! state after its batch settled.

use lendbook_core::{Address, Amount};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Source or destination of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Party {
    /// An external actor (borrower, lender, any caller)
    Account(Address),
    /// Value held by the registry on behalf of open loans
    Escrow,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Account(address) => write!(f, "{}", address),
            Party::Escrow => f.write_str("escrow"),
        }
    }
}

/// One movement of native value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Party,
    pub to: Party,
    pub amount: Amount,
}

impl Transfer {
    /// Value attached by a caller, received into escrow
    pub fn deposit(from: &Address, amount: Amount) -> Self {
        Self {
            from: Party::Account(from.clone()),
            to: Party::Escrow,
            amount,
        }
    }

    /// Value paid out of escrow to an external actor
    pub fn payout(to: &Address, amount: Amount) -> Self {
        Self {
            from: Party::Escrow,
            to: Party::Account(to.clone()),
            amount,
        }
    }
}

/// Errors that abort a settlement batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient funds in {party}: available {available}, required {required}")]
    InsufficientFunds {
        party: Party,
        available: Amount,
        required: Amount,
    },

    #[error("Recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("Balance overflow crediting {0}")]
    Overflow(Party),
}

/// Moves value on behalf of the registry.
///
/// Implementations must apply a batch atomically: if any transfer in it
/// fails, none of the batch is visible afterwards.
pub trait Settlement {
    fn settle(&mut self, batch: &[Transfer]) -> Result<(), TransferError>;

    /// Value currently held in escrow
    fn escrow_balance(&self) -> Amount;
}

/// Process-local ledger of balances.
///
/// Stands in for the chain the registry would run on: accounts are seeded
/// with [`InMemoryLedger::mint`], and any account can be told to refuse
/// incoming value to exercise the failure paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, Amount>,
    escrow: Amount,
    rejecting: HashSet<Address>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account with new value (test/scenario setup only)
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let party = Party::Account(to.clone());
        let credited = self
            .balance(&party)
            .checked_add(&amount)
            .ok_or(TransferError::Overflow(party))?;
        self.balances.insert(to.clone(), credited);
        Ok(())
    }

    /// Balance of an account (zero if never seen)
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// Make an account refuse every incoming transfer
    pub fn reject_incoming(&mut self, address: &Address) {
        self.rejecting.insert(address.clone());
    }

    /// Undo [`InMemoryLedger::reject_incoming`]
    pub fn accept_incoming(&mut self, address: &Address) {
        self.rejecting.remove(address);
    }

    /// Sum of every account balance plus escrow
    pub fn total_value(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(self.escrow, |acc, balance| acc.checked_add(balance))
    }

    fn balance(&self, party: &Party) -> Amount {
        match party {
            Party::Account(address) => self.balance_of(address),
            Party::Escrow => self.escrow,
        }
    }
}

impl Settlement for InMemoryLedger {
    fn settle(&mut self, batch: &[Transfer]) -> Result<(), TransferError> {
        // Stage every touched balance, then write back only if all transfers pass
        let mut staged: HashMap<Party, Amount> = HashMap::new();

        for transfer in batch {
            if let Party::Account(recipient) = &transfer.to {
                if self.rejecting.contains(recipient) {
                    return Err(TransferError::Rejected(recipient.clone()));
                }
            }

            let available = staged
                .get(&transfer.from)
                .copied()
                .unwrap_or_else(|| self.balance(&transfer.from));
            let debited =
                available
                    .checked_sub(&transfer.amount)
                    .ok_or_else(|| TransferError::InsufficientFunds {
                        party: transfer.from.clone(),
                        available,
                        required: transfer.amount,
                    })?;
            staged.insert(transfer.from.clone(), debited);

            let current = staged
                .get(&transfer.to)
                .copied()
                .unwrap_or_else(|| self.balance(&transfer.to));
            let credited = current
                .checked_add(&transfer.amount)
                .ok_or_else(|| TransferError::Overflow(transfer.to.clone()))?;
            staged.insert(transfer.to.clone(), credited);
        }

        tracing::debug!(transfers = batch.len(), "Settlement batch applied");

        for (party, balance) in staged {
            match party {
                Party::Account(address) => {
                    self.balances.insert(address, balance);
                }
                Party::Escrow => self.escrow = balance,
            }
        }

        Ok(())
    }

    fn escrow_balance(&self) -> Amount {
        self.escrow
    }
}
