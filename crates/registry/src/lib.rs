//! Lendbook Registry - Peer-to-peer collateralized loans
//!
//! A borrower escrows collateral and requests a loan worth twice as much;
//! a lender funds the loan, paying the principal to the borrower; the
//! borrower repays principal plus a flat interest fee, which goes to the
//! lender while the collateral goes back to the borrower.
//!
//! ```text
//! request_loan ──► Requested ──fund_loan──► Funded ──repay_loan──► Repaid
//! ```
//!
//! ## Key Components
//!
//! - [`registry::LoanRegistry`] - Loan state machine and value accounting
//! - [`settlement::Settlement`] - All-or-nothing value movement
//! - [`event::LoanEvent`] - Append-only log of committed transitions
//! - [`shared::SharedRegistry`] - Lock-guarded handle for multi-threaded callers

pub mod clock;
pub mod error;
pub mod event;
pub mod loan;
pub mod registry;
pub mod settlement;
pub mod shared;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LoanError, LoanResult, Operation};
pub use event::{EventSubscriber, LoanEvent, RecordingSubscriber, SubscriberError};
pub use loan::{Loan, LoanStatus, COLLATERAL_RATIO};
pub use registry::LoanRegistry;
pub use settlement::{InMemoryLedger, Party, Settlement, Transfer, TransferError};
pub use shared::SharedRegistry;
