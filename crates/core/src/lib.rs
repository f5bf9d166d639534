//! Lendbook Core - Domain types
//!
//! This crate contains the fundamental types used across Lendbook:
//! - `Amount`: Non-negative native value in its smallest unit (wei)
//! - `Address`: Opaque identity of the actor making a call
//! - `LoanId`: Sequential loan identifier

pub mod address;
pub mod amount;
pub mod id;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError};
pub use id::LoanId;
