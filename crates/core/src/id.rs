//! Loan identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a loan: its position in the registry, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(u64);

impl LoanId {
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Position in an arena indexed by loan id
    ///
    /// Returns None on targets where the id does not fit in `usize`.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LoanId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<LoanId> for u64 {
    fn from(id: LoanId) -> Self {
        id.0
    }
}
