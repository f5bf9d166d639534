//! Address - Identity of the actor behind a call
//!
//! Lendbook does not authenticate callers. An address is whatever identity
//! the surrounding system attaches to a call (an account address, a user id).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty address")]
    Empty,

    #[error("Address must not contain whitespace: {0:?}")]
    ContainsWhitespace(String),
}

/// Caller identity used for the borrower and lender roles
///
/// # Examples
/// ```
/// use lendbook_core::Address;
///
/// let borrower: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
/// assert_eq!(borrower.as_str(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
///
/// assert!("".parse::<Address>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address, trimming surrounding whitespace
    pub fn new(value: impl AsRef<str>) -> Result<Self, AddressError> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(AddressError::Empty);
        }

        if value.chars().any(char::is_whitespace) {
            return Err(AddressError::ContainsWhitespace(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    /// Returns the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
