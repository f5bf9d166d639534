//! Loan events and their subscribers
//!
//! Every committed transition appends exactly one event to the registry's
//! log, then the event is handed to subscribers. A rejected call emits nothing.

use chrono::{DateTime, Utc};
use lendbook_core::{Address, Amount, LoanId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Events emitted by the loan registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LoanEvent {
    /// Collateral escrowed and a new loan opened
    #[serde(rename = "loanRequested")]
    Requested {
        id: LoanId,
        loan_amount: Amount,
        borrower: Address,
        interest_rate: u32,
        due_date: DateTime<Utc>,
    },

    /// A lender paid the principal to the borrower
    #[serde(rename = "loanFunded")]
    Funded {
        id: LoanId,
        lender: Address,
        loan_amount: Amount,
    },

    /// Lender repaid and collateral returned
    #[serde(rename = "loanRepaid")]
    Repaid { id: LoanId, borrower: Address },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::Requested { id, .. }
            | LoanEvent::Funded { id, .. }
            | LoanEvent::Repaid { id, .. } => *id,
        }
    }

    /// Event name as emitted on the wire
    pub fn name(&self) -> &'static str {
        match self {
            LoanEvent::Requested { .. } => "loanRequested",
            LoanEvent::Funded { .. } => "loanFunded",
            LoanEvent::Repaid { .. } => "loanRepaid",
        }
    }
}

/// Error reported by a subscriber
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Subscriber '{name}' failed: {reason}")]
pub struct SubscriberError {
    pub name: String,
    pub reason: String,
}

/// Receives events after the transition they describe has committed.
///
/// A subscriber cannot veto a transition; failures are logged by the registry.
///
/// `on_event` runs while the registry is borrowed mutably, and under the lock
/// when the registry sits behind a [`SharedRegistry`](crate::SharedRegistry).
/// Calling back into the same `SharedRegistry` from a subscriber deadlocks.
/// Queue the work and handle it after the call returns instead.
pub trait EventSubscriber: Send + Sync {
    /// Get the subscriber name (for logging)
    fn name(&self) -> &str;

    fn on_event(&self, event: &LoanEvent) -> Result<(), SubscriberError>;
}

/// Subscriber that keeps every event it receives
#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<LoanEvent>>,
}

impl RecordingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<LoanEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(&self, event: &LoanEvent) -> Result<(), SubscriberError> {
        let mut events = self.events.lock().map_err(|_| SubscriberError {
            name: self.name().to_string(),
            reason: "event buffer poisoned".to_string(),
        })?;
        events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded() -> LoanEvent {
        LoanEvent::Funded {
            id: LoanId::new(4),
            lender: Address::new("lender").unwrap(),
            loan_amount: Amount::from_wei(200),
        }
    }

    #[test]
    fn test_wire_names() {
        let event = funded();
        assert_eq!(event.name(), "loanFunded");
        assert_eq!(event.loan_id(), LoanId::new(4));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "loanFunded");
        assert_eq!(json["id"], 4);
        assert_eq!(json["loan_amount"], "200");
    }

    #[test]
    fn test_recording_subscriber() {
        let recorder = RecordingSubscriber::new();
        recorder.on_event(&funded()).unwrap();
        assert_eq!(recorder.events(), vec![funded()]);
    }
}
