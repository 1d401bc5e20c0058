//! Explicit publication of domain events.
//!
//! Services call an [`EventPublisher`] after a write commits instead of relying on
//! save/delete hooks, so every side effect is visible at the call site.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

/// A named event about one record, with free-form string details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub topic: String,
    pub subject: String,
    pub details: BTreeMap<String, String>,
}

impl DomainEvent {
    pub fn new(topic: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subject: subject.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }
}

/// Outbound hook for notification adapters (e-mail, chat, file cleanup).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that only records events in the service log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        info!(
            topic = %event.topic,
            subject = %event.subject,
            details = ?event.details,
            "domain event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_accumulate_in_key_order() {
        let event = DomainEvent::new("exam.flagged", "exam-7")
            .with_detail("unresolved_flags", 3)
            .with_detail("flag_limit", 5);

        let keys: Vec<_> = event.details.keys().cloned().collect();
        assert_eq!(keys, vec!["flag_limit", "unresolved_flags"]);
        assert_eq!(event.details["unresolved_flags"], "3");
    }

    #[test]
    fn tracing_publisher_accepts_events() {
        TracingPublisher
            .publish(DomainEvent::new("term.current_changed", "20234"))
            .expect("publish succeeds");
    }
}
