//! Utilities to track the outcome of calendar operations

use std::fmt::{Display, Error, Formatter};

/// The outcome of the latest calendar operation
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// No calendar operation has happened yet
    NotStarted,
    /// The latest operation went fine
    Succeeded{ operation: String, subject: String },
    /// The latest operation failed. The local data is unaffected
    Failed{ operation: String, subject: String, details: String },
}

impl SyncEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncEvent::Failed{..})
    }

    /// A human-readable message, for failures only
    pub fn failure_message(&self) -> Option<String> {
        match self {
            SyncEvent::Failed{..} => Some(self.to_string()),
            _ => None,
        }
    }
}

impl Display for SyncEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncEvent::NotStarted => write!(f, "Not started"),
            SyncEvent::Succeeded{operation, subject} => write!(f, "Calendar {} of {} succeeded", operation, subject),
            SyncEvent::Failed{operation, subject, details} => write!(f, "Calendar {} of {} failed: {}", operation, subject, details),
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<SyncEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<SyncEvent>;

/// Create a feeback channel, that can be used to retrieve the outcome of the latest calendar operation
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(SyncEvent::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages() {
        assert_eq!(SyncEvent::default().failure_message(), None);
        let failed = SyncEvent::Failed {
            operation: "delete".to_string(),
            subject: "task 42".to_string(),
            details: "offline".to_string(),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.failure_message().unwrap(), "Calendar delete of task 42 failed: offline");
    }
}
