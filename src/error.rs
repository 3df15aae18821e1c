//! Errors returned by the services of this crate

use thiserror::Error;

/// Result type alias using this crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the data layer.
///
/// Storage and serialization failures are normally swallowed by the lowest layers (see [`crate::storage`] and [`crate::serializer`]),
/// so callers of the services will mostly see [`Error::NotFound`] and [`Error::InvalidInput`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Calendar error: {0}")]
    Calendar(String),
}

impl Error {
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::NotFound { kind: EntityKind::Task, id: id.to_string() }
    }

    pub fn project_not_found(id: impl ToString) -> Self {
        Self::NotFound { kind: EntityKind::Project, id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// The kinds of entities persisted by this crate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Project,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Task => write!(f, "Task"),
            EntityKind::Project => write!(f, "Project"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = Error::task_not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Task 'abc' not found");

        let err = Error::InvalidInput("empty title".to_string());
        assert!(err.is_not_found() == false);
    }
}
