/// Crate-wide result type for transport and dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by the transport and dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referenced message no longer exists (already deleted).
    #[error("message not found: {what}")]
    NotFound { what: String },

    /// Input payload or parameter is invalid.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// Operation is currently unavailable (not connected, missing permission).
    #[error("channel operation unavailable: {message}")]
    Unavailable { message: String },

    /// The dispatch loop has shut down; no further events will be delivered.
    #[error("event dispatcher closed")]
    Closed,
}

impl Error {
    #[must_use]
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what: what.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    /// True for errors that mean "the target is already gone".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
