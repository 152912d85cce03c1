/// Result type for interaction waits.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a wait. A timeout is not one of them: it is reported
/// as `Ok(None)`. Cleanup failures never surface here either.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The prompt could not be sent, so there was nothing to wait on.
    #[error("failed to deliver prompt: {0}")]
    Deliver(#[source] botplus_channels::Error),

    /// The event stream ended while the wait was pending.
    #[error("event stream ended while waiting: {0}")]
    Stream(#[source] botplus_channels::Error),
}
