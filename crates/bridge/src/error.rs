use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge is already running")]
    AlreadyRunning,
}

impl Error {
    #[must_use]
    pub fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
