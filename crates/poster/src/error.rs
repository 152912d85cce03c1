use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stats poster needs an API token")]
    MissingToken,

    #[error("invalid stats endpoint {endpoint:?}")]
    InvalidEndpoint { endpoint: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("stats endpoint answered {status}")]
    Status { status: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
