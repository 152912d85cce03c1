use {botplus_common::FromMessage, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Module(#[from] botplus_modules::Error),

    #[error(transparent)]
    Poster(#[from] botplus_poster::Error),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

botplus_common::impl_context!();
