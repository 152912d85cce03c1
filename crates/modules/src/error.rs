use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("module name must not be empty")]
    EmptyName,

    #[error("module \"{name}\" is already registered")]
    Duplicate { name: String },

    #[error("module \"{name}\" failed to attach: {source}")]
    Attach {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::Duplicate { name: name.into() }
    }

    #[must_use]
    pub fn attach(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Attach {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
