//! Snowflake-style identifiers for channels, users, and messages.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| Error::invalid_id($kind, s))
            }
        }
    };
}

snowflake!(
    /// A text channel (or DM) messages are posted to.
    ChannelId,
    "channel"
);
snowflake!(
    /// A user account, including the bot's own account.
    UserId,
    "user"
);
snowflake!(MessageId, "message");

impl UserId {
    /// Mention markup that renders as `@name` in chat clients.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}
