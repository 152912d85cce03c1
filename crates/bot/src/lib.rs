//! The `Bot` facade: one transport, one dispatcher, and everything built on
//! top of them (interaction waits, modules, the vote bridge, the stats
//! poster, the log channel and the mention responder).

pub mod bot;
pub mod error;
pub mod mention;
pub mod report;

pub use {
    bot::Bot,
    error::{Error, Result},
    mention::{MentionReply, MentionResponder},
};
