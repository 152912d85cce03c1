//! Shared types, error definitions, and utilities used across all botplus crates.

pub mod error;
pub mod ids;
pub mod message;
pub mod text;

pub use {
    error::{Error, FromMessage, Result},
    ids::{ChannelId, MessageId, UserId},
    message::{Colour, Embed, MessageReference, Prompt, SentMessage},
};
