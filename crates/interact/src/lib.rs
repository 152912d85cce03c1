//! Ask one user a question and wait for their answer.
//!
//! [`InteractionWaiter`] sends a prompt, then waits for exactly one qualifying
//! reaction or reply (as decided by the value-carrying filters in [`filter`])
//! or for the timeout. Cleanup of the prompt runs on every exit path.

pub mod emotes;
pub mod error;
pub mod filter;
pub mod waiter;

pub use {
    emotes::EmoteSet,
    error::{Error, Result},
    filter::{
        Classification, Compensation, ForbidPolicy, MessageFilter, ReactionFilter, TargetSpec,
        Verdict,
    },
    waiter::{AskOptions, InteractionWaiter},
};
