//! Periodic server-count reporting to a bot-list site.

pub mod error;
pub mod module;
pub mod poster;

pub use {
    error::{Error, Result},
    module::{POSTER_MODULE, PosterModule},
    poster::{PosterHandle, StatsPayload, StatsPoster, StatsSource, USER_AGENT},
};
